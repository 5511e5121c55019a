use proptest::prelude::*;
use weavepath_core::{
    ConfiguredMcts, EvaluationError, GraphGenerator, NeverStop, PathEvaluator, RunStatus,
    SearchConfig, SearchEvent, SearchPath,
};
use weavepath_graph::{
    GraphBuilder, GraphSpec, GraphSpecError, RandomNode, RandomTree, compile_yaml, load_yaml,
    save_yaml,
};

const TRAIL_YAML: &str = r#"
version: 1
root: start
nodes:
  - id: start
    edges:
      - action: north
        to: hill
      - action: east
        to: river
      - action: south
        to: swamp
  - id: hill
    edges:
      - action: climb
        to: summit
      - action: descend
        to: meadow
  - id: river
    edges:
      - action: ford
        to: meadow
      - action: follow
        to: delta
  - id: swamp
    score: 0.0
  - id: summit
    goal: true
    score: 0.9
  - id: meadow
    goal: true
    score: 0.4
  - id: delta
    goal: true
    score: 0.6
"#;

fn trail() -> GraphSpec {
    serde_yaml::from_str(TRAIL_YAML).expect("valid yaml")
}

#[test]
fn yaml_parse_and_compile_success() {
    let graph = trail().compile().expect("compile should succeed");
    let root = graph.root();

    assert_eq!(graph.node_count(), 7);
    assert_eq!(graph.edge_count(), 7);
    assert_eq!(graph.node_id(root), Some("start"));
    assert_eq!(graph.is_goal(root), Some(false));

    let labels: Vec<&str> = graph
        .successors(&root)
        .expect("root is known")
        .into_iter()
        .map(|(action, _)| graph.action_label(action).expect("interned"))
        .collect();
    assert_eq!(labels, vec!["north", "east", "south"]);

    let summit = graph.node_key("summit").expect("declared");
    assert_eq!(graph.is_goal(summit), Some(true));
    assert_eq!(graph.score(summit), Some(0.9));
}

#[test]
fn validation_rejects_malformed_graphs() {
    let cases = [
        ("root: ''\nnodes: []\n", "missing root"),
        ("root: a\nnodes:\n  - id: b\n", "unknown root"),
        ("root: a\nnodes:\n  - id: a\n  - id: a\n", "duplicate id"),
        (
            "root: a\nnodes:\n  - id: a\n    edges:\n      - {action: x, to: missing}\n",
            "unknown target",
        ),
        (
            "root: a\nnodes:\n  - id: a\n    edges:\n      - {action: x, to: a}\n      - {action: x, to: a}\n",
            "duplicate action",
        ),
        (
            "root: a\nnodes:\n  - id: a\n    goal: true\n    edges:\n      - {action: x, to: a}\n",
            "goal with edges",
        ),
        ("root: a\nnodes:\n  - id: a\n    score: .nan\n", "nan score"),
    ];

    let errors: Vec<GraphSpecError> = cases
        .iter()
        .map(|(yaml, case)| {
            let spec: GraphSpec = serde_yaml::from_str(yaml).expect("valid syntax");
            spec.compile()
                .err()
                .unwrap_or_else(|| panic!("{case} should fail to compile"))
        })
        .collect();

    assert!(matches!(errors[0], GraphSpecError::MissingRoot));
    assert!(matches!(errors[1], GraphSpecError::UnknownRoot { .. }));
    assert!(matches!(errors[2], GraphSpecError::DuplicateNodeId { .. }));
    assert!(matches!(errors[3], GraphSpecError::UnknownTarget { .. }));
    assert!(matches!(errors[4], GraphSpecError::DuplicateAction { .. }));
    assert!(matches!(errors[5], GraphSpecError::GoalHasEdges { .. }));
    assert!(matches!(errors[6], GraphSpecError::InvalidScore { .. }));
}

#[test]
fn equal_action_labels_share_a_key() {
    let mut builder = GraphBuilder::new();
    builder
        .set_root("a")
        .add_node("a", None)
        .add_node("b", None)
        .add_goal("c", 1.0);
    builder.add_edge("a", "go", "b").expect("a exists");
    builder.add_edge("b", "go", "c").expect("b exists");
    let graph = builder.compile().expect("valid graph");

    let a = graph.node_key("a").expect("declared");
    let b = graph.node_key("b").expect("declared");
    let first = graph.successors(&a).expect("known")[0].0;
    let second = graph.successors(&b).expect("known")[0].0;

    assert_eq!(first, second);
    assert_eq!(graph.action_key("go"), Some(first));
    assert_eq!(graph.action_key("stay"), None);
}

#[test]
fn builder_rejects_edges_from_unknown_nodes() {
    let mut builder = GraphBuilder::new();
    builder.set_root("a").add_node("a", None);

    let err = builder
        .add_edge("ghost", "x", "a")
        .expect_err("unknown source");

    assert!(matches!(err, GraphSpecError::BuilderUnknownNode { node } if node == "ghost"));
}

#[test]
fn builder_requires_a_root() {
    let mut builder = GraphBuilder::new();
    builder.add_goal("a", 1.0);

    assert!(matches!(builder.build_spec(), Err(GraphSpecError::MissingRoot)));
}

#[test]
fn binary_tree_checks_the_leaf_count() {
    let err = GraphBuilder::binary_tree(2, &[0.0, 1.0, 2.0]).expect_err("needs four scores");

    assert!(matches!(
        err,
        GraphSpecError::LeafScoreCount {
            depth: 2,
            expected: 4,
            found: 3
        }
    ));
}

#[test]
fn search_over_binary_tree_finds_the_best_leaf() {
    let scores: Vec<f64> = (0..8).map(f64::from).collect();
    let graph = GraphBuilder::binary_tree(3, &scores)
        .expect("eight scores")
        .compile()
        .expect("valid tree");
    assert_eq!(graph.node_count(), 15);

    let mut engine = ConfiguredMcts::from_config(graph.search_input(), SearchConfig::default(), -1.0)
        .expect("default config is valid");
    let outcome = engine.run().expect("search succeeds");

    assert_eq!(outcome.status, RunStatus::Completed);
    let best = outcome.best.expect("a solution exists");
    assert_eq!(best.score, 7.0);
    assert_eq!(graph.describe_path(&best.path), "r -1-> r1 -1-> r11 -1-> r111");
}

#[test]
fn exhaustive_search_reports_every_goal_path() {
    let graph = trail().compile().expect("valid graph");
    let mut engine = ConfiguredMcts::from_config(graph.search_input(), SearchConfig::default(), 0.0)
        .expect("default config is valid");

    let mut solutions = Vec::new();
    let mut dead_ends = 0;
    for event in engine.by_ref() {
        match event.expect("no fatal error") {
            SearchEvent::SolutionFound(found) => solutions.push(found),
            SearchEvent::PlayoutFinished(finished) if !finished.is_goal => dead_ends += 1,
            _ => {}
        }
    }

    // The two routes to the meadow are distinct paths.
    assert_eq!(solutions.len(), 4);
    assert_eq!(dead_ends, 1);
    let best = solutions
        .iter()
        .max_by(|a, b| a.score.total_cmp(&b.score))
        .expect("solutions found");
    assert_eq!(
        graph.describe_path(&best.path),
        "start -north-> hill -climb-> summit"
    );
    assert_eq!(
        engine.best_solution().map(|best| best.score),
        Some(0.9)
    );
}

#[test]
fn goals_without_scores_fail_evaluation() {
    let spec: GraphSpec =
        serde_yaml::from_str("root: a\nnodes:\n  - id: a\n    goal: true\n").expect("valid yaml");
    let graph = spec.compile().expect("valid graph");
    let mut evaluator = graph.leaf_score_evaluator();

    let err = evaluator
        .evaluate(&SearchPath::from_root(graph.root()), &NeverStop)
        .expect_err("no score declared");
    assert_eq!(
        err,
        EvaluationError::Failed("node 'a' has no score".to_string())
    );

    let mut engine = ConfiguredMcts::from_config(graph.search_input(), SearchConfig::default(), -5.0)
        .expect("default config is valid");
    let outcome = engine.run().expect("penalty recovers the failure");
    assert!(outcome.best.is_none());
    assert_eq!(outcome.playouts, 1);
}

#[test]
fn yaml_files_round_trip() {
    let path = std::env::temp_dir().join(format!("weavepath-graph-{}.yaml", std::process::id()));
    let spec = trail();

    save_yaml(&path, &spec).expect("write succeeds");
    let loaded = load_yaml(&path).expect("read succeeds");
    let compiled = compile_yaml(&path).expect("compile succeeds");
    let _ = std::fs::remove_file(&path);

    assert_eq!(loaded, spec);
    assert_eq!(compiled.node_count(), 7);
}

#[test]
fn missing_files_surface_io_errors() {
    let err = load_yaml("/nonexistent/weavepath/graph.yaml").expect_err("file is missing");

    assert!(matches!(err, GraphSpecError::Io(_)));
}

#[test]
fn random_tree_rejects_bad_parameters() {
    assert!(matches!(
        RandomTree::new(0, 0..=2, Some(3)),
        Err(GraphSpecError::InvalidRandomTree { .. })
    ));
    let tree = RandomTree::new(0, 1..=2, Some(3)).expect("valid tree");
    assert!(matches!(
        tree.with_dead_ends(1.5),
        Err(GraphSpecError::InvalidRandomTree { .. })
    ));
}

#[test]
fn random_tree_seeds_change_the_shape() {
    let first = RandomTree::new(1, 2..=4, None).expect("valid tree");
    let second = RandomTree::new(2, 2..=4, None).expect("valid tree");

    let children = |tree: &RandomTree| -> Vec<u64> {
        tree.successors(&tree.root())
            .expect("never fails")
            .into_iter()
            .map(|(_, child)| child.key)
            .collect()
    };

    assert_ne!(children(&first), children(&second));
}

#[test]
fn search_over_random_tree_only_reports_full_depth_goals() {
    let tree = RandomTree::new(11, 1..=3, Some(4))
        .and_then(|tree| tree.with_dead_ends(0.2))
        .expect("valid tree");
    let mut engine = ConfiguredMcts::from_config(tree.search_input(), SearchConfig::default(), 0.0)
        .expect("default config is valid");

    let mut last = None;
    for event in engine.by_ref() {
        let event = event.expect("no fatal error");
        if let SearchEvent::SolutionFound(found) = &event {
            assert_eq!(found.path.head().depth, 4);
            assert_eq!(found.path.len(), 4);
        }
        last = Some(event);
    }

    assert!(matches!(last, Some(SearchEvent::Terminated)));
    assert_eq!(engine.graph().unexpanded_count(), 0);
}

proptest! {
    #[test]
    fn random_tree_successors_are_idempotent(
        seed in any::<u64>(),
        key in any::<u64>(),
        depth in 0usize..6,
        max_branching in 1usize..6,
    ) {
        let tree = RandomTree::new(seed, 1..=max_branching, Some(6))
            .and_then(|tree| tree.with_dead_ends(0.25))
            .expect("valid tree");
        let node = RandomNode { depth, key };

        let first = tree.successors(&node).expect("never fails");
        let second = tree.successors(&node).expect("never fails");

        prop_assert_eq!(&first, &second);
        prop_assert!(first.len() <= max_branching);
        for (index, (action, child)) in first.iter().enumerate() {
            prop_assert_eq!(*action as usize, index);
            prop_assert_eq!(child.depth, depth + 1);
        }
        let score = tree.leaf_score_evaluator().score_of(&node);
        prop_assert!((0.0..1.0).contains(&score));
    }
}
