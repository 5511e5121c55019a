use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::{
    ActionPolicy, LabelStore, NodeLabel, Objective, PlkPolicy, PolicyError, SearchConfig,
    SpUcbPolicy, TreePolicy, TreePolicyConfig, UcbPolicy, UniformRandomPolicy, pick_weighted,
};

fn children() -> Vec<(char, u32)> {
    vec![('a', 1), ('b', 2)]
}

#[test]
fn running_mean_and_squares_follow_recorded_scores() {
    let mut label = NodeLabel::new();
    for score in [1.0, 2.0, 6.0] {
        label.record(score);
    }

    assert_eq!(label.visits(), 3);
    assert!((label.mean() - 3.0).abs() < 1e-12);
    assert!((label.sum_of_squares() - 41.0).abs() < 1e-12);
    assert!((label.squared_deviation() - 14.0).abs() < 1e-9);
}

#[test]
fn label_store_rejects_visit_counts_growing_towards_the_leaf() {
    let mut labels: LabelStore<u32> = LabelStore::new();
    labels.update_path(&[1], 1.0).expect("sub-path update");

    let err = labels
        .update_path(&[0, 1], 1.0)
        .expect_err("child now has more visits than its parent");

    assert_eq!(
        err,
        PolicyError::InconsistentVisits {
            depth: 1,
            parent_visits: 1,
            child_visits: 2,
        }
    );
}

#[test]
fn label_store_rejects_non_finite_scores() {
    let mut labels: LabelStore<u32> = LabelStore::new();

    let err = labels
        .update_path(&[0], f64::NAN)
        .expect_err("NaN is not a score");

    assert!(matches!(err, PolicyError::NonFiniteScore { .. }));
    assert!(labels.is_empty());
}

#[test]
fn ucb_tries_unlabelled_children_first() {
    let mut policy: UcbPolicy<u32> = UcbPolicy::maximizing();
    TreePolicy::<u32, char>::update_path(&mut policy, &[0, 1], 5.0, 1).expect("update");

    let action = policy
        .choose_action(&0, &children())
        .expect("action available");

    assert_eq!(action, 'b');
}

#[test]
fn ucb_prefers_the_higher_mean_at_equal_visits() {
    let mut policy: UcbPolicy<u32> = UcbPolicy::maximizing();
    TreePolicy::<u32, char>::update_path(&mut policy, &[0, 1], 1.0, 1).expect("update");
    TreePolicy::<u32, char>::update_path(&mut policy, &[0, 2], 0.0, 1).expect("update");

    assert_eq!(policy.choose_action(&0, &children()).expect("choice"), 'a');

    let mut minimizing: UcbPolicy<u32> = UcbPolicy::minimizing();
    TreePolicy::<u32, char>::update_path(&mut minimizing, &[0, 1], 1.0, 1).expect("update");
    TreePolicy::<u32, char>::update_path(&mut minimizing, &[0, 2], 0.0, 1).expect("update");

    assert_eq!(minimizing.choose_action(&0, &children()).expect("choice"), 'b');
}

#[test]
fn ucb_exploration_favours_rarely_visited_children() {
    let mut policy: UcbPolicy<u32> = UcbPolicy::new(Objective::Maximize, 2.0);
    for _ in 0..20 {
        TreePolicy::<u32, char>::update_path(&mut policy, &[0, 1], 0.6, 1).expect("update");
    }
    TreePolicy::<u32, char>::update_path(&mut policy, &[0, 2], 0.5, 1).expect("update");

    assert_eq!(policy.choose_action(&0, &children()).expect("choice"), 'b');
}

#[test]
fn policies_fail_on_empty_successor_lists() {
    let mut ucb: UcbPolicy<u32> = UcbPolicy::maximizing();
    let mut random = UniformRandomPolicy::new(1);

    assert!(matches!(
        ActionPolicy::<u32, char>::choose_action(&mut ucb, &0, &[]),
        Err(PolicyError::NoActionAvailable { .. })
    ));
    assert!(matches!(
        ActionPolicy::<u32, char>::choose_action(&mut random, &0, &[]),
        Err(PolicyError::NoActionAvailable { .. })
    ));
}

#[test]
fn spucb_variance_term_favours_noisier_children() {
    let mut policy: SpUcbPolicy<u32> = SpUcbPolicy::new(Objective::Maximize, 1.0, 0.0);
    for score in [1.0, 1.0] {
        TreePolicy::<u32, char>::update_path(&mut policy, &[0, 1], score, 1).expect("update");
    }
    for score in [0.0, 2.0] {
        TreePolicy::<u32, char>::update_path(&mut policy, &[0, 2], score, 1).expect("update");
    }

    let parent = *policy.labels().get(&0).expect("parent labelled");
    let calm = *policy.labels().get(&1).expect("child labelled");
    let noisy = *policy.labels().get(&2).expect("child labelled");
    assert!(policy.score(&parent, &noisy) > policy.score(&parent, &calm));
    assert_eq!(policy.choose_action(&0, &children()).expect("choice"), 'b');
}

#[test]
fn weighted_draws_follow_the_weights() {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let weights = vec![('a', 1.0), ('b', 3.0)];
    let draws = 20_000;

    let heavy = (0..draws)
        .filter(|_| pick_weighted(&weights, &mut rng) == Some('b'))
        .count();

    let share = heavy as f64 / draws as f64;
    assert!((share - 0.75).abs() < 0.02, "share was {share}");
}

#[test]
fn zero_weights_fall_back_to_uniform_draws() {
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let weights = vec![('a', 0.0), ('b', 0.0)];

    let picks: Vec<char> = (0..200)
        .filter_map(|_| pick_weighted(&weights, &mut rng))
        .collect();

    assert_eq!(picks.len(), 200);
    assert!(picks.contains(&'a'));
    assert!(picks.contains(&'b'));
    assert_eq!(pick_weighted::<char, _>(&[], &mut rng), None);
}

#[test]
fn plk_keeps_the_best_k_scores_per_node() {
    let mut policy: PlkPolicy<u32> = PlkPolicy::new(Objective::Maximize, 2, 0);
    for score in [0.2, 0.9, 0.5] {
        TreePolicy::<u32, char>::update_path(&mut policy, &[0, 1], score, 1).expect("update");
    }

    assert_eq!(policy.best_scores(&0), &[0.9, 0.5]);
    assert_eq!(policy.best_scores(&1), &[0.9, 0.5]);
    assert!((policy.rating(0.9, &1) - (1.0 - 0.2_f64.powf(1.0 / 3.0))).abs() < 1e-9);
}

#[test]
fn plk_draws_follow_the_child_ratings() {
    let mut policy: PlkPolicy<u32> = PlkPolicy::new(Objective::Maximize, 1, 5);
    TreePolicy::<u32, char>::update_path(&mut policy, &[0, 1], 0.8, 1).expect("update");
    TreePolicy::<u32, char>::update_path(&mut policy, &[0, 2], 0.4, 1).expect("update");

    let parent_best = policy.best_scores(&0)[0];
    let strong = policy.rating(parent_best, &1);
    let weak = policy.rating(parent_best, &2);
    assert!((strong - 1.0).abs() < 1e-12);
    assert!((weak - 0.6).abs() < 1e-9);

    let draws = 20_000;
    let picked_strong = (0..draws)
        .filter(|_| policy.choose_action(&0, &children()).expect("choice") == 'a')
        .count();

    let share = picked_strong as f64 / draws as f64;
    let expected = strong / (strong + weak);
    assert!(
        (share - expected).abs() < 0.02,
        "share was {share}, expected {expected}"
    );
}

#[test]
fn plk_is_deterministic_for_a_fixed_seed() {
    let choices = |seed: u64| {
        let mut policy: PlkPolicy<u32> = PlkPolicy::new(Objective::Maximize, 3, seed);
        TreePolicy::<u32, char>::update_path(&mut policy, &[0, 1], 0.8, 1).expect("update");
        TreePolicy::<u32, char>::update_path(&mut policy, &[0, 2], 0.4, 1).expect("update");
        (0..50)
            .map(|_| policy.choose_action(&0, &children()).expect("choice"))
            .collect::<Vec<char>>()
    };

    assert_eq!(choices(42), choices(42));
    assert!(choices(42).contains(&'a'));
}

#[test]
fn plk_rejects_negative_ratings() {
    let mut policy: PlkPolicy<u32> = PlkPolicy::new(Objective::Maximize, 3, 0);
    TreePolicy::<u32, char>::update_path(&mut policy, &[0, 1], 5.0, 1).expect("update");
    TreePolicy::<u32, char>::update_path(&mut policy, &[0, 2], 0.0, 1).expect("update");

    let err = policy
        .choose_action(&0, &children())
        .expect_err("score range exceeds one");

    assert!(matches!(err, PolicyError::NegativeScore { .. }));
}

#[test]
fn uniform_random_policy_replays_with_the_same_seed() {
    let successors: Vec<(u32, u32)> = (0..10).map(|i| (i, i)).collect();
    let mut first = UniformRandomPolicy::new(99);
    let mut second = UniformRandomPolicy::new(99);

    for _ in 0..20 {
        assert_eq!(
            first.choose_action(&0, &successors).expect("choice"),
            second.choose_action(&0, &successors).expect("choice")
        );
    }
}

#[test]
fn objective_orders_scores() {
    assert!(Objective::Maximize.is_better(2.0, 1.0));
    assert!(Objective::Minimize.is_better(1.0, 2.0));
    assert!(!Objective::Maximize.is_better(1.0, 1.0));
}

#[test]
fn default_yaml_matches_default_config() {
    let config = SearchConfig::from_default_yaml().expect("default yaml should parse");

    assert_eq!(config, SearchConfig::default());
    assert!(config.forbid_double_paths);
    assert_eq!(config.interrupt_check_interval, 10);
}

#[test]
fn tree_policy_kinds_parse_from_yaml() {
    let config = SearchConfig::from_yaml_str(
        "objective: minimize\ntree_policy:\n  kind: spucb\n  exploration: 0.5\n",
    )
    .expect("config should parse");

    assert_eq!(config.objective, Objective::Minimize);
    assert_eq!(
        config.tree_policy,
        TreePolicyConfig::Spucb {
            exploration: 0.5,
            variance_bound: 1.0,
        }
    );
    let yaml = config.to_yaml().expect("config serializes");
    assert_eq!(
        SearchConfig::from_yaml_str(&yaml).expect("round trip"),
        config
    );
}

#[test]
fn invalid_configs_are_rejected() {
    for yaml in [
        "max_playouts: 0\n",
        "interrupt_check_interval: 11\n",
        "tree_policy:\n  kind: ucb\n  exploration: -1.0\n",
        "tree_policy:\n  kind: plk\n  k: 0\n",
    ] {
        assert!(
            SearchConfig::from_yaml_str(yaml).is_err(),
            "accepted invalid config {yaml:?}"
        );
    }
}
