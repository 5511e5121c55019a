use std::path::PathBuf;

use weavepath_core::{ConfiguredMcts, SearchConfig};
use weavepath_graph::compile_yaml;

fn main() {
    let mut args = std::env::args().skip(1);
    let graph_path = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("crates/weavepath-graph/examples/sample.graph.yaml"));
    let config = match args.next() {
        Some(path) => SearchConfig::from_yaml_path(path).expect("failed to load search config"),
        None => SearchConfig {
            max_playouts: Some(100),
            ..SearchConfig::default()
        },
    };

    let graph = compile_yaml(&graph_path).expect("failed to compile graph YAML");
    let mut engine = ConfiguredMcts::from_config(graph.search_input(), config, 0.0)
        .expect("invalid search config");
    let outcome = engine.run().expect("search failed");

    println!(
        "status={:?} playouts={} nodes={}",
        outcome.status,
        outcome.playouts,
        engine.number_of_nodes_in_memory()
    );
    match outcome.best {
        Some(best) => println!("best={} score={:.3}", graph.describe_path(&best.path), best.score),
        None => println!("no solution found"),
    }
    if let Ok(Some(action)) = engine.best_root_action_by_visits() {
        println!(
            "most_visited_root_action={}",
            graph.action_label(action).unwrap_or("?")
        );
    }
}
