mod builder;
mod compiled;
mod error;
mod interner;
mod io;
mod random_tree;
mod spec;

pub use builder::GraphBuilder;
pub use compiled::{ActionKey, CompiledGraph, LeafScores, NodeKey};
pub use error::GraphSpecError;
pub use interner::LabelInterner;
pub use io::{compile_yaml, load_yaml, save_yaml};
pub use random_tree::{RandomNode, RandomTree, RandomTreeScores};
pub use spec::{EdgeSpec, GraphSpec, NodeSpec};
