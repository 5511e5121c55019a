use crate::{CompiledGraph, EdgeSpec, GraphSpec, GraphSpecError, NodeSpec};

#[derive(Debug, Clone, Default)]
/// Fluent construction of graph specs.
pub struct GraphBuilder {
    root: Option<String>,
    nodes: Vec<NodeSpec>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the node every search starts from.
    pub fn set_root(&mut self, node: impl Into<String>) -> &mut Self {
        self.root = Some(node.into());
        self
    }

    /// Add an inner node. Inner nodes may still carry a score, which is used
    /// when a playout gets stuck there.
    pub fn add_node(&mut self, id: impl Into<String>, score: Option<f64>) -> &mut Self {
        self.nodes.push(NodeSpec {
            id: id.into(),
            goal: Some(false),
            score,
            edges: Vec::new(),
        });
        self
    }

    /// Add a goal node with its score.
    pub fn add_goal(&mut self, id: impl Into<String>, score: f64) -> &mut Self {
        self.nodes.push(NodeSpec {
            id: id.into(),
            goal: Some(true),
            score: Some(score),
            edges: Vec::new(),
        });
        self
    }

    /// Add a labelled edge. Targets are resolved when the spec is validated.
    pub fn add_edge(
        &mut self,
        from: impl AsRef<str>,
        action: impl Into<String>,
        to: impl Into<String>,
    ) -> Result<&mut Self, GraphSpecError> {
        let from = from.as_ref();
        let node = self
            .nodes
            .iter_mut()
            .find(|node| node.id == from)
            .ok_or_else(|| GraphSpecError::BuilderUnknownNode {
                node: from.to_string(),
            })?;

        node.edges.push(EdgeSpec {
            action: action.into(),
            to: to.into(),
        });
        Ok(self)
    }

    pub fn build_spec(self) -> Result<GraphSpec, GraphSpecError> {
        let root = self.root.ok_or(GraphSpecError::MissingRoot)?;
        let spec = GraphSpec {
            version: Some(1),
            root,
            nodes: self.nodes,
        };
        spec.validate()?;
        Ok(spec)
    }

    pub fn compile(self) -> Result<CompiledGraph, GraphSpecError> {
        self.build_spec()?.compile()
    }

    /// Complete binary tree of the given depth with goal leaves.
    ///
    /// Nodes are named by the bits of their path (`r`, `r0`, `r01`, ...),
    /// actions are `"0"` and `"1"`, and `leaf_scores` are assigned to the
    /// leaves in left-to-right order.
    pub fn binary_tree(depth: u32, leaf_scores: &[f64]) -> Result<Self, GraphSpecError> {
        let expected = 1_usize << depth;
        if leaf_scores.len() != expected {
            return Err(GraphSpecError::LeafScoreCount {
                depth,
                expected,
                found: leaf_scores.len(),
            });
        }

        let mut builder = Self::new();
        builder.set_root("r");
        let mut level = vec!["r".to_string()];
        for _ in 0..depth {
            let mut next = Vec::with_capacity(level.len() * 2);
            for parent in &level {
                builder.add_node(parent.clone(), None);
                for bit in ["0", "1"] {
                    let child = format!("{parent}{bit}");
                    builder.add_edge(parent, bit, child.clone())?;
                    next.push(child);
                }
            }
            level = next;
        }

        for (leaf, score) in level.into_iter().zip(leaf_scores) {
            builder.add_goal(leaf, *score);
        }
        Ok(builder)
    }
}
