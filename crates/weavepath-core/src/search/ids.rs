use serde::Serialize;

/// A wrapper for an integer index into the explored graph arena.
///
/// Two tree nodes carrying equal states stay distinct because they own
/// different ids.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(usize);

impl NodeId {
    /// Get the raw arena index of the node.
    pub fn index(&self) -> usize {
        self.0
    }
}

impl From<usize> for NodeId {
    /// Allow for explicit conversion from usize to NodeId
    fn from(value: usize) -> Self {
        NodeId(value)
    }
}
