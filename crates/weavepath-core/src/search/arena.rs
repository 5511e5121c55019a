use crate::search::ids::NodeId;

/// Append-only node storage. Ids are dense and never reused, so a `NodeId`
/// stays valid for the lifetime of the graph.
#[derive(Debug, Clone)]
pub(crate) struct Arena<T> {
    slots: Vec<T>,
}

impl<T> Arena<T> {
    pub fn with_root(root: T) -> Self {
        Arena { slots: vec![root] }
    }

    /// Append a batch in order and return the ids handed out.
    pub fn commit(&mut self, batch: Vec<T>) -> Vec<NodeId> {
        let first = self.slots.len();
        self.slots.extend(batch);
        (first..self.slots.len()).map(NodeId::from).collect()
    }

    pub fn get(&self, node_id: NodeId) -> Option<&T> {
        self.slots.get(node_id.index())
    }

    pub fn get_mut(&mut self, node_id: NodeId) -> Option<&mut T> {
        self.slots.get_mut(node_id.index())
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Slots paired with their ids, in allocation order.
    pub fn entries(&self) -> impl Iterator<Item = (NodeId, &T)> {
        self.slots
            .iter()
            .enumerate()
            .map(|(index, slot)| (NodeId::from(index), slot))
    }
}
