//! Node: an ordered fan-out of arcs, final iff that fan-out is empty.

use crate::arc::Arc;

/// Index of a [`Node`] within its owning [`crate::network::Network`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// Exclusively owned by the network. Carries its outgoing arcs in
/// declaration order. Entanglement ids and priorities for the
/// prioritized-choice mechanism live on `Arc`, not here; see
/// `Arc::entanglement_id`.
pub struct Node<'a, P> {
    arcs: Vec<Arc<'a, P>>,
}

impl<'a, P> Node<'a, P> {
    pub fn new() -> Self {
        Node { arcs: Vec::new() }
    }

    pub fn link(&mut self, arc: Arc<'a, P>) {
        self.arcs.push(arc);
    }

    /// A node is final iff it has no outgoing arcs.
    pub fn is_final(&self) -> bool {
        self.arcs.is_empty()
    }

    pub fn arcs(&self) -> &[Arc<'a, P>] {
        &self.arcs
    }
}

impl<'a, P> Default for Node<'a, P> {
    fn default() -> Self {
        Self::new()
    }
}
