//! Minimal concrete network: owns the Nodes the engine traverses.
//!
//! The spec treats "network builder" as an external collaborator (the
//! DSL-construction-sugar layer is explicitly out of scope); this module is
//! the thin, unopinionated container that stands in for it — callers build
//! one up by hand (or generate one) and hand the engine an entry [`NodeId`].

use crate::node::{Node, NodeId};

pub struct Network<'a, P> {
    nodes: Vec<Node<'a, P>>,
}

impl<'a, P> Network<'a, P> {
    pub fn new() -> Self {
        Network { nodes: Vec::new() }
    }

    /// Allocate a new, initially-final node and return its id.
    pub fn add_node(&mut self) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new());
        id
    }

    pub fn node(&self, id: NodeId) -> &Node<'a, P> {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node<'a, P> {
        &mut self.nodes[id.0]
    }
}

impl<'a, P> Default for Network<'a, P> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acceptor::{Acceptor, Range, Spectrum};
    use crate::arc::{Arc, ArcType};

    struct Noop;
    impl Acceptor<u32> for Noop {
        fn accept(&self, _input: Range<u32>, _last: Range<u32>, _sink: &mut dyn Spectrum<u32>) {}
    }

    #[test]
    fn build_two_node_network() {
        let acc = Noop;
        let mut net: Network<u32> = Network::new();
        let entry = net.add_node();
        let fin = net.add_node();
        net.node_mut(entry).link(Arc::new(fin, &acc, ArcType::Simple));
        assert!(!net.node(entry).is_final());
        assert!(net.node(fin).is_final());
    }
}
