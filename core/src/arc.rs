//! Arc: target node, acceptor, type, label, entanglement id and priority.

use crate::acceptor::Acceptor;
use crate::label::Label;
use crate::node::NodeId;

/// The role an arc plays when its target state lands on a final node.
/// See spec.md 4.5 for the construction rules keyed off this tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ArcType {
    /// A plain continuation within the same call frame.
    Simple,
    /// A sub-network invocation whose result replaces the call site
    /// entirely (reported position becomes the sub-trace's end).
    Invoke,
    /// Like `Invoke`, but the reported range absorbs the consumed region
    /// from the call site through the sub-trace's end.
    Extend,
    /// A positive lookahead: the sub-trace must succeed, but consumes
    /// nothing at the call site.
    Positive,
    /// A negative lookahead: the sub-trace must fail for the caller to
    /// survive.
    Negative,
}

/// One outgoing edge of a [`crate::node::Node`].
///
/// Owned exclusively by its source node. `acceptor` is a borrowed reference
/// — ownership of acceptors is external to the network (spec.md 3).
pub struct Arc<'a, P> {
    pub target: NodeId,
    pub acceptor: &'a dyn Acceptor<P>,
    pub arc_type: ArcType,
    pub label: Label,
    pub entanglement_id: u32,
    pub priority: i32,
}

impl<'a, P> Arc<'a, P> {
    pub fn new(target: NodeId, acceptor: &'a dyn Acceptor<P>, arc_type: ArcType) -> Self {
        Arc {
            target,
            acceptor,
            arc_type,
            label: Label::new(),
            entanglement_id: 0,
            priority: 0,
        }
    }

    pub fn with_label(mut self, label: Label) -> Self {
        self.label = label;
        self
    }

    pub fn with_entanglement(mut self, id: u32, priority: i32) -> Self {
        self.entanglement_id = id;
        self.priority = priority;
        self
    }

    pub fn is_entangled(&self) -> bool {
        self.entanglement_id != 0
    }
}
