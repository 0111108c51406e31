//! The traversal engine: drives a [`Network`] from an entry node over an
//! input [`Range`], enumerating every accepting path.
//!
//! A single work queue holds states awaiting arc enumeration. Order of
//! extraction is depth-first (LIFO) until any `Negative` arc is dispatched,
//! at which point the run permanently switches to breadth-first (FIFO):
//! a negative lookahead commits to exploring its subnetwork exhaustively
//! before its result can be trusted, and DFS order would otherwise let an
//! unrelated branch starve it.
//!
//! Arcs carrying an `entanglement_id` are not dispatched immediately; they
//! are parked in a deferred set and resolved in batches, by priority,
//! whenever the immediate queue drains (see [`Processor::reorganize_deferred`]).

use crate::action::{Action, ActionContext};
use crate::context::ContextRef;
use crate::errors::EngineError;
use crate::observer::{Event, NullObserver, Observer};
use crate::state::StateRef;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use traverse_core::{Arc, ArcType, Network, Node, NodeId, Pool, Range, Spectrum};

struct Deferred<'a, P> {
    state: StateRef<'a, P>,
    node: NodeId,
    idx: usize,
}

/// View of a [`StateRef`] handed to an [`Action`] on entry.
struct ActionView<'a, P>(StateRef<'a, P>);

impl<'a, P: Copy> ActionContext<P> for ActionView<'a, P> {
    fn range(&self) -> Range<P> {
        self.0.get().range
    }

    fn context(&self) -> ContextRef {
        self.0.owned_context()
    }
}

/// The [`Spectrum`] a dispatched arc's acceptor pushes descendant ranges
/// into; each push immediately spawns (and, if it survives, queues) a child
/// state.
struct Sink<'a, 'p, P: Copy> {
    processor: &'p mut Processor<'a, P>,
    caller: StateRef<'a, P>,
    node: NodeId,
    idx: usize,
}

impl<'a, 'p, P: Copy> Spectrum<P> for Sink<'a, 'p, P> {
    fn push(&mut self, from: P, to: P) {
        self.processor.spawn(self.caller, self.node, self.idx, Range::new(from, to));
    }
}

pub struct Processor<'a, P: Copy> {
    network: &'a Network<'a, P>,
    pool: &'a Pool,
    entry: NodeId,
    input: Range<P>,
    queue: VecDeque<StateRef<'a, P>>,
    traces: Vec<StateRef<'a, P>>,
    deferred: Vec<Deferred<'a, P>>,
    bfs_mode: bool,
    observer: Box<dyn Observer<'a, P>>,
    pending_error: Option<EngineError>,
    node_actions: HashMap<NodeId, Vec<Rc<dyn Action<P>>>>,
    arc_actions: HashMap<(NodeId, usize), Vec<Rc<dyn Action<P>>>>,
}

impl<'a, P: Copy> Processor<'a, P> {
    /// Build a processor seeded at `entry` over `input`, using `pool` as the
    /// arena every state of this run is allocated from.
    pub fn new(
        network: &'a Network<'a, P>,
        pool: &'a Pool,
        entry: NodeId,
        input: Range<P>,
    ) -> Result<Self, EngineError> {
        let mut proc = Processor {
            network,
            pool,
            entry,
            input,
            queue: VecDeque::new(),
            traces: Vec::new(),
            deferred: Vec::new(),
            bfs_mode: false,
            observer: Box::new(NullObserver),
            pending_error: None,
            node_actions: HashMap::new(),
            arc_actions: HashMap::new(),
        };
        proc.reset()?;
        Ok(proc)
    }

    pub fn set_observer(&mut self, observer: Box<dyn Observer<'a, P>>) {
        self.observer = observer;
    }

    /// Attach `action` to every state that lands on `node`, regardless of
    /// which arc led there.
    pub fn register_node_action(&mut self, node: NodeId, action: Rc<dyn Action<P>>) {
        self.node_actions.entry(node).or_default().push(action);
    }

    /// Attach `action` specifically to arc `arc_index` of `node`'s outgoing
    /// list, run before the node-level actions.
    pub fn register_arc_action(&mut self, node: NodeId, arc_index: usize, action: Rc<dyn Action<P>>) {
        self.arc_actions.entry((node, arc_index)).or_default().push(action);
    }

    /// Re-seed this processor at its original entry/input, discarding every
    /// state from a previous run and clearing the pool. The pool's tail
    /// discipline means this is a hard reset, not a selective rollback: any
    /// state from the prior run is no longer valid to dereference.
    pub fn reset(&mut self) -> Result<(), EngineError> {
        self.pool.clear();
        self.queue.clear();
        self.traces.clear();
        self.deferred.clear();
        self.bfs_mode = false;
        self.pending_error = None;
        let root = StateRef::seed(self.pool, self.entry, self.input.begin)?;
        self.push_queue(root);
        Ok(())
    }

    /// Every state that reached a final node and was not later blocked.
    pub fn traces(&self) -> &[StateRef<'a, P>] {
        &self.traces
    }

    pub fn is_bfs(&self) -> bool {
        self.bfs_mode
    }

    /// Drive the queue to exhaustion, reorganizing the deferred set and
    /// draining the queue again each time it empties out, until both are
    /// empty. Returns the total number of states pulled off the queue
    /// across every such inner pass, summed.
    pub fn run(&mut self) -> Result<usize, EngineError> {
        let mut total = 0usize;
        loop {
            total += self.run_inner()?;
            if self.deferred.is_empty() {
                return Ok(total);
            }
            self.reorganize_deferred()?;
        }
    }

    /// Pull and process states until the queue is empty, reporting progress
    /// to the observer before each pull. Returns the number of states pulled.
    fn run_inner(&mut self) -> Result<usize, EngineError> {
        let mut iter = 0usize;
        while let Some(s) = self.pop_from_queue() {
            self.observer.status(
                self.queue.len(),
                self.traces.len(),
                self.deferred.len(),
                iter,
                self.pool.usage(),
                self.pool.evicted_size(),
                self.pool.peak_usage(),
            );
            iter += 1;
            self.process_state(s)?;
        }
        Ok(iter)
    }

    fn push_queue(&mut self, s: StateRef<'a, P>) {
        self.queue.push_back(s);
    }

    /// DFS pops the most recently queued state (LIFO); BFS (latched on once
    /// any `Negative` arc is dispatched) pops the oldest (FIFO). States
    /// blocked by a negative assertion after being queued are skipped.
    fn pop_from_queue(&mut self) -> Option<StateRef<'a, P>> {
        loop {
            let next = if self.bfs_mode { self.queue.pop_front() } else { self.queue.pop_back() };
            match next {
                Some(s) if s.get().is_blocked() => continue,
                other => return other,
            }
        }
    }

    fn process_state(&mut self, s: StateRef<'a, P>) -> Result<(), EngineError> {
        self.observer.notify(Event::Pull(s));
        let node = self.network.node(s.get().target);
        if node.is_final() {
            self.handle_final(s)?;
        } else {
            self.process_outgoing(s, node);
        }
        if let Some(e) = self.pending_error.take() {
            return Err(e);
        }
        Ok(())
    }

    /// Dispatch exactly one of `s`'s remaining outgoing arcs and, if more
    /// remain, re-queue `s` itself to try them on a later pop — this is how
    /// a single state enumerates every alternative of its target node
    /// without recursion, and (crucially for DFS) without exploring a
    /// sibling arc's whole subtree before trying the next one: the
    /// requeued `s` lands behind whatever this dispatch just spawned, so
    /// LIFO pop order drains that spawned subtree completely before `s`
    /// is revisited. This is what makes the longer of two overlapping
    /// alternatives get traced after the shorter one under depth-first
    /// order, rather than both being explored in one flat batch.
    ///
    /// When this was `s`'s last remaining arc, nothing requeues `s` and no
    /// later pop will ever revisit it to notice the arc list is exhausted
    /// — so `rollback(s)` runs right here instead, closing the one path by
    /// which a dead-end state (every arc tried, nothing matched) would
    /// otherwise sit in the pool unreclaimed until the next `reset()`.
    fn process_outgoing(&mut self, s: StateRef<'a, P>, node: &'a Node<'a, P>) {
        let idx = s.get().next_arc_index();
        if idx >= node.arcs().len() {
            self.rollback(s);
            return;
        }
        s.get().advance_arc_index();
        let more_remain = s.get().next_arc_index() < node.arcs().len();
        if more_remain {
            self.push_queue(s);
        }
        let target = s.get().target;
        let arc = &node.arcs()[idx];
        if arc.is_entangled() {
            // `s` is now referenced from `self.deferred` until
            // `reorganize_deferred` resolves it — even if this was its last
            // arc, rolling it back here would leave a dangling entry there.
            self.deferred.push(Deferred { state: s, node: target, idx });
            self.observer.notify(Event::Defer(s));
            return;
        }
        self.accept_arc(s, target, idx, arc);
        if !more_remain {
            self.rollback(s);
        }
    }

    fn accept_arc(&mut self, s: StateRef<'a, P>, node: NodeId, idx: usize, arc: &'a Arc<'a, P>) {
        if arc.arc_type == ArcType::Negative {
            self.bfs_mode = true;
        }
        let input = self.input;
        let last = s.get().range;
        let mut sink = Sink { processor: self, caller: s, node, idx };
        arc.acceptor.accept(input, last, &mut sink);
    }

    /// Called from [`Sink::push`]: allocate the descendant state, run its
    /// entry actions, and queue it if it survives. Allocation failure is
    /// stashed in `pending_error` since `Spectrum::push` has no return
    /// channel of its own; `run` checks it after every dispatch.
    fn spawn(&mut self, caller: StateRef<'a, P>, node: NodeId, idx: usize, range: Range<P>) {
        if self.pending_error.is_some() {
            return;
        }
        let arc = &self.network.node(node).arcs()[idx];
        match StateRef::common(self.pool, caller, arc, range) {
            Ok(child) => {
                self.observer.notify(Event::Push(child));
                match self.enter_actions(node, idx, child) {
                    Ok(()) => {
                        self.observer.notify(Event::Entry(child));
                        self.push_queue(child);
                    }
                    Err(_flow_control) => {
                        self.observer.notify(Event::Deny(child));
                        self.rollback(child);
                    }
                }
            }
            Err(e) => self.pending_error = Some(e.into()),
        }
    }

    fn enter_actions(
        &self,
        node: NodeId,
        idx: usize,
        state: StateRef<'a, P>,
    ) -> Result<(), crate::errors::FlowControl> {
        let view = ActionView(state);
        if let Some(actions) = self.arc_actions.get(&(node, idx)) {
            for action in actions {
                action.enter(&view)?;
            }
        }
        if let Some(actions) = self.node_actions.get(&state.get().target) {
            for action in actions {
                action.enter(&view)?;
            }
        }
        Ok(())
    }

    /// A state landed on a final node. If it belongs to no call frame this
    /// is a top-level accepted trace; otherwise it reports the frame's
    /// return to the state that opened it, per the calling arc's type.
    fn handle_final(&mut self, s: StateRef<'a, P>) -> Result<(), EngineError> {
        match s.get().callee {
            None => {
                self.traces.push(s);
                self.observer.notify(Event::Trace(s));
            }
            Some(frame) => {
                let arc = frame.get().arc.expect("a call frame always carries the arc that opened it");
                let caller = frame
                    .get()
                    .ancestor
                    .expect("a call frame's ancestor is the state that traversed its calling arc");
                match arc.arc_type {
                    ArcType::Invoke => {
                        let split = StateRef::split_shifted(self.pool, caller, s)?;
                        self.observer.notify(Event::Split(split));
                        self.push_queue(split);
                    }
                    ArcType::Extend => {
                        let split = StateRef::split_extended(self.pool, caller, s)?;
                        self.observer.notify(Event::Split(split));
                        self.push_queue(split);
                    }
                    ArcType::Positive => {
                        let split = StateRef::split_positive(self.pool, caller)?;
                        self.observer.notify(Event::Split(split));
                        self.push_queue(split);
                    }
                    ArcType::Negative => {
                        self.filter_blocked(caller);
                    }
                    ArcType::Simple => unreachable!("a Simple arc never opens a call frame"),
                }
            }
        }
        Ok(())
    }

    /// Mark `target` blocked and prune every state in the queue, traces and
    /// deferred set whose ancestor chain passes through it — the effect of
    /// a successful negative assertion.
    fn filter_blocked(&mut self, target: StateRef<'a, P>) {
        if target.get().is_blocked() {
            return;
        }
        target.get().block();
        self.observer.notify(Event::Block(target));
        self.queue.retain(|s| !Self::crosses(*s, target));
        self.traces.retain(|s| !Self::crosses(*s, target));
        self.deferred.retain(|d| !Self::crosses(d.state, target));
    }

    fn crosses(mut state: StateRef<'a, P>, blocked: StateRef<'a, P>) -> bool {
        loop {
            if state.address() == blocked.address() {
                return true;
            }
            match state.get().ancestor {
                Some(a) => state = a,
                None => return false,
            }
        }
    }

    /// Reclaim `s` from the pool, then keep walking up its ancestor chain
    /// evicting as long as each eviction succeeds. A state can only be
    /// reclaimed while it is the pool's current tail, so this stops the
    /// moment it reaches an ancestor still referenced from elsewhere — by
    /// another live descendant, a trace, or a deferred entry, the tail
    /// check alone catches (such a reference is always allocated later,
    /// at a higher address). Rollback tries the whole stranded chain, not
    /// just the one state that was just exhausted.
    ///
    /// `s` itself is always safe to evict unconditionally: every call site
    /// only passes a state that has either just been denied entry (never
    /// queued) or just dispatched its own last remaining arc (so it was
    /// never re-queued for more). An *ancestor* reached by walking up from
    /// `s`, though, may still be sitting in the processing queue with arcs
    /// of its own left to try — `process_outgoing` re-queues the same
    /// state object rather than recursing, so a state's address reaching
    /// the pool's tail is not proof it has no pending work. The tail check
    /// alone would evict it out from under that still-live queue entry, so
    /// every hop past the first additionally requires that the ancestor's
    /// own arc enumeration is exhausted before it is considered for
    /// eviction.
    fn rollback(&mut self, s: StateRef<'a, P>) {
        let mut cur = Some(s);
        let mut first = true;
        while let Some(state) = cur {
            if !first {
                let st = state.get();
                let arc_count = self.network.node(st.target).arcs().len();
                if st.next_arc_index() < arc_count {
                    break;
                }
            }
            first = false;
            let ancestor = state.get().ancestor;
            if self.pool.evict(state.0).is_ok() {
                self.observer.notify(Event::Evict(state));
                cur = ancestor;
            } else {
                break;
            }
        }
    }

    /// Resolve every entangled arc deferred since the last round: group by
    /// origin (the state doing the choosing — every deferred alternative
    /// reached by re-dispatching the same state via `process_outgoing`
    /// shares one), dispatch only the highest-priority arc in each group,
    /// and silently drop the rest. This is the engine's simplification of
    /// the prioritized-choice mechanism; ties keep whichever entry
    /// `max_by_key` happens to prefer (the last one scanned), since the
    /// model makes no guarantee either way once priorities are equal.
    fn reorganize_deferred(&mut self) -> Result<(), EngineError> {
        let batch = std::mem::take(&mut self.deferred);
        let mut groups: HashMap<usize, Vec<Deferred<'a, P>>> = HashMap::new();
        for d in batch {
            groups.entry(d.state.address()).or_default().push(d);
        }
        for (_, mut entries) in groups {
            let winner_idx = entries
                .iter()
                .enumerate()
                .max_by_key(|(_, d)| self.network.node(d.node).arcs()[d.idx].priority)
                .map(|(i, _)| i)
                .expect("a group is never empty");
            let winner = entries.swap_remove(winner_idx);
            if winner.state.get().is_blocked() {
                continue;
            }
            let arc = &self.network.node(winner.node).arcs()[winner.idx];
            self.accept_arc(winner.state, winner.node, winner.idx, arc);
            if let Some(e) = self.pending_error.take() {
                return Err(e);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::CountingObserver;
    use traverse_core::{Acceptor, ArcType, Range as R};

    struct Literal<'s> {
        source: &'s [u8],
        text: &'static str,
    }
    impl<'s> Acceptor<usize> for Literal<'s> {
        fn accept(&self, input: R<usize>, last: R<usize>, sink: &mut dyn Spectrum<usize>) {
            let bytes = self.text.as_bytes();
            let end = last.end + bytes.len();
            if end <= input.end && &self.source[last.end..end] == bytes {
                sink.push(last.end, end);
            }
        }
    }

    #[test]
    fn single_literal_path_reaches_final() {
        let pool = Pool::with_capacity(1 << 16);
        let src = b"ab";
        let lit = Literal { source: src, text: "ab" };
        let mut net: Network<usize> = Network::new();
        let start = net.add_node();
        let fin = net.add_node();
        net.node_mut(start).link(Arc::new(fin, &lit, ArcType::Simple));

        let mut proc = Processor::new(&net, &pool, start, R::new(0, src.len())).unwrap();
        proc.run().unwrap();
        assert_eq!(proc.traces().len(), 1);
        assert_eq!(proc.traces()[0].get().range, R::new(0, 2));
    }

    #[test]
    fn run_reports_total_iterations_pulled() {
        let pool = Pool::with_capacity(1 << 16);
        let src = b"ab";
        let lit = Literal { source: src, text: "ab" };
        let mut net: Network<usize> = Network::new();
        let start = net.add_node();
        let fin = net.add_node();
        net.node_mut(start).link(Arc::new(fin, &lit, ArcType::Simple));

        let mut proc = Processor::new(&net, &pool, start, R::new(0, src.len())).unwrap();
        // one pull for the seed state at `start`, one for the state it spawns at `fin`.
        assert_eq!(proc.run().unwrap(), 2);
    }

    #[test]
    fn no_matching_arc_yields_no_trace() {
        let pool = Pool::with_capacity(1 << 16);
        let src = b"xy";
        let lit = Literal { source: src, text: "ab" };
        let mut net: Network<usize> = Network::new();
        let start = net.add_node();
        let fin = net.add_node();
        net.node_mut(start).link(Arc::new(fin, &lit, ArcType::Simple));

        let mut proc = Processor::new(&net, &pool, start, R::new(0, src.len())).unwrap();
        proc.run().unwrap();
        assert!(proc.traces().is_empty());
    }

    #[test]
    fn dead_end_chain_is_reclaimed_back_to_an_empty_pool() {
        // start -[a]-> mid -[b]-> (never matches, input is exhausted)
        // neither state has any other arc to fall back on, so once `mid`'s
        // single arc fails to match, rollback must walk all the way back
        // through `mid` and `start`, not just evict `mid` alone.
        let pool = Pool::with_capacity(1 << 16);
        let src = b"a";
        let first = Literal { source: src, text: "a" };
        let second = Literal { source: src, text: "b" };
        let mut net: Network<usize> = Network::new();
        let start = net.add_node();
        let mid = net.add_node();
        let dead = net.add_node();
        net.node_mut(start).link(Arc::new(mid, &first, ArcType::Simple));
        net.node_mut(mid).link(Arc::new(dead, &second, ArcType::Simple));

        let mut proc = Processor::new(&net, &pool, start, R::new(0, src.len())).unwrap();
        proc.run().unwrap();
        assert!(proc.traces().is_empty());
        assert_eq!(pool.usage(), 0);
        assert!(pool.evicted_size() > 0);
    }

    #[test]
    fn a_sibling_dead_end_does_not_evict_an_ancestor_still_awaiting_its_own_arc() {
        // start's first arc leads one hop into `mid`, which then dead-ends
        // (its own single arc never matches); start's second arc reaches a
        // final node directly. `start` is requeued to try its second arc
        // before the `mid` branch is even explored (DFS pops the freshly
        // spawned `mid` state first), so by the time `mid`'s dead end rolls
        // back and the walk reaches `start` as an ancestor, `start` still
        // has that second arc pending — the walk must stop there rather
        // than evicting it.
        let pool = Pool::with_capacity(1 << 16);
        let src = b"ab";
        let into_mid = Literal { source: src, text: "a" };
        let dead_end = Literal { source: src, text: "xx" };
        let live_branch = Literal { source: src, text: "ab" };
        let mut net: Network<usize> = Network::new();
        let start = net.add_node();
        let mid = net.add_node();
        let dead = net.add_node();
        let fin = net.add_node();
        net.node_mut(start).link(Arc::new(mid, &into_mid, ArcType::Simple));
        net.node_mut(mid).link(Arc::new(dead, &dead_end, ArcType::Simple));
        net.node_mut(start).link(Arc::new(fin, &live_branch, ArcType::Simple));

        let mut proc = Processor::new(&net, &pool, start, R::new(0, src.len())).unwrap();
        proc.run().unwrap();
        assert_eq!(proc.traces().len(), 1);
        assert_eq!(proc.traces()[0].get().range, R::new(0, 2));
    }

    #[test]
    fn entanglement_keeps_only_the_higher_priority_branch() {
        let pool = Pool::with_capacity(1 << 16);
        let src = b"a";
        let lit = Literal { source: src, text: "a" };
        let mut net: Network<usize> = Network::new();
        let start = net.add_node();
        let low_fin = net.add_node();
        let high_fin = net.add_node();
        net.node_mut(start).link(Arc::new(low_fin, &lit, ArcType::Simple).with_entanglement(7, 1));
        net.node_mut(start).link(Arc::new(high_fin, &lit, ArcType::Simple).with_entanglement(7, 9));

        let mut proc = Processor::new(&net, &pool, start, R::new(0, src.len())).unwrap();
        proc.run().unwrap();
        assert_eq!(proc.traces().len(), 1);
        assert_eq!(proc.traces()[0].get().target, high_fin);
    }

    #[test]
    fn positive_lookahead_consumes_nothing_on_success() {
        let pool = Pool::with_capacity(1 << 16);
        let src = b"xy";
        let lookahead = Literal { source: src, text: "x" };
        let tail = Literal { source: src, text: "xy" };

        let mut net: Network<usize> = Network::new();
        let start = net.add_node();
        let sub_entry = net.add_node();
        let sub_final = net.add_node();
        let fin = net.add_node();
        net.node_mut(start).link(Arc::new(sub_entry, &lookahead, ArcType::Positive));
        net.node_mut(sub_entry).link(Arc::new(sub_final, &lookahead, ArcType::Simple));
        net.node_mut(start).link(Arc::new(fin, &tail, ArcType::Simple));

        let mut proc = Processor::new(&net, &pool, start, R::new(0, src.len())).unwrap();
        proc.run().unwrap();
        assert_eq!(proc.traces().len(), 1);
        assert_eq!(proc.traces()[0].get().range, R::new(0, 2));
    }

    #[test]
    fn negative_lookahead_blocks_caller_on_match() {
        let pool = Pool::with_capacity(1 << 16);
        let src = b"xy";
        let lookahead = Literal { source: src, text: "x" };
        let tail = Literal { source: src, text: "xy" };

        let mut net: Network<usize> = Network::new();
        let start = net.add_node();
        let sub_entry = net.add_node();
        let sub_final = net.add_node();
        let fin = net.add_node();
        net.node_mut(start).link(Arc::new(sub_entry, &lookahead, ArcType::Negative));
        net.node_mut(sub_entry).link(Arc::new(sub_final, &lookahead, ArcType::Simple));
        net.node_mut(start).link(Arc::new(fin, &tail, ArcType::Simple));

        let mut proc = Processor::new(&net, &pool, start, R::new(0, src.len())).unwrap();
        proc.run().unwrap();
        assert!(proc.traces().is_empty());
        assert!(proc.is_bfs());
    }

    #[test]
    fn negative_lookahead_survives_on_no_match() {
        let pool = Pool::with_capacity(1 << 16);
        let src = b"zy";
        let lookahead = Literal { source: src, text: "x" };
        let tail = Literal { source: src, text: "zy" };

        let mut net: Network<usize> = Network::new();
        let start = net.add_node();
        let sub_entry = net.add_node();
        let sub_final = net.add_node();
        let fin = net.add_node();
        net.node_mut(start).link(Arc::new(sub_entry, &lookahead, ArcType::Negative));
        net.node_mut(sub_entry).link(Arc::new(sub_final, &lookahead, ArcType::Simple));
        net.node_mut(start).link(Arc::new(fin, &tail, ArcType::Simple));

        let mut proc = Processor::new(&net, &pool, start, R::new(0, src.len())).unwrap();
        proc.run().unwrap();
        assert_eq!(proc.traces().len(), 1);
    }

    #[test]
    fn counting_observer_sees_every_pull() {
        let pool = Pool::with_capacity(1 << 16);
        let src = b"ab";
        let lit = Literal { source: src, text: "ab" };
        let mut net: Network<usize> = Network::new();
        let start = net.add_node();
        let fin = net.add_node();
        net.node_mut(start).link(Arc::new(fin, &lit, ArcType::Simple));

        let mut proc = Processor::new(&net, &pool, start, R::new(0, src.len())).unwrap();
        proc.set_observer(Box::new(CountingObserver::default()));
        proc.run().unwrap();
    }

    /// Zero-width acceptor: always matches, consuming nothing. Stands in for
    /// an invoked subnetwork body that does no matching of its own, so the
    /// test can isolate the Invoke/split mechanics from acceptor behavior.
    struct Epsilon;
    impl Acceptor<usize> for Epsilon {
        fn accept(&self, _input: R<usize>, last: R<usize>, sink: &mut dyn Spectrum<usize>) {
            sink.push(last.end, last.end);
        }
    }

    #[test]
    fn invoke_splits_and_reports_subtrace_end_as_caller_position() {
        let pool = Pool::with_capacity(1 << 16);
        let src = b"ab";
        let lit_a = Literal { source: src, text: "a" };
        let lit_b = Literal { source: src, text: "b" };
        let eps = Epsilon;

        let mut net: Network<usize> = Network::new();
        let start = net.add_node();
        let sub_entry = net.add_node();
        let sub_final = net.add_node();
        let fin = net.add_node();
        net.node_mut(start).link(Arc::new(sub_entry, &lit_a, ArcType::Invoke));
        net.node_mut(sub_entry).link(Arc::new(sub_final, &eps, ArcType::Simple));
        // the split produced when the invoke returns resumes enumerating
        // `start`'s own arcs at the index right after the Invoke arc.
        net.node_mut(start).link(Arc::new(fin, &lit_b, ArcType::Simple));

        let mut proc = Processor::new(&net, &pool, start, R::new(0, src.len())).unwrap();
        proc.run().unwrap();
        assert_eq!(proc.traces().len(), 1);
        assert_eq!(proc.traces()[0].get().range, R::new(1, 2));
    }
}
