//! Immutable traversal-history records, compressed into four constructional
//! variants: `Common` (an ordinary arc traversal) and three split kinds
//! produced when a call frame (Invoke/Extend/Positive) returns.
//!
//! Every resolvable field (`ancestor`, `callee`, `caller`, `arc`, `range`) is
//! computed once at construction time and stored directly, rather than
//! delegated lazily through a caller chain the way the original's
//! offset-compressed C++ layout does — that layout is a memory optimization,
//! not part of the correctness contract (the only load-bearing invariant is
//! ancestor-below-descendant addressing).

use crate::context::ContextRef;
use std::cell::{Cell, RefCell};
use std::cmp::Ordering;
use traverse_core::{Arc, NodeId, Pool, PoolError, PoolRef, Range};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StateKind {
    Common,
    Split,
    SplitShifted,
    SplitExtended,
}

pub struct State<'a, P> {
    pub kind: StateKind,
    /// The arc this state is considered to have been reached by — its own
    /// traversed arc for `Common`, the caller's for every split kind.
    pub arc: Option<&'a Arc<'a, P>>,
    pub range: Range<P>,
    pub ancestor: Option<StateRef<'a, P>>,
    pub callee: Option<StateRef<'a, P>>,
    /// Debug-only: the caller state a split was produced from. `None` for
    /// `Common`.
    pub caller: Option<StateRef<'a, P>>,
    /// Node whose outgoing arcs this state continues from.
    pub target: NodeId,
    context: RefCell<Option<ContextRef>>,
    context_owned: Cell<bool>,
    blocked: Cell<bool>,
    next_arc_index: Cell<usize>,
    pub entanglement_id: u32,
    pub priority: i32,
}

impl<'a, P: Copy> State<'a, P> {
    pub fn is_blocked(&self) -> bool {
        self.blocked.get()
    }

    /// Marks this state blocked. Blocking an already-blocked state is a
    /// logic violation in the original; here it is simply idempotent, since
    /// the filter algorithm may revisit the same state via more than one
    /// container (queue/traces/deferred) in a single sweep.
    pub fn block(&self) {
        self.blocked.set(true);
    }

    pub fn context_handle(&self) -> Option<ContextRef> {
        self.context.borrow().clone()
    }

    pub fn context_owned(&self) -> bool {
        self.context_owned.get()
    }

    pub fn set_context(&self, ctx: Option<ContextRef>, owned: bool) {
        *self.context.borrow_mut() = ctx;
        self.context_owned.set(owned);
    }

    pub fn next_arc_index(&self) -> usize {
        self.next_arc_index.get()
    }

    pub fn advance_arc_index(&self) {
        self.next_arc_index.set(self.next_arc_index.get() + 1);
    }
}

/// A handle into the [`Pool`] holding `State` values. `Ord`/`PartialOrd` are
/// literal address comparisons — load-bearing for the ancestor-ordering
/// invariant and for the entanglement spawner comparator.
pub struct StateRef<'a, P>(pub PoolRef<State<'a, P>>);

impl<'a, P> StateRef<'a, P> {
    pub fn address(&self) -> usize {
        self.0.address()
    }

    /// # Safety
    /// The owning `Pool` must still be alive and must not have evicted this
    /// state. The engine upholds this by only ever dereferencing states it
    /// currently has queued, traced, or deferred.
    pub fn get(&self) -> &State<'a, P> {
        unsafe { self.0.get() }
    }
}

impl<'a, P> Clone for StateRef<'a, P> {
    fn clone(&self) -> Self {
        StateRef(self.0)
    }
}
impl<'a, P> Copy for StateRef<'a, P> {}

impl<'a, P> PartialEq for StateRef<'a, P> {
    fn eq(&self, other: &Self) -> bool {
        self.address() == other.address()
    }
}
impl<'a, P> Eq for StateRef<'a, P> {}

impl<'a, P> PartialOrd for StateRef<'a, P> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl<'a, P> Ord for StateRef<'a, P> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.address().cmp(&other.address())
    }
}

impl<'a, P: Copy> StateRef<'a, P> {
    /// Build the root state seeding a run: no ancestor/callee/caller/arc,
    /// positioned at `entry` with the initial (empty) range at `start`.
    pub fn seed(pool: &'a Pool, entry: NodeId, start: P) -> Result<Self, PoolError> {
        let state = State {
            kind: StateKind::Common,
            arc: None,
            range: Range::new(start, start),
            ancestor: None,
            callee: None,
            caller: None,
            target: entry,
            context: RefCell::new(None),
            context_owned: Cell::new(false),
            blocked: Cell::new(false),
            next_arc_index: Cell::new(0),
            entanglement_id: 0,
            priority: 0,
        };
        Ok(StateRef(pool.allocate(state)?))
    }

    /// Build the `Common` descendant reached by traversing `arc` from `from`
    /// with accepted `range`.
    pub fn common(
        pool: &'a Pool,
        from: StateRef<'a, P>,
        arc: &'a Arc<'a, P>,
        range: Range<P>,
    ) -> Result<Self, PoolError> {
        let callee = if arc.arc_type == traverse_core::ArcType::Simple {
            from.get().callee
        } else {
            None // patched to Some(self) below once the address is known
        };
        let state = State {
            kind: StateKind::Common,
            arc: Some(arc),
            range,
            ancestor: Some(from),
            callee,
            caller: None,
            target: arc.target,
            context: RefCell::new(None),
            context_owned: Cell::new(false),
            blocked: Cell::new(false),
            next_arc_index: Cell::new(0),
            entanglement_id: arc.entanglement_id,
            priority: arc.priority,
        };
        let r = pool.allocate(state)?;
        let self_ref = StateRef(r);
        if arc.arc_type != traverse_core::ArcType::Simple {
            // SAFETY: no other reference to this freshly allocated state
            // exists yet.
            unsafe {
                r.get_mut().callee = Some(self_ref);
            }
        }
        Ok(self_ref)
    }

    /// Positive lookahead return: shares `caller`'s range/arc/target;
    /// ancestor becomes the caller's own ancestor.
    ///
    /// `next_arc_index` is inherited from `caller`, not reset to zero: by
    /// construction `caller` already advanced past the Positive arc before
    /// its sub-call was dispatched (`Processor::process_outgoing` advances
    /// the index, then calls `accept`, then breaks), so resuming at index 0
    /// here would re-enter the very arc that produced this split.
    pub fn split_positive(pool: &'a Pool, caller: StateRef<'a, P>) -> Result<Self, PoolError> {
        let k = caller.get();
        let state = State {
            kind: StateKind::Split,
            arc: k.arc,
            range: k.range,
            ancestor: k.ancestor,
            callee: k.callee,
            caller: Some(caller),
            target: k.target,
            context: RefCell::new(None),
            context_owned: Cell::new(false),
            blocked: Cell::new(false),
            next_arc_index: Cell::new(k.next_arc_index()),
            entanglement_id: 0,
            priority: 0,
        };
        Ok(StateRef(pool.allocate(state)?))
    }

    /// Invoke return: continuation is the caller's outgoing arcs (resuming
    /// at `caller`'s already-advanced arc index, see `split_positive`),
    /// reported position/ancestor is the returning sub-trace's tail
    /// (`shift`).
    pub fn split_shifted(
        pool: &'a Pool,
        caller: StateRef<'a, P>,
        shift: StateRef<'a, P>,
    ) -> Result<Self, PoolError> {
        let k = caller.get();
        let s = shift.get();
        let state = State {
            kind: StateKind::SplitShifted,
            arc: k.arc,
            range: s.range,
            ancestor: Some(shift),
            callee: k.callee,
            caller: Some(caller),
            target: k.target,
            context: RefCell::new(None),
            context_owned: Cell::new(false),
            blocked: Cell::new(false),
            next_arc_index: Cell::new(k.next_arc_index()),
            entanglement_id: 0,
            priority: 0,
        };
        Ok(StateRef(pool.allocate(state)?))
    }

    /// Extend return: like `split_shifted`, but the reported range absorbs
    /// the consumed region from the caller's range-end through the
    /// sub-trace's range-end.
    pub fn split_extended(
        pool: &'a Pool,
        caller: StateRef<'a, P>,
        shift: StateRef<'a, P>,
    ) -> Result<Self, PoolError> {
        let k = caller.get();
        let s = shift.get();
        let state = State {
            kind: StateKind::SplitExtended,
            arc: k.arc,
            range: Range::new(k.range.end, s.range.end),
            ancestor: Some(shift),
            callee: k.callee,
            caller: Some(caller),
            target: k.target,
            context: RefCell::new(None),
            context_owned: Cell::new(false),
            blocked: Cell::new(false),
            next_arc_index: Cell::new(k.next_arc_index()),
            entanglement_id: 0,
            priority: 0,
        };
        Ok(StateRef(pool.allocate(state)?))
    }

    /// The context currently visible from this state without creating one:
    /// if this state has no context of its own, walk ancestors until one is
    /// found, compressing the path by setting every intermediate state's
    /// context pointer to the same (borrowed) handle along the way so
    /// repeated lookups are O(1) amortized.
    pub fn visible_context(&self) -> Option<ContextRef> {
        if let Some(ctx) = self.get().context_handle() {
            return Some(ctx);
        }
        let mut unresolved = vec![*self];
        let mut cur = self.get().ancestor;
        let found = loop {
            match cur {
                None => break None,
                Some(a) => {
                    if let Some(ctx) = a.get().context_handle() {
                        break Some(ctx);
                    }
                    unresolved.push(a);
                    cur = a.get().ancestor;
                }
            }
        };
        if let Some(ctx) = &found {
            for s in unresolved {
                s.get().set_context(Some(ctx.clone()), false);
            }
        }
        found
    }

    /// This state's own owned context, creating one parented on
    /// `visible_context()` the first time it is needed. This is the
    /// borrowed-to-owned upgrade `ref()` triggers.
    pub fn owned_context(&self) -> ContextRef {
        if self.get().context_owned() {
            return self.get().context_handle().expect("context_owned implies a context is set");
        }
        let parent = self.visible_context();
        let ctx = crate::context::Context::new(parent);
        self.get().set_context(Some(ctx.clone()), true);
        ctx
    }
}
