//! Optional semantic actions attached to nodes and arcs.
//!
//! An action runs when a state enters its target node, after the state has
//! survived allocation but before it is queued for arc enumeration. It may
//! veto the state by returning [`FlowControl`], which the processor turns
//! into a `Deny` event rather than propagating as an error — a malformed
//! action cannot fail a run, only prune a branch of it.

use crate::context::ContextRef;
use crate::errors::FlowControl;
use traverse_core::Range;

/// What an [`Action`] sees when it runs.
pub trait ActionContext<P> {
    /// The range this state was reached with.
    fn range(&self) -> Range<P>;

    /// This state's own trace-variable context, upgrading it from borrowed
    /// to owned on first access (see `crate::state::StateRef::owned_context`).
    fn context(&self) -> ContextRef;
}

/// A side effect run on state entry. Actions are owned externally; the
/// processor only ever holds a shared `Rc<dyn Action<P>>` registration, so
/// the same action instance can be attached to more than one arc or node.
pub trait Action<P> {
    fn enter(&self, state: &dyn ActionContext<P>) -> Result<(), FlowControl>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use std::cell::Cell;

    struct View {
        range: Range<u32>,
        ctx: ContextRef,
    }
    impl ActionContext<u32> for View {
        fn range(&self) -> Range<u32> {
            self.range
        }
        fn context(&self) -> ContextRef {
            self.ctx.clone()
        }
    }

    struct DenyIfEmpty;
    impl Action<u32> for DenyIfEmpty {
        fn enter(&self, state: &dyn ActionContext<u32>) -> Result<(), FlowControl> {
            if state.range().begin == state.range().end {
                Err(FlowControl)
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn action_can_veto_zero_width_entry() {
        let view = View { range: Range::new(3, 3), ctx: Context::new_root() };
        assert!(DenyIfEmpty.enter(&view).is_err());
    }

    struct CountEntries(Cell<u32>);
    impl Action<u32> for CountEntries {
        fn enter(&self, _state: &dyn ActionContext<u32>) -> Result<(), FlowControl> {
            self.0.set(self.0.get() + 1);
            Ok(())
        }
    }

    #[test]
    fn action_runs_as_a_plain_side_effect() {
        let view = View { range: Range::new(0, 1), ctx: Context::new_root() };
        let counter = CountEntries(Cell::new(0));
        counter.enter(&view).unwrap();
        counter.enter(&view).unwrap();
        assert_eq!(counter.0.get(), 2);
    }
}
