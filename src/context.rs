//! Cooperative cancellation, threaded through every blocking operation in
//! the engine: goal streams, FD search, and SLG producer/consumer loops.
use crate::slg::table::SubgoalEntry;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A cancellation token plus (when evaluating inside a tabled predicate) the
/// calling [`SubgoalEntry`], used to record dependency edges in the SLG
/// engine. Cheap to clone: everything behind an `Arc`.
#[derive(Clone)]
pub struct Context {
    cancel: Arc<AtomicBool>,
    pub(crate) parent_subgoal: Option<Arc<SubgoalEntry>>,
}

impl Default for Context {
    fn default() -> Context {
        Context::new()
    }
}

impl Context {
    pub fn new() -> Context {
        Context {
            cancel: Arc::new(AtomicBool::new(false)),
            parent_subgoal: None,
        }
    }

    /// A child context that shares the same cancellation token but is
    /// scoped (for SLG dependency tracking) to a different parent subgoal.
    pub(crate) fn with_parent_subgoal(&self, parent: Arc<SubgoalEntry>) -> Context {
        Context {
            cancel: Arc::clone(&self.cancel),
            parent_subgoal: Some(parent),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    pub(crate) fn cancel_token(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn cancel_is_observed_through_clones() {
        let ctx = Context::new();
        let clone = ctx.clone();
        assert!(!clone.is_cancelled());
        ctx.cancel();
        assert!(clone.is_cancelled());
    }
}
