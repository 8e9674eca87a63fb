//! Cooperative cancellation: a cancelled `Context` stops a `run_with_context`
//! query short, reporting whatever was collected and never blocking on a
//! producer that will never close on its own.
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use vulcan_core::context::Context;
use vulcan_core::goal::{fresh, Goal, Solve};
use vulcan_core::run::run_with_context;
use vulcan_core::store::ConstraintStore;
use vulcan_core::stream::Stream;
use vulcan_core::term::Term;

/// A goal whose stream never closes and never produces an answer --
/// the only way a consumer escapes is by observing cancellation.
#[derive(Debug)]
struct Stall;

impl Solve for Stall {
    fn solve(&self, _ctx: &Context, _store: ConstraintStore) -> Stream {
        let (sender, stream) = vulcan_core::stream::channel(1);
        std::mem::forget(sender);
        stream
    }
}

#[test]
fn cancelling_the_context_unblocks_a_stalled_query() {
    let ctx = Context::new();
    let cancel_ctx = ctx.clone();
    let started = Arc::new(AtomicUsize::new(0));
    let started2 = Arc::clone(&started);

    let handle = thread::spawn(move || {
        run_with_context(&ctx, 5, move |_q| {
            started2.fetch_add(1, Ordering::SeqCst);
            Goal::new(Stall)
        })
    });

    while started.load(Ordering::SeqCst) == 0 {
        thread::sleep(Duration::from_millis(5));
    }
    cancel_ctx.cancel();

    let results = handle.join().expect("query thread must return after cancellation");
    assert!(results.is_empty());
}

#[test]
fn fresh_goal_also_observes_cancellation_before_dispatch() {
    let ctx = Context::new();
    ctx.cancel();
    let results = run_with_context(&ctx, 5, |q| fresh(move |_| vulcan_core::goal::eq(q.clone(), Term::int(1))));
    assert!(results.is_empty());
}
