//! Goals: pure functions from a context and constraint store to a stream
//! of stores. `Solve::solve` is where every primitive and combinator
//! ultimately bottoms out; `Goal` is the `Arc<dyn Solve>` wrapper that
//! `Term::Atom(Atom::Goal(..))` carries so goals can be passed around as
//! first-class relational values (see `CallGoal`).
use crate::context::Context;
use crate::store::ConstraintStore;
use crate::stream::{self, Stream};
use crate::term::{Atom, Term, VarId};
use std::fmt;
use std::sync::Arc;

pub trait Solve: Send + Sync + fmt::Debug {
    fn solve(&self, ctx: &Context, store: ConstraintStore) -> Stream;
}

/// A goal is an `Arc<dyn Solve>` under the hood: cheap to clone, safe to
/// share across `rayon`-dispatched branches.
#[derive(Clone, Debug)]
pub struct Goal(Arc<dyn Solve>);

impl Goal {
    pub fn new(solve: impl Solve + 'static) -> Goal {
        Goal(Arc::new(solve))
    }

    pub fn solve(&self, ctx: &Context, store: ConstraintStore) -> Stream {
        self.0.solve(ctx, store)
    }

    /// Identity comparison used by `Term`'s `PartialEq`: two `Goal`
    /// values compare equal only when they wrap the very same `Solve`
    /// instance, since goals have no meaningful structural equality.
    pub fn ptr_eq(&self, other: &Goal) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

#[derive(Debug)]
struct Success;

impl Solve for Success {
    fn solve(&self, _ctx: &Context, store: ConstraintStore) -> Stream {
        Stream::single(store)
    }
}

#[derive(Debug)]
struct Failure;

impl Solve for Failure {
    fn solve(&self, _ctx: &Context, _store: ConstraintStore) -> Stream {
        Stream::empty()
    }
}

/// Always succeeds, producing the input store unchanged.
pub fn success() -> Goal {
    Goal::new(Success)
}

/// Never succeeds.
pub fn failure() -> Goal {
    Goal::new(Failure)
}

#[derive(Debug)]
struct Eq {
    a: Term,
    b: Term,
}

impl Solve for Eq {
    fn solve(&self, _ctx: &Context, store: ConstraintStore) -> Stream {
        match store.unify(&self.a, &self.b) {
            Some(unified) => Stream::single(unified),
            None => Stream::empty(),
        }
    }
}

/// Unifies `a` with `b`.
pub fn eq(a: Term, b: Term) -> Goal {
    Goal::new(Eq { a, b })
}

#[derive(Debug)]
struct Fresh {
    build: Arc<dyn Fn(Term) -> Goal + Send + Sync>,
}

impl Solve for Fresh {
    fn solve(&self, ctx: &Context, store: ConstraintStore) -> Stream {
        let var = Term::var(VarId::fresh());
        let goal = (self.build)(var);
        goal.solve(ctx, store)
    }
}

/// Introduces a fresh logic variable, handing it to `build` to produce
/// the goal that uses it.
pub fn fresh(build: impl Fn(Term) -> Goal + Send + Sync + 'static) -> Goal {
    Goal::new(Fresh {
        build: Arc::new(build),
    })
}

#[derive(Debug)]
struct CallGoal {
    term: Term,
}

impl Solve for CallGoal {
    fn solve(&self, ctx: &Context, store: ConstraintStore) -> Stream {
        match store.deep_walk(&self.term) {
            Term::Atom(Atom::Goal(goal)) => goal.solve(ctx, store),
            _ => Stream::empty(),
        }
    }
}

/// Invokes a `Term::Atom(Atom::Goal(..))` as a goal; any other term
/// shape fails.
pub fn call_goal(term: Term) -> Goal {
    Goal::new(CallGoal { term })
}

/// Shared default channel capacity for combinators that open their own
/// output stream.
pub(crate) fn default_channel() -> (stream::StreamSender, Stream) {
    stream::channel(Stream::default_capacity())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn success_yields_the_input_store_unchanged() {
        let ctx = Context::new();
        let store = ConstraintStore::new();
        let (stores, has_more) = success().solve(&ctx, store).take(2);
        assert_eq!(stores.len(), 1);
        assert!(!has_more);
    }

    #[test]
    fn failure_yields_nothing() {
        let ctx = Context::new();
        let (stores, has_more) = failure().solve(&ctx, ConstraintStore::new()).take(2);
        assert!(stores.is_empty());
        assert!(!has_more);
    }

    #[test]
    fn eq_unifies_or_fails() {
        let ctx = Context::new();
        let v = VarId::fresh();
        let (stores, _) = eq(Term::var(v), Term::int(7))
            .solve(&ctx, ConstraintStore::new())
            .take(2);
        assert_eq!(stores.len(), 1);
        assert_eq!(stores[0].walk(&Term::var(v)), Term::int(7));

        let (stores, _) = eq(Term::int(1), Term::int(2))
            .solve(&ctx, ConstraintStore::new())
            .take(2);
        assert!(stores.is_empty());
    }

    #[test]
    fn fresh_introduces_a_new_unbound_variable() {
        let ctx = Context::new();
        let captured: std::sync::Mutex<Option<Term>> = std::sync::Mutex::new(None);
        let goal = fresh(move |v| {
            *captured.lock().unwrap() = Some(v.clone());
            success()
        });
        let (stores, _) = goal.solve(&ctx, ConstraintStore::new()).take(1);
        assert_eq!(stores.len(), 1);
    }

    #[test]
    fn call_goal_invokes_a_wrapped_goal_term() {
        let ctx = Context::new();
        let wrapped = Term::goal(success());
        let (stores, _) = call_goal(wrapped).solve(&ctx, ConstraintStore::new()).take(1);
        assert_eq!(stores.len(), 1);

        let (stores, _) = call_goal(Term::int(1)).solve(&ctx, ConstraintStore::new()).take(1);
        assert!(stores.is_empty());
    }
}
