//! Disjunction: the two branches run concurrently, each dispatched onto
//! `rayon`; the consumer sees every answer from both, in unspecified but
//! fair interleaving (the distilled spec only requires tests to compare
//! branch outputs as sets).
use crate::context::Context;
use crate::goal::{default_channel, Goal, Solve};
use crate::store::ConstraintStore;
use crate::stream::Stream;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug)]
pub struct Disj {
    goal_1: Goal,
    goal_2: Goal,
}

impl Disj {
    pub fn new(goal_1: Goal, goal_2: Goal) -> Goal {
        Goal::new(Disj { goal_1, goal_2 })
    }
}

fn spawn_branch(
    ctx: &Context,
    store: &ConstraintStore,
    goal: Goal,
    sender: crate::stream::StreamSender,
    outstanding: Arc<AtomicUsize>,
) {
    let ctx = ctx.clone();
    let store = store.clone();
    rayon::spawn(move || {
        let branch = goal.solve(&ctx, store);
        loop {
            if ctx.is_cancelled() {
                break;
            }
            let (batch, has_more) = branch.take_cancellable(1, &ctx);
            for s in batch {
                if !sender.put(s) {
                    break;
                }
            }
            if !has_more {
                break;
            }
        }
        if outstanding.fetch_sub(1, Ordering::AcqRel) == 1 {
            sender.close();
        }
    });
}

impl Solve for Disj {
    fn solve(&self, ctx: &Context, store: ConstraintStore) -> Stream {
        let (sender, out) = default_channel();
        let outstanding = Arc::new(AtomicUsize::new(2));
        spawn_branch(ctx, &store, self.goal_1.clone(), sender.clone(), Arc::clone(&outstanding));
        spawn_branch(ctx, &store, self.goal_2.clone(), sender, outstanding);
        out
    }
}

/// An n-ary disjunction of conjunctive clauses: each element of `branches`
/// is typically itself a `Conj` chain representing one `conde` clause.
#[derive(Debug)]
pub struct Conde {
    branches: Vec<Goal>,
}

impl Conde {
    pub fn new(branches: Vec<Goal>) -> Goal {
        Goal::new(Conde { branches })
    }
}

impl Solve for Conde {
    fn solve(&self, ctx: &Context, store: ConstraintStore) -> Stream {
        let (sender, out) = default_channel();
        let outstanding = Arc::new(AtomicUsize::new(self.branches.len().max(1)));
        if self.branches.is_empty() {
            sender.close();
            return out;
        }
        for branch in &self.branches {
            spawn_branch(ctx, &store, branch.clone(), sender.clone(), Arc::clone(&outstanding));
        }
        out
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::goal::eq;
    use crate::term::{Term, VarId};
    use std::collections::HashSet;

    #[test]
    fn disj_yields_both_branches() {
        let ctx = Context::new();
        let x = VarId::fresh();
        let goal = Disj::new(eq(Term::var(x), Term::int(1)), eq(Term::var(x), Term::int(2)));
        let (stores, has_more) = goal.solve(&ctx, ConstraintStore::new()).take(5);
        assert_eq!(stores.len(), 2);
        assert!(!has_more);
        let values: HashSet<i64> = stores
            .iter()
            .map(|s| s.walk(&Term::var(x)).as_int().unwrap())
            .collect();
        assert_eq!(values, [1, 2].into_iter().collect());
    }

    #[test]
    fn conde_yields_every_clause() {
        let ctx = Context::new();
        let x = VarId::fresh();
        let branches = vec![
            eq(Term::var(x), Term::int(1)),
            eq(Term::var(x), Term::int(2)),
            eq(Term::var(x), Term::int(3)),
        ];
        let (stores, _) = Conde::new(branches).solve(&ctx, ConstraintStore::new()).take(10);
        assert_eq!(stores.len(), 3);
    }
}
