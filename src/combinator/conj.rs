//! Conjunction: every answer of `goal_1` is extended with every answer of
//! `goal_2` run over it. Per-answer continuations dispatch onto `rayon`
//! so a later `goal_1` answer's `goal_2` run can overlap an earlier one's,
//! while the consumer still sees each `goal_1` answer's continuation fed
//! in the order `goal_1` produced it.
use crate::context::Context;
use crate::goal::{default_channel, Goal, Solve};
use crate::store::ConstraintStore;
use crate::stream::Stream;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug)]
pub struct Conj {
    goal_1: Goal,
    goal_2: Goal,
}

impl Conj {
    pub fn new(goal_1: Goal, goal_2: Goal) -> Goal {
        Goal::new(Conj { goal_1, goal_2 })
    }
}

impl Solve for Conj {
    fn solve(&self, ctx: &Context, store: ConstraintStore) -> Stream {
        let (sender, out) = default_channel();
        let ctx = ctx.clone();
        let goal_2 = self.goal_2.clone();
        let first = self.goal_1.solve(&ctx, store);

        rayon::spawn(move || {
            let outstanding = Arc::new(AtomicUsize::new(1));
            loop {
                if ctx.is_cancelled() {
                    break;
                }
                let (batch, has_more) = first.take_cancellable(1, &ctx);
                for answer in batch {
                    outstanding.fetch_add(1, Ordering::AcqRel);
                    let sender = sender.clone();
                    let ctx = ctx.clone();
                    let goal_2 = goal_2.clone();
                    let outstanding = Arc::clone(&outstanding);
                    rayon::spawn(move || {
                        let second = goal_2.solve(&ctx, answer);
                        loop {
                            if ctx.is_cancelled() {
                                break;
                            }
                            let (batch, more) = second.take_cancellable(1, &ctx);
                            for store in batch {
                                if !sender.put(store) {
                                    break;
                                }
                            }
                            if !more {
                                break;
                            }
                        }
                        if outstanding.fetch_sub(1, Ordering::AcqRel) == 1 {
                            sender.close();
                        }
                    });
                }
                if !has_more {
                    break;
                }
            }
            if outstanding.fetch_sub(1, Ordering::AcqRel) == 1 {
                sender.close();
            }
        });

        out
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::goal::{eq, success};
    use crate::term::{Term, VarId};

    #[test]
    fn conj_unifies_both_sides() {
        let ctx = Context::new();
        let x = VarId::fresh();
        let y = VarId::fresh();
        let goal = Conj::new(eq(Term::var(x), Term::int(1)), eq(Term::var(y), Term::int(2)));
        let (stores, has_more) = goal.solve(&ctx, ConstraintStore::new()).take(5);
        assert_eq!(stores.len(), 1);
        assert!(!has_more);
        assert_eq!(stores[0].walk(&Term::var(x)), Term::int(1));
        assert_eq!(stores[0].walk(&Term::var(y)), Term::int(2));
    }

    #[test]
    fn conj_with_failing_second_goal_yields_nothing() {
        let ctx = Context::new();
        let goal = Conj::new(success(), crate::goal::failure());
        let (stores, _) = goal.solve(&ctx, ConstraintStore::new()).take(5);
        assert!(stores.is_empty());
    }
}
