//! Soft-cut conditionals: `Ifte` ("if-then-else") and `Ifa` (committed
//! choice: cond truncated to its first answer).
use crate::context::Context;
use crate::goal::{default_channel, Goal, Solve};
use crate::store::ConstraintStore;
use crate::stream::Stream;

#[derive(Debug)]
pub struct Ifte {
    cond: Goal,
    then: Goal,
    els: Goal,
}

impl Ifte {
    pub fn new(cond: Goal, then: Goal, els: Goal) -> Goal {
        Goal::new(Ifte { cond, then, els })
    }
}

impl Solve for Ifte {
    fn solve(&self, ctx: &Context, store: ConstraintStore) -> Stream {
        let (sender, out) = default_channel();
        let ctx = ctx.clone();
        let then = self.then.clone();
        let els = self.els.clone();
        let cond_stream = self.cond.solve(&ctx, store.clone());

        rayon::spawn(move || {
            let (first_batch, mut has_more) = cond_stream.take_cancellable(1, &ctx);
            if first_batch.is_empty() && !has_more {
                if ctx.is_cancelled() {
                    sender.close();
                    return;
                }
                let branch = els.solve(&ctx, store);
                forward_all(&branch, &sender, &ctx);
                sender.close();
                return;
            }

            let mut pending = first_batch;
            loop {
                if ctx.is_cancelled() {
                    break;
                }
                for cond_answer in pending.drain(..) {
                    let branch = then.solve(&ctx, cond_answer);
                    forward_all(&branch, &sender, &ctx);
                }
                if !has_more {
                    break;
                }
                let (next_batch, more) = cond_stream.take_cancellable(1, &ctx);
                pending = next_batch;
                has_more = more;
                if pending.is_empty() && !has_more {
                    break;
                }
            }
            sender.close();
        });

        out
    }
}

fn forward_all(stream: &Stream, sender: &crate::stream::StreamSender, ctx: &Context) {
    loop {
        if ctx.is_cancelled() {
            return;
        }
        let (batch, has_more) = stream.take_cancellable(1, ctx);
        for store in batch {
            if !sender.put(store) {
                return;
            }
        }
        if !has_more {
            break;
        }
    }
}

#[derive(Debug)]
pub struct Ifa {
    cond: Goal,
    then: Goal,
    els: Goal,
}

impl Ifa {
    pub fn new(cond: Goal, then: Goal, els: Goal) -> Goal {
        Goal::new(Ifa { cond, then, els })
    }
}

impl Solve for Ifa {
    fn solve(&self, ctx: &Context, store: ConstraintStore) -> Stream {
        if ctx.is_cancelled() {
            return Stream::empty();
        }
        let cond_stream = self.cond.solve(ctx, store.clone());
        let (first_batch, _) = cond_stream.take_cancellable(1, ctx);
        match first_batch.into_iter().next() {
            Some(cond_answer) => self.then.solve(ctx, cond_answer),
            None => self.els.solve(ctx, store),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::goal::{eq, failure, success};
    use crate::term::{Term, VarId};

    #[test]
    fn ifte_runs_then_for_every_cond_answer() {
        let ctx = Context::new();
        let x = VarId::fresh();
        let y = VarId::fresh();
        let cond = crate::combinator::disj::Disj::new(
            eq(Term::var(x), Term::int(1)),
            eq(Term::var(x), Term::int(2)),
        );
        let goal = Ifte::new(cond, eq(Term::var(y), Term::int(9)), failure());
        let (stores, _) = goal.solve(&ctx, ConstraintStore::new()).take(10);
        assert_eq!(stores.len(), 2);
        for s in &stores {
            assert_eq!(s.walk(&Term::var(y)), Term::int(9));
        }
    }

    #[test]
    fn ifte_runs_else_when_cond_is_empty() {
        let ctx = Context::new();
        let y = VarId::fresh();
        let goal = Ifte::new(failure(), success(), eq(Term::var(y), Term::int(42)));
        let (stores, _) = goal.solve(&ctx, ConstraintStore::new()).take(10);
        assert_eq!(stores.len(), 1);
        assert_eq!(stores[0].walk(&Term::var(y)), Term::int(42));
    }

    #[test]
    fn ifa_commits_to_the_first_cond_answer_only() {
        let ctx = Context::new();
        let x = VarId::fresh();
        let y = VarId::fresh();
        let cond = crate::combinator::disj::Disj::new(
            eq(Term::var(x), Term::int(1)),
            eq(Term::var(x), Term::int(2)),
        );
        let goal = Ifa::new(cond, eq(Term::var(y), Term::int(9)), failure());
        let (stores, _) = goal.solve(&ctx, ConstraintStore::new()).take(10);
        assert_eq!(stores.len(), 1);
    }
}
