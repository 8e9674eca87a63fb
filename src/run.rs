//! The top-level query surface: open a fresh query variable, build the
//! caller's goal around it, drain up to `n` answers, and deep-walk the
//! query variable under each resulting store.
use crate::context::Context;
use crate::goal::Goal;
use crate::store::ConstraintStore;
use crate::term::{Term, VarId};

/// Runs `f(q)` for a fresh query variable `q`, collecting up to `n_max`
/// answers (deep-walked values of `q`).
pub fn run(n_max: usize, f: impl FnOnce(Term) -> Goal) -> Vec<Term> {
    run_with_context(&Context::new(), n_max, f)
}

/// As [`run`], but threading an explicit [`Context`] so a caller can
/// cancel the search (e.g. from another thread) or nest it under an SLG
/// parent subgoal.
pub fn run_with_context(ctx: &Context, n_max: usize, f: impl FnOnce(Term) -> Goal) -> Vec<Term> {
    let q = Term::var(VarId::fresh());
    let goal = f(q.clone());
    let stream = goal.solve(ctx, ConstraintStore::new());

    let mut results = Vec::new();
    while results.len() < n_max {
        let remaining = n_max - results.len();
        let (batch, has_more) = stream.take_cancellable(remaining, ctx);
        let batch_len = batch.len();
        for store in batch {
            results.push(store.deep_walk(&q));
        }
        if !has_more || batch_len == 0 {
            break;
        }
    }
    results
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::combinator::Disj;
    use crate::goal::eq;

    #[test]
    fn run_collects_up_to_n_answers() {
        let results = run(10, |q| {
            Disj::new(eq(q.clone(), Term::int(1)), eq(q, Term::int(2)))
        });
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn run_respects_n_max() {
        let results = run(1, |q| {
            Disj::new(eq(q.clone(), Term::int(1)), eq(q, Term::int(2)))
        });
        assert_eq!(results.len(), 1);
    }
}
