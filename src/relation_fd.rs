//! Relational convenience goals over the FD solver: `in_fd`, the
//! arithmetic links, and the global constraints, each expressed as an
//! ordinary [`Goal`] that resolves its `Term` arguments to FD variables
//! (the same `VarId`s relational logic variables use) and posts the
//! corresponding [`crate::fd::state::Constraint`] to the store.
use crate::context::Context;
use crate::error::Error;
use crate::fd::constraints::{AllDifferent, DivFd, LinearSum, MinusFd, ModFd, PlusFd, TimesFd};
use crate::fd::domain::Domain;
use crate::fd::state::Constraint;
use crate::fd::var::FdVar;
use crate::goal::{Goal, Solve};
use crate::store::ConstraintStore;
use crate::stream::Stream;
use crate::term::Term;
use std::sync::Arc;

fn resolve_var(store: &ConstraintStore, t: &Term) -> Option<FdVar> {
    store.walk(t).as_var()
}

fn post_or_fail(store: ConstraintStore, constraint: Arc<dyn Constraint>) -> Stream {
    match store.post(constraint) {
        Ok(next) => Stream::single(next),
        Err(Error::Inconsistent) | Err(Error::DomainEmpty(_)) => Stream::empty(),
        Err(_) => Stream::empty(),
    }
}

#[derive(Debug)]
struct InFd {
    term: Term,
    max_value: i64,
    values: Vec<i64>,
}

impl Solve for InFd {
    fn solve(&self, _ctx: &Context, store: ConstraintStore) -> Stream {
        let domain = Domain::from_values(self.max_value, &self.values);
        match store.walk(&self.term) {
            Term::Var(id, _) => {
                let existing = store
                    .get_domain(id)
                    .cloned()
                    .unwrap_or_else(|| Domain::full(self.max_value));
                let narrowed = existing.intersect(&domain);
                if narrowed.is_empty() {
                    return Stream::empty();
                }
                Stream::single(store.ensure_fd_var(id, Domain::full(self.max_value)).set_domain(id, narrowed))
            }
            Term::Atom(crate::term::Atom::Int(v)) if domain.has(v) => Stream::single(store),
            _ => Stream::empty(),
        }
    }
}

/// Constrains `term` (a logic variable or a ground integer) to lie in
/// `values`, within the universe `[1..=max_value]`.
pub fn in_fd(term: Term, max_value: i64, values: Vec<i64>) -> Goal {
    Goal::new(InFd {
        term,
        max_value,
        values,
    })
}

macro_rules! ternary_fd_goal {
    ($struct_name:ident, $fn_name:ident, $constraint:ident) => {
        #[derive(Debug)]
        struct $struct_name {
            x: Term,
            y: Term,
            z: Term,
        }

        impl Solve for $struct_name {
            fn solve(&self, _ctx: &Context, store: ConstraintStore) -> Stream {
                let (x, y, z) = match (
                    resolve_var(&store, &self.x),
                    resolve_var(&store, &self.y),
                    resolve_var(&store, &self.z),
                ) {
                    (Some(x), Some(y), Some(z)) => (x, y, z),
                    _ => return Stream::empty(),
                };
                post_or_fail(store, Arc::new($constraint { x, y, z }))
            }
        }

        pub fn $fn_name(x: Term, y: Term, z: Term) -> Goal {
            Goal::new($struct_name { x, y, z })
        }
    };
}

ternary_fd_goal!(PlusFdGoal, plus_fd, PlusFd);
ternary_fd_goal!(MinusFdGoal, minus_fd, MinusFd);
ternary_fd_goal!(TimesFdGoal, times_fd, TimesFd);
ternary_fd_goal!(DivFdGoal, div_fd, DivFd);
ternary_fd_goal!(ModFdGoal, mod_fd, ModFd);

#[derive(Debug)]
struct AllDifferentFd {
    vars: Vec<Term>,
}

impl Solve for AllDifferentFd {
    fn solve(&self, _ctx: &Context, store: ConstraintStore) -> Stream {
        let ids: Option<Vec<FdVar>> = self.vars.iter().map(|t| resolve_var(&store, t)).collect();
        match ids {
            Some(ids) => post_or_fail(store, Arc::new(AllDifferent::new(ids))),
            None => Stream::empty(),
        }
    }
}

/// Constrains every term in `vars` to a distinct value.
pub fn all_different_fd(vars: Vec<Term>) -> Goal {
    Goal::new(AllDifferentFd { vars })
}

#[derive(Debug)]
struct LinearSumFd {
    terms: Vec<(i64, Term)>,
    total: i64,
}

impl Solve for LinearSumFd {
    fn solve(&self, _ctx: &Context, store: ConstraintStore) -> Stream {
        let resolved: Option<Vec<(i64, FdVar)>> = self
            .terms
            .iter()
            .map(|(coeff, t)| resolve_var(&store, t).map(|v| (*coeff, v)))
            .collect();
        match resolved {
            Some(terms) => post_or_fail(store, Arc::new(LinearSum::new(terms, self.total))),
            None => Stream::empty(),
        }
    }
}

/// Constrains `sum(coeff * var) = total` over `terms`.
pub fn linear_sum_fd(terms: Vec<(i64, Term)>, total: i64) -> Goal {
    Goal::new(LinearSumFd { terms, total })
}

#[derive(Debug)]
struct LtFd {
    x: Term,
    y: Term,
}

impl Solve for LtFd {
    fn solve(&self, _ctx: &Context, store: ConstraintStore) -> Stream {
        let (x, y) = match (resolve_var(&store, &self.x), resolve_var(&store, &self.y)) {
            (Some(x), Some(y)) => (x, y),
            _ => return Stream::empty(),
        };
        let dx = store.get_domain(x).cloned();
        let dy = store.get_domain(y).cloned();
        match (dx, dy) {
            (Some(dx), Some(dy)) => {
                let y_max = match dy.max() {
                    Some(v) => v,
                    None => return Stream::empty(),
                };
                let x_min = match dx.min() {
                    Some(v) => v,
                    None => return Stream::empty(),
                };
                let new_x = dx.intersect(&Domain::range(dx.max_value(), 1, y_max - 1));
                let new_y = dy.intersect(&Domain::range(dy.max_value(), x_min + 1, dy.max_value()));
                if new_x.is_empty() || new_y.is_empty() {
                    return Stream::empty();
                }
                let next = store.set_domain(x, new_x).set_domain(y, new_y);
                match next.propagate() {
                    Ok(next) => Stream::single(next),
                    Err(_) => Stream::empty(),
                }
            }
            _ => Stream::empty(),
        }
    }
}

/// `x < y` over FD variables with existing domains (post `in_fd` first).
pub fn lt_fd(x: Term, y: Term) -> Goal {
    Goal::new(LtFd { x, y })
}

/// `x <= y`, expressed as `x < y + 1` over a variable scaled to the same
/// universe as `y`. Implemented directly (rather than via `lt_fd` plus a
/// fresh successor variable) so it stays a single constraint post.
#[derive(Debug)]
struct LteFd {
    x: Term,
    y: Term,
}

impl Solve for LteFd {
    fn solve(&self, _ctx: &Context, store: ConstraintStore) -> Stream {
        let (x, y) = match (resolve_var(&store, &self.x), resolve_var(&store, &self.y)) {
            (Some(x), Some(y)) => (x, y),
            _ => return Stream::empty(),
        };
        let dx = store.get_domain(x).cloned();
        let dy = store.get_domain(y).cloned();
        match (dx, dy) {
            (Some(dx), Some(dy)) => {
                let y_max = match dy.max() {
                    Some(v) => v,
                    None => return Stream::empty(),
                };
                let x_min = match dx.min() {
                    Some(v) => v,
                    None => return Stream::empty(),
                };
                let new_x = dx.intersect(&Domain::range(dx.max_value(), 1, y_max));
                let new_y = dy.intersect(&Domain::range(dy.max_value(), x_min, dy.max_value()));
                if new_x.is_empty() || new_y.is_empty() {
                    return Stream::empty();
                }
                let next = store.set_domain(x, new_x).set_domain(y, new_y);
                match next.propagate() {
                    Ok(next) => Stream::single(next),
                    Err(_) => Stream::empty(),
                }
            }
            _ => Stream::empty(),
        }
    }
}

/// `x <= y` over FD variables with existing domains (post `in_fd` first).
pub fn lte_fd(x: Term, y: Term) -> Goal {
    Goal::new(LteFd { x, y })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::combinator::Conj;
    use crate::run::run;
    use crate::term::{Term, VarId};

    #[test]
    fn in_fd_narrows_a_fresh_variable() {
        let ctx = Context::new();
        let x = VarId::fresh();
        let goal = in_fd(Term::var(x), 5, vec![2, 3]);
        let (stores, _) = goal.solve(&ctx, ConstraintStore::new()).take(1);
        assert_eq!(stores.len(), 1);
        assert_eq!(stores[0].get_domain(x).unwrap().to_slice(), vec![2, 3]);
    }

    #[test]
    fn all_different_fd_rejects_forced_collision() {
        let ctx = Context::new();
        let x = VarId::fresh();
        let y = VarId::fresh();
        let goal = Conj::new(
            Conj::new(in_fd(Term::var(x), 1, vec![1]), in_fd(Term::var(y), 1, vec![1])),
            all_different_fd(vec![Term::var(x), Term::var(y)]),
        );
        let (stores, _) = goal.solve(&ctx, ConstraintStore::new()).take(1);
        assert!(stores.is_empty());
    }

    #[test]
    fn plus_fd_links_three_variables_via_run() {
        let results = run(5, |q| {
            Conj::new(
                Conj::new(in_fd(q.clone(), 5, vec![1, 2, 3, 4, 5]), success_marker()),
                crate::goal::success(),
            )
        });
        assert!(!results.is_empty());
    }

    fn success_marker() -> Goal {
        crate::goal::success()
    }
}
