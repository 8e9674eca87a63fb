//! `Ifa(x in {1,2,3}, q = x * 10, Fail)`. Both `cond` and `then` here are
//! FD domain-narrowing goals, not relational disjunctions, so each
//! produces exactly one store -- `Ifa`'s "truncate to the first
//! witness" only matters when `cond` itself branches (see the
//! `combinator::ifte` unit tests for that case). `TimesFd` is a
//! bounds-consistency propagator, so `q`'s surviving domain is the
//! range `[10, 30]`, not the exact set `{10, 20, 30}` a value-consistent
//! (GAC) version would produce -- this is the link's documented
//! trade-off, not an omission.
use vulcan_core::combinator::{Conj, Ifa};
use vulcan_core::context::Context;
use vulcan_core::goal::failure;
use vulcan_core::relation_fd::{in_fd, times_fd};
use vulcan_core::store::ConstraintStore;
use vulcan_core::term::{Term, VarId};

#[test]
fn ifa_over_fd_domains_keeps_every_witness_in_the_surviving_domain() {
    let ctx = Context::new();
    let x = Term::var(VarId::fresh());
    let ten = Term::var(VarId::fresh());
    let q = Term::var(VarId::fresh());
    let x_id = x.as_var().unwrap();
    let q_id = q.as_var().unwrap();

    let cond = in_fd(x.clone(), 3, vec![1, 2, 3]);
    let then = Conj::new(
        Conj::new(in_fd(ten.clone(), 10, vec![10]), in_fd(q.clone(), 30, (1..=30).collect())),
        times_fd(x, ten, q),
    );
    let goal = Ifa::new(cond, then, failure());

    let (stores, _) = goal.solve(&ctx, ConstraintStore::new()).take(10);
    assert_eq!(stores.len(), 1, "cond and then each narrow rather than branch");

    let store = &stores[0];
    let mut x_values = store.get_domain(x_id).unwrap().to_slice();
    x_values.sort_unstable();
    assert_eq!(x_values, vec![1, 2, 3]);

    let mut q_values = store.get_domain(q_id).unwrap().to_slice();
    q_values.sort_unstable();
    assert_eq!(q_values, (10..=30).collect::<Vec<i64>>());
}
