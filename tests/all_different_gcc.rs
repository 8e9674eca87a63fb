//! Three variables over `{1..5}`: `AllDifferent` plus a cardinality
//! constraint pinning value 1 to exactly one occurrence and values
//! 2..=5 to at most three occurrences combined, with `x1` and `x2`
//! forced. `x3` must then avoid both forced values and value 1 (already
//! saturated), leaving `{3,4,5}`.
use std::collections::HashMap;
use std::sync::Arc;
use vulcan_core::fd::constraints::{AllDifferent, GlobalCardinality};
use vulcan_core::fd::domain::Domain;
use vulcan_core::fd::model::Model;

#[test]
fn all_different_and_gcc_together_narrow_the_unforced_variable() {
    let mut model = Model::new();
    let x1 = model.new_var(Domain::full(5));
    let x2 = model.new_var(Domain::full(5));
    let x3 = model.new_var(Domain::full(5));

    model.post(Arc::new(AllDifferent::new(vec![x1, x2, x3])));

    let mut min_count = HashMap::new();
    min_count.insert(1, 1);
    for v in 2..=5 {
        min_count.insert(v, 0);
    }
    let mut max_count = HashMap::new();
    max_count.insert(1, 1);
    for v in 2..=5 {
        max_count.insert(v, 3);
    }
    model.post(Arc::new(GlobalCardinality::new(vec![x1, x2, x3], min_count, max_count)));

    let mut state = model.initial_state();
    state = state.set_domain(x1, Domain::from_values(5, &[1]));
    state = state.set_domain(x2, Domain::from_values(5, &[2]));
    state = state.with_all_dirty();

    let propagated = model.propagate(state).unwrap();

    assert_eq!(propagated.get_domain(x1).unwrap().to_slice(), vec![1]);
    assert_eq!(propagated.get_domain(x2).unwrap().to_slice(), vec![2]);
    assert_eq!(propagated.get_domain(x3).unwrap().to_slice(), vec![3, 4, 5]);
}
