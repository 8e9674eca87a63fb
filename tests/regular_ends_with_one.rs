//! A 3-state DFA where every state transitions on symbol 1 to state 1 and
//! on symbol 2 to state 2, with only state 1 accepting: over three
//! variables this reduces to "the last symbol must be 1", leaving the
//! first two unconstrained.
use vulcan_core::fd::constraints::{Dfa, Regular};
use vulcan_core::fd::domain::Domain;
use vulcan_core::fd::model::Model;
use std::collections::HashSet;
use std::sync::Arc;

#[test]
fn regular_narrows_only_the_final_variable() {
    let mut model = Model::new();
    let x1 = model.new_var(Domain::full(2));
    let x2 = model.new_var(Domain::full(2));
    let x3 = model.new_var(Domain::full(2));

    let dfa = Dfa {
        start: 0,
        accepting: HashSet::from([1]),
        transitions: vec![vec![Some(1), Some(2)]; 3],
    };
    model.post(Arc::new(Regular::new(vec![x1, x2, x3], dfa)));

    let propagated = model.propagate(model.initial_state()).unwrap();

    assert_eq!(propagated.get_domain(x1).unwrap().to_slice(), vec![1, 2]);
    assert_eq!(propagated.get_domain(x2).unwrap().to_slice(), vec![1, 2]);
    assert_eq!(propagated.get_domain(x3).unwrap().to_slice(), vec![1]);
}
