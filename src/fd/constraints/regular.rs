//! The `Regular` global constraint: a sequence of FD variables must spell
//! a word accepted by a given DFA. Propagation is forward/backward
//! arc-consistency over the unrolled layered transition graph, the
//! standard technique (Pesant 2004) for this constraint.
use crate::error::{PropagationFailed, PropagationResult};
use crate::fd::domain::Domain;
use crate::fd::state::{Constraint, SolverState};
use crate::fd::var::FdVar;
use std::collections::HashSet;

/// A deterministic finite automaton over the alphabet `1..=max_value`.
#[derive(Debug, Clone)]
pub struct Dfa {
    pub start: usize,
    pub accepting: HashSet<usize>,
    /// transition[state][symbol - 1] = Some(next_state)
    pub transitions: Vec<Vec<Option<usize>>>,
}

impl Dfa {
    pub fn num_states(&self) -> usize {
        self.transitions.len()
    }
}

#[derive(Debug)]
pub struct Regular {
    vars: Vec<FdVar>,
    dfa: Dfa,
}

impl Regular {
    pub fn new(vars: Vec<FdVar>, dfa: Dfa) -> Regular {
        Regular { vars, dfa }
    }

    /// Layer `i` holds the set of DFA states reachable after reading the
    /// first `i` symbols using only currently-allowed values.
    fn forward_layers(&self, domains: &[Domain]) -> Vec<HashSet<usize>> {
        let n = self.vars.len();
        let mut layers = Vec::with_capacity(n + 1);
        let mut current: HashSet<usize> = [self.dfa.start].into_iter().collect();
        layers.push(current.clone());
        for d in domains.iter().take(n) {
            let mut next = HashSet::new();
            for &state in &current {
                for value in d.iter_values() {
                    if let Some(ns) = self.dfa.transitions[state][(value - 1) as usize] {
                        next.insert(ns);
                    }
                }
            }
            layers.push(next.clone());
            current = next;
        }
        layers
    }

    /// Layer `i` (reading right to left) holds DFA states from which the
    /// remaining suffix can still reach acceptance.
    fn backward_layers(&self, domains: &[Domain]) -> Vec<HashSet<usize>> {
        let n = self.vars.len();
        let mut layers = vec![HashSet::new(); n + 1];
        layers[n] = self.dfa.accepting.clone();
        for i in (0..n).rev() {
            let d = &domains[i];
            let mut can_reach = HashSet::new();
            for state in 0..self.dfa.num_states() {
                for value in d.iter_values() {
                    if let Some(ns) = self.dfa.transitions[state][(value - 1) as usize] {
                        if layers[i + 1].contains(&ns) {
                            can_reach.insert(state);
                            break;
                        }
                    }
                }
            }
            layers[i] = can_reach;
        }
        layers
    }
}

impl Constraint for Regular {
    fn variables(&self) -> Vec<FdVar> {
        self.vars.clone()
    }

    fn kind(&self) -> &'static str {
        "regular"
    }

    fn propagate(&self, state: &SolverState) -> PropagationResult<SolverState> {
        let domains: Vec<Domain> = self
            .vars
            .iter()
            .map(|&v| state.get_domain(v).cloned().ok_or(PropagationFailed))
            .collect::<PropagationResult<_>>()?;

        let forward = self.forward_layers(&domains);
        let backward = self.backward_layers(&domains);

        let mut new_state = state.clone();
        for (i, &v) in self.vars.iter().enumerate() {
            let d = &domains[i];
            let mut allowed = Vec::new();
            for value in d.iter_values() {
                let reachable = forward[i].iter().any(|&from| {
                    self.dfa.transitions[from][(value - 1) as usize]
                        .map(|to| backward[i + 1].contains(&to))
                        .unwrap_or(false)
                });
                if reachable {
                    allowed.push(value);
                }
            }
            let narrowed = d.intersect(&Domain::from_values(d.max_value(), &allowed));
            if narrowed.is_empty() {
                return Err(PropagationFailed);
            }
            new_state = new_state.set_domain(v, narrowed);
        }
        Ok(new_state)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::fd::model::Model;
    use std::sync::Arc;

    /// Accepts binary strings (alphabet {1,2} standing for {0,1}) ending in
    /// symbol 2 ("1" in the usual 0/1 alphabet).
    fn ends_with_one_dfa() -> Dfa {
        Dfa {
            start: 0,
            accepting: [1].into_iter().collect(),
            transitions: vec![
                vec![Some(0), Some(1)],
                vec![Some(0), Some(1)],
            ],
        }
    }

    #[test]
    fn forces_last_symbol_to_two() {
        let mut model = Model::new();
        let vars: Vec<_> = (0..3).map(|_| model.new_var(Domain::full(2))).collect();
        model.post(Arc::new(Regular::new(vars.clone(), ends_with_one_dfa())));
        let state = model.propagate(model.initial_state()).unwrap();
        assert_eq!(state.get_domain(vars[2]).unwrap().to_slice(), vec![2]);
    }

    #[test]
    fn rejects_all_zero_when_forced() {
        let mut model = Model::new();
        let vars: Vec<_> = (0..2)
            .map(|_| model.new_var(Domain::from_values(2, &[1])))
            .collect();
        model.post(Arc::new(Regular::new(vars, ends_with_one_dfa())));
        assert!(model.propagate(model.initial_state()).is_err());
    }
}
