//! AllDifferent with Régin-style generalized arc consistency.
use crate::error::{PropagationFailed, PropagationResult};
use crate::fd::state::{Constraint, SolverState};
use crate::fd::var::FdVar;
use std::collections::HashMap;

#[derive(Debug)]
pub struct AllDifferent {
    vars: Vec<FdVar>,
}

impl AllDifferent {
    pub fn new(vars: Vec<FdVar>) -> AllDifferent {
        AllDifferent { vars }
    }
}

/// Bipartite variable/value matcher used both to find a maximum matching
/// and to check whether a specific (variable, value) forced assignment is
/// still extendable to a complete matching.
struct Matcher<'a> {
    vars: &'a [FdVar],
    state: &'a SolverState,
    /// var index -> matched value, if any
    var_match: Vec<Option<i64>>,
    /// value -> var index matched to it
    value_match: HashMap<i64, usize>,
    /// generation-stamped visited set: avoids re-zeroing between searches
    visited_value: HashMap<i64, u64>,
    generation: u64,
}

impl<'a> Matcher<'a> {
    fn new(vars: &'a [FdVar], state: &'a SolverState) -> Matcher<'a> {
        Matcher {
            vars,
            state,
            var_match: vec![None; vars.len()],
            value_match: HashMap::new(),
            visited_value: HashMap::new(),
            generation: 0,
        }
    }

    fn domain_of(&self, var_idx: usize) -> Vec<i64> {
        self.state
            .get_domain(self.vars[var_idx])
            .map(|d| d.to_slice())
            .unwrap_or_default()
    }

    /// Tries to find an augmenting path from `var_idx`, preferring
    /// singleton domains first, then smaller domains first, matching the
    /// heuristic order the distilled spec calls for.
    fn try_augment(&mut self, var_idx: usize) -> bool {
        self.generation += 1;
        self.augment_from(var_idx)
    }

    fn augment_from(&mut self, var_idx: usize) -> bool {
        let gen = self.generation;
        let mut candidates = self.domain_of(var_idx);
        candidates.sort_by_key(|v| *v);
        for value in candidates {
            if self.visited_value.get(&value).copied() == Some(gen) {
                continue;
            }
            self.visited_value.insert(value, gen);
            match self.value_match.get(&value).copied() {
                None => {
                    self.set_match(var_idx, value);
                    return true;
                }
                Some(other_var) => {
                    if self.augment_from(other_var) {
                        self.set_match(var_idx, value);
                        return true;
                    }
                }
            }
        }
        false
    }

    fn set_match(&mut self, var_idx: usize, value: i64) {
        if let Some(prev) = self.var_match[var_idx] {
            self.value_match.remove(&prev);
        }
        self.var_match[var_idx] = Some(value);
        self.value_match.insert(value, var_idx);
    }

    /// Builds a maximum matching, trying singleton-domain variables first
    /// and then variables with smaller domains first (fail-first order).
    fn build_maximum_matching(&mut self) -> usize {
        let mut order: Vec<usize> = (0..self.vars.len()).collect();
        order.sort_by_key(|&i| {
            let d = self.domain_of(i);
            (d.len() != 1, d.len())
        });
        let mut matched = 0;
        for i in order {
            if self.try_augment(i) {
                matched += 1;
            }
        }
        matched
    }
}

impl Constraint for AllDifferent {
    fn variables(&self) -> Vec<FdVar> {
        self.vars.clone()
    }

    fn kind(&self) -> &'static str {
        "all_different"
    }

    fn propagate(&self, state: &SolverState) -> PropagationResult<SolverState> {
        let mut matcher = Matcher::new(&self.vars, state);
        let matched = matcher.build_maximum_matching();
        if matched < self.vars.len() {
            return Err(PropagationFailed);
        }

        let mut new_state = state.clone();
        for (var_idx, &var) in self.vars.iter().enumerate() {
            let domain = match new_state.get_domain(var) {
                Some(d) => d.clone(),
                None => continue,
            };
            let matched_value = matcher.var_match[var_idx];
            for value in domain.to_slice() {
                if Some(value) == matched_value {
                    continue;
                }
                // Is `var = value` still extendable to a complete matching?
                // Temporarily unmatch `var` and force it onto `value`, then
                // try to re-augment whoever was using `value` (if anyone).
                let displaced = matcher.value_match.get(&value).copied();
                let saved_var_match = matcher.var_match.clone();
                let saved_value_match = matcher.value_match.clone();

                if let Some(prev) = matcher.var_match[var_idx] {
                    matcher.value_match.remove(&prev);
                }
                matcher.set_match(var_idx, value);

                let ok = match displaced {
                    Some(other) if other != var_idx => matcher.try_augment(other),
                    _ => true,
                };

                matcher.var_match = saved_var_match;
                matcher.value_match = saved_value_match;

                if !ok {
                    let narrowed = new_state
                        .get_domain(var)
                        .unwrap()
                        .remove(value);
                    new_state = new_state.set_domain(var, narrowed);
                }
            }
            if new_state.get_domain(var).map(|d| d.is_empty()).unwrap_or(true) {
                return Err(PropagationFailed);
            }
        }
        Ok(new_state)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::fd::domain::Domain;
    use crate::fd::model::Model;
    use std::sync::Arc;

    #[test]
    fn small_universe_is_inconsistent() {
        let mut model = Model::new();
        let x1 = model.new_var(Domain::full(2));
        let x2 = model.new_var(Domain::full(2));
        let x3 = model.new_var(Domain::full(2));
        model.post(Arc::new(AllDifferent::new(vec![x1, x2, x3])));
        let state = model.initial_state();
        assert!(model.propagate(state).is_err());
    }

    #[test]
    fn forces_pruning_when_one_variable_is_fixed() {
        let mut model = Model::new();
        let x1 = model.new_var(Domain::from_values(2, &[1]));
        let x2 = model.new_var(Domain::full(2));
        model.post(Arc::new(AllDifferent::new(vec![x1, x2])));
        let state = model.initial_state();
        let result = model.propagate(state).unwrap();
        assert_eq!(result.get_domain(x2).unwrap().to_slice(), vec![2]);
    }
}
