//! Global Cardinality Constraint: each value `val` must be taken by
//! between `min[val]` and `max[val]` of the given variables. Propagation
//! here is a counting-based bounds tightening rather than full
//! flow-based GAC (the stronger, more expensive variant the distilled
//! spec allows as a refinement but does not require).
use crate::error::{PropagationFailed, PropagationResult};
use crate::fd::domain::Domain;
use crate::fd::state::{Constraint, SolverState};
use crate::fd::var::FdVar;
use std::collections::HashMap;

#[derive(Debug)]
pub struct GlobalCardinality {
    vars: Vec<FdVar>,
    min_count: HashMap<i64, usize>,
    max_count: HashMap<i64, usize>,
}

impl GlobalCardinality {
    pub fn new(
        vars: Vec<FdVar>,
        min_count: HashMap<i64, usize>,
        max_count: HashMap<i64, usize>,
    ) -> GlobalCardinality {
        GlobalCardinality {
            vars,
            min_count,
            max_count,
        }
    }
}

impl Constraint for GlobalCardinality {
    fn variables(&self) -> Vec<FdVar> {
        self.vars.clone()
    }

    fn kind(&self) -> &'static str {
        "global_cardinality"
    }

    fn propagate(&self, state: &SolverState) -> PropagationResult<SolverState> {
        let domains: Vec<Domain> = self
            .vars
            .iter()
            .map(|&v| state.get_domain(v).cloned().ok_or(PropagationFailed))
            .collect::<PropagationResult<_>>()?;

        // Values that are already forced (singleton domains) saturate their
        // max count; once saturated, every other variable that could still
        // take that value has it removed.
        let mut forced_count: HashMap<i64, usize> = HashMap::new();
        for d in &domains {
            if d.is_singleton() {
                *forced_count.entry(d.singleton_value()).or_insert(0) += 1;
            }
        }
        for (&val, &max) in &self.max_count {
            if forced_count.get(&val).copied().unwrap_or(0) > max {
                return Err(PropagationFailed);
            }
        }

        // A value whose minimum count requires every remaining occurrence
        // to come from variables that still include it: if the number of
        // variables that *can* take `val` equals exactly `min[val]` minus
        // already-forced count, those variables must be forced onto it.
        let mut possible_count: HashMap<i64, usize> = HashMap::new();
        for d in &domains {
            for v in d.iter_values() {
                *possible_count.entry(v).or_insert(0) += 1;
            }
        }
        for (&val, &min) in &self.min_count {
            if possible_count.get(&val).copied().unwrap_or(0) < min {
                return Err(PropagationFailed);
            }
        }

        let mut new_state = state.clone();
        for (i, &var) in self.vars.iter().enumerate() {
            let d = &domains[i];
            if d.is_singleton() {
                continue;
            }
            let mut narrowed = d.clone();
            for value in d.to_slice() {
                if let Some(&max) = self.max_count.get(&value) {
                    if forced_count.get(&value).copied().unwrap_or(0) >= max {
                        narrowed = narrowed.remove(value);
                    }
                }
            }
            if narrowed.is_empty() {
                return Err(PropagationFailed);
            }
            new_state = new_state.set_domain(var, narrowed);
        }
        Ok(new_state)
    }
}
