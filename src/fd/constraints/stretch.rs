//! `Stretch`: every maximal run of equal values in the sequence must have
//! length within `[min_len, max_len]` for that value. Checked (and
//! partially propagated) rather than given full GAC, as the distilled
//! spec allows for this constraint.
use crate::error::{PropagationFailed, PropagationResult};
use crate::fd::state::{Constraint, SolverState};
use crate::fd::var::FdVar;
use std::collections::HashMap;

#[derive(Debug)]
pub struct Stretch {
    vars: Vec<FdVar>,
    min_len: HashMap<i64, usize>,
    max_len: HashMap<i64, usize>,
}

impl Stretch {
    pub fn new(
        vars: Vec<FdVar>,
        min_len: HashMap<i64, usize>,
        max_len: HashMap<i64, usize>,
    ) -> Stretch {
        Stretch {
            vars,
            min_len,
            max_len,
        }
    }
}

impl Constraint for Stretch {
    fn variables(&self) -> Vec<FdVar> {
        self.vars.clone()
    }

    fn kind(&self) -> &'static str {
        "stretch"
    }

    fn propagate(&self, state: &SolverState) -> PropagationResult<SolverState> {
        // Only checks fully assigned runs; a run touching an unassigned
        // variable is left for a later propagation round once it narrows
        // further. This is sound (never rejects a reachable solution) even
        // though it is not complete GAC.
        let domains: Vec<_> = self
            .vars
            .iter()
            .map(|&v| state.get_domain(v).cloned().ok_or(PropagationFailed))
            .collect::<PropagationResult<_>>()?;

        let mut i = 0;
        while i < domains.len() {
            if !domains[i].is_singleton() {
                i += 1;
                continue;
            }
            let value = domains[i].singleton_value();
            let mut j = i;
            while j + 1 < domains.len()
                && domains[j + 1].is_singleton()
                && domains[j + 1].singleton_value() == value
            {
                j += 1;
            }
            // Only a run bounded by non-matching assigned neighbours (or the
            // sequence edge) on both sides is a *complete* maximal stretch.
            let left_closed = i == 0
                || (domains[i - 1].is_singleton() && domains[i - 1].singleton_value() != value);
            let right_closed = j + 1 == domains.len()
                || (domains[j + 1].is_singleton() && domains[j + 1].singleton_value() != value);
            if left_closed && right_closed {
                let len = j - i + 1;
                if let Some(&min) = self.min_len.get(&value) {
                    if len < min {
                        return Err(PropagationFailed);
                    }
                }
                if let Some(&max) = self.max_len.get(&value) {
                    if len > max {
                        return Err(PropagationFailed);
                    }
                }
            }
            i = j + 1;
        }
        Ok(state.clone())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::fd::domain::Domain;
    use crate::fd::model::Model;
    use std::sync::Arc;

    #[test]
    fn rejects_stretch_shorter_than_minimum() {
        let mut model = Model::new();
        let vars: Vec<_> = vec![1, 1, 2]
            .into_iter()
            .map(|v| model.new_var(Domain::from_values(2, &[v])))
            .collect();
        let mut min_len = HashMap::new();
        min_len.insert(2, 2);
        model.post(Arc::new(Stretch::new(vars, min_len, HashMap::new())));
        assert!(model.propagate(model.initial_state()).is_err());
    }

    #[test]
    fn accepts_stretch_within_bounds() {
        let mut model = Model::new();
        let vars: Vec<_> = vec![1, 1, 2]
            .into_iter()
            .map(|v| model.new_var(Domain::from_values(2, &[v])))
            .collect();
        let mut min_len = HashMap::new();
        min_len.insert(1, 2);
        min_len.insert(2, 1);
        model.post(Arc::new(Stretch::new(vars, min_len, HashMap::new())));
        assert!(model.propagate(model.initial_state()).is_ok());
    }
}
