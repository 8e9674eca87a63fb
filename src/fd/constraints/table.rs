//! The `Table` global constraint: a tuple of variables must match one of
//! an explicitly enumerated list of allowed tuples. Propagation is a
//! straightforward GAC-by-enumeration: a value survives for position `i`
//! iff some still-compatible tuple uses it there.
use crate::error::{PropagationFailed, PropagationResult};
use crate::fd::domain::Domain;
use crate::fd::state::{Constraint, SolverState};
use crate::fd::var::FdVar;

#[derive(Debug)]
pub struct Table {
    vars: Vec<FdVar>,
    tuples: Vec<Vec<i64>>,
}

impl Table {
    pub fn new(vars: Vec<FdVar>, tuples: Vec<Vec<i64>>) -> Table {
        Table { vars, tuples }
    }
}

impl Constraint for Table {
    fn variables(&self) -> Vec<FdVar> {
        self.vars.clone()
    }

    fn kind(&self) -> &'static str {
        "table"
    }

    fn propagate(&self, state: &SolverState) -> PropagationResult<SolverState> {
        let domains: Vec<Domain> = self
            .vars
            .iter()
            .map(|&v| state.get_domain(v).cloned().ok_or(PropagationFailed))
            .collect::<PropagationResult<_>>()?;

        let live_tuples: Vec<&Vec<i64>> = self
            .tuples
            .iter()
            .filter(|tuple| {
                tuple.len() == domains.len()
                    && tuple.iter().zip(&domains).all(|(v, d)| d.has(*v))
            })
            .collect();

        if live_tuples.is_empty() {
            return Err(PropagationFailed);
        }

        let mut new_state = state.clone();
        for (i, &var) in self.vars.iter().enumerate() {
            let allowed: Vec<i64> = live_tuples.iter().map(|t| t[i]).collect();
            let narrowed = domains[i].intersect(&Domain::from_values(domains[i].max_value(), &allowed));
            if narrowed.is_empty() {
                return Err(PropagationFailed);
            }
            new_state = new_state.set_domain(var, narrowed);
        }
        Ok(new_state)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::fd::model::Model;
    use std::sync::Arc;

    #[test]
    fn prunes_values_with_no_supporting_tuple() {
        let mut model = Model::new();
        let x = model.new_var(Domain::full(3));
        let y = model.new_var(Domain::full(3));
        model.post(Arc::new(Table::new(
            vec![x, y],
            vec![vec![1, 2], vec![2, 3]],
        )));
        let state = model.propagate(model.initial_state()).unwrap();
        assert_eq!(state.get_domain(x).unwrap().to_slice(), vec![1, 2]);
        assert_eq!(state.get_domain(y).unwrap().to_slice(), vec![2, 3]);
    }

    #[test]
    fn empty_table_fails() {
        let mut model = Model::new();
        let x = model.new_var(Domain::full(3));
        model.post(Arc::new(Table::new(vec![x], vec![])));
        assert!(model.propagate(model.initial_state()).is_err());
    }
}
