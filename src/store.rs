//! `ConstraintStore`: the façade goals actually operate on. Carries the
//! relational substitution and the FD solver state side by side, so FD
//! variables and relational logic variables share one monotonic ID space
//! and a single "constraint store" threads through both subsystems.
use crate::error::{Error, PropagationFailed};
use crate::fd::domain::Domain;
use crate::fd::state::{propagate, Constraint, SolverState};
use crate::fd::var::FdVar;
use crate::substitution::{unify, Substitution};
use crate::term::Term;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone, Debug, Default)]
pub struct ConstraintStore {
    substitution: Substitution,
    fd_state: SolverState,
    constraints: Arc<Vec<Arc<dyn Constraint>>>,
    var_to_constraints: Arc<HashMap<FdVar, Vec<usize>>>,
}

impl ConstraintStore {
    pub fn new() -> ConstraintStore {
        ConstraintStore::default()
    }

    pub fn substitution(&self) -> &Substitution {
        &self.substitution
    }

    pub fn walk(&self, t: &Term) -> Term {
        self.substitution.walk(t)
    }

    pub fn deep_walk(&self, t: &Term) -> Term {
        self.substitution.deep_walk(t)
    }

    /// Unifies `a` and `b` under this store's substitution. Returns `None`
    /// on mismatch; never touches FD domains or constraints (those only
    /// narrow via `post`/`propagate`).
    pub fn unify(&self, a: &Term, b: &Term) -> Option<ConstraintStore> {
        let substitution = unify(a, b, &self.substitution)?;
        Some(ConstraintStore {
            substitution,
            ..self.clone()
        })
    }

    pub fn get_domain(&self, v: FdVar) -> Option<&Domain> {
        self.fd_state.get_domain(v)
    }

    /// Registers `v`'s initial domain if it has none yet; a no-op
    /// (returns `self.clone()`) if `v` is already registered, so relational
    /// convenience goals can call this unconditionally before narrowing.
    pub fn ensure_fd_var(&self, v: FdVar, default_domain: Domain) -> ConstraintStore {
        if self.fd_state.get_domain(v).is_some() {
            return self.clone();
        }
        ConstraintStore {
            fd_state: self.fd_state.register(v, default_domain),
            ..self.clone()
        }
    }

    pub fn set_domain(&self, v: FdVar, domain: Domain) -> ConstraintStore {
        ConstraintStore {
            fd_state: self.fd_state.set_domain(v, domain),
            ..self.clone()
        }
    }

    pub fn constraints(&self) -> &[Arc<dyn Constraint>] {
        &self.constraints
    }

    /// Posts a new constraint, marks its variables dirty, and propagates
    /// to a fixpoint immediately, converting a `PropagationFailed` into
    /// the public `Error::Inconsistent`.
    pub fn post(&self, constraint: Arc<dyn Constraint>) -> Result<ConstraintStore, Error> {
        let mut constraints = (*self.constraints).clone();
        let idx = constraints.len();
        let mut var_to_constraints = (*self.var_to_constraints).clone();
        let mut state = self.fd_state.clone();
        for v in constraint.variables() {
            var_to_constraints.entry(v).or_default().push(idx);
            state = state.mark_dirty(v);
        }
        constraints.push(constraint);

        let propagated = propagate(state, &constraints, &var_to_constraints)
            .map_err(|PropagationFailed| Error::Inconsistent)?;

        Ok(ConstraintStore {
            substitution: self.substitution.clone(),
            fd_state: propagated,
            constraints: Arc::new(constraints),
            var_to_constraints: Arc::new(var_to_constraints),
        })
    }

    /// Re-runs the fixpoint loop over whatever is currently queued dirty
    /// (used after `set_domain` calls that bypass `post`, e.g. search
    /// branching).
    pub fn propagate(&self) -> Result<ConstraintStore, Error> {
        let propagated = propagate(self.fd_state.clone(), &self.constraints, &self.var_to_constraints)
            .map_err(|PropagationFailed| Error::Inconsistent)?;
        Ok(ConstraintStore {
            fd_state: propagated,
            ..self.clone()
        })
    }

    pub fn is_fd_consistent(&self) -> bool {
        self.fd_state.is_consistent()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::fd::constraints::AllDifferent;
    use crate::term::VarId;

    #[test]
    fn unify_binds_without_touching_fd_state() {
        let store = ConstraintStore::new();
        let v = VarId::fresh();
        let store = store.unify(&Term::var(v), &Term::int(5)).unwrap();
        assert_eq!(store.walk(&Term::var(v)), Term::int(5));
    }

    #[test]
    fn post_propagates_and_can_fail() {
        let store = ConstraintStore::new();
        let x = VarId::fresh();
        let y = VarId::fresh();
        let store = store
            .ensure_fd_var(x, Domain::from_values(1, &[1]))
            .ensure_fd_var(y, Domain::from_values(1, &[1]));
        let result = store.post(Arc::new(AllDifferent::new(vec![x, y])));
        assert!(result.is_err());
    }
}
