//! Immutable propagation state and the fixpoint loop (C4).
use crate::error::PropagationResult;
use crate::fd::domain::Domain;
use crate::fd::var::FdVar;

/// A persistent map from FD variable id to its current domain, plus a
/// propagation queue of variables whose domain narrowed since the last
/// fixpoint.
///
/// `set_domain` is a no-op (no new map entry, no enqueue) when the supplied
/// domain equals the prior one. Every propagation step either returns the
/// same state or a new one differing only for variables that actually
/// changed.
#[derive(Clone, Debug, Default)]
pub struct SolverState {
    domains: im::HashMap<FdVar, Domain>,
    dirty: Vec<FdVar>,
}

impl SolverState {
    pub fn new() -> SolverState {
        SolverState {
            domains: im::HashMap::new(),
            dirty: Vec::new(),
        }
    }

    pub fn get_domain(&self, v: FdVar) -> Option<&Domain> {
        self.domains.get(&v)
    }

    /// Registers a variable's initial domain without marking it dirty; used
    /// when building a `Model` or extending a `ConstraintStore` before the
    /// first propagation pass.
    pub fn register(&self, v: FdVar, domain: Domain) -> SolverState {
        let mut domains = self.domains.clone();
        domains.insert(v, domain);
        SolverState {
            domains,
            dirty: self.dirty.clone(),
        }
    }

    /// Installs `domain` for `v` and enqueues it for propagation, unless
    /// `domain` is unchanged from the variable's current domain.
    pub fn set_domain(&self, v: FdVar, domain: Domain) -> SolverState {
        if self.domains.get(&v) == Some(&domain) {
            return self.clone();
        }
        let mut domains = self.domains.clone();
        domains.insert(v, domain);
        let mut dirty = self.dirty.clone();
        dirty.push(v);
        SolverState { domains, dirty }
    }

    /// All currently registered variable ids.
    pub fn variables(&self) -> impl Iterator<Item = FdVar> + '_ {
        self.domains.keys().copied()
    }

    /// Seeds the dirty queue with every registered variable (used at the
    /// root of a fresh `Model` before the first propagation pass).
    pub fn with_all_dirty(&self) -> SolverState {
        SolverState {
            domains: self.domains.clone(),
            dirty: self.domains.keys().copied().collect(),
        }
    }

    fn pop_dirty(&mut self) -> Option<FdVar> {
        self.dirty.pop()
    }

    /// Enqueues `v` for propagation without changing its domain; used when
    /// a newly posted constraint needs to re-examine variables whose
    /// domain did not just change.
    pub fn mark_dirty(&self, v: FdVar) -> SolverState {
        let mut dirty = self.dirty.clone();
        dirty.push(v);
        SolverState {
            domains: self.domains.clone(),
            dirty,
        }
    }

    pub fn is_consistent(&self) -> bool {
        self.domains.values().all(|d| !d.is_empty())
    }
}

/// A propagation constraint: examines a fixed set of variables and narrows
/// their domains without ever widening one (`propagate`'s output domain is
/// always a subset of its input, for every touched variable).
pub trait Constraint: Send + Sync + std::fmt::Debug {
    fn variables(&self) -> Vec<FdVar>;

    fn kind(&self) -> &'static str;

    fn propagate(&self, state: &SolverState) -> PropagationResult<SolverState>;
}

/// Runs the arc-consistency fixpoint: pop a dirty variable, re-propagate
/// every constraint that references it (via the variable -> constraint
/// index), repeat until the queue drains or a domain empties out.
pub fn propagate(
    mut state: SolverState,
    constraints: &[std::sync::Arc<dyn Constraint>],
    var_to_constraints: &std::collections::HashMap<FdVar, Vec<usize>>,
) -> PropagationResult<SolverState> {
    while let Some(v) = state.pop_dirty() {
        if let Some(indices) = var_to_constraints.get(&v) {
            for &idx in indices {
                state = constraints[idx].propagate(&state)?;
                if !state.is_consistent() {
                    return Err(crate::error::PropagationFailed);
                }
            }
        }
    }
    Ok(state)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn set_domain_is_noop_when_unchanged() {
        let v = crate::term::VarId::fresh();
        let s0 = SolverState::new().register(v, Domain::full(5));
        let s1 = s0.set_domain(v, Domain::full(5));
        assert_eq!(s1.get_domain(v), s0.get_domain(v));
    }

    #[test]
    fn set_domain_enqueues_changed_variable() {
        let v = crate::term::VarId::fresh();
        let s0 = SolverState::new().register(v, Domain::full(5));
        let mut s1 = s0.set_domain(v, Domain::full(5).remove_above(3));
        assert_eq!(s1.pop_dirty(), Some(v));
        assert_eq!(s1.pop_dirty(), None);
    }
}
