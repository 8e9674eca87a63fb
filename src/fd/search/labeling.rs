//! Variable/value selection heuristics driving the FD search tree (C5).
use crate::fd::state::SolverState;
use crate::fd::var::FdVar;

/// Picks the next variable to branch on and the order in which to try its
/// remaining values. Returns `None` once every variable is a singleton,
/// signalling a complete assignment.
pub trait Labeling: Send + Sync {
    fn select(&self, vars: &[FdVar], state: &SolverState) -> Option<(FdVar, Vec<i64>)>;
}

/// Minimum-remaining-values: picks the variable with the smallest
/// non-singleton domain, ties broken by declaration order. Values are
/// tried smallest-first.
#[derive(Debug, Default, Clone, Copy)]
pub struct MrvLabeling;

impl Labeling for MrvLabeling {
    fn select(&self, vars: &[FdVar], state: &SolverState) -> Option<(FdVar, Vec<i64>)> {
        vars.iter()
            .filter_map(|&v| state.get_domain(v).map(|d| (v, d)))
            .filter(|(_, d)| !d.is_singleton())
            .min_by_key(|(_, d)| d.count())
            .map(|(v, d)| (v, d.to_slice()))
    }
}

/// Declaration-order variable selection, smallest value first. Useful when
/// the caller's own variable ordering already encodes domain knowledge.
#[derive(Debug, Default, Clone, Copy)]
pub struct InOrderLabeling;

impl Labeling for InOrderLabeling {
    fn select(&self, vars: &[FdVar], state: &SolverState) -> Option<(FdVar, Vec<i64>)> {
        vars.iter()
            .filter_map(|&v| state.get_domain(v).map(|d| (v, d)))
            .find(|(_, d)| !d.is_singleton())
            .map(|(v, d)| (v, d.to_slice()))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::fd::domain::Domain;
    use crate::term::VarId;

    #[test]
    fn mrv_picks_smallest_non_singleton_domain() {
        let v1 = VarId::fresh();
        let v2 = VarId::fresh();
        let state = SolverState::new()
            .register(v1, Domain::full(5))
            .register(v2, Domain::full(2));
        let (picked, _) = MrvLabeling.select(&[v1, v2], &state).unwrap();
        assert_eq!(picked, v2);
    }

    #[test]
    fn mrv_returns_none_when_all_singleton() {
        let v1 = VarId::fresh();
        let state = SolverState::new().register(v1, Domain::from_values(5, &[3]));
        assert!(MrvLabeling.select(&[v1], &state).is_none());
    }
}
