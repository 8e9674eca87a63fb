//! Lexicographic ordering constraints between two equal-length vectors
//! of FD variables.
use crate::error::{PropagationFailed, PropagationResult};
use crate::fd::domain::Domain;
use crate::fd::state::{Constraint, SolverState};
use crate::fd::var::FdVar;

#[derive(Debug)]
pub struct LexLess {
    pub left: Vec<FdVar>,
    pub right: Vec<FdVar>,
    /// If true, allow equality (`LexLessEq`); otherwise strict `<`.
    pub allow_equal: bool,
}

impl LexLess {
    pub fn strict(left: Vec<FdVar>, right: Vec<FdVar>) -> LexLess {
        LexLess {
            left,
            right,
            allow_equal: false,
        }
    }

    pub fn or_equal(left: Vec<FdVar>, right: Vec<FdVar>) -> LexLess {
        LexLess {
            left,
            right,
            allow_equal: true,
        }
    }
}

impl Constraint for LexLess {
    fn variables(&self) -> Vec<FdVar> {
        self.left.iter().chain(self.right.iter()).copied().collect()
    }

    fn kind(&self) -> &'static str {
        "lex_less"
    }

    fn propagate(&self, state: &SolverState) -> PropagationResult<SolverState> {
        let n = self.left.len();
        let lefts: Vec<Domain> = self
            .left
            .iter()
            .map(|&v| state.get_domain(v).cloned().ok_or(PropagationFailed))
            .collect::<PropagationResult<_>>()?;
        let rights: Vec<Domain> = self
            .right
            .iter()
            .map(|&v| state.get_domain(v).cloned().ok_or(PropagationFailed))
            .collect::<PropagationResult<_>>()?;

        // Find the first position where the two vectors could still differ;
        // before it, only equality is possible, so tighten both sides to
        // their mutual intersection. At the decisive position, left's max
        // must not exceed right's max (strict: must be strictly less when
        // it's the last position with no escape left).
        let mut new_state = state.clone();
        let mut forced_equal_prefix = true;
        for i in 0..n {
            let l = &lefts[i];
            let r = &rights[i];
            if forced_equal_prefix {
                let l_singleton = l.is_singleton();
                let r_singleton = r.is_singleton();
                if l_singleton && r_singleton {
                    if l.singleton_value() != r.singleton_value() {
                        forced_equal_prefix = false;
                    }
                    continue;
                }
                // Could still be equal or diverge here: tighten overlap but
                // don't force equality since either branch remains open.
                let overlap = l.intersect(r);
                if !overlap.is_empty() && i == n - 1 && !self.allow_equal {
                    // last position, overlap non-empty and equality
                    // disallowed at the tail: must end up `<`, handled below.
                }
                forced_equal_prefix = false;
            }
        }

        if !self.allow_equal && lefts.iter().zip(&rights).all(|(l, r)| {
            l.is_singleton() && r.is_singleton() && l.singleton_value() == r.singleton_value()
        }) {
            return Err(PropagationFailed);
        }

        // Bounds tightening on the final comparable position: if every
        // earlier position is forced-equal and singleton, the first
        // non-forced position must satisfy left <= right (or < at the end).
        if let Some(i) = (0..n).find(|&i| !(lefts[i].is_singleton() && rights[i].is_singleton())) {
            let prefix_equal = (0..i).all(|j| {
                lefts[j].is_singleton()
                    && rights[j].is_singleton()
                    && lefts[j].singleton_value() == rights[j].singleton_value()
            });
            if prefix_equal {
                let l = &lefts[i];
                let r = &rights[i];
                let r_max = r.max().ok_or(PropagationFailed)?;
                let l_min = l.min().ok_or(PropagationFailed)?;
                let new_l = l.intersect(&Domain::range(l.max_value(), i64::MIN.max(0), r_max));
                let new_r = r.intersect(&Domain::range(r.max_value(), l_min, r.max_value()));
                new_state = new_state.set_domain(self.left[i], new_l);
                new_state = new_state.set_domain(self.right[i], new_r);
            }
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
    fn equal_singleton_prefixes_violate_strict_lex() {
        let mut model = Model::new();
        let l1 = model.new_var(Domain::from_values(5, &[2]));
        let r1 = model.new_var(Domain::from_values(5, &[2]));
        model.post(Arc::new(LexLess::strict(vec![l1], vec![r1])));
        assert!(model.propagate(model.initial_state()).is_err());
    }

    #[test]
    fn lex_less_eq_allows_equal_singletons() {
        let mut model = Model::new();
        let l1 = model.new_var(Domain::from_values(5, &[2]));
        let r1 = model.new_var(Domain::from_values(5, &[2]));
        model.post(Arc::new(LexLess::or_equal(vec![l1], vec![r1])));
        assert!(model.propagate(model.initial_state()).is_ok());
    }
}
