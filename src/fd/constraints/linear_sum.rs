//! Bounds-consistency propagation for `sum(coeffs[i] * vars[i]) = total`.
use crate::error::{PropagationFailed, PropagationResult};
use crate::fd::domain::Domain;
use crate::fd::state::{Constraint, SolverState};
use crate::fd::var::FdVar;

#[derive(Debug)]
pub struct LinearSum {
    terms: Vec<(i64, FdVar)>,
    total: i64,
}

impl LinearSum {
    pub fn new(terms: Vec<(i64, FdVar)>, total: i64) -> LinearSum {
        LinearSum { terms, total }
    }

    fn term_bounds(coeff: i64, d: &Domain) -> PropagationResult<(i64, i64)> {
        let lo = d.min().ok_or(PropagationFailed)?;
        let hi = d.max().ok_or(PropagationFailed)?;
        if coeff >= 0 {
            Ok((coeff * lo, coeff * hi))
        } else {
            Ok((coeff * hi, coeff * lo))
        }
    }
}

impl Constraint for LinearSum {
    fn variables(&self) -> Vec<FdVar> {
        self.terms.iter().map(|(_, v)| *v).collect()
    }

    fn kind(&self) -> &'static str {
        "linear_sum"
    }

    fn propagate(&self, state: &SolverState) -> PropagationResult<SolverState> {
        let mut domains = Vec::with_capacity(self.terms.len());
        for &(coeff, v) in &self.terms {
            let d = state.get_domain(v).cloned().ok_or(PropagationFailed)?;
            domains.push((coeff, v, d));
        }

        let mut bounds = Vec::with_capacity(domains.len());
        let mut sum_lo = 0i64;
        let mut sum_hi = 0i64;
        for (coeff, _, d) in &domains {
            let (lo, hi) = Self::term_bounds(*coeff, d)?;
            bounds.push((lo, hi));
            sum_lo += lo;
            sum_hi += hi;
        }
        if self.total < sum_lo || self.total > sum_hi {
            return Err(PropagationFailed);
        }

        let mut new_state = state.clone();
        for (i, (coeff, v, d)) in domains.iter().enumerate() {
            let (lo_i, hi_i) = bounds[i];
            // slack available to this term: total - (sum of others' bounds)
            let others_lo = sum_lo - lo_i;
            let others_hi = sum_hi - hi_i;
            let term_lo = self.total - others_hi;
            let term_hi = self.total - others_lo;
            let term_lo = term_lo.max(lo_i);
            let term_hi = term_hi.min(hi_i);

            let (var_lo, var_hi) = if *coeff > 0 {
                (
                    (term_lo as f64 / *coeff as f64).ceil() as i64,
                    (term_hi as f64 / *coeff as f64).floor() as i64,
                )
            } else if *coeff < 0 {
                (
                    (term_hi as f64 / *coeff as f64).ceil() as i64,
                    (term_lo as f64 / *coeff as f64).floor() as i64,
                )
            } else {
                (d.min().unwrap(), d.max().unwrap())
            };

            let narrowed = d.intersect(&Domain::range(d.max_value(), var_lo, var_hi));
            if narrowed.is_empty() {
                return Err(PropagationFailed);
            }
            new_state = new_state.set_domain(*v, narrowed);
        }
        Ok(new_state)
    }
}
