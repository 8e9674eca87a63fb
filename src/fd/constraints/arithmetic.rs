//! Bounds-consistency propagators for elementary arithmetic links:
//! `x + y = z`, `x - y = z`, `x * y = z`, `|x| = y`, `k * x = y`.
use crate::error::{PropagationFailed, PropagationResult};
use crate::fd::domain::Domain;
use crate::fd::state::{Constraint, SolverState};
use crate::fd::var::FdVar;

fn domain_or_fail(state: &SolverState, v: FdVar) -> PropagationResult<Domain> {
    state.get_domain(v).cloned().ok_or(PropagationFailed)
}

#[derive(Debug)]
pub struct PlusFd {
    pub x: FdVar,
    pub y: FdVar,
    pub z: FdVar,
}

impl Constraint for PlusFd {
    fn variables(&self) -> Vec<FdVar> {
        vec![self.x, self.y, self.z]
    }

    fn kind(&self) -> &'static str {
        "plus_fd"
    }

    fn propagate(&self, state: &SolverState) -> PropagationResult<SolverState> {
        let dx = domain_or_fail(state, self.x)?;
        let dy = domain_or_fail(state, self.y)?;
        let dz = domain_or_fail(state, self.z)?;
        let (x_lo, x_hi) = (dx.min().ok_or(PropagationFailed)?, dx.max().ok_or(PropagationFailed)?);
        let (y_lo, y_hi) = (dy.min().ok_or(PropagationFailed)?, dy.max().ok_or(PropagationFailed)?);
        let (z_lo, z_hi) = (dz.min().ok_or(PropagationFailed)?, dz.max().ok_or(PropagationFailed)?);

        let new_z = dz.intersect(&Domain::range(dz.max_value(), x_lo + y_lo, x_hi + y_hi));
        let new_x = dx.intersect(&Domain::range(dx.max_value(), z_lo - y_hi, z_hi - y_lo));
        let new_y = dy.intersect(&Domain::range(dy.max_value(), z_lo - x_hi, z_hi - x_lo));

        let mut new_state = state.clone();
        new_state = new_state.set_domain(self.x, new_x);
        new_state = new_state.set_domain(self.y, new_y);
        new_state = new_state.set_domain(self.z, new_z);
        Ok(new_state)
    }
}

#[derive(Debug)]
pub struct MinusFd {
    pub x: FdVar,
    pub y: FdVar,
    pub z: FdVar,
}

impl Constraint for MinusFd {
    fn variables(&self) -> Vec<FdVar> {
        vec![self.x, self.y, self.z]
    }

    fn kind(&self) -> &'static str {
        "minus_fd"
    }

    fn propagate(&self, state: &SolverState) -> PropagationResult<SolverState> {
        // x - y = z  <=>  x = z + y
        PlusFd { x: self.z, y: self.y, z: self.x }.propagate(state)
    }
}

#[derive(Debug)]
pub struct TimesFd {
    pub x: FdVar,
    pub y: FdVar,
    pub z: FdVar,
}

fn min_max_product(a_lo: i64, a_hi: i64, b_lo: i64, b_hi: i64) -> (i64, i64) {
    let candidates = [a_lo * b_lo, a_lo * b_hi, a_hi * b_lo, a_hi * b_hi];
    (
        *candidates.iter().min().unwrap(),
        *candidates.iter().max().unwrap(),
    )
}

impl Constraint for TimesFd {
    fn variables(&self) -> Vec<FdVar> {
        vec![self.x, self.y, self.z]
    }

    fn kind(&self) -> &'static str {
        "times_fd"
    }

    fn propagate(&self, state: &SolverState) -> PropagationResult<SolverState> {
        let dx = domain_or_fail(state, self.x)?;
        let dy = domain_or_fail(state, self.y)?;
        let dz = domain_or_fail(state, self.z)?;
        let (x_lo, x_hi) = (dx.min().ok_or(PropagationFailed)?, dx.max().ok_or(PropagationFailed)?);
        let (y_lo, y_hi) = (dy.min().ok_or(PropagationFailed)?, dy.max().ok_or(PropagationFailed)?);
        let (z_lo, z_hi) = (dz.min().ok_or(PropagationFailed)?, dz.max().ok_or(PropagationFailed)?);

        let (p_lo, p_hi) = min_max_product(x_lo, x_hi, y_lo, y_hi);
        let new_z = dz.intersect(&Domain::range(dz.max_value(), p_lo, p_hi));

        // Narrow x from z / y when y's range excludes zero, else leave x be:
        // division-based narrowing around zero is unsound for integer domains.
        let new_x = if y_lo > 0 || y_hi < 0 {
            let bounds = [z_lo.div_euclid(y_lo.abs().max(1)), z_hi.div_euclid(y_lo.abs().max(1))];
            let lo = *bounds.iter().min().unwrap() - 1;
            let hi = *bounds.iter().max().unwrap() + 1;
            dx.intersect(&Domain::range(dx.max_value(), lo, hi))
        } else {
            dx
        };
        let new_y = if x_lo > 0 || x_hi < 0 {
            let bounds = [z_lo.div_euclid(x_lo.abs().max(1)), z_hi.div_euclid(x_lo.abs().max(1))];
            let lo = *bounds.iter().min().unwrap() - 1;
            let hi = *bounds.iter().max().unwrap() + 1;
            dy.intersect(&Domain::range(dy.max_value(), lo, hi))
        } else {
            dy
        };

        let mut new_state = state.clone();
        new_state = new_state.set_domain(self.x, new_x);
        new_state = new_state.set_domain(self.y, new_y);
        new_state = new_state.set_domain(self.z, new_z);
        Ok(new_state)
    }
}

/// `x / y = z` (truncating integer division; `y` excludes zero).
#[derive(Debug)]
pub struct DivFd {
    pub x: FdVar,
    pub y: FdVar,
    pub z: FdVar,
}

impl Constraint for DivFd {
    fn variables(&self) -> Vec<FdVar> {
        vec![self.x, self.y, self.z]
    }

    fn kind(&self) -> &'static str {
        "div_fd"
    }

    fn propagate(&self, state: &SolverState) -> PropagationResult<SolverState> {
        let dx = domain_or_fail(state, self.x)?;
        let dy = domain_or_fail(state, self.y)?.remove(0);
        let dz = domain_or_fail(state, self.z)?;
        if dy.is_empty() {
            return Err(PropagationFailed);
        }

        let allowed_z: Vec<i64> = dx
            .iter_values()
            .flat_map(|xv| dy.iter_values().map(move |yv| xv / yv))
            .collect();
        let new_z = dz.intersect(&Domain::from_values(dz.max_value(), &allowed_z));

        let allowed_x: Vec<i64> = dx
            .iter_values()
            .filter(|&xv| dy.iter_values().any(|yv| new_z.has(xv / yv)))
            .collect();
        let new_x = dx.intersect(&Domain::from_values(dx.max_value(), &allowed_x));

        let allowed_y: Vec<i64> = dy
            .iter_values()
            .filter(|&yv| dx.iter_values().any(|xv| new_z.has(xv / yv)))
            .collect();
        let new_y = dy.intersect(&Domain::from_values(dy.max_value(), &allowed_y));

        let mut new_state = state.clone();
        new_state = new_state.set_domain(self.x, new_x);
        new_state = new_state.set_domain(self.y, new_y);
        new_state = new_state.set_domain(self.z, new_z);
        Ok(new_state)
    }
}

/// `x mod y = z`.
#[derive(Debug)]
pub struct ModFd {
    pub x: FdVar,
    pub y: FdVar,
    pub z: FdVar,
}

impl Constraint for ModFd {
    fn variables(&self) -> Vec<FdVar> {
        vec![self.x, self.y, self.z]
    }

    fn kind(&self) -> &'static str {
        "mod_fd"
    }

    fn propagate(&self, state: &SolverState) -> PropagationResult<SolverState> {
        let dx = domain_or_fail(state, self.x)?;
        let dy = domain_or_fail(state, self.y)?.remove(0);
        let dz = domain_or_fail(state, self.z)?;
        if dy.is_empty() {
            return Err(PropagationFailed);
        }

        let allowed_z: Vec<i64> = dx
            .iter_values()
            .flat_map(|xv| dy.iter_values().map(move |yv| xv % yv))
            .collect();
        let new_z = dz.intersect(&Domain::from_values(dz.max_value().max(0), &allowed_z));

        let allowed_x: Vec<i64> = dx
            .iter_values()
            .filter(|&xv| dy.iter_values().any(|yv| new_z.has(xv % yv)))
            .collect();
        let new_x = dx.intersect(&Domain::from_values(dx.max_value(), &allowed_x));

        let mut new_state = state.clone();
        new_state = new_state.set_domain(self.x, new_x);
        new_state = new_state.set_domain(self.y, dy);
        new_state = new_state.set_domain(self.z, new_z);
        Ok(new_state)
    }
}

/// `k * x = y` for a compile-time-known scalar `k`.
#[derive(Debug)]
pub struct ScaleFd {
    pub k: i64,
    pub x: FdVar,
    pub y: FdVar,
}

impl Constraint for ScaleFd {
    fn variables(&self) -> Vec<FdVar> {
        vec![self.x, self.y]
    }

    fn kind(&self) -> &'static str {
        "scale_fd"
    }

    fn propagate(&self, state: &SolverState) -> PropagationResult<SolverState> {
        let dx = domain_or_fail(state, self.x)?;
        let dy = domain_or_fail(state, self.y)?;
        if self.k == 0 {
            let new_y = dy.intersect(&Domain::range(dy.max_value(), 0, 0));
            return Ok(state.clone().set_domain(self.y, new_y));
        }
        let allowed_y: Vec<i64> = dx.iter_values().map(|v| v * self.k).collect();
        let new_y = dy.intersect(&Domain::from_values(dy.max_value(), &allowed_y));
        let allowed_x: Vec<i64> = dy
            .iter_values()
            .filter(|v| v % self.k == 0)
            .map(|v| v / self.k)
            .collect();
        let new_x = dx.intersect(&Domain::from_values(dx.max_value(), &allowed_x));

        let mut new_state = state.clone();
        new_state = new_state.set_domain(self.x, new_x);
        new_state = new_state.set_domain(self.y, new_y);
        Ok(new_state)
    }
}

/// `r = |x - offset|` for a compile-time-known `offset`. Domains hold only
/// positive integers (see `Domain`), so a value where `x == offset` has no
/// representable image in `r`'s domain and is silently dropped, the same
/// way any other arithmetic link here drops a zero result.
#[derive(Debug)]
pub struct AbsoluteFd {
    pub x: FdVar,
    pub offset: i64,
    pub r: FdVar,
}

impl Constraint for AbsoluteFd {
    fn variables(&self) -> Vec<FdVar> {
        vec![self.x, self.r]
    }

    fn kind(&self) -> &'static str {
        "absolute_fd"
    }

    fn propagate(&self, state: &SolverState) -> PropagationResult<SolverState> {
        let dx = domain_or_fail(state, self.x)?;
        let dr = domain_or_fail(state, self.r)?;

        let allowed_r: Vec<i64> = dx.iter_values().map(|v| (v - self.offset).abs()).collect();
        let new_r = dr.intersect(&Domain::from_values(dr.max_value(), &allowed_r));

        // x = offset + r or x = offset - r for some value r holds in new_r.
        let allowed_x: Vec<i64> = dx
            .iter_values()
            .filter(|v| new_r.has((v - self.offset).abs()))
            .collect();
        let new_x = dx.intersect(&Domain::from_values(dx.max_value(), &allowed_x));

        let mut new_state = state.clone();
        new_state = new_state.set_domain(self.x, new_x);
        new_state = new_state.set_domain(self.r, new_r);
        Ok(new_state)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::fd::model::Model;
    use std::sync::Arc;

    #[test]
    fn plus_fd_narrows_z_bounds() {
        let mut model = Model::new();
        let x = model.new_var(Domain::range(10, 1, 3));
        let y = model.new_var(Domain::range(10, 1, 2));
        let z = model.new_var(Domain::full(10));
        model.post(Arc::new(PlusFd { x, y, z }));
        let state = model.propagate(model.initial_state()).unwrap();
        assert_eq!(state.get_domain(z).unwrap().min(), Some(2));
        assert_eq!(state.get_domain(z).unwrap().max(), Some(5));
    }

    #[test]
    fn absolute_fd_derives_r_from_x_with_zero_offset() {
        let mut model = Model::new();
        let x = model.new_var(Domain::from_values(10, &[3]));
        let r = model.new_var(Domain::full(10));
        model.post(Arc::new(AbsoluteFd { x, offset: 0, r }));
        let state = model.propagate(model.initial_state()).unwrap();
        assert_eq!(state.get_domain(r).unwrap().to_slice(), vec![3]);
    }

    #[test]
    fn absolute_fd_narrows_both_sides_of_a_nonzero_offset() {
        // x in {1,2,3,8,9}, offset 5: |x-5| in {4,3,2,3,4} -> r narrows to
        // {2,3,4}; going back, every x whose |x-5| lands outside {2,3,4}
        // (here: none, all five values survive) stays, but r itself sheds
        // any value not actually produced by some x.
        let mut model = Model::new();
        let x = model.new_var(Domain::from_values(10, &[1, 2, 3, 8, 9]));
        let r = model.new_var(Domain::full(10));
        model.post(Arc::new(AbsoluteFd { x, offset: 5, r }));
        let state = model.propagate(model.initial_state()).unwrap();
        let mut r_values = state.get_domain(r).unwrap().to_slice();
        r_values.sort_unstable();
        assert_eq!(r_values, vec![2, 3, 4]);
        let mut x_values = state.get_domain(x).unwrap().to_slice();
        x_values.sort_unstable();
        assert_eq!(x_values, vec![1, 2, 3, 8, 9]);
    }

    #[test]
    fn div_fd_narrows_quotient() {
        let mut model = Model::new();
        let x = model.new_var(Domain::from_values(10, &[6]));
        let y = model.new_var(Domain::from_values(10, &[2, 3]));
        let z = model.new_var(Domain::full(10));
        model.post(Arc::new(DivFd { x, y, z }));
        let state = model.propagate(model.initial_state()).unwrap();
        let mut values = state.get_domain(z).unwrap().to_slice();
        values.sort_unstable();
        assert_eq!(values, vec![2, 3]);
    }

    #[test]
    fn mod_fd_narrows_remainder() {
        let mut model = Model::new();
        let x = model.new_var(Domain::from_values(10, &[7]));
        let y = model.new_var(Domain::from_values(10, &[3]));
        let z = model.new_var(Domain::full(10));
        model.post(Arc::new(ModFd { x, y, z }));
        let state = model.propagate(model.initial_state()).unwrap();
        assert_eq!(state.get_domain(z).unwrap().to_slice(), vec![1]);
    }

    #[test]
    fn scale_fd_doubles_domain() {
        let mut model = Model::new();
        let x = model.new_var(Domain::from_values(10, &[1, 2, 3]));
        let y = model.new_var(Domain::full(10));
        model.post(Arc::new(ScaleFd { k: 2, x, y }));
        let state = model.propagate(model.initial_state()).unwrap();
        assert_eq!(state.get_domain(y).unwrap().to_slice(), vec![2, 4, 6]);
    }
}
