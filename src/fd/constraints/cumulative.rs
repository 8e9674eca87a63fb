//! `Cumulative` (tasks with start times, fixed durations and resource
//! demands must never exceed capacity at any instant) and its common
//! specialization `NoOverlap` (unary capacity).
use crate::error::{PropagationFailed, PropagationResult};
use crate::fd::domain::Domain;
use crate::fd::state::{Constraint, SolverState};
use crate::fd::var::FdVar;

#[derive(Debug, Clone)]
pub struct Task {
    pub start: FdVar,
    pub duration: i64,
    pub demand: i64,
}

#[derive(Debug)]
pub struct Cumulative {
    tasks: Vec<Task>,
    capacity: i64,
}

impl Cumulative {
    pub fn new(tasks: Vec<Task>, capacity: i64) -> Cumulative {
        Cumulative { tasks, capacity }
    }

    /// `NoOverlap` is `Cumulative` with unary demand and capacity: no two
    /// tasks may run concurrently.
    pub fn no_overlap(starts_and_durations: Vec<(FdVar, i64)>) -> Cumulative {
        let tasks = starts_and_durations
            .into_iter()
            .map(|(start, duration)| Task {
                start,
                duration,
                demand: 1,
            })
            .collect();
        Cumulative { tasks, capacity: 1 }
    }
}

impl Constraint for Cumulative {
    fn variables(&self) -> Vec<FdVar> {
        self.tasks.iter().map(|t| t.start).collect()
    }

    fn kind(&self) -> &'static str {
        "cumulative"
    }

    fn propagate(&self, state: &SolverState) -> PropagationResult<SolverState> {
        let domains: Vec<Domain> = self
            .tasks
            .iter()
            .map(|t| state.get_domain(t.start).cloned().ok_or(PropagationFailed))
            .collect::<PropagationResult<_>>()?;

        // Timetable filtering: for every time point covered by at least one
        // task's mandatory part (the interval every feasible start forces
        // the task to cover), sum committed demand and reject/remove start
        // times that would push any instant over capacity.
        let horizon_end = domains
            .iter()
            .zip(&self.tasks)
            .map(|(d, t)| d.max().unwrap_or(0) + t.duration)
            .max()
            .unwrap_or(0);

        let mut profile = vec![0i64; (horizon_end.max(0) + 1) as usize];
        for (d, t) in domains.iter().zip(&self.tasks) {
            let lo = d.min().ok_or(PropagationFailed)?;
            let hi = d.max().ok_or(PropagationFailed)?;
            let mandatory_start = hi;
            let mandatory_end = lo + t.duration;
            if mandatory_start < mandatory_end {
                for time in mandatory_start..mandatory_end {
                    profile[time as usize] += t.demand;
                }
            }
        }
        if profile.iter().any(|&usage| usage > self.capacity) {
            return Err(PropagationFailed);
        }

        let mut new_state = state.clone();
        for (i, task) in self.tasks.iter().enumerate() {
            let d = &domains[i];
            let mut allowed = Vec::new();
            for candidate_start in d.to_slice() {
                let mut ok = true;
                for time in candidate_start..candidate_start + task.duration {
                    let idx = time as usize;
                    let usage = if idx < profile.len() { profile[idx] } else { 0 };
                    // Subtract this task's own mandatory contribution before
                    // checking, then add its demand back for this candidate.
                    let mandatory_start = d.max().unwrap_or(candidate_start);
                    let mandatory_end = d.min().unwrap_or(candidate_start) + task.duration;
                    let self_contrib = if time >= mandatory_start && time < mandatory_end {
                        task.demand
                    } else {
                        0
                    };
                    if usage - self_contrib + task.demand > self.capacity {
                        ok = false;
                        break;
                    }
                }
                if ok {
                    allowed.push(candidate_start);
                }
            }
            let narrowed = d.intersect(&Domain::from_values(d.max_value(), &allowed));
            if narrowed.is_empty() {
                return Err(PropagationFailed);
            }
            new_state = new_state.set_domain(task.start, narrowed);
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
    fn no_overlap_forces_disjoint_starts() {
        let mut model = Model::new();
        let a = model.new_var(Domain::from_values(10, &[1]));
        let b = model.new_var(Domain::from_values(10, &[1, 2]));
        model.post(Arc::new(Cumulative::no_overlap(vec![(a, 1), (b, 1)])));
        let state = model.propagate(model.initial_state()).unwrap();
        // task a occupies just time 1, so b cannot start at 1 but may at 2.
        assert!(!state.get_domain(b).unwrap().has(1));
        assert!(state.get_domain(b).unwrap().has(2));
    }
}
