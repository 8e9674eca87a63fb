//! Work-queue parallel branch-and-bound optimization.
//!
//! Workers share a `crossbeam_channel` of open branches, an `AtomicI64`
//! best-known objective, a `parking_lot::Mutex`-protected best solution,
//! a "node limit hit" / "target reached" pair of `AtomicBool`s, and an
//! outstanding-tasks `AtomicUsize` that closes the channel once it hits
//! zero. Each worker iterates a branch's candidate values, re-reads the
//! shared incumbent for its cutoff, propagates, and either records a leaf,
//! requeues the resulting child branch, or discards it.
//!
//! The node counter increments once per processed **leaf**, not per
//! branch: a deliberately preserved quirk carried over from the
//! sequential optimizer's accounting, kept so the two report comparable
//! node counts for the same search.
use crate::context::Context;
use crate::error::{Error, Result};
use crate::fd::domain::Domain;
use crate::fd::model::Model;
use crate::fd::search::labeling::Labeling;
use crate::fd::search::optimize::Objective;
use crate::fd::search::strategy::{Assignment, SearchLimit};
use crate::fd::state::SolverState;
use crate::fd::var::FdVar;
use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;

struct Branch {
    state: SolverState,
    var: FdVar,
    values: Vec<i64>,
    next_index: usize,
    depth: usize,
}

struct Shared {
    best_value: AtomicI64,
    has_best: AtomicBool,
    best_solution: Mutex<Option<Assignment>>,
    node_limit_hit: AtomicBool,
    target_reached: AtomicBool,
    outstanding: AtomicUsize,
    nodes: AtomicUsize,
}

const NO_BEST: i64 = i64::MAX;

impl Shared {
    fn new() -> Shared {
        Shared {
            best_value: AtomicI64::new(NO_BEST),
            has_best: AtomicBool::new(false),
            best_solution: Mutex::new(None),
            node_limit_hit: AtomicBool::new(false),
            target_reached: AtomicBool::new(false),
            outstanding: AtomicUsize::new(0),
            nodes: AtomicUsize::new(0),
        }
    }

    fn current_cutoff(&self) -> Option<i64> {
        if self.has_best.load(Ordering::Acquire) {
            Some(self.best_value.load(Ordering::Acquire))
        } else {
            None
        }
    }

    fn offer(
        &self,
        candidate_value: i64,
        candidate: Assignment,
        objective: Objective,
        target: Option<i64>,
    ) {
        let mut guard = self.best_solution.lock();
        let improves = match (self.has_best.load(Ordering::Acquire), guard.is_some()) {
            (false, _) => true,
            (true, _) => {
                let current = self.best_value.load(Ordering::Acquire);
                match objective {
                    Objective::Minimize => candidate_value < current,
                    Objective::Maximize => candidate_value > current,
                }
            }
        };
        if improves {
            self.best_value.store(candidate_value, Ordering::Release);
            self.has_best.store(true, Ordering::Release);
            *guard = Some(candidate);
            if target == Some(candidate_value) {
                self.target_reached.store(true, Ordering::Release);
            }
        }
    }

    fn cut_domain(&self, domain: &Domain, objective: Objective) -> Domain {
        match self.current_cutoff() {
            None => domain.clone(),
            Some(v) => match objective {
                Objective::Minimize => domain.remove_at_or_above(v),
                Objective::Maximize => domain.remove_at_or_below(v),
            },
        }
    }
}

fn worker_loop(
    ctx: &Context,
    model: &Model,
    vars: &[FdVar],
    objective_var: FdVar,
    objective: Objective,
    labeling: &dyn Labeling,
    target: Option<i64>,
    limit: SearchLimit,
    shared: &Shared,
    sender: &Sender<Branch>,
    receiver: &Receiver<Branch>,
) {
    while let Ok(branch) = receiver.recv() {
        if ctx.is_cancelled() || shared.target_reached.load(Ordering::Acquire) {
            shared.outstanding.fetch_sub(1, Ordering::AcqRel);
            continue;
        }
        if let Some(max_nodes) = limit.max_nodes {
            if shared.nodes.load(Ordering::Acquire) >= max_nodes {
                shared.node_limit_hit.store(true, Ordering::Release);
                shared.outstanding.fetch_sub(1, Ordering::AcqRel);
                continue;
            }
        }

        let Branch {
            state,
            var,
            values,
            next_index,
            depth,
        } = branch;

        if next_index >= values.len() {
            shared.outstanding.fetch_sub(1, Ordering::AcqRel);
            continue;
        }
        let value = values[next_index];
        if next_index + 1 < values.len() {
            shared.outstanding.fetch_add(1, Ordering::AcqRel);
            let _ = sender.send(Branch {
                state: state.clone(),
                var,
                values: values.clone(),
                next_index: next_index + 1,
                depth,
            });
        }

        let domain = Domain::from_values(
            state.get_domain(var).map(|d| d.max_value()).unwrap_or(value),
            &[value],
        );
        let objective_domain = state.get_domain(objective_var).cloned().unwrap_or_else(|| Domain::empty(0));
        let cut = shared.cut_domain(&objective_domain, objective);
        let narrowed = state.set_domain(var, domain).set_domain(objective_var, cut);

        if let Ok(propagated) = model.propagate(narrowed) {
            match labeling.select(vars, &propagated) {
                None => {
                    shared.nodes.fetch_add(1, Ordering::AcqRel);
                    if let Some(d) = propagated.get_domain(objective_var) {
                        if d.is_singleton() {
                            let obj_value = d.singleton_value();
                            let mut assignment = Assignment::new();
                            for &v in vars {
                                if let Some(vd) = propagated.get_domain(v) {
                                    if vd.is_singleton() {
                                        assignment.insert(v, vd.singleton_value());
                                    }
                                }
                            }
                            shared.offer(obj_value, assignment, objective, target);
                        }
                    }
                }
                Some((next_var, next_values)) => {
                    shared.outstanding.fetch_add(1, Ordering::AcqRel);
                    let _ = sender.send(Branch {
                        state: propagated,
                        var: next_var,
                        values: next_values,
                        next_index: 0,
                        depth: depth + 1,
                    });
                }
            }
        }

        shared.outstanding.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Parallel counterpart of [`crate::fd::search::optimize::optimize`]. Spawns
/// `num_workers` `std::thread`s sharing one work queue; returns once the
/// queue drains (search exhausted), the target is reached, the node limit
/// trips, or the search is cancelled.
#[allow(clippy::too_many_arguments)]
pub fn parallel_optimize(
    ctx: &Context,
    model: &Model,
    state: SolverState,
    vars: &[FdVar],
    objective_var: FdVar,
    objective: Objective,
    labeling: &dyn Labeling,
    target: Option<i64>,
    limit: SearchLimit,
    num_workers: usize,
) -> Result<super::optimize::OptimizeOutcome> {
    let (sender, receiver) = unbounded::<Branch>();
    let shared = Arc::new(Shared::new());

    match labeling.select(vars, &state) {
        None => {
            return Ok(super::optimize::OptimizeOutcome {
                best: None,
                proved_optimal: true,
            })
        }
        Some((var, values)) => {
            shared.outstanding.fetch_add(1, Ordering::AcqRel);
            let _ = sender.send(Branch {
                state,
                var,
                values,
                next_index: 0,
                depth: 0,
            });
        }
    }

    std::thread::scope(|scope| {
        for _ in 0..num_workers.max(1) {
            let shared = Arc::clone(&shared);
            let sender = sender.clone();
            let receiver = receiver.clone();
            scope.spawn(|| {
                worker_loop(
                    ctx,
                    model,
                    vars,
                    objective_var,
                    objective,
                    labeling,
                    target,
                    limit,
                    &shared,
                    &sender,
                    &receiver,
                );
            });
        }
        drop(sender);

        // Coordinator: wait for the outstanding-task counter to hit zero,
        // which happens exactly when the channel has drained.
        while shared.outstanding.load(Ordering::Acquire) > 0 {
            if ctx.is_cancelled() {
                break;
            }
            std::thread::yield_now();
        }
    });

    let best = shared
        .best_solution
        .lock()
        .clone()
        .map(|a| (a, shared.best_value.load(Ordering::Acquire)));

    if ctx.is_cancelled() {
        return Err(Error::Cancelled);
    }
    if shared.node_limit_hit.load(Ordering::Acquire) {
        return Ok(super::optimize::OptimizeOutcome {
            best,
            proved_optimal: false,
        });
    }
    Ok(super::optimize::OptimizeOutcome {
        best,
        proved_optimal: !shared.target_reached.load(Ordering::Acquire) || target.is_none(),
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::fd::constraints::AllDifferent;
    use crate::fd::search::labeling::MrvLabeling;
    use std::sync::Arc as StdArc;

    #[test]
    fn parallel_minimize_matches_sequential_optimum() {
        let mut model = Model::new();
        let x = model.new_var(Domain::full(4));
        let y = model.new_var(Domain::full(4));
        model.post(StdArc::new(AllDifferent::new(vec![x, y])));
        let ctx = Context::new();
        let outcome = parallel_optimize(
            &ctx,
            &model,
            model.initial_state(),
            &[x, y],
            x,
            Objective::Minimize,
            &MrvLabeling,
            None,
            SearchLimit::default(),
            2,
        )
        .unwrap();
        let (_, value) = outcome.best.unwrap();
        assert_eq!(value, 1);
    }
}
