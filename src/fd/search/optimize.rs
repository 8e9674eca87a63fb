//! Sequential branch-and-bound optimization.
use crate::context::Context;
use crate::error::{Error, Result};
use crate::fd::domain::Domain;
use crate::fd::model::Model;
use crate::fd::search::labeling::Labeling;
use crate::fd::search::strategy::{Assignment, SearchLimit};
use crate::fd::state::SolverState;
use crate::fd::var::FdVar;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Objective {
    Minimize,
    Maximize,
}

pub struct OptimizeOutcome {
    pub best: Option<(Assignment, i64)>,
    pub proved_optimal: bool,
}

struct Incumbent {
    value: Option<i64>,
    assignment: Option<Assignment>,
}

impl Incumbent {
    fn better(&self, candidate: i64, objective: Objective) -> bool {
        match self.value {
            None => true,
            Some(current) => match objective {
                Objective::Minimize => candidate < current,
                Objective::Maximize => candidate > current,
            },
        }
    }

    /// Domain cut for the objective variable given the current incumbent:
    /// remove `>= incumbent` when minimizing, `<= incumbent` when maximizing.
    fn cut(&self, domain: &Domain, objective: Objective) -> Domain {
        match (self.value, objective) {
            (None, _) => domain.clone(),
            (Some(v), Objective::Minimize) => domain.remove_at_or_above(v),
            (Some(v), Objective::Maximize) => domain.remove_at_or_below(v),
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn node(
    ctx: &Context,
    model: &Model,
    state: SolverState,
    vars: &[FdVar],
    objective_var: FdVar,
    objective: Objective,
    labeling: &dyn Labeling,
    target: Option<i64>,
    incumbent: &mut Incumbent,
    nodes: &mut usize,
    limit: SearchLimit,
) -> Result<()> {
    if ctx.is_cancelled() {
        return Err(Error::Cancelled);
    }
    if let Some(max_nodes) = limit.max_nodes {
        if *nodes >= max_nodes {
            return Err(Error::SearchLimitReached);
        }
    }
    *nodes += 1;

    let objective_domain = state.get_domain(objective_var).cloned().unwrap_or_else(|| Domain::empty(0));
    let cut_domain = incumbent.cut(&objective_domain, objective);
    let state = if cut_domain != objective_domain {
        match model.propagate(state.set_domain(objective_var, cut_domain)) {
            Ok(s) => s,
            Err(_) => return Ok(()),
        }
    } else {
        state
    };

    match labeling.select(vars, &state) {
        None => {
            let value = match state.get_domain(objective_var) {
                Some(d) if d.is_singleton() => d.singleton_value(),
                _ => return Ok(()),
            };
            if incumbent.better(value, objective) {
                let mut assignment = Assignment::new();
                for &v in vars {
                    if let Some(d) = state.get_domain(v) {
                        if d.is_singleton() {
                            assignment.insert(v, d.singleton_value());
                        }
                    }
                }
                incumbent.value = Some(value);
                incumbent.assignment = Some(assignment);
                if target == Some(value) {
                    return Err(Error::Cancelled);
                }
            }
            Ok(())
        }
        Some((var, values)) => {
            for value in values {
                let domain = Domain::from_values(
                    state.get_domain(var).map(|d| d.max_value()).unwrap_or(value),
                    &[value],
                );
                if let Ok(propagated) = model.propagate(state.set_domain(var, domain)) {
                    node(
                        ctx,
                        model,
                        propagated,
                        vars,
                        objective_var,
                        objective,
                        labeling,
                        target,
                        incumbent,
                        nodes,
                        limit,
                    )?;
                }
            }
            Ok(())
        }
    }
}

/// Branch-and-bound search for the assignment of `vars` that
/// minimizes/maximizes `objective_var`, with an optional early-accept
/// `target` value. Returns the best solution found even when a limit or
/// cancellation interrupts the search before optimality is proven.
#[allow(clippy::too_many_arguments)]
pub fn optimize(
    ctx: &Context,
    model: &Model,
    state: SolverState,
    vars: &[FdVar],
    objective_var: FdVar,
    objective: Objective,
    labeling: &dyn Labeling,
    target: Option<i64>,
    limit: SearchLimit,
) -> Result<OptimizeOutcome> {
    let mut incumbent = Incumbent {
        value: None,
        assignment: None,
    };
    let mut nodes = 0usize;
    let outcome = node(
        ctx,
        model,
        state,
        vars,
        objective_var,
        objective,
        labeling,
        target,
        &mut incumbent,
        &mut nodes,
        limit,
    );

    let best = incumbent
        .assignment
        .zip(incumbent.value)
        .map(|(a, v)| (a, v));

    match outcome {
        Ok(()) => Ok(OptimizeOutcome {
            best,
            proved_optimal: true,
        }),
        Err(Error::Cancelled) if target.is_some() && best.is_some() => Ok(OptimizeOutcome {
            best,
            proved_optimal: false,
        }),
        Err(Error::SearchLimitReached) => {
            log::warn!("optimize: node limit reached after {} nodes, returning best-known", nodes);
            Ok(OptimizeOutcome {
                best,
                proved_optimal: false,
            })
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::fd::constraints::AllDifferent;
    use crate::fd::search::labeling::MrvLabeling;
    use std::sync::Arc;

    #[test]
    fn minimizes_sum_of_two_all_different_vars() {
        let mut model = Model::new();
        let x = model.new_var(Domain::full(3));
        let y = model.new_var(Domain::full(3));
        model.post(Arc::new(AllDifferent::new(vec![x, y])));
        let ctx = Context::new();
        let outcome = optimize(
            &ctx,
            &model,
            model.initial_state(),
            &[x, y],
            x,
            Objective::Minimize,
            &MrvLabeling,
            None,
            SearchLimit::default(),
        )
        .unwrap();
        assert!(outcome.proved_optimal);
        let (_, value) = outcome.best.unwrap();
        assert_eq!(value, 1);
    }
}
