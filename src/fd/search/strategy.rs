//! Search strategies over the FD propagation fixpoint: DFS (default), BFS
//! bounded by `max_depth`, `LimitedDepthSearch`, and `IterativeDeepening`.
//! All four share the contract `search(ctx, model, state, labeling, limit)
//! -> Result<Vec<Assignment>, Error>`.
use crate::context::Context;
use crate::error::{Error, Result};
use crate::fd::model::Model;
use crate::fd::search::labeling::Labeling;
use crate::fd::state::SolverState;
use crate::fd::var::FdVar;
use std::collections::HashMap;

pub type Assignment = HashMap<FdVar, i64>;

#[derive(Debug, Clone, Copy, Default)]
pub struct SearchLimit {
    pub max_solutions: Option<usize>,
    pub max_depth: Option<usize>,
    pub max_nodes: Option<usize>,
}

impl SearchLimit {
    pub fn one_solution() -> SearchLimit {
        SearchLimit {
            max_solutions: Some(1),
            ..Default::default()
        }
    }
}

fn snapshot(vars: &[FdVar], state: &SolverState) -> Option<Assignment> {
    let mut out = HashMap::with_capacity(vars.len());
    for &v in vars {
        let d = state.get_domain(v)?;
        if !d.is_singleton() {
            return None;
        }
        out.insert(v, d.singleton_value());
    }
    Some(out)
}

struct Budget {
    nodes: usize,
    limit: SearchLimit,
}

fn dfs_node(
    ctx: &Context,
    model: &Model,
    state: SolverState,
    vars: &[FdVar],
    labeling: &dyn Labeling,
    depth: usize,
    budget: &mut Budget,
    out: &mut Vec<Assignment>,
) -> Result<()> {
    if ctx.is_cancelled() {
        return Err(Error::Cancelled);
    }
    if let Some(max_solutions) = budget.limit.max_solutions {
        if out.len() >= max_solutions {
            return Ok(());
        }
    }
    if let Some(max_nodes) = budget.limit.max_nodes {
        if budget.nodes >= max_nodes {
            return Err(Error::SearchLimitReached);
        }
    }
    budget.nodes += 1;

    if let Some(max_depth) = budget.limit.max_depth {
        if depth > max_depth {
            return Ok(());
        }
    }

    match labeling.select(vars, &state) {
        None => {
            if let Some(solution) = snapshot(vars, &state) {
                out.push(solution);
            }
            Ok(())
        }
        Some((var, values)) => {
            for value in values {
                if let Some(max_solutions) = budget.limit.max_solutions {
                    if out.len() >= max_solutions {
                        break;
                    }
                }
                let domain = crate::fd::domain::Domain::from_values(
                    state.get_domain(var).map(|d| d.max_value()).unwrap_or(value),
                    &[value],
                );
                let branched = state.set_domain(var, domain);
                match model.propagate(branched) {
                    Ok(propagated) => {
                        dfs_node(ctx, model, propagated, vars, labeling, depth + 1, budget, out)?;
                    }
                    Err(_) => continue,
                }
            }
            Ok(())
        }
    }
}

/// Depth-first search: the default strategy. Explores one value at a time,
/// fully expanding each branch before trying the next.
pub fn dfs(
    ctx: &Context,
    model: &Model,
    state: SolverState,
    vars: &[FdVar],
    labeling: &dyn Labeling,
    limit: SearchLimit,
) -> Result<Vec<Assignment>> {
    let mut out = Vec::new();
    let mut budget = Budget { nodes: 0, limit };
    dfs_node(ctx, model, state, vars, labeling, 0, &mut budget, &mut out)?;
    Ok(out)
}

/// Breadth-first search bounded by `limit.max_depth` (required; BFS over an
/// unbounded FD tree does not terminate in general).
pub fn bfs(
    ctx: &Context,
    model: &Model,
    state: SolverState,
    vars: &[FdVar],
    labeling: &dyn Labeling,
    limit: SearchLimit,
) -> Result<Vec<Assignment>> {
    let max_depth = limit.max_depth.unwrap_or(vars.len());
    let mut frontier = vec![(state, 0usize)];
    let mut out = Vec::new();
    let mut nodes = 0usize;

    while let Some((current, depth)) = frontier.pop() {
        if ctx.is_cancelled() {
            return Err(Error::Cancelled);
        }
        if let Some(max_solutions) = limit.max_solutions {
            if out.len() >= max_solutions {
                break;
            }
        }
        if let Some(max_nodes) = limit.max_nodes {
            if nodes >= max_nodes {
                return Err(Error::SearchLimitReached);
            }
        }
        nodes += 1;

        match labeling.select(vars, &current) {
            None => {
                if let Some(solution) = snapshot(vars, &current) {
                    out.push(solution);
                }
            }
            Some((var, values)) if depth < max_depth => {
                for value in values {
                    let domain = crate::fd::domain::Domain::from_values(
                        current.get_domain(var).map(|d| d.max_value()).unwrap_or(value),
                        &[value],
                    );
                    let branched = current.set_domain(var, domain);
                    if let Ok(propagated) = model.propagate(branched) {
                        frontier.push((propagated, depth + 1));
                    }
                }
            }
            Some(_) => {}
        }
    }
    Ok(out)
}

/// DFS cut off at a fixed depth; nodes beyond the limit are abandoned
/// rather than treated as failures.
pub fn limited_depth_search(
    ctx: &Context,
    model: &Model,
    state: SolverState,
    vars: &[FdVar],
    labeling: &dyn Labeling,
    max_depth: usize,
    mut limit: SearchLimit,
) -> Result<Vec<Assignment>> {
    limit.max_depth = Some(max_depth);
    dfs(ctx, model, state, vars, labeling, limit)
}

/// Repeats `limited_depth_search` with an increasing depth bound until a
/// solution is found, the caller's `max_depth` ceiling is hit, or the
/// search is cancelled.
pub fn iterative_deepening(
    ctx: &Context,
    model: &Model,
    state: SolverState,
    vars: &[FdVar],
    labeling: &dyn Labeling,
    limit: SearchLimit,
) -> Result<Vec<Assignment>> {
    let ceiling = limit.max_depth.unwrap_or(vars.len());
    for depth in 0..=ceiling {
        let mut round_limit = limit;
        round_limit.max_depth = Some(depth);
        let found = limited_depth_search(ctx, model, state.clone(), vars, labeling, depth, round_limit)?;
        if !found.is_empty() {
            return Ok(found);
        }
    }
    Ok(Vec::new())
}
