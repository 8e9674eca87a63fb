//! The static FD problem description: variables, constraints, and the
//! variable -> constraint index used to drive the propagation fixpoint.
use crate::context::Context;
use crate::error::Result;
use crate::fd::domain::Domain;
use crate::fd::search::labeling::{Labeling, MrvLabeling};
use crate::fd::search::optimize::{self, Objective, OptimizeOutcome};
use crate::fd::search::parallel::parallel_optimize;
use crate::fd::search::strategy::{dfs, Assignment, SearchLimit};
use crate::fd::state::{propagate, Constraint, SolverState};
use crate::fd::var::{FdVar, FdVarInfo};
use crate::term::VarId;
use std::collections::HashMap;
use std::sync::Arc;

/// Options accepted by [`Model::solve_optimal`]: how many workers to run
/// the branch-and-bound search with (`1` stays sequential), an optional
/// node budget, and an early-accept objective value.
#[derive(Debug, Clone, Copy, Default)]
pub struct OptimizeOptions {
    pub parallel_workers: usize,
    pub node_limit: Option<usize>,
    pub target_objective: Option<i64>,
}

#[derive(Default)]
pub struct Model {
    vars: Vec<FdVarInfo>,
    constraints: Vec<Arc<dyn Constraint>>,
    var_to_constraints: HashMap<FdVar, Vec<usize>>,
    initial_domains: HashMap<FdVar, Domain>,
}

impl Model {
    pub fn new() -> Model {
        Model::default()
    }

    pub fn new_var(&mut self, domain: Domain) -> FdVar {
        self.new_named_var(domain, None)
    }

    pub fn new_named_var(&mut self, domain: Domain, name: Option<&'static str>) -> FdVar {
        let id = VarId::fresh();
        self.vars.push(FdVarInfo::new(id, name));
        self.initial_domains.insert(id, domain);
        id
    }

    pub fn vars(&self) -> &[FdVarInfo] {
        &self.vars
    }

    pub fn post(&mut self, constraint: Arc<dyn Constraint>) {
        let idx = self.constraints.len();
        for v in constraint.variables() {
            self.var_to_constraints.entry(v).or_default().push(idx);
        }
        self.constraints.push(constraint);
    }

    pub fn constraints(&self) -> &[Arc<dyn Constraint>] {
        &self.constraints
    }

    /// The initial solver state: every declared variable registered with its
    /// initial domain, all marked dirty so the first `propagate` call
    /// establishes arc-consistency from a cold start.
    pub fn initial_state(&self) -> SolverState {
        let mut state = SolverState::new();
        for v in &self.vars {
            let domain = self
                .initial_domains
                .get(&v.id)
                .cloned()
                .unwrap_or_else(|| Domain::empty(0));
            state = state.register(v.id, domain);
        }
        state.with_all_dirty()
    }

    pub fn propagate(&self, state: SolverState) -> crate::error::PropagationResult<SolverState> {
        propagate(state, &self.constraints, &self.var_to_constraints)
    }

    /// Finds up to `max_solutions` complete assignments of every declared
    /// variable, via DFS with MRV labeling from a cold-started state.
    pub fn solve(&self, ctx: &Context, max_solutions: usize) -> Result<Vec<Assignment>> {
        let vars: Vec<FdVar> = self.vars.iter().map(|v| v.id).collect();
        let mut limit = SearchLimit::default();
        limit.max_solutions = Some(max_solutions);
        dfs(ctx, self, self.initial_state(), &vars, &MrvLabeling, limit)
    }

    /// Minimizes/maximizes `objective_var` over every declared variable.
    /// `options.parallel_workers > 1` dispatches the work-queue parallel
    /// optimizer instead of the sequential one.
    pub fn solve_optimal(
        &self,
        ctx: &Context,
        objective_var: FdVar,
        minimize: bool,
        options: OptimizeOptions,
    ) -> Result<OptimizeOutcome> {
        let vars: Vec<FdVar> = self.vars.iter().map(|v| v.id).collect();
        let objective = if minimize { Objective::Minimize } else { Objective::Maximize };
        let mut limit = SearchLimit::default();
        limit.max_nodes = options.node_limit;
        let labeling: &dyn Labeling = &MrvLabeling;
        if options.parallel_workers > 1 {
            parallel_optimize(
                ctx,
                self,
                self.initial_state(),
                &vars,
                objective_var,
                objective,
                labeling,
                options.target_objective,
                limit,
                options.parallel_workers,
            )
        } else {
            optimize::optimize(
                ctx,
                self,
                self.initial_state(),
                &vars,
                objective_var,
                objective,
                labeling,
                options.target_objective,
                limit,
            )
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn fresh_model_propagates_to_itself_when_no_constraints() {
        let mut model = Model::new();
        let x = model.new_var(Domain::full(5));
        let state = model.initial_state();
        let propagated = model.propagate(state).unwrap();
        assert_eq!(propagated.get_domain(x).unwrap().count(), 5);
    }

    #[test]
    fn solve_finds_every_all_different_assignment_of_two_vars() {
        let mut model = Model::new();
        let x = model.new_var(Domain::full(2));
        let y = model.new_var(Domain::full(2));
        model.post(Arc::new(crate::fd::constraints::AllDifferent::new(vec![x, y])));
        let ctx = Context::new();
        let solutions = model.solve(&ctx, 10).unwrap();
        assert_eq!(solutions.len(), 2);
    }

    #[test]
    fn solve_optimal_minimizes_x_sequentially() {
        let mut model = Model::new();
        let x = model.new_var(Domain::full(3));
        let y = model.new_var(Domain::full(3));
        model.post(Arc::new(crate::fd::constraints::AllDifferent::new(vec![x, y])));
        let ctx = Context::new();
        let outcome = model
            .solve_optimal(&ctx, x, true, OptimizeOptions::default())
            .unwrap();
        assert!(outcome.proved_optimal);
        assert_eq!(outcome.best.unwrap().1, 1);
    }
}
