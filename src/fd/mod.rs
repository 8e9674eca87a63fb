//! The finite-domain constraint solver: bitset domains, a persistent
//! propagation state, a fixpoint loop driven by a variable -> constraint
//! index, a library of global constraints, and DFS/BFS/B&B search (C3-C5).
pub mod constraints;
pub mod domain;
pub mod model;
pub mod search;
pub mod state;
pub mod var;

pub use domain::Domain;
pub use model::Model;
pub use state::{Constraint, SolverState};
pub use var::{FdVar, FdVarInfo};
