//! A miniKanren-family relational engine (C1-C2) fused with a finite-domain
//! constraint solver (C3-C5) and an SLG tabled-resolution engine (C6).
//!
//! The three layers share one constraint store and one monotonic variable
//! id space: a logic variable minted by [`goal::fresh`] can be registered
//! directly with the FD solver via [`relation_fd::in_fd`], and any goal can
//! be evaluated under tabling through [`slg::SlgEngine`].
pub mod combinator;
pub mod context;
pub mod error;
pub mod fd;
pub mod goal;
pub mod relation_fd;
pub mod run;
pub mod slg;
pub mod store;
pub mod stream;
pub mod substitution;
pub mod term;

pub mod prelude {
    pub use crate::combinator::{Conde, Conj, Disj, Ifa, Ifte};
    pub use crate::context::Context;
    pub use crate::error::{Error, Result};
    pub use crate::fd::{Domain, FdVar, Model};
    pub use crate::goal::{call_goal, eq, failure, fresh, success, Goal, Solve};
    pub use crate::relation_fd::{
        all_different_fd, div_fd, in_fd, linear_sum_fd, lt_fd, lte_fd, minus_fd, mod_fd, plus_fd,
        times_fd,
    };
    pub use crate::run::{run, run_with_context};
    pub use crate::slg::SlgEngine;
    pub use crate::store::ConstraintStore;
    pub use crate::stream::Stream;
    pub use crate::term::{Term, VarId};
}
