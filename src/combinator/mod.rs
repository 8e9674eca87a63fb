//! Stream combinators built on [`crate::goal::Solve`]: conjunction,
//! disjunction/conde, and the soft-cut conditionals `Ifte`/`Ifa` (C2).
pub mod conj;
pub mod disj;
pub mod ifte;

pub use conj::Conj;
pub use disj::{Conde, Disj};
pub use ifte::{Ifa, Ifte};
