//! Global and arithmetic constraints over the shared [`crate::fd::state::Constraint`] trait (C4/C5).
pub mod all_different;
pub mod arithmetic;
pub mod cumulative;
pub mod gcc;
pub mod lex;
pub mod linear_sum;
pub mod regular;
pub mod stretch;
pub mod table;

pub use all_different::AllDifferent;
pub use arithmetic::{AbsoluteFd, DivFd, MinusFd, ModFd, PlusFd, ScaleFd, TimesFd};
pub use cumulative::{Cumulative, Task};
pub use gcc::GlobalCardinality;
pub use lex::LexLess;
pub use linear_sum::LinearSum;
pub use regular::{Dfa, Regular};
pub use stretch::Stretch;
pub use table::Table;
