//! FD search: labeling heuristics, DFS/BFS/limited-depth/iterative-deepening
//! strategies, and sequential/parallel branch-and-bound optimization (C5).
pub mod labeling;
pub mod optimize;
pub mod parallel;
pub mod strategy;

pub use labeling::{InOrderLabeling, Labeling, MrvLabeling};
pub use optimize::{optimize, Objective, OptimizeOutcome};
pub use parallel::parallel_optimize;
pub use strategy::{bfs, dfs, iterative_deepening, limited_depth_search, Assignment, SearchLimit};
