//! Sparse sampling search tree.
//!
//! - [`Node`]: Per-state bounds, sampled branches, expansion and backup
//! - [`Searcher`]: Depth-bucketed memo table and trajectory sampling
//! - [`Config`]: Sampling width and pruning knobs
//! - [`Problem`]: Action count, discount, and global value bounds
mod bound;
mod branch;
mod config;
mod node;
mod searcher;


pub use bound::Bound;
pub use branch::Branch;
pub use branch::Branches;
pub use config::Config;
pub use config::Problem;
pub use node::Node;
pub use searcher::Searcher;
