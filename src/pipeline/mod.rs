//! Pipeline module - the stages of the funnel analysis
//!
//! Each stage consumes the previous stage's structure and returns a new
//! one: source tables -> merged frame -> labeled frame -> pivots ->
//! significance tests. Nothing is mutated in place.

pub mod funnel;
pub mod labels;
pub mod loader;
pub mod merge;
pub mod stats;

pub use funnel::*;
pub use labels::*;
pub use loader::*;
pub use merge::*;
pub use stats::*;
