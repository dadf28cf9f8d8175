//! Report module - console tables, chart artifacts, JSON export

pub mod charts;
pub mod export;
pub mod summary;

pub use charts::*;
pub use export::*;
pub use summary::*;
