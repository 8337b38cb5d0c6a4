//! Foundation layer: math helpers and shared value types.

pub mod math;
pub mod types;
