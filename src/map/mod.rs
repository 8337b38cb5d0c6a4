//! Occupancy-grid map used for range prediction.

mod occupancy_map;

pub use occupancy_map::{CellState, OccupancyMap};
