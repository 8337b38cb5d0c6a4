//! Static occupancy-grid map and range raycasting.
//!
//! The map is built once by the host (from a saved map file or an
//! external mapping stage) and never mutated during localization, so it
//! can be shared read-only across threads behind an `Arc`.

/// Occupancy state of a single grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CellState {
    /// Never observed.
    #[default]
    Unknown,
    /// Known traversable.
    Free,
    /// Known obstacle.
    Occupied,
}

/// A fixed-size occupancy grid with world-coordinate anchoring.
///
/// Cells are stored row-major. `origin` is the world coordinate of the
/// lower-left corner of cell (0, 0).
#[derive(Debug, Clone)]
pub struct OccupancyMap {
    cells: Vec<CellState>,
    width: usize,
    height: usize,
    resolution: f64,
    origin_x: f64,
    origin_y: f64,
}

impl OccupancyMap {
    /// Create a map with every cell `Unknown`.
    pub fn new(width: usize, height: usize, resolution: f64, origin_x: f64, origin_y: f64) -> Self {
        Self {
            cells: vec![CellState::Unknown; width * height],
            width,
            height,
            resolution,
            origin_x,
            origin_y,
        }
    }

    /// Create a map with every cell `Free`. Handy for tests and synthetic
    /// environments where walls are painted in afterwards.
    pub fn new_free(
        width: usize,
        height: usize,
        resolution: f64,
        origin_x: f64,
        origin_y: f64,
    ) -> Self {
        Self {
            cells: vec![CellState::Free; width * height],
            width,
            height,
            resolution,
            origin_x,
            origin_y,
        }
    }

    /// Grid dimensions in cells (width, height).
    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Meters per cell.
    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    /// World coordinate of cell (0, 0)'s corner.
    pub fn origin(&self) -> (f64, f64) {
        (self.origin_x, self.origin_y)
    }

    /// Number of `Free` cells.
    pub fn free_cell_count(&self) -> usize {
        self.cells.iter().filter(|c| **c == CellState::Free).count()
    }

    /// Cell state at (cx, cy); out-of-bounds reads as `Unknown`.
    pub fn get_state(&self, cx: usize, cy: usize) -> CellState {
        if cx < self.width && cy < self.height {
            self.cells[cy * self.width + cx]
        } else {
            CellState::Unknown
        }
    }

    /// Set the state of a cell; out-of-bounds writes are ignored.
    pub fn set_state(&mut self, cx: usize, cy: usize, state: CellState) {
        if cx < self.width && cy < self.height {
            self.cells[cy * self.width + cx] = state;
        }
    }

    /// World → cell, or `None` when outside the grid.
    pub fn world_to_cell(&self, x: f64, y: f64) -> Option<(usize, usize)> {
        let (cx, cy) = self.world_to_cell_signed(x, y);
        if cx >= 0 && cy >= 0 && (cx as usize) < self.width && (cy as usize) < self.height {
            Some((cx as usize, cy as usize))
        } else {
            None
        }
    }

    /// World → signed cell indices, without bounds clamping.
    pub fn world_to_cell_signed(&self, x: f64, y: f64) -> (i64, i64) {
        (
            ((x - self.origin_x) / self.resolution).floor() as i64,
            ((y - self.origin_y) / self.resolution).floor() as i64,
        )
    }

    /// Cell → world coordinate of the cell center.
    pub fn cell_to_world(&self, cx: usize, cy: usize) -> (f64, f64) {
        (
            self.origin_x + (cx as f64 + 0.5) * self.resolution,
            self.origin_y + (cy as f64 + 0.5) * self.resolution,
        )
    }

    fn is_blocking(&self, cx: i64, cy: i64) -> bool {
        if cx < 0 || cy < 0 || cx as usize >= self.width || cy as usize >= self.height {
            // Outside the map counts as obstacle: the robot cannot see
            // through the map boundary.
            return true;
        }
        self.cells[cy as usize * self.width + cx as usize] != CellState::Free
    }

    /// Distance from (x, y) along `heading` to the first non-`Free` cell,
    /// capped at `max_range`.
    ///
    /// Walks the grid with a Bresenham line from the start cell to the
    /// cell `max_range` meters out. `Unknown` cells and cells outside the
    /// grid stop the ray like obstacles. Returns `max_range` when the ray
    /// reaches the endpoint unobstructed; the result is always finite and
    /// never exceeds `max_range`.
    pub fn calc_range(&self, x: f64, y: f64, heading: f64, max_range: f64) -> f64 {
        let (x0, y0) = self.world_to_cell_signed(x, y);
        let (x1, y1) =
            self.world_to_cell_signed(x + max_range * heading.cos(), y + max_range * heading.sin());

        let dist = |cx: i64, cy: i64| {
            let dx = (cx - x0) as f64;
            let dy = (cy - y0) as f64;
            (dx * dx + dy * dy).sqrt() * self.resolution
        };

        if self.is_blocking(x0, y0) {
            return 0.0;
        }

        let dx = (x1 - x0).abs();
        let dy = (y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx - dy;
        let (mut cx, mut cy) = (x0, y0);

        while cx != x1 || cy != y1 {
            let e2 = 2 * err;
            if e2 > -dy {
                err -= dy;
                cx += sx;
            }
            if e2 < dx {
                err += dx;
                cy += sy;
            }
            if self.is_blocking(cx, cy) {
                return dist(cx, cy).min(max_range);
            }
        }

        max_range
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    #[test]
    fn test_world_cell_roundtrip() {
        let map = OccupancyMap::new(100, 100, 0.05, -2.5, -2.5);
        let (cx, cy) = map.world_to_cell(0.0, 0.0).unwrap();
        assert_eq!((cx, cy), (50, 50));
        let (wx, wy) = map.cell_to_world(cx, cy);
        assert!((wx - 0.025).abs() < 0.05);
        assert!((wy - 0.025).abs() < 0.05);
    }

    #[test]
    fn test_world_to_cell_out_of_bounds() {
        let map = OccupancyMap::new(10, 10, 0.1, 0.0, 0.0);
        assert!(map.world_to_cell(-0.5, 0.5).is_none());
        assert!(map.world_to_cell(0.5, 1.5).is_none());
        assert!(map.world_to_cell(0.5, 0.5).is_some());
    }

    #[test]
    fn test_set_get_state() {
        let mut map = OccupancyMap::new(10, 10, 0.1, 0.0, 0.0);
        assert_eq!(map.get_state(3, 4), CellState::Unknown);
        map.set_state(3, 4, CellState::Occupied);
        assert_eq!(map.get_state(3, 4), CellState::Occupied);
        // Out-of-bounds reads are Unknown, writes are ignored.
        assert_eq!(map.get_state(99, 99), CellState::Unknown);
        map.set_state(99, 99, CellState::Free);
    }

    #[test]
    fn test_calc_range_hits_single_obstacle() {
        // 10x10 free grid at 1 m resolution, obstacle at cell (5, 5).
        let mut map = OccupancyMap::new_free(10, 10, 1.0, 0.0, 0.0);
        map.set_state(5, 5, CellState::Occupied);

        // Ray from (0, 5.5) along +X passes through row 5 and stops at
        // the obstacle, 5 cells out.
        let range = map.calc_range(0.5, 5.5, 0.0, 20.0);
        assert_relative_eq!(range, 5.0, epsilon = 1e-9);
    }

    #[test]
    fn test_calc_range_free_map_returns_max_range() {
        // Ray stays inside an all-free map: exactly max_range.
        let map = OccupancyMap::new_free(100, 100, 0.1, 0.0, 0.0);
        let range = map.calc_range(5.0, 5.0, PI / 4.0, 3.0);
        assert_relative_eq!(range, 3.0);
    }

    #[test]
    fn test_calc_range_unknown_blocks() {
        let mut map = OccupancyMap::new_free(10, 10, 1.0, 0.0, 0.0);
        map.set_state(4, 2, CellState::Unknown);
        let range = map.calc_range(0.5, 2.5, 0.0, 20.0);
        assert_relative_eq!(range, 4.0, epsilon = 1e-9);
    }

    #[test]
    fn test_calc_range_map_edge_blocks() {
        // All-free map but the ray exits the grid before max_range:
        // the boundary stops it.
        let map = OccupancyMap::new_free(10, 10, 1.0, 0.0, 0.0);
        let range = map.calc_range(5.5, 5.5, 0.0, 50.0);
        assert!(range < 50.0);
        assert!(range >= 4.0);
    }

    #[test]
    fn test_calc_range_from_blocked_cell() {
        let mut map = OccupancyMap::new_free(10, 10, 1.0, 0.0, 0.0);
        map.set_state(2, 2, CellState::Occupied);
        assert_eq!(map.calc_range(2.5, 2.5, 0.0, 10.0), 0.0);
    }

    #[test]
    fn test_calc_range_diagonal() {
        let mut map = OccupancyMap::new_free(20, 20, 1.0, 0.0, 0.0);
        map.set_state(5, 5, CellState::Occupied);
        // 45° ray from (0.5, 0.5) reaches (5, 5) after 5 diagonal steps.
        let range = map.calc_range(0.5, 0.5, PI / 4.0, 20.0);
        assert_relative_eq!(range, (50.0_f64).sqrt(), epsilon = 1e-9);
    }

    #[test]
    fn test_calc_range_never_exceeds_max() {
        let map = OccupancyMap::new_free(50, 50, 0.5, 0.0, 0.0);
        for i in 0..16 {
            let heading = i as f64 * PI / 8.0;
            let r = map.calc_range(12.5, 12.5, heading, 4.0);
            assert!(r.is_finite());
            assert!(r <= 4.0 + 1e-9);
        }
    }

    #[test]
    fn test_free_cell_count() {
        let mut map = OccupancyMap::new(4, 4, 1.0, 0.0, 0.0);
        assert_eq!(map.free_cell_count(), 0);
        map.set_state(1, 1, CellState::Free);
        map.set_state(2, 2, CellState::Free);
        assert_eq!(map.free_cell_count(), 2);
    }
}
