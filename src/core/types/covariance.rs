//! 3x3 pose covariance over (x, y, θ).

use serde::{Deserialize, Serialize};

/// Row-major 3x3 covariance matrix for a 2D pose.
///
/// Index layout:
/// ```text
/// [0] xx  [1] xy  [2] xθ
/// [3] yx  [4] yy  [5] yθ
/// [6] θx  [7] θy  [8] θθ
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Covariance2D {
    /// Matrix elements in row-major order.
    pub data: [f64; 9],
}

impl Covariance2D {
    /// All-zero covariance (perfect certainty).
    pub fn zero() -> Self {
        Self { data: [0.0; 9] }
    }

    /// Diagonal covariance from per-axis variances.
    pub fn diagonal(var_x: f64, var_y: f64, var_theta: f64) -> Self {
        let mut data = [0.0; 9];
        data[0] = var_x;
        data[4] = var_y;
        data[8] = var_theta;
        Self { data }
    }

    /// Build from a full row-major array.
    pub fn from_array(data: [f64; 9]) -> Self {
        Self { data }
    }

    /// X position variance.
    pub fn var_x(&self) -> f64 {
        self.data[0]
    }

    /// Y position variance.
    pub fn var_y(&self) -> f64 {
        self.data[4]
    }

    /// Heading variance.
    pub fn var_theta(&self) -> f64 {
        self.data[8]
    }

    /// True when every element is finite.
    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|v| v.is_finite())
    }
}

impl Default for Covariance2D {
    fn default() -> Self {
        Self::zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero() {
        let cov = Covariance2D::zero();
        assert_eq!(cov.var_x(), 0.0);
        assert_eq!(cov.var_y(), 0.0);
        assert_eq!(cov.var_theta(), 0.0);
    }

    #[test]
    fn test_diagonal() {
        let cov = Covariance2D::diagonal(0.1, 0.2, 0.3);
        assert_eq!(cov.var_x(), 0.1);
        assert_eq!(cov.var_y(), 0.2);
        assert_eq!(cov.var_theta(), 0.3);
        assert_eq!(cov.data[1], 0.0);
    }

    #[test]
    fn test_from_array() {
        let data = [1.0, 2.0, 3.0, 2.0, 4.0, 5.0, 3.0, 5.0, 6.0];
        let cov = Covariance2D::from_array(data);
        assert_eq!(cov.data, data);
        assert_eq!(cov.var_y(), 4.0);
    }
}
