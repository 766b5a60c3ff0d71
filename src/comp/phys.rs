use serde_derive::{Deserialize, Serialize};
use vek::*;

/// Position
#[derive(Copy, Clone, Default, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pos(pub Vec3<f64>);

impl Pos {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Pos(Vec3::new(x, y, z))
    }

    /// Component along one axis (0:X, 1:Y, 2:Z)
    pub fn axis(&self, axis: usize) -> f64 {
        match axis {
            0 => self.0.x,
            1 => self.0.y,
            _ => self.0.z,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.0.x.is_finite() && self.0.y.is_finite() && self.0.z.is_finite()
    }

    pub fn distance(&self, other: &Pos) -> f64 {
        self.0.distance(other.0)
    }
}
