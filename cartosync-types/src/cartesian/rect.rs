use num_traits::Num;
use serde::{Deserialize, Serialize};

use crate::cartesian::CartesianPoint2d;

/// Axis-aligned rectangle.
///
/// Serialized as `[x_min, y_min, x_max, y_max]`, which is the extent format used by map
/// sources and coordinate system validity bounds.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "[N; 4]", into = "[N; 4]")]
pub struct Rect<N: Copy = f64> {
    /// Minimum x.
    pub x_min: N,
    /// Minimum y.
    pub y_min: N,
    /// Maximum x.
    pub x_max: N,
    /// Maximum y.
    pub y_max: N,
}

impl<N: Num + Copy + PartialOrd> Rect<N> {
    /// Creates a new rectangle.
    pub fn new(x_min: N, y_min: N, x_max: N, y_max: N) -> Self {
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    /// Rectangle around `p` extending by `half_size` in every direction.
    pub fn around(p: &impl CartesianPoint2d<Num = N>, half_size: N) -> Self {
        Self {
            x_min: p.x() - half_size,
            x_max: p.x() + half_size,
            y_min: p.y() - half_size,
            y_max: p.y() + half_size,
        }
    }

    /// Returns true if the point lies inside the rectangle or on its border.
    pub fn contains(&self, point: &impl CartesianPoint2d<Num = N>) -> bool {
        self.x_min <= point.x()
            && self.x_max >= point.x()
            && self.y_min <= point.y()
            && self.y_max >= point.y()
    }

    /// Coordinates as `[x_min, y_min, x_max, y_max]`.
    pub fn to_array(&self) -> [N; 4] {
        [self.x_min, self.y_min, self.x_max, self.y_max]
    }
}

impl<N: Copy> From<[N; 4]> for Rect<N> {
    fn from(value: [N; 4]) -> Self {
        Self {
            x_min: value[0],
            y_min: value[1],
            x_max: value[2],
            y_max: value[3],
        }
    }
}

impl<N: Copy> From<Rect<N>> for [N; 4] {
    fn from(value: Rect<N>) -> Self {
        [value.x_min, value.y_min, value.x_max, value.y_max]
    }
}
