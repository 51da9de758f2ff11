//! Types and functions on coordinates in a projected (cartesian) coordinate system.

mod point;
mod rect;

pub use point::CartesianPoint2d;
pub use rect::Rect;
