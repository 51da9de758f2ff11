use num_traits::Num;

/// A point in a cartesian coordinate system.
///
/// Snapshots store coordinates as plain `[x, y]` arrays, so the trait is implemented for them
/// directly.
pub trait CartesianPoint2d {
    /// Numeric type of the coordinates.
    type Num: Num + Copy + PartialOrd;

    /// X coordinate.
    fn x(&self) -> Self::Num;
    /// Y coordinate.
    fn y(&self) -> Self::Num;
}

impl<N: Num + Copy + PartialOrd> CartesianPoint2d for [N; 2] {
    type Num = N;

    fn x(&self) -> N {
        self[0]
    }

    fn y(&self) -> N {
        self[1]
    }
}
