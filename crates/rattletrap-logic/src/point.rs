//! Integer grid coordinates.
//!
//! `Point` is a vehicle-local mount offset (x = forward, y = right);
//! `Tripoint` is an absolute world tile. Rotation helpers translate mounts
//! into world offsets for a given facing.

use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};

/// A vehicle-local mount offset or any other 2D integer coordinate.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const ZERO: Point = Point { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The four orthogonal neighbours, in east/west/north/south order.
    pub fn four_adjacent(self) -> [Point; 4] {
        FOUR_ADJACENT.map(|d| self + d)
    }

    /// Chebyshev distance (king moves).
    pub fn square_dist(self, other: Point) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }

    /// Rotate this offset by `degrees` (clockwise, screen coordinates) and
    /// round to the nearest tile.
    pub fn rotated(self, degrees: i32) -> Point {
        match degrees.rem_euclid(360) {
            0 => self,
            90 => Point::new(-self.y, self.x),
            180 => Point::new(-self.x, -self.y),
            270 => Point::new(self.y, -self.x),
            d => {
                let rad = (d as f64).to_radians();
                let (sin, cos) = rad.sin_cos();
                let x = self.x as f64 * cos - self.y as f64 * sin;
                let y = self.x as f64 * sin + self.y as f64 * cos;
                Point::new(x.round() as i32, y.round() as i32)
            }
        }
    }
}

/// Offsets of the four orthogonal neighbours.
pub const FOUR_ADJACENT: [Point; 4] = [
    Point::new(1, 0),
    Point::new(-1, 0),
    Point::new(0, 1),
    Point::new(0, -1),
];

impl Add for Point {
    type Output = Point;
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Neg for Point {
    type Output = Point;
    fn neg(self) -> Point {
        Point::new(-self.x, -self.y)
    }
}

impl AddAssign for Point {
    fn add_assign(&mut self, rhs: Point) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl SubAssign for Point {
    fn sub_assign(&mut self, rhs: Point) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

/// An absolute world tile (x, y, z-level).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Tripoint {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Tripoint {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    pub fn xy(self) -> Point {
        Point::new(self.x, self.y)
    }
}

impl Add<Point> for Tripoint {
    type Output = Tripoint;
    fn add(self, rhs: Point) -> Tripoint {
        Tripoint::new(self.x + rhs.x, self.y + rhs.y, self.z)
    }
}

impl Sub<Point> for Tripoint {
    type Output = Tripoint;
    fn sub(self, rhs: Point) -> Tripoint {
        Tripoint::new(self.x - rhs.x, self.y - rhs.y, self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_four_adjacent() {
        let n = Point::new(2, 3).four_adjacent();
        assert!(n.contains(&Point::new(3, 3)));
        assert!(n.contains(&Point::new(1, 3)));
        assert!(n.contains(&Point::new(2, 4)));
        assert!(n.contains(&Point::new(2, 2)));
    }

    #[test]
    fn test_right_angle_rotation_is_exact() {
        let p = Point::new(2, 1);
        assert_eq!(p.rotated(0), p);
        assert_eq!(p.rotated(90), Point::new(-1, 2));
        assert_eq!(p.rotated(180), Point::new(-2, -1));
        assert_eq!(p.rotated(270), Point::new(1, -2));
        assert_eq!(p.rotated(-90), p.rotated(270));
    }

    #[test]
    fn test_square_dist() {
        assert_eq!(Point::new(0, 0).square_dist(Point::new(3, -2)), 3);
        assert_eq!(Point::new(1, 1).square_dist(Point::new(1, 1)), 0);
    }

    #[test]
    fn test_tripoint_offset() {
        let t = Tripoint::new(10, 10, 0) + Point::new(-2, 3);
        assert_eq!(t, Tripoint::new(8, 13, 0));
        assert_eq!(t - Point::new(-2, 3), Tripoint::new(10, 10, 0));
    }
}
