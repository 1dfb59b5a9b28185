//! Screen-space geometry shared by the state machine and the window layer
//!
//! All coordinates are in physical pixels of the virtual screen, origin at the
//! top-left corner.

use std::ops::Sub;

/// A point in screen coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl Sub for Point {
    type Output = Point;

    /// Saturates at the `i32` range instead of overflowing
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x.saturating_sub(rhs.x), self.y.saturating_sub(rhs.y))
    }
}

/// Window dimensions in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// An axis-aligned window rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Check if a point is within this rectangle, right and bottom edges included
    pub fn contains(&self, point: Point) -> bool {
        let right = self.x as i64 + self.width as i64;
        let bottom = self.y as i64 + self.height as i64;
        (point.x as i64) >= self.x as i64
            && (point.x as i64) <= right
            && (point.y as i64) >= self.y as i64
            && (point.y as i64) <= bottom
    }

    pub fn with_origin(self, origin: Point) -> Self {
        Self {
            x: origin.x,
            y: origin.y,
            ..self
        }
    }

    pub fn with_size(self, size: Size) -> Self {
        Self {
            width: size.width,
            height: size.height,
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_is_inclusive() {
        let rect = Rect::new(10, 20, 100, 50);
        assert!(rect.contains(Point::new(10, 20)));
        assert!(rect.contains(Point::new(110, 70)));
        assert!(rect.contains(Point::new(60, 45)));
        assert!(!rect.contains(Point::new(9, 20)));
        assert!(!rect.contains(Point::new(111, 70)));
        assert!(!rect.contains(Point::new(60, 71)));
    }

    #[test]
    fn test_point_sub() {
        assert_eq!(Point::new(15, 40) - Point::new(10, 20), Point::new(5, 20));
    }

    #[test]
    fn test_point_sub_saturates() {
        let far = Point::new(i32::MIN, i32::MIN);
        assert_eq!(far - Point::new(50, 40), far);
        assert_eq!(
            Point::new(i32::MAX, 0) - Point::new(-1, 0),
            Point::new(i32::MAX, 0)
        );
    }
}
