//! Functions to compute and manipulate bounding rectangles, in pixel space and in world space

use crate::PointI32;

/// The rectangle that bounds an object, in pixel space.
/// `right` and `bottom` are exclusive.
#[derive(Copy, Clone, PartialEq, Default, Eq, Debug)]
pub struct BoundingRect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

/// Axis aligned envelope in world coordinates (y grows northwards)
#[derive(Copy, Clone, PartialEq, Debug, serde::Serialize, serde::Deserialize)]
pub struct Extent {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingRect {
    // assume top-left origin
    #[cfg(test)]
    pub fn new_x_y_w_h(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self {
            left: x,
            top: y,
            right: x + w,
            bottom: y + h,
        }
    }

    pub fn width(self) -> i32 {
        self.right - self.left
    }

    pub fn height(self) -> i32 {
        self.bottom - self.top
    }

    pub fn is_empty(self) -> bool {
        self.width() == 0 && self.height() == 0
    }

    #[inline]
    pub fn left_top(&self) -> PointI32 {
        PointI32::new(self.left, self.top)
    }

    pub fn add_x_y(&mut self, x: i32, y: i32) {
        if self.is_empty() {
            self.left = x;
            self.right = x + 1;
            self.top = y;
            self.bottom = y + 1;
            return;
        }
        if x < self.left {
            self.left = x;
        } else if x + 1 > self.right {
            self.right = x + 1;
        }
        if y < self.top {
            self.top = y;
        } else if y + 1 > self.bottom {
            self.bottom = y + 1;
        }
    }

    pub fn merge(&mut self, other: Self) {
        if other.is_empty() {
            return;
        }
        if self.is_empty() {
            *self = other;
            return;
        }
        self.left = std::cmp::min(self.left, other.left);
        self.right = std::cmp::max(self.right, other.right);
        self.top = std::cmp::min(self.top, other.top);
        self.bottom = std::cmp::max(self.bottom, other.bottom);
    }
}

impl Extent {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self { min_x, min_y, max_x, max_y }
    }

    pub fn width(self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(self) -> f64 {
        self.max_y - self.min_y
    }

    /// Zero width or zero height.
    pub fn is_degenerate(self) -> bool {
        self.min_x == self.max_x || self.min_y == self.max_y
    }

    /// Expands outward so that every edge lies on a multiple of `resolution`.
    pub fn snap_outward(self, resolution: f64) -> Self {
        Self {
            min_x: (self.min_x / resolution).floor() * resolution,
            min_y: (self.min_y / resolution).floor() * resolution,
            max_x: (self.max_x / resolution).ceil() * resolution,
            max_y: (self.max_y / resolution).ceil() * resolution,
        }
    }

    /// The overlapping part of two extents, `None` unless it has a positive area.
    pub fn intersect(self, other: Self) -> Option<Self> {
        let r = Self {
            min_x: self.min_x.max(other.min_x),
            min_y: self.min_y.max(other.min_y),
            max_x: self.max_x.min(other.max_x),
            max_y: self.max_y.min(other.max_y),
        };
        if r.min_x < r.max_x && r.min_y < r.max_y {
            Some(r)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounding_rect_1x1() {
        let mut rect = BoundingRect::default();
        rect.add_x_y(1, 1);
        assert_eq!(rect.left, 1);
        assert_eq!(rect.top, 1);
        assert_eq!(rect.right, 2);
        assert_eq!(rect.bottom, 2);
        assert_eq!(rect.width(), 1);
        assert_eq!(rect.height(), 1);
    }

    #[test]
    fn bounding_rect_2x2() {
        let mut rect = BoundingRect::default();
        rect.add_x_y(1, 1);
        rect.add_x_y(2, 2);
        assert_eq!(rect, BoundingRect::new_x_y_w_h(1, 1, 2, 2));
    }

    #[test]
    fn extent_snap_outward() {
        let extent = Extent::new(12.5, -7.0, 37.1, 40.0).snap_outward(10.0);
        assert_eq!(extent, Extent::new(10.0, -10.0, 40.0, 40.0));
        let aligned = Extent::new(0.0, 0.0, 20.0, 30.0);
        assert_eq!(aligned.snap_outward(10.0), aligned);
    }

    #[test]
    fn extent_intersect() {
        let a = Extent::new(0.0, 0.0, 10.0, 10.0);
        let b = Extent::new(5.0, -5.0, 15.0, 5.0);
        assert_eq!(a.intersect(b), Some(Extent::new(5.0, 0.0, 10.0, 5.0)));
        let touching = Extent::new(10.0, 0.0, 20.0, 10.0);
        assert_eq!(a.intersect(touching), None);
    }

    #[test]
    fn extent_degenerate() {
        assert!(Extent::new(100.0, 0.0, 100.0, 50.0).is_degenerate());
        assert!(!Extent::new(0.0, 0.0, 1.0, 1.0).is_degenerate());
    }
}
