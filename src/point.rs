use std::ops::{Add, AddAssign};

/// Generic point in 2D space
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Point2<T> {
    pub x: T,
    pub y: T,
}

/// 2D Point with `i32` components; pixel corners and pixel indices
pub type PointI32 = Point2<i32>;

impl<T> Point2<T> {
    #[inline]
    pub const fn new(x: T, y: T) -> Self {
        Self { x, y }
    }
}

impl<T> Add for Point2<T>
where
    T: Add<Output = T>,
{
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }
}

impl<T> AddAssign for Point2<T>
where
    T: AddAssign,
{
    fn add_assign(&mut self, other: Self) {
        self.x += other.x;
        self.y += other.y;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pointi32_arithmetic() {
        let a = PointI32::new(3, 4);
        let b = PointI32::new(1, -2);
        assert_eq!(a + b, PointI32::new(4, 2));
        let mut c = a;
        c += b;
        assert_eq!(c, a + b);
    }
}
