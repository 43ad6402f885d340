use std::ops::{AddAssign, Index};

use crate::{BinaryImage, PointI32, Result, SegtileError};
use super::PathWalker;

#[derive(Clone, Debug, Default, PartialEq)]
/// Path of generic points in 2D space
pub struct Path<T> {
    pub path: Vec<T>,
}

/// Path of 2D PointI32
pub type PathI32 = Path<PointI32>;

impl<T> Path<T> {
    /// Creates a new 2D Path with no points
    pub fn new() -> Self {
        Self {
            path: vec![]
        }
    }

    /// Creates a 2D Path with 'points' as its points
    pub fn from_points(points: Vec<T>) -> Self {
        Self {
            path: points
        }
    }

    /// Returns an iterator on the vector of points in the path
    pub fn iter(&self) -> std::slice::Iter<T> {
        self.path.iter()
    }

    /// Returns the number of points in the path
    pub fn len(&self) -> usize {
        self.path.len()
    }

    /// Returns true if the path is empty, false otherwise
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Index<usize> for Path<T> {
    type Output = T;

    fn index(&self, index: usize) -> &Self::Output {
        &self.path[index]
    }
}

impl<T> Path<T>
where
    T: AddAssign + Copy
{
    /// Applies an offset to all points in the path
    pub fn offset(&mut self, o: &T) {
        for point in self.path.iter_mut() {
            point.add_assign(*o);
        }
    }
}

impl PathI32 {
    /// Traces the outline of the first pixel cluster (in raster order) of `image`
    /// as a closed ring of pixel corners. An empty image gives an empty path.
    ///
    /// Takes a bool representing the clockwiseness of traversal (holes are traced anti-clockwise).
    pub fn image_to_path(image: &BinaryImage, clockwise: bool) -> Result<PathI32> {
        let start = match image.pixels.iter().position(|b| b) {
            Some(i) => PointI32::new((i % image.width) as i32, (i / image.width) as i32),
            None => return Ok(PathI32::new()),
        };
        let mut walker = PathWalker::new(image, start, clockwise);
        let path: Vec<PointI32> = walker.by_ref().collect();
        if walker.is_stuck() {
            return Err(SegtileError::Trace(format!(
                "walk from ({}, {}) did not close after {} corners",
                start.x, start.y, path.len()
            )));
        }
        Ok(PathI32 { path })
    }

    /// Twice the signed area of a closed ring; positive when clockwise in a top-left origin frame.
    pub fn signed_area_doubled(&self) -> i64 {
        self.path
            .windows(2)
            .map(|w| w[0].x as i64 * w[1].y as i64 - w[1].x as i64 * w[0].y as i64)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_to_path_square() {
        let image = BinaryImage::from_string(&(
            "---\n".to_owned() +
            "-**\n" +
            "-**\n"
        ));
        let path = PathI32::image_to_path(&image, true).unwrap();
        assert_eq!(path.path, vec![
            PointI32::new(1, 1),
            PointI32::new(3, 1),
            PointI32::new(3, 3),
            PointI32::new(1, 3),
            PointI32::new(1, 1),
        ]);
        assert_eq!(path.signed_area_doubled(), 8);
    }

    #[test]
    fn image_to_path_empty() {
        let image = BinaryImage::new_w_h(3, 3);
        assert!(PathI32::image_to_path(&image, true).unwrap().is_empty());
    }

    #[test]
    fn path_offset() {
        let mut path = PathI32::from_points(vec![PointI32::new(0, 0), PointI32::new(1, 2)]);
        path.offset(&PointI32::new(5, 5));
        assert_eq!(path[1], PointI32::new(6, 7));
        assert_eq!(path.len(), 2);
    }
}
