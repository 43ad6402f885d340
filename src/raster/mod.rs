//! Georeferenced single band rasters of unsigned integer samples

mod geotiff;
mod rat;
mod stats;

pub use geotiff::*;
pub use rat::*;
pub use stats::*;

use crate::{Extent, PointI32, Result, SegtileError};

/// Sample width on disk. Samples are always held as `u32` in memory.
#[derive(Copy, Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum PixelType {
    U8,
    U16,
    U32,
}

/// North-up affine georeferencing.
///
/// The top-left corner of pixel `(col, row)` lies at
/// `(origin_x + col * pixel_width, origin_y - row * pixel_height)`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GeoTransform {
    pub origin_x: f64,
    pub origin_y: f64,
    pub pixel_width: f64,
    pub pixel_height: f64,
}

/// The pixel grid of a raster
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Grid {
    pub width: usize,
    pub height: usize,
    pub geo: GeoTransform,
}

/// A single band raster held in memory
#[derive(Clone, Debug, PartialEq)]
pub struct Raster {
    pub grid: Grid,
    /// Projection as WKT, carried through untouched
    pub projection: String,
    pub pixel_type: PixelType,
    /// Row-major samples, `grid.width * grid.height` of them
    pub data: Vec<u32>,
}

const GRID_EPSILON: f64 = 1e-6;

impl PixelType {
    /// The narrowest type holding `value`
    pub fn fitting(value: u32) -> Self {
        if value <= u8::MAX as u32 {
            PixelType::U8
        } else if value <= u16::MAX as u32 {
            PixelType::U16
        } else {
            PixelType::U32
        }
    }
}

impl GeoTransform {
    /// World coordinate of a pixel corner
    pub fn corner(&self, p: PointI32) -> (f64, f64) {
        (
            self.origin_x + p.x as f64 * self.pixel_width,
            self.origin_y - p.y as f64 * self.pixel_height,
        )
    }

    /// World coordinate of the centre of pixel `(col, row)`
    pub fn centre(&self, col: usize, row: usize) -> (f64, f64) {
        (
            self.origin_x + (col as f64 + 0.5) * self.pixel_width,
            self.origin_y - (row as f64 + 0.5) * self.pixel_height,
        )
    }

    /// The pixel containing a world coordinate; may be outside of any raster
    pub fn pixel_of(&self, x: f64, y: f64) -> (i64, i64) {
        (
            ((x - self.origin_x) / self.pixel_width).floor() as i64,
            ((self.origin_y - y) / self.pixel_height).floor() as i64,
        )
    }
}

impl Grid {
    /// A grid covering `extent` exactly with square pixels of size `resolution`.
    /// `extent` is expected to be snapped to `resolution` already.
    pub fn from_extent(extent: Extent, resolution: f64) -> Result<Self> {
        if !(resolution > 0.0) {
            return Err(SegtileError::Raster(format!("invalid resolution {}", resolution)));
        }
        let width = (extent.width() / resolution).round();
        let height = (extent.height() / resolution).round();
        if width < 1.0 || height < 1.0 {
            return Err(SegtileError::Raster(format!(
                "extent {:?} is smaller than one pixel of {}", extent, resolution
            )));
        }
        Ok(Self {
            width: width as usize,
            height: height as usize,
            geo: GeoTransform {
                origin_x: extent.min_x,
                origin_y: extent.max_y,
                pixel_width: resolution,
                pixel_height: resolution,
            },
        })
    }

    pub fn extent(&self) -> Extent {
        Extent::new(
            self.geo.origin_x,
            self.geo.origin_y - self.height as f64 * self.geo.pixel_height,
            self.geo.origin_x + self.width as f64 * self.geo.pixel_width,
            self.geo.origin_y,
        )
    }

    pub fn len(&self) -> usize {
        self.width * self.height
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The part of this grid overlapping `other`, on this grid's pixel lattice.
    ///
    /// Both grids must have the same pixel size. Fails when they do not overlap.
    pub fn intersect(&self, other: &Grid) -> Result<Grid> {
        let same_size = (self.geo.pixel_width - other.geo.pixel_width).abs() < GRID_EPSILON
            && (self.geo.pixel_height - other.geo.pixel_height).abs() < GRID_EPSILON;
        if !same_size {
            return Err(SegtileError::Raster(format!(
                "pixel size {}x{} differs from {}x{}",
                self.geo.pixel_width, self.geo.pixel_height,
                other.geo.pixel_width, other.geo.pixel_height,
            )));
        }
        let overlap = self.extent().intersect(other.extent()).ok_or_else(|| {
            SegtileError::Raster(format!(
                "extents {:?} and {:?} do not overlap", self.extent(), other.extent()
            ))
        })?;
        let clamp = |v: f64, max: usize| (v.round().max(0.0) as usize).min(max);
        let col0 = clamp((overlap.min_x - self.geo.origin_x) / self.geo.pixel_width, self.width);
        let col1 = clamp((overlap.max_x - self.geo.origin_x) / self.geo.pixel_width, self.width);
        let row0 = clamp((self.geo.origin_y - overlap.max_y) / self.geo.pixel_height, self.height);
        let row1 = clamp((self.geo.origin_y - overlap.min_y) / self.geo.pixel_height, self.height);
        if col1 <= col0 || row1 <= row0 {
            return Err(SegtileError::Raster(format!(
                "overlap {:?} is narrower than one pixel", overlap
            )));
        }
        let (origin_x, origin_y) = self.geo.corner(PointI32::new(col0 as i32, row0 as i32));
        Ok(Grid {
            width: col1 - col0,
            height: row1 - row0,
            geo: GeoTransform { origin_x, origin_y, ..self.geo },
        })
    }
}

impl Raster {
    pub fn filled(grid: Grid, projection: &str, pixel_type: PixelType, value: u32) -> Self {
        Self {
            grid,
            projection: projection.to_owned(),
            pixel_type,
            data: vec![value; grid.len()],
        }
    }

    pub fn width(&self) -> usize {
        self.grid.width
    }

    pub fn height(&self) -> usize {
        self.grid.height
    }

    pub fn get(&self, col: usize, row: usize) -> u32 {
        self.data[row * self.grid.width + col]
    }

    /// Samples this raster at every pixel centre of `grid`; pixels outside read as 0.
    pub fn sample(&self, grid: &Grid) -> Vec<u32> {
        let mut out = Vec::with_capacity(grid.len());
        for row in 0..grid.height {
            for col in 0..grid.width {
                let (x, y) = grid.geo.centre(col, row);
                let (c, r) = self.grid.geo.pixel_of(x, y);
                let inside = c >= 0 && r >= 0
                    && (c as usize) < self.grid.width && (r as usize) < self.grid.height;
                out.push(if inside { self.get(c as usize, r as usize) } else { 0 });
            }
        }
        out
    }

    /// Replaces the samples, keeping georeferencing and projection
    pub fn with_data(&self, grid: Grid, pixel_type: PixelType, data: Vec<u32>) -> Self {
        debug_assert_eq!(data.len(), grid.len());
        Self {
            grid,
            projection: self.projection.clone(),
            pixel_type,
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(min_x: f64, min_y: f64, max_x: f64, max_y: f64, res: f64) -> Grid {
        Grid::from_extent(Extent::new(min_x, min_y, max_x, max_y), res).unwrap()
    }

    #[test]
    fn grid_from_extent() {
        let g = grid(10.0, 20.0, 40.0, 30.0, 2.0);
        assert_eq!(g.width, 15);
        assert_eq!(g.height, 5);
        assert_eq!(g.geo.origin_x, 10.0);
        assert_eq!(g.geo.origin_y, 30.0);
        assert_eq!(g.extent(), Extent::new(10.0, 20.0, 40.0, 30.0));
    }

    #[test]
    fn grid_from_degenerate_extent() {
        assert!(Grid::from_extent(Extent::new(0.0, 0.0, 0.0, 10.0), 1.0).is_err());
        assert!(Grid::from_extent(Extent::new(0.0, 0.0, 10.0, 10.0), 0.0).is_err());
    }

    #[test]
    fn grid_intersect() {
        let envelope = grid(-2.0, 4.0, 3.0, 12.0, 1.0);
        let source = grid(0.0, 0.0, 10.0, 10.0, 1.0);
        let clipped = envelope.intersect(&source).unwrap();
        assert_eq!(clipped.extent(), Extent::new(0.0, 4.0, 3.0, 10.0));
        assert_eq!((clipped.width, clipped.height), (3, 6));
    }

    #[test]
    fn grid_intersect_rejects_mismatch() {
        let a = grid(0.0, 0.0, 10.0, 10.0, 1.0);
        let b = grid(0.0, 0.0, 10.0, 10.0, 2.0);
        assert!(a.intersect(&b).is_err());
        let far = grid(20.0, 20.0, 30.0, 30.0, 1.0);
        assert!(a.intersect(&far).is_err());
    }

    #[test]
    fn raster_sample_window() {
        let g = grid(0.0, 0.0, 4.0, 2.0, 1.0);
        let raster = Raster {
            grid: g,
            projection: String::new(),
            pixel_type: PixelType::U8,
            data: vec![1, 2, 3, 4, 5, 6, 7, 8],
        };
        let window = grid(1.0, 0.0, 3.0, 1.0, 1.0);
        assert_eq!(raster.sample(&window), vec![6, 7]);
        let partly_outside = grid(3.0, 1.0, 5.0, 2.0, 1.0);
        assert_eq!(raster.sample(&partly_outside), vec![4, 0]);
    }

    #[test]
    fn pixel_type_fitting() {
        assert_eq!(PixelType::fitting(255), PixelType::U8);
        assert_eq!(PixelType::fitting(256), PixelType::U16);
        assert_eq!(PixelType::fitting(70000), PixelType::U32);
    }
}
