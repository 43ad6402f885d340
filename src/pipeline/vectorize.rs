use std::collections::BTreeMap;
use std::path::Path;

use geo::{Coord, LineString, Polygon};

use crate::layout::{commit, partial_path};
use crate::{
    read_raster, BinaryImage, BoundingRect, Feature, GeoTransform, PathI32, PipelineRun, Raster,
    Result, SegtileError, Stage, Tile, VectorLayer,
};

/// One feature per object: the 4-connected regions of its pixel code, holes included.
/// `PXLVAL` is the object id, one less than the pixel code.
pub fn vectorize_raster(raster: &Raster, name: &str) -> Result<VectorLayer> {
    let mut rects = BTreeMap::<u32, BoundingRect>::new();
    for y in 0..raster.height() {
        for x in 0..raster.width() {
            let code = raster.get(x, y);
            if code != 0 {
                rects.entry(code).or_default().add_x_y(x as i32, y as i32);
            }
        }
    }

    let mut features = Vec::with_capacity(rects.len());
    for (&code, &rect) in rects.iter() {
        let mut image = BinaryImage::new_w_h(rect.width() as usize, rect.height() as usize);
        for y in 0..image.height {
            for x in 0..image.width {
                if raster.get(rect.left as usize + x, rect.top as usize + y) == code {
                    image.set_pixel(x, y, true);
                }
            }
        }
        let mut polygons = vec![];
        for cluster in image.to_clusters(false) {
            let mut rings = cluster.to_paths()?;
            for ring in rings.iter_mut() {
                ring.offset(&rect.left_top());
            }
            let mut rings = rings.iter().map(|ring| to_world(ring, &raster.grid.geo));
            let exterior = rings.next().ok_or_else(|| {
                SegtileError::Trace(format!("object {} has a cluster without outline", code - 1))
            })?;
            polygons.push(Polygon::new(exterior, rings.collect()));
        }
        features.push(Feature::new(code as i64 - 1, polygons));
    }

    Ok(VectorLayer {
        name: name.to_owned(),
        projection: raster.projection.clone(),
        features,
    })
}

fn to_world(ring: &PathI32, geo: &GeoTransform) -> LineString<f64> {
    ring.iter()
        .map(|&p| {
            let (x, y) = geo.corner(p);
            Coord { x, y }
        })
        .collect::<Vec<_>>()
        .into()
}

/// Polygonizes the relabeled raster of a tile into a layer named after the tile
pub fn vectorize_tile(run: &PipelineRun, tile: &Tile, output: &Path) -> Result<()> {
    let relabeled = read_raster(&run.layout.artifact(Stage::Relabel, tile.id))?;
    let layer = vectorize_raster(&relabeled, &Stage::Vectorize.file_stem(tile.id))?;
    log::debug!("Tile {}: {} features", tile.id, layer.features.len());
    layer.write(&partial_path(output))?;
    commit(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Extent, Grid, PixelType};
    use geo::{Area, BoundingRect as _};

    fn raster(rows: &[&str]) -> Raster {
        let height = rows.len();
        let width = rows[0].len();
        let grid = Grid::from_extent(
            Extent::new(100.0, 200.0, 100.0 + width as f64 * 10.0, 200.0 + height as f64 * 10.0),
            10.0,
        ).unwrap();
        let data = rows
            .iter()
            .flat_map(|r| r.chars().map(|c| c.to_digit(10).unwrap()))
            .collect();
        Raster { grid, projection: String::new(), pixel_type: PixelType::U8, data }
    }

    #[test]
    fn two_regions_two_features() {
        let raster = raster(&[
            "1100",
            "1100",
            "0002",
        ]);
        let layer = vectorize_raster(&raster, "t").unwrap();
        assert_eq!(layer.features.len(), 2);
        assert_eq!(layer.features[0].pxlval, 0);
        assert_eq!(layer.features[1].pxlval, 1);
        let first = layer.features[0].geometry.bounding_rect().unwrap();
        assert_eq!((first.min().x, first.min().y), (100.0, 210.0));
        assert_eq!((first.max().x, first.max().y), (120.0, 230.0));
        let second = layer.features[1].geometry.bounding_rect().unwrap();
        assert_eq!((second.min().x, second.min().y), (130.0, 200.0));
        assert_eq!((second.max().x, second.max().y), (140.0, 210.0));
        assert_eq!(layer.features[0].geometry.unsigned_area(), 400.0);
    }

    #[test]
    fn disconnected_parts_make_a_multipolygon() {
        let raster = raster(&[
            "101",
            "000",
            "100",
        ]);
        let layer = vectorize_raster(&raster, "t").unwrap();
        assert_eq!(layer.features.len(), 1);
        assert_eq!(layer.features[0].geometry.0.len(), 3);
    }

    #[test]
    fn holes_become_interiors() {
        let raster = raster(&[
            "111",
            "121",
            "111",
        ]);
        let layer = vectorize_raster(&raster, "t").unwrap();
        let ring = &layer.features[0].geometry.0[0];
        assert_eq!(ring.interiors().len(), 1);
        assert_eq!(ring.unsigned_area(), 800.0);
        assert_eq!(layer.features[1].geometry.unsigned_area(), 100.0);
    }

    #[test]
    fn empty_raster_has_no_features() {
        let layer = vectorize_raster(&raster(&["00", "00"]), "t").unwrap();
        assert!(layer.features.is_empty());
    }
}
