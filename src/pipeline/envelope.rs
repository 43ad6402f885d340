use std::path::Path;

use super::write_raster_artifact;
use crate::{AttributeTable, Grid, PipelineRun, PixelType, Raster, Result, Tile};

/// Blank raster over the tile's bounding box, snapped outward to the pixel grid.
/// Later stages clip to its extent.
pub fn materialize_envelope(run: &PipelineRun, tile: &Tile, output: &Path) -> Result<()> {
    let extent = tile.extent.snap_outward(run.resolution);
    let grid = Grid::from_extent(extent, run.resolution)?;
    log::debug!(
        "Tile {} envelope {}x{} at ({}, {})",
        tile.id, grid.width, grid.height, grid.geo.origin_x, grid.geo.origin_y
    );
    let raster = Raster::filled(grid, &run.projection, PixelType::U8, 1);
    write_raster_artifact(run, output, &raster, AttributeTable::default())
}
