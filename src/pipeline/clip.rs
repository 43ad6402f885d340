use std::path::Path;

use super::write_raster_artifact;
use crate::{read_grid, read_window, AttributeTable, PipelineRun, PixelType, Raster, Result, Stage, Tile};

/// `source` restricted to the extent of the tile's envelope
fn clip_to_envelope(run: &PipelineRun, tile: &Tile, source: &Path) -> Result<Raster> {
    let envelope = run.layout.artifact(Stage::Envelope, tile.id);
    let (grid, _) = read_grid(&envelope)?;
    let window = read_window(source, &grid)?;
    let grid = grid.intersect(&window.grid)?;
    let data = window.sample(&grid);
    Ok(window.with_data(grid, window.pixel_type, data))
}

/// 1 where the tile raster holds this tile's id, else 0
pub fn mask_tile(run: &PipelineRun, tile: &Tile, output: &Path) -> Result<()> {
    let clipped = clip_to_envelope(run, tile, &run.tile_raster)?;
    let data = clipped
        .data
        .iter()
        .map(|&v| (v as i64 == tile.id) as u32)
        .collect();
    let mask = clipped.with_data(clipped.grid, PixelType::U8, data);
    write_raster_artifact(run, output, &mask, AttributeTable::default())
}

/// Object labels of the segmentation within the envelope, not yet masked
pub fn cut_tile(run: &PipelineRun, tile: &Tile, output: &Path) -> Result<()> {
    let cut = clip_to_envelope(run, tile, &run.segmentation)?;
    write_raster_artifact(run, output, &cut, AttributeTable::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::materialize_envelope;
    use crate::pipeline::tests::test_run;
    use crate::{read_raster, Extent};

    fn checker() -> Vec<u32> {
        // tile 1 on the left half, tile 2 on the right half
        (0..100).map(|i| if i % 10 < 5 { 1 } else { 2 }).collect()
    }

    #[test]
    fn mask_marks_own_tile() {
        let dir = tempfile::tempdir().unwrap();
        let run = test_run(dir.path(), checker(), (0..100).collect());
        let tile = Tile { id: 1, extent: Extent::new(3.0, 8.0, 7.0, 10.0) };
        materialize_envelope(&run, &tile, &run.layout.artifact(Stage::Envelope, 1)).unwrap();
        let output = dir.path().join("m.tif");
        mask_tile(&run, &tile, &output).unwrap();
        let mask = read_raster(&output).unwrap();
        assert_eq!(mask.pixel_type, PixelType::U8);
        assert_eq!(mask.grid.extent(), Extent::new(3.0, 8.0, 7.0, 10.0));
        assert_eq!(mask.data, vec![1, 1, 0, 0, 1, 1, 0, 0]);
    }

    #[test]
    fn cut_keeps_labels() {
        let dir = tempfile::tempdir().unwrap();
        let run = test_run(dir.path(), checker(), (0..100).collect());
        let tile = Tile { id: 2, extent: Extent::new(8.0, 0.0, 12.0, 2.0) };
        materialize_envelope(&run, &tile, &run.layout.artifact(Stage::Envelope, 2)).unwrap();
        let output = dir.path().join("c.tif");
        cut_tile(&run, &tile, &output).unwrap();
        let cut = read_raster(&output).unwrap();
        // the envelope reaches past the segmentation, the cut does not
        assert_eq!(cut.grid.extent(), Extent::new(8.0, 0.0, 10.0, 2.0));
        assert_eq!(cut.data, vec![88, 89, 98, 99]);
    }

    #[test]
    fn disjoint_envelope_fails() {
        let dir = tempfile::tempdir().unwrap();
        let run = test_run(dir.path(), checker(), (0..100).collect());
        let tile = Tile { id: 9, extent: Extent::new(20.0, 20.0, 22.0, 22.0) };
        materialize_envelope(&run, &tile, &run.layout.artifact(Stage::Envelope, 9)).unwrap();
        assert!(cut_tile(&run, &tile, &dir.path().join("c.tif")).is_err());
    }
}
