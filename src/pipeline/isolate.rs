use std::path::Path;

use super::write_raster_artifact;
use crate::{read_raster, AttributeTable, PipelineRun, Result, Stage, Tile};

/// The cut labels where the mask is set, 0 elsewhere
pub fn isolate_tile(run: &PipelineRun, tile: &Tile, output: &Path) -> Result<()> {
    let cut = read_raster(&run.layout.artifact(Stage::Cut, tile.id))?;
    let mask = read_raster(&run.layout.artifact(Stage::Mask, tile.id))?;
    let grid = cut.grid.intersect(&mask.grid)?;
    let labels = cut.sample(&grid);
    let keep = mask.sample(&grid);
    let data = labels
        .into_iter()
        .zip(keep)
        .map(|(label, keep)| if keep != 0 { label } else { 0 })
        .collect();
    let isolated = cut.with_data(grid, cut.pixel_type, data);
    write_raster_artifact(run, output, &isolated, AttributeTable::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::tests::test_run;
    use crate::pipeline::{cut_tile, mask_tile, materialize_envelope};
    use crate::Extent;

    #[test]
    fn isolate_zeroes_other_tiles() {
        let dir = tempfile::tempdir().unwrap();
        let tiles = (0..100).map(|i| if i % 10 < 5 { 1 } else { 2 }).collect();
        let run = test_run(dir.path(), tiles, (0..100).map(|i| i + 1).collect());
        let tile = Tile { id: 2, extent: Extent::new(4.0, 9.0, 7.0, 10.0) };
        materialize_envelope(&run, &tile, &run.layout.artifact(Stage::Envelope, 2)).unwrap();
        mask_tile(&run, &tile, &run.layout.artifact(Stage::Mask, 2)).unwrap();
        cut_tile(&run, &tile, &run.layout.artifact(Stage::Cut, 2)).unwrap();
        let output = dir.path().join("i.tif");
        isolate_tile(&run, &tile, &output).unwrap();
        assert_eq!(read_raster(&output).unwrap().data, vec![0, 6, 7]);
    }
}
