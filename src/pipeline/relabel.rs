use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use super::write_raster_artifact;
use crate::{read_raster, AttributeTable, Column, PipelineRun, PixelType, Raster, Result, Stage, Tile};

/// Tile-local object ids. Object `id` is stored as pixel code `id + 1`, keeping 0 as no-data.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Relabeling {
    /// original label of each object id, ascending
    pub labels: Vec<u32>,
}

impl Relabeling {
    /// Numbers the distinct nonzero labels of `data` densely, in ascending label order
    pub fn from_labels(data: &[u32]) -> Self {
        let labels: BTreeSet<u32> = data.iter().copied().filter(|&v| v != 0).collect();
        Self { labels: labels.into_iter().collect() }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn apply(&self, data: &[u32]) -> Vec<u32> {
        let codes: BTreeMap<u32, u32> = self
            .labels
            .iter()
            .enumerate()
            .map(|(id, &label)| (label, id as u32 + 1))
            .collect();
        data.iter()
            .map(|v| codes.get(v).copied().unwrap_or(0))
            .collect()
    }

    /// `ObjectId` and `SourceLabel` columns, one row per pixel code
    pub fn to_table(&self) -> AttributeTable {
        let mut table = AttributeTable::default();
        let ids = std::iter::once(-1).chain((0..self.len()).map(|id| id as i64));
        let sources = std::iter::once(0).chain(self.labels.iter().map(|&l| l as i64));
        table.set_column("ObjectId", Column::Integer(ids.collect()));
        table.set_column("SourceLabel", Column::Integer(sources.collect()));
        table
    }
}

pub fn relabel_raster(isolated: &Raster) -> (Raster, Relabeling) {
    let relabeling = Relabeling::from_labels(&isolated.data);
    let data = relabeling.apply(&isolated.data);
    let pixel_type = PixelType::fitting(relabeling.len() as u32);
    (isolated.with_data(isolated.grid, pixel_type, data), relabeling)
}

/// Renumbers the isolated objects of a tile to ids `0..k`
pub fn relabel_tile(run: &PipelineRun, tile: &Tile, output: &Path) -> Result<()> {
    let isolated = read_raster(&run.layout.artifact(Stage::Isolate, tile.id))?;
    let (relabeled, relabeling) = relabel_raster(&isolated);
    log::debug!("Tile {}: {} objects", tile.id, relabeling.len());
    write_raster_artifact(run, output, &relabeled, relabeling.to_table())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dense_ascending_ids() {
        let data = vec![0, 907, 12, 12, 0, 5000, 907];
        let relabeling = Relabeling::from_labels(&data);
        assert_eq!(relabeling.labels, vec![12, 907, 5000]);
        assert_eq!(relabeling.apply(&data), vec![0, 2, 1, 1, 0, 3, 2]);
    }

    #[test]
    fn nonzero_codes_are_contiguous() {
        let data: Vec<u32> = (0..50).map(|i| (i * 37) % 11 * 1000).collect();
        let k = Relabeling::from_labels(&data).len();
        let codes: BTreeSet<u32> = Relabeling::from_labels(&data)
            .apply(&data)
            .into_iter()
            .filter(|&v| v != 0)
            .collect();
        assert_eq!(codes, (1..=k as u32).collect());
    }

    #[test]
    fn mapping_columns() {
        let relabeling = Relabeling { labels: vec![4, 9] };
        let table = relabeling.to_table();
        assert_eq!(table.read_int_column("ObjectId").unwrap(), &[-1, 0, 1]);
        assert_eq!(table.read_int_column("SourceLabel").unwrap(), &[0, 4, 9]);
    }

    #[test]
    fn empty_tile() {
        let relabeling = Relabeling::from_labels(&[0, 0]);
        assert!(relabeling.is_empty());
        assert_eq!(relabeling.apply(&[0, 0]), vec![0, 0]);
        assert_eq!(relabeling.to_table().row_count(), 1);
    }
}
