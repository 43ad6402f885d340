use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{overview_factors, AttributeTable, Column, Raster};
use crate::Color;

/// Band level statistics; 0 is no-data and never counted
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BandStatistics {
    pub min: u32,
    pub max: u32,
    pub mean: f64,
    /// number of pixels that are not no-data
    pub valid_count: u64,
    pub no_data: u32,
    /// decimation factors of the overview levels stored with the raster
    pub overviews: Vec<u32>,
}

/// Used to compute `BandStatistics` and the histogram
#[derive(Default)]
pub struct HistogramBuilder {
    sum: u64,
    histogram: BTreeMap<u32, u64>,
}

impl HistogramBuilder {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn add(&mut self, v: u32) {
        if v == 0 {
            return;
        }
        self.sum += v as u64;
        *self.histogram.entry(v).or_insert(0) += 1;
    }

    pub fn add_all(&mut self, values: &[u32]) {
        for &v in values {
            self.add(v);
        }
    }

    /// Distinct values seen, ascending
    pub fn values(&self) -> impl Iterator<Item = u32> + '_ {
        self.histogram.keys().copied()
    }

    pub fn build(&self, overviews: Vec<u32>) -> BandStatistics {
        let valid_count: u64 = self.histogram.values().sum();
        BandStatistics {
            min: self.values().next().unwrap_or(0),
            max: self.values().last().unwrap_or(0),
            mean: if valid_count > 0 { self.sum as f64 / valid_count as f64 } else { 0.0 },
            valid_count,
            no_data: 0,
            overviews,
        }
    }

    /// Attribute table rows: the background row, then one per distinct value
    pub fn to_table(&self) -> AttributeTable {
        let rows: Vec<(u32, u64)> = std::iter::once((0, 0))
            .chain(self.histogram.iter().map(|(&v, &n)| (v, n)))
            .collect();
        let colours: Vec<Color> = rows.iter().map(|&(v, _)| Color::for_label(v)).collect();
        let channel = |f: fn(&Color) -> u8| {
            Column::Integer(colours.iter().map(|c| f(c) as i64).collect())
        };
        let mut table = AttributeTable::default();
        table.set_column("Value", Column::Integer(rows.iter().map(|&(v, _)| v as i64).collect()));
        table.set_column("Histogram", Column::Integer(rows.iter().map(|&(_, n)| n as i64).collect()));
        table.set_column("Red", channel(|c| c.r));
        table.set_column("Green", channel(|c| c.g));
        table.set_column("Blue", channel(|c| c.b));
        table.set_column("Alpha", channel(|c| c.a));
        table
    }
}

/// Histogram, colour table and band statistics for a freshly written raster,
/// treating 0 as no-data.
pub fn populate_stats(raster: &Raster, pyramids: bool) -> AttributeTable {
    let mut builder = HistogramBuilder::new();
    builder.add_all(&raster.data);
    let overviews = if pyramids {
        overview_factors(raster.width(), raster.height())
    } else {
        vec![]
    };
    let mut table = builder.to_table();
    table.statistics = Some(builder.build(overviews));
    log::debug!(
        "statistics: {} classes, {:?}",
        table.row_count(),
        table.statistics
    );
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Extent, Grid, PixelType};

    fn raster(data: Vec<u32>) -> Raster {
        let grid = Grid::from_extent(Extent::new(0.0, 0.0, 3.0, 2.0), 1.0).unwrap();
        Raster { grid, projection: String::new(), pixel_type: PixelType::U16, data }
    }

    #[test]
    fn statistics_ignore_zero() {
        let table = populate_stats(&raster(vec![0, 5, 5, 0, 9, 300]), false);
        let stats = table.statistics.clone().unwrap();
        assert_eq!(stats.min, 5);
        assert_eq!(stats.max, 300);
        assert_eq!(stats.valid_count, 4);
        assert_eq!(stats.mean, 319.0 / 4.0);
        assert!(stats.overviews.is_empty());
        assert_eq!(table.read_int_column("Value").unwrap(), &[0, 5, 9, 300]);
        assert_eq!(table.read_int_column("Histogram").unwrap(), &[0, 2, 1, 1]);
        assert_eq!(table.read_int_column("Alpha").unwrap(), &[0, 255, 255, 255]);
    }

    #[test]
    fn statistics_of_empty_raster() {
        let table = populate_stats(&raster(vec![0; 6]), true);
        let stats = table.statistics.clone().unwrap();
        assert_eq!((stats.min, stats.max, stats.valid_count), (0, 0, 0));
        assert_eq!(stats.mean, 0.0);
        assert_eq!(table.row_count(), 1);
    }

    #[test]
    fn statistics_are_deterministic() {
        let a = populate_stats(&raster(vec![3, 1, 2, 0, 2, 7]), true);
        let b = populate_stats(&raster(vec![3, 1, 2, 0, 2, 7]), true);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }
}
