use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::BandStatistics;
use crate::{Result, SegtileError};

/// One typed column of a raster attribute table
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "values", rename_all = "lowercase")]
pub enum Column {
    Integer(Vec<i64>),
    Real(Vec<f64>),
}

/// Raster attribute table, kept as a JSON sidecar next to its raster.
///
/// Rows are keyed by pixel value: when a `Value` column is present it names the
/// pixel value of each row, otherwise the row index is the pixel value. Row 0 is
/// the background.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeTable {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statistics: Option<BandStatistics>,
    #[serde(default)]
    pub columns: BTreeMap<String, Column>,
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Integer(v) => v.len(),
            Column::Real(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AttributeTable {
    /// `<raster>.rat.json`
    pub fn sidecar_path(raster: &Path) -> PathBuf {
        let mut name = raster.as_os_str().to_owned();
        name.push(".rat.json");
        PathBuf::from(name)
    }

    /// Loads the attribute table attached to `raster`
    pub fn open(raster: &Path) -> Result<Self> {
        Self::load(&Self::sidecar_path(raster))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| SegtileError::io(path, e))?;
        serde_json::from_str(&text).map_err(|e| SegtileError::json(path, e))
    }

    /// Writes the table as the sidecar of `raster`, replacing any previous one
    pub fn save(&self, raster: &Path) -> Result<()> {
        let path = Self::sidecar_path(raster);
        let text = serde_json::to_string_pretty(self).map_err(|e| SegtileError::json(&path, e))?;
        fs::write(&path, text).map_err(|e| SegtileError::io(&path, e))
    }

    pub fn row_count(&self) -> usize {
        self.columns.values().map(Column::len).max().unwrap_or(0)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn set_column(&mut self, name: &str, column: Column) {
        self.columns.insert(name.to_owned(), column);
    }

    fn column(&self, name: &str) -> Result<&Column> {
        self.columns
            .get(name)
            .ok_or_else(|| SegtileError::MissingColumn { column: name.to_owned() })
    }

    /// Values of an integer column, one per row
    pub fn read_int_column(&self, name: &str) -> Result<&[i64]> {
        match self.column(name)? {
            Column::Integer(values) => Ok(values),
            Column::Real(_) => Err(SegtileError::ColumnType {
                column: name.to_owned(),
                expected: "integer",
            }),
        }
    }

    /// Values of a real column, one per row. Integer columns are widened.
    pub fn read_real_column(&self, name: &str) -> Result<Vec<f64>> {
        match self.column(name)? {
            Column::Real(values) => Ok(values.clone()),
            Column::Integer(values) => Ok(values.iter().map(|&v| v as f64).collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> AttributeTable {
        let mut table = AttributeTable::default();
        table.set_column("tiles", Column::Integer(vec![0, 1, 1]));
        table.set_column("MinXX", Column::Real(vec![0.0, 2.5, 5.0]));
        table
    }

    #[test]
    fn read_columns() {
        let table = table();
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.read_int_column("tiles").unwrap(), &[0, 1, 1]);
        assert_eq!(table.read_real_column("MinXX").unwrap(), vec![0.0, 2.5, 5.0]);
        assert_eq!(table.read_real_column("tiles").unwrap(), vec![0.0, 1.0, 1.0]);
    }

    #[test]
    fn missing_column() {
        match table().read_int_column("MaxYY") {
            Err(SegtileError::MissingColumn { column }) => assert_eq!(column, "MaxYY"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn integer_column_is_not_real() {
        assert!(matches!(
            table().read_int_column("MinXX"),
            Err(SegtileError::ColumnType { .. })
        ));
    }

    #[test]
    fn sidecar_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let raster = dir.path().join("seg.tif");
        assert_eq!(
            AttributeTable::sidecar_path(&raster),
            dir.path().join("seg.tif.rat.json")
        );
        table().save(&raster).unwrap();
        assert_eq!(AttributeTable::open(&raster).unwrap(), table());
    }
}
