use std::path::{Path, PathBuf};

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SegtileError>;

#[derive(Debug, Error)]
pub enum SegtileError {
    /// The object attribute table lacks a column the pipeline depends on.
    /// Usually means the grid population step has not been run.
    #[error("attribute table has no column '{column}'")]
    MissingColumn { column: String },
    #[error("column '{column}' is not of {expected} type")]
    ColumnType { column: String, expected: &'static str },
    #[error("column '{column}' has {found} rows, expected {expected}")]
    ColumnLength { column: String, found: usize, expected: usize },
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path}: {source}")]
    Tiff {
        path: PathBuf,
        #[source]
        source: tiff::TiffError,
    },
    #[error("{path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("raster: {0}")]
    Raster(String),
    #[error("boundary tracing: {0}")]
    Trace(String),
    #[error("vector layer: {0}")]
    Vector(String),
    #[error("config: {0}")]
    Config(String),
}

impl SegtileError {
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io { path: path.to_path_buf(), source }
    }

    pub fn tiff(path: &Path, source: tiff::TiffError) -> Self {
        Self::Tiff { path: path.to_path_buf(), source }
    }

    pub fn json(path: &Path, source: serde_json::Error) -> Self {
        Self::Json { path: path.to_path_buf(), source }
    }
}
