use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{read_grid, Layout, Result, SegtileError, TileId, TilePolicy, DEFAULT_SIZE_LIMIT};

/// User facing settings of a run, loadable from JSON
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Labelled object raster; its attribute table sidecar holds the tile assignment
    pub segmentation: Option<PathBuf>,
    /// Raster of tile ids (the mode raster of the grid population step)
    pub tile_raster: Option<PathBuf>,
    pub resolution: Option<f64>,
    pub workers: usize,
    pub size_limit: f64,
    /// Tiles never to process, whatever their extent
    pub exclude_tiles: Vec<TileId>,
    pub output_dir: Option<PathBuf>,
    pub pyramids: bool,
}

/// Everything a stage needs to know about the run. Fixed once the run starts.
#[derive(Clone, Debug)]
pub struct PipelineRun {
    pub layout: Layout,
    pub segmentation: PathBuf,
    pub tile_raster: PathBuf,
    pub resolution: f64,
    pub workers: usize,
    /// Projection of the segmentation, given to every envelope
    pub projection: String,
    pub pyramids: bool,
    pub policy: TilePolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            segmentation: None,
            tile_raster: None,
            resolution: None,
            workers: std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1),
            size_limit: DEFAULT_SIZE_LIMIT,
            exclude_tiles: vec![],
            output_dir: None,
            pyramids: true,
        }
    }
}

impl PipelineConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| SegtileError::io(path, e))?;
        serde_json::from_str(&text).map_err(|e| SegtileError::json(path, e))
    }

    pub fn validate(self) -> Result<PipelineRun> {
        let segmentation = self
            .segmentation
            .ok_or_else(|| SegtileError::Config("no input segmentation given".into()))?;
        let tile_raster = self
            .tile_raster
            .ok_or_else(|| SegtileError::Config("no tile raster given".into()))?;
        let resolution = self
            .resolution
            .ok_or_else(|| SegtileError::Config("no resolution given".into()))?;
        if !(resolution > 0.0) || !resolution.is_finite() {
            return Err(SegtileError::Config(format!("resolution must be positive, got {}", resolution)));
        }
        if self.workers == 0 {
            return Err(SegtileError::Config("at least one worker is needed".into()));
        }
        if !(self.size_limit > 0.0) {
            return Err(SegtileError::Config(format!("size limit must be positive, got {}", self.size_limit)));
        }

        let segmentation = fs::canonicalize(&segmentation).map_err(|e| SegtileError::io(&segmentation, e))?;
        let tile_raster = fs::canonicalize(&tile_raster).map_err(|e| SegtileError::io(&tile_raster, e))?;
        let base = match self.output_dir {
            Some(dir) if dir.is_absolute() => dir,
            Some(dir) => std::env::current_dir()
                .map_err(|e| SegtileError::io(&dir, e))?
                .join(dir),
            None => Layout::derive_base(&segmentation),
        };
        let (_, projection) = read_grid(&segmentation)?;

        Ok(PipelineRun {
            layout: Layout::new(base),
            segmentation,
            tile_raster,
            resolution,
            workers: self.workers,
            projection,
            pyramids: self.pyramids,
            policy: TilePolicy {
                size_limit: self.size_limit,
                exclude: self.exclude_tiles.into_iter().collect::<BTreeSet<_>>(),
            },
        })
    }
}
