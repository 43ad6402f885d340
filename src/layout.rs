//! On-disk layout of a run: one directory per stage under a base directory

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::{Result, SegtileError, Stage, TileId};

pub const STATE_FILE: &str = "run_state.json";
pub const REPORT_FILE: &str = "run_report.json";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Layout {
    pub base: PathBuf,
}

/// Artifacts found on disk
#[derive(Clone, Debug, Default, Serialize)]
pub struct Census {
    pub artifacts: BTreeMap<Stage, usize>,
    /// tiles with a vector output
    pub complete: BTreeSet<TileId>,
}

impl Layout {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// Output base next to the directory holding `input`: the grandparent of the
    /// file when it has one, otherwise the file's own directory.
    pub fn derive_base(input: &Path) -> PathBuf {
        let parent = input.parent().filter(|p| !p.as_os_str().is_empty());
        match parent.and_then(Path::parent).filter(|p| !p.as_os_str().is_empty()) {
            Some(base) => base.to_path_buf(),
            None => parent.map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from(".")),
        }
    }

    pub fn dir(&self, stage: Stage) -> PathBuf {
        self.base.join(stage.dir_name())
    }

    pub fn artifact(&self, stage: Stage, tile: TileId) -> PathBuf {
        self.dir(stage).join(stage.file_name(tile))
    }

    pub fn state_path(&self) -> PathBuf {
        self.base.join(STATE_FILE)
    }

    pub fn report_path(&self) -> PathBuf {
        self.base.join(REPORT_FILE)
    }

    /// Creates all stage directories; existing ones are left alone.
    pub fn ensure(&self) -> Result<()> {
        for stage in Stage::ALL {
            let dir = self.dir(stage);
            if !dir.is_dir() {
                log::info!("Creating {}", dir.display());
            }
            fs::create_dir_all(&dir).map_err(|e| SegtileError::io(&dir, e))?;
        }
        Ok(())
    }

    pub fn census(&self) -> Result<Census> {
        let mut census = Census::default();
        for stage in Stage::ALL {
            let tiles = self.tiles_in(stage)?;
            if stage == Stage::Vectorize {
                census.complete = tiles.iter().copied().collect();
            }
            census.artifacts.insert(stage, tiles.len());
        }
        Ok(census)
    }

    /// Tiles that have a finished artifact of `stage`, ascending
    pub fn tiles_in(&self, stage: Stage) -> Result<Vec<TileId>> {
        let dir = self.dir(stage);
        if !dir.is_dir() {
            return Ok(vec![]);
        }
        let mut tiles = vec![];
        for entry in fs::read_dir(&dir).map_err(|e| SegtileError::io(&dir, e))? {
            let entry = entry.map_err(|e| SegtileError::io(&dir, e))?;
            if let Some(tile) = entry.file_name().to_str().and_then(|n| stage.tile_of(n)) {
                tiles.push(tile);
            }
        }
        tiles.sort_unstable();
        Ok(tiles)
    }
}

/// Sibling an artifact is written to before it is renamed into place
pub fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".partial");
    PathBuf::from(name)
}

/// Renames a finished `.partial` file onto `path`
pub fn commit(path: &Path) -> Result<()> {
    let partial = partial_path(path);
    fs::rename(&partial, path).map_err(|e| SegtileError::io(path, e))
}

/// Removes a leftover `.partial` file, if any
pub fn discard(path: &Path) {
    let partial = partial_path(path);
    if partial.exists() {
        if let Err(e) = fs::remove_file(&partial) {
            log::warn!("{}: {}", partial.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_from_input() {
        assert_eq!(
            Layout::derive_base(Path::new("/data/site/segs/seg.tif")),
            PathBuf::from("/data/site")
        );
        assert_eq!(Layout::derive_base(Path::new("segs/seg.tif")), PathBuf::from("segs"));
        assert_eq!(Layout::derive_base(Path::new("seg.tif")), PathBuf::from("."));
    }

    #[test]
    fn artifact_paths() {
        let layout = Layout::new("/out");
        assert_eq!(
            layout.artifact(Stage::Cut, 4),
            PathBuf::from("/out/3_seg_tiles/tile_segs_4.tif")
        );
        assert_eq!(
            partial_path(&layout.artifact(Stage::Cut, 4)),
            PathBuf::from("/out/3_seg_tiles/tile_segs_4.tif.partial")
        );
    }

    #[test]
    fn ensure_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let layout = Layout::new(dir.path());
        layout.ensure().unwrap();
        layout.ensure().unwrap();
        for stage in Stage::ALL {
            assert!(layout.dir(stage).is_dir());
        }
    }

    #[test]
    fn census_counts_finished_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let layout = Layout::new(dir.path());
        layout.ensure().unwrap();
        fs::write(layout.artifact(Stage::Mask, 1), b"").unwrap();
        fs::write(layout.artifact(Stage::Mask, 2), b"").unwrap();
        fs::write(partial_path(&layout.artifact(Stage::Mask, 3)), b"").unwrap();
        fs::write(layout.artifact(Stage::Vectorize, 2), b"").unwrap();
        let census = layout.census().unwrap();
        assert_eq!(census.artifacts[&Stage::Mask], 2);
        assert_eq!(census.artifacts[&Stage::Envelope], 0);
        assert_eq!(census.complete.into_iter().collect::<Vec<_>>(), vec![2]);
    }
}
