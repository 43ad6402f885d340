use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Exclusion, Result, SegtileError, Stage, StageOutcome, TileId, TileSet};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExcludedTiles {
    pub degenerate: usize,
    pub oversized: usize,
    pub configured: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedTile {
    pub tile: TileId,
    pub reason: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageReport {
    pub created: Vec<TileId>,
    pub skipped: Vec<TileId>,
    pub failed: Vec<FailedTile>,
    /// not dispatched at all, the run marker recorded it as complete
    pub resumed: bool,
}

/// Summary of one run, written to `run_report.json`
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub total_valid_tiles: usize,
    pub excluded: ExcludedTiles,
    pub stages: BTreeMap<Stage, StageReport>,
    /// tiles with a vector output
    pub complete_tiles: Vec<TileId>,
}

/// Progress marker kept in the base directory between runs
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunState {
    pub tiles: Vec<TileId>,
    /// last stage that, like all stages before it, finished without failures
    pub last_complete: Option<Stage>,
}

impl RunReport {
    pub fn new(tiles: &TileSet) -> Self {
        Self {
            total_valid_tiles: tiles.valid.len(),
            excluded: ExcludedTiles {
                degenerate: tiles.count(Exclusion::Degenerate),
                oversized: tiles.count(Exclusion::Oversized),
                configured: tiles.count(Exclusion::Configured),
            },
            ..Default::default()
        }
    }

    pub fn record(&mut self, stage: Stage, outcomes: Vec<(TileId, StageOutcome)>) {
        let report = self.stages.entry(stage).or_default();
        for (tile, outcome) in outcomes {
            match outcome {
                StageOutcome::Created => report.created.push(tile),
                StageOutcome::Skipped => report.skipped.push(tile),
                StageOutcome::Failed(reason) => report.failed.push(FailedTile { tile, reason }),
            }
        }
    }

    pub fn record_resumed(&mut self, stage: Stage, tiles: &[TileId]) {
        let report = self.stages.entry(stage).or_default();
        report.skipped.extend_from_slice(tiles);
        report.resumed = true;
    }

    /// Tiles that failed in any stage
    pub fn failed_tiles(&self) -> BTreeSet<TileId> {
        self.stages
            .values()
            .flat_map(|s| s.failed.iter().map(|f| f.tile))
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.failed_tiles().is_empty() && self.complete_tiles.len() == self.total_valid_tiles
    }

    pub fn log_summary(&self) {
        log::info!(
            "{} valid tiles, excluded: {} degenerate, {} oversized, {} configured",
            self.total_valid_tiles,
            self.excluded.degenerate,
            self.excluded.oversized,
            self.excluded.configured
        );
        for (stage, report) in self.stages.iter() {
            log::info!(
                "{:>9}: {} created, {} skipped, {} failed",
                stage.name(),
                report.created.len(),
                report.skipped.len(),
                report.failed.len()
            );
        }
        let failed = self.failed_tiles();
        if failed.is_empty() {
            log::info!("{} of {} tiles complete", self.complete_tiles.len(), self.total_valid_tiles);
        } else {
            log::warn!(
                "{} of {} tiles complete, failed tiles: {:?}",
                self.complete_tiles.len(),
                self.total_valid_tiles,
                failed
            );
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        save_json(path, self)
    }
}

impl RunState {
    /// The marker left by a previous run, if it is readable
    pub fn load(path: &Path) -> Option<Self> {
        let text = fs::read_to_string(path).ok()?;
        match serde_json::from_str(&text) {
            Ok(state) => Some(state),
            Err(e) => {
                log::warn!("{}: ignoring run marker: {}", path.display(), e);
                None
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        save_json(path, self)
    }

    /// Whether `stage` need not be dispatched again for `tiles`
    pub fn covers(&self, tiles: &[TileId], stage: Stage) -> bool {
        self.tiles == tiles && self.last_complete.is_some_and(|last| stage <= last)
    }
}

fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).map_err(|e| SegtileError::json(path, e))?;
    fs::write(path, text).map_err(|e| SegtileError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_outcomes() {
        let mut report = RunReport { total_valid_tiles: 3, ..Default::default() };
        report.record(
            Stage::Mask,
            vec![
                (1, StageOutcome::Created),
                (2, StageOutcome::Skipped),
                (3, StageOutcome::Failed("boom".into())),
            ],
        );
        let mask = &report.stages[&Stage::Mask];
        assert_eq!(mask.created, vec![1]);
        assert_eq!(mask.skipped, vec![2]);
        assert_eq!(mask.failed, vec![FailedTile { tile: 3, reason: "boom".into() }]);
        assert_eq!(report.failed_tiles().into_iter().collect::<Vec<_>>(), vec![3]);
        report.complete_tiles = vec![1, 2];
        assert!(!report.is_complete());
    }

    #[test]
    fn marker_covers_earlier_stages() {
        let state = RunState { tiles: vec![1, 2], last_complete: Some(Stage::Cut) };
        assert!(state.covers(&[1, 2], Stage::Envelope));
        assert!(state.covers(&[1, 2], Stage::Cut));
        assert!(!state.covers(&[1, 2], Stage::Isolate));
        assert!(!state.covers(&[1, 2, 3], Stage::Envelope));
        assert!(!RunState::default().covers(&[], Stage::Envelope));
    }

    #[test]
    fn marker_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run_state.json");
        assert_eq!(RunState::load(&path), None);
        let state = RunState { tiles: vec![4], last_complete: Some(Stage::Relabel) };
        state.save(&path).unwrap();
        assert_eq!(RunState::load(&path), Some(state));
        std::fs::write(&path, "not json").unwrap();
        assert_eq!(RunState::load(&path), None);
    }
}
