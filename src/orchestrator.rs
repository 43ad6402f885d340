//! Drives every valid tile through the stages, one stage at a time

use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use rayon::prelude::*;

use crate::pipeline::run_stage;
use crate::{
    AttributeTable, ObjectTable, PipelineRun, Result, RunReport, RunState, SegtileError, Stage,
    StageOutcome, Tile, TileId,
};

/// Runs the whole pipeline.
///
/// Fails only on problems with the run as a whole, like an attribute table without
/// tile assignment; per-tile failures end up in the report.
pub fn run_pipeline(run: &PipelineRun) -> Result<RunReport> {
    let table = AttributeTable::open(&run.segmentation)?;
    let objects = ObjectTable::from_attribute_table(&table)?;
    log::info!("{} objects in {}", objects.len(), run.segmentation.display());
    let tiles = run.policy.partition(&objects.tile_extents());
    let ids = tiles.ids();

    run.layout.ensure()?;
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(run.workers)
        .build()
        .map_err(|e| SegtileError::Config(format!("cannot start {} workers: {}", run.workers, e)))?;

    let state_path = run.layout.state_path();
    let previous = RunState::load(&state_path).filter(|s| s.tiles == ids);
    let mut state = RunState { tiles: ids.clone(), last_complete: None };
    if previous.is_none() {
        state.save(&state_path)?;
    }
    let mut unbroken = true;
    let mut report = RunReport::new(&tiles);

    for stage in Stage::ALL {
        if unbroken
            && previous.as_ref().is_some_and(|p| p.covers(&ids, stage))
            && all_present(run, stage, &ids)?
        {
            log::info!("Stage {} completed by a previous run", stage);
            report.record_resumed(stage, &ids);
            state.last_complete = Some(stage);
            continue;
        }
        let start = Instant::now();
        log::info!("Stage {}: {} tiles on {} workers", stage, ids.len(), run.workers);
        let outcomes = pool.install(|| {
            tiles
                .valid
                .par_iter()
                .map(|tile| (tile.id, dispatch(run, stage, tile)))
                .collect::<Vec<_>>()
        });
        let failed = outcomes.iter().filter(|(_, o)| o.is_failed()).count();
        log::info!(
            "Stage {} done in {:.2?}, {} failed",
            stage,
            start.elapsed(),
            failed
        );
        report.record(stage, outcomes);

        unbroken &= failed == 0;
        if unbroken {
            state.last_complete = Some(stage);
            state.save(&state_path)?;
        }
    }

    report.complete_tiles = run
        .layout
        .tiles_in(Stage::Vectorize)?
        .into_iter()
        .filter(|t| ids.binary_search(t).is_ok())
        .collect();
    report.log_summary();
    report.save(&run.layout.report_path())?;
    Ok(report)
}

/// Whether every tile in `ids` has its `stage` artifact on disk
fn all_present(run: &PipelineRun, stage: Stage, ids: &[TileId]) -> Result<bool> {
    let present = run.layout.tiles_in(stage)?;
    Ok(ids.iter().all(|id| present.binary_search(id).is_ok()))
}

/// One stage for one tile; errors and panics become a failed outcome
fn dispatch(run: &PipelineRun, stage: Stage, tile: &Tile) -> StageOutcome {
    match panic::catch_unwind(AssertUnwindSafe(|| run_stage(run, stage, tile))) {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(e)) => fail(stage, tile.id, e.to_string()),
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_owned());
            fail(stage, tile.id, format!("panicked: {}", message))
        }
    }
}

fn fail(stage: Stage, tile: TileId, reason: String) -> StageOutcome {
    log::error!("Tile {} failed at {}: {}", tile, stage, reason);
    StageOutcome::Failed(reason)
}
