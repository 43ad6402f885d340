//! The per-tile stages. Every stage reads the artifact of the stage before it,
//! writes its own artifact atomically and never touches an existing one.

mod clip;
mod envelope;
mod isolate;
mod relabel;
mod vectorize;

pub use clip::*;
pub use envelope::*;
pub use isolate::*;
pub use relabel::*;
pub use vectorize::*;

use std::path::Path;

use crate::layout::{commit, discard, partial_path};
use crate::{
    populate_stats, write_raster, AttributeTable, PipelineRun, Raster, Result, Stage,
    StageOutcome, Tile,
};

/// Runs `stage` for one tile, unless its artifact already exists.
pub fn run_stage(run: &PipelineRun, stage: Stage, tile: &Tile) -> Result<StageOutcome> {
    let output = run.layout.artifact(stage, tile.id);
    if output.exists() {
        log::info!("{} exists, skipping", output.display());
        return Ok(StageOutcome::Skipped);
    }
    log::info!("Creating {}", output.display());
    let result = match stage {
        Stage::Envelope => materialize_envelope(run, tile, &output),
        Stage::Mask => mask_tile(run, tile, &output),
        Stage::Cut => cut_tile(run, tile, &output),
        Stage::Isolate => isolate_tile(run, tile, &output),
        Stage::Relabel => relabel_tile(run, tile, &output),
        Stage::Vectorize => vectorize_tile(run, tile, &output),
    };
    if result.is_err() {
        discard(&output);
    }
    result.map(|_| StageOutcome::Created)
}

/// Writes `raster` and its attribute table (statistics plus `extra` columns) next to
/// `path`, then moves the raster into place.
pub(crate) fn write_raster_artifact(
    run: &PipelineRun,
    path: &Path,
    raster: &Raster,
    extra: AttributeTable,
) -> Result<()> {
    write_raster(&partial_path(path), raster, run.pyramids)?;
    let mut table = populate_stats(raster, run.pyramids);
    table.columns.extend(extra.columns);
    table.save(path)?;
    commit(path)
}
