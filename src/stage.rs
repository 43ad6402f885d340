use std::fmt;

use serde::{Deserialize, Serialize};

use crate::TileId;

/// Per-tile pipeline stages, in execution order
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Envelope,
    Mask,
    Cut,
    Isolate,
    Relabel,
    Vectorize,
}

/// What one stage did for one tile
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StageOutcome {
    Created,
    /// the artifact was already on disk
    Skipped,
    Failed(String),
}

impl Stage {
    pub const ALL: [Stage; 6] = [
        Stage::Envelope,
        Stage::Mask,
        Stage::Cut,
        Stage::Isolate,
        Stage::Relabel,
        Stage::Vectorize,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Stage::Envelope => "envelope",
            Stage::Mask => "mask",
            Stage::Cut => "cut",
            Stage::Isolate => "isolate",
            Stage::Relabel => "relabel",
            Stage::Vectorize => "vectorize",
        }
    }

    pub fn dir_name(self) -> &'static str {
        match self {
            Stage::Envelope => "1_base_tiles",
            Stage::Mask => "2_tile_msks",
            Stage::Cut => "3_seg_tiles",
            Stage::Isolate => "4_seg_msk_tiles",
            Stage::Relabel => "5_seg_msk_lbl_tiles",
            Stage::Vectorize => "6_vectors",
        }
    }

    pub fn prefix(self) -> &'static str {
        match self {
            Stage::Envelope => "tile_",
            Stage::Mask => "tile_msk_",
            Stage::Cut => "tile_segs_",
            Stage::Isolate => "tile_segs_mskd_",
            Stage::Relabel => "tile_segs_mskd_lbl_",
            Stage::Vectorize => "tile_segs_mskd_lbl_vec",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Stage::Vectorize => "geojson",
            _ => "tif",
        }
    }

    /// Artifact name without extension; also the vector layer name
    pub fn file_stem(self, tile: TileId) -> String {
        format!("{}{}", self.prefix(), tile)
    }

    pub fn file_name(self, tile: TileId) -> String {
        format!("{}.{}", self.file_stem(tile), self.extension())
    }

    /// The tile an artifact file of this stage belongs to
    pub fn tile_of(self, file_name: &str) -> Option<TileId> {
        file_name
            .strip_prefix(self.prefix())?
            .strip_suffix(self.extension())?
            .strip_suffix('.')?
            .parse()
            .ok()
    }

    pub fn previous(self) -> Option<Stage> {
        let i = Self::ALL.iter().position(|&s| s == self)?;
        i.checked_sub(1).map(|i| Self::ALL[i])
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl StageOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, StageOutcome::Failed(_))
    }
}
