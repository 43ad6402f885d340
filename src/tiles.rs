//! Objects of the segmentation, grouped into tiles

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::{AttributeTable, Extent, Result, SegtileError};

pub type TileId = i64;

/// Column assigning each object to a tile
pub const TILE_COLUMN: &str = "tiles";

/// Extreme corners of each object, `(x, y)` pairs in this order:
/// smallest X, largest X, smallest Y, largest Y.
pub const EXTENT_COLUMNS: [&str; 8] = [
    "MinXX", "MinXY", "MaxXX", "MaxXY", "MinYX", "MinYY", "MaxYX", "MaxYY",
];

/// Tiles at least this long on either side are skipped
pub const DEFAULT_SIZE_LIMIT: f64 = 50000.0;

/// One row of the object attribute table
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Object {
    /// Row index, equal to the object's label in the segmentation
    pub id: usize,
    pub tile: TileId,
    pub min_x: (f64, f64),
    pub max_x: (f64, f64),
    pub min_y: (f64, f64),
    pub max_y: (f64, f64),
}

#[derive(Clone, Debug, Default)]
pub struct ObjectTable {
    pub objects: Vec<Object>,
}

/// Why a tile is left out of a run
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Exclusion {
    /// zero width or zero height
    Degenerate,
    /// as wide or as tall as the size limit
    Oversized,
    /// listed in the run configuration
    Configured,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Tile {
    pub id: TileId,
    pub extent: Extent,
}

#[derive(Clone, Debug)]
pub struct TilePolicy {
    pub size_limit: f64,
    pub exclude: BTreeSet<TileId>,
}

/// Outcome of validating every tile of a table
#[derive(Clone, Debug, Default)]
pub struct TileSet {
    /// Ascending by tile id
    pub valid: Vec<Tile>,
    pub excluded: Vec<(TileId, Exclusion)>,
}

impl Object {
    pub fn extent(&self) -> Extent {
        Extent::new(self.min_x.0, self.min_y.1, self.max_x.0, self.max_y.1)
    }
}

impl ObjectTable {
    /// Reads objects from the attribute table of the segmentation.
    /// Row 0 is the background and is not an object.
    ///
    /// Fails with `MissingColumn` when the tile assignment or any extent
    /// column has not been populated.
    pub fn from_attribute_table(table: &AttributeTable) -> Result<Self> {
        let tiles = table.read_int_column(TILE_COLUMN)?;
        let mut corners = Vec::with_capacity(EXTENT_COLUMNS.len());
        for name in EXTENT_COLUMNS {
            let column = table.read_real_column(name)?;
            if column.len() != tiles.len() {
                return Err(SegtileError::ColumnLength {
                    column: name.to_owned(),
                    found: column.len(),
                    expected: tiles.len(),
                });
            }
            corners.push(column);
        }
        let objects = (1..tiles.len())
            .map(|i| Object {
                id: i,
                tile: tiles[i],
                min_x: (corners[0][i], corners[1][i]),
                max_x: (corners[2][i], corners[3][i]),
                min_y: (corners[4][i], corners[5][i]),
                max_y: (corners[6][i], corners[7][i]),
            })
            .collect();
        Ok(Self { objects })
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Envelope of all objects of each tile
    pub fn tile_extents(&self) -> BTreeMap<TileId, Extent> {
        let mut extents = BTreeMap::<TileId, Extent>::new();
        for object in self.objects.iter() {
            let e = extents.entry(object.tile).or_insert_with(|| object.extent());
            e.min_x = e.min_x.min(object.min_x.0);
            e.max_x = e.max_x.max(object.max_x.0);
            e.min_y = e.min_y.min(object.min_y.1);
            e.max_y = e.max_y.max(object.max_y.1);
        }
        extents
    }
}

impl Default for TilePolicy {
    fn default() -> Self {
        Self {
            size_limit: DEFAULT_SIZE_LIMIT,
            exclude: BTreeSet::new(),
        }
    }
}

impl TilePolicy {
    /// `None` when the tile is to be processed
    pub fn check(&self, id: TileId, extent: Extent) -> Option<Exclusion> {
        if self.exclude.contains(&id) {
            Some(Exclusion::Configured)
        } else if extent.is_degenerate() {
            Some(Exclusion::Degenerate)
        } else if !(extent.width() < self.size_limit && extent.height() < self.size_limit) {
            Some(Exclusion::Oversized)
        } else {
            None
        }
    }

    pub fn partition(&self, extents: &BTreeMap<TileId, Extent>) -> TileSet {
        let mut set = TileSet::default();
        for (&id, &extent) in extents.iter() {
            log::info!(
                "Tile {} bbox: ({}, {}, {}, {})",
                id, extent.min_x, extent.min_y, extent.max_x, extent.max_y
            );
            match self.check(id, extent) {
                None => set.valid.push(Tile { id, extent }),
                Some(reason) => {
                    log::warn!("Tile {} excluded: {:?}", id, reason);
                    set.excluded.push((id, reason));
                }
            }
        }
        set
    }
}

impl TileSet {
    pub fn ids(&self) -> Vec<TileId> {
        self.valid.iter().map(|t| t.id).collect()
    }

    pub fn count(&self, reason: Exclusion) -> usize {
        self.excluded.iter().filter(|(_, r)| *r == reason).count()
    }
}
