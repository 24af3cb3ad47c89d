//! Map tile mutation engine.
//!
//! A batch is planned against a snapshot of the map, then written as one
//! unordered bulk write in which every tile update carries its own
//! precondition. The store is the only arbiter of tile state: a tile that
//! moved on since the scan is skipped by the store, not by this code.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use farmstead_domain::{
    CharacterId, ConditionalTileUpdate, DomainError, GameRules, MapId, Tile, TileAction,
    TileCoord,
};

use crate::infrastructure::ports::{BulkTileResult, ClockPort, MapRepo, RepoError};
use crate::use_cases::error::ErrorKind;

#[derive(Debug, thiserror::Error)]
pub enum TileError {
    #[error("Validation error: {0}")]
    Validation(#[from] DomainError),
    #[error("Map not found: {0}")]
    MapNotFound(MapId),
    #[error("Repository error: {0}")]
    Repo(#[from] RepoError),
}

impl TileError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TileError::Validation(_) => ErrorKind::Validation,
            TileError::MapNotFound(_) => ErrorKind::NotFound,
            TileError::Repo(_) => ErrorKind::Internal,
        }
    }
}

/// A scanned batch, ready to be written.
#[derive(Debug, Clone)]
pub struct TilePlan {
    pub map_id: MapId,
    pub character_id: CharacterId,
    pub action: TileAction,
    /// Eligible tiles as they were when scanned.
    pub eligible: BTreeMap<TileCoord, Tile>,
    pub updates: Vec<ConditionalTileUpdate>,
    pub unit_cost: u64,
    /// Scan-time cost: eligible tiles times unit cost.
    pub total_cost: u64,
}

/// Result of writing a plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileBatchOutcome {
    pub map_id: MapId,
    pub action: TileAction,
    pub eligible: Vec<TileCoord>,
    /// Tiles the store actually modified.
    pub applied: Vec<TileCoord>,
    pub total_cost: u64,
    pub updated_tile_count: u64,
}

pub struct MapTileEngine {
    maps: Arc<dyn MapRepo>,
    clock: Arc<dyn ClockPort>,
    rules: Arc<GameRules>,
}

impl MapTileEngine {
    pub fn new(maps: Arc<dyn MapRepo>, clock: Arc<dyn ClockPort>, rules: Arc<GameRules>) -> Self {
        Self { maps, clock, rules }
    }

    pub fn rules(&self) -> &GameRules {
        &self.rules
    }

    /// Scan the map and build one conditional update per eligible tile.
    ///
    /// `coords: None` scans the whole map. Duplicate coordinates are merged;
    /// coordinates outside the map or without a tile are dropped.
    pub async fn plan(
        &self,
        map_id: MapId,
        action: TileAction,
        coords: Option<&[TileCoord]>,
    ) -> Result<TilePlan, TileError> {
        if coords.is_some_and(|c| c.is_empty()) {
            return Err(DomainError::validation("Tile batch cannot be empty").into());
        }

        let map = self
            .maps
            .get(map_id)
            .await?
            .ok_or(TileError::MapNotFound(map_id))?;

        let targets: BTreeSet<TileCoord> = match coords {
            Some(coords) => coords
                .iter()
                .copied()
                .filter(|c| map.contains(*c))
                .collect(),
            None => map.tiles.keys().copied().collect(),
        };

        let now = self.clock.now();
        let precondition = action.precondition(now);
        let change = action.change(now, &self.rules);

        let eligible: BTreeMap<TileCoord, Tile> = targets
            .into_iter()
            .filter_map(|c| map.tile(c).map(|t| (c, t)))
            .filter(|(_, tile)| tile.satisfies(&precondition))
            .map(|(c, t)| (c, t.clone()))
            .collect();

        let updates = eligible
            .keys()
            .map(|coord| ConditionalTileUpdate {
                coord: *coord,
                precondition,
                change: change.clone(),
            })
            .collect();

        let unit_cost = self.rules.unit_cost(&action);
        let total_cost = unit_cost.saturating_mul(eligible.len() as u64);

        Ok(TilePlan {
            map_id,
            character_id: map.character_id,
            action,
            eligible,
            updates,
            unit_cost,
            total_cost,
        })
    }

    /// Write a plan as one unordered bulk write.
    pub async fn execute(&self, plan: &TilePlan) -> Result<TileBatchOutcome, TileError> {
        let result = if plan.updates.is_empty() {
            BulkTileResult::default()
        } else {
            self.maps
                .bulk_update_tiles(plan.map_id, plan.updates.clone())
                .await?
        };

        let outcome = TileBatchOutcome {
            map_id: plan.map_id,
            action: plan.action,
            eligible: plan.eligible.keys().copied().collect(),
            applied: result.applied,
            total_cost: plan.total_cost,
            updated_tile_count: result.modified_count,
        };

        tracing::info!(
            map_id = %plan.map_id,
            action = plan.action.name(),
            eligible = outcome.eligible.len(),
            updated = outcome.updated_tile_count,
            total_cost = outcome.total_cost,
            "Tile batch applied"
        );
        Ok(outcome)
    }

    pub async fn apply(
        &self,
        map_id: MapId,
        action: TileAction,
        coords: Option<&[TileCoord]>,
    ) -> Result<TileBatchOutcome, TileError> {
        let plan = self.plan(map_id, action, coords).await?;
        self.execute(&plan).await
    }

    /// Pay rent on every overdue leased tile of the map.
    pub async fn pay_rent_for_map(&self, map_id: MapId) -> Result<TileBatchOutcome, TileError> {
        self.apply(map_id, TileAction::PayRent, None).await
    }
}
