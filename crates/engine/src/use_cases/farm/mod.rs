//! Player tile actions with wallet and inventory reconciliation.
//!
//! Resources are checked against the scan before anything is written, and
//! charged after the bulk write for the tiles the store confirmed. Tiles and
//! balances live in different documents, so a charge that fails after the
//! tiles moved is reported as an inconsistency.

use std::collections::BTreeMap;
use std::sync::Arc;

use farmstead_domain::{
    Character, CharacterId, CharacterLink, CropType, MapId, StatusType, Tile, TileAction,
    TileCoord,
};

use crate::infrastructure::ports::{CharacterLinkRepo, RepoError};
use crate::use_cases::error::{ErrorKind, InconsistencyReport};
use crate::use_cases::lifecycle::CharacterDocuments;
use crate::use_cases::status::StatusOps;
use crate::use_cases::tiles::{MapTileEngine, TileBatchOutcome, TileError, TilePlan};

#[derive(Debug, thiserror::Error)]
pub enum FarmError {
    #[error(transparent)]
    Tiles(#[from] TileError),
    #[error("Character not found: {0}")]
    CharacterNotFound(CharacterId),
    #[error("Insufficient {resource}: required {required}, available {available}")]
    Insufficient {
        resource: String,
        required: u64,
        available: u64,
    },
    #[error("{0}")]
    Inconsistency(InconsistencyReport),
    #[error("Repository error: {0}")]
    Repo(#[from] RepoError),
}

impl FarmError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FarmError::Tiles(e) => e.kind(),
            FarmError::CharacterNotFound(_) => ErrorKind::NotFound,
            FarmError::Insufficient { .. } => ErrorKind::InsufficientResource,
            FarmError::Inconsistency(_) => ErrorKind::Inconsistency,
            FarmError::Repo(_) => ErrorKind::Internal,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FarmActionResult {
    pub outcome: TileBatchOutcome,
    /// Coins actually debited: confirmed tiles times unit cost.
    pub charged_cost: u64,
    /// Current state of the modified tiles, keyed by `"x,y"`.
    pub tiles: BTreeMap<String, Tile>,
}

pub struct FarmActions {
    engine: Arc<MapTileEngine>,
    links: Arc<dyn CharacterLinkRepo>,
    documents: CharacterDocuments,
    status: Arc<StatusOps>,
}

impl FarmActions {
    pub fn new(
        engine: Arc<MapTileEngine>,
        links: Arc<dyn CharacterLinkRepo>,
        documents: CharacterDocuments,
        status: Arc<StatusOps>,
    ) -> Self {
        Self {
            engine,
            links,
            documents,
            status,
        }
    }

    /// Run one tile action for `character_id` on `map_id`.
    ///
    /// `coords: None` targets the whole map (rent payment).
    pub async fn perform(
        &self,
        character_id: CharacterId,
        map_id: MapId,
        action: TileAction,
        coords: Option<&[TileCoord]>,
    ) -> Result<FarmActionResult, FarmError> {
        let link = self
            .links
            .get_by_character(character_id)
            .await?
            .ok_or(FarmError::CharacterNotFound(character_id))?;

        let plan = self.engine.plan(map_id, action, coords).await?;
        self.check_resources(&link, &plan).await?;

        let outcome = self.engine.execute(&plan).await?;
        let charged_cost = self.reconcile(&link, &plan, &outcome).await?;
        let tiles = self.current_tiles(&plan, &outcome).await;

        Ok(FarmActionResult {
            outcome,
            charged_cost,
            tiles,
        })
    }

    async fn check_resources(&self, link: &CharacterLink, plan: &TilePlan) -> Result<(), FarmError> {
        if plan.total_cost > 0 {
            let wallet = self
                .documents
                .wallets
                .get(link.wallet_id)
                .await?
                .ok_or_else(|| missing_document("wallets", link.wallet_id))?;
            if !wallet.can_afford(plan.total_cost) {
                return Err(FarmError::Insufficient {
                    resource: "coins".to_string(),
                    required: plan.total_cost,
                    available: wallet.coins,
                });
            }
        }

        if let TileAction::PlantCrop { crop_type } = plan.action {
            let needed = self.seeds_for(plan.eligible.len());
            if needed > 0 {
                let inventory = self
                    .documents
                    .inventories
                    .get(link.inventory_id)
                    .await?
                    .ok_or_else(|| missing_document("inventories", link.inventory_id))?;
                let (item_type, item_name) = crop_type.seed_item();
                let available = u64::from(inventory.quantity_of(item_type, item_name));
                if available < needed {
                    return Err(FarmError::Insufficient {
                        resource: format!("{item_type}/{item_name}"),
                        required: needed,
                        available,
                    });
                }
            }
        }
        Ok(())
    }

    fn seeds_for(&self, tiles: usize) -> u64 {
        (tiles as u64).saturating_mul(u64::from(self.engine.rules().seeds_per_tile))
    }

    /// Charge and reward for confirmed tiles. Returns the coins debited.
    async fn reconcile(
        &self,
        link: &CharacterLink,
        plan: &TilePlan,
        outcome: &TileBatchOutcome,
    ) -> Result<u64, FarmError> {
        let confirmed = outcome.applied.len();
        if confirmed == 0 {
            return Ok(0);
        }
        let rules = self.engine.rules();
        let action = plan.action.name();

        let charged_cost = plan.unit_cost.saturating_mul(outcome.updated_tile_count);
        if charged_cost > 0 {
            self.documents
                .wallets
                .debit(link.wallet_id, charged_cost)
                .await
                .map_err(|e| tiles_ahead_of(action, "wallets", link.wallet_id, e))?;
        }

        match plan.action {
            TileAction::PlantCrop { crop_type } => {
                let (item_type, item_name) = crop_type.seed_item();
                let seeds = u32::try_from(self.seeds_for(confirmed)).unwrap_or(u32::MAX);
                self.documents
                    .inventories
                    .deduct_item(link.inventory_id, item_type, item_name, seeds)
                    .await
                    .map_err(|e| tiles_ahead_of(action, "inventories", link.inventory_id, e))?;
            }
            TileAction::HarvestCrop => {
                let harvested = harvested_crops(plan, &outcome.applied);
                for (crop_type, count) in &harvested {
                    let (item_type, item_name) = crop_type.produce_item();
                    let quantity = count.saturating_mul(rules.harvest_yield);
                    self.documents
                        .inventories
                        .add_item(link.inventory_id, item_type, item_name, quantity)
                        .await
                        .map_err(|e| {
                            tiles_ahead_of(action, "inventories", link.inventory_id, e)
                        })?;
                }
                let summary = harvested
                    .iter()
                    .map(|(crop, count)| format!("{count} {crop}"))
                    .collect::<Vec<_>>()
                    .join(", ");
                self.status
                    .append_best_effort(
                        link.status_log_id,
                        StatusType::Harvest,
                        format!("Harvested {summary}"),
                    )
                    .await;

                let experience = (confirmed as u64).saturating_mul(rules.harvest_experience);
                let character = self
                    .documents
                    .characters
                    .add_experience(link.character_id, experience)
                    .await
                    .map_err(|e| tiles_ahead_of(action, "characters", link.character_id, e))?;
                if leveled_up(&character, experience) {
                    self.status
                        .append_best_effort(
                            link.status_log_id,
                            StatusType::LevelUp,
                            format!("Reached level {}", character.level),
                        )
                        .await;
                }
            }
            TileAction::LeaseTile => {
                self.status
                    .append_best_effort(
                        link.status_log_id,
                        StatusType::TileLeased,
                        format!("Leased {confirmed} tiles for {charged_cost} coins"),
                    )
                    .await;
            }
            TileAction::PayRent => {
                self.status
                    .append_best_effort(
                        link.status_log_id,
                        StatusType::RentPaid,
                        format!("Paid rent on {confirmed} tiles for {charged_cost} coins"),
                    )
                    .await;
            }
            TileAction::ClearRubble | TileAction::SpeedGrow => {}
        }

        Ok(charged_cost)
    }

    /// Re-read the modified tiles; fall back to projecting the change onto the scan.
    async fn current_tiles(
        &self,
        plan: &TilePlan,
        outcome: &TileBatchOutcome,
    ) -> BTreeMap<String, Tile> {
        if outcome.applied.is_empty() {
            return BTreeMap::new();
        }
        match self.documents.maps.get(plan.map_id).await {
            Ok(Some(map)) => map.tiles_at(&outcome.applied),
            Ok(None) | Err(_) => {
                tracing::warn!(map_id = %plan.map_id, "Could not re-read map, projecting tiles");
                plan.updates
                    .iter()
                    .filter(|u| outcome.applied.contains(&u.coord))
                    .filter_map(|u| {
                        let mut tile = plan.eligible.get(&u.coord)?.clone();
                        tile.apply(&u.change);
                        Some((u.coord.key(), tile))
                    })
                    .collect()
            }
        }
    }
}

/// Count applied tiles per crop type, using the crop seen at scan time.
fn harvested_crops(plan: &TilePlan, applied: &[TileCoord]) -> BTreeMap<CropType, u32> {
    let mut counts = BTreeMap::new();
    for coord in applied {
        if let Some(crop) = plan.eligible.get(coord).and_then(|t| t.crop.as_ref()) {
            *counts.entry(crop.crop_type).or_insert(0u32) += 1;
        }
    }
    counts
}

fn leveled_up(character: &Character, gained: u64) -> bool {
    let before = Character::level_for_experience(character.experience.saturating_sub(gained));
    character.level > before
}

fn missing_document(collection: &str, id: impl std::fmt::Display) -> FarmError {
    FarmError::Inconsistency(
        InconsistencyReport::new(
            "farm_action",
            crate::use_cases::error::LINK_STORE,
            crate::use_cases::error::DOCUMENT_STORE,
            vec![format!("{collection}/{id}")],
            "link exists but document is missing",
        )
        .logged(),
    )
}

/// Tiles were written but the matching resource change was not.
fn tiles_ahead_of(
    action: &'static str,
    pending: &'static str,
    id: impl std::fmt::Display,
    e: RepoError,
) -> FarmError {
    FarmError::Inconsistency(
        InconsistencyReport::new(
            action,
            "maps",
            pending,
            vec![format!("{pending}/{id}")],
            e.to_string(),
        )
        .logged(),
    )
}
