//! Tile actions expressed as (precondition, change) pairs.
//!
//! The same precondition is evaluated twice: once when a batch is scanned and
//! once more by the store at write time, as the filter of a conditional
//! update. A tile whose state moved on between the two is simply not matched.

use chrono::{DateTime, Utc};

use super::crop::{CropState, CropType};
use super::game_rules::GameRules;
use super::tile::{Tile, TileCoord, TileType};

/// A batched player action against map tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileAction {
    PlantCrop { crop_type: CropType },
    HarvestCrop,
    ClearRubble,
    SpeedGrow,
    LeaseTile,
    PayRent,
}

impl TileAction {
    /// Wire name of the action.
    pub fn name(&self) -> &'static str {
        match self {
            TileAction::PlantCrop { .. } => "plant_crop",
            TileAction::HarvestCrop => "harvest_crop",
            TileAction::ClearRubble => "clear_rubble",
            TileAction::SpeedGrow => "speed_grow",
            TileAction::LeaseTile => "lease_tile",
            TileAction::PayRent => "pay_rent",
        }
    }

    pub fn precondition(&self, now: DateTime<Utc>) -> TilePrecondition {
        match self {
            TileAction::PlantCrop { .. } => TilePrecondition::Tilled,
            TileAction::HarvestCrop => TilePrecondition::CropReady { now },
            TileAction::ClearRubble => TilePrecondition::Rubble,
            TileAction::SpeedGrow => TilePrecondition::CropGrowing { now },
            TileAction::LeaseTile => TilePrecondition::Leasable,
            TileAction::PayRent => TilePrecondition::RentDue { now },
        }
    }

    pub fn change(&self, now: DateTime<Utc>, rules: &GameRules) -> TileChange {
        match self {
            TileAction::PlantCrop { crop_type } => {
                TileChange::PlantCrop(CropState::planted(*crop_type, now))
            }
            TileAction::HarvestCrop => TileChange::ClearCrop,
            TileAction::ClearRubble => TileChange::SetTileType(TileType::Dirt),
            TileAction::SpeedGrow => TileChange::RipenAt(now),
            TileAction::LeaseTile => TileChange::Lease {
                next_rent_due: now + rules.lease_duration,
            },
            TileAction::PayRent => TileChange::AdvanceRent {
                next_rent_due: now + rules.lease_duration,
            },
        }
    }
}

/// Condition a tile must satisfy for an action to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TilePrecondition {
    /// Dirt tile with nothing planted.
    Tilled,
    /// A crop whose `ready_at` has passed.
    CropReady { now: DateTime<Utc> },
    /// A crop whose `ready_at` is still in the future.
    CropGrowing { now: DateTime<Utc> },
    Rubble,
    Leasable,
    /// Leased (not leasable) with `next_rent_due <= now`.
    RentDue { now: DateTime<Utc> },
}

/// Mutation applied to a tile that matched its precondition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TileChange {
    PlantCrop(CropState),
    ClearCrop,
    SetTileType(TileType),
    RipenAt(DateTime<Utc>),
    Lease { next_rent_due: DateTime<Utc> },
    AdvanceRent { next_rent_due: DateTime<Utc> },
}

/// One optimistic-concurrency tile update: filter + mutation for a coordinate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionalTileUpdate {
    pub coord: TileCoord,
    pub precondition: TilePrecondition,
    pub change: TileChange,
}

impl ConditionalTileUpdate {
    /// Re-check the precondition and apply the change. Returns whether the tile changed.
    pub fn apply_to(&self, tile: &mut Tile) -> bool {
        if !tile.satisfies(&self.precondition) {
            return false;
        }
        tile.apply(&self.change);
        true
    }
}

impl Tile {
    pub fn satisfies(&self, precondition: &TilePrecondition) -> bool {
        match precondition {
            TilePrecondition::Tilled => self.tile_type == TileType::Dirt && self.crop.is_none(),
            TilePrecondition::CropReady { now } => {
                self.crop.as_ref().is_some_and(|crop| crop.ready_at <= *now)
            }
            TilePrecondition::CropGrowing { now } => {
                self.crop.as_ref().is_some_and(|crop| crop.ready_at > *now)
            }
            TilePrecondition::Rubble => self.tile_type == TileType::Rubble,
            TilePrecondition::Leasable => self.properties.leasable,
            TilePrecondition::RentDue { now } => {
                !self.properties.leasable
                    && self
                        .properties
                        .next_rent_due
                        .is_some_and(|due| due <= *now)
            }
        }
    }

    pub fn apply(&mut self, change: &TileChange) {
        match change {
            TileChange::PlantCrop(crop) => self.crop = Some(crop.clone()),
            TileChange::ClearCrop => self.crop = None,
            TileChange::SetTileType(tile_type) => self.tile_type = *tile_type,
            TileChange::RipenAt(at) => {
                if let Some(crop) = self.crop.as_mut() {
                    crop.ready_at = *at;
                }
            }
            TileChange::Lease { next_rent_due } => {
                self.properties.leasable = false;
                self.properties.next_rent_due = Some(*next_rent_due);
            }
            TileChange::AdvanceRent { next_rent_due } => {
                self.properties.next_rent_due = Some(*next_rent_due);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn rent_due_requires_leased_and_past_due() {
        let now = now();
        let pre = TilePrecondition::RentDue { now };

        let overdue = Tile::new(TileType::Grass).with_rent_due(now - Duration::hours(1));
        assert!(overdue.satisfies(&pre));

        let not_yet = Tile::new(TileType::Grass).with_rent_due(now + Duration::hours(1));
        assert!(!not_yet.satisfies(&pre));

        let never_leased = Tile::new(TileType::Grass);
        assert!(!never_leased.satisfies(&pre));

        let available = Tile::new(TileType::Grass).leasable();
        assert!(!available.satisfies(&pre));
    }

    #[test]
    fn second_application_of_same_update_is_a_no_op() {
        let now = now();
        let rules = GameRules::default();
        let action = TileAction::PayRent;
        let update = ConditionalTileUpdate {
            coord: TileCoord::new(2, 3),
            precondition: action.precondition(now),
            change: action.change(now, &rules),
        };

        let mut tile = Tile::new(TileType::Grass).with_rent_due(now - Duration::hours(1));
        assert!(update.apply_to(&mut tile));
        assert_eq!(
            tile.properties.next_rent_due,
            Some(now + rules.lease_duration)
        );
        assert!(!update.apply_to(&mut tile));
        assert_eq!(
            tile.properties.next_rent_due,
            Some(now + rules.lease_duration)
        );
    }

    #[test]
    fn planting_needs_bare_dirt() {
        let now = now();
        let action = TileAction::PlantCrop {
            crop_type: CropType::Wheat,
        };
        let pre = action.precondition(now);

        assert!(Tile::new(TileType::Dirt).satisfies(&pre));
        assert!(!Tile::new(TileType::Grass).satisfies(&pre));
        let planted = Tile::new(TileType::Dirt).with_crop(CropState::planted(CropType::Carrot, now));
        assert!(!planted.satisfies(&pre));
    }

    #[test]
    fn speed_grow_then_harvest() {
        let now = now();
        let rules = GameRules::default();
        let mut tile =
            Tile::new(TileType::Dirt).with_crop(CropState::planted(CropType::Pumpkin, now));

        assert!(!tile.satisfies(&TileAction::HarvestCrop.precondition(now)));
        assert!(tile.satisfies(&TileAction::SpeedGrow.precondition(now)));

        tile.apply(&TileAction::SpeedGrow.change(now, &rules));
        assert!(tile.satisfies(&TileAction::HarvestCrop.precondition(now)));

        tile.apply(&TileAction::HarvestCrop.change(now, &rules));
        assert!(tile.crop.is_none());
    }

    #[test]
    fn leasing_sets_first_rent_due() {
        let now = now();
        let rules = GameRules::default();
        let mut tile = Tile::new(TileType::Grass).leasable();
        tile.apply(&TileAction::LeaseTile.change(now, &rules));
        assert!(!tile.properties.leasable);
        assert_eq!(
            tile.properties.next_rent_due,
            Some(now + rules.lease_duration)
        );
    }
}
