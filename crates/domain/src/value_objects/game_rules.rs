//! Tunable game constants.

use chrono::Duration;

use super::tile_ops::TileAction;

/// Costs, durations and starting resources used by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameRules {
    pub starting_coins: u64,
    /// (item type, item name, quantity) given to every new character.
    pub starting_item: (String, String, u32),
    pub name_generation_attempts: u32,
    pub map_width: u32,
    pub map_height: u32,
    pub lease_duration: Duration,
    pub cost_to_lease_tile: u64,
    pub cost_to_rent_tile: u64,
    pub cost_to_clear_rubble: u64,
    pub cost_to_speed_grow: u64,
    pub seeds_per_tile: u32,
    pub harvest_yield: u32,
    pub harvest_experience: u64,
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            starting_coins: 100,
            starting_item: ("seed".to_string(), "carrot".to_string(), 10),
            name_generation_attempts: 5,
            map_width: 16,
            map_height: 16,
            lease_duration: Duration::days(7),
            cost_to_lease_tile: 50,
            cost_to_rent_tile: 25,
            cost_to_clear_rubble: 10,
            cost_to_speed_grow: 5,
            seeds_per_tile: 1,
            harvest_yield: 1,
            harvest_experience: 10,
        }
    }
}

impl GameRules {
    /// Coin cost charged per tile for an action. Planting and harvesting are
    /// paid in items, not coins.
    pub fn unit_cost(&self, action: &TileAction) -> u64 {
        match action {
            TileAction::PlantCrop { .. } | TileAction::HarvestCrop => 0,
            TileAction::ClearRubble => self.cost_to_clear_rubble,
            TileAction::SpeedGrow => self.cost_to_speed_grow,
            TileAction::LeaseTile => self.cost_to_lease_tile,
            TileAction::PayRent => self.cost_to_rent_tile,
        }
    }
}
