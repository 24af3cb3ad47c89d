//! Shared test helpers: in-memory stores, fixed clocks and seeded records.

pub mod memory_stores;

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use farmstead_domain::{CharacterId, GameMap, MapNickname, Tile, TileCoord, TileType, User};

pub use memory_stores::MemoryStores;

use crate::infrastructure::clock::{FixedClock, FixedRandom};
use crate::infrastructure::ports::{CharacterLinkRepo, MapRepo, UserRepo};
use crate::use_cases::lifecycle::{CreateCharacter, CreatedCharacter};
use farmstead_domain::GameRules;

pub fn fixed_now() -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000, 0).unwrap()
}

/// Insert a user and return it.
pub async fn seed_user(stores: &MemoryStores, username: &str) -> User {
    let user = User::new(username, format!("{username}@example.com"), fixed_now());
    stores.users.create(&user).await.unwrap();
    user
}

/// Create-character use case wired to the fakes.
pub fn create_character(stores: &MemoryStores, clock: Arc<FixedClock>) -> CreateCharacter {
    CreateCharacter::new(
        stores.users.clone(),
        stores.links.clone(),
        stores.documents(),
        clock,
        Arc::new(FixedRandom(0)),
        Arc::new(GameRules::default()),
    )
}

/// Seed a user with one character through the real creation saga.
pub async fn seed_character(stores: &MemoryStores, username: &str) -> CreatedCharacter {
    seed_user(stores, username).await;
    create_character(stores, Arc::new(FixedClock::new(fixed_now())))
        .execute(username, Some(format!("{username} farmer")))
        .await
        .unwrap()
}

/// Insert a small map whose tiles are all bare dirt, then apply `layout`.
pub async fn seed_map(
    stores: &MemoryStores,
    character_id: CharacterId,
    layout: &[(TileCoord, Tile)],
) -> GameMap {
    let mut map = GameMap::generate(
        character_id,
        MapNickname::new("Test Farm").unwrap(),
        6,
        6,
        fixed_now(),
        || false,
    );
    for tile in map.tiles.values_mut() {
        *tile = Tile::new(TileType::Dirt);
    }
    for (coord, tile) in layout {
        map.tiles.insert(*coord, tile.clone());
    }
    stores.maps.insert(&map).await.unwrap();
    map
}

/// Link lookup for assertions.
pub async fn link_count(stores: &MemoryStores, user: &User) -> usize {
    stores.links.list_for_user(user.id).await.unwrap().len()
}
