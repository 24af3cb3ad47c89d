//! End-to-end flows across use cases, run against the in-memory stores.

use std::sync::Arc;

use chrono::Duration;
use farmstead_domain::{GameRules, Tile, TileCoord, TileType};

use crate::infrastructure::clock::FixedClock;
use crate::infrastructure::ports::{
    CharacterLinkRepo, CharacterRepo, InventoryRepo, MapRepo, StatusLogRepo,
};
use crate::test_fixtures::{
    create_character, fixed_now, link_count, seed_character, seed_map, seed_user, MemoryStores,
};
use crate::use_cases::economy::{EconomyError, InventoryOps, WalletOps};
use crate::use_cases::lifecycle::{LifecycleError, RemoveCharacter, SetCharacterFavorite};
use crate::use_cases::tiles::MapTileEngine;

#[tokio::test]
async fn second_character_with_same_name_is_rejected() {
    let stores = MemoryStores::default();
    let alice = seed_user(&stores, "alice").await;
    let create = create_character(&stores, Arc::new(FixedClock::new(fixed_now())));

    create.execute("alice", Some("Bo".to_string())).await.unwrap();
    let second = create.execute("alice", Some("Bo".to_string())).await;

    assert!(matches!(second, Err(LifecycleError::DuplicateName(_))));
    assert_eq!(link_count(&stores, &alice).await, 1);
}

#[tokio::test]
async fn created_link_resolves_all_documents() {
    let stores = MemoryStores::default();
    let created = seed_character(&stores, "alice").await;

    assert!(stores.characters.get(created.link.character_id).await.unwrap().is_some());
    assert!(stores.inventories.get(created.link.inventory_id).await.unwrap().is_some());
    assert!(stores.wallets.balance(created.link.wallet_id).is_some());
    assert!(stores.status_logs.get(created.link.status_log_id).await.unwrap().is_some());
}

#[tokio::test]
async fn overdrawn_transaction_keeps_balance() {
    let stores = MemoryStores::default();
    let created = seed_character(&stores, "alice").await;
    let wallets = WalletOps::new(stores.wallets.clone(), stores.links.clone());

    wallets.process_transaction(created.wallet.id, 90).await.unwrap();
    let result = wallets.process_transaction(created.wallet.id, 15).await;

    assert!(matches!(result, Err(EconomyError::Insufficient { .. })));
    assert_eq!(stores.wallets.balance(created.wallet.id), Some(10));
}

#[tokio::test]
async fn pay_rent_for_map_advances_one_lease_period() {
    let stores = MemoryStores::default();
    let created = seed_character(&stores, "alice").await;
    let coord = TileCoord::new(2, 3);
    let overdue = Tile::new(TileType::Grass).with_rent_due(fixed_now() - Duration::hours(1));
    let map = seed_map(&stores, created.character.id, &[(coord, overdue)]).await;
    let rules = GameRules::default();
    let engine = MapTileEngine::new(
        stores.maps.clone(),
        Arc::new(FixedClock::new(fixed_now())),
        Arc::new(rules.clone()),
    );

    let first = engine.pay_rent_for_map(map.id).await.unwrap();
    let second = engine.pay_rent_for_map(map.id).await.unwrap();

    assert_eq!(first.total_cost, rules.cost_to_rent_tile);
    assert_eq!(first.updated_tile_count, 1);
    assert_eq!(second.updated_tile_count, 0);
    assert_eq!(
        stores.maps.tile(map.id, coord).unwrap().properties.next_rent_due,
        Some(fixed_now() + rules.lease_duration)
    );
}

#[tokio::test]
async fn removing_someone_elses_character_changes_nothing() {
    let stores = MemoryStores::default();
    let created = seed_character(&stores, "alice").await;
    let mallory = seed_user(&stores, "mallory").await;
    seed_map(&stores, created.character.id, &[]).await;

    let remove = RemoveCharacter::new(stores.links.clone(), stores.documents());
    let result = remove.execute(mallory.id, created.character.id).await;

    assert!(matches!(result, Err(LifecycleError::CharacterNotFound(_))));
    assert_eq!(stores.characters.len(), 1);
    assert_eq!(
        stores.maps.list_for_character(created.character.id).await.unwrap().len(),
        1
    );
}

#[tokio::test]
async fn removal_deletes_link_and_documents() {
    let stores = MemoryStores::default();
    let created = seed_character(&stores, "alice").await;
    seed_map(&stores, created.character.id, &[]).await;

    RemoveCharacter::new(stores.links.clone(), stores.documents())
        .execute(created.link.user_id, created.character.id)
        .await
        .unwrap();

    assert_eq!(stores.characters.len(), 0);
    assert!(stores.wallets.balance(created.wallet.id).is_none());
    assert!(stores
        .maps
        .list_for_character(created.character.id)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn failed_wallet_delete_still_removes_link() {
    let stores = MemoryStores::default();
    let created = seed_character(&stores, "alice").await;
    stores.wallets.fail_deletes();

    let result = RemoveCharacter::new(stores.links.clone(), stores.documents())
        .execute(created.link.user_id, created.character.id)
        .await;

    match result {
        Err(LifecycleError::Inconsistency(report)) => {
            assert_eq!(report.records, vec![format!("wallets/{}", created.wallet.id)]);
        }
        other => panic!("expected inconsistency, got {other:?}"),
    }
    assert!(stores
        .links
        .get_by_character(created.character.id)
        .await
        .unwrap()
        .is_none());
    assert_eq!(stores.characters.len(), 0);
    assert_eq!(stores.wallets.balance(created.wallet.id), Some(100));

    let retry = RemoveCharacter::new(stores.links.clone(), stores.documents())
        .execute(created.link.user_id, created.character.id)
        .await;
    assert!(matches!(retry, Err(LifecycleError::CharacterNotFound(_))));
}

#[tokio::test]
async fn at_most_one_favorite_character() {
    let stores = MemoryStores::default();
    let alice = seed_user(&stores, "alice").await;
    let create = create_character(&stores, Arc::new(FixedClock::new(fixed_now())));
    let mut ids = Vec::new();
    for name in ["Ada", "Bea", "Cy"] {
        ids.push(create.execute("alice", Some(name.to_string())).await.unwrap().character.id);
    }
    let favorite = SetCharacterFavorite::new(stores.links.clone(), stores.characters.clone());

    for (id, value) in [(ids[0], true), (ids[1], true), (ids[2], false), (ids[2], true), (ids[2], false)] {
        favorite.execute(alice.id, id, value).await.unwrap();
        assert!(stores.characters.favorites_of(alice.id).len() <= 1);
    }
    favorite.execute(alice.id, ids[1], true).await.unwrap();
    assert_eq!(stores.characters.favorites_of(alice.id), vec![ids[1]]);
}

#[tokio::test]
async fn inventory_stacks_stay_unique_and_keep_zero_placeholders() {
    let stores = MemoryStores::default();
    let created = seed_character(&stores, "alice").await;
    let inventory_id = created.inventory.id;
    let ops = InventoryOps::new(stores.inventories.clone());

    ops.add_item(inventory_id, "crop", "carrot", 2).await.unwrap();
    ops.add_item(inventory_id, "crop", "carrot", 3).await.unwrap();
    ops.deduct_item(inventory_id, "seed", "carrot", 10).await.unwrap();
    let short = ops.deduct_item(inventory_id, "seed", "carrot", 1).await;

    assert!(matches!(short, Err(EconomyError::Insufficient { .. })));
    let inventory = stores.inventories.get(inventory_id).await.unwrap().unwrap();
    let carrots: Vec<_> = inventory
        .items()
        .iter()
        .filter(|s| s.is("crop", "carrot"))
        .collect();
    assert_eq!(carrots.len(), 1);
    assert_eq!(carrots[0].quantity, 5);
    assert_eq!(inventory.quantity_of("seed", "carrot"), 0);
    assert!(inventory.items().iter().any(|s| s.is("seed", "carrot")));
}
