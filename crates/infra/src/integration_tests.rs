//! Integration tests for the ledger pipeline on the in-memory backend.
//!
//! Tests: request → LedgerWriter → InventoryStore → AuditLogger → ActivityStore
//!
//! Verifies:
//! - stock never goes negative and rejected movements write nothing
//! - concurrent movements on one item serialize
//! - linked movements produce one audit entry per entity
//! - history and activity views are newest-first and filterable

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use assetdesk_activity::{ActivityAction, ActivityFilter, EntityType};
    use assetdesk_assets::{AssetStatus, AssetType, NewAsset};
    use assetdesk_core::{AssetId, DomainError, InventoryItemId, Pagination};
    use assetdesk_inventory::{InventoryCategory, InventoryItem, MovementType, NewInventoryItem};

    use crate::audit::{Actor, AuditLogger};
    use crate::error::StoreError;
    use crate::ledger::{LedgerWriter, MoveRequest};
    use crate::services::{AssetService, InventoryService};
    use crate::store::{DashboardQuery, InMemoryStore, InventoryStore};

    struct Harness {
        store: Arc<InMemoryStore>,
        assets: AssetService,
        inventory: InventoryService,
        ledger: LedgerWriter,
        audit: AuditLogger,
        admin: Actor,
    }

    fn setup() -> Harness {
        let store = Arc::new(InMemoryStore::new());
        let audit = AuditLogger::new(store.clone());
        Harness {
            assets: AssetService::new(store.clone(), audit.clone()),
            inventory: InventoryService::new(store.clone(), audit.clone()),
            ledger: LedgerWriter::new(store.clone(), audit.clone()),
            audit,
            store,
            admin: Actor::new("admin", None),
        }
    }

    fn new_item(sku: &str, stock: i64) -> NewInventoryItem {
        NewInventoryItem {
            sku: sku.to_string(),
            name: format!("{sku} item"),
            category: InventoryCategory::Storage,
            unit: Some("pcs".to_string()),
            location: Some("HQ".to_string()),
            stock,
            min_stock: 2,
            notes: None,
        }
    }

    fn new_asset(tag: &str) -> NewAsset {
        NewAsset {
            asset_tag: tag.to_string(),
            name: format!("{tag} laptop"),
            asset_type: AssetType::Laptop,
            status: AssetStatus::InUse,
            brand: None,
            model: None,
            serial_number: None,
            assigned_to: Some("jdoe".to_string()),
            location: None,
            purchase_date: None,
            warranty_end: None,
            notes: None,
        }
    }

    fn mv(kind: &str, qty: i64) -> MoveRequest {
        MoveRequest {
            movement_type: kind.to_string(),
            qty,
            reference: None,
            target_asset_id: None,
        }
    }

    async fn item(h: &Harness, sku: &str, stock: i64) -> InventoryItem {
        h.inventory.create(new_item(sku, stock), &h.admin).await.unwrap()
    }

    #[tokio::test]
    async fn in_and_out_update_stock_and_append_movements() {
        let h = setup();
        let it = item(&h, "SSD", 10).await;

        let out = h.ledger.apply_movement(it.id, mv("IN", 5), &h.admin).await.unwrap();
        assert_eq!(out.stock_before, 10);
        assert_eq!(out.item.stock, 15);

        let out = h.ledger.apply_movement(it.id, mv("out", 4), &h.admin).await.unwrap();
        assert_eq!(out.item.stock, 11);
        assert_eq!(out.movement.created_by, "admin");

        let history = h.ledger.history(it.id, Pagination::default()).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].movement.movement_type, MovementType::Out);
        assert_eq!(history[1].movement.movement_type, MovementType::In);
    }

    #[tokio::test]
    async fn out_beyond_stock_is_rejected_without_side_effects() {
        let h = setup();
        let it = item(&h, "RAM", 10).await;

        let err = h.ledger.apply_movement(it.id, mv("OUT", 11), &h.admin).await.unwrap_err();
        assert!(matches!(err, StoreError::Domain(DomainError::InvalidState(_))));

        assert_eq!(h.inventory.get(it.id).await.unwrap().stock, 10);
        assert!(h.ledger.history(it.id, Pagination::default()).await.unwrap().is_empty());

        let moves = h
            .audit
            .list(
                &ActivityFilter {
                    entity_type: Some(EntityType::Inventory),
                    entity_id: Some(*it.id.as_uuid()),
                    ..Default::default()
                },
                Pagination::default(),
            )
            .await
            .unwrap()
            .into_iter()
            .filter(|l| l.action == ActivityAction::InventoryMove)
            .count();
        assert_eq!(moves, 0);
    }

    #[tokio::test]
    async fn invalid_requests_fail_before_storage() {
        let h = setup();
        let it = item(&h, "NIC", 3).await;

        for req in [mv("TRANSFER", 1), mv("IN", 0), mv("OUT", -2), mv("ADJUST", 0)] {
            let err = h.ledger.apply_movement(it.id, req, &h.admin).await.unwrap_err();
            assert!(matches!(err, StoreError::Domain(DomainError::InvalidInput(_))));
        }

        // Validation precedes the item lookup.
        let err = h
            .ledger
            .apply_movement(InventoryItemId::new(), mv("IN", 0), &h.admin)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Domain(DomainError::InvalidInput(_))));

        let err = h
            .ledger
            .apply_movement(InventoryItemId::new(), mv("IN", 1), &h.admin)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Domain(DomainError::NotFound(_))));
    }

    #[tokio::test]
    async fn adjust_twice_is_idempotent_but_recorded_twice() {
        let h = setup();
        let it = item(&h, "CABLE", 40).await;

        for _ in 0..2 {
            let out = h.ledger.apply_movement(it.id, mv("ADJUST", 5), &h.admin).await.unwrap();
            assert_eq!(out.item.stock, 5);
        }
        assert_eq!(h.ledger.history(it.id, Pagination::default()).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn history_replays_to_current_stock() {
        let h = setup();
        let it = item(&h, "NVME", 10).await;

        for (kind, qty) in [("IN", 5), ("ADJUST", 5), ("OUT", 1), ("IN", 3), ("OUT", 2)] {
            h.ledger.apply_movement(it.id, mv(kind, qty), &h.admin).await.unwrap();
        }

        let history = h.ledger.history(it.id, Pagination::default()).await.unwrap();
        let applied = history
            .iter()
            .rev()
            .map(|v| (v.movement.movement_type, v.movement.qty))
            .collect::<Vec<_>>();
        let current = h.inventory.get(it.id).await.unwrap().stock;
        assert_eq!(current, 5);
        assert_eq!(assetdesk_inventory::replay(10, &applied).unwrap(), current);
        assert!(history.windows(2).all(|w| w[0].movement.id > w[1].movement.id));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_outs_serialize() {
        let h = setup();
        let it = item(&h, "HDD", 10).await;

        let a = {
            let ledger = h.ledger.clone();
            let actor = h.admin.clone();
            tokio::spawn(async move { ledger.apply_movement(it.id, mv("OUT", 6), &actor).await })
        };
        let b = {
            let ledger = h.ledger.clone();
            let actor = h.admin.clone();
            tokio::spawn(async move { ledger.apply_movement(it.id, mv("OUT", 7), &actor).await })
        };
        let results = [a.await.unwrap(), b.await.unwrap()];

        let ok = results.iter().filter(|r| r.is_ok()).collect::<Vec<_>>();
        let rejected = results
            .iter()
            .filter(|r| matches!(r, Err(StoreError::Domain(DomainError::InvalidState(_)))))
            .count();
        assert_eq!(ok.len(), 1);
        assert_eq!(rejected, 1);

        let final_stock = h.inventory.get(it.id).await.unwrap().stock;
        assert!(final_stock == 4 || final_stock == 3);
        assert_eq!(h.ledger.history(it.id, Pagination::default()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn linked_out_writes_one_audit_entry_per_entity() {
        let h = setup();
        let it = item(&h, "DOCK", 4).await;
        let asset = h.assets.create(new_asset("LT-100"), &h.admin).await.unwrap();

        let req = MoveRequest {
            reference: Some("TICKET-7".to_string()),
            target_asset_id: Some(asset.id),
            ..mv("OUT", 1)
        };
        h.ledger.apply_movement(it.id, req, &h.admin).await.unwrap();

        let all = h.audit.list(&ActivityFilter::default(), Pagination::default()).await.unwrap();
        let moves = all
            .iter()
            .filter(|l| matches!(l.action, ActivityAction::InventoryMove | ActivityAction::AssetMove))
            .collect::<Vec<_>>();
        assert_eq!(moves.len(), 2);

        let inv = moves.iter().find(|l| l.action == ActivityAction::InventoryMove).unwrap();
        let ast = moves.iter().find(|l| l.action == ActivityAction::AssetMove).unwrap();
        assert_eq!(inv.entity_type, EntityType::Inventory);
        assert_eq!(inv.entity_id, *it.id.as_uuid());
        assert_eq!(ast.entity_type, EntityType::Asset);
        assert_eq!(ast.entity_id, *asset.id.as_uuid());
        for key in ["qty", "ref", "actor"] {
            assert_eq!(inv.meta[key], ast.meta[key], "meta key {key}");
        }
        assert_eq!(inv.meta["stockAfter"], 3);

        let history = h.ledger.history(it.id, Pagination::default()).await.unwrap();
        assert_eq!(history[0].target_asset_tag.as_deref(), Some("LT-100"));
    }

    #[tokio::test]
    async fn missing_target_asset_is_not_found_and_writes_nothing() {
        let h = setup();
        let it = item(&h, "MOUSE", 4).await;

        let req = MoveRequest {
            target_asset_id: Some(AssetId::new()),
            ..mv("OUT", 1)
        };
        let err = h.ledger.apply_movement(it.id, req, &h.admin).await.unwrap_err();
        assert!(matches!(err, StoreError::Domain(DomainError::NotFound(_))));
        assert_eq!(h.inventory.get(it.id).await.unwrap().stock, 4);
    }

    #[tokio::test]
    async fn activity_for_one_asset_is_newest_first() {
        let h = setup();
        let x = h.assets.create(new_asset("LT-1"), &h.admin).await.unwrap();
        let y = h.assets.create(new_asset("LT-2"), &h.admin).await.unwrap();

        let patch = serde_json::from_value(serde_json::json!({ "status": "REPAIR" })).unwrap();
        h.assets.update(x.id, patch, &h.admin).await.unwrap();

        let logs = h
            .audit
            .list(
                &ActivityFilter::for_entity(EntityType::Asset, *x.id.as_uuid()),
                Pagination::default(),
            )
            .await
            .unwrap();
        assert_eq!(logs.len(), 2);
        assert!(logs.iter().all(|l| l.entity_id == *x.id.as_uuid()));
        assert_eq!(logs[0].action, ActivityAction::AssetUpdate);
        assert_eq!(logs[1].action, ActivityAction::AssetCreate);
        assert!(logs[0].id > logs[1].id);
        assert_ne!(logs[0].entity_id, *y.id.as_uuid());
    }

    #[tokio::test]
    async fn deleting_item_cascades_movements_and_asset_delete_clears_links() {
        let h = setup();
        let it = item(&h, "SFP", 5).await;
        let asset = h.assets.create(new_asset("SW-1"), &h.admin).await.unwrap();

        let req = MoveRequest {
            target_asset_id: Some(asset.id),
            ..mv("OUT", 2)
        };
        h.ledger.apply_movement(it.id, req, &h.admin).await.unwrap();

        h.assets.delete(asset.id, &h.admin).await.unwrap();
        let history = h.ledger.history(it.id, Pagination::default()).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].movement.target_asset_id, None);
        assert_eq!(history[0].target_asset_tag, None);

        h.inventory.delete(it.id, &h.admin).await.unwrap();
        let err = h.store.list_movements(it.id, Pagination::default()).await.unwrap_err();
        assert!(matches!(err, StoreError::Domain(DomainError::NotFound(_))));

        // Audit history outlives the entity.
        let logs = h
            .audit
            .list(
                &ActivityFilter::for_entity(EntityType::Inventory, *it.id.as_uuid()),
                Pagination::default(),
            )
            .await
            .unwrap();
        assert_eq!(logs[0].action, ActivityAction::InventoryDelete);
    }

    #[tokio::test]
    async fn duplicate_keys_conflict() {
        let h = setup();
        item(&h, "SKU-1", 0).await;
        let err = h.inventory.create(new_item("SKU-1", 0), &h.admin).await.unwrap_err();
        assert!(matches!(err, StoreError::Domain(DomainError::Conflict(_))));

        let mut a = new_asset("T-1");
        a.serial_number = Some("SN-1".to_string());
        h.assets.create(a, &h.admin).await.unwrap();

        let mut b = new_asset("T-2");
        b.serial_number = Some("SN-1".to_string());
        let err = h.assets.create(b, &h.admin).await.unwrap_err();
        assert!(matches!(err, StoreError::Domain(DomainError::Conflict(_))));

        // Blank serials never collide.
        h.assets.create(new_asset("T-3"), &h.admin).await.unwrap();
        h.assets.create(new_asset("T-4"), &h.admin).await.unwrap();
    }

    #[tokio::test]
    async fn dashboard_reflects_ledger() {
        let h = setup();
        let it = item(&h, "TONER", 3).await;
        h.ledger.apply_movement(it.id, mv("OUT", 2), &h.admin).await.unwrap();

        let summary = h.store.summary().await.unwrap();
        assert_eq!(summary.kpis.total_inventory_qty, 1);
        assert_eq!(summary.kpis.low_stock_items, 1);
        assert_eq!(summary.low_stock_list[0].sku, "TONER");
    }
}
