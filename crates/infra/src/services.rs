//! Asset and inventory CRUD, with an audit entry per mutation.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde_json::{Value as JsonValue, json};

use assetdesk_activity::ActivityAction;
use assetdesk_assets::{Asset, AssetPatch, NewAsset};
use assetdesk_core::{AssetId, Entity, InventoryItemId, Pagination};
use assetdesk_inventory::{InventoryItem, InventoryItemPatch, NewInventoryItem};

use crate::audit::{Actor, AuditLogger};
use crate::error::StoreResult;
use crate::store::{AssetFilter, AssetStore, InventoryFilter, InventoryStore};

#[derive(Clone)]
pub struct AssetService {
    store: Arc<dyn AssetStore>,
    audit: AuditLogger,
}

impl AssetService {
    pub fn new(store: Arc<dyn AssetStore>, audit: AuditLogger) -> Self {
        Self { store, audit }
    }

    pub async fn list(&self, filter: &AssetFilter, page: Pagination) -> StoreResult<Vec<Asset>> {
        self.store.list_assets(filter, page).await
    }

    pub async fn get(&self, id: AssetId) -> StoreResult<Asset> {
        self.store.get_asset(id).await
    }

    pub async fn create(&self, new: NewAsset, actor: &Actor) -> StoreResult<Asset> {
        let asset = Asset::create(AssetId::new(), new, Utc::now())?;
        self.store.insert_asset(&asset).await?;
        tracing::info!(asset_id = %asset.id, key = asset.display_key(), "asset created");

        self.audit
            .record(
                actor,
                ActivityAction::AssetCreate,
                *asset.id.as_uuid(),
                Some(json!({
                    "assetTag": asset.asset_tag,
                    "name": asset.name,
                    "type": asset.asset_type,
                    "status": asset.status,
                })),
            )
            .await;
        Ok(asset)
    }

    pub async fn update(&self, id: AssetId, patch: AssetPatch, actor: &Actor) -> StoreResult<Asset> {
        let changes = changed_fields(&patch);
        let asset = self.store.update_asset(id, patch, Utc::now()).await?;

        self.audit
            .record(
                actor,
                ActivityAction::AssetUpdate,
                *asset.id.as_uuid(),
                Some(json!({ "assetTag": asset.asset_tag, "changes": changes })),
            )
            .await;
        Ok(asset)
    }

    pub async fn delete(&self, id: AssetId, actor: &Actor) -> StoreResult<Asset> {
        let asset = self.store.delete_asset(id).await?;
        tracing::info!(asset_id = %asset.id, key = asset.display_key(), "asset deleted");

        self.audit
            .record(
                actor,
                ActivityAction::AssetDelete,
                *asset.id.as_uuid(),
                Some(json!({ "assetTag": asset.asset_tag, "name": asset.name })),
            )
            .await;
        Ok(asset)
    }
}

#[derive(Clone)]
pub struct InventoryService {
    store: Arc<dyn InventoryStore>,
    audit: AuditLogger,
}

impl InventoryService {
    pub fn new(store: Arc<dyn InventoryStore>, audit: AuditLogger) -> Self {
        Self { store, audit }
    }

    pub async fn list(&self, filter: &InventoryFilter, page: Pagination) -> StoreResult<Vec<InventoryItem>> {
        self.store.list_items(filter, page).await
    }

    pub async fn get(&self, id: InventoryItemId) -> StoreResult<InventoryItem> {
        self.store.get_item(id).await
    }

    /// Create an item. The initial `stock` is taken as-is; later changes go
    /// through the Ledger Writer.
    pub async fn create(&self, new: NewInventoryItem, actor: &Actor) -> StoreResult<InventoryItem> {
        let item = InventoryItem::create(InventoryItemId::new(), new, Utc::now())?;
        self.store.insert_item(&item).await?;
        tracing::info!(item_id = %item.id, sku = %item.sku, stock = item.stock, "inventory item created");

        self.audit
            .record(
                actor,
                ActivityAction::InventoryCreate,
                *item.id.as_uuid(),
                Some(json!({
                    "sku": item.sku,
                    "name": item.name,
                    "category": item.category,
                    "stock": item.stock,
                    "minStock": item.min_stock,
                })),
            )
            .await;
        Ok(item)
    }

    pub async fn update(&self, id: InventoryItemId, patch: InventoryItemPatch, actor: &Actor) -> StoreResult<InventoryItem> {
        let changes = changed_fields(&patch);
        let item = self.store.update_item(id, patch, Utc::now()).await?;

        self.audit
            .record(
                actor,
                ActivityAction::InventoryUpdate,
                *item.id.as_uuid(),
                Some(json!({ "sku": item.sku, "changes": changes })),
            )
            .await;
        Ok(item)
    }

    /// Delete an item together with its movement history.
    pub async fn delete(&self, id: InventoryItemId, actor: &Actor) -> StoreResult<InventoryItem> {
        let item = self.store.delete_item(id).await?;
        tracing::info!(item_id = %item.id, key = item.display_key(), "inventory item deleted");

        self.audit
            .record(
                actor,
                ActivityAction::InventoryDelete,
                *item.id.as_uuid(),
                Some(json!({ "sku": item.sku, "name": item.name, "stock": item.stock })),
            )
            .await;
        Ok(item)
    }
}

/// The fields a patch actually sets, for audit metadata.
fn changed_fields<P: Serialize>(patch: &P) -> JsonValue {
    match serde_json::to_value(patch) {
        Ok(JsonValue::Object(mut fields)) => {
            fields.retain(|_, v| !v.is_null());
            JsonValue::Object(fields)
        }
        _ => JsonValue::Null,
    }
}
