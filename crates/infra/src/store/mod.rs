//! Storage traits and the two backends implementing them.
//!
//! Every backend implements the same contracts; [`InMemoryStore`] is used for
//! dev/tests and [`PostgresStore`] in production.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use assetdesk_activity::{ActivityFilter, ActivityLog, NewActivityLog};
use assetdesk_assets::{Asset, AssetPatch, AssetStatus, AssetType};
use assetdesk_core::{AssetId, InventoryItemId, Pagination};
use assetdesk_inventory::{InventoryCategory, InventoryItem, InventoryItemPatch, Movement, StockMove};

use crate::dashboard::DashboardSummary;
use crate::error::StoreResult;

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryStore;
pub use postgres::PostgresStore;

/// Asset list filters. `None` means "any".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetFilter {
    /// Case-insensitive substring over tag, name, serial and assignee.
    pub search: Option<String>,
    pub status: Option<AssetStatus>,
    #[serde(rename = "type")]
    pub asset_type: Option<AssetType>,
    /// Case-insensitive exact location.
    pub location: Option<String>,
}

impl AssetFilter {
    pub fn matches(&self, asset: &Asset) -> bool {
        self.search.as_deref().is_none_or(|s| asset.matches_search(s))
            && self.status.is_none_or(|s| s == asset.status)
            && self.asset_type.is_none_or(|t| t == asset.asset_type)
            && self
                .location
                .as_deref()
                .is_none_or(|l| asset.location.as_deref().is_some_and(|al| al.eq_ignore_ascii_case(l)))
    }
}

/// Inventory list filters. `None` means "any".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryFilter {
    /// Case-insensitive substring over sku and name.
    pub search: Option<String>,
    pub category: Option<InventoryCategory>,
    pub location: Option<String>,
    /// Only items with `stock < min_stock`.
    #[serde(default)]
    pub low_stock: bool,
}

impl InventoryFilter {
    pub fn matches(&self, item: &InventoryItem) -> bool {
        let search_hit = |needle: &str| {
            let needle = needle.to_lowercase();
            item.sku.to_lowercase().contains(&needle) || item.name.to_lowercase().contains(&needle)
        };
        self.search.as_deref().is_none_or(search_hit)
            && self.category.is_none_or(|c| c == item.category)
            && self
                .location
                .as_deref()
                .is_none_or(|l| item.location.as_deref().is_some_and(|il| il.eq_ignore_ascii_case(l)))
            && (!self.low_stock || item.is_low_stock())
    }
}

/// Result of a committed stock movement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovementOutcome {
    pub movement: Movement,
    /// The item with its new stock level.
    pub item: InventoryItem,
    pub stock_before: i64,
}

/// A movement as shown in history views, enriched with the linked asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementView {
    #[serde(flatten)]
    pub movement: Movement,
    pub target_asset_tag: Option<String>,
    pub target_asset_name: Option<String>,
}

#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Newest first.
    async fn list_assets(&self, filter: &AssetFilter, page: Pagination) -> StoreResult<Vec<Asset>>;

    async fn get_asset(&self, id: AssetId) -> StoreResult<Asset>;

    /// Fails with `Conflict` on a duplicate tag or serial.
    async fn insert_asset(&self, asset: &Asset) -> StoreResult<()>;

    /// Apply `patch` to the current row (last writer wins).
    async fn update_asset(&self, id: AssetId, patch: AssetPatch, now: DateTime<Utc>) -> StoreResult<Asset>;

    /// Returns the deleted row. Linked movements keep their history with the
    /// link cleared.
    async fn delete_asset(&self, id: AssetId) -> StoreResult<Asset>;
}

#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// Ordered by name.
    async fn list_items(&self, filter: &InventoryFilter, page: Pagination) -> StoreResult<Vec<InventoryItem>>;

    async fn get_item(&self, id: InventoryItemId) -> StoreResult<InventoryItem>;

    /// Fails with `Conflict` on a duplicate sku.
    async fn insert_item(&self, item: &InventoryItem) -> StoreResult<()>;

    /// Apply `patch` to the current row. Never touches `stock`.
    async fn update_item(
        &self,
        id: InventoryItemId,
        patch: InventoryItemPatch,
        now: DateTime<Utc>,
    ) -> StoreResult<InventoryItem>;

    /// Returns the deleted row. Its movement history is deleted with it.
    async fn delete_item(&self, id: InventoryItemId) -> StoreResult<InventoryItem>;

    /// Atomically compute the new stock, write it, and append the movement.
    ///
    /// Movements on the same item are serialized; a caller that loses the race
    /// sees the winner's committed stock. Nothing is written on error.
    async fn apply_movement(
        &self,
        item_id: InventoryItemId,
        movement: &StockMove,
        actor: &str,
    ) -> StoreResult<MovementOutcome>;

    /// Newest first by ledger position (`id DESC`), which is the order the
    /// movements were applied. `NotFound` if the item does not exist.
    async fn list_movements(&self, item_id: InventoryItemId, page: Pagination) -> StoreResult<Vec<MovementView>>;
}

/// Append-only audit storage.
#[async_trait]
pub trait ActivityStore: Send + Sync {
    async fn append_activity(&self, entry: NewActivityLog) -> StoreResult<ActivityLog>;

    /// Ordered `created_at DESC, id DESC`.
    async fn list_activity(&self, filter: &ActivityFilter, page: Pagination) -> StoreResult<Vec<ActivityLog>>;
}

#[async_trait]
pub trait DashboardQuery: Send + Sync {
    async fn summary(&self) -> StoreResult<DashboardSummary>;
}
