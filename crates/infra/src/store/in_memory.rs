use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use assetdesk_activity::{ActivityFilter, ActivityLog, NewActivityLog};
use assetdesk_assets::{Asset, AssetPatch};
use assetdesk_core::{ActivityLogId, AssetId, DomainError, InventoryItemId, MovementId, Pagination};
use assetdesk_inventory::{InventoryItem, InventoryItemPatch, Movement, StockMove};

use super::{
    ActivityStore, AssetFilter, AssetStore, DashboardQuery, InventoryFilter, InventoryStore, MovementOutcome,
    MovementView,
};
use crate::dashboard::DashboardSummary;
use crate::error::{StoreError, StoreResult};

#[derive(Debug, Default)]
struct State {
    assets: HashMap<AssetId, Asset>,
    items: HashMap<InventoryItemId, InventoryItem>,
    /// Append order == id order.
    movements: Vec<Movement>,
    activity: Vec<ActivityLog>,
    last_movement_id: i64,
    last_activity_id: i64,
}

impl State {
    fn asset(&self, id: AssetId) -> StoreResult<&Asset> {
        self.assets
            .get(&id)
            .ok_or_else(|| StoreError::not_found(format!("asset {id}")))
    }

    fn item(&self, id: InventoryItemId) -> StoreResult<&InventoryItem> {
        self.items
            .get(&id)
            .ok_or_else(|| StoreError::not_found(format!("inventory item {id}")))
    }

    fn check_asset_unique(&self, asset: &Asset) -> StoreResult<()> {
        for other in self.assets.values().filter(|a| a.id != asset.id) {
            if other.asset_tag == asset.asset_tag {
                return Err(DomainError::conflict("assetTag already exists").into());
            }
            if asset.serial_number.is_some() && other.serial_number == asset.serial_number {
                return Err(DomainError::conflict("serialNumber already exists").into());
            }
        }
        Ok(())
    }

    fn check_item_unique(&self, item: &InventoryItem) -> StoreResult<()> {
        if self.items.values().any(|i| i.id != item.id && i.sku == item.sku) {
            return Err(DomainError::conflict("sku already exists").into());
        }
        Ok(())
    }
}

/// In-memory implementation of every store trait.
///
/// Intended for tests/dev. All writes are serialized behind one lock, which
/// gives the same atomicity and ordering guarantees as the Postgres backend.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, State>> {
        self.state
            .read()
            .map_err(|_| StoreError::internal("lock poisoned"))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, State>> {
        self.state
            .write()
            .map_err(|_| StoreError::internal("lock poisoned"))
    }
}

/// Newest first: `created_at DESC, id DESC`.
fn newest_first<T, K: Ord>(rows: &mut [T], key: impl Fn(&T) -> (DateTime<Utc>, K)) {
    rows.sort_by(|a, b| key(b).cmp(&key(a)));
}

#[async_trait]
impl AssetStore for InMemoryStore {
    async fn list_assets(&self, filter: &AssetFilter, page: Pagination) -> StoreResult<Vec<Asset>> {
        let state = self.read()?;
        let mut rows = state
            .assets
            .values()
            .filter(|a| filter.matches(a))
            .cloned()
            .collect::<Vec<_>>();
        newest_first(&mut rows, |a| (a.created_at, a.asset_tag.clone()));
        Ok(page.slice(&rows))
    }

    async fn get_asset(&self, id: AssetId) -> StoreResult<Asset> {
        self.read()?.asset(id).cloned()
    }

    async fn insert_asset(&self, asset: &Asset) -> StoreResult<()> {
        let mut state = self.write()?;
        state.check_asset_unique(asset)?;
        state.assets.insert(asset.id, asset.clone());
        Ok(())
    }

    async fn update_asset(&self, id: AssetId, patch: AssetPatch, now: DateTime<Utc>) -> StoreResult<Asset> {
        let mut state = self.write()?;
        let mut asset = state.asset(id)?.clone();
        patch.apply_to(&mut asset, now)?;
        state.check_asset_unique(&asset)?;
        state.assets.insert(id, asset.clone());
        Ok(asset)
    }

    async fn delete_asset(&self, id: AssetId) -> StoreResult<Asset> {
        let mut state = self.write()?;
        let asset = state
            .assets
            .remove(&id)
            .ok_or_else(|| StoreError::not_found(format!("asset {id}")))?;
        for mv in state
            .movements
            .iter_mut()
            .filter(|m| m.target_asset_id == Some(id))
        {
            mv.target_asset_id = None;
        }
        Ok(asset)
    }
}

#[async_trait]
impl InventoryStore for InMemoryStore {
    async fn list_items(&self, filter: &InventoryFilter, page: Pagination) -> StoreResult<Vec<InventoryItem>> {
        let state = self.read()?;
        let mut rows = state
            .items
            .values()
            .filter(|i| filter.matches(i))
            .cloned()
            .collect::<Vec<_>>();
        rows.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.sku.cmp(&b.sku)));
        Ok(page.slice(&rows))
    }

    async fn get_item(&self, id: InventoryItemId) -> StoreResult<InventoryItem> {
        self.read()?.item(id).cloned()
    }

    async fn insert_item(&self, item: &InventoryItem) -> StoreResult<()> {
        let mut state = self.write()?;
        state.check_item_unique(item)?;
        state.items.insert(item.id, item.clone());
        Ok(())
    }

    async fn update_item(
        &self,
        id: InventoryItemId,
        patch: InventoryItemPatch,
        now: DateTime<Utc>,
    ) -> StoreResult<InventoryItem> {
        let mut state = self.write()?;
        let mut item = state.item(id)?.clone();
        patch.apply_to(&mut item, now)?;
        state.check_item_unique(&item)?;
        state.items.insert(id, item.clone());
        Ok(item)
    }

    async fn delete_item(&self, id: InventoryItemId) -> StoreResult<InventoryItem> {
        let mut state = self.write()?;
        let item = state
            .items
            .remove(&id)
            .ok_or_else(|| StoreError::not_found(format!("inventory item {id}")))?;
        state.movements.retain(|m| m.inventory_item_id != id);
        Ok(item)
    }

    async fn apply_movement(
        &self,
        item_id: InventoryItemId,
        movement: &StockMove,
        actor: &str,
    ) -> StoreResult<MovementOutcome> {
        let mut state = self.write()?;

        if let Some(asset_id) = movement.target_asset_id {
            state.asset(asset_id)?;
        }

        let stock_before = state.item(item_id)?.stock;
        let stock_after = movement.movement_type.next_stock(stock_before, movement.qty)?;

        let now = Utc::now();
        state.last_movement_id += 1;
        let record = Movement {
            id: MovementId::from_i64(state.last_movement_id),
            inventory_item_id: item_id,
            movement_type: movement.movement_type,
            qty: movement.qty,
            reference: movement.reference.clone(),
            created_by: actor.to_string(),
            target_asset_id: movement.target_asset_id,
            created_at: now,
        };
        state.movements.push(record.clone());

        let item = state
            .items
            .get_mut(&item_id)
            .ok_or_else(|| StoreError::not_found(format!("inventory item {item_id}")))?;
        item.stock = stock_after;
        item.updated_at = now;

        Ok(MovementOutcome {
            movement: record,
            item: item.clone(),
            stock_before,
        })
    }

    async fn list_movements(&self, item_id: InventoryItemId, page: Pagination) -> StoreResult<Vec<MovementView>> {
        let state = self.read()?;
        state.item(item_id)?;

        let mut rows = state
            .movements
            .iter()
            .filter(|m| m.inventory_item_id == item_id)
            .collect::<Vec<_>>();
        // Ledger position is the application order.
        rows.sort_by(|a, b| b.id.cmp(&a.id));

        Ok(page
            .slice(&rows)
            .into_iter()
            .map(|m| {
                let asset = m.target_asset_id.and_then(|id| state.assets.get(&id));
                MovementView {
                    movement: m.clone(),
                    target_asset_tag: asset.map(|a| a.asset_tag.clone()),
                    target_asset_name: asset.map(|a| a.name.clone()),
                }
            })
            .collect())
    }
}

#[async_trait]
impl ActivityStore for InMemoryStore {
    async fn append_activity(&self, entry: NewActivityLog) -> StoreResult<ActivityLog> {
        let mut state = self.write()?;
        state.last_activity_id += 1;
        let log = entry.into_log(ActivityLogId::from_i64(state.last_activity_id), Utc::now());
        state.activity.push(log.clone());
        Ok(log)
    }

    async fn list_activity(&self, filter: &ActivityFilter, page: Pagination) -> StoreResult<Vec<ActivityLog>> {
        let state = self.read()?;
        let mut rows = state
            .activity
            .iter()
            .filter(|l| filter.matches(l))
            .cloned()
            .collect::<Vec<_>>();
        newest_first(&mut rows, |l| (l.created_at, l.id));
        Ok(page.slice(&rows))
    }
}

#[async_trait]
impl DashboardQuery for InMemoryStore {
    async fn summary(&self) -> StoreResult<DashboardSummary> {
        let state = self.read()?;
        let assets = state.assets.values().cloned().collect::<Vec<_>>();
        let items = state.items.values().cloned().collect::<Vec<_>>();
        Ok(DashboardSummary::from_records(&assets, &items))
    }
}
