//! Postgres-backed implementation of the store traits.
//!
//! ## Stock movements
//!
//! `apply_movement` runs one READ COMMITTED transaction:
//! 1. `SELECT … FOR KEY SHARE` the target asset (if any) so it cannot be
//!    deleted mid-flight
//! 2. `SELECT … FOR UPDATE` the inventory row
//! 3. compute the new stock; reject negatives
//! 4. `UPDATE` the stock and `INSERT` the movement
//! 5. commit
//!
//! A concurrent movement on the same item blocks at step 2 until the first
//! commits, then reads the committed stock. `lock_timeout` bounds the wait;
//! a timeout surfaces as `StoreError::Transient`.
//!
//! ## Error mapping
//!
//! See [`crate::error::map_sqlx_error`].

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder, Row};
use tracing::{Span, instrument};
use uuid::Uuid;

use assetdesk_activity::{ActivityFilter, ActivityLog, NewActivityLog};
use assetdesk_assets::{Asset, AssetPatch, AssetStatus};
use assetdesk_core::{ActivityLogId, AssetId, DomainError, InventoryItemId, MovementId, Pagination, UserId};
use assetdesk_inventory::{InventoryItem, InventoryItemPatch, Movement, StockMove};

use super::{
    ActivityStore, AssetFilter, AssetStore, DashboardQuery, InventoryFilter, InventoryStore, MovementOutcome,
    MovementView,
};
use crate::dashboard::{
    DashboardSummary, Kpis, LOW_STOCK_LIST, LocationQty, RECENT_ASSETS, StatusCount, UNASSIGNED_LOCATION,
};
use crate::error::{StoreError, StoreResult, map_sqlx_error};

/// Upper bound on how long a movement waits for a contended row lock.
const LOCK_TIMEOUT: &str = "5s";

const ASSET_COLUMNS: &str = "id, asset_tag, name, asset_type, status, brand, model, serial_number, \
     assigned_to, location, purchase_date, warranty_end, notes, created_at, updated_at";

const ITEM_COLUMNS: &str =
    "id, sku, name, category, unit, location, stock, min_stock, notes, created_at, updated_at";

const ACTIVITY_COLUMNS: &str =
    "id, actor_username, actor_user_id, action, entity_type, entity_id, meta, created_at";

/// Postgres-backed store. Cheap to clone; all clones share the pool.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_asset(&self, id: AssetId) -> StoreResult<Option<Asset>> {
        let sql = format!("SELECT {ASSET_COLUMNS} FROM assets WHERE id = $1");
        sqlx::query_as::<_, AssetRow>(&sql)
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_asset", e))?
            .map(Asset::try_from)
            .transpose()
    }

    async fn fetch_item(&self, id: InventoryItemId) -> StoreResult<Option<InventoryItem>> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM inventory_items WHERE id = $1");
        sqlx::query_as::<_, ItemRow>(&sql)
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_item", e))?
            .map(InventoryItem::try_from)
            .transpose()
    }
}

#[async_trait]
impl AssetStore for PostgresStore {
    #[instrument(skip(self), fields(row_count = tracing::field::Empty), err)]
    async fn list_assets(&self, filter: &AssetFilter, page: Pagination) -> StoreResult<Vec<Asset>> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {ASSET_COLUMNS} FROM assets WHERE TRUE"));
        if let Some(search) = filter.search.as_deref() {
            let pattern = like_pattern(search);
            qb.push(" AND (asset_tag ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR serial_number ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR assigned_to ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        if let Some(status) = filter.status {
            qb.push(" AND status = ").push_bind(status.as_str());
        }
        if let Some(asset_type) = filter.asset_type {
            qb.push(" AND asset_type = ").push_bind(asset_type.as_str());
        }
        if let Some(location) = filter.location.as_deref() {
            qb.push(" AND lower(location) = lower(")
                .push_bind(location.to_string())
                .push(")");
        }
        push_page(&mut qb, " ORDER BY created_at DESC, asset_tag DESC", page);

        let rows = qb
            .build_query_as::<AssetRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_assets", e))?;

        Span::current().record("row_count", rows.len());
        rows.into_iter().map(Asset::try_from).collect()
    }

    #[instrument(skip(self), fields(asset_id = %id), err)]
    async fn get_asset(&self, id: AssetId) -> StoreResult<Asset> {
        self.fetch_asset(id)
            .await?
            .ok_or_else(|| StoreError::not_found(format!("asset {id}")))
    }

    #[instrument(skip(self, asset), fields(asset_id = %asset.id, asset_tag = %asset.asset_tag), err)]
    async fn insert_asset(&self, asset: &Asset) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO assets (
                id, asset_tag, name, asset_type, status, brand, model, serial_number,
                assigned_to, location, purchase_date, warranty_end, notes, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(*asset.id.as_uuid())
        .bind(&asset.asset_tag)
        .bind(&asset.name)
        .bind(asset.asset_type.as_str())
        .bind(asset.status.as_str())
        .bind(&asset.brand)
        .bind(&asset.model)
        .bind(&asset.serial_number)
        .bind(&asset.assigned_to)
        .bind(&asset.location)
        .bind(asset.purchase_date)
        .bind(asset.warranty_end)
        .bind(&asset.notes)
        .bind(asset.created_at)
        .bind(asset.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_asset", e))?;
        Ok(())
    }

    #[instrument(skip(self, patch), fields(asset_id = %id), err)]
    async fn update_asset(&self, id: AssetId, patch: AssetPatch, now: DateTime<Utc>) -> StoreResult<Asset> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let sql = format!("SELECT {ASSET_COLUMNS} FROM assets WHERE id = $1 FOR UPDATE");
        let current = sqlx::query_as::<_, AssetRow>(&sql)
            .bind(*id.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("lock_asset", e))?
            .ok_or_else(|| StoreError::not_found(format!("asset {id}")))?;

        let mut asset = Asset::try_from(current)?;
        patch.apply_to(&mut asset, now)?;

        sqlx::query(
            r#"
            UPDATE assets SET
                asset_tag = $2, name = $3, asset_type = $4, status = $5, brand = $6, model = $7,
                serial_number = $8, assigned_to = $9, location = $10, purchase_date = $11,
                warranty_end = $12, notes = $13, updated_at = $14
            WHERE id = $1
            "#,
        )
        .bind(*asset.id.as_uuid())
        .bind(&asset.asset_tag)
        .bind(&asset.name)
        .bind(asset.asset_type.as_str())
        .bind(asset.status.as_str())
        .bind(&asset.brand)
        .bind(&asset.model)
        .bind(&asset.serial_number)
        .bind(&asset.assigned_to)
        .bind(&asset.location)
        .bind(asset.purchase_date)
        .bind(asset.warranty_end)
        .bind(&asset.notes)
        .bind(asset.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("update_asset", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(asset)
    }

    #[instrument(skip(self), fields(asset_id = %id), err)]
    async fn delete_asset(&self, id: AssetId) -> StoreResult<Asset> {
        let sql = format!("DELETE FROM assets WHERE id = $1 RETURNING {ASSET_COLUMNS}");
        sqlx::query_as::<_, AssetRow>(&sql)
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_asset", e))?
            .ok_or_else(|| StoreError::not_found(format!("asset {id}")))
            .and_then(Asset::try_from)
    }
}

#[async_trait]
impl InventoryStore for PostgresStore {
    #[instrument(skip(self), fields(row_count = tracing::field::Empty), err)]
    async fn list_items(&self, filter: &InventoryFilter, page: Pagination) -> StoreResult<Vec<InventoryItem>> {
        let mut qb =
            QueryBuilder::<Postgres>::new(format!("SELECT {ITEM_COLUMNS} FROM inventory_items WHERE TRUE"));
        if let Some(search) = filter.search.as_deref() {
            let pattern = like_pattern(search);
            qb.push(" AND (sku ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR name ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        if let Some(category) = filter.category {
            qb.push(" AND category = ").push_bind(category.as_str());
        }
        if let Some(location) = filter.location.as_deref() {
            qb.push(" AND lower(location) = lower(")
                .push_bind(location.to_string())
                .push(")");
        }
        if filter.low_stock {
            qb.push(" AND stock < min_stock");
        }
        push_page(&mut qb, " ORDER BY name ASC, sku ASC", page);

        let rows = qb
            .build_query_as::<ItemRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_items", e))?;

        Span::current().record("row_count", rows.len());
        rows.into_iter().map(InventoryItem::try_from).collect()
    }

    #[instrument(skip(self), fields(item_id = %id), err)]
    async fn get_item(&self, id: InventoryItemId) -> StoreResult<InventoryItem> {
        self.fetch_item(id)
            .await?
            .ok_or_else(|| StoreError::not_found(format!("inventory item {id}")))
    }

    #[instrument(skip(self, item), fields(item_id = %item.id, sku = %item.sku), err)]
    async fn insert_item(&self, item: &InventoryItem) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO inventory_items (
                id, sku, name, category, unit, location, stock, min_stock, notes, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(*item.id.as_uuid())
        .bind(&item.sku)
        .bind(&item.name)
        .bind(item.category.as_str())
        .bind(&item.unit)
        .bind(&item.location)
        .bind(item.stock)
        .bind(item.min_stock)
        .bind(&item.notes)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_item", e))?;
        Ok(())
    }

    #[instrument(skip(self, patch), fields(item_id = %id), err)]
    async fn update_item(
        &self,
        id: InventoryItemId,
        patch: InventoryItemPatch,
        now: DateTime<Utc>,
    ) -> StoreResult<InventoryItem> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let sql = format!("SELECT {ITEM_COLUMNS} FROM inventory_items WHERE id = $1 FOR UPDATE");
        let current = sqlx::query_as::<_, ItemRow>(&sql)
            .bind(*id.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("lock_item", e))?
            .ok_or_else(|| StoreError::not_found(format!("inventory item {id}")))?;

        let mut item = InventoryItem::try_from(current)?;
        patch.apply_to(&mut item, now)?;

        // `stock` is deliberately absent: only movements write it.
        sqlx::query(
            r#"
            UPDATE inventory_items SET
                sku = $2, name = $3, category = $4, unit = $5, location = $6,
                min_stock = $7, notes = $8, updated_at = $9
            WHERE id = $1
            "#,
        )
        .bind(*item.id.as_uuid())
        .bind(&item.sku)
        .bind(&item.name)
        .bind(item.category.as_str())
        .bind(&item.unit)
        .bind(&item.location)
        .bind(item.min_stock)
        .bind(&item.notes)
        .bind(item.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("update_item", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(item)
    }

    #[instrument(skip(self), fields(item_id = %id), err)]
    async fn delete_item(&self, id: InventoryItemId) -> StoreResult<InventoryItem> {
        let sql = format!("DELETE FROM inventory_items WHERE id = $1 RETURNING {ITEM_COLUMNS}");
        sqlx::query_as::<_, ItemRow>(&sql)
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_item", e))?
            .ok_or_else(|| StoreError::not_found(format!("inventory item {id}")))
            .and_then(InventoryItem::try_from)
    }

    #[instrument(
        skip(self, movement),
        fields(
            item_id = %item_id,
            movement_type = %movement.movement_type,
            qty = movement.qty,
            stock_after = tracing::field::Empty
        ),
        err
    )]
    async fn apply_movement(
        &self,
        item_id: InventoryItemId,
        movement: &StockMove,
        actor: &str,
    ) -> StoreResult<MovementOutcome> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        sqlx::query(&format!("SET LOCAL lock_timeout = '{LOCK_TIMEOUT}'"))
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("set_lock_timeout", e))?;

        if let Some(asset_id) = movement.target_asset_id {
            let exists = sqlx::query("SELECT id FROM assets WHERE id = $1 FOR KEY SHARE")
                .bind(*asset_id.as_uuid())
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("lock_target_asset", e))?;
            if exists.is_none() {
                tx.rollback()
                    .await
                    .map_err(|e| map_sqlx_error("rollback", e))?;
                return Err(StoreError::not_found(format!("asset {asset_id}")));
            }
        }

        let stock_before: i64 = match sqlx::query("SELECT stock FROM inventory_items WHERE id = $1 FOR UPDATE")
            .bind(*item_id.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("lock_item", e))?
        {
            Some(row) => row
                .try_get("stock")
                .map_err(|e| map_sqlx_error("lock_item", e))?,
            None => {
                tx.rollback()
                    .await
                    .map_err(|e| map_sqlx_error("rollback", e))?;
                return Err(StoreError::not_found(format!("inventory item {item_id}")));
            }
        };

        let stock_after = match movement.movement_type.next_stock(stock_before, movement.qty) {
            Ok(next) => next,
            Err(err) => {
                tx.rollback()
                    .await
                    .map_err(|e| map_sqlx_error("rollback", e))?;
                return Err(err.into());
            }
        };

        let sql = format!(
            "UPDATE inventory_items SET stock = $2, updated_at = NOW() WHERE id = $1 RETURNING {ITEM_COLUMNS}"
        );
        let item = sqlx::query_as::<_, ItemRow>(&sql)
            .bind(*item_id.as_uuid())
            .bind(stock_after)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("update_stock", e))?;

        let row = sqlx::query_as::<_, MovementRow>(
            r#"
            INSERT INTO inventory_movements (
                inventory_item_id, movement_type, qty, reference, created_by, target_asset_id, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, clock_timestamp())
            RETURNING id, inventory_item_id, movement_type, qty, reference, created_by, target_asset_id, created_at
            "#,
        )
        .bind(*item_id.as_uuid())
        .bind(movement.movement_type.as_str())
        .bind(movement.qty)
        .bind(&movement.reference)
        .bind(actor)
        .bind(movement.target_asset_id.map(|id| *id.as_uuid()))
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("insert_movement", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        Span::current().record("stock_after", stock_after);
        Ok(MovementOutcome {
            movement: Movement::try_from(row)?,
            item: InventoryItem::try_from(item)?,
            stock_before,
        })
    }

    #[instrument(skip(self), fields(item_id = %item_id), err)]
    async fn list_movements(&self, item_id: InventoryItemId, page: Pagination) -> StoreResult<Vec<MovementView>> {
        if self.fetch_item(item_id).await?.is_none() {
            return Err(StoreError::not_found(format!("inventory item {item_id}")));
        }

        let rows = sqlx::query(
            r#"
            SELECT
                m.id, m.inventory_item_id, m.movement_type, m.qty, m.reference,
                m.created_by, m.target_asset_id, m.created_at,
                a.asset_tag AS target_asset_tag,
                a.name AS target_asset_name
            FROM inventory_movements m
            LEFT JOIN assets a ON a.id = m.target_asset_id
            WHERE m.inventory_item_id = $1
            ORDER BY m.id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(*item_id.as_uuid())
        .bind(i64::from(page.limit))
        .bind(i64::from(page.offset))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_movements", e))?;

        let mut views = Vec::with_capacity(rows.len());
        for row in rows {
            let movement = MovementRow::from_row(&row).map_err(|e| map_sqlx_error("list_movements", e))?;
            views.push(MovementView {
                movement: Movement::try_from(movement)?,
                target_asset_tag: row
                    .try_get("target_asset_tag")
                    .map_err(|e| map_sqlx_error("list_movements", e))?,
                target_asset_name: row
                    .try_get("target_asset_name")
                    .map_err(|e| map_sqlx_error("list_movements", e))?,
            });
        }
        Ok(views)
    }
}

#[async_trait]
impl ActivityStore for PostgresStore {
    #[instrument(skip(self, entry), fields(action = entry.action.as_str(), entity_id = %entry.entity_id), err)]
    async fn append_activity(&self, entry: NewActivityLog) -> StoreResult<ActivityLog> {
        let row: (i64, DateTime<Utc>) = sqlx::query_as(
            r#"
            INSERT INTO activity_logs (actor_username, actor_user_id, action, entity_type, entity_id, meta)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, created_at
            "#,
        )
        .bind(&entry.actor_username)
        .bind(entry.actor_user_id.map(|id| *id.as_uuid()))
        .bind(entry.action.as_str())
        .bind(entry.entity_type.as_str())
        .bind(entry.entity_id)
        .bind(&entry.meta)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("append_activity", e))?;

        Ok(entry.into_log(ActivityLogId::from_i64(row.0), row.1))
    }

    #[instrument(skip(self), fields(row_count = tracing::field::Empty), err)]
    async fn list_activity(&self, filter: &ActivityFilter, page: Pagination) -> StoreResult<Vec<ActivityLog>> {
        let mut qb =
            QueryBuilder::<Postgres>::new(format!("SELECT {ACTIVITY_COLUMNS} FROM activity_logs WHERE TRUE"));
        if let Some(actor) = filter.actor.as_deref() {
            qb.push(" AND actor_username = ").push_bind(actor.to_string());
        }
        if let Some(entity_type) = filter.entity_type {
            qb.push(" AND entity_type = ").push_bind(entity_type.as_str());
        }
        if let Some(entity_id) = filter.entity_id {
            qb.push(" AND entity_id = ").push_bind(entity_id);
        }
        push_page(&mut qb, " ORDER BY created_at DESC, id DESC", page);

        let rows = qb
            .build_query_as::<ActivityRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_activity", e))?;

        Span::current().record("row_count", rows.len());
        rows.into_iter().map(ActivityLog::try_from).collect()
    }
}

#[async_trait]
impl DashboardQuery for PostgresStore {
    #[instrument(skip(self), err)]
    async fn summary(&self) -> StoreResult<DashboardSummary> {
        let (total_assets, total_inventory_qty, low_stock_items, assets_in_repair): (i64, i64, i64, i64) =
            sqlx::query_as(
                r#"
                SELECT
                    (SELECT COUNT(*) FROM assets),
                    (SELECT LEAST(COALESCE(SUM(stock), 0), $2)::BIGINT FROM inventory_items),
                    (SELECT COUNT(*) FROM inventory_items WHERE stock < min_stock),
                    (SELECT COUNT(*) FROM assets WHERE status = $1)
                "#,
            )
            .bind(AssetStatus::Repair.as_str())
            .bind(i64::MAX)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("dashboard_kpis", e))?;

        let counts: Vec<(String, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM assets GROUP BY status")
                .fetch_all(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("dashboard_status", e))?;
        let assets_by_status = AssetStatus::ALL
            .into_iter()
            .map(|status| StatusCount {
                status,
                count: counts
                    .iter()
                    .find(|(s, _)| s == status.as_str())
                    .map(|(_, c)| *c)
                    .unwrap_or(0),
            })
            .collect();

        let by_location: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT COALESCE(location, $1) AS location, LEAST(COALESCE(SUM(stock), 0), $2)::BIGINT AS qty
            FROM inventory_items
            GROUP BY 1
            ORDER BY 1
            "#,
        )
        .bind(UNASSIGNED_LOCATION)
        .bind(i64::MAX)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("dashboard_locations", e))?;

        let sql = format!("SELECT {ASSET_COLUMNS} FROM assets ORDER BY created_at DESC LIMIT $1");
        let recent = sqlx::query_as::<_, AssetRow>(&sql)
            .bind(RECENT_ASSETS as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("dashboard_recent", e))?;

        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM inventory_items WHERE stock < min_stock ORDER BY stock ASC, sku ASC LIMIT $1"
        );
        let low = sqlx::query_as::<_, ItemRow>(&sql)
            .bind(LOW_STOCK_LIST as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("dashboard_low_stock", e))?;

        Ok(DashboardSummary {
            kpis: Kpis {
                total_assets,
                total_inventory_qty,
                low_stock_items,
                assets_in_repair,
            },
            assets_by_status,
            inventory_by_location: by_location
                .into_iter()
                .map(|(location, qty)| LocationQty { location, qty })
                .collect(),
            recent_assets: recent.into_iter().map(Asset::try_from).collect::<StoreResult<_>>()?,
            low_stock_list: low.into_iter().map(InventoryItem::try_from).collect::<StoreResult<_>>()?,
        })
    }
}

fn like_pattern(search: &str) -> String {
    let escaped = search
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

fn push_page(qb: &mut QueryBuilder<'_, Postgres>, order_by: &str, page: Pagination) {
    qb.push(order_by)
        .push(" LIMIT ")
        .push_bind(i64::from(page.limit))
        .push(" OFFSET ")
        .push_bind(i64::from(page.offset));
}

fn corrupt(what: &str, err: DomainError) -> StoreError {
    StoreError::internal(format!("corrupt {what} row: {err}"))
}

// SQLx row types

#[derive(Debug)]
struct AssetRow {
    id: Uuid,
    asset_tag: String,
    name: String,
    asset_type: String,
    status: String,
    brand: Option<String>,
    model: Option<String>,
    serial_number: Option<String>,
    assigned_to: Option<String>,
    location: Option<String>,
    purchase_date: Option<NaiveDate>,
    warranty_end: Option<NaiveDate>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for AssetRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(AssetRow {
            id: row.try_get("id")?,
            asset_tag: row.try_get("asset_tag")?,
            name: row.try_get("name")?,
            asset_type: row.try_get("asset_type")?,
            status: row.try_get("status")?,
            brand: row.try_get("brand")?,
            model: row.try_get("model")?,
            serial_number: row.try_get("serial_number")?,
            assigned_to: row.try_get("assigned_to")?,
            location: row.try_get("location")?,
            purchase_date: row.try_get("purchase_date")?,
            warranty_end: row.try_get("warranty_end")?,
            notes: row.try_get("notes")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl TryFrom<AssetRow> for Asset {
    type Error = StoreError;

    fn try_from(row: AssetRow) -> Result<Self, Self::Error> {
        Ok(Asset {
            id: AssetId::from_uuid(row.id),
            asset_tag: row.asset_tag,
            name: row.name,
            asset_type: row.asset_type.parse().map_err(|e| corrupt("asset", e))?,
            status: row.status.parse().map_err(|e| corrupt("asset", e))?,
            brand: row.brand,
            model: row.model,
            serial_number: row.serial_number,
            assigned_to: row.assigned_to,
            location: row.location,
            purchase_date: row.purchase_date,
            warranty_end: row.warranty_end,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug)]
struct ItemRow {
    id: Uuid,
    sku: String,
    name: String,
    category: String,
    unit: Option<String>,
    location: Option<String>,
    stock: i64,
    min_stock: i64,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for ItemRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(ItemRow {
            id: row.try_get("id")?,
            sku: row.try_get("sku")?,
            name: row.try_get("name")?,
            category: row.try_get("category")?,
            unit: row.try_get("unit")?,
            location: row.try_get("location")?,
            stock: row.try_get("stock")?,
            min_stock: row.try_get("min_stock")?,
            notes: row.try_get("notes")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl TryFrom<ItemRow> for InventoryItem {
    type Error = StoreError;

    fn try_from(row: ItemRow) -> Result<Self, Self::Error> {
        Ok(InventoryItem {
            id: InventoryItemId::from_uuid(row.id),
            sku: row.sku,
            name: row.name,
            category: row.category.parse().map_err(|e| corrupt("inventory item", e))?,
            unit: row.unit,
            location: row.location,
            stock: row.stock,
            min_stock: row.min_stock,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug)]
struct MovementRow {
    id: i64,
    inventory_item_id: Uuid,
    movement_type: String,
    qty: i64,
    reference: Option<String>,
    created_by: String,
    target_asset_id: Option<Uuid>,
    created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for MovementRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(MovementRow {
            id: row.try_get("id")?,
            inventory_item_id: row.try_get("inventory_item_id")?,
            movement_type: row.try_get("movement_type")?,
            qty: row.try_get("qty")?,
            reference: row.try_get("reference")?,
            created_by: row.try_get("created_by")?,
            target_asset_id: row.try_get("target_asset_id")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl TryFrom<MovementRow> for Movement {
    type Error = StoreError;

    fn try_from(row: MovementRow) -> Result<Self, Self::Error> {
        Ok(Movement {
            id: MovementId::from_i64(row.id),
            inventory_item_id: InventoryItemId::from_uuid(row.inventory_item_id),
            movement_type: row.movement_type.parse().map_err(|e| corrupt("movement", e))?,
            qty: row.qty,
            reference: row.reference,
            created_by: row.created_by,
            target_asset_id: row.target_asset_id.map(AssetId::from_uuid),
            created_at: row.created_at,
        })
    }
}

#[derive(Debug)]
struct ActivityRow {
    id: i64,
    actor_username: String,
    actor_user_id: Option<Uuid>,
    action: String,
    entity_type: String,
    entity_id: Uuid,
    meta: serde_json::Value,
    created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for ActivityRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(ActivityRow {
            id: row.try_get("id")?,
            actor_username: row.try_get("actor_username")?,
            actor_user_id: row.try_get("actor_user_id")?,
            action: row.try_get("action")?,
            entity_type: row.try_get("entity_type")?,
            entity_id: row.try_get("entity_id")?,
            meta: row.try_get("meta")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl TryFrom<ActivityRow> for ActivityLog {
    type Error = StoreError;

    fn try_from(row: ActivityRow) -> Result<Self, Self::Error> {
        Ok(ActivityLog {
            id: ActivityLogId::from_i64(row.id),
            actor_username: row.actor_username,
            actor_user_id: row.actor_user_id.map(UserId::from_uuid),
            action: row.action.parse().map_err(|e| corrupt("activity", e))?,
            entity_type: row.entity_type.parse().map_err(|e| corrupt("activity", e))?,
            entity_id: row.entity_id,
            meta: row.meta,
            created_at: row.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("ssd"), "%ssd%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }

    #[test]
    fn corrupt_rows_are_internal_errors() {
        let row = MovementRow {
            id: 1,
            inventory_item_id: Uuid::now_v7(),
            movement_type: "TRANSFER".to_string(),
            qty: 1,
            reference: None,
            created_by: "admin".to_string(),
            target_asset_id: None,
            created_at: Utc::now(),
        };
        assert!(matches!(Movement::try_from(row), Err(StoreError::Internal(_))));
    }
}
