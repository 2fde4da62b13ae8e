//! Database pool lifecycle and schema bootstrap.
//!
//! The pool is an injected resource: opened once at startup, shared by every
//! request handler, and closed explicitly during graceful shutdown.

use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::error::{StoreResult, map_sqlx_error};

/// Connection settings for the Postgres backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl DatabaseConfig {
    pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;
    pub const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: Self::DEFAULT_MAX_CONNECTIONS,
            acquire_timeout: Self::DEFAULT_ACQUIRE_TIMEOUT,
        }
    }
}

/// Open the pool and make sure the schema exists.
#[tracing::instrument(skip(config), fields(max_connections = config.max_connections), err)]
pub async fn connect(config: &DatabaseConfig) -> StoreResult<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
        .connect(&config.url)
        .await
        .map_err(|e| map_sqlx_error("connect", e))?;

    apply_schema(&pool).await?;
    tracing::info!("database pool ready");
    Ok(pool)
}

/// Apply [`SCHEMA`]. Idempotent.
pub async fn apply_schema(pool: &PgPool) -> StoreResult<()> {
    sqlx::raw_sql(SCHEMA)
        .execute(pool)
        .await
        .map_err(|e| map_sqlx_error("apply_schema", e))?;
    Ok(())
}

/// Close the pool, waiting for checked-out connections to be returned.
pub async fn close(pool: &PgPool) {
    pool.close().await;
    tracing::info!("database pool closed");
}

/// Tables and indexes. Every statement is safe to run repeatedly.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS assets (
    id             UUID PRIMARY KEY,
    asset_tag      TEXT NOT NULL,
    name           TEXT NOT NULL,
    asset_type     TEXT NOT NULL,
    status         TEXT NOT NULL,
    brand          TEXT,
    model          TEXT,
    serial_number  TEXT,
    assigned_to    TEXT,
    location       TEXT,
    purchase_date  DATE,
    warranty_end   DATE,
    notes          TEXT,
    created_at     TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at     TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    CONSTRAINT assets_asset_tag_key UNIQUE (asset_tag),
    CONSTRAINT assets_serial_number_key UNIQUE (serial_number)
);

CREATE INDEX IF NOT EXISTS assets_status_idx ON assets (status);
CREATE INDEX IF NOT EXISTS assets_created_at_idx ON assets (created_at DESC);

CREATE TABLE IF NOT EXISTS inventory_items (
    id          UUID PRIMARY KEY,
    sku         TEXT NOT NULL,
    name        TEXT NOT NULL,
    category    TEXT NOT NULL,
    unit        TEXT,
    location    TEXT,
    stock       BIGINT NOT NULL DEFAULT 0 CHECK (stock >= 0),
    min_stock   BIGINT NOT NULL DEFAULT 0 CHECK (min_stock >= 0),
    notes       TEXT,
    created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at  TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    CONSTRAINT inventory_items_sku_key UNIQUE (sku)
);

CREATE TABLE IF NOT EXISTS inventory_movements (
    id                 BIGSERIAL PRIMARY KEY,
    inventory_item_id  UUID NOT NULL REFERENCES inventory_items (id) ON DELETE CASCADE,
    movement_type      TEXT NOT NULL CHECK (movement_type IN ('IN', 'OUT', 'ADJUST')),
    qty                BIGINT NOT NULL CHECK (qty > 0),
    reference          TEXT,
    created_by         TEXT NOT NULL,
    target_asset_id    UUID REFERENCES assets (id) ON DELETE SET NULL,
    created_at         TIMESTAMPTZ NOT NULL DEFAULT clock_timestamp()
);

CREATE INDEX IF NOT EXISTS inventory_movements_item_seq_idx
    ON inventory_movements (inventory_item_id, id DESC);

CREATE TABLE IF NOT EXISTS activity_logs (
    id              BIGSERIAL PRIMARY KEY,
    actor_username  TEXT NOT NULL,
    actor_user_id   UUID,
    action          TEXT NOT NULL,
    entity_type     TEXT NOT NULL,
    entity_id       UUID NOT NULL,
    meta            JSONB NOT NULL DEFAULT '{}'::jsonb,
    created_at      TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX IF NOT EXISTS activity_logs_entity_idx
    ON activity_logs (entity_type, entity_id, created_at DESC, id DESC);
CREATE INDEX IF NOT EXISTS activity_logs_created_idx
    ON activity_logs (created_at DESC, id DESC);
"#;
