//! Ledger Writer: the only path that changes an item's stock.
//!
//! Flow: validate the request (no storage access), hand it to the store's
//! atomic `apply_movement`, then record the audit trail once the movement
//! has committed.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;

use assetdesk_activity::ActivityAction;
use assetdesk_core::{AssetId, InventoryItemId, Pagination};
use assetdesk_inventory::StockMove;

use crate::audit::{Actor, AuditLogger};
use crate::error::StoreResult;
use crate::store::{InventoryStore, MovementOutcome, MovementView};

/// Errors surfaced by the Ledger Writer.
pub type LedgerError = crate::error::StoreError;

/// Raw movement request, as received from a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveRequest {
    #[serde(rename = "type")]
    pub movement_type: String,
    pub qty: i64,
    #[serde(rename = "ref", default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub target_asset_id: Option<AssetId>,
}

#[derive(Clone)]
pub struct LedgerWriter {
    inventory: Arc<dyn InventoryStore>,
    audit: AuditLogger,
}

impl LedgerWriter {
    pub fn new(inventory: Arc<dyn InventoryStore>, audit: AuditLogger) -> Self {
        Self { inventory, audit }
    }

    /// Apply one stock movement to `item_id` on behalf of `actor`.
    ///
    /// Errors:
    /// - `InvalidInput`: unknown type or non-positive qty
    /// - `NotFound`: item or target asset missing
    /// - `InvalidState`: the movement would make stock negative
    /// - `Transient`: lock timeout, serialization failure, lost connection
    pub async fn apply_movement(
        &self,
        item_id: InventoryItemId,
        request: MoveRequest,
        actor: &Actor,
    ) -> Result<MovementOutcome, LedgerError> {
        let movement = StockMove::parse(
            &request.movement_type,
            request.qty,
            request.reference,
            request.target_asset_id,
        )?;

        let outcome = self
            .inventory
            .apply_movement(item_id, &movement, &actor.username)
            .await?;

        tracing::info!(
            item_id = %item_id,
            movement_id = %outcome.movement.id,
            movement_type = %movement.movement_type,
            qty = movement.qty,
            stock_before = outcome.stock_before,
            stock_after = outcome.item.stock,
            actor = %actor.username,
            "stock movement applied"
        );

        self.record_audit(&outcome, actor).await;
        Ok(outcome)
    }

    async fn record_audit(&self, outcome: &MovementOutcome, actor: &Actor) {
        let mv = &outcome.movement;

        self.audit
            .record(
                actor,
                ActivityAction::InventoryMove,
                *mv.inventory_item_id.as_uuid(),
                Some(json!({
                    "movementId": mv.id,
                    "sku": outcome.item.sku,
                    "type": mv.movement_type,
                    "qty": mv.qty,
                    "ref": mv.reference,
                    "actor": actor.username,
                    "stockBefore": outcome.stock_before,
                    "stockAfter": outcome.item.stock,
                    "targetAssetId": mv.target_asset_id,
                })),
            )
            .await;

        if let Some(asset_id) = mv.target_asset_id {
            self.audit
                .record(
                    actor,
                    ActivityAction::AssetMove,
                    *asset_id.as_uuid(),
                    Some(json!({
                        "movementId": mv.id,
                        "inventoryItemId": mv.inventory_item_id,
                        "sku": outcome.item.sku,
                        "type": mv.movement_type,
                        "qty": mv.qty,
                        "ref": mv.reference,
                        "actor": actor.username,
                    })),
                )
                .await;
        }
    }

    /// Movement history of one item, newest first.
    pub async fn history(&self, item_id: InventoryItemId, page: Pagination) -> StoreResult<Vec<MovementView>> {
        self.inventory.list_movements(item_id, page).await
    }
}
