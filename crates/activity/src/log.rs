use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use assetdesk_core::{ActivityLogId, AssetId, DomainError, InventoryItemId, UserId};

/// Kind of entity an audit entry is about.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityType {
    Asset,
    Inventory,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Asset => "ASSET",
            EntityType::Inventory => "INVENTORY",
        }
    }
}

impl core::str::FromStr for EntityType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ASSET" => Ok(EntityType::Asset),
            "INVENTORY" => Ok(EntityType::Inventory),
            _ => Err(DomainError::invalid_input("entityType must be one of: ASSET, INVENTORY")),
        }
    }
}

/// Mutating action recorded in the audit log.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityAction {
    AssetCreate,
    AssetUpdate,
    AssetDelete,
    /// Stock was issued to (or otherwise linked with) this asset.
    AssetMove,
    InventoryCreate,
    InventoryUpdate,
    InventoryDelete,
    InventoryMove,
}

impl ActivityAction {
    pub const ALL: [ActivityAction; 8] = [
        ActivityAction::AssetCreate,
        ActivityAction::AssetUpdate,
        ActivityAction::AssetDelete,
        ActivityAction::AssetMove,
        ActivityAction::InventoryCreate,
        ActivityAction::InventoryUpdate,
        ActivityAction::InventoryDelete,
        ActivityAction::InventoryMove,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityAction::AssetCreate => "ASSET_CREATE",
            ActivityAction::AssetUpdate => "ASSET_UPDATE",
            ActivityAction::AssetDelete => "ASSET_DELETE",
            ActivityAction::AssetMove => "ASSET_MOVE",
            ActivityAction::InventoryCreate => "INVENTORY_CREATE",
            ActivityAction::InventoryUpdate => "INVENTORY_UPDATE",
            ActivityAction::InventoryDelete => "INVENTORY_DELETE",
            ActivityAction::InventoryMove => "INVENTORY_MOVE",
        }
    }

    /// The entity kind this action applies to.
    pub fn entity_type(&self) -> EntityType {
        match self {
            ActivityAction::AssetCreate
            | ActivityAction::AssetUpdate
            | ActivityAction::AssetDelete
            | ActivityAction::AssetMove => EntityType::Asset,
            ActivityAction::InventoryCreate
            | ActivityAction::InventoryUpdate
            | ActivityAction::InventoryDelete
            | ActivityAction::InventoryMove => EntityType::Inventory,
        }
    }
}

impl core::str::FromStr for ActivityAction {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DomainError::invalid_input(format!("unknown activity action '{s}'")))
    }
}

/// Stored audit entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLog {
    pub id: ActivityLogId,
    pub actor_username: String,
    pub actor_user_id: Option<UserId>,
    pub action: ActivityAction,
    pub entity_type: EntityType,
    pub entity_id: Uuid,
    pub meta: JsonValue,
    pub created_at: DateTime<Utc>,
}

/// Audit entry before storage assigns `id`/`created_at`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewActivityLog {
    pub actor_username: String,
    pub actor_user_id: Option<UserId>,
    pub action: ActivityAction,
    pub entity_type: EntityType,
    pub entity_id: Uuid,
    pub meta: JsonValue,
}

impl NewActivityLog {
    pub fn for_asset(
        actor_username: impl Into<String>,
        actor_user_id: Option<UserId>,
        action: ActivityAction,
        asset_id: AssetId,
        meta: JsonValue,
    ) -> Self {
        debug_assert_eq!(action.entity_type(), EntityType::Asset);
        Self {
            actor_username: actor_username.into(),
            actor_user_id,
            action,
            entity_type: EntityType::Asset,
            entity_id: *asset_id.as_uuid(),
            meta,
        }
    }

    pub fn for_inventory(
        actor_username: impl Into<String>,
        actor_user_id: Option<UserId>,
        action: ActivityAction,
        item_id: InventoryItemId,
        meta: JsonValue,
    ) -> Self {
        debug_assert_eq!(action.entity_type(), EntityType::Inventory);
        Self {
            actor_username: actor_username.into(),
            actor_user_id,
            action,
            entity_type: EntityType::Inventory,
            entity_id: *item_id.as_uuid(),
            meta,
        }
    }

    pub fn into_log(self, id: ActivityLogId, created_at: DateTime<Utc>) -> ActivityLog {
        ActivityLog {
            id,
            actor_username: self.actor_username,
            actor_user_id: self.actor_user_id,
            action: self.action,
            entity_type: self.entity_type,
            entity_id: self.entity_id,
            meta: self.meta,
            created_at,
        }
    }
}

/// Filter for activity queries. `None` means "any".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityFilter {
    pub actor: Option<String>,
    pub entity_type: Option<EntityType>,
    pub entity_id: Option<Uuid>,
}

impl ActivityFilter {
    pub fn for_entity(entity_type: EntityType, entity_id: Uuid) -> Self {
        Self {
            actor: None,
            entity_type: Some(entity_type),
            entity_id: Some(entity_id),
        }
    }

    pub fn matches(&self, log: &ActivityLog) -> bool {
        self.actor.as_deref().is_none_or(|a| a == log.actor_username)
            && self.entity_type.is_none_or(|t| t == log.entity_type)
            && self.entity_id.is_none_or(|id| id == log.entity_id)
    }
}
