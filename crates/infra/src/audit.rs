//! Best-effort audit trail.
//!
//! Audit entries are written after the causal change has committed. A failed
//! audit write is logged and dropped; it never fails or rolls back the
//! business operation that triggered it.

use std::sync::Arc;

use serde_json::Value as JsonValue;
use uuid::Uuid;

use assetdesk_activity::{ActivityAction, ActivityFilter, ActivityLog, NewActivityLog};
use assetdesk_core::{Pagination, UserId};

use crate::error::StoreResult;
use crate::store::ActivityStore;

/// Who performed an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub username: String,
    pub user_id: Option<UserId>,
}

impl Actor {
    pub fn new(username: impl Into<String>, user_id: Option<UserId>) -> Self {
        Self {
            username: username.into(),
            user_id,
        }
    }
}

#[derive(Clone)]
pub struct AuditLogger {
    store: Arc<dyn ActivityStore>,
}

impl AuditLogger {
    pub fn new(store: Arc<dyn ActivityStore>) -> Self {
        Self { store }
    }

    /// Append one entry. The entity type is implied by `action`.
    ///
    /// Returns the stored entry, or `None` if the write failed.
    pub async fn record(
        &self,
        actor: &Actor,
        action: ActivityAction,
        entity_id: Uuid,
        meta: Option<JsonValue>,
    ) -> Option<ActivityLog> {
        let entry = NewActivityLog {
            actor_username: actor.username.clone(),
            actor_user_id: actor.user_id,
            action,
            entity_type: action.entity_type(),
            entity_id,
            meta: meta.unwrap_or_else(|| JsonValue::Object(Default::default())),
        };

        match self.store.append_activity(entry).await {
            Ok(log) => Some(log),
            Err(err) => {
                tracing::warn!(
                    action = action.as_str(),
                    entity_id = %entity_id,
                    actor = %actor.username,
                    error = %err,
                    "audit write failed"
                );
                None
            }
        }
    }

    /// Entries matching `filter`, newest first.
    pub async fn list(&self, filter: &ActivityFilter, page: Pagination) -> StoreResult<Vec<ActivityLog>> {
        self.store.list_activity(filter, page).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::store::InMemoryStore;
    use assetdesk_activity::EntityType;
    use async_trait::async_trait;
    use serde_json::json;

    struct FailingStore;

    #[async_trait]
    impl ActivityStore for FailingStore {
        async fn append_activity(&self, _entry: NewActivityLog) -> StoreResult<ActivityLog> {
            Err(StoreError::Transient("connection reset".to_string()))
        }

        async fn list_activity(&self, _filter: &ActivityFilter, _page: Pagination) -> StoreResult<Vec<ActivityLog>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn failures_are_swallowed() {
        let audit = AuditLogger::new(Arc::new(FailingStore));
        let logged = audit
            .record(&Actor::new("admin", None), ActivityAction::AssetCreate, Uuid::now_v7(), None)
            .await;
        assert!(logged.is_none());
    }

    #[tokio::test]
    async fn entity_type_follows_action() {
        let audit = AuditLogger::new(Arc::new(InMemoryStore::new()));
        let id = Uuid::now_v7();
        let log = audit
            .record(
                &Actor::new("admin", None),
                ActivityAction::InventoryMove,
                id,
                Some(json!({ "qty": 3 })),
            )
            .await
            .unwrap();
        assert_eq!(log.entity_type, EntityType::Inventory);
        assert_eq!(log.entity_id, id);
        assert_eq!(log.meta["qty"], 3);

        let empty_meta = audit
            .record(&Actor::new("admin", None), ActivityAction::AssetDelete, id, None)
            .await
            .unwrap();
        assert_eq!(empty_meta.meta, json!({}));
    }
}
