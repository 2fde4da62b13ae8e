use serde::{Deserialize, Serialize};
use uuid::Uuid;

use assetdesk_activity::{ActivityFilter, EntityType};
use assetdesk_assets::{AssetStatus, AssetType};
use assetdesk_core::{DomainResult, Pagination};
use assetdesk_infra::store::{AssetFilter, InventoryFilter};
use assetdesk_inventory::InventoryCategory;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl PageQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.limit, self.offset)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AssetListQuery {
    pub search: Option<String>,
    pub status: Option<String>,
    #[serde(rename = "type")]
    pub asset_type: Option<String>,
    pub location: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl AssetListQuery {
    pub fn filter(&self) -> DomainResult<AssetFilter> {
        Ok(AssetFilter {
            search: non_empty(&self.search),
            status: non_empty(&self.status).map(|s| s.parse::<AssetStatus>()).transpose()?,
            asset_type: non_empty(&self.asset_type).map(|t| t.parse::<AssetType>()).transpose()?,
            location: non_empty(&self.location),
        })
    }

    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.limit, self.offset)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryListQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub location: Option<String>,
    /// `true` (any case) restricts to items below their minimum.
    pub low_stock: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl InventoryListQuery {
    pub fn filter(&self) -> DomainResult<InventoryFilter> {
        Ok(InventoryFilter {
            search: non_empty(&self.search),
            category: non_empty(&self.category)
                .map(|c| c.parse::<InventoryCategory>())
                .transpose()?,
            location: non_empty(&self.location),
            low_stock: non_empty(&self.low_stock).is_some_and(|v| v.eq_ignore_ascii_case("true")),
        })
    }

    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.limit, self.offset)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityQuery {
    pub actor: Option<String>,
    pub entity_type: Option<String>,
    pub entity_id: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl ActivityQuery {
    pub fn filter(&self) -> DomainResult<ActivityFilter> {
        let entity_id = non_empty(&self.entity_id)
            .map(|raw| {
                raw.parse::<Uuid>()
                    .map_err(|e| assetdesk_core::DomainError::invalid_id(format!("entityId: {e}")))
            })
            .transpose()?;

        Ok(ActivityFilter {
            actor: non_empty(&self.actor),
            entity_type: non_empty(&self.entity_type)
                .map(|t| t.parse::<EntityType>())
                .transpose()?,
            entity_id,
        })
    }

    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.limit, self.offset)
    }
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub role: String,
}

/// Query strings send `?status=` for "any"; treat blank as absent.
fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
