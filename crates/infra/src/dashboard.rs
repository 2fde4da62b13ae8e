//! Dashboard summary: headline KPIs plus a few breakdowns.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use assetdesk_assets::{Asset, AssetStatus};
use assetdesk_inventory::InventoryItem;

/// Number of recently created assets shown.
pub const RECENT_ASSETS: usize = 5;
/// Maximum number of low-stock items shown.
pub const LOW_STOCK_LIST: usize = 10;

/// Label used for items without a location.
pub const UNASSIGNED_LOCATION: &str = "Unassigned";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Kpis {
    pub total_assets: i64,
    pub total_inventory_qty: i64,
    pub low_stock_items: i64,
    pub assets_in_repair: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCount {
    pub status: AssetStatus,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationQty {
    pub location: String,
    pub qty: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub kpis: Kpis,
    /// Every status, including those with zero assets.
    pub assets_by_status: Vec<StatusCount>,
    /// Sorted by location.
    pub inventory_by_location: Vec<LocationQty>,
    pub recent_assets: Vec<Asset>,
    /// Lowest stock first.
    pub low_stock_list: Vec<InventoryItem>,
}

impl DashboardSummary {
    /// Compute the summary from full record sets.
    pub fn from_records(assets: &[Asset], items: &[InventoryItem]) -> Self {
        let assets_by_status = AssetStatus::ALL
            .into_iter()
            .map(|status| StatusCount {
                status,
                count: assets.iter().filter(|a| a.status == status).count() as i64,
            })
            .collect::<Vec<_>>();

        let mut by_location: BTreeMap<String, i64> = BTreeMap::new();
        for item in items {
            let key = item
                .location
                .clone()
                .unwrap_or_else(|| UNASSIGNED_LOCATION.to_string());
            let qty = by_location.entry(key).or_default();
            *qty = qty.saturating_add(item.stock);
        }

        let mut recent_assets = assets.to_vec();
        recent_assets.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        recent_assets.truncate(RECENT_ASSETS);

        let mut low_stock_list = items
            .iter()
            .filter(|i| i.is_low_stock())
            .cloned()
            .collect::<Vec<_>>();
        let low_stock_items = low_stock_list.len() as i64;
        low_stock_list.sort_by(|a, b| a.stock.cmp(&b.stock).then_with(|| a.sku.cmp(&b.sku)));
        low_stock_list.truncate(LOW_STOCK_LIST);

        Self {
            kpis: Kpis {
                total_assets: assets.len() as i64,
                total_inventory_qty: items.iter().fold(0i64, |acc, i| acc.saturating_add(i.stock)),
                low_stock_items,
                assets_in_repair: assets.iter().filter(|a| a.status == AssetStatus::Repair).count() as i64,
            },
            assets_by_status,
            inventory_by_location: by_location
                .into_iter()
                .map(|(location, qty)| LocationQty { location, qty })
                .collect(),
            recent_assets,
            low_stock_list,
        }
    }
}
