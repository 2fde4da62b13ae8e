use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use assetdesk_core::{DomainError, DomainResult, Entity, InventoryItemId};

/// Inventory category.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InventoryCategory {
    Storage,
    Memory,
    Network,
    Peripheral,
    Other,
}

impl InventoryCategory {
    pub const ALL: [InventoryCategory; 5] = [
        InventoryCategory::Storage,
        InventoryCategory::Memory,
        InventoryCategory::Network,
        InventoryCategory::Peripheral,
        InventoryCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InventoryCategory::Storage => "STORAGE",
            InventoryCategory::Memory => "MEMORY",
            InventoryCategory::Network => "NETWORK",
            InventoryCategory::Peripheral => "PERIPHERAL",
            InventoryCategory::Other => "OTHER",
        }
    }
}

impl core::str::FromStr for InventoryCategory {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                DomainError::invalid_input(
                    "category must be one of: STORAGE, MEMORY, NETWORK, PERIPHERAL, OTHER",
                )
            })
    }
}

impl core::fmt::Display for InventoryCategory {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A consumable stock record.
///
/// `stock` is owned by the movement ledger once the item exists: CRUD updates
/// go through [`InventoryItemPatch`], which has no stock field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: InventoryItemId,
    pub sku: String,
    pub name: String,
    pub category: InventoryCategory,
    pub unit: Option<String>,
    pub location: Option<String>,
    pub stock: i64,
    pub min_stock: i64,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InventoryItem {
    /// Materialize a validated creation request.
    pub fn create(id: InventoryItemId, new: NewInventoryItem, now: DateTime<Utc>) -> DomainResult<Self> {
        let new = new.validate()?;
        Ok(Self {
            id,
            sku: new.sku,
            name: new.name,
            category: new.category,
            unit: new.unit,
            location: new.location,
            stock: new.stock,
            min_stock: new.min_stock,
            notes: new.notes,
            created_at: now,
            updated_at: now,
        })
    }

    /// Low stock: strictly below the configured minimum.
    pub fn is_low_stock(&self) -> bool {
        self.stock < self.min_stock
    }
}

impl Entity for InventoryItem {
    type Id = InventoryItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn display_key(&self) -> &str {
        &self.sku
    }
}

/// Creation request for an inventory item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInventoryItem {
    pub sku: String,
    pub name: String,
    #[serde(default = "default_category")]
    pub category: InventoryCategory,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub min_stock: i64,
    #[serde(default)]
    pub notes: Option<String>,
}

fn default_category() -> InventoryCategory {
    InventoryCategory::Other
}

impl NewInventoryItem {
    /// Trim text fields and enforce required fields / non-negative counters.
    pub fn validate(self) -> DomainResult<Self> {
        let sku = required(self.sku, "sku")?;
        let name = required(self.name, "name")?;
        non_negative(self.stock, "stock")?;
        non_negative(self.min_stock, "minStock")?;

        Ok(Self {
            sku,
            name,
            category: self.category,
            unit: optional(self.unit),
            location: optional(self.location),
            stock: self.stock,
            min_stock: self.min_stock,
            notes: optional(self.notes),
        })
    }
}

/// Partial update for an inventory item. Absent fields are left untouched.
///
/// Optional text fields accept an empty string to clear the value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItemPatch {
    pub sku: Option<String>,
    pub name: Option<String>,
    pub category: Option<InventoryCategory>,
    pub unit: Option<String>,
    pub location: Option<String>,
    pub min_stock: Option<i64>,
    pub notes: Option<String>,
}

impl InventoryItemPatch {
    /// Apply the patch, validating every touched field.
    pub fn apply_to(self, item: &mut InventoryItem, now: DateTime<Utc>) -> DomainResult<()> {
        if let Some(sku) = self.sku {
            item.sku = required(sku, "sku")?;
        }
        if let Some(name) = self.name {
            item.name = required(name, "name")?;
        }
        if let Some(category) = self.category {
            item.category = category;
        }
        if let Some(unit) = self.unit {
            item.unit = optional(Some(unit));
        }
        if let Some(location) = self.location {
            item.location = optional(Some(location));
        }
        if let Some(min_stock) = self.min_stock {
            non_negative(min_stock, "minStock")?;
            item.min_stock = min_stock;
        }
        if let Some(notes) = self.notes {
            item.notes = optional(Some(notes));
        }
        item.updated_at = now;
        Ok(())
    }
}

fn required(value: String, field: &str) -> DomainResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::invalid_input(format!("{field} cannot be empty")));
    }
    Ok(trimmed.to_string())
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn non_negative(value: i64, field: &str) -> DomainResult<()> {
    if value < 0 {
        return Err(DomainError::invalid_input(format!("{field} cannot be negative")));
    }
    Ok(())
}
