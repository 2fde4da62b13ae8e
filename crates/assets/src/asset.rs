use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use assetdesk_core::{AssetId, DomainError, DomainResult, Entity};

/// Hardware category of an asset.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssetType {
    Laptop,
    Pc,
    Server,
    Network,
    Printer,
    Other,
}

impl AssetType {
    pub const ALL: [AssetType; 6] = [
        AssetType::Laptop,
        AssetType::Pc,
        AssetType::Server,
        AssetType::Network,
        AssetType::Printer,
        AssetType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AssetType::Laptop => "LAPTOP",
            AssetType::Pc => "PC",
            AssetType::Server => "SERVER",
            AssetType::Network => "NETWORK",
            AssetType::Printer => "PRINTER",
            AssetType::Other => "OTHER",
        }
    }
}

impl core::str::FromStr for AssetType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                DomainError::invalid_input("type must be one of: LAPTOP, PC, SERVER, NETWORK, PRINTER, OTHER")
            })
    }
}

/// Lifecycle status of an asset.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssetStatus {
    InUse,
    InStock,
    Repair,
    Retired,
}

impl AssetStatus {
    pub const ALL: [AssetStatus; 4] = [
        AssetStatus::InUse,
        AssetStatus::InStock,
        AssetStatus::Repair,
        AssetStatus::Retired,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AssetStatus::InUse => "IN_USE",
            AssetStatus::InStock => "IN_STOCK",
            AssetStatus::Repair => "REPAIR",
            AssetStatus::Retired => "RETIRED",
        }
    }
}

impl core::str::FromStr for AssetStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|st| st.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                DomainError::invalid_input("status must be one of: IN_USE, IN_STOCK, REPAIR, RETIRED")
            })
    }
}

/// A tracked piece of hardware.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub id: AssetId,
    pub asset_tag: String,
    pub name: String,
    #[serde(rename = "type")]
    pub asset_type: AssetType,
    pub status: AssetStatus,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub assigned_to: Option<String>,
    pub location: Option<String>,
    pub purchase_date: Option<NaiveDate>,
    pub warranty_end: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Asset {
    pub fn create(id: AssetId, new: NewAsset, now: DateTime<Utc>) -> DomainResult<Self> {
        let new = new.validate()?;
        Ok(Self {
            id,
            asset_tag: new.asset_tag,
            name: new.name,
            asset_type: new.asset_type,
            status: new.status,
            brand: new.brand,
            model: new.model,
            serial_number: new.serial_number,
            assigned_to: new.assigned_to,
            location: new.location,
            purchase_date: new.purchase_date,
            warranty_end: new.warranty_end,
            notes: new.notes,
            created_at: now,
            updated_at: now,
        })
    }

    /// Case-insensitive free-text match over tag, name, serial and assignee.
    pub fn matches_search(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        [
            Some(self.asset_tag.as_str()),
            Some(self.name.as_str()),
            self.serial_number.as_deref(),
            self.assigned_to.as_deref(),
        ]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&needle))
    }
}

impl Entity for Asset {
    type Id = AssetId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn display_key(&self) -> &str {
        &self.asset_tag
    }
}

/// Creation request for an asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAsset {
    pub asset_tag: String,
    pub name: String,
    #[serde(rename = "type", default = "default_type")]
    pub asset_type: AssetType,
    #[serde(default = "default_status")]
    pub status: AssetStatus,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub serial_number: Option<String>,
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub purchase_date: Option<NaiveDate>,
    #[serde(default)]
    pub warranty_end: Option<NaiveDate>,
    #[serde(default)]
    pub notes: Option<String>,
}

fn default_type() -> AssetType {
    AssetType::Other
}

fn default_status() -> AssetStatus {
    AssetStatus::InStock
}

impl NewAsset {
    pub fn validate(self) -> DomainResult<Self> {
        let asset_tag = required(self.asset_tag, "assetTag")?;
        let name = required(self.name, "name")?;
        check_warranty(self.purchase_date, self.warranty_end)?;

        Ok(Self {
            asset_tag,
            name,
            asset_type: self.asset_type,
            status: self.status,
            brand: optional(self.brand),
            model: optional(self.model),
            // Blank serials become NULL so the unique index ignores them.
            serial_number: optional(self.serial_number),
            assigned_to: optional(self.assigned_to),
            location: optional(self.location),
            purchase_date: self.purchase_date,
            warranty_end: self.warranty_end,
            notes: optional(self.notes),
        })
    }
}

/// Partial update for an asset. Absent fields are left untouched; an empty
/// string clears an optional text field and `null` clears a date.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetPatch {
    pub asset_tag: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub asset_type: Option<AssetType>,
    pub status: Option<AssetStatus>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub assigned_to: Option<String>,
    pub location: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub purchase_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "double_option")]
    pub warranty_end: Option<Option<NaiveDate>>,
    pub notes: Option<String>,
}

impl AssetPatch {
    pub fn apply_to(self, asset: &mut Asset, now: DateTime<Utc>) -> DomainResult<()> {
        if let Some(tag) = self.asset_tag {
            asset.asset_tag = required(tag, "assetTag")?;
        }
        if let Some(name) = self.name {
            asset.name = required(name, "name")?;
        }
        if let Some(t) = self.asset_type {
            asset.asset_type = t;
        }
        if let Some(s) = self.status {
            asset.status = s;
        }
        if let Some(v) = self.brand {
            asset.brand = optional(Some(v));
        }
        if let Some(v) = self.model {
            asset.model = optional(Some(v));
        }
        if let Some(v) = self.serial_number {
            asset.serial_number = optional(Some(v));
        }
        if let Some(v) = self.assigned_to {
            asset.assigned_to = optional(Some(v));
        }
        if let Some(v) = self.location {
            asset.location = optional(Some(v));
        }
        if let Some(d) = self.purchase_date {
            asset.purchase_date = d;
        }
        if let Some(d) = self.warranty_end {
            asset.warranty_end = d;
        }
        if let Some(v) = self.notes {
            asset.notes = optional(Some(v));
        }
        check_warranty(asset.purchase_date, asset.warranty_end)?;
        asset.updated_at = now;
        Ok(())
    }
}

fn double_option<'de, D, T>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

fn check_warranty(purchase: Option<NaiveDate>, warranty_end: Option<NaiveDate>) -> DomainResult<()> {
    if let (Some(p), Some(w)) = (purchase, warranty_end) {
        if w < p {
            return Err(DomainError::invalid_input("warrantyEnd cannot precede purchaseDate"));
        }
    }
    Ok(())
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
