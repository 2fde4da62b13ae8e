//! Hardware asset domain module (laptops, servers, network gear).
//!
//! Pure record types and validation rules; storage lives in `assetdesk-infra`.

pub mod asset;

pub use asset::{Asset, AssetPatch, AssetStatus, AssetType, NewAsset};
