//! Inventory domain module.
//!
//! This crate contains business rules for consumable inventory and its stock
//! ledger, implemented purely as deterministic domain logic (no IO, no HTTP,
//! no storage).

pub mod item;
pub mod movement;

pub use item::{InventoryCategory, InventoryItem, InventoryItemPatch, NewInventoryItem};
pub use movement::{Movement, MovementType, StockMove, replay, validate_quantity};
