//! Infrastructure layer: storage backends, the stock ledger, audit trail,
//! dashboard aggregation and diagram files.

pub mod audit;
pub mod dashboard;
pub mod db;
pub mod diagrams;
pub mod error;
pub mod ledger;
pub mod services;
pub mod store;

mod integration_tests;

pub use audit::{Actor, AuditLogger};
pub use error::{StoreError, StoreResult};
pub use ledger::{LedgerError, LedgerWriter, MoveRequest};
pub use services::{AssetService, InventoryService};
