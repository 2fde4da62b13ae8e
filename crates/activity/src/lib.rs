//! Activity (audit) log domain module.
//!
//! Audit entries are append-only: this crate defines their shape and the
//! query filter, never an update path.

pub mod log;

pub use log::{ActivityAction, ActivityFilter, ActivityLog, EntityType, NewActivityLog};
