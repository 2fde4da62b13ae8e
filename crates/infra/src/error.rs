//! Storage-layer error model.

use thiserror::Error;

use assetdesk_core::DomainError;

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors returned by storage backends and the services built on them.
///
/// Deterministic failures (bad input, missing rows, negative stock, unique
/// violations) are carried as [`DomainError`]. `Transient` covers failures
/// where retrying the same request may succeed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Lock/serialization conflicts, pool exhaustion, lost connections.
    #[error("transient storage failure: {0}")]
    Transient(String),

    #[error("storage failure: {0}")]
    Internal(String),
}

impl StoreError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::Domain(DomainError::not_found(what))
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

/// Map SQLx errors to [`StoreError`] by SQLSTATE.
///
/// | SQLSTATE / error | StoreError |
/// |---|---|
/// | `23505` unique violation | `Domain(Conflict)` |
/// | `23503` foreign key violation | `Domain(NotFound)` |
/// | `23514` check violation | `Domain(InvalidState)` |
/// | `40001`, `40P01`, `55P03` | `Transient` |
/// | pool timeout / closed, IO | `Transient` |
/// | anything else | `Internal` |
pub(crate) fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = db_err.message().to_string();
            match db_err.code().as_deref() {
                Some("23505") => {
                    let what = db_err.constraint().map(unique_field).unwrap_or("value");
                    DomainError::conflict(format!("{what} already exists")).into()
                }
                Some("23503") => DomainError::not_found(format!("referenced record ({msg})")).into(),
                Some("23514") => DomainError::invalid_state(msg).into(),
                Some("40001" | "40P01" | "55P03") => {
                    StoreError::Transient(format!("{operation}: {msg}"))
                }
                _ => StoreError::Internal(format!("database error in {operation}: {msg}")),
            }
        }
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StoreError::Transient(format!("{operation}: {err}"))
        }
        sqlx::Error::RowNotFound => {
            StoreError::Internal(format!("unexpected row not found in {operation}"))
        }
        _ => StoreError::Internal(format!("sqlx error in {operation}: {err}")),
    }
}

/// Client-facing field name for a unique constraint.
fn unique_field(constraint: &str) -> &'static str {
    match constraint {
        "inventory_items_sku_key" => "sku",
        "assets_asset_tag_key" => "assetTag",
        "assets_serial_number_key" => "serialNumber",
        _ => "value",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_failures_are_transient() {
        assert!(map_sqlx_error("op", sqlx::Error::PoolTimedOut).is_transient());
        assert!(map_sqlx_error("op", sqlx::Error::PoolClosed).is_transient());
        assert!(!map_sqlx_error("op", sqlx::Error::RowNotFound).is_transient());
    }

    #[test]
    fn constraint_names_map_to_fields() {
        assert_eq!(unique_field("assets_asset_tag_key"), "assetTag");
        assert_eq!(unique_field("something_else"), "value");
    }
}
