use assetdesk_auth::{CommandAuthorization, Permission};

use crate::app::errors::ApiError;

/// Small helper wrapper to associate required permissions with a command.
pub struct CmdAuth<C> {
    pub inner: C,
    pub required: Vec<Permission>,
}

impl<C> CmdAuth<C> {
    pub fn new(inner: C, permission: &'static str) -> Self {
        Self {
            inner,
            required: vec![Permission::new(permission)],
        }
    }
}

impl<C> CommandAuthorization for CmdAuth<C> {
    fn required_permissions(&self) -> &[Permission] {
        &self.required
    }
}

/// Parse a path segment into a typed id (`400 invalid_id` on failure).
pub fn parse_id<T>(raw: &str) -> Result<T, ApiError>
where
    T: std::str::FromStr<Err = assetdesk_core::DomainError>,
{
    Ok(raw.trim().parse::<T>()?)
}
