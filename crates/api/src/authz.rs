//! API-side authorization guard.
//!
//! This enforces authorization at the request boundary (before calling into
//! services), while keeping the ledger, audit logger and stores auth-agnostic.

use assetdesk_auth::{AuthzError, CommandAuthorization, Permission, authorize};

use crate::app::routes::common::CmdAuth;
use crate::context::PrincipalContext;

/// Check authorization for a command in the current request context.
///
/// This is intended to be called **before** the command reaches a service.
pub fn authorize_command<C: CommandAuthorization>(
    principal: &PrincipalContext,
    command: &C,
) -> Result<(), AuthzError> {
    for perm in command.required_permissions() {
        authorize(principal.principal(), perm)?;
    }
    Ok(())
}

/// Check a single permission for a request that carries no command body.
pub fn require(principal: &PrincipalContext, permission: &'static str) -> Result<(), AuthzError> {
    authorize_command(principal, &CmdAuth::new((), permission))
}
