use serde::{Deserialize, Serialize};

use assetdesk_core::UserId;

use crate::{JwtClaims, Permission, Role, permissions_for_role};

/// A fully resolved principal for authorization decisions.
///
/// Built from verified token claims; the username doubles as the actor name
/// recorded in the audit log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub username: String,
    pub user_id: Option<UserId>,
    pub role: Role,
    pub permissions: Vec<Permission>,
}

impl Principal {
    pub fn from_claims(claims: &JwtClaims) -> Self {
        Self {
            username: claims.sub.clone(),
            user_id: claims.user_id,
            role: claims.role.clone(),
            permissions: permissions_for_role(&claims.role),
        }
    }

    pub fn is_privileged(&self) -> bool {
        self.permissions.iter().any(Permission::is_wildcard)
    }
}
