use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::Role;

/// Permission identifier.
///
/// Permissions are modeled as opaque strings (e.g. "inventory.read").
/// A special wildcard permission `"*"` grants everything.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub const ASSETS_READ: &'static str = "assets.read";
    pub const ASSETS_WRITE: &'static str = "assets.write";
    pub const INVENTORY_READ: &'static str = "inventory.read";
    pub const INVENTORY_WRITE: &'static str = "inventory.write";
    pub const INVENTORY_MOVE: &'static str = "inventory.move";
    pub const ACTIVITY_READ: &'static str = "activity.read";
    pub const DASHBOARD_READ: &'static str = "dashboard.read";
    pub const DIAGRAMS_READ: &'static str = "diagrams.read";
    pub const DIAGRAMS_WRITE: &'static str = "diagrams.write";

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn wildcard() -> Self {
        Self::new("*")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        self.as_str() == "*"
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Role → permission policy.
///
/// `admin` is the privileged actor and may do everything; `user` may only
/// read. Unknown roles get nothing.
pub fn permissions_for_role(role: &Role) -> Vec<Permission> {
    match role.as_str() {
        Role::ADMIN => vec![Permission::wildcard()],
        Role::USER => [
            Permission::ASSETS_READ,
            Permission::INVENTORY_READ,
            Permission::ACTIVITY_READ,
            Permission::DASHBOARD_READ,
            Permission::DIAGRAMS_READ,
        ]
        .into_iter()
        .map(Permission::new)
        .collect(),
        _ => Vec::new(),
    }
}
