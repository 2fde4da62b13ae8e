use assetdesk_auth::{Principal, Role};
use assetdesk_core::UserId;
use assetdesk_infra::Actor;

/// Principal context for a request (authenticated identity + permissions).
///
/// Inserted by the auth middleware; present on every protected route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    principal: Principal,
}

impl PrincipalContext {
    pub fn new(principal: Principal) -> Self {
        Self { principal }
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    pub fn username(&self) -> &str {
        &self.principal.username
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.principal.user_id
    }

    pub fn role(&self) -> &Role {
        &self.principal.role
    }

    /// The identity recorded on ledger rows and audit entries.
    pub fn actor(&self) -> Actor {
        Actor::new(self.principal.username.clone(), self.principal.user_id)
    }
}
