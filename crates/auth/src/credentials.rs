//! Static account directory (admin + read-only user) configured at startup.

use assetdesk_core::UserId;

use crate::Role;

/// A configured login.
#[derive(Debug, Clone)]
pub struct Account {
    pub username: String,
    pub password: String,
    pub role: Role,
    /// Derived from the username, so it survives restarts.
    pub user_id: UserId,
}

impl Account {
    pub fn new(username: impl Into<String>, password: impl Into<String>, role: Role) -> Self {
        let username = username.into();
        Self {
            user_id: UserId::for_username(&username),
            username,
            password: password.into(),
            role,
        }
    }
}

/// Username/password lookup.
#[derive(Debug, Clone, Default)]
pub struct CredentialDirectory {
    accounts: Vec<Account>,
}

impl CredentialDirectory {
    pub fn new(accounts: Vec<Account>) -> Self {
        // Accounts with empty usernames or passwords can never log in.
        let accounts = accounts
            .into_iter()
            .filter(|a| !a.username.is_empty() && !a.password.is_empty())
            .collect::<Vec<_>>();
        if accounts.is_empty() {
            tracing::warn!("no login accounts configured; every login will be rejected");
        }
        Self { accounts }
    }

    /// Return the matching account, if the credentials are valid.
    pub fn verify(&self, username: &str, password: &str) -> Option<&Account> {
        self.accounts
            .iter()
            .find(|a| a.username == username && a.password == password)
    }
}
