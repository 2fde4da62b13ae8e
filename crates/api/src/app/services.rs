//! Service wiring: picks a storage backend and builds everything handlers use.

use std::sync::Arc;

use chrono::Utc;
use sqlx::PgPool;

use assetdesk_auth::{CredentialDirectory, Hs256Jwt, JwtClaims, JwtValidator, TokenIssuer};
use assetdesk_infra::diagrams::{DiagramStore, StorageStatus};
use assetdesk_infra::store::{
    ActivityStore, AssetStore, DashboardQuery, InMemoryStore, InventoryStore, PostgresStore,
};
use assetdesk_infra::{db, AssetService, AuditLogger, InventoryService, LedgerWriter, StoreError};

use crate::app::dto::LoginResponse;
use crate::config::ApiConfig;

/// Which storage backend is live.
#[derive(Clone)]
pub enum Backend {
    InMemory,
    Postgres(PgPool),
}

impl Backend {
    pub fn name(&self) -> &'static str {
        match self {
            Backend::InMemory => "in-memory",
            Backend::Postgres(_) => "postgres",
        }
    }
}

/// Login + token minting.
pub struct Sessions {
    directory: CredentialDirectory,
    jwt: Arc<Hs256Jwt>,
    ttl: chrono::Duration,
}

impl Sessions {
    pub fn new(directory: CredentialDirectory, jwt: Arc<Hs256Jwt>, ttl: chrono::Duration) -> Self {
        Self { directory, jwt, ttl }
    }

    /// `Ok(None)` means the credentials were wrong.
    pub fn login(&self, username: &str, password: &str) -> Result<Option<LoginResponse>, StoreError> {
        let Some(account) = self.directory.verify(username, password) else {
            return Ok(None);
        };

        let claims = JwtClaims::new(
            account.username.clone(),
            Some(account.user_id),
            account.role.clone(),
            Utc::now(),
            self.ttl,
        );
        let token = self
            .jwt
            .issue(&claims)
            .map_err(|e| StoreError::internal(format!("token signing failed: {e}")))?;

        Ok(Some(LoginResponse {
            token,
            role: account.role.to_string(),
        }))
    }

    pub fn validator(&self) -> Arc<dyn JwtValidator> {
        self.jwt.clone()
    }
}

pub struct AppServices {
    pub assets: AssetService,
    pub inventory: InventoryService,
    pub ledger: LedgerWriter,
    pub audit: AuditLogger,
    pub dashboard: Arc<dyn DashboardQuery>,
    pub diagrams: Option<DiagramStore>,
    pub storage_status: StorageStatus,
    pub sessions: Sessions,
    pub backend: Backend,
}

impl AppServices {
    /// Close the connection pool once the server has drained.
    pub async fn shutdown(&self) {
        if let Backend::Postgres(pool) = &self.backend {
            db::close(pool).await;
        }
    }
}

/// Build services from config: Postgres when `DATABASE_URL` is set, in-memory otherwise.
pub async fn build_services(config: &ApiConfig) -> Result<AppServices, StoreError> {
    let diagrams = if config.storage.enabled {
        let store = DiagramStore::new(config.storage.path.clone());
        store.ensure_dir().await?;
        Some(store)
    } else {
        None
    };

    let sessions = Sessions::new(
        CredentialDirectory::new(config.accounts.clone()),
        Arc::new(Hs256Jwt::new(config.jwt_secret.as_bytes())),
        config.token_ttl,
    );

    let services = match &config.database {
        Some(db_config) => {
            let pool = db::connect(db_config).await?;
            let store = Arc::new(PostgresStore::new(pool.clone()));
            wire(store, Backend::Postgres(pool), diagrams, sessions, &config.storage)
        }
        None => wire(Arc::new(InMemoryStore::new()), Backend::InMemory, diagrams, sessions, &config.storage),
    };

    tracing::info!(
        backend = services.backend.name(),
        diagram_storage = config.storage.enabled,
        "services ready"
    );

    Ok(services)
}

/// One store object serves every storage seam.
fn wire<S>(
    store: Arc<S>,
    backend: Backend,
    diagrams: Option<DiagramStore>,
    sessions: Sessions,
    storage: &crate::config::DiagramStorageConfig,
) -> AppServices
where
    S: AssetStore + InventoryStore + ActivityStore + DashboardQuery + 'static,
{
    let activity: Arc<dyn ActivityStore> = store.clone();
    let assets: Arc<dyn AssetStore> = store.clone();
    let inventory: Arc<dyn InventoryStore> = store.clone();
    let dashboard: Arc<dyn DashboardQuery> = store;

    let audit = AuditLogger::new(activity);

    AppServices {
        assets: AssetService::new(assets, audit.clone()),
        inventory: InventoryService::new(inventory.clone(), audit.clone()),
        ledger: LedgerWriter::new(inventory, audit.clone()),
        audit,
        dashboard,
        diagrams,
        storage_status: StorageStatus::new(storage.enabled, storage.git_backup),
        sessions,
        backend,
    }
}
