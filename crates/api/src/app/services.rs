use std::sync::Arc;

use workstream_auth::{
    Authenticator, PasswordHasher, PermissionResolver, Provisioner, TokenService,
};
use workstream_core::StoreResult;
use workstream_infra::{MemoryStore, PostgresStore, SharedStore};

use crate::config::{AppConfig, Backend};

/// Everything a handler needs, shared behind one `Arc`.
pub struct AppServices {
    pub store: SharedStore,
    pub tokens: Arc<TokenService>,
    pub resolver: PermissionResolver<SharedStore>,
    pub provisioner: Provisioner<SharedStore>,
    pub authenticator: Authenticator<SharedStore>,
    pub hasher: PasswordHasher,
}

impl AppServices {
    pub fn new(store: SharedStore, tokens: Arc<TokenService>, hasher: PasswordHasher) -> Self {
        Self {
            resolver: PermissionResolver::new(store.clone()),
            provisioner: Provisioner::new(store.clone(), hasher),
            authenticator: Authenticator::new(store.clone(), tokens.clone(), hasher),
            store,
            tokens,
            hasher,
        }
    }
}

/// Open the configured backend, make sure its schema and permission catalog
/// exist, and wire the services around it.
pub async fn build_services(config: &AppConfig) -> StoreResult<AppServices> {
    let store: SharedStore = match &config.backend {
        Backend::InMemory => {
            let store = MemoryStore::new();
            store.seed_permissions(&config.permission_catalog)?;
            tracing::info!(backend = "memory", "storage ready");
            Arc::new(store)
        }
        Backend::Postgres { url, max_connections } => {
            let store = PostgresStore::connect(url, *max_connections).await?;
            store.migrate().await?;
            store.seed_permissions(&config.permission_catalog).await?;
            tracing::info!(backend = "postgres", "storage ready");
            Arc::new(store)
        }
    };

    let hasher = config
        .password_cost
        .map(PasswordHasher::with_cost)
        .unwrap_or_default();
    let tokens = Arc::new(TokenService::new(config.token.clone()));
    Ok(AppServices::new(store, tokens, hasher))
}
