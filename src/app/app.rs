use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_port::*;
use crate::infra_memory::*;
use crate::infra_mysql::*;
use crate::logger::*;
use crate::settings::Settings;
use anyhow::anyhow;
use sqlx::MySqlPool;
use sqlx::mysql::MySqlPoolOptions;
use std::sync::Arc;
use std::time::Duration;

/// Service graph built from settings.
pub struct App {
    pub friendship_service: Arc<dyn FriendshipService>,
    pub session: Arc<dyn Session>,
    document_store: Arc<dyn DocumentStore>,
    memory_store: Option<Arc<InMemoryStore>>,
    pool: Option<MySqlPool>,
}

impl App {
    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        // region identity
        let identity: Arc<dyn IdentityProvider>;
        let session: Arc<dyn Session>;
        match settings.identity.backend.as_str() {
            "fake" => {
                let provider = Arc::new(FakeIdentityProvider::new());
                identity = provider.clone();
                session = provider;
            }
            "jwt" => {
                let key = std::env::var(&settings.identity.signing_key_env)
                    .unwrap_or_else(|_| {
                        warn!(
                            "{} not set, using the development signing key",
                            settings.identity.signing_key_env
                        );
                        "rapport-dev-secret-key".to_string()
                    })
                    .into_bytes();
                let provider = Arc::new(JwtIdentityProvider::new(JwtConfig {
                    issuer: settings.identity.issuer.clone(),
                    audience: settings.identity.audience.clone(),
                    token_ttl: Duration::from_secs(settings.identity.token_ttl_secs),
                    signing_key: key,
                }));
                identity = provider.clone();
                session = provider;
            }
            other => return Err(anyhow!("Unknown identity backend: {}", other)),
        }
        // endregion

        // region store
        let document_store: Arc<dyn DocumentStore>;
        let tx_manager: Arc<dyn TxManager>;
        let mut memory_store = None;
        let mut pool = None;
        match settings.store.backend.as_str() {
            "memory" => {
                let store = Arc::new(InMemoryStore::new());
                document_store = store.clone();
                tx_manager = store.clone();
                memory_store = Some(store);
            }
            "mysql" => {
                let dsn = settings
                    .store
                    .dsn
                    .as_deref()
                    .ok_or_else(|| anyhow!("store.dsn is required for the mysql backend"))?;
                let mysql = MySqlPoolOptions::new()
                    .max_connections(settings.store.max_connections)
                    .connect(dsn)
                    .await?;
                document_store = Arc::new(MySqlDocumentStore::new(mysql.clone()));
                tx_manager = Arc::new(MySqlTxManager::new(mysql.clone()));
                pool = Some(mysql);
            }
            other => return Err(anyhow!("Unknown store backend: {}", other)),
        }
        // endregion

        let friendship_service: Arc<dyn FriendshipService> = Arc::new(
            RealFriendshipService::new(document_store.clone(), tx_manager, identity),
        );

        info!(
            store = %settings.store.backend,
            identity = %settings.identity.backend,
            "friend graph ready"
        );

        Ok(Self {
            friendship_service,
            session,
            document_store,
            memory_store,
            pool,
        })
    }

    /// Raw projection access. Carries no relationship invariant.
    pub fn graph_store(&self) -> FriendGraphStore {
        FriendGraphStore::new(self.document_store.clone())
    }

    /// Set only for the `memory` store backend.
    pub fn memory_store(&self) -> Option<&Arc<InMemoryStore>> {
        self.memory_store.as_ref()
    }

    pub async fn shutdown(&self) {
        info!("friend graph shutting down...");
        if let Some(pool) = &self.pool {
            pool.close().await;
        }
    }
}
