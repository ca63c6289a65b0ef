use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::auth::{
    Argon2Hasher, AuthResolver, JwtCodec, MemorySessionStore, PasswordError, PgSessionStore,
    SessionStore,
};
use crate::config::{AppConfig, ConfigError, StoreBackend};
use crate::database::{
    CompanyStore, ConstructionStore, DatabaseError, DatabaseManager, FeatureStore, MemoryCatalog,
    PgCatalog, ProductStore, VariantStore,
};
use crate::services::{
    CompanyService, ConstructionService, FeatureService, ProductService, VariantService,
};

#[derive(Debug, Error)]
pub enum ContextError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Password(#[from] PasswordError),
}

/// Every store behind the trait objects the services consume
#[derive(Clone)]
pub struct Stores {
    pub companies: Arc<dyn CompanyStore>,
    pub features: Arc<dyn FeatureStore>,
    pub products: Arc<dyn ProductStore>,
    pub variants: Arc<dyn VariantStore>,
    pub constructions: Arc<dyn ConstructionStore>,
    pub sessions: Arc<dyn SessionStore>,
}

impl Stores {
    pub fn postgres(database: &DatabaseManager) -> Self {
        let catalog = Arc::new(PgCatalog::new(database.pool().clone()));
        Self {
            companies: catalog.clone(),
            features: catalog.clone(),
            products: catalog.clone(),
            variants: catalog.clone(),
            constructions: catalog,
            sessions: Arc::new(PgSessionStore::new(database.pool().clone())),
        }
    }

    pub fn memory(catalog: Arc<MemoryCatalog>) -> Self {
        Self {
            companies: catalog.clone(),
            features: catalog.clone(),
            products: catalog.clone(),
            variants: catalog.clone(),
            constructions: catalog,
            sessions: Arc::new(MemorySessionStore::new()),
        }
    }
}

/// Composition root shared by every handler as axum state
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<AppConfig>,
    pub database: Option<DatabaseManager>,
    pub auth: Arc<AuthResolver>,
    pub companies: Arc<CompanyService>,
    pub products: Arc<ProductService>,
    pub variants: Arc<VariantService>,
    pub constructions: Arc<ConstructionService>,
    pub features: Arc<FeatureService>,
}

impl AppContext {
    /// Build the context for the configured backend, connecting (and migrating) Postgres if selected
    pub async fn from_config(config: AppConfig) -> Result<Self, ContextError> {
        config.validate()?;

        match config.store.backend {
            StoreBackend::Postgres => {
                let database = DatabaseManager::connect(&config.database).await?;
                if config.database.run_migrations {
                    database.migrate().await?;
                }
                let stores = Stores::postgres(&database);
                Self::assemble(config, stores, Some(database))
            }
            StoreBackend::Memory => {
                info!("Using in-memory stores; data is lost on shutdown");
                Self::assemble(config, Stores::memory(Arc::new(MemoryCatalog::new())), None)
            }
        }
    }

    /// In-memory context over a caller-owned catalog, so categories and features can be seeded
    pub fn with_memory(config: AppConfig, catalog: Arc<MemoryCatalog>) -> Result<Self, ContextError> {
        config.validate()?;
        Self::assemble(config, Stores::memory(catalog), None)
    }

    fn assemble(
        config: AppConfig,
        stores: Stores,
        database: Option<DatabaseManager>,
    ) -> Result<Self, ContextError> {
        let codec = Arc::new(JwtCodec::new(
            &config.security.access_secret,
            &config.security.refresh_secret,
        ));
        let auth = Arc::new(AuthResolver::new(
            codec,
            stores.sessions.clone(),
            config.security.access_ttl(),
            config.security.refresh_ttl(),
        ));
        let hasher = Arc::new(Argon2Hasher::new(&config.password)?);

        let companies = CompanyService::new(
            stores.companies.clone(),
            hasher,
            auth.clone(),
            config.registration.capability_policy,
        );
        let products = ProductService::new(stores.products.clone(), stores.features.clone());
        let variants = VariantService::new(
            stores.variants.clone(),
            stores.products.clone(),
            stores.features.clone(),
        );
        let constructions =
            ConstructionService::new(stores.constructions.clone(), stores.features.clone());
        let features = FeatureService::new(stores.features.clone());

        Ok(Self {
            config: Arc::new(config),
            database,
            auth,
            companies: Arc::new(companies),
            products: Arc::new(products),
            variants: Arc::new(variants),
            constructions: Arc::new(constructions),
            features: Arc::new(features),
        })
    }
}
