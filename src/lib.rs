//! Catalog application library
//!
//! Feature modules for genres, authors and books, plus the bootstrap that
//! wires them to the document store and the HTTP server.

pub mod modules;
pub mod utils;

use std::sync::Arc;

use anyhow::Context;
use catalog_db::{DocumentStore, SqliteStore};
use catalog_kernel::{settings::Settings, AppState, InitCtx, ModuleRegistry};

/// Registry with every catalog module, in mount order
pub fn build_registry() -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry);
    registry
}

/// Open the configured SQLite document store
pub fn open_store(settings: &Settings) -> anyhow::Result<SqliteStore> {
    SqliteStore::open(&settings.database.path)
        .with_context(|| format!("failed to open database at {}", settings.database.path))
}

/// Apply pending module migrations, returning how many ran
pub async fn migrate(
    store: &dyn DocumentStore,
    registry: &ModuleRegistry,
) -> anyhow::Result<usize> {
    let migrations = registry.collect_migrations();
    let applied = store
        .apply_migrations(&migrations)
        .await
        .context("failed to apply migrations")?;

    tracing::info!(applied, total = migrations.len(), "migrations complete");
    Ok(applied)
}

/// Run the catalog server until shutdown
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    tracing::info!(
        env = ?settings.environment,
        db = %settings.database.path,
        "catalog bootstrap starting"
    );

    let store = Arc::new(open_store(&settings)?);
    let registry = build_registry();
    migrate(store.as_ref(), &registry).await?;

    let ctx = InitCtx {
        settings: &settings,
        store: store.as_ref(),
    };
    registry.init_modules(&ctx).await?;
    registry.start_modules(&ctx).await?;

    tracing::info!(modules = registry.module_count(), "catalog bootstrap complete");

    let state = AppState::new(store.clone());
    let served = catalog_http::start_server(&registry, &settings, state).await;

    registry.stop_modules().await?;
    served
}
