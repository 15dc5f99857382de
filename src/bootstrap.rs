//! Application bootstrap: database, migrations, module lifecycle and server.

use anyhow::Context;
use axum::Router;
use jokes_kernel::settings::Settings;
use jokes_kernel::{InitCtx, ModuleRegistry};
use sqlx::SqlitePool;

use crate::modules;

/// A fully wired application, ready to serve
pub struct App {
    pub settings: Settings,
    pub pool: SqlitePool,
    pub registry: ModuleRegistry,
}

impl App {
    /// Connect to the database, register modules, migrate and initialize them.
    pub async fn prepare(settings: Settings) -> anyhow::Result<Self> {
        let (pool, registry) = connect_and_register(&settings).await?;

        let applied = jokes_db::apply_migrations(&pool, &registry.collect_migrations())
            .await
            .context("failed to apply migrations")?;
        tracing::info!(applied, "migrations up to date");

        registry
            .init_all(&InitCtx {
                settings: &settings,
            })
            .await?;

        Ok(Self {
            settings,
            pool,
            registry,
        })
    }

    /// The HTTP router with every module mounted
    pub fn router(&self) -> Router {
        jokes_http::build_router(&self.registry, &self.settings)
    }

    /// Start modules, serve until shutdown, then stop modules and close the pool.
    pub async fn serve(self) -> anyhow::Result<()> {
        let ctx = InitCtx {
            settings: &self.settings,
        };
        self.registry.start_all(&ctx).await?;

        let served = jokes_http::start_server(&self.registry, &self.settings).await;

        self.registry.stop_all().await?;
        self.pool.close().await;
        tracing::info!("jokes-app shut down");

        served
    }
}

/// Apply pending migrations without starting anything; returns how many ran.
pub async fn migrate(settings: &Settings) -> anyhow::Result<usize> {
    let (pool, registry) = connect_and_register(settings).await?;

    let applied = jokes_db::apply_migrations(&pool, &registry.collect_migrations())
        .await
        .context("failed to apply migrations")?;

    pool.close().await;
    Ok(applied)
}

async fn connect_and_register(settings: &Settings) -> anyhow::Result<(SqlitePool, ModuleRegistry)> {
    let pool = jokes_db::connect(&settings.database)
        .await
        .context("failed to open database")?;

    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, &pool)?;

    Ok((pool, registry))
}
