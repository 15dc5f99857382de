pub mod jokes;

use jokes_kernel::ModuleRegistry;
use sqlx::SqlitePool;

/// Register all service modules with the registry
pub fn register_all(registry: &mut ModuleRegistry, pool: &SqlitePool) -> anyhow::Result<()> {
    registry.register(jokes::create_module(pool.clone()))?;
    Ok(())
}
