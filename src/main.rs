use anyhow::Context;
use jokes_app::App;
use jokes_kernel::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().with_context(|| "failed to load jokes settings")?;
    jokes_telemetry::init(&settings.telemetry)?;

    tracing::info!(
        env = ?settings.environment,
        db = %settings.database.url,
        "jokes-app bootstrap starting"
    );

    App::prepare(settings).await?.serve().await
}
