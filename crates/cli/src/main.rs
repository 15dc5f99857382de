use anyhow::Context;
use clap::{Parser, Subcommand};
use jokes_app::App;
use jokes_kernel::settings::Settings;

/// Operate the jokes service
#[derive(Parser, Debug)]
#[command(name = "jokes", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default)
    Serve {
        /// Override `server.host`
        #[arg(long)]
        host: Option<String>,
        /// Override `server.port`
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Apply pending database migrations and exit
    Migrate,
    /// Print the resolved configuration as JSON
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load().with_context(|| "failed to load jokes settings")?;
    jokes_telemetry::init(&settings.telemetry)?;

    match cli.command.unwrap_or(Command::Serve {
        host: None,
        port: None,
    }) {
        Command::Serve { host, port } => {
            if let Some(host) = host {
                settings.server.host = host;
            }
            if let Some(port) = port {
                settings.server.port = port;
            }

            tracing::info!(env = ?settings.environment, "serving jokes");
            App::prepare(settings).await?.serve().await
        }
        Command::Migrate => {
            let applied = jokes_app::bootstrap::migrate(&settings).await?;
            println!("applied {} migration(s)", applied);
            Ok(())
        }
        Command::Config => {
            let rendered = serde_json::to_string_pretty(&settings)
                .context("failed to render settings")?;
            println!("{}", rendered);
            Ok(())
        }
    }
}
