//! Patisserie bot server.
//!
//! Loads the TOML configuration, picks PostgreSQL or in-memory storage and
//! runs the sweeps, the metrics API and (with the `discord` feature) the
//! gateway client until Ctrl+C.

use clap::Parser;
use patisserie_bot::{BotConfig, BotServer};
use patisserie_core::{Clock, SystemClock};
use patisserie_database::{PostgresStores, connect_pool, run_migrations};
use patisserie_interface::{Backends, DirectoryService, NotificationSink, RoleAdministrator};
use patisserie_storage::InMemoryStack;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[cfg(feature = "discord")]
use patisserie_bot::{DiscordAdapter, DiscordHandler, build_client};

/// Command-line arguments for the bot server.
#[derive(Parser, Debug)]
#[command(name = "patisserie-bot")]
#[command(about = "Patisserie - bakery order bot")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "patisserie.toml")]
    config: PathBuf,

    /// PostgreSQL URL; in-memory storage when absent
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Discord bot token
    #[arg(long, env = "DISCORD_TOKEN")]
    #[cfg(feature = "discord")]
    discord_token: String,

    /// Emit JSON logs
    #[arg(long)]
    json_logs: bool,

    /// Validate configuration and exit
    #[arg(long)]
    check_config: bool,
}

type Adapters = (
    Arc<dyn NotificationSink>,
    Arc<dyn DirectoryService>,
    Arc<dyn RoleAdministrator>,
);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if args.json_logs {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    info!(config_file = ?args.config, "Loading configuration");
    let config = if args.config.exists() {
        BotConfig::from_file(&args.config)?
    } else {
        warn!(config_file = ?args.config, "Config file not found, using defaults");
        BotConfig::default()
    };

    if args.check_config {
        info!(
            owners = config.discord.owner_ids.len(),
            quota_schedule = %config.quota.schedule(),
            "Configuration valid"
        );
        return Ok(());
    }

    #[cfg(feature = "discord")]
    let adapter = DiscordAdapter::new(&args.discord_token, config.discord.clone());

    #[cfg(feature = "discord")]
    let (sink, directory, roles): Adapters = (
        Arc::new(adapter.clone()),
        Arc::new(adapter.clone()),
        Arc::new(adapter),
    );

    #[cfg(not(feature = "discord"))]
    let (sink, directory, roles): Adapters = {
        warn!("Built without the discord feature; notifications go to the log");
        let directory = patisserie_storage::InMemoryDirectory::new();
        (
            Arc::new(patisserie_bot::TracingSink),
            Arc::new(directory.clone()),
            Arc::new(directory),
        )
    };

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let backends = match &args.database_url {
        Some(url) => {
            info!("Using PostgreSQL storage");
            let pool = connect_pool(url, config.database.pool_size)?;
            run_migrations(&pool)?;
            PostgresStores::new(pool).backends(sink, directory, roles, clock)
        }
        None => {
            warn!("DATABASE_URL not set - state is kept in memory and lost on exit");
            in_memory(sink, directory, roles, clock)
        }
    };

    let server = BotServer::new(config.clone(), backends)?;

    #[cfg(feature = "discord")]
    {
        let handler = DiscordHandler::new(server.router(), &config);
        let mut client = build_client(&args.discord_token, handler).await?;
        let shard_manager = client.shard_manager.clone();
        let gateway = tokio::spawn(async move {
            if let Err(e) = client.start().await {
                tracing::error!(error = %e, "Discord client stopped");
            }
        });

        server
            .run_until(async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::error!(error = %e, "Failed to listen for Ctrl+C");
                }
            })
            .await?;
        shard_manager.shutdown_all().await;
        gateway.await?;
    }

    #[cfg(not(feature = "discord"))]
    {
        server.start().await?;
    }

    info!("Patisserie bot stopped");
    Ok(())
}

fn in_memory(
    sink: Arc<dyn NotificationSink>,
    directory: Arc<dyn DirectoryService>,
    roles: Arc<dyn RoleAdministrator>,
    clock: Arc<dyn Clock>,
) -> Backends {
    Backends {
        sink,
        directory,
        roles,
        ..InMemoryStack::new().backends(clock)
    }
}
