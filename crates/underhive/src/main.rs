//! # UNDERHIVE Bot
//!
//! ```bash
//! # token from the environment, everything else from underhive.toml
//! DISCORD_BOT_TOKEN=... ./underhive --config underhive.toml
//!
//! # more logging
//! RUST_LOG=underhive=debug,underhive_store=debug ./underhive
//! ```

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use poise::serenity_prelude as serenity;
use tracing::info;
use underhive::{framework_options, Config, Data};
use underhive_economy::MarketCatalog;
use underhive_store::Store;

#[derive(Parser)]
#[command(name = "underhive")]
#[command(about = "Necromunda campaign bot for Discord")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "underhive.toml")]
    config: PathBuf,

    /// Discord bot token (overrides config file)
    #[arg(long, env = "DISCORD_BOT_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// SQLite database path (overrides config file)
    #[arg(long, env = "UNDERHIVE_DATABASE")]
    database: Option<PathBuf>,

    /// Trading post CSV (overrides config file)
    #[arg(long, env = "UNDERHIVE_CATALOG")]
    catalog: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is optional
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let mut config = Config::load(&cli.config)?;
    if let Some(token) = cli.token {
        config.discord.token = Some(token);
    }
    if let Some(database) = cli.database {
        config.storage.database_path = database;
    }
    if let Some(catalog) = cli.catalog {
        config.market.catalog_path = catalog;
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(config.log_directive().parse()?),
        )
        .init();

    info!("Starting underhive v{}", env!("CARGO_PKG_VERSION"));
    info!("Config file: {}", cli.config.display());

    // === CATALOG ===
    let catalog = MarketCatalog::from_csv_path(&config.market.catalog_path).with_context(|| {
        format!(
            "failed to load trading post catalog {}",
            config.market.catalog_path.display()
        )
    })?;
    info!(
        items = catalog.len(),
        excluded = catalog.excluded(),
        categories = catalog.categories().len(),
        "Catalog loaded"
    );

    // === STORE ===
    let store = Store::open(&config.storage.database_path).with_context(|| {
        format!(
            "failed to open database {}",
            config.storage.database_path.display()
        )
    })?;

    // === DISCORD ===
    let token = config.token()?.to_string();
    let data = Data::new(store, catalog, config.market.generator.clone());
    let framework = poise::Framework::builder()
        .options(framework_options(&config.discord.owners))
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                info!(
                    user = %ready.user.name,
                    commands = framework.options().commands.len(),
                    "Connected and registered slash commands"
                );
                Ok(data)
            })
        })
        .build();

    let mut client = serenity::ClientBuilder::new(token, serenity::GatewayIntents::non_privileged())
        .framework(framework)
        .await
        .context("failed to build Discord client")?;
    client.start().await.context("Discord client stopped")?;
    Ok(())
}
