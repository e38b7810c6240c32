use std::{path::PathBuf, sync::Arc};

use {
    clap::{Parser, Subcommand},
    secrecy::ExposeSecret,
    sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

use {
    thumbgrab_config::BotConfig,
    thumbgrab_ledger::{RequesterLedger, SqliteLedger},
    thumbgrab_telegram::{Services, bot},
};

#[derive(Parser)]
#[command(name = "thumbgrab", about = "thumbgrab — YouTube thumbnail Telegram bot")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file path (overrides discovery).
    #[arg(long, global = true, env = "THUMBGRAB_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot (default when no subcommand is provided).
    Run,
    /// Print usage statistics from the ledger.
    Stats,
    /// Ban a requester by user ID.
    Ban { user_id: i64 },
    /// Lift a ban.
    Unban { user_id: i64 },
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<BotConfig> {
    match &cli.config {
        Some(path) => thumbgrab_config::load_config(path),
        None => Ok(thumbgrab_config::discover_and_load()),
    }
}

/// Open (creating if necessary) the SQLite ledger at the configured path.
async fn open_ledger(config: &BotConfig) -> anyhow::Result<SqliteLedger> {
    let path = config
        .database_path
        .clone()
        .unwrap_or_else(thumbgrab_config::default_database_path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let pool = SqlitePoolOptions::new()
        .connect_with(
            SqliteConnectOptions::new()
                .filename(&path)
                .create_if_missing(true),
        )
        .await?;
    SqliteLedger::init(&pool).await?;

    info!(path = %path.display(), "ledger opened");
    Ok(SqliteLedger::new(pool))
}

async fn run(config: BotConfig) -> anyhow::Result<()> {
    if config.token.expose_secret().is_empty() {
        anyhow::bail!(
            "no bot token configured: set `token` in thumbgrab.toml or via ${{BOT_TOKEN}}"
        );
    }

    let ledger: Arc<dyn RequesterLedger> = Arc::new(open_ledger(&config).await?);
    let services = Arc::new(Services::new(config, ledger)?);

    let cancel = bot::start_polling(services).await?;

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    cancel.cancel();
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_telemetry(&cli);
    info!(version = env!("CARGO_PKG_VERSION"), "thumbgrab starting");

    let config = load_config(&cli)?;

    match cli.command {
        None | Some(Commands::Run) => run(config).await,
        Some(Commands::Stats) => {
            let ledger = open_ledger(&config).await?;
            let stats = ledger.stats().await?;
            println!("Requesters:           {}", stats.requesters);
            println!("Thumbnails delivered: {}", stats.usage_events);
            Ok(())
        },
        Some(Commands::Ban { user_id }) => {
            let ledger = open_ledger(&config).await?;
            ledger.set_banned(user_id, true).await?;
            println!("Banned {user_id}.");
            Ok(())
        },
        Some(Commands::Unban { user_id }) => {
            let ledger = open_ledger(&config).await?;
            ledger.set_banned(user_id, false).await?;
            println!("Unbanned {user_id}.");
            Ok(())
        },
    }
}
