use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use moodify_server::config::{self, AppConfig};
use moodify_server::profile_store::FileProfileStore;
use moodify_server::sqlite_persistence::{schema, RecordStore};

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to TOML configuration file. Values in the file override CLI arguments.
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// Path to the sqlite history database.
    #[clap(long, default_value = "moodify.db")]
    pub db_path: PathBuf,

    /// Directory holding the per-user profile documents.
    #[clap(long, default_value = "profiles")]
    pub profiles_dir: PathBuf,

    /// Directory for transient upload files.
    #[clap(long, default_value = "uploads")]
    pub uploads_dir: PathBuf,

    /// Default number of entries returned by limited history reads.
    #[clap(long, default_value_t = 10)]
    pub history_limit: usize,

    /// Optional market code forwarded to the recommendation lookup.
    #[clap(long)]
    pub market: Option<String>,
}

impl From<&CliArgs> for config::CliConfig {
    fn from(args: &CliArgs) -> Self {
        config::CliConfig {
            db_path: args.db_path.clone(),
            profiles_dir: args.profiles_dir.clone(),
            uploads_dir: args.uploads_dir.clone(),
            history_limit: args.history_limit,
            market: args.market.clone(),
        }
    }
}

/// Applies the schema migration explicitly (it is not a side effect of DAO
/// construction) and reports store stats.
fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .unwrap();

    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            Some(config::FileConfig::load(path)?)
        }
        None => None,
    };
    let app_config = AppConfig::resolve(&config::CliConfig::from(&cli_args), file_config);

    let store = RecordStore::open(&app_config.db_path)?;
    schema::migrate(&store)?;

    let profiles = FileProfileStore::new(&app_config.profiles_dir)?;

    info!(
        "Stores ready: {} users, {} mood events, {} listening events, {} songs, {} profile documents",
        store.count(&schema::USERS)?,
        store.count(&schema::MOOD_HISTORY)?,
        store.count(&schema::LISTENING_HISTORY)?,
        store.count(&schema::SONGS)?,
        profiles.profile_count()?,
    );

    Ok(())
}
