use anyhow::{Context, Result};
use clap::Parser;
use rand::distr::{Alphanumeric, SampleString};
use std::sync::Arc;
use std::{fmt::Debug, path::PathBuf};
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod geo_index;
use geo_index::{GeoIndex, HaversineGeoIndex};

mod marketplace;

mod server;
use server::{run_server, RequestsLoggingLevel};

mod shift_store;
use shift_store::{ShiftStore, SqliteShiftStore};

mod sqlite_persistence;

mod user;
use user::{SqliteUserStore, TokenService};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to the SQLite shifts database file.
    #[clap(value_parser = parse_path)]
    pub shift_db: PathBuf,

    /// Path to the SQLite database file to use for user storage.
    #[clap(value_parser = parse_path)]
    pub user_store_file_path: PathBuf,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3000)]
    pub port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Secret used to sign session tokens. A random one is generated when
    /// absent, which invalidates all sessions on restart.
    #[clap(long, env = "JWT_SECRET")]
    pub jwt_secret: Option<String>,

    /// Path to the frontend directory to be statically served.
    #[clap(long)]
    pub frontend_dir_path: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
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

    info!("Opening SQLite shifts database at {:?}...", cli_args.shift_db);
    let shift_store: Arc<dyn ShiftStore> = Arc::new(SqliteShiftStore::new(&cli_args.shift_db)?);

    let user_store = Arc::new(SqliteUserStore::new(&cli_args.user_store_file_path)?);

    let jwt_secret = match cli_args.jwt_secret {
        Some(secret) => secret,
        None => {
            warn!("No JWT secret configured, generating a random one. Sessions will not survive a restart.");
            Alphanumeric.sample_string(&mut rand::rng(), 48)
        }
    };
    let token_service = Arc::new(TokenService::new(&jwt_secret));

    info!("Indexing open shifts for proximity search...");
    let geo_index: Arc<dyn GeoIndex> = Arc::new(HaversineGeoIndex::new());
    let open_shifts = shift_store.get_open_shifts()?;
    geo_index.rebuild(&open_shifts)?;
    info!("Indexed {} open shifts", open_shifts.len());

    info!("Ready to serve at port {}!", cli_args.port);
    run_server(
        shift_store,
        user_store,
        geo_index,
        token_service,
        cli_args.logging_level,
        cli_args.port,
        cli_args.frontend_dir_path,
    )
    .await
}
