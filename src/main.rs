use bookmarkd::auth::TokenDb;
use bookmarkd::db::{self, BookmarkDb};
use bookmarkd::error::Result;
use bookmarkd::server::{self, AppState};
use bookmarkd::{config, utils};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Optional custom database file path
    #[arg(long)]
    db: Option<PathBuf>,

    /// Optional custom configuration file path
    #[arg(long)]
    config: Option<PathBuf>,

    /// Address to listen on (overrides config)
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (overrides config)
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    // Initialize logger
    env_logger::init();

    // Load configuration
    let cfg = if let Some(config_path) = &args.config {
        config::Config::load_from_path(config_path)
            .map_err(|e| bookmarkd::Error::Config(e.to_string()))?
    } else {
        config::Config::load()
    };

    let db_path = args
        .db
        .or_else(|| cfg.database.clone())
        .unwrap_or_else(|| utils::get_default_dbdir().join("bookmarks.db"));

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // One connection handle, both stores attached to it.
    let handle = db::open(&db_path)?;
    let state = Arc::new(AppState {
        bookmarks: BookmarkDb::attach(handle.clone())?,
        tokens: TokenDb::attach(handle)?,
    });
    log::info!("Using database at {}", db_path.display());

    let host = args.host.unwrap_or(cfg.host);
    let port = args.port.unwrap_or(cfg.port);
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .map_err(|e| bookmarkd::Error::Config(format!("invalid listen address: {e}")))?;

    server::serve(addr, state).await
}
