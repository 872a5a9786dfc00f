//! privmask REST API server
//!
//! Run with: cargo run --features server --bin privmask-server
//!
//! Configured through PRIVMASK_DB, PRIVMASK_HOST, PORT and PRIVMASK_SEED.

use std::sync::Arc;

use privmask::{router, Config, Db, PrivmaskError, Result, Seed};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let config = Config::from_env()?;

    info!(path = %config.db_path.display(), "opening role store");
    let db = Db::open(&config.db_path)?;
    if let Some(path) = &config.seed {
        db.apply_seed(&Seed::load(path)?)?;
    }

    let app = router(Arc::new(db));
    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| PrivmaskError::Config(format!("cannot bind {addr}: {e}")))?;
    info!(%addr, "privmask server listening");
    axum::serve(listener, app)
        .await
        .map_err(|e| PrivmaskError::Storage(e.to_string()))
}
