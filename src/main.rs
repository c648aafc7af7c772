use std::{
    net::SocketAddr,
    sync::{Arc, Mutex},
};

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use clock::SystemClock;
use config::Config;
use persistence::FileBackend;
use timelock::TimeLockStore;

mod clock;
mod config;
mod http;
mod persistence;
mod request;
mod response;
mod store;
mod time_units;
mod timelock;

const DEFAULT_LOG_FILTER: &str = "timelock_server=info";
const ENV_FILE: &str = ".env";

fn init_tracing(json_logs: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    if json_logs {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {:?}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_file = Config::read_env_file(ENV_FILE)?;
    let config = Config::load(std::env::args().skip(1), |name| {
        std::env::var(name)
            .ok()
            .or_else(|| env_file.get(name).cloned())
    })?;
    init_tracing(config.json_logs());

    let backend = FileBackend::open(config.db_path())?;
    tracing::info!(
        "using database file {:?}{}",
        backend.path(),
        if config.test_mode() { " (test mode)" } else { "" }
    );
    let store = TimeLockStore::open(Box::new(backend), Box::new(SystemClock))?;
    let app = http::router(Arc::new(Mutex::new(store)), config.test_mode());

    let address = config.bind_address()?;
    let listener = TcpListener::bind(address).await?;
    tracing::info!(
        "Server is running {}:{} (listening on {})",
        config.hostname(),
        address.port(),
        address
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;
    Ok(())
}
