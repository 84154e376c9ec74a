use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context as _;
use clap::Parser as _;

use readshelf::catalog::CatalogClient;
use readshelf::config::Config;
use readshelf::library::PgLibraryStore;
use readshelf::server::{self, AppState};

#[derive(Debug, clap::Parser)]
#[command(author, version, about)]
struct Args {
    /// Listen address override; defaults to 0.0.0.0 on $PORT.
    #[arg(long)]
    addr: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn try_main() -> anyhow::Result<()> {
    readshelf::logging::init().context("init logging")?;

    let args = Args::parse();
    let config = Config::from_env().context("load configuration")?;
    let addr = args.addr.unwrap_or(config.addr);

    let store = PgLibraryStore::connect(&config.database.url, config.database.max_connections)
        .await
        .context("connect to database")?;
    store.init_schema().await.context("initialize schema")?;

    let catalog = CatalogClient::new(&config.catalog).context("build catalog client")?;
    let state = AppState::new(Arc::new(store), catalog);
    let app = server::router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|err| anyhow::anyhow!("bind {addr}: {err}"))?;
    tracing::info!(addr = %addr, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
