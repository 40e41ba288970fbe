//! Order sync entry point.

use std::future::IntoFuture;
use std::process::ExitCode;

use dotenv::dotenv;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use order_sync::{api, Dependencies, LogFormat, Settings, SyncError};

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match format {
        LogFormat::Json => tracing_subscriber::fmt().with_env_filter(filter).json().init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}

async fn run(settings: Settings) -> Result<(), SyncError> {
    let dependencies = Dependencies::new(&settings).await?;

    let listener = TcpListener::bind(settings.search_api_addr).await?;
    info!(addr = %settings.search_api_addr, "Starting search API server");
    let server = axum::serve(listener, api::router(dependencies.api_state)).into_future();

    tokio::select! {
        result = dependencies.supervisor.run() => result.map_err(SyncError::from),
        result = server => {
            result?;
            Err(SyncError::ApiServerStopped)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    init_tracing(settings.log_format);

    match run(settings).await {
        Ok(()) => {
            info!("Order sync stopped");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Order sync failed");
            ExitCode::FAILURE
        }
    }
}
