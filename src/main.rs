//! Entry point: parses CLI args, builds the Runtime Facade, and serves
//! the HTTP control surface until SIGINT/SIGTERM, closing every session
//! before exit.

use clap::Parser;
use std::process::ExitCode;
use swerex_runtime::config::Args;
use swerex_runtime::facade::RuntimeFacade;
use swerex_runtime::http::{build_router, AppState};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let addr = format!("{}:{}", args.host, args.port);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(%addr, error = %e, "failed to bind");
            return ExitCode::FAILURE;
        }
    };

    let facade = RuntimeFacade::new();
    let state = AppState::new(facade, args.api_key.clone());
    let router = build_router(state.clone());

    tracing::info!(%addr, auth_enabled = !args.api_key.is_empty(), "swerex-runtime listening");

    let server = axum::serve(listener, router).with_graceful_shutdown(shutdown_signal());
    if let Err(e) = server.await {
        tracing::error!(error = %e, "server error");
        state.facade.close().await;
        return ExitCode::FAILURE;
    }

    state.facade.close().await;
    tracing::info!("swerex-runtime shut down cleanly");
    ExitCode::SUCCESS
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        let Ok(mut sig) = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        else {
            return;
        };
        sig.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
