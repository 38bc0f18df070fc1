//! RAX WS Relay - Entry Point
//!
//! Relays every WebSocket message to all other connected clients.

use log::{error, info};
use std::process::ExitCode;

use rax_ws_relay::Server;
use rax_ws_relay::config::RelayConfig;
use rax_ws_relay::error::RelayError;
use rax_ws_relay::error::handlers::handle_error;
use rax_ws_relay::utils::setup_logging;

#[tokio::main]
async fn main() -> ExitCode {
    setup_logging();

    info!("Launching WebSocket relay...");

    let config = match RelayConfig::load().map_err(RelayError::from) {
        Ok(config) => config,
        Err(e) => {
            handle_error(&e);
            return ExitCode::FAILURE;
        }
    };

    let server = match Server::bind(config).await {
        Ok(server) => server,
        Err(e) => {
            handle_error(&e);
            return ExitCode::FAILURE;
        }
    };

    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await;

    info!("Relay stopped");
    ExitCode::SUCCESS
}
