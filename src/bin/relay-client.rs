//! Interactive relay client
//!
//! Prints every message the relay delivers and sends each line typed on
//! stdin. Type `exit` to quit.

use std::time::Duration;

use clap::Parser;
use futures::{SinkExt, StreamExt};
use log::{error, info, warn};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::{MissedTickBehavior, interval, timeout};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};

use rax_ws_relay::utils::escape_for_log;

const OPEN_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Parser, Debug)]
#[command(name = "relay-client")]
#[command(about = "Interactive client for the RAX WebSocket relay")]
struct CliArgs {
    /// WebSocket server URL, e.g. ws://localhost:8765
    url: String,

    /// Disable keepalive pings
    #[arg(long)]
    no_keepalive: bool,

    /// Keepalive ping interval in seconds
    #[arg(long, default_value_t = 30)]
    ping_interval: u64,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();

    let level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if let Err(msg) = validate_url(&args.url) {
        error!("{}", msg);
        error!("URL should have format: ws://hostname[:port][/path]");
        return;
    }

    info!("Connecting to WebSocket server at {}", args.url);

    let socket = match timeout(OPEN_TIMEOUT, connect_async(args.url.as_str())).await {
        Ok(Ok((socket, _response))) => socket,
        Ok(Err(WsError::Io(e))) if e.kind() == std::io::ErrorKind::ConnectionRefused => {
            error!("Failed to connect to {}. Is the server running?", args.url);
            return;
        }
        Ok(Err(e)) => {
            error!("WebSocket error: {}", e);
            return;
        }
        Err(_) => {
            error!("Timed out connecting to {}", args.url);
            return;
        }
    };

    info!("Connected to {}", args.url);

    let keepalive = if args.no_keepalive || args.ping_interval == 0 {
        info!("Keepalive pings disabled");
        None
    } else {
        info!(
            "Keepalive ping interval set to {} seconds",
            args.ping_interval
        );
        Some(Duration::from_secs(args.ping_interval))
    };

    let (mut outbound, mut inbound) = socket.split();

    let receive_task = async {
        while let Some(item) = inbound.next().await {
            match item {
                Ok(Message::Text(text)) => info!("Received message: {}", text.as_str()),
                Ok(Message::Binary(data)) => info!("Received {} bytes of binary data", data.len()),
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    warn!("Receive failed: {}", e);
                    break;
                }
            }
        }
        info!("Connection closed");
    };

    let send_task = async {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut pings = keepalive.map(|period| {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker
        });

        println!("Enter message (or 'exit' to quit):");
        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let line = match line {
                        Ok(Some(line)) => line,
                        Ok(None) => break,
                        Err(e) => {
                            error!("Failed to read stdin: {}", e);
                            break;
                        }
                    };

                    if line.eq_ignore_ascii_case("exit") {
                        info!("Exiting...");
                        break;
                    }

                    if let Err(e) = outbound.send(Message::text(line.clone())).await {
                        error!("Send failed: {}", e);
                        break;
                    }
                    info!("Sent: {}", escape_for_log(&line));
                }
                _ = async { pings.as_mut()?.tick().await; Some(()) }, if pings.is_some() => {
                    if let Err(e) = outbound.send(Message::Ping(Vec::<u8>::new().into())).await {
                        warn!("Keepalive ping failed: {}", e);
                        break;
                    }
                }
            }
        }
        let _ = outbound.close().await;
    };

    tokio::select! {
        _ = receive_task => {}
        _ = send_task => {}
    }
}

fn validate_url(url: &str) -> Result<(), String> {
    let (scheme, rest) = url
        .split_once("://")
        .ok_or_else(|| format!("Invalid URL format: {}", url))?;

    if rest.is_empty() || rest.starts_with('/') {
        return Err(format!("Invalid URL format: {}", url));
    }

    match scheme {
        "ws" => Ok(()),
        "wss" => Err(format!(
            "Secure WebSocket (wss) is not supported by this build: {}",
            url
        )),
        other => Err(format!("Unsupported URL scheme '{}': {}", other, url)),
    }
}
