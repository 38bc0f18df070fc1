use log::{error, info};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};

use crate::client::{ClientRegistry, SharedRegistry};
use crate::config::RelayConfig;
use crate::error::RelayError;
use crate::error::handlers::handle_error;
use crate::relay::handle_connection;
use crate::transport::split_socket;

pub struct Server {
    registry: SharedRegistry,
    listener: TcpListener,
    config: Arc<RelayConfig>,
}

impl Server {
    /// Binds the configured address. Failing here is the only fatal error.
    pub async fn bind(config: RelayConfig) -> Result<Self, RelayError> {
        let socket_addr = config.socket_addr();

        let listener = TcpListener::bind(&socket_addr)
            .await
            .map_err(|e| RelayError::Bind(socket_addr.clone(), e))?;

        info!("Server bound to {}", socket_addr);

        Ok(Self {
            registry: ClientRegistry::shared(),
            listener,
            config: Arc::new(config),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, RelayError> {
        Ok(self.listener.local_addr()?)
    }

    pub fn registry(&self) -> SharedRegistry {
        Arc::clone(&self.registry)
    }

    /// Accepts connections forever.
    pub async fn run(&self) {
        self.run_until(std::future::pending::<()>()).await;
    }

    /// Accepts connections until `shutdown` resolves.
    ///
    /// Handlers already running are left to finish on their own.
    pub async fn run_until<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        info!("Starting relay on {}", self.config.socket_addr());
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested, no longer accepting connections");
                    break;
                }
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, addr)) => {
                        let registry = Arc::clone(&self.registry);

                        // Spawn a task for each client so accept loop doesn't block
                        tokio::spawn(async move {
                            if let Err(e) = handle_new_client(stream, addr, registry).await {
                                handle_error(&e);
                            }
                        });
                    }
                    Err(e) => {
                        error!("Error accepting connection: {}", e);
                    }
                },
            }
        }
    }
}

/// Completes the opening handshake, then runs the relay loop to completion.
async fn handle_new_client(
    stream: TcpStream,
    client_addr: SocketAddr,
    registry: SharedRegistry,
) -> Result<(), RelayError> {
    let socket = tokio_tungstenite::accept_async(stream)
        .await
        .map_err(|e| RelayError::Handshake(client_addr, e))?;

    let (outbound, inbound) = split_socket(socket);
    handle_connection(registry, client_addr, outbound, inbound).await;
    Ok(())
}
