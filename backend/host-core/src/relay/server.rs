use crate::dispatch::Dispatcher;
use crate::error::relay::RelayError;
use crate::relay::clients::ClientSet;
use crate::runtime::tasks::TaskGroup;

use common::ErrorLocation;
use models::Envelope;

use std::net::SocketAddr;
use std::panic::Location;

use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;
use uuid::Uuid;

const CLIENT_QUEUE_CAPACITY: usize = 64;

/// A bound relay listener, ready to serve.
pub struct RelayServer {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl RelayServer {
    /// Bind the relay on `host:port`. Port 0 picks an ephemeral port.
    pub async fn bind(host: &str, port: u16) -> Result<Self, RelayError> {
        let address = format!("{host}:{port}");
        let listener = TcpListener::bind(&address)
            .await
            .map_err(|e| RelayError::Bind {
                message: format!("Failed to bind relay on {address}: {e}"),
                location: ErrorLocation::from(Location::caller()),
                source: e,
            })?;
        let local_addr = listener.local_addr()?;

        info!("Relay listening on {local_addr}");
        Ok(Self {
            listener,
            local_addr,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Accept connections until cancelled.
    ///
    /// Each connection runs as a member of `tasks` and owns its socket, so
    /// cancelling the group closes every connection.
    pub async fn serve(
        self,
        dispatcher: Dispatcher,
        clients: ClientSet,
        tasks: TaskGroup,
        allow_remote: bool,
    ) -> Result<(), RelayError> {
        info!(
            "Relay serving commands: {:?}",
            dispatcher.registry().list_commands()
        );

        loop {
            let (stream, addr) = self.listener.accept().await?;

            if !allow_remote && !addr.ip().is_loopback() {
                warn!("Rejected non-loopback connection from {addr}");
                continue;
            }

            debug!("Client connecting from {addr}");
            tasks.spawn(
                "relay-connection",
                handle_connection(stream, addr, dispatcher.clone(), clients.clone()),
            );
        }
    }
}

/// Serve one frontend connection.
///
/// Messages are handled one at a time in arrival order. Anything that is not a
/// valid envelope is logged and dropped; the connection stays open.
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    dispatcher: Dispatcher,
    clients: ClientSet,
) -> Result<(), RelayError> {
    let ws_stream = accept_async(stream)
        .await
        .map_err(|e| RelayError::Handshake {
            message: format!("WebSocket handshake with {addr} failed: {e}"),
            location: ErrorLocation::from(Location::caller()),
        })?;

    let (mut write, mut read) = ws_stream.split();
    let (tx, mut rx) = mpsc::channel::<String>(CLIENT_QUEUE_CAPACITY);
    let id = Uuid::new_v4();
    clients.add(id, tx).await;
    info!("Client {id} connected from {addr}");

    let reader = async {
        while let Some(message) = read.next().await {
            match message {
                Ok(Message::Text(text)) => {
                    handle_text(&dispatcher, &clients, id, text.as_str()).await
                }
                Ok(Message::Close(_)) => break,
                Ok(Message::Binary(_)) => warn!("Client {id} sent a binary frame; ignoring"),
                Ok(_) => {}
                Err(e) => {
                    error!("Error reading from client {id}: {e}");
                    return Err(RelayError::Read {
                        message: format!("Error reading from client {id}: {e}"),
                        location: ErrorLocation::from(Location::caller()),
                    });
                }
            }
        }
        Ok(())
    };

    // Ends when the client is removed from the set and its queue closes.
    let writer = async {
        while let Some(frame) = rx.recv().await {
            if let Err(e) = write.send(Message::text(frame)).await {
                warn!("Send to client {id} failed: {e}");
                return Err(RelayError::Io {
                    message: format!("Send to client {id} failed: {e}"),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
        }
        Ok(())
    };

    let result = tokio::select! {
        read_result = reader => read_result,
        write_result = writer => write_result,
    };

    clients.remove(&id).await;
    let _ = write.close().await;
    info!("Client {id} disconnected");
    result
}

async fn handle_text(dispatcher: &Dispatcher, clients: &ClientSet, id: Uuid, text: &str) {
    let request = match Envelope::parse(text) {
        Ok(request) => request,
        Err(e) => {
            warn!("Dropping message from client {id}: {e}");
            return;
        }
    };

    if let Some(response) = dispatcher.dispatch_envelope(request).await {
        clients.broadcast(&response).await;
    }
}
