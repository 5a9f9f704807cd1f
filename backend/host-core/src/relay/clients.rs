use models::Envelope;

use std::collections::HashMap;
use std::sync::Arc;

use futures_util::future::join_all;
use log::{debug, warn};
use tokio::sync::{RwLock, mpsc};
use uuid::Uuid;

/// Live frontend connections, each represented by the queue feeding its
/// WebSocket writer.
#[derive(Clone, Default)]
pub struct ClientSet {
    clients: Arc<RwLock<HashMap<Uuid, mpsc::Sender<String>>>>,
}

impl ClientSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add(&self, id: Uuid, sender: mpsc::Sender<String>) {
        self.clients.write().await.insert(id, sender);
    }

    pub async fn remove(&self, id: &Uuid) -> bool {
        self.clients.write().await.remove(id).is_some()
    }

    /// Forget every client. Their writers see a closed queue and hang up.
    pub async fn clear(&self) -> usize {
        let mut clients = self.clients.write().await;
        let count = clients.len();
        clients.clear();
        count
    }

    pub async fn len(&self) -> usize {
        self.clients.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.clients.read().await.is_empty()
    }

    /// Send `envelope` to every client. Returns how many received it.
    ///
    /// Sends run concurrently; a client whose queue is closed is removed
    /// without delaying the others.
    pub async fn broadcast(&self, envelope: &Envelope) -> usize {
        let frame = match envelope.to_json() {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Failed to encode response for '{}': {e}", envelope.cmd);
                return 0;
            }
        };
        self.broadcast_text(frame).await
    }

    pub async fn broadcast_text(&self, frame: String) -> usize {
        let recipients: Vec<(Uuid, mpsc::Sender<String>)> = self
            .clients
            .read()
            .await
            .iter()
            .map(|(id, tx)| (*id, tx.clone()))
            .collect();

        let sends = recipients.into_iter().map(|(id, tx)| {
            let frame = frame.clone();
            async move { (id, tx.send(frame).await.is_ok()) }
        });
        let results = join_all(sends).await;

        let failed: Vec<Uuid> = results
            .iter()
            .filter(|(_, delivered)| !delivered)
            .map(|(id, _)| *id)
            .collect();

        if !failed.is_empty() {
            let mut clients = self.clients.write().await;
            for id in &failed {
                clients.remove(id);
                warn!("Dropped client {id} after failed send");
            }
        }

        let delivered = results.len() - failed.len();
        debug!("Broadcast delivered to {delivered} client(s)");
        delivered
    }
}
