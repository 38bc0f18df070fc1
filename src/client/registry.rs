//! Client registry
//!
//! The authoritative set of connections whose read loop is running.
//! Every operation takes the lock for exactly one step; broadcasters work
//! from snapshots and never see the live map.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::debug;

use crate::client::{ClientId, ConnectedClient};

/// Registry handle shared by the server and every connection handler.
pub type SharedRegistry = Arc<ClientRegistry>;

/// Registry for tracking active clients
#[derive(Debug, Default)]
pub struct ClientRegistry {
    clients: Mutex<HashMap<ClientId, Arc<ConnectedClient>>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedRegistry {
        Arc::new(Self::new())
    }

    /// Adds a client. Returns `false` and leaves the entry untouched when the
    /// same identity is already present.
    pub fn register(&self, client: Arc<ConnectedClient>) -> bool {
        let mut clients = self.lock();
        let id = client.id();
        if clients.contains_key(&id) {
            return false;
        }
        clients.insert(id, client);
        debug!("Registered client {} ({} active)", id, clients.len());
        true
    }

    /// Removes a client if present. Returns whether anything was removed.
    pub fn deregister(&self, id: ClientId) -> bool {
        let mut clients = self.lock();
        let removed = clients.remove(&id).is_some();
        if removed {
            debug!("Deregistered client {} ({} active)", id, clients.len());
        }
        removed
    }

    /// Point-in-time copy of the current members, in no particular order.
    pub fn snapshot(&self) -> Vec<Arc<ConnectedClient>> {
        self.lock().values().cloned().collect()
    }

    #[cfg(test)]
    pub fn contains(&self, id: ClientId) -> bool {
        self.lock().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Registers `client` and returns a guard that deregisters it on drop.
    pub fn enroll(self: &Arc<Self>, client: Arc<ConnectedClient>) -> Registration {
        let id = client.id();
        self.register(client);
        Registration {
            registry: Arc::clone(self),
            id,
        }
    }

    // No registry operation can leave the map half-updated, so a panic in
    // another holder does not invalidate it.
    fn lock(&self) -> MutexGuard<'_, HashMap<ClientId, Arc<ConnectedClient>>> {
        self.clients.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Membership held by a running handler.
///
/// Dropping it deregisters the client, including when the handler's task is
/// aborted mid-await.
#[derive(Debug)]
pub struct Registration {
    registry: SharedRegistry,
    id: ClientId,
}

impl Registration {
    pub fn id(&self) -> ClientId {
        self.id
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.registry.deregister(self.id);
    }
}
