//! Registry - the live set of sessions in the room
//!
//! All membership changes and broadcasts run under one lock, so every
//! recipient observes joins, leaves and chat lines in the same total order.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use crate::connection::Connection;
use crate::protocol::{join_notice, leave_notice};

/// Stable identity of one accepted connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Registered session
struct Entry {
    /// Absent until the session announces itself
    name: Option<String>,
    connection: Arc<Connection>,
}

/// Shared handle to the room's membership
#[derive(Clone, Default)]
pub struct Registry {
    entries: Arc<Mutex<IndexMap<SessionId, Entry>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new, unnamed session
    pub async fn add(&self, id: SessionId, connection: Arc<Connection>) {
        let mut entries = self.entries.lock().await;
        debug!(session = %id, peer = %connection.peer(), "Session registered");
        entries.insert(
            id,
            Entry {
                name: None,
                connection,
            },
        );
    }

    /// Record a session's name and announce it to everyone, the joiner included.
    ///
    /// A session that already has a name keeps it; the notice is still sent.
    /// Returns false if the session is no longer registered.
    pub async fn set_name(&self, id: SessionId, name: &str) -> bool {
        let mut entries = self.entries.lock().await;

        let Some(entry) = entries.get_mut(&id) else {
            debug!(session = %id, "Name for unregistered session ignored");
            return false;
        };
        if entry.name.is_none() {
            entry.name = Some(name.to_string());
        }

        info!(session = %id, "New client: {}", name);
        send_all(&entries, &join_notice(name)).await;
        true
    }

    /// Remove the first session named `name` and tell the rest.
    ///
    /// An unknown name is a silent no-op.
    pub async fn remove_by_name(&self, name: &str) -> Option<SessionId> {
        let mut entries = self.entries.lock().await;

        let index = entries
            .values()
            .position(|e| e.name.as_deref() == Some(name))?;
        let (id, _) = entries.shift_remove_index(index)?;

        info!(session = %id, "Client disconnected: {}", name);
        send_all(&entries, &leave_notice(name)).await;
        Some(id)
    }

    /// Drop a session by identity without any notice
    pub async fn remove(&self, id: SessionId) -> bool {
        let removed = self.entries.lock().await.shift_remove(&id).is_some();
        if removed {
            debug!(session = %id, "Session unregistered");
        }
        removed
    }

    /// Send a line to every registered session.
    ///
    /// Returns the number of sessions it was delivered to.
    pub async fn broadcast(&self, line: &str) -> usize {
        let entries = self.entries.lock().await;
        send_all(&entries, line).await
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    pub async fn contains(&self, id: SessionId) -> bool {
        self.entries.lock().await.contains_key(&id)
    }

    pub async fn name_of(&self, id: SessionId) -> Option<String> {
        self.entries.lock().await.get(&id)?.name.clone()
    }

    /// Names of all announced sessions, in join order
    pub async fn names(&self) -> Vec<String> {
        self.entries
            .lock()
            .await
            .values()
            .filter_map(|e| e.name.clone())
            .collect()
    }
}

/// Fan a line out in registry order; failures only affect their recipient
async fn send_all(entries: &IndexMap<SessionId, Entry>, line: &str) -> usize {
    let mut delivered = 0;
    for (id, entry) in entries {
        match entry.connection.send(line).await {
            Ok(()) => delivered += 1,
            Err(e) => {
                debug!(session = %id, error = %e, "Failed to deliver to session");
            }
        }
    }
    delivered
}
