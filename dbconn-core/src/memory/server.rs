//! Simulated database server shared by the in-memory collaborators

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use tokio::sync::{broadcast, RwLock};
use tracing::debug;

use crate::models::{Connection, ObjectContainer, SessionConfig};

/// Server-side operations recorded in the call journal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Remote close of a connection
    CloseConnection,
    /// Remote deletion of a connection record
    DeleteConnection,
    /// Remote load of object containers
    LoadContainers,
    /// Remote load of the session snapshot
    LoadSession,
    /// Remote load of a navigation node
    LoadNode,
    /// Insertion of children at the front of a node
    UnshiftToNode,
    /// Removal of children from a node
    DeleteInNode,
    /// Removal of a node subtree
    RemoveTree,
    /// Refresh of a single node
    RefreshNode,
    /// Refresh of the root's children
    UpdateRootChildren,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::CloseConnection => "close_connection",
            Self::DeleteConnection => "delete_connection",
            Self::LoadContainers => "load_containers",
            Self::LoadSession => "load_session",
            Self::LoadNode => "load_node",
            Self::UnshiftToNode => "unshift_to_node",
            Self::DeleteInNode => "delete_in_node",
            Self::RemoveTree => "remove_tree",
            Self::RefreshNode => "refresh_node",
            Self::UpdateRootChildren => "update_root_children",
        };
        f.write_str(name)
    }
}

impl FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.to_string() == s)
            .ok_or_else(|| format!("unknown operation '{s}'"))
    }
}

impl Operation {
    /// Every operation, in declaration order
    pub const ALL: [Self; 10] = [
        Self::CloseConnection,
        Self::DeleteConnection,
        Self::LoadContainers,
        Self::LoadSession,
        Self::LoadNode,
        Self::UnshiftToNode,
        Self::DeleteInNode,
        Self::RemoveTree,
        Self::RefreshNode,
        Self::UpdateRootChildren,
    ];
}

/// One journaled call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    /// The operation performed
    pub operation: Operation,
    /// Connection or node id the operation targeted
    pub target: String,
}

#[derive(Debug)]
struct ServerState {
    /// Connection records defined on the server
    connections: IndexMap<String, Connection>,
    /// Ids open in the current session, in session order
    open: Vec<String>,
    /// Containers per connection id
    containers: HashMap<String, Vec<ObjectContainer>>,
    /// Current session id, `None` when there is no session
    session_id: Option<String>,
    /// When the current session started
    session_started: DateTime<Utc>,
    /// Operations that fail until cleared
    failures: HashSet<Operation>,
    calls: Vec<Call>,
}

/// In-memory stand-in for the database server
///
/// Holds connection records, the set of open connections, containers and
/// the session. Every operation routed through it is journaled, and any
/// operation can be made to fail.
#[derive(Debug)]
pub struct MemoryServer {
    state: RwLock<ServerState>,
    updates: broadcast::Sender<()>,
}

impl MemoryServer {
    /// Creates an empty server with an active session
    #[must_use]
    pub fn new() -> Self {
        let (updates, _) = broadcast::channel(16);
        Self {
            state: RwLock::new(ServerState {
                connections: IndexMap::new(),
                open: Vec::new(),
                containers: HashMap::new(),
                session_id: Some("session-1".to_string()),
                session_started: Utc::now(),
                failures: HashSet::new(),
                calls: Vec::new(),
            }),
            updates,
        }
    }

    /// Defines a connection record on the server
    pub async fn define_connection(&self, connection: Connection) {
        let mut state = self.state.write().await;
        state.connections.insert(connection.id.clone(), connection);
    }

    /// Sets the containers the server reports for a connection
    pub async fn define_containers(&self, connection_id: &str, containers: Vec<ObjectContainer>) {
        let mut state = self.state.write().await;
        state
            .containers
            .insert(connection_id.to_string(), containers);
    }

    /// Marks a defined connection as open in the session
    ///
    /// Returns the connection, or `None` if it is not defined.
    pub async fn open_connection(&self, id: &str) -> Option<Connection> {
        let mut state = self.state.write().await;
        let connection = state.connections.get(id).cloned()?;
        if !state.open.iter().any(|open| open == id) {
            state.open.push(id.to_string());
        }
        Some(connection)
    }

    /// Replaces the open connection list and signals a session update
    ///
    /// Ids that are not defined on the server are ignored.
    pub async fn set_session_connections(&self, ids: &[String]) {
        {
            let mut state = self.state.write().await;
            let open: Vec<String> = ids
                .iter()
                .filter(|id| state.connections.contains_key(id.as_str()))
                .cloned()
                .collect();
            state.open = open;
        }
        self.notify_session_update();
    }

    /// Ends the session; further snapshot loads report no session
    pub async fn end_session(&self) {
        self.state.write().await.session_id = None;
        self.notify_session_update();
    }

    /// Signals that the session data changed
    pub fn notify_session_update(&self) {
        let listeners = self.updates.send(()).unwrap_or(0);
        debug!(listeners, "Session update signalled");
    }

    pub(crate) fn subscribe_updates(&self) -> broadcast::Receiver<()> {
        self.updates.subscribe()
    }

    /// Makes `operation` fail until [`MemoryServer::clear_failures`]
    pub async fn fail_on(&self, operation: Operation) {
        self.state.write().await.failures.insert(operation);
    }

    /// Clears all injected failures
    pub async fn clear_failures(&self) {
        self.state.write().await.failures.clear();
    }

    /// Returns the call journal in call order
    pub async fn calls(&self) -> Vec<Call> {
        self.state.read().await.calls.clone()
    }

    /// Returns how many times `operation` was called
    pub async fn call_count(&self, operation: Operation) -> usize {
        self.state
            .read()
            .await
            .calls
            .iter()
            .filter(|c| c.operation == operation)
            .count()
    }

    /// Clears the call journal
    pub async fn clear_calls(&self) {
        self.state.write().await.calls.clear();
    }

    /// Returns the ids open in the session
    pub async fn open_ids(&self) -> Vec<String> {
        self.state.read().await.open.clone()
    }

    /// Returns true if the connection is defined on the server
    pub async fn is_defined(&self, id: &str) -> bool {
        self.state.read().await.connections.contains_key(id)
    }

    /// Journals a call and reports whether it should fail
    pub(crate) async fn record(&self, operation: Operation, target: &str) -> bool {
        let mut state = self.state.write().await;
        state.calls.push(Call {
            operation,
            target: target.to_string(),
        });
        state.failures.contains(&operation)
    }

    pub(crate) async fn connection(&self, id: &str) -> Option<Connection> {
        self.state.read().await.connections.get(id).cloned()
    }

    pub(crate) async fn close(&self, id: &str) -> bool {
        let mut state = self.state.write().await;
        let before = state.open.len();
        state.open.retain(|open| open != id);
        before != state.open.len()
    }

    pub(crate) async fn delete(&self, id: &str) -> bool {
        let mut state = self.state.write().await;
        state.open.retain(|open| open != id);
        state.containers.remove(id);
        state.connections.shift_remove(id).is_some()
    }

    pub(crate) async fn containers(&self, connection_id: &str) -> Option<Vec<ObjectContainer>> {
        self.state
            .read()
            .await
            .containers
            .get(connection_id)
            .cloned()
    }

    pub(crate) async fn session(&self) -> Option<SessionConfig> {
        let state = self.state.read().await;
        let session_id = state.session_id.clone()?;
        let connections = state
            .open
            .iter()
            .filter_map(|id| state.connections.get(id).cloned())
            .collect();
        Some(SessionConfig::new(session_id, connections).with_created_at(state.session_started))
    }
}

impl Default for MemoryServer {
    fn default() -> Self {
        Self::new()
    }
}
