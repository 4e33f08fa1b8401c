//! Connections manager coordinating the connection lifecycle
//!
//! This module provides the `ConnectionsManager` which opens, closes and
//! deletes connections by driving the connection info resource and the
//! navigation tree, and which publishes open/close events once the
//! collaborator state is up to date.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use crate::error::{ResourceError, Result};
use crate::events::ConnectionEvents;
use crate::models::{Connection, ObjectContainer};
use crate::navigation::{
    connection_id_from_node_id, connection_node_id, NavNodeManager, ROOT_NODE_ID,
};
use crate::notification::NotificationService;
use crate::resource::{ConnectionInfoResource, ContainerResource, SessionResource};

use super::watcher::SessionWatcher;

/// Coordinator for opening, closing and deleting connections
///
/// The manager owns no connection state of its own. It is responsible for:
/// - Keeping the connection info cache and the navigation tree in step
/// - Emitting exactly one event per open or close transition it performs
/// - Reconciling the cache with the server session on every session update
///
/// Every operation that mutates the cache or the tree runs under a single
/// operation lock, so operations never interleave at await points.
pub struct ConnectionsManager {
    /// Connection metadata cache and remote connection calls
    connection_info: Arc<dyn ConnectionInfoResource>,
    /// Catalog and schema cache
    containers: Arc<dyn ContainerResource>,
    /// Navigation tree service
    nav_nodes: Arc<dyn NavNodeManager>,
    /// Server session snapshot
    session: Arc<dyn SessionResource>,
    /// User-facing error reporting
    notifications: Arc<dyn NotificationService>,
    /// Open and close event streams
    events: ConnectionEvents,
    /// Serializes mutating operations
    op_lock: Mutex<()>,
}

impl ConnectionsManager {
    /// Creates a new manager over the given collaborators
    #[must_use]
    pub fn new(
        connection_info: Arc<dyn ConnectionInfoResource>,
        containers: Arc<dyn ContainerResource>,
        nav_nodes: Arc<dyn NavNodeManager>,
        session: Arc<dyn SessionResource>,
        notifications: Arc<dyn NotificationService>,
    ) -> Self {
        Self {
            connection_info,
            containers,
            nav_nodes,
            session,
            notifications,
            events: ConnectionEvents::default(),
            op_lock: Mutex::new(()),
        }
    }

    /// Replaces the event streams, e.g. to use a configured capacity
    ///
    /// Receivers subscribed to the previous streams receive nothing further.
    #[must_use]
    pub fn with_events(mut self, events: ConnectionEvents) -> Self {
        self.events = events;
        self
    }

    /// Subscribes to connections becoming open
    #[must_use]
    pub fn on_open_connection(&self) -> broadcast::Receiver<Connection> {
        self.events.on_open_connection()
    }

    /// Subscribes to ids of closed connections
    #[must_use]
    pub fn on_close_connection(&self) -> broadcast::Receiver<String> {
        self.events.on_close_connection()
    }

    /// Registers a connection that was just opened and shows it in the tree
    ///
    /// The connection is cached and announced before its node is loaded and
    /// inserted as the first child of the root node. A failed node load
    /// leaves the cache entry in place.
    ///
    /// # Errors
    /// Returns an error if the navigation node cannot be loaded
    #[tracing::instrument(skip(self, connection), fields(connection_id = %connection.id))]
    pub async fn add_opened_connection(&self, connection: Connection) -> Result<()> {
        let _guard = self.op_lock.lock().await;

        let node_id = connection_node_id(&connection.id);
        self.add_connection(connection).await;

        self.nav_nodes.load_node(&node_id, ROOT_NODE_ID).await?;
        self.nav_nodes
            .unshift_to_node(ROOT_NODE_ID, &[node_id])
            .await;

        info!("Connection opened");
        Ok(())
    }

    /// Finds a cached container of a connection by catalog or schema id
    ///
    /// Returns the first container, in server order, whose name equals
    /// `schema_id` or `catalog_id`. Nothing is loaded from the server.
    pub async fn get_object_container_by_id(
        &self,
        connection_id: &str,
        catalog_id: &str,
        schema_id: Option<&str>,
    ) -> Option<ObjectContainer> {
        let containers = self.containers.get(connection_id).await?;

        containers
            .into_iter()
            .find(|c| schema_id == Some(c.name.as_str()) || c.name == catalog_id)
    }

    /// Deletes a temporary connection
    ///
    /// Unknown connections and connections without the temporary feature are
    /// left alone.
    ///
    /// # Errors
    /// Returns an error if the server rejects the deletion
    #[tracing::instrument(skip(self))]
    pub async fn delete_connection(&self, id: &str) -> Result<()> {
        let _guard = self.op_lock.lock().await;
        self.delete_connection_locked(id).await
    }

    /// Returns true if any connection is cached
    pub async fn has_any_connection(&self) -> bool {
        !self.connection_info.is_empty().await
    }

    /// Closes every cached connection, then refreshes the root once
    ///
    /// Connections are closed one after another in cache order.
    ///
    /// # Errors
    /// Returns the first close or refresh failure; connections after a
    /// failing one stay open
    #[tracing::instrument(skip(self))]
    pub async fn close_all_connections(&self) -> Result<()> {
        let _guard = self.op_lock.lock().await;

        let ids = self.connection_info.ids().await;
        debug!(count = ids.len(), "Closing all connections");

        for id in &ids {
            self.close_connection_locked(id, true).await?;
        }

        self.nav_nodes.update_root_children().await?;
        Ok(())
    }

    /// Closes a connection on the server
    ///
    /// The root children are refreshed afterwards unless `skip_nodes_refresh`
    /// is set.
    ///
    /// # Errors
    /// Returns an error if the server rejects the close or the refresh fails
    #[tracing::instrument(skip(self))]
    pub async fn close_connection(&self, id: &str, skip_nodes_refresh: bool) -> Result<()> {
        let _guard = self.op_lock.lock().await;
        self.close_connection_locked(id, skip_nodes_refresh).await
    }

    /// Deletes the temporary connection a navigation node represents
    ///
    /// # Errors
    /// Returns an error if the server rejects the deletion
    #[tracing::instrument(skip(self))]
    pub async fn delete_nav_node_connection(&self, nav_node_id: &str) -> Result<()> {
        let _guard = self.op_lock.lock().await;

        let connection_id = connection_id_from_node_id(nav_node_id);
        self.delete_connection_locked(&connection_id).await
    }

    /// Closes the connection a navigation node represents
    ///
    /// Does nothing if the connection is not cached. Failures are reported
    /// through the notification service and never returned.
    #[tracing::instrument(skip(self))]
    pub async fn close_nav_node_connection(&self, nav_node_id: &str) {
        let _guard = self.op_lock.lock().await;

        let connection_id = connection_id_from_node_id(nav_node_id);
        if self.connection_info.get(&connection_id).await.is_none() {
            debug!(connection_id = %connection_id, "Connection is not open, nothing to close");
            return;
        }

        if let Err(e) = self.close_nav_node_locked(&connection_id, nav_node_id).await {
            warn!(error = %e, "Closing connection from navigator failed");
            self.notifications
                .log_exception(&e, &format!("Can't close connection: {nav_node_id}"));
        }
    }

    /// Loads the containers of a connection and returns the cached result
    ///
    /// # Errors
    /// Returns an error if the load fails or leaves no cache entry
    #[tracing::instrument(skip(self))]
    pub async fn load_object_container(
        &self,
        connection_id: &str,
        catalog_id: Option<&str>,
    ) -> Result<Vec<ObjectContainer>> {
        self.containers.load(connection_id, catalog_id).await?;

        let containers = self
            .containers
            .get(connection_id)
            .await
            .ok_or_else(|| ResourceError::MissingEntry(connection_id.to_string()))?;

        debug!(count = containers.len(), "Object containers loaded");
        Ok(containers)
    }

    /// Reconciles the cache with the server session
    ///
    /// Every connection listed by the session is cached and announced as
    /// open, including ones that were already cached. Cached connections the
    /// session no longer lists are evicted and announced as closed. The
    /// root children are refreshed once at the end. Nothing happens if the
    /// server reports no session.
    ///
    /// Normally driven by a [`SessionWatcher`].
    ///
    /// # Errors
    /// Returns an error if the session cannot be loaded or the refresh fails
    #[tracing::instrument(skip(self))]
    pub async fn restore_connections(&self) -> Result<()> {
        let _guard = self.op_lock.lock().await;

        let Some(config) = self.session.load().await? else {
            debug!("No session available, skipping restore");
            return Ok(());
        };

        let mut restored = HashSet::with_capacity(config.connections.len());
        for connection in config.connections {
            restored.insert(connection.id.clone());
            self.add_connection(connection).await;
        }

        for id in self.connection_info.ids().await {
            if restored.contains(&id) {
                continue;
            }
            self.connection_info.delete(&id).await;
            self.after_connection_close(&id);
            debug!(connection_id = %id, "Connection was closed outside of this client");
        }

        self.nav_nodes.update_root_children().await?;

        info!(restored = restored.len(), "Connections restored from session");
        Ok(())
    }

    /// Starts restoring connections on every session data update
    ///
    /// Failures are logged and the watcher keeps running. The watcher task
    /// holds this manager, and through it the session resource, so the
    /// update stream stays open while the task runs; dropping the returned
    /// handle is what stops it.
    pub fn spawn_session_watcher(self: &Arc<Self>) -> SessionWatcher {
        let updates = self.session.subscribe_updates();
        SessionWatcher::spawn(Arc::clone(self), updates)
    }

    async fn delete_connection_locked(&self, id: &str) -> Result<()> {
        match self.connection_info.get(id).await {
            Some(connection) if connection.is_temporary() => {}
            Some(_) => {
                debug!(connection_id = %id, "Only temporary connections can be deleted");
                return Ok(());
            }
            None => {
                debug!(connection_id = %id, "Connection is unknown, nothing to delete");
                return Ok(());
            }
        }

        self.connection_info.delete_connection(id).await?;
        self.after_connection_close(id);

        let node_id = connection_node_id(id);
        if let Some(node) = self.nav_nodes.get_node(&node_id).await {
            self.nav_nodes
                .delete_in_node(&node.parent_id, &[node_id])
                .await;
        }

        info!(connection_id = %id, "Connection deleted");
        Ok(())
    }

    async fn close_connection_locked(&self, id: &str, skip_nodes_refresh: bool) -> Result<()> {
        self.connection_info.close(id).await?;
        self.after_connection_close(id);

        if !skip_nodes_refresh {
            self.nav_nodes.update_root_children().await?;
        }

        info!(connection_id = %id, "Connection closed");
        Ok(())
    }

    async fn close_nav_node_locked(&self, connection_id: &str, nav_node_id: &str) -> Result<()> {
        self.connection_info.close(connection_id).await?;
        self.after_connection_close(connection_id);

        self.nav_nodes.remove_tree(nav_node_id).await?;
        self.nav_nodes.refresh_node(nav_node_id).await?;

        info!(connection_id = %connection_id, "Connection closed from navigator");
        Ok(())
    }

    async fn add_connection(&self, connection: Connection) {
        self.connection_info
            .set(&connection.id, connection.clone())
            .await;
        self.events.emit_open(connection);
    }

    fn after_connection_close(&self, id: &str) {
        self.events.emit_close(id);
    }
}

impl std::fmt::Debug for ConnectionsManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionsManager")
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}
