//! Test fixtures for coordinator testing.
//!
//! This module provides a wired in-memory backend, sample connections and
//! helpers for collecting emitted events.

#![allow(dead_code)]

use std::sync::Arc;

use dbconn_core::memory::MemoryBackend;
use dbconn_core::models::{Connection, ObjectContainer};
use dbconn_core::{ConnectionsManager, FEATURE_TEMPORARY};
use tokio::sync::broadcast;

/// A manager wired to in-memory collaborators, with event receivers
/// subscribed before any operation ran
pub struct Harness {
    pub backend: MemoryBackend,
    pub manager: Arc<ConnectionsManager>,
    pub opened: broadcast::Receiver<Connection>,
    pub closed: broadcast::Receiver<String>,
}

impl Harness {
    /// Creates a harness over an empty server
    #[must_use]
    pub fn new() -> Self {
        let backend = MemoryBackend::new();
        let manager = Arc::new(backend.manager());
        let opened = manager.on_open_connection();
        let closed = manager.on_close_connection();
        Self {
            backend,
            manager,
            opened,
            closed,
        }
    }

    /// Defines a connection on the server
    pub async fn define(&self, connection: Connection) -> Connection {
        self.backend
            .server
            .define_connection(connection.clone())
            .await;
        connection
    }

    /// Defines a connection, opens it on the server and registers it with
    /// the manager
    pub async fn open(&self, connection: Connection) -> Connection {
        self.define(connection.clone()).await;
        let opened = self
            .backend
            .server
            .open_connection(&connection.id)
            .await
            .expect("connection was just defined");
        self.manager
            .add_opened_connection(opened.clone())
            .await
            .expect("opening a defined connection succeeds");
        opened
    }

    /// Drains all pending open events
    pub fn opened_ids(&mut self) -> Vec<String> {
        drain(&mut self.opened).into_iter().map(|c| c.id).collect()
    }

    /// Drains all pending close events
    pub fn closed_ids(&mut self) -> Vec<String> {
        drain(&mut self.closed)
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

/// Collects every event currently buffered in a receiver
pub fn drain<T: Clone>(rx: &mut broadcast::Receiver<T>) -> Vec<T> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// A persistent PostgreSQL connection
#[must_use]
pub fn postgres_connection(id: &str) -> Connection {
    Connection::new(id, format!("PostgreSQL {id}"), "postgres-jdbc")
        .with_description("Reporting database")
}

/// A connection created for the current session only
#[must_use]
pub fn temporary_connection(id: &str) -> Connection {
    Connection::new(id, format!("Scratch {id}"), "sqlite-jdbc").with_feature(FEATURE_TEMPORARY)
}

/// Containers named after the given names
#[must_use]
pub fn containers(names: &[&str]) -> Vec<ObjectContainer> {
    names.iter().map(|name| ObjectContainer::named(*name)).collect()
}
