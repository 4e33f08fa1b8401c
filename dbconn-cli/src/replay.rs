//! Replays a scenario against the connections manager
//!
//! The manager runs over the in-memory collaborators. Events emitted while
//! a step runs are attributed to that step; within a step, opens are listed
//! before closes.

use std::sync::Arc;

use dbconn_core::memory::{MemoryBackend, Operation};
use dbconn_core::{
    AppSettings, Connection, ConnectionEvents, ConnectionInfoResource, ConnectionsManager,
    DbConnError, ResourceError, SessionWatcher, ROOT_NODE_ID,
};
use serde::Serialize;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{debug, info, warn};

use crate::scenario::{Scenario, Step};

/// Replay options
#[derive(Debug, Clone, Copy)]
pub struct ReplayOptions {
    /// Buffered events per stream
    pub channel_capacity: usize,
    /// Run a session watcher during the replay
    pub watch_updates: bool,
}

impl ReplayOptions {
    /// Derives options from settings
    #[must_use]
    pub const fn from_settings(settings: &AppSettings, no_watch: bool) -> Self {
        Self {
            channel_capacity: settings.events.channel_capacity,
            watch_updates: settings.session.watch_updates && !no_watch,
        }
    }
}

/// Outcome of a single step
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    /// 1-based step number
    pub index: usize,
    /// Rendered step
    pub step: String,
    /// Whether the step succeeded
    pub ok: bool,
    /// Result detail or failure reason
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Connections announced as opened
    pub opened: Vec<String>,
    /// Connections announced as closed
    pub closed: Vec<String>,
}

/// One journaled server call
#[derive(Debug, Clone, Serialize)]
pub struct CallReport {
    /// Operation name
    pub operation: String,
    /// Connection or node id
    pub target: String,
}

/// Final state after a replay
#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    /// Per-step outcomes
    pub steps: Vec<StepReport>,
    /// Cached connection ids, in cache order
    pub connections: Vec<String>,
    /// Children of the navigator root
    pub root_children: Vec<String>,
    /// Messages passed to the notification service
    pub notifications: Vec<String>,
    /// Server call journal
    pub calls: Vec<CallReport>,
}

impl ReplayReport {
    /// Number of failed steps
    #[must_use]
    pub fn failed_steps(&self) -> usize {
        self.steps.iter().filter(|s| !s.ok).count()
    }

    /// Renders the report as plain text
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for step in &self.steps {
            let status = if step.ok { "ok" } else { "FAILED" };
            out.push_str(&format!("[{}] {} ... {status}", step.index, step.step));
            if let Some(detail) = &step.detail {
                out.push_str(&format!(": {detail}"));
            }
            out.push('\n');
            if !step.opened.is_empty() {
                out.push_str(&format!("    opened: {}\n", step.opened.join(", ")));
            }
            if !step.closed.is_empty() {
                out.push_str(&format!("    closed: {}\n", step.closed.join(", ")));
            }
        }

        out.push_str(&format!("\nConnections: {}\n", join_or_none(&self.connections)));
        out.push_str(&format!("Navigator root: {}\n", join_or_none(&self.root_children)));
        if !self.notifications.is_empty() {
            out.push_str("Notifications:\n");
            for message in &self.notifications {
                out.push_str(&format!("    {message}\n"));
            }
        }
        out.push_str(&format!("Server calls: {}\n", self.calls.len()));
        for call in &self.calls {
            out.push_str(&format!("    {} {}\n", call.operation, call.target));
        }
        out
    }
}

fn join_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "(none)".to_string()
    } else {
        items.join(", ")
    }
}

/// Drives one scenario
struct Replayer {
    backend: MemoryBackend,
    manager: Arc<ConnectionsManager>,
    watcher: Option<SessionWatcher>,
    opened: broadcast::Receiver<Connection>,
    closed: broadcast::Receiver<String>,
}

impl Replayer {
    async fn new(scenario: &Scenario, options: ReplayOptions) -> Self {
        let backend = MemoryBackend::new();
        scenario.seed(&backend.server).await;
        backend.server.clear_calls().await;

        // Events are drained after each step, so one step's worth must fit
        let capacity = options
            .channel_capacity
            .max(scenario.connections.len().saturating_mul(2));
        let events = ConnectionEvents::new(capacity);
        let manager = Arc::new(backend.manager_with_events(events));
        let opened = manager.on_open_connection();
        let closed = manager.on_close_connection();
        let watcher = options
            .watch_updates
            .then(|| manager.spawn_session_watcher());

        Self {
            backend,
            manager,
            watcher,
            opened,
            closed,
        }
    }

    async fn run_step(&mut self, step: &Step) -> Result<Option<String>, DbConnError> {
        let server = Arc::clone(&self.backend.server);
        match step {
            Step::Open { id } => {
                let connection = server
                    .open_connection(id)
                    .await
                    .ok_or_else(|| ResourceError::ConnectionNotFound(id.clone()))?;
                self.manager.add_opened_connection(connection).await?;
                Ok(None)
            }
            Step::Close { id, skip_refresh } => {
                self.manager.close_connection(id, *skip_refresh).await?;
                Ok(None)
            }
            Step::CloseAll => {
                self.manager.close_all_connections().await?;
                Ok(None)
            }
            Step::Delete { id } => {
                self.manager.delete_connection(id).await?;
                Ok(None)
            }
            Step::CloseNode { node_id } => {
                let before = self.backend.notifications.reports().len();
                self.manager.close_nav_node_connection(node_id).await;
                let reports = self.backend.notifications.reports();
                Ok(reports
                    .get(before..)
                    .filter(|new| !new.is_empty())
                    .map(|new| format!("{} notification(s) raised", new.len())))
            }
            Step::DeleteNode { node_id } => {
                self.manager.delete_nav_node_connection(node_id).await?;
                Ok(None)
            }
            Step::Session { open } => {
                let before = self.restores();
                server.set_session_connections(open).await;
                self.await_restore(before).await;
                Ok(None)
            }
            Step::EndSession => {
                let before = self.restores();
                server.end_session().await;
                self.await_restore(before).await;
                Ok(None)
            }
            Step::Restore => {
                self.manager.restore_connections().await?;
                Ok(None)
            }
            Step::Containers {
                connection_id,
                catalog_id,
            } => {
                let containers = self
                    .manager
                    .load_object_container(connection_id, catalog_id.as_deref())
                    .await?;
                let names: Vec<_> = containers.into_iter().map(|c| c.name).collect();
                Ok(Some(format!("[{}]", names.join(", "))))
            }
            Step::FindContainer {
                connection_id,
                catalog_id,
                schema_id,
            } => {
                let found = self
                    .manager
                    .get_object_container_by_id(connection_id, catalog_id, schema_id.as_deref())
                    .await;
                Ok(Some(found.map_or_else(
                    || "not found".to_string(),
                    |c| format!("found {}", c.name),
                )))
            }
            Step::Fail { operation } => {
                // Names are checked when the scenario is loaded
                if let Ok(op) = operation.parse::<Operation>() {
                    server.fail_on(op).await;
                }
                Ok(None)
            }
            Step::ClearFailures => {
                server.clear_failures().await;
                Ok(None)
            }
        }
    }

    fn restores(&self) -> u64 {
        self.watcher.as_ref().map_or(0, SessionWatcher::restores)
    }

    async fn await_restore(&mut self, before: u64) {
        if let Some(watcher) = self.watcher.as_mut() {
            if !watcher.wait_for_restores_after(before).await {
                warn!("Session watcher stopped before restoring");
            }
        }
    }

    fn drain_events(&mut self) -> (Vec<String>, Vec<String>) {
        let opened = drain(&mut self.opened, |c| c.id);
        let closed = drain(&mut self.closed, |id| id);
        (opened, closed)
    }

    async fn finish(self, steps: Vec<StepReport>) -> ReplayReport {
        drop(self.watcher);
        ReplayReport {
            steps,
            connections: self.backend.connection_info.ids().await,
            root_children: self.backend.nav_tree.children(ROOT_NODE_ID).await,
            notifications: self
                .backend
                .notifications
                .reports()
                .into_iter()
                .map(|r| format!("{}: {}", r.message, r.error))
                .collect(),
            calls: self
                .backend
                .server
                .calls()
                .await
                .into_iter()
                .map(|c| CallReport {
                    operation: c.operation.to_string(),
                    target: c.target,
                })
                .collect(),
        }
    }
}

fn drain<T: Clone, F: Fn(T) -> String>(rx: &mut broadcast::Receiver<T>, f: F) -> Vec<String> {
    let mut items = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(item) => items.push(f(item)),
            Err(TryRecvError::Lagged(skipped)) => {
                warn!(skipped, "Event listener lagged, events were dropped");
            }
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }
    items
}

/// Runs every step of a scenario and reports the final state
///
/// Failed steps are recorded and the replay continues with the next step.
#[tracing::instrument(skip_all, fields(steps = scenario.steps.len()))]
pub async fn replay(scenario: &Scenario, options: ReplayOptions) -> ReplayReport {
    let mut replayer = Replayer::new(scenario, options).await;
    let mut reports = Vec::with_capacity(scenario.steps.len());

    for (i, step) in scenario.steps.iter().enumerate() {
        debug!(index = i + 1, step = %step, "Running step");
        let outcome = replayer.run_step(step).await;
        let (opened, closed) = replayer.drain_events();

        let (ok, detail) = match outcome {
            Ok(detail) => (true, detail),
            Err(e) => {
                warn!(index = i + 1, error = %e, "Step failed");
                (false, Some(e.to_string()))
            }
        };
        reports.push(StepReport {
            index: i + 1,
            step: step.to_string(),
            ok,
            detail,
            opened,
            closed,
        });
    }

    let report = replayer.finish(reports).await;
    info!(failed = report.failed_steps(), "Replay finished");
    report
}
