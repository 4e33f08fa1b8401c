//! Opening, deleting and container lookup

use std::sync::Arc;

use async_trait::async_trait;
use dbconn_core::error::ResourceResult;
use dbconn_core::memory::{MemoryBackend, Operation};
use dbconn_core::models::ObjectContainer;
use dbconn_core::{
    ConnectionInfoResource, ConnectionsManager, ContainerResource, DbConnError, NavNodeManager,
    ResourceError, ROOT_NODE_ID,
};

use crate::fixtures::{containers, postgres_connection, temporary_connection, Harness};

// ============================================================================
// add_opened_connection
// ============================================================================

#[tokio::test]
async fn test_opened_connection_is_cached_announced_and_shown_first() {
    let mut h = Harness::new();
    h.open(postgres_connection("a")).await;
    h.open(postgres_connection("b")).await;

    assert!(h.backend.connection_info.get("a").await.is_some());
    assert!(h.backend.connection_info.get("b").await.is_some());
    assert_eq!(h.opened_ids(), vec!["a", "b"]);
    assert!(h.closed_ids().is_empty());

    assert_eq!(
        h.backend.nav_tree.children(ROOT_NODE_ID).await,
        vec!["database://b", "database://a"]
    );
    let node = h.backend.nav_tree.get_node("database://a").await.unwrap();
    assert_eq!(node.parent_id, ROOT_NODE_ID);
    assert_eq!(node.name, "PostgreSQL a");
}

#[tokio::test]
async fn test_failed_node_load_keeps_cache_registration() {
    let mut h = Harness::new();
    let conn = h.define(postgres_connection("a")).await;
    h.backend.server.fail_on(Operation::LoadNode).await;

    let err = h.manager.add_opened_connection(conn).await.unwrap_err();

    assert!(matches!(err, DbConnError::Navigation(_)));
    assert!(h.backend.connection_info.get("a").await.is_some());
    assert_eq!(h.opened_ids(), vec!["a"]);
    assert!(h.backend.nav_tree.children(ROOT_NODE_ID).await.is_empty());
    assert_eq!(h.backend.server.call_count(Operation::UnshiftToNode).await, 0);
}

#[tokio::test]
async fn test_has_any_connection_tracks_cache() {
    let h = Harness::new();
    assert!(!h.manager.has_any_connection().await);

    h.open(postgres_connection("a")).await;
    assert!(h.manager.has_any_connection().await);

    h.manager.close_connection("a", false).await.unwrap();
    assert!(!h.manager.has_any_connection().await);
}

// ============================================================================
// delete_connection
// ============================================================================

#[tokio::test]
async fn test_delete_temporary_connection() {
    let mut h = Harness::new();
    h.open(postgres_connection("keep")).await;
    h.open(temporary_connection("tmp")).await;
    h.opened_ids();
    h.backend.server.clear_calls().await;

    h.manager.delete_connection("tmp").await.unwrap();

    assert!(h.backend.connection_info.get("tmp").await.is_none());
    assert!(!h.backend.server.is_defined("tmp").await);
    assert_eq!(h.closed_ids(), vec!["tmp"]);
    assert_eq!(
        h.backend.nav_tree.children(ROOT_NODE_ID).await,
        vec!["database://keep"]
    );
    assert_eq!(h.backend.server.call_count(Operation::DeleteConnection).await, 1);
    assert_eq!(h.backend.server.call_count(Operation::DeleteInNode).await, 1);
}

#[tokio::test]
async fn test_delete_persistent_connection_is_a_no_op() {
    let mut h = Harness::new();
    h.open(postgres_connection("a")).await;
    h.opened_ids();
    h.backend.server.clear_calls().await;

    h.manager.delete_connection("a").await.unwrap();

    assert!(h.backend.connection_info.get("a").await.is_some());
    assert!(h.backend.server.calls().await.is_empty());
    assert!(h.closed_ids().is_empty());
    assert!(h.opened_ids().is_empty());
    assert_eq!(
        h.backend.nav_tree.children(ROOT_NODE_ID).await,
        vec!["database://a"]
    );
}

#[tokio::test]
async fn test_delete_unknown_connection_is_a_no_op() {
    let mut h = Harness::new();
    h.manager.delete_connection("ghost").await.unwrap();
    assert!(h.backend.server.calls().await.is_empty());
    assert!(h.closed_ids().is_empty());
}

#[tokio::test]
async fn test_delete_without_tree_node_still_closes() {
    let mut h = Harness::new();
    let conn = h.define(temporary_connection("tmp")).await;
    h.backend.connection_info.set("tmp", conn).await;

    h.manager.delete_connection("tmp").await.unwrap();

    assert_eq!(h.closed_ids(), vec!["tmp"]);
    assert_eq!(h.backend.server.call_count(Operation::DeleteInNode).await, 0);
}

#[tokio::test]
async fn test_failed_remote_delete_propagates_without_events() {
    let mut h = Harness::new();
    h.open(temporary_connection("tmp")).await;
    h.backend.server.fail_on(Operation::DeleteConnection).await;

    let err = h.manager.delete_connection("tmp").await.unwrap_err();

    assert!(matches!(
        err,
        DbConnError::Resource(ResourceError::Remote { .. })
    ));
    assert!(h.closed_ids().is_empty());
    assert!(h.backend.connection_info.get("tmp").await.is_some());
}

#[tokio::test]
async fn test_delete_nav_node_connection_derives_connection_id() {
    let mut h = Harness::new();
    h.open(temporary_connection("tmp")).await;

    h.manager
        .delete_nav_node_connection("database://tmp")
        .await
        .unwrap();

    assert_eq!(h.closed_ids(), vec!["tmp"]);
    assert!(h.backend.nav_tree.children(ROOT_NODE_ID).await.is_empty());
}

// ============================================================================
// Object containers
// ============================================================================

#[tokio::test]
async fn test_load_object_container_returns_cached_sequence() {
    let h = Harness::new();
    h.open(postgres_connection("x")).await;
    h.backend
        .server
        .define_containers("x", containers(&["public", "sales"]))
        .await;

    let loaded = h.manager.load_object_container("x", Some("main")).await.unwrap();

    let names: Vec<_> = loaded.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["public", "sales"]);
    assert_eq!(h.backend.server.call_count(Operation::LoadContainers).await, 1);
}

#[tokio::test]
async fn test_load_object_container_failure_propagates() {
    let h = Harness::new();
    h.backend.server.fail_on(Operation::LoadContainers).await;

    let err = h.manager.load_object_container("x", None).await.unwrap_err();
    assert!(matches!(err, DbConnError::Resource(_)));
}

/// Container resource whose loads succeed without caching anything
struct ForgetfulContainers;

#[async_trait]
impl ContainerResource for ForgetfulContainers {
    async fn load(&self, _connection_id: &str, _catalog_id: Option<&str>) -> ResourceResult<()> {
        Ok(())
    }

    async fn get(&self, _connection_id: &str) -> Option<Vec<ObjectContainer>> {
        None
    }
}

#[tokio::test]
async fn test_load_object_container_without_cache_entry_is_missing_entry() {
    let backend = MemoryBackend::new();
    let manager = ConnectionsManager::new(
        Arc::clone(&backend.connection_info) as _,
        Arc::new(ForgetfulContainers),
        Arc::clone(&backend.nav_tree) as _,
        Arc::clone(&backend.session) as _,
        Arc::clone(&backend.notifications) as _,
    );

    let err = manager.load_object_container("x", Some("main")).await.unwrap_err();

    assert!(matches!(
        err,
        DbConnError::Resource(ResourceError::MissingEntry(ref id)) if id == "x"
    ));
}

#[tokio::test]
async fn test_get_object_container_prefers_array_order() {
    let h = Harness::new();
    h.backend
        .server
        .define_containers("x", containers(&["public", "sales"]))
        .await;

    assert!(h
        .manager
        .get_object_container_by_id("x", "sales", Some("public"))
        .await
        .is_none());

    h.manager.load_object_container("x", None).await.unwrap();

    let found = h
        .manager
        .get_object_container_by_id("x", "sales", Some("public"))
        .await
        .unwrap();
    assert_eq!(found.name, "public");

    let found = h
        .manager
        .get_object_container_by_id("x", "sales", None)
        .await
        .unwrap();
    assert_eq!(found.name, "sales");

    assert!(h
        .manager
        .get_object_container_by_id("x", "hr", Some("audit"))
        .await
        .is_none());
}
