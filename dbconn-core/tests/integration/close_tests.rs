//! Closing connections directly and from the navigator

use dbconn_core::memory::{Call, Operation};
use dbconn_core::{ConnectionInfoResource, NavNodeManager, ROOT_NODE_ID};

use crate::fixtures::{postgres_connection, Harness};

#[tokio::test]
async fn test_close_connection_refreshes_root_unless_skipped() {
    let mut h = Harness::new();
    h.open(postgres_connection("a")).await;
    h.open(postgres_connection("b")).await;
    h.backend.server.clear_calls().await;

    h.manager.close_connection("a", true).await.unwrap();
    assert_eq!(
        h.backend.server.call_count(Operation::UpdateRootChildren).await,
        0
    );

    h.manager.close_connection("b", false).await.unwrap();
    assert_eq!(
        h.backend.server.call_count(Operation::UpdateRootChildren).await,
        1
    );

    assert_eq!(h.closed_ids(), vec!["a", "b"]);
    assert!(h.backend.server.open_ids().await.is_empty());
    assert!(h.backend.nav_tree.children(ROOT_NODE_ID).await.is_empty());
}

#[tokio::test]
async fn test_close_connection_failure_emits_nothing() {
    let mut h = Harness::new();
    h.open(postgres_connection("a")).await;
    h.backend.server.fail_on(Operation::CloseConnection).await;

    assert!(h.manager.close_connection("a", false).await.is_err());
    assert!(h.closed_ids().is_empty());
    assert!(h.backend.connection_info.get("a").await.is_some());
}

#[tokio::test]
async fn test_close_all_connections_in_cache_order_with_one_refresh() {
    let mut h = Harness::new();
    for id in ["c", "a", "b"] {
        h.open(postgres_connection(id)).await;
    }
    h.backend.server.clear_calls().await;

    h.manager.close_all_connections().await.unwrap();

    assert_eq!(h.closed_ids(), vec!["c", "a", "b"]);
    assert!(!h.manager.has_any_connection().await);

    let calls = h.backend.server.calls().await;
    let operations: Vec<_> = calls.iter().map(|c| c.operation).collect();
    assert_eq!(
        operations,
        vec![
            Operation::CloseConnection,
            Operation::CloseConnection,
            Operation::CloseConnection,
            Operation::UpdateRootChildren,
        ]
    );
}

#[tokio::test]
async fn test_close_all_with_empty_cache_still_refreshes_once() {
    let mut h = Harness::new();
    h.manager.close_all_connections().await.unwrap();

    assert!(h.closed_ids().is_empty());
    assert_eq!(
        h.backend.server.calls().await,
        vec![Call {
            operation: Operation::UpdateRootChildren,
            target: ROOT_NODE_ID.to_string(),
        }]
    );
}

#[tokio::test]
async fn test_close_nav_node_connection_closes_and_refreshes_node() {
    let mut h = Harness::new();
    h.open(postgres_connection("a")).await;
    h.backend.server.clear_calls().await;

    h.manager.close_nav_node_connection("database://a").await;

    assert_eq!(h.closed_ids(), vec!["a"]);
    assert!(h.backend.connection_info.get("a").await.is_none());
    assert_eq!(
        h.backend.server.calls().await,
        vec![
            Call {
                operation: Operation::CloseConnection,
                target: "a".to_string(),
            },
            Call {
                operation: Operation::RemoveTree,
                target: "database://a".to_string(),
            },
            Call {
                operation: Operation::RefreshNode,
                target: "database://a".to_string(),
            },
        ]
    );
    assert!(h.backend.notifications.reports().is_empty());
}

#[tokio::test]
async fn test_close_nav_node_of_unknown_connection_does_nothing() {
    let mut h = Harness::new();
    h.open(postgres_connection("a")).await;
    h.opened_ids();
    h.backend.server.clear_calls().await;

    h.manager.close_nav_node_connection("database://ghost").await;

    assert!(h.backend.server.calls().await.is_empty());
    assert!(h.closed_ids().is_empty());
    assert!(h.opened_ids().is_empty());
    assert!(h.backend.connection_info.get("a").await.is_some());
}

#[tokio::test]
async fn test_close_nav_node_failure_is_reported_not_returned() {
    let mut h = Harness::new();
    h.open(postgres_connection("a")).await;
    h.backend.server.fail_on(Operation::RemoveTree).await;

    h.manager.close_nav_node_connection("database://a").await;

    // The remote close went through before the tree step failed
    assert_eq!(h.closed_ids(), vec!["a"]);
    assert_eq!(h.backend.server.call_count(Operation::RefreshNode).await, 0);

    let reports = h.backend.notifications.reports();
    assert_eq!(reports.len(), 1);
    assert!(reports[0].message.contains("database://a"));
    assert!(reports[0].error.contains("remove_tree"));
}

#[tokio::test]
async fn test_close_nav_node_remote_failure_is_reported() {
    let mut h = Harness::new();
    h.open(postgres_connection("a")).await;
    h.backend.server.fail_on(Operation::CloseConnection).await;

    h.manager.close_nav_node_connection("database://a").await;

    assert!(h.closed_ids().is_empty());
    assert_eq!(h.backend.notifications.reports().len(), 1);
    assert!(h.backend.nav_tree.get_node("database://a").await.is_some());
}
