//! Property-based tests for opening, closing and deleting connections
//!
//! **Property 1: every opened connection is cached and announced once**
//! **Property 2: closing all connections announces each one in cache order
//! and refreshes the root exactly once**
//! **Property 3: deleting a non-temporary connection changes nothing**

use dbconn_core::memory::Operation;
use dbconn_core::ConnectionInfoResource;
use proptest::prelude::*;

use crate::fixtures::{postgres_connection, Harness};

// ========== Generators ==========

// Strategy for a list of distinct connection ids
fn arb_ids() -> impl Strategy<Value = Vec<String>> {
    prop::collection::hash_set("[a-z][a-z0-9]{0,7}", 1..10).prop_map(|set| set.into_iter().collect())
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_opened_connections_are_cached_and_announced_once(ids in arb_ids()) {
        let (cached, opened, closed) = runtime().block_on(async {
            let mut h = Harness::new();
            for id in &ids {
                h.open(postgres_connection(id)).await;
            }
            (h.backend.connection_info.ids().await, h.opened_ids(), h.closed_ids())
        });

        prop_assert_eq!(&cached, &ids);
        prop_assert_eq!(&opened, &ids);
        prop_assert!(closed.is_empty());
    }

    #[test]
    fn prop_close_all_announces_each_connection_in_cache_order(ids in arb_ids()) {
        let (closed, refreshes, remaining) = runtime().block_on(async {
            let mut h = Harness::new();
            for id in &ids {
                h.open(postgres_connection(id)).await;
            }
            h.backend.server.clear_calls().await;

            h.manager.close_all_connections().await.unwrap();

            (
                h.closed_ids(),
                h.backend.server.call_count(Operation::UpdateRootChildren).await,
                h.manager.has_any_connection().await,
            )
        });

        prop_assert_eq!(&closed, &ids);
        prop_assert_eq!(refreshes, 1);
        prop_assert!(!remaining);
    }

    #[test]
    fn prop_deleting_persistent_connection_changes_nothing(
        ids in arb_ids(),
        pick in any::<prop::sample::Index>(),
    ) {
        let target = ids[pick.index(ids.len())].clone();

        let (cached, calls, opened, closed, children) = runtime().block_on(async {
            let mut h = Harness::new();
            for id in &ids {
                h.open(postgres_connection(id)).await;
            }
            h.opened_ids();
            h.backend.server.clear_calls().await;
            let children_before = h.backend.nav_tree.children(dbconn_core::ROOT_NODE_ID).await;

            h.manager.delete_connection(&target).await.unwrap();
            h.manager
                .delete_nav_node_connection(&dbconn_core::connection_node_id(&target))
                .await
                .unwrap();

            let children_after = h.backend.nav_tree.children(dbconn_core::ROOT_NODE_ID).await;
            (
                h.backend.connection_info.ids().await,
                h.backend.server.calls().await,
                h.opened_ids(),
                h.closed_ids(),
                children_before == children_after,
            )
        });

        prop_assert_eq!(&cached, &ids);
        prop_assert!(calls.is_empty());
        prop_assert!(opened.is_empty());
        prop_assert!(closed.is_empty());
        prop_assert!(children);
    }
}
