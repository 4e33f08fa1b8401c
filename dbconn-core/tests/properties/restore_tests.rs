//! Property-based tests for session restoration
//!
//! **Property: after a restore the cache holds exactly the session's
//! connections; every dropped connection is announced closed once and every
//! session connection is announced open, whether or not it was cached.**

use std::collections::BTreeSet;

use dbconn_core::memory::Operation;
use dbconn_core::ConnectionInfoResource;
use proptest::prelude::*;

use crate::fixtures::{postgres_connection, Harness};

const UNIVERSE: [&str; 8] = ["a", "b", "c", "d", "e", "f", "g", "h"];

// Strategy for a subset of the id universe, kept in universe order
fn arb_subset() -> impl Strategy<Value = Vec<String>> {
    prop::collection::btree_set(0..UNIVERSE.len(), 0..=UNIVERSE.len()).prop_map(|set| {
        set.into_iter()
            .map(|i| UNIVERSE[i].to_string())
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_restore_reconciles_cache_with_session(
        cached in arb_subset(),
        session in arb_subset(),
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        let (after, opened, closed, refreshes) = runtime.block_on(async {
            let mut h = Harness::new();
            for id in UNIVERSE {
                h.define(postgres_connection(id)).await;
            }
            for id in &cached {
                h.open(postgres_connection(id)).await;
            }
            h.backend.server.set_session_connections(&session).await;
            h.opened_ids();
            h.backend.server.clear_calls().await;

            h.manager.restore_connections().await.unwrap();

            (
                h.backend.connection_info.ids().await,
                h.opened_ids(),
                h.closed_ids(),
                h.backend.server.call_count(Operation::UpdateRootChildren).await,
            )
        });

        let after: BTreeSet<_> = after.into_iter().collect();
        let expected: BTreeSet<_> = session.iter().cloned().collect();
        prop_assert_eq!(after, expected);

        prop_assert_eq!(&opened, &session);

        let dropped: Vec<_> = cached
            .iter()
            .filter(|id| !session.contains(id))
            .cloned()
            .collect();
        prop_assert_eq!(closed, dropped);

        prop_assert_eq!(refreshes, 1);
    }
}
