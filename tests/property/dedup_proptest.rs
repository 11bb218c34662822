//! Property-based tests for thread deduplication

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use proptest::prelude::*;
use uuid::Uuid;

use marketchat::backend::messaging::dedup_threads;
use marketchat::shared::messaging::{Conversation, ConversationKey, ProductScope};

/// (other participant index, product index or none, minutes after epoch)
fn raw_threads() -> impl Strategy<Value = Vec<(usize, Option<usize>, i64)>> {
    prop::collection::vec((0usize..3, prop::option::of(0usize..2), 0i64..1_000), 0..24)
}

fn build(me: Uuid, others: &[Uuid], products: &[Uuid], raw: &[(usize, Option<usize>, i64)]) -> Vec<Conversation> {
    let epoch = DateTime::<Utc>::UNIX_EPOCH;
    raw.iter()
        .map(|(other, product, minutes)| {
            let scope = ProductScope::from_product_id(product.map(|p| products[p]));
            let key = ConversationKey::new(me, others[*other], scope).unwrap();
            Conversation::new(key, epoch + Duration::minutes(*minutes))
        })
        .collect()
}

proptest! {
    #[test]
    fn test_one_thread_per_other_and_scope(raw in raw_threads()) {
        let me = Uuid::new_v4();
        let others: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
        let products: Vec<Uuid> = (0..2).map(|_| Uuid::new_v4()).collect();
        let conversations = build(me, &others, &products, &raw);

        let expected: HashSet<(Uuid, ProductScope)> = conversations
            .iter()
            .map(|c| (c.other_participant(me).unwrap(), c.scope()))
            .collect();
        let threads = dedup_threads(conversations, me);

        let groups: HashSet<(Uuid, ProductScope)> = threads
            .iter()
            .map(|c| (c.other_participant(me).unwrap(), c.scope()))
            .collect();
        prop_assert_eq!(groups.len(), threads.len());
        prop_assert_eq!(groups, expected);
    }

    #[test]
    fn test_keeps_most_recent_duplicate(raw in raw_threads()) {
        let me = Uuid::new_v4();
        let others: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
        let products: Vec<Uuid> = (0..2).map(|_| Uuid::new_v4()).collect();
        let conversations = build(me, &others, &products, &raw);
        let all = conversations.clone();

        for thread in dedup_threads(conversations, me) {
            let group = (thread.other_participant(me), thread.scope());
            let beaten = all.iter().any(|c| {
                (c.other_participant(me), c.scope()) == group && c.recency_cmp(&thread).is_lt()
            });
            prop_assert!(!beaten);
        }
    }

    #[test]
    fn test_output_sorted_most_recent_first(raw in raw_threads()) {
        let me = Uuid::new_v4();
        let others: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
        let products: Vec<Uuid> = (0..2).map(|_| Uuid::new_v4()).collect();
        let threads = dedup_threads(build(me, &others, &products, &raw), me);

        prop_assert!(threads
            .windows(2)
            .all(|w| w[0].last_message_at >= w[1].last_message_at));
    }

    #[test]
    fn test_foreign_threads_are_dropped(raw in raw_threads()) {
        let me = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        let others: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
        let products: Vec<Uuid> = (0..2).map(|_| Uuid::new_v4()).collect();
        let threads = dedup_threads(build(me, &others, &products, &raw), stranger);
        prop_assert!(threads.is_empty());
    }
}
