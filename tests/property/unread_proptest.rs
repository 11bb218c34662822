//! Property-based tests for unread counters
//!
//! Random interleavings of sends and read-marks between two users, checked
//! against a simple model.

use proptest::prelude::*;
use uuid::Uuid;

use marketchat::backend::server::AppState;
use marketchat::shared::messaging::{SendMessageRequest, UserRecord};
use marketchat::shared::ChatConfig;

#[derive(Debug, Clone, Copy)]
enum Step {
    /// Send from user 0 or user 1
    Send(usize),
    /// Mark everything read as user 0 or user 1
    Read(usize),
}

fn steps() -> impl Strategy<Value = Vec<Step>> {
    prop::collection::vec(
        prop_oneof![
            3 => (0usize..2).prop_map(Step::Send),
            1 => (0usize..2).prop_map(Step::Read),
        ],
        1..30,
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn test_unread_counts_match_model(steps in steps()) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        let (expected, actual) = runtime.block_on(async move {
            let (state, store) = AppState::in_memory(ChatConfig::default());
            let users = [Uuid::new_v4(), Uuid::new_v4()];
            store.insert_user(UserRecord::new(users[0], "Seller")).await;
            store.insert_user(UserRecord::new(users[1], "Buyer")).await;

            let mut model = [0u32; 2];
            let mut conversation = None;
            for step in steps {
                match step {
                    Step::Send(from) => {
                        let to = 1 - from;
                        let message = state
                            .coordinator
                            .send(users[from], SendMessageRequest::to_user(users[to], "ping"))
                            .await
                            .unwrap();
                        conversation = Some(message.conversation_id);
                        model[to] += 1;
                    }
                    Step::Read(reader) => {
                        if let Some(conversation_id) = conversation {
                            state
                                .coordinator
                                .mark_read(users[reader], conversation_id, &[])
                                .await
                                .unwrap();
                            model[reader] = 0;
                        }
                    }
                }
            }

            let mut actual = [0u32; 2];
            for (i, user) in users.iter().enumerate() {
                let threads = state.coordinator.list_conversations(*user).await.unwrap();
                assert!(threads.len() <= 1);
                actual[i] = threads.first().map(|t| t.unread_count).unwrap_or(0);
            }
            (model, actual)
        });

        prop_assert_eq!(expected, actual);
    }
}
