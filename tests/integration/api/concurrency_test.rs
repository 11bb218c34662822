//! Concurrent first contact
//!
//! Two users messaging each other for the first time at the same moment
//! must end up in one thread.

use std::sync::Arc;

use marketchat::backend::server::AppState;
use marketchat::shared::messaging::{SendMessageRequest, UserRecord};
use marketchat::shared::ChatConfig;
use uuid::Uuid;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_simultaneous_first_sends_share_one_thread() {
    let (state, store) = AppState::in_memory(ChatConfig::default());
    let state = Arc::new(state);

    for round in 0..25 {
        let seller = Uuid::new_v4();
        let buyer = Uuid::new_v4();
        let product = Uuid::new_v4();
        store.insert_user(UserRecord::new(seller, "Seller")).await;
        store.insert_user(UserRecord::new(buyer, "Buyer")).await;

        let from_buyer = {
            let state = state.clone();
            tokio::spawn(async move {
                state
                    .coordinator
                    .send(
                        buyer,
                        SendMessageRequest::to_user(seller, "is this available?")
                            .with_product(product),
                    )
                    .await
            })
        };
        let from_seller = {
            let state = state.clone();
            tokio::spawn(async move {
                state
                    .coordinator
                    .send(
                        seller,
                        SendMessageRequest::to_user(buyer, "still interested?")
                            .with_product(product),
                    )
                    .await
            })
        };
        let (a, b) = tokio::join!(from_buyer, from_seller);
        let a = a.unwrap().unwrap();
        let b = b.unwrap().unwrap();

        assert_eq!(a.conversation_id, b.conversation_id, "round {}", round);
        assert_eq!(store.conversation_count().await, round + 1);

        for user in [seller, buyer] {
            let threads = state.directory.list_for_user(user).await.unwrap();
            assert_eq!(threads.len(), 1, "round {}", round);
            assert_eq!(threads[0].product_id, Some(product));
            assert_eq!(threads[0].unread_for(user), 1);
        }
    }
}
