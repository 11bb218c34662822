//! Delivery Coordinator
//!
//! The one place that sequences a send: resolve the conversation, persist
//! the message, update counters, then push. HTTP handlers and the WebSocket
//! gateway both call in here.
//!
//! Delivery is at-most-once. Nothing is pushed unless the message and the
//! counter updates are stored, and nothing is retried server-side.

use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use crate::backend::error::BackendError;
use crate::backend::realtime::broadcast::EventRouter;
use crate::shared::messaging::{
    ChatMessage, Conversation, ConversationSummary, JoinConversationRequest,
    ListMessagesQuery, ListMessagesResponse, MessageView, ProductScope, ReadReceipt,
    SendMessageRequest, UserSummary,
};
use crate::shared::{EventName, RealtimeEvent};

use super::directory::ConversationDirectory;
use super::log::MessageLog;
use super::store::IdentityStore;

/// `lastMessage` of a conversation whose latest message has no text
const ATTACHMENT_SUMMARY: &str = "Attachment";

pub struct DeliveryCoordinator {
    directory: Arc<ConversationDirectory>,
    log: Arc<MessageLog>,
    identity: Arc<dyn IdentityStore>,
    router: Arc<dyn EventRouter>,
}

impl DeliveryCoordinator {
    pub fn new(
        directory: Arc<ConversationDirectory>,
        log: Arc<MessageLog>,
        identity: Arc<dyn IdentityStore>,
        router: Arc<dyn EventRouter>,
    ) -> Self {
        Self {
            directory,
            log,
            identity,
            router,
        }
    }

    /// Send a message from `sender` and push it to live sessions
    pub async fn send(
        &self,
        sender: Uuid,
        request: SendMessageRequest,
    ) -> Result<MessageView, BackendError> {
        // 1. Validate
        request.validate(sender)?;
        if let Some(receiver) = request.receiver_id {
            self.require_user(receiver).await?;
        }
        let sender_summary = self.summary_of(sender).await?;

        // 2. Resolve the conversation
        let conversation = self.resolve_for_send(sender, &request).await?;
        let receiver = ConversationDirectory::other_participant(&conversation, sender)?;

        // 3. Persist
        let SendMessageRequest {
            text, attachments, ..
        } = request;
        let message = self
            .log
            .append(conversation.id, sender, text, attachments)
            .await
            .inspect_err(|e| {
                tracing::error!("[Delivery] Failed to store message in {}: {}", conversation.id, e)
            })?;

        // 4. Counters and summary; on failure the message stays stored but is not pushed
        if let Err(e) = self.record_delivery(&conversation, &message, receiver).await {
            tracing::error!(
                "[Delivery] Message {} stored but conversation {} not updated: {}",
                message.id,
                conversation.id,
                e
            );
            return Err(e);
        }

        // 5. Fan out
        let view = MessageView::new(message, sender_summary);
        self.fan_out(conversation.id, receiver, &view).await?;

        // 6. Hand the populated message back to the caller
        Ok(view)
    }

    /// Resolve or create the conversation a session wants to join
    pub async fn open_conversation(
        &self,
        user_id: Uuid,
        request: JoinConversationRequest,
    ) -> Result<ConversationSummary, BackendError> {
        let conversation = match (request.conversation_id, request.other_user_id) {
            (Some(conversation_id), _) => self.directory.authorize(conversation_id, user_id).await?,
            (None, Some(other)) => {
                if other == user_id {
                    return Err(BackendError::validation(
                        "otherUserId",
                        "cannot open a conversation with yourself",
                    ));
                }
                self.require_user(other).await?;
                self.directory
                    .find_or_create(user_id, other, ProductScope::from_product_id(request.product_id))
                    .await?
            }
            (None, None) => {
                return Err(BackendError::validation(
                    "conversationId",
                    "a conversation or other user is required",
                ))
            }
        };
        let mut summaries = self.summarize(vec![conversation], user_id).await?;
        summaries
            .pop()
            .ok_or_else(|| BackendError::forbidden("not a participant in this conversation"))
    }

    /// Mark messages read, reset the reader's counter and notify the room
    pub async fn mark_read(
        &self,
        user_id: Uuid,
        conversation_id: Uuid,
        message_ids: &[Uuid],
    ) -> Result<ReadReceipt, BackendError> {
        let acknowledged = self.log.mark_read(conversation_id, user_id, message_ids).await?;
        self.directory.reset_unread(conversation_id, user_id).await?;

        let receipt = ReadReceipt {
            conversation_id,
            user_id,
            message_ids: acknowledged,
            unread_count: 0,
        };
        let event = RealtimeEvent::from_payload(EventName::MessageReadAck, &receipt)?;
        self.router
            .emit_to_conversation(conversation_id, &event, None)
            .await;
        Ok(receipt)
    }

    /// Deduplicated thread list of `user_id`, most recent first
    pub async fn list_conversations(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<ConversationSummary>, BackendError> {
        let conversations = self.directory.list_for_user(user_id).await?;
        self.summarize(conversations, user_id).await
    }

    /// A page of history with sender summaries embedded
    pub async fn list_messages(
        &self,
        user_id: Uuid,
        conversation_id: Uuid,
        query: &ListMessagesQuery,
    ) -> Result<ListMessagesResponse, BackendError> {
        let page = self.log.list(conversation_id, user_id, query).await?;

        let mut sender_ids: Vec<Uuid> = page.messages.iter().map(|m| m.sender_id).collect();
        sender_ids.sort();
        sender_ids.dedup();
        let senders = self.summaries_of(&sender_ids).await?;

        let messages = page
            .messages
            .into_iter()
            .map(|message| {
                let sender = senders
                    .get(&message.sender_id)
                    .cloned()
                    .unwrap_or_else(|| UserSummary::unknown(message.sender_id));
                MessageView::new(message, sender)
            })
            .collect();
        Ok(ListMessagesResponse {
            messages,
            has_more: page.has_more,
        })
    }

    async fn resolve_for_send(
        &self,
        sender: Uuid,
        request: &SendMessageRequest,
    ) -> Result<Conversation, BackendError> {
        match (request.conversation_id, request.receiver_id) {
            (Some(conversation_id), receiver) => {
                let conversation = self.directory.authorize(conversation_id, sender).await?;
                if let Some(receiver) = receiver {
                    if conversation.other_participant(sender) != Some(receiver) {
                        return Err(BackendError::validation(
                            "receiverId",
                            "receiver is not the other participant of this conversation",
                        ));
                    }
                }
                Ok(conversation)
            }
            (None, Some(receiver)) => {
                self.directory
                    .find_or_create(
                        sender,
                        receiver,
                        ProductScope::from_product_id(request.product_id),
                    )
                    .await
            }
            (None, None) => Err(BackendError::validation(
                "receiverId",
                "a receiver or conversation is required",
            )),
        }
    }

    async fn record_delivery(
        &self,
        conversation: &Conversation,
        message: &ChatMessage,
        receiver: Uuid,
    ) -> Result<(), BackendError> {
        let unread = self
            .directory
            .increment_unread(conversation.id, receiver)
            .await?;
        let summary = if message.text.is_empty() {
            ATTACHMENT_SUMMARY
        } else {
            message.text.as_str()
        };
        self.directory
            .touch_last_message(conversation.id, message.sender_id, summary, message.created_at)
            .await?;
        tracing::debug!(
            "[Delivery] {} -> {} in {} ({} unread): {}",
            message.sender_id,
            receiver,
            conversation.id,
            unread,
            message.preview(40)
        );
        Ok(())
    }

    async fn fan_out(
        &self,
        conversation_id: Uuid,
        receiver: Uuid,
        view: &MessageView,
    ) -> Result<(), BackendError> {
        let receive = RealtimeEvent::from_payload(EventName::MessageReceive, view)?;
        let in_room = RealtimeEvent::from_payload(EventName::ConversationMessage, view)?;

        let to_receiver = self.router.emit_to_user(receiver, &receive).await;
        let to_room = self
            .router
            .emit_to_conversation(conversation_id, &in_room, None)
            .await;
        tracing::info!(
            "[Delivery] Message {} pushed to {} receiver session(s), {} room session(s)",
            view.id,
            to_receiver,
            to_room
        );
        Ok(())
    }

    async fn require_user(&self, user_id: Uuid) -> Result<(), BackendError> {
        match self.identity.get_user(user_id).await? {
            Some(_) => Ok(()),
            None => Err(BackendError::not_found("user", user_id)),
        }
    }

    async fn summary_of(&self, user_id: Uuid) -> Result<UserSummary, BackendError> {
        Ok(self
            .identity
            .get_user(user_id)
            .await?
            .map(|user| user.summary())
            .unwrap_or_else(|| UserSummary::unknown(user_id)))
    }

    async fn summaries_of(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, UserSummary>, BackendError> {
        Ok(self
            .identity
            .get_users(ids)
            .await?
            .into_iter()
            .map(|user| (user.id, user.summary()))
            .collect())
    }

    async fn summarize(
        &self,
        conversations: Vec<Conversation>,
        user_id: Uuid,
    ) -> Result<Vec<ConversationSummary>, BackendError> {
        let others: Vec<Uuid> = conversations
            .iter()
            .filter_map(|c| c.other_participant(user_id))
            .collect();
        let people = self.summaries_of(&others).await?;

        Ok(conversations
            .into_iter()
            .filter_map(|conversation| {
                let other = conversation.other_participant(user_id)?;
                Some(ConversationSummary {
                    id: conversation.id,
                    participants: conversation.participants.as_array(),
                    other_participant: people
                        .get(&other)
                        .cloned()
                        .unwrap_or_else(|| UserSummary::unknown(other)),
                    product_id: conversation.product_id,
                    unread_count: conversation.unread_for(user_id),
                    last_message: conversation.last_message,
                    last_message_at: conversation.last_message_at,
                })
            })
            .collect())
    }
}
