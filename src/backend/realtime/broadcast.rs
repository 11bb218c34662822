/**
 * Real-time Event Routing
 *
 * The delivery coordinator pushes events through [`EventRouter`] instead of
 * reaching into the session registry. The in-process
 * [`SessionRegistry`](super::registry::SessionRegistry) is the only
 * implementation today; a multi-instance deployment would put a pub/sub
 * backed router here so pushes reach sessions held by other processes.
 *
 * # Delivery semantics
 *
 * Routing is fire-and-forget. A recipient without live sessions is not an
 * error, and a send to a closed session is logged and dropped. Both methods
 * return how many sessions the event was handed to.
 */

use async_trait::async_trait;
use uuid::Uuid;

use crate::shared::RealtimeEvent;

/// Identifier of one live WebSocket session
pub type SessionId = Uuid;

#[async_trait]
pub trait EventRouter: Send + Sync {
    /// Deliver to every live session of `user_id`
    async fn emit_to_user(&self, user_id: Uuid, event: &RealtimeEvent) -> usize;

    /// Deliver to every session joined to `conversation_id`, optionally skipping one
    async fn emit_to_conversation(
        &self,
        conversation_id: Uuid,
        event: &RealtimeEvent,
        except: Option<SessionId>,
    ) -> usize;
}
