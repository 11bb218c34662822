//! Session registry
//!
//! Process-local map of live WebSocket sessions. Created once at startup and
//! shared through `AppState`; nothing else holds session state.
//!
//! Each session owns an unbounded channel whose receiver is drained by that
//! session's writer task. A failed send means the writer is gone, so the
//! session is pruned on the spot.
//!
//! Pruning only detaches a session from delivery. The per-user presence set
//! is left to `unregister`, which the gateway calls when the socket's reader
//! ends, so the last departure of a user is always observed exactly once.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::{
    mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender},
    RwLock,
};
use uuid::Uuid;

use crate::backend::error::BackendError;
use crate::shared::RealtimeEvent;

use super::broadcast::{EventRouter, SessionId};

struct Session {
    user_id: Uuid,
    sender: UnboundedSender<RealtimeEvent>,
    rooms: HashSet<Uuid>,
}

#[derive(Default)]
struct RegistryInner {
    sessions: HashMap<SessionId, Session>,
    by_user: HashMap<Uuid, HashSet<SessionId>>,
    rooms: HashMap<Uuid, HashSet<SessionId>>,
}

impl RegistryInner {
    /// Drop a session from delivery and its room memberships; returns its user
    fn detach(&mut self, session_id: SessionId) -> Option<Uuid> {
        let session = self.sessions.remove(&session_id)?;
        for room in &session.rooms {
            if let Some(members) = self.rooms.get_mut(room) {
                members.remove(&session_id);
                if members.is_empty() {
                    self.rooms.remove(room);
                }
            }
        }
        Some(session.user_id)
    }

    /// Remove a session from its user's presence set; returns whether it was
    /// the user's last one, or `None` if it had already departed
    fn depart(&mut self, user_id: Uuid, session_id: SessionId) -> Option<bool> {
        let user_sessions = self.by_user.get_mut(&user_id)?;
        if !user_sessions.remove(&session_id) {
            return None;
        }
        let last = user_sessions.is_empty();
        if last {
            self.by_user.remove(&user_id);
        }
        Some(last)
    }
}

/// A freshly registered session
pub struct Registration {
    pub session_id: SessionId,
    pub receiver: UnboundedReceiver<RealtimeEvent>,
    /// No other session of this user was live
    pub first_session: bool,
}

/// Result of removing a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Departure {
    pub user_id: Uuid,
    /// The user has no live session left
    pub last_session: bool,
}

#[derive(Default)]
pub struct SessionRegistry {
    inner: RwLock<RegistryInner>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, user_id: Uuid) -> Registration {
        let (sender, receiver) = unbounded_channel();
        let session_id = Uuid::new_v4();
        let mut inner = self.inner.write().await;
        inner.sessions.insert(
            session_id,
            Session {
                user_id,
                sender,
                rooms: HashSet::new(),
            },
        );
        let user_sessions = inner.by_user.entry(user_id).or_default();
        user_sessions.insert(session_id);
        let first_session = user_sessions.len() == 1;
        tracing::debug!("[Gateway] Registered session {} for user {}", session_id, user_id);
        Registration {
            session_id,
            receiver,
            first_session,
        }
    }

    /// Remove a session for good, whether or not it was already pruned;
    /// `None` if it was unregistered before
    pub async fn unregister(&self, user_id: Uuid, session_id: SessionId) -> Option<Departure> {
        let mut inner = self.inner.write().await;
        inner.detach(session_id);
        let last_session = inner.depart(user_id, session_id)?;
        tracing::debug!("[Gateway] Unregistered session {} of user {}", session_id, user_id);
        Some(Departure {
            user_id,
            last_session,
        })
    }

    /// Bind a session to a conversation's broadcast group; false if the
    /// session is unknown
    pub async fn join(&self, session_id: SessionId, conversation_id: Uuid) -> bool {
        let mut inner = self.inner.write().await;
        let Some(session) = inner.sessions.get_mut(&session_id) else {
            return false;
        };
        session.rooms.insert(conversation_id);
        inner.rooms.entry(conversation_id).or_default().insert(session_id);
        true
    }

    pub async fn leave(&self, session_id: SessionId, conversation_id: Uuid) -> bool {
        let mut inner = self.inner.write().await;
        let Some(session) = inner.sessions.get_mut(&session_id) else {
            return false;
        };
        let was_joined = session.rooms.remove(&conversation_id);
        if let Some(members) = inner.rooms.get_mut(&conversation_id) {
            members.remove(&session_id);
            if members.is_empty() {
                inner.rooms.remove(&conversation_id);
            }
        }
        was_joined
    }

    pub async fn is_joined(&self, session_id: SessionId, conversation_id: Uuid) -> bool {
        self.inner
            .read()
            .await
            .sessions
            .get(&session_id)
            .is_some_and(|s| s.rooms.contains(&conversation_id))
    }

    /// Deliver to one session
    pub async fn emit_to_session(
        &self,
        session_id: SessionId,
        event: &RealtimeEvent,
    ) -> Result<(), BackendError> {
        let sender = self
            .inner
            .read()
            .await
            .sessions
            .get(&session_id)
            .map(|s| s.sender.clone())
            .ok_or_else(|| BackendError::transport("session is no longer connected"))?;
        if sender.send(event.clone()).is_err() {
            self.prune(&[session_id]).await;
            return Err(BackendError::transport("session is no longer connected"));
        }
        Ok(())
    }

    /// Deliver to every session except those of `user_id`
    pub async fn emit_to_others(&self, user_id: Uuid, event: &RealtimeEvent) -> usize {
        let targets: Vec<(SessionId, UnboundedSender<RealtimeEvent>)> = self
            .inner
            .read()
            .await
            .sessions
            .iter()
            .filter(|(_, s)| s.user_id != user_id)
            .map(|(id, s)| (*id, s.sender.clone()))
            .collect();
        self.deliver(targets, event).await
    }

    /// Drop sessions whose writer has gone away
    pub async fn prune_closed(&self) -> usize {
        let closed: Vec<SessionId> = self
            .inner
            .read()
            .await
            .sessions
            .iter()
            .filter(|(_, s)| s.sender.is_closed())
            .map(|(id, _)| *id)
            .collect();
        self.prune(&closed).await
    }

    pub async fn session_count(&self) -> usize {
        self.inner.read().await.sessions.len()
    }

    /// Sessions of `user_id` whose connection has not ended, pruned or not
    pub async fn user_session_count(&self, user_id: Uuid) -> usize {
        self.inner
            .read()
            .await
            .by_user
            .get(&user_id)
            .map_or(0, HashSet::len)
    }

    async fn prune(&self, session_ids: &[SessionId]) -> usize {
        if session_ids.is_empty() {
            return 0;
        }
        let mut inner = self.inner.write().await;
        session_ids
            .iter()
            .filter(|id| inner.detach(**id).is_some())
            .count()
    }

    /// Send to each target; returns how many accepted the event
    async fn deliver(
        &self,
        targets: Vec<(SessionId, UnboundedSender<RealtimeEvent>)>,
        event: &RealtimeEvent,
    ) -> usize {
        let mut dead = Vec::new();
        let mut delivered = 0;
        for (session_id, sender) in targets {
            if sender.send(event.clone()).is_ok() {
                delivered += 1;
            } else {
                tracing::debug!(
                    "[Gateway] Dropping {} for closed session {}",
                    event.event.as_str(),
                    session_id
                );
                dead.push(session_id);
            }
        }
        self.prune(&dead).await;
        delivered
    }
}

#[async_trait]
impl EventRouter for SessionRegistry {
    async fn emit_to_user(&self, user_id: Uuid, event: &RealtimeEvent) -> usize {
        let targets: Vec<(SessionId, UnboundedSender<RealtimeEvent>)> = {
            let inner = self.inner.read().await;
            inner
                .by_user
                .get(&user_id)
                .into_iter()
                .flatten()
                .filter_map(|id| inner.sessions.get(id).map(|s| (*id, s.sender.clone())))
                .collect()
        };
        self.deliver(targets, event).await
    }

    async fn emit_to_conversation(
        &self,
        conversation_id: Uuid,
        event: &RealtimeEvent,
        except: Option<SessionId>,
    ) -> usize {
        let targets: Vec<(SessionId, UnboundedSender<RealtimeEvent>)> = {
            let inner = self.inner.read().await;
            inner
                .rooms
                .get(&conversation_id)
                .into_iter()
                .flatten()
                .filter(|id| Some(**id) != except)
                .filter_map(|id| inner.sessions.get(id).map(|s| (*id, s.sender.clone())))
                .collect()
        };
        self.deliver(targets, event).await
    }
}
