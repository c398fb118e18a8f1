//! Realtime chat hub: connection-addressed message delivery.
//!
//! `ChatHub` binds the chat service to the presence registry. It is
//! transport-agnostic: the WebSocket handler in the API crate (and the REST
//! handlers) call these operations with a [`HubCaller`] describing who is
//! invoking and from which connection.
//!
//! Delivery is at-most-once. A message for a user without live connections
//! is persisted and otherwise dropped; nothing is queued.

use artspace_types::chat::{ChatMessage, MessageId, Page, UserId};
use artspace_types::config::ChatConfig;
use artspace_types::error::ChatError;
use artspace_types::event::ChatEvent;
use artspace_types::identity::SecurityContext;
use tokio::sync::mpsc;
use tracing::debug;

use crate::chat::repository::MessageStore;
use crate::chat::service::ChatService;
use crate::identity::resolve_user_id;
use crate::presence::{ConnectionId, PresenceInfo, PresenceRegistry};

/// The invoking side of a hub operation.
#[derive(Debug, Clone)]
pub struct HubCaller {
    /// Verified claims of the caller.
    pub context: SecurityContext,
    /// The realtime connection the call arrived on (`None` for REST calls).
    pub connection_id: Option<ConnectionId>,
}

impl HubCaller {
    /// A caller without a realtime connection.
    pub fn detached(context: SecurityContext) -> Self {
        Self {
            context,
            connection_id: None,
        }
    }

    /// The caller's user id, or `Unauthenticated`.
    pub fn user_id(&self) -> Result<UserId, ChatError> {
        resolve_user_id(&self.context)
    }
}

/// A registered realtime connection.
///
/// `events` yields every push addressed to this connection until
/// [`ChatHub::disconnect`] is called.
pub struct HubConnection {
    pub caller: HubCaller,
    pub user_id: UserId,
    pub connection_id: ConnectionId,
    pub events: mpsc::UnboundedReceiver<ChatEvent>,
}

/// Gateway operations over a message store and the presence registry.
pub struct ChatHub<S: MessageStore> {
    service: ChatService<S>,
    presence: PresenceRegistry,
    limits: ChatConfig,
}

impl<S: MessageStore> ChatHub<S> {
    pub fn new(service: ChatService<S>, presence: PresenceRegistry, limits: ChatConfig) -> Self {
        Self {
            service,
            presence,
            limits,
        }
    }

    pub fn service(&self) -> &ChatService<S> {
        &self.service
    }

    pub fn presence(&self) -> &PresenceRegistry {
        &self.presence
    }

    // --- Connection lifecycle ---

    /// Register an authenticated connection (Connected state).
    pub fn connect(&self, context: SecurityContext) -> Result<HubConnection, ChatError> {
        let user_id = resolve_user_id(&context)?;
        let (connection_id, events) = self.presence.connect(user_id);
        tracing::info!(%user_id, %connection_id, "Chat connection opened");

        Ok(HubConnection {
            caller: HubCaller {
                context,
                connection_id: Some(connection_id),
            },
            user_id,
            connection_id,
            events,
        })
    }

    /// Remove a connection from routing (Disconnected state).
    pub fn disconnect(&self, user_id: UserId, connection_id: ConnectionId) {
        self.presence.disconnect(user_id, connection_id);
        tracing::info!(%user_id, %connection_id, "Chat connection closed");
    }

    // --- Invocations ---

    /// Persist a message and push it to the receiver's live connections.
    ///
    /// The calling connection (if any) is acknowledged with `MessageSent`;
    /// the caller's other connections are not.
    pub async fn send_message(
        &self,
        caller: &HubCaller,
        receiver_id: UserId,
        body: &str,
    ) -> Result<ChatMessage, ChatError> {
        let sender_id = caller.user_id()?;
        self.validate_body(body)?;

        let message = self.service.send_message(sender_id, receiver_id, body).await?;

        let delivered = self.presence.send_to_user(
            receiver_id,
            &ChatEvent::ReceiveMessage {
                message: message.clone(),
            },
        );
        if let Some(connection_id) = caller.connection_id {
            self.presence.send_to_connection(
                connection_id,
                ChatEvent::MessageSent {
                    message: message.clone(),
                },
            );
        }

        debug!(
            message_id = %message.id,
            %receiver_id,
            delivered,
            "Chat message pushed"
        );
        Ok(message)
    }

    /// Mark a message read; the original sender is notified on the first
    /// unread-to-read transition only.
    pub async fn mark_as_read(
        &self,
        caller: &HubCaller,
        message_id: MessageId,
    ) -> Result<ChatMessage, ChatError> {
        let reader_id = caller.user_id()?;
        let outcome = self.service.mark_as_read(message_id, reader_id).await?;

        if outcome.newly_read {
            if let Some(read_at) = outcome.message.read_at {
                self.presence.send_to_user(
                    outcome.message.sender_id,
                    &ChatEvent::MessageRead {
                        message_id,
                        reader_id,
                        read_at,
                    },
                );
            }
        }

        Ok(outcome.message)
    }

    /// Page of the caller's conversation with `other_user_id`, oldest first.
    ///
    /// `skip` defaults to 0 and `take` to the configured page size.
    pub async fn get_chat_history(
        &self,
        caller: &HubCaller,
        other_user_id: UserId,
        skip: Option<i64>,
        take: Option<i64>,
    ) -> Result<Vec<ChatMessage>, ChatError> {
        let user_id = caller.user_id()?;
        let page = self.page(skip, take)?;
        Ok(self
            .service
            .get_chat_history(user_id, other_user_id, page)
            .await?)
    }

    /// Number of unread messages addressed to the caller.
    pub async fn unread_count(&self, caller: &HubCaller) -> Result<u64, ChatError> {
        let user_id = caller.user_id()?;
        Ok(self.service.unread_count(user_id).await?)
    }

    /// Presence snapshot of any user. Requires an authenticated caller.
    pub fn presence_of(&self, caller: &HubCaller, user_id: UserId) -> Result<PresenceInfo, ChatError> {
        caller.user_id()?;
        Ok(self.presence.presence(user_id))
    }

    // --- Validation ---

    fn validate_body(&self, body: &str) -> Result<(), ChatError> {
        if body.trim().is_empty() {
            return Err(ChatError::BadRequest("message must not be empty".to_string()));
        }
        let len = body.chars().count();
        if len > self.limits.max_message_length {
            return Err(ChatError::BadRequest(format!(
                "message is {len} characters, maximum is {}",
                self.limits.max_message_length
            )));
        }
        Ok(())
    }

    fn page(&self, skip: Option<i64>, take: Option<i64>) -> Result<Page, ChatError> {
        let skip = skip.unwrap_or(0);
        let take = take.unwrap_or(i64::from(self.limits.default_page_size));

        if skip < 0 {
            return Err(ChatError::BadRequest(format!("skip must be >= 0, got {skip}")));
        }
        let max = i64::from(self.limits.max_page_size);
        if take < 1 || take > max {
            return Err(ChatError::BadRequest(format!(
                "take must be between 1 and {max}, got {take}"
            )));
        }

        let skip = u32::try_from(skip)
            .map_err(|_| ChatError::BadRequest(format!("skip is too large: {skip}")))?;
        Ok(Page::new(skip, take as u32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::memory::InMemoryMessageStore;
    use artspace_types::identity::NAME_IDENTIFIER_CLAIM;

    fn hub() -> ChatHub<InMemoryMessageStore> {
        ChatHub::new(
            ChatService::new(InMemoryMessageStore::new()),
            PresenceRegistry::new(),
            ChatConfig::default(),
        )
    }

    fn context(user: i64) -> SecurityContext {
        SecurityContext::anonymous().with_claim(NAME_IDENTIFIER_CLAIM, user.to_string())
    }

    #[tokio::test]
    async fn send_pushes_to_receiver_and_acks_calling_connection_only() {
        let hub = hub();
        let mut alice = hub.connect(context(1)).unwrap();
        let mut alice_other_tab = hub.connect(context(1)).unwrap();
        let mut bob = hub.connect(context(2)).unwrap();

        let sent = hub
            .send_message(&alice.caller, UserId(2), "hello")
            .await
            .unwrap();

        assert_eq!(
            bob.events.recv().await.unwrap(),
            ChatEvent::ReceiveMessage {
                message: sent.clone()
            }
        );
        assert_eq!(
            alice.events.recv().await.unwrap(),
            ChatEvent::MessageSent { message: sent }
        );
        assert!(alice_other_tab.events.try_recv().is_err());
    }

    #[tokio::test]
    async fn send_to_offline_receiver_still_persists() {
        let hub = hub();
        let alice = hub.connect(context(1)).unwrap();

        let sent = hub
            .send_message(&alice.caller, UserId(2), "are you there?")
            .await
            .unwrap();

        let history = hub
            .get_chat_history(&HubCaller::detached(context(2)), UserId(1), None, None)
            .await
            .unwrap();
        assert_eq!(history, vec![sent]);
    }

    #[tokio::test]
    async fn unauthenticated_caller_is_rejected_before_persisting() {
        let hub = hub();
        let anonymous = HubCaller::detached(SecurityContext::anonymous());

        let err = hub.send_message(&anonymous, UserId(2), "hi").await.unwrap_err();
        assert!(matches!(err, ChatError::Unauthenticated(_)));
        assert_eq!(hub.service().unread_count(UserId(2)).await.unwrap(), 0);

        assert!(hub.connect(SecurityContext::anonymous()).is_err());
    }

    #[tokio::test]
    async fn end_to_end_send_read_history() {
        let hub = hub();
        let alice = HubCaller::detached(context(1));
        let mut bob = hub.connect(context(2)).unwrap();
        let mut alice_conn = hub.connect(context(1)).unwrap();

        let sent = hub.send_message(&alice, UserId(2), "hello").await.unwrap();
        assert_eq!(sent.sender_id, UserId(1));
        assert_eq!(sent.receiver_id, UserId(2));
        assert_eq!(sent.body, "hello");
        assert!(sent.read_at.is_none());
        let _ = bob.events.recv().await.unwrap();

        let read = hub.mark_as_read(&bob.caller, sent.id).await.unwrap();
        assert!(read.read_at.is_some());

        match alice_conn.events.recv().await.unwrap() {
            ChatEvent::MessageRead {
                message_id,
                reader_id,
                ..
            } => {
                assert_eq!(message_id, sent.id);
                assert_eq!(reader_id, UserId(2));
            }
            other => panic!("expected MessageRead, got {other:?}"),
        }

        // Second read is a no-op: no further notification.
        hub.mark_as_read(&bob.caller, sent.id).await.unwrap();
        assert!(alice_conn.events.try_recv().is_err());

        let history = hub
            .get_chat_history(&alice, UserId(2), Some(0), Some(50))
            .await
            .unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id, sent.id);
        assert!(history[0].read_at.is_some());
    }

    #[tokio::test]
    async fn mark_as_read_by_sender_is_forbidden() {
        let hub = hub();
        let alice = HubCaller::detached(context(1));
        let sent = hub.send_message(&alice, UserId(2), "hello").await.unwrap();

        let err = hub.mark_as_read(&alice, sent.id).await.unwrap_err();
        assert!(matches!(err, ChatError::Forbidden(_)));

        let err = hub.mark_as_read(&alice, MessageId(404)).await.unwrap_err();
        assert!(matches!(err, ChatError::NotFound(_)));
    }

    #[tokio::test]
    async fn self_messaging_is_permitted() {
        let hub = hub();
        let mut me = hub.connect(context(7)).unwrap();

        let sent = hub.send_message(&me.caller, UserId(7), "note to self").await.unwrap();
        assert_eq!(sent.sender_id, sent.receiver_id);

        let first = me.events.recv().await.unwrap();
        let second = me.events.recv().await.unwrap();
        assert!(matches!(first, ChatEvent::ReceiveMessage { .. }));
        assert!(matches!(second, ChatEvent::MessageSent { .. }));
    }

    #[tokio::test]
    async fn invalid_bodies_and_pages_are_bad_requests() {
        let hub = hub();
        let alice = HubCaller::detached(context(1));

        let err = hub.send_message(&alice, UserId(2), "   ").await.unwrap_err();
        assert!(matches!(err, ChatError::BadRequest(_)));

        let long = "x".repeat(ChatConfig::default().max_message_length + 1);
        let err = hub.send_message(&alice, UserId(2), &long).await.unwrap_err();
        assert!(matches!(err, ChatError::BadRequest(_)));

        for (skip, take) in [(Some(-1), None), (None, Some(0)), (None, Some(10_000))] {
            let err = hub
                .get_chat_history(&alice, UserId(2), skip, take)
                .await
                .unwrap_err();
            assert!(matches!(err, ChatError::BadRequest(_)));
        }
    }

    #[tokio::test]
    async fn disconnect_stops_delivery() {
        let hub = hub();
        let alice = HubCaller::detached(context(1));
        let bob = hub.connect(context(2)).unwrap();
        hub.disconnect(bob.user_id, bob.connection_id);

        assert!(!hub.presence().is_online(UserId(2)));
        hub.send_message(&alice, UserId(2), "gone?").await.unwrap();
        assert_eq!(hub.unread_count(&HubCaller::detached(context(2))).await.unwrap(), 1);
    }
}
