//! WebSocket handler for the realtime chat hub.
//!
//! The `/hub/chat` endpoint upgrades an authenticated HTTP connection to a
//! WebSocket. The access token is checked before the upgrade; a missing or
//! invalid token is rejected with 401. Once connected, the handler:
//!
//! - **Forwards pushes:** drains the connection's channel in the presence
//!   registry (`receive_message`, `message_sent`, `message_read`) and writes
//!   each event as a JSON text frame.
//! - **Receives invocations:** parses incoming text frames as [`HubInvocation`],
//!   runs them against the [`ChatHub`] and replies with a single frame that
//!   echoes the client's `invocation_id`.
//!
//! Closing the socket removes the connection from the registry. Messages
//! sent while a user has no live connection are not replayed on reconnect;
//! clients fetch history instead.

use std::fmt;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use serde::{Deserialize, Serialize};

use artspace_core::chat::hub::{ChatHub, HubCaller, HubConnection};
use artspace_core::chat::repository::MessageStore;
use artspace_types::chat::{MessageId, UserId};
use artspace_types::error::ChatError;
use artspace_types::event::ChatEvent;

use crate::http::extractors::auth::Caller;
use crate::state::AppState;

/// Hub operation requested by a client.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum HubCommand {
    SendMessage {
        receiver_id: i64,
        message: String,
    },
    MarkAsRead {
        message_id: i64,
    },
    GetChatHistory {
        other_user_id: i64,
        #[serde(default)]
        skip: Option<i64>,
        #[serde(default)]
        take: Option<i64>,
    },
    /// Keep-alive ping. Server responds with `{"type":"pong"}`.
    Ping,
}

/// Incoming text frame: a command plus an optional correlation id.
#[derive(Debug, Deserialize)]
struct HubInvocation {
    #[serde(default)]
    invocation_id: Option<String>,
    #[serde(flatten)]
    command: HubCommand,
}

/// Outgoing text frame. Pushes carry no `invocation_id`.
#[derive(Debug, Serialize)]
struct ServerFrame {
    #[serde(skip_serializing_if = "Option::is_none")]
    invocation_id: Option<String>,
    #[serde(flatten)]
    event: ChatEvent,
}

impl ServerFrame {
    fn push(event: ChatEvent) -> Self {
        Self {
            invocation_id: None,
            event,
        }
    }
}

/// Upgrade an authenticated HTTP request to a hub connection.
///
/// Mounted at `/hub/chat`. The caller is extracted before the upgrade so
/// that a bad token is answered with 401 rather than an upgrade failure.
pub async fn hub_handler(
    caller: Caller,
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_hub_connection(socket, state, caller))
}

async fn handle_hub_connection(socket: WebSocket, state: AppState, caller: Caller) {
    let hub = state.chat_hub.clone();

    let connection = match hub.connect(caller.hub.context) {
        Ok(conn) => conn,
        Err(err) => {
            tracing::warn!(error = %err, "Rejecting hub connection");
            return;
        }
    };

    let (ws_sender, ws_receiver) = socket.split();
    serve_connection(hub.as_ref(), connection, ws_sender, ws_receiver).await;
}

/// Core hub connection loop.
///
/// Uses `tokio::select!` to multiplex between pushes from the presence
/// registry and incoming invocations, keeping both halves in one task so
/// replies and pushes are written in a single order. Returns once the client
/// closes or the registry drops the connection, after unregistering it.
async fn serve_connection<S, Tx, Rx, E>(
    hub: &ChatHub<S>,
    connection: HubConnection,
    mut ws_sender: Tx,
    mut ws_receiver: Rx,
) where
    S: MessageStore,
    Tx: Sink<Message> + Unpin,
    Tx::Error: fmt::Display,
    Rx: Stream<Item = Result<Message, E>> + Unpin,
    E: fmt::Display,
{
    let HubConnection {
        caller,
        user_id,
        connection_id,
        mut events,
    } = connection;

    loop {
        tokio::select! {
            // --- Branch 1: Forward registry pushes to the client ---
            pushed = events.recv() => {
                let Some(event) = pushed else {
                    // Registry dropped this connection
                    break;
                };
                if send_frame(&mut ws_sender, &ServerFrame::push(event)).await.is_err() {
                    break;
                }
            }

            // --- Branch 2: Run invocations from the client ---
            msg_result = ws_receiver.next() => {
                match msg_result {
                    Some(Ok(Message::Text(text))) => {
                        let reply = dispatch(hub, &caller, &text).await;
                        if send_frame(&mut ws_sender, &reply).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        break;
                    }
                    Some(Err(err)) => {
                        tracing::debug!(%connection_id, "WebSocket receive error: {err}");
                        break;
                    }
                    // Ignore binary, ping, pong protocol frames (handled by axum/tungstenite)
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    hub.disconnect(user_id, connection_id);
}

async fn send_frame<Tx>(ws_sender: &mut Tx, frame: &ServerFrame) -> Result<(), ()>
where
    Tx: Sink<Message> + Unpin,
    Tx::Error: fmt::Display,
{
    let json = match serde_json::to_string(frame) {
        Ok(json) => json,
        Err(err) => {
            tracing::warn!("Failed to serialize hub frame: {err}");
            return Ok(());
        }
    };
    ws_sender.send(Message::Text(json.into())).await.map_err(|err| {
        tracing::debug!("Failed to write hub frame (client disconnecting): {err}");
    })
}

/// Parse and run a single invocation, producing its reply frame.
///
/// Malformed frames and failed operations produce an `error` frame; the
/// connection stays open.
async fn dispatch<S: MessageStore>(
    hub: &ChatHub<S>,
    caller: &HubCaller,
    text: &str,
) -> ServerFrame {
    let invocation: HubInvocation = match serde_json::from_str(text) {
        Ok(inv) => inv,
        Err(err) => {
            tracing::warn!(error = %err, "Rejecting malformed hub invocation");
            return ServerFrame {
                invocation_id: salvage_invocation_id(text),
                event: error_event(&ChatError::BadRequest(format!(
                    "malformed invocation: {err}"
                ))),
            };
        }
    };

    let result = match invocation.command {
        HubCommand::SendMessage {
            receiver_id,
            message,
        } => hub
            .send_message(caller, UserId(receiver_id), &message)
            .await
            .map(|_| ChatEvent::Ack),
        HubCommand::MarkAsRead { message_id } => hub
            .mark_as_read(caller, MessageId(message_id))
            .await
            .map(|_| ChatEvent::Ack),
        HubCommand::GetChatHistory {
            other_user_id,
            skip,
            take,
        } => hub
            .get_chat_history(caller, UserId(other_user_id), skip, take)
            .await
            .map(|messages| ChatEvent::ChatHistory { messages }),
        HubCommand::Ping => Ok(ChatEvent::Pong),
    };

    let event = result.unwrap_or_else(|err| {
        tracing::debug!(error = %err, "Hub invocation failed");
        error_event(&err)
    });

    ServerFrame {
        invocation_id: invocation.invocation_id,
        event,
    }
}

/// Recover the correlation id from a frame that is valid JSON but not a
/// valid invocation.
fn salvage_invocation_id(text: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(text).ok()?;
    value
        .get("invocation_id")
        .and_then(serde_json::Value::as_str)
        .map(str::to_string)
}

fn error_event(err: &ChatError) -> ChatEvent {
    ChatEvent::Error {
        code: err.code().to_string(),
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use artspace_core::chat::memory::InMemoryMessageStore;
    use artspace_core::chat::service::ChatService;
    use artspace_core::presence::{ConnectionId, PresenceRegistry};
    use artspace_types::config::ChatConfig;
    use artspace_types::identity::{NAME_IDENTIFIER_CLAIM, SecurityContext};

    fn hub() -> ChatHub<InMemoryMessageStore> {
        ChatHub::new(
            ChatService::new(InMemoryMessageStore::new()),
            PresenceRegistry::new(),
            ChatConfig::default(),
        )
    }

    fn caller(user: i64) -> HubCaller {
        HubCaller::detached(
            SecurityContext::anonymous().with_claim(NAME_IDENTIFIER_CLAIM, user.to_string()),
        )
    }

    fn to_json(frame: &ServerFrame) -> serde_json::Value {
        serde_json::to_value(frame).unwrap()
    }

    #[tokio::test]
    async fn send_invocation_acks_with_invocation_id() {
        let hub = hub();
        let mut bob = hub
            .connect(SecurityContext::anonymous().with_claim(NAME_IDENTIFIER_CLAIM, "2"))
            .unwrap();

        let frame = dispatch(
            &hub,
            &caller(1),
            r#"{"type":"send_message","receiver_id":2,"message":"hello","invocation_id":"42"}"#,
        )
        .await;

        let json = to_json(&frame);
        assert_eq!(json["type"], "ack");
        assert_eq!(json["invocation_id"], "42");

        let pushed = to_json(&ServerFrame::push(bob.events.recv().await.unwrap()));
        assert_eq!(pushed["type"], "receive_message");
        assert_eq!(pushed["message"]["body"], "hello");
        assert!(pushed.get("invocation_id").is_none());
    }

    #[tokio::test]
    async fn history_invocation_defaults_paging() {
        let hub = hub();
        dispatch(&hub, &caller(1), r#"{"type":"send_message","receiver_id":2,"message":"a"}"#).await;
        dispatch(&hub, &caller(2), r#"{"type":"send_message","receiver_id":1,"message":"b"}"#).await;

        let frame = dispatch(&hub, &caller(2), r#"{"type":"get_chat_history","other_user_id":1}"#).await;
        let json = to_json(&frame);
        assert_eq!(json["type"], "chat_history");
        let messages = json["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["body"], "a");
        assert_eq!(messages[1]["body"], "b");
    }

    #[tokio::test]
    async fn mark_as_read_errors_become_error_frames() {
        let hub = hub();
        let frame = dispatch(
            &hub,
            &caller(1),
            r#"{"type":"mark_as_read","message_id":77,"invocation_id":"x"}"#,
        )
        .await;

        let json = to_json(&frame);
        assert_eq!(json["type"], "error");
        assert_eq!(json["code"], "NOT_FOUND");
        assert_eq!(json["invocation_id"], "x");
    }

    #[tokio::test]
    async fn malformed_frames_are_bad_requests() {
        let hub = hub();
        for text in ["not json", r#"{"type":"explode"}"#, r#"{"type":"send_message"}"#] {
            let json = to_json(&dispatch(&hub, &caller(1), text).await);
            assert_eq!(json["type"], "error");
            assert_eq!(json["code"], "BAD_REQUEST");
        }
    }

    #[tokio::test]
    async fn invalid_invocation_keeps_its_invocation_id() {
        let hub = hub();
        let json = to_json(
            &dispatch(
                &hub,
                &caller(1),
                r#"{"type":"send_message","receiver_id":2,"invocation_id":"9"}"#,
            )
            .await,
        );
        assert_eq!(json["type"], "error");
        assert_eq!(json["code"], "BAD_REQUEST");
        assert_eq!(json["invocation_id"], "9");

        let json = to_json(&dispatch(&hub, &caller(1), r#"{"type":"explode","invocation_id":"10"}"#).await);
        assert_eq!(json["invocation_id"], "10");

        let json = to_json(&dispatch(&hub, &caller(1), "not json").await);
        assert!(json.get("invocation_id").is_none());
    }

    #[tokio::test]
    async fn ping_gets_pong() {
        let hub = hub();
        let json = to_json(&dispatch(&hub, &caller(1), r#"{"type":"ping"}"#).await);
        assert_eq!(json, serde_json::json!({"type": "pong"}));
    }

    #[tokio::test]
    async fn unauthenticated_caller_gets_error_frame() {
        let hub = hub();
        let anonymous = HubCaller::detached(SecurityContext::anonymous());
        let json = to_json(
            &dispatch(&hub, &anonymous, r#"{"type":"send_message","receiver_id":2,"message":"hi"}"#)
                .await,
        );
        assert_eq!(json["code"], "UNAUTHENTICATED");
    }
    type ClientSide = (
        futures::channel::mpsc::UnboundedSender<Result<Message, axum::Error>>,
        futures::channel::mpsc::UnboundedReceiver<Message>,
    );

    /// Run the connection loop for `user` on in-memory channels standing in
    /// for the socket halves.
    fn spawn_connection(
        hub: &Arc<ChatHub<InMemoryMessageStore>>,
        user: i64,
    ) -> (ClientSide, ConnectionId, tokio::task::JoinHandle<()>) {
        let context =
            SecurityContext::anonymous().with_claim(NAME_IDENTIFIER_CLAIM, user.to_string());
        let connection = hub.connect(context).unwrap();
        let connection_id = connection.connection_id;
        let (to_server, from_client) = futures::channel::mpsc::unbounded();
        let (to_client, from_server) = futures::channel::mpsc::unbounded();

        let hub = Arc::clone(hub);
        let task = tokio::spawn(async move {
            serve_connection(hub.as_ref(), connection, to_client, from_client).await;
        });
        ((to_server, from_server), connection_id, task)
    }

    fn text(json: &str) -> Result<Message, axum::Error> {
        Ok(Message::Text(json.to_string().into()))
    }

    async fn next_frame(
        from_server: &mut futures::channel::mpsc::UnboundedReceiver<Message>,
    ) -> serde_json::Value {
        let message = tokio::time::timeout(Duration::from_secs(5), from_server.next())
            .await
            .unwrap()
            .unwrap();
        match message {
            Message::Text(body) => serde_json::from_str(&body).unwrap(),
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[tokio::test]
    async fn connection_replies_and_forwards_pushes() {
        let hub = Arc::new(hub());
        let ((to_server, mut from_server), _, task) = spawn_connection(&hub, 1);
        assert!(hub.presence().is_online(UserId(1)));

        to_server
            .unbounded_send(text(r#"{"type":"ping","invocation_id":"p1"}"#))
            .unwrap();
        let pong = next_frame(&mut from_server).await;
        assert_eq!(pong["type"], "pong");
        assert_eq!(pong["invocation_id"], "p1");

        hub.send_message(&caller(2), UserId(1), "hi alice").await.unwrap();
        let pushed = next_frame(&mut from_server).await;
        assert_eq!(pushed["type"], "receive_message");
        assert_eq!(pushed["message"]["body"], "hi alice");
        assert!(pushed.get("invocation_id").is_none());

        to_server
            .unbounded_send(text(
                r#"{"type":"send_message","receiver_id":2,"message":"hi bob","invocation_id":"s1"}"#,
            ))
            .unwrap();
        let mut types = vec![
            next_frame(&mut from_server).await["type"].clone(),
            next_frame(&mut from_server).await["type"].clone(),
        ];
        types.sort_by_key(|t| t.to_string());
        assert_eq!(types, vec![serde_json::json!("ack"), serde_json::json!("message_sent")]);

        drop(to_server);
        tokio::time::timeout(Duration::from_secs(5), task).await.unwrap().unwrap();
        assert!(!hub.presence().is_online(UserId(1)));
    }

    #[tokio::test]
    async fn close_frame_unregisters_the_connection() {
        let hub = Arc::new(hub());
        let ((to_server, _from_server), _, task) = spawn_connection(&hub, 3);
        assert_eq!(hub.presence().connection_count(UserId(3)), 1);

        to_server.unbounded_send(Ok(Message::Close(None))).unwrap();
        tokio::time::timeout(Duration::from_secs(5), task).await.unwrap().unwrap();
        assert_eq!(hub.presence().connection_count(UserId(3)), 0);
    }

    #[tokio::test]
    async fn registry_disconnect_ends_the_loop() {
        let hub = Arc::new(hub());
        let ((_to_server, _from_server), connection_id, task) = spawn_connection(&hub, 4);

        hub.disconnect(UserId(4), connection_id);
        tokio::time::timeout(Duration::from_secs(5), task).await.unwrap().unwrap();
        assert!(!hub.presence().is_online(UserId(4)));
    }
}
