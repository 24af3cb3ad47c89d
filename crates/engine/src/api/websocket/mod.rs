//! WebSocket handling for game clients.
//!
//! Each connection owns a [`Session`]. Incoming frames are turned into
//! session effects, and the effects are carried out here.

use std::{sync::Arc, time::Duration};

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use farmstead_domain::UserId;
use farmstead_shared::{ClientMessage, ErrorCode, ServerMessage};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use uuid::Uuid;

mod ws_actions;
mod ws_map;

pub mod error_sanitizer;

use super::connections::ConnectionManager;
use super::http::Caller;
use super::session::{Session, SessionEffect};
use crate::app::App;

/// Buffer size for per-connection message channel.
const CONNECTION_CHANNEL_BUFFER: usize = 256;

/// How long queued frames get to flush after the read loop ends.
const SEND_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Combined state for WebSocket handlers.
pub struct WsState {
    pub app: Arc<App>,
    pub connections: Arc<ConnectionManager>,
}

/// Per-connection handler context.
pub(crate) struct ConnectionContext {
    pub connection_id: Uuid,
    pub sender: mpsc::Sender<ServerMessage>,
    pub session: Session,
}

impl ConnectionContext {
    fn send(&self, message: ServerMessage) {
        if self.sender.try_send(message).is_err() {
            tracing::warn!(
                connection_id = %self.connection_id,
                "Failed to send response, channel full or closed"
            );
        }
    }
}

/// WebSocket upgrade handler - entry point for new connections.
///
/// `Caller` is extracted before the upgrade, so a request without a valid
/// `X-User-Id` is refused with 400 and never reaches the socket loop.
pub async fn ws_handler(
    Caller(user_id): Caller,
    State(state): State<Arc<WsState>>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state, user_id))
}

/// Handle an individual WebSocket connection.
async fn handle_socket(socket: WebSocket, state: Arc<WsState>, user_id: UserId) {
    let (mut ws_sender, mut ws_receiver) = socket.split();

    let connection_id = Uuid::new_v4();
    let (tx, mut rx) = mpsc::channel::<ServerMessage>(CONNECTION_CHANNEL_BUFFER);

    state
        .connections
        .register(connection_id, user_id, tx.clone())
        .await;

    tracing::info!(
        connection_id = %connection_id,
        user_id = %user_id,
        "WebSocket connection established"
    );

    // Forward messages from the channel to the WebSocket
    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if let Ok(json) = serde_json::to_string(&msg) {
                if ws_sender.send(Message::Text(json.into())).await.is_err() {
                    return;
                }
            }
        }
        let _ = ws_sender.send(Message::Close(None)).await;
    });

    let mut ctx = ConnectionContext {
        connection_id,
        sender: tx,
        session: Session::new(),
    };

    while let Some(result) = ws_receiver.next().await {
        match result {
            Ok(Message::Text(text)) => {
                let effects = match serde_json::from_str::<ClientMessage>(text.as_str()) {
                    Ok(msg) => handle_message(msg, &state, &mut ctx).await,
                    Err(e) => {
                        tracing::warn!(connection_id = %connection_id, error = %e, "Failed to parse message");
                        vec![SessionEffect::Emit(ServerMessage::error(
                            ErrorCode::BadRequest,
                            format!("Invalid message format: {}", e),
                        ))]
                    }
                };
                if !apply_effects(effects, &state, &ctx).await {
                    tracing::info!(connection_id = %connection_id, "Closing connection");
                    break;
                }
            }
            Ok(Message::Close(_)) => {
                tracing::info!(connection_id = %connection_id, "WebSocket closed by client");
                break;
            }
            Err(e) => {
                tracing::error!(connection_id = %connection_id, error = %e, "WebSocket error");
                break;
            }
            _ => {}
        }
    }

    // Clean up
    let effects = ctx.session.on_disconnect();
    apply_effects(effects, &state, &ctx).await;
    state.connections.unregister(connection_id).await;
    drop(ctx);

    if tokio::time::timeout(SEND_DRAIN_TIMEOUT, &mut send_task)
        .await
        .is_err()
    {
        send_task.abort();
    }

    tracing::info!(connection_id = %connection_id, "WebSocket connection terminated");
}

/// Dispatch a parsed client message to the appropriate handler.
async fn handle_message(
    msg: ClientMessage,
    state: &WsState,
    ctx: &mut ConnectionContext,
) -> Vec<SessionEffect> {
    if let Some((action, coords)) = msg.tile_action() {
        return ws_actions::handle_tile_action(state, ctx, action, coords).await;
    }

    match msg {
        ClientMessage::RequestInitialMap { map_id } => {
            tracing::info!(
                connection_id = %ctx.connection_id,
                map_id = %map_id,
                "Initial map requested"
            );
            ws_map::handle_request_initial_map(state, ctx, map_id).await
        }
        ClientMessage::RequestAllMapData => ws_map::handle_request_all_map_data(state, ctx).await,
        ClientMessage::GameStart => vec![SessionEffect::Emit(ServerMessage::GameStartAck)],
        _ => {
            tracing::debug!(connection_id = %ctx.connection_id, "Unknown event ignored");
            vec![SessionEffect::Emit(ServerMessage::error(
                ErrorCode::BadRequest,
                error_sanitizer::messages::UNKNOWN_EVENT,
            ))]
        }
    }
}

/// Carry out session effects in order. Returns `false` once the connection
/// must be closed.
async fn apply_effects(
    effects: Vec<SessionEffect>,
    state: &WsState,
    ctx: &ConnectionContext,
) -> bool {
    let mut keep_open = true;
    for effect in effects {
        match effect {
            SessionEffect::Emit(message) => ctx.send(message),
            SessionEffect::JoinRoom(room) => {
                state.connections.join_room(ctx.connection_id, &room).await;
            }
            SessionEffect::LeaveRoom(room) => {
                state.connections.leave_room(ctx.connection_id, &room).await;
            }
            SessionEffect::AttachListeners { generation } => {
                tracing::debug!(connection_id = %ctx.connection_id, generation, "Action listeners attached");
            }
            SessionEffect::DetachListeners { generation } => {
                tracing::debug!(connection_id = %ctx.connection_id, generation, "Action listeners detached");
            }
            SessionEffect::Disconnect => keep_open = false,
            SessionEffect::AppendDisconnectLog(character_id) => {
                let status = state.app.use_cases.status.clone();
                tokio::spawn(async move { status.record_disconnect(character_id).await });
            }
        }
    }
    keep_open
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::test_app::memory_app;
    use crate::test_fixtures::{seed_character, seed_map, seed_user, MemoryStores};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::routing::get;
    use axum::Router;
    use farmstead_domain::{CropType, Tile, TileCoord, TileType};
    use tower::ServiceExt;

    struct Harness {
        state: WsState,
        stores: MemoryStores,
    }

    fn harness() -> Harness {
        let stores = MemoryStores::default();
        let (app, _clock) = memory_app(&stores);
        Harness {
            state: WsState {
                app,
                connections: Arc::new(ConnectionManager::new()),
            },
            stores,
        }
    }

    async fn connect(
        h: &Harness,
        user_id: UserId,
    ) -> (ConnectionContext, mpsc::Receiver<ServerMessage>) {
        let (tx, rx) = mpsc::channel(32);
        let connection_id = Uuid::new_v4();
        h.state
            .connections
            .register(connection_id, user_id, tx.clone())
            .await;
        let ctx = ConnectionContext {
            connection_id,
            sender: tx,
            session: Session::new(),
        };
        (ctx, rx)
    }

    async fn send(h: &Harness, ctx: &mut ConnectionContext, msg: ClientMessage) -> bool {
        let effects = handle_message(msg, &h.state, ctx).await;
        apply_effects(effects, &h.state, ctx).await
    }

    fn upgrade_request(user: Option<&str>) -> Request<Body> {
        let mut request = Request::builder()
            .method("GET")
            .uri("/ws")
            .header("connection", "upgrade")
            .header("upgrade", "websocket")
            .header("sec-websocket-version", "13")
            .header("sec-websocket-key", "dGhlIHNhbXBsZSBub25jZQ==");
        if let Some(user) = user {
            request = request.header("X-User-Id", user);
        }
        request.body(Body::empty()).unwrap()
    }

    fn drain(rx: &mut mpsc::Receiver<ServerMessage>) -> Vec<ServerMessage> {
        let mut out = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            out.push(msg);
        }
        out
    }

    #[tokio::test]
    async fn binding_sends_initial_map_and_joins_room() {
        let h = harness();
        let created = seed_character(&h.stores, "ada").await;
        let map = seed_map(&h.stores, created.character.id, &[]).await;
        let (mut ctx, mut rx) = connect(&h, created.link.user_id).await;

        let open = send(
            &h,
            &mut ctx,
            ClientMessage::RequestInitialMap {
                map_id: map.id.to_uuid(),
            },
        )
        .await;

        assert!(open);
        let frames = drain(&mut rx);
        assert!(matches!(
            frames.as_slice(),
            [ServerMessage::InitialMapData { map_nickname, .. }] if map_nickname == "Test Farm"
        ));
        assert_eq!(
            h.state.connections.room_size(&super::super::session::map_room(map.id)),
            1
        );
    }

    #[tokio::test]
    async fn unknown_map_errors_and_disconnects() {
        let h = harness();
        let user = seed_user(&h.stores, "ada").await;
        let (mut ctx, mut rx) = connect(&h, user.id).await;

        let open = send(
            &h,
            &mut ctx,
            ClientMessage::RequestInitialMap {
                map_id: Uuid::new_v4(),
            },
        )
        .await;

        assert!(!open);
        assert!(matches!(
            drain(&mut rx).as_slice(),
            [ServerMessage::Error { code: ErrorCode::NotFound, .. }]
        ));
        assert!(ctx.session.is_closed());
    }

    #[tokio::test]
    async fn action_before_binding_is_rejected_but_connection_stays() {
        let h = harness();
        let user = seed_user(&h.stores, "ada").await;
        let (mut ctx, mut rx) = connect(&h, user.id).await;

        let open = send(
            &h,
            &mut ctx,
            ClientMessage::HarvestCrop {
                tiles: vec![TileCoord::new(1, 1)],
            },
        )
        .await;

        assert!(open);
        assert!(matches!(
            drain(&mut rx).as_slice(),
            [ServerMessage::Error { code: ErrorCode::BadRequest, .. }]
        ));
    }

    #[tokio::test]
    async fn planting_broadcasts_to_room_and_reports_to_requester() {
        let h = harness();
        let created = seed_character(&h.stores, "ada").await;
        let map = seed_map(&h.stores, created.character.id, &[]).await;
        let request = ClientMessage::RequestInitialMap {
            map_id: map.id.to_uuid(),
        };

        let watcher_user = seed_user(&h.stores, "bea").await;
        let (mut player, mut player_rx) = connect(&h, created.link.user_id).await;
        let (mut watcher, mut watcher_rx) = connect(&h, watcher_user.id).await;
        send(&h, &mut player, request.clone()).await;
        send(&h, &mut watcher, request).await;
        drain(&mut player_rx);
        drain(&mut watcher_rx);

        send(
            &h,
            &mut player,
            ClientMessage::PlantCrop {
                tiles: vec![TileCoord::new(1, 1), TileCoord::new(2, 1)],
                crop_type: CropType::Carrot,
            },
        )
        .await;

        let watcher_frames = drain(&mut watcher_rx);
        assert!(matches!(
            watcher_frames.as_slice(),
            [ServerMessage::TilesUpdated { action, tiles }]
                if action == "plant_crop" && tiles.len() == 2
        ));

        let player_frames = drain(&mut player_rx);
        assert_eq!(player_frames.len(), 2);
        assert!(matches!(
            &player_frames[1],
            ServerMessage::ActionResult { updated_tile_count: 2, charged_cost: 0, .. }
        ));
    }

    #[tokio::test]
    async fn rebinding_moves_the_connection_between_rooms() {
        let h = harness();
        let created = seed_character(&h.stores, "ada").await;
        let first = seed_map(&h.stores, created.character.id, &[]).await;
        let second = seed_map(
            &h.stores,
            created.character.id,
            &[(TileCoord::new(0, 0), Tile::new(TileType::Rubble))],
        )
        .await;
        let (mut ctx, _rx) = connect(&h, created.link.user_id).await;

        for map in [&first, &second] {
            send(
                &h,
                &mut ctx,
                ClientMessage::RequestInitialMap {
                    map_id: map.id.to_uuid(),
                },
            )
            .await;
        }

        let rooms = &h.state.connections;
        assert_eq!(rooms.room_size(&super::super::session::map_room(first.id)), 0);
        assert_eq!(rooms.room_size(&super::super::session::map_room(second.id)), 1);
    }

    #[tokio::test]
    async fn game_start_is_acknowledged() {
        let h = harness();
        let user = seed_user(&h.stores, "ada").await;
        let (mut ctx, mut rx) = connect(&h, user.id).await;
        send(&h, &mut ctx, ClientMessage::GameStart).await;
        assert_eq!(drain(&mut rx), vec![ServerMessage::GameStartAck]);
    }

    #[tokio::test]
    async fn upgrade_without_user_is_refused() {
        let h = harness();
        let created = seed_character(&h.stores, "ada").await;
        let state = Arc::new(WsState {
            app: h.state.app.clone(),
            connections: h.state.connections.clone(),
        });

        for user in [None, Some("not-a-uuid")] {
            let router = Router::new()
                .route("/ws", get(ws_handler))
                .with_state(state.clone());
            let response = router.oneshot(upgrade_request(user)).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);

            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
            assert_eq!(body["code"], "bad_request");
            assert_eq!(body["message"], error_sanitizer::messages::MISSING_USER);
        }

        assert_eq!(h.stores.wallets.balance(created.wallet.id), Some(100));
    }
}
