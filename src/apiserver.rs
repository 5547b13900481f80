use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use axum::{
    Json, Router,
    extract::{
        Path, Request, State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    http::{StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use crate::{
    director::{DirectorCommand, LiveState},
    error::ApiError,
    model::cue::{Cue, CueDraft},
    session::SessionStore,
    store::CueStore,
    sync::SyncChannel,
};

#[derive(Clone)]
struct ApiState {
    cue_store: CueStore,
    director_tx: mpsc::Sender<DirectorCommand>,
    sync: SyncChannel,
    sessions: SessionStore,
    admin_password: Arc<String>,
    connections: Arc<AtomicUsize>,
}

pub fn create_api_router(
    cue_store: CueStore,
    director_tx: mpsc::Sender<DirectorCommand>,
    sync: SyncChannel,
    sessions: SessionStore,
    admin_password: String,
) -> Router {
    let state = ApiState {
        cue_store,
        director_tx,
        sync,
        sessions,
        admin_password: Arc::new(admin_password),
        connections: Arc::new(AtomicUsize::new(0)),
    };

    // Writes and triggers sit behind the session check; reads, the audience
    // WebSocket and the auth endpoints themselves stay open.
    let protected = Router::new()
        .route("/api/cues", post(create_cue_handler))
        .route(
            "/api/cues/{cue_id}",
            put(update_cue_handler).delete(delete_cue_handler),
        )
        .route("/api/cues/trigger/{cue_id}", post(trigger_cue_handler))
        .route("/api/live", put(set_live_state_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ));

    let public = Router::new()
        .route("/api/cues", get(list_cues_handler))
        .route("/api/live", get(get_live_state_handler))
        .route("/api/login", post(login_handler))
        .route("/api/logout", post(logout_handler))
        .route("/api/verify", get(verify_handler))
        .route("/api/connections", get(connections_handler))
        .route("/ws/live", get(websocket_handler));

    Router::new()
        .merge(protected)
        .merge(public)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn bearer_token(request: &Request) -> Option<String> {
    let value = request
        .headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return None;
    }
    Some(token.to_string())
}

async fn require_session(
    State(state): State<ApiState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(&request).ok_or(ApiError::Unauthorized)?;
    if !state.sessions.verify(&token).await {
        return Err(ApiError::Unauthorized);
    }
    Ok(next.run(request).await)
}

// --- Authentication ---

#[derive(Deserialize)]
struct LoginPayload {
    password: String,
}

#[derive(Serialize)]
struct TokenBody {
    token: String,
}

async fn login_handler(
    State(state): State<ApiState>,
    Json(payload): Json<LoginPayload>,
) -> Result<Json<TokenBody>, ApiError> {
    if payload.password != *state.admin_password {
        return Err(ApiError::Unauthorized);
    }
    let token = state.sessions.issue().await;
    Ok(Json(TokenBody { token }))
}

#[derive(Serialize)]
struct VerifyBody {
    authenticated: bool,
}

async fn verify_handler(State(state): State<ApiState>, request: Request) -> Json<VerifyBody> {
    let authenticated = match bearer_token(&request) {
        Some(token) => state.sessions.verify(&token).await,
        None => false,
    };
    Json(VerifyBody { authenticated })
}

async fn logout_handler(State(state): State<ApiState>, request: Request) -> StatusCode {
    if let Some(token) = bearer_token(&request) {
        state.sessions.revoke(&token).await;
    }
    StatusCode::NO_CONTENT
}

// --- Cue CRUD ---

async fn list_cues_handler(State(state): State<ApiState>) -> Json<Vec<Cue>> {
    Json(state.cue_store.list_cues().await)
}

async fn create_cue_handler(
    State(state): State<ApiState>,
    Json(draft): Json<CueDraft>,
) -> Result<(StatusCode, Json<Cue>), ApiError> {
    let cue = state.cue_store.create_cue(draft).await?;
    Ok((StatusCode::CREATED, Json(cue)))
}

async fn update_cue_handler(
    State(state): State<ApiState>,
    Path(cue_id): Path<Uuid>,
    Json(draft): Json<CueDraft>,
) -> Result<Json<Cue>, ApiError> {
    let cue = state.cue_store.update_cue(cue_id, draft).await?;
    Ok(Json(cue))
}

async fn delete_cue_handler(
    State(state): State<ApiState>,
    Path(cue_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.cue_store.delete_cue(cue_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// --- Live state ---

async fn get_live_state_handler(State(state): State<ApiState>) -> Json<LiveState> {
    Json(state.sync.snapshot())
}

async fn set_live_state_handler(
    State(state): State<ApiState>,
    Json(live): Json<LiveState>,
) -> Result<StatusCode, ApiError> {
    let command = match live.active_cue_id {
        Some(cue_id) => DirectorCommand::Activate { cue_id },
        None => DirectorCommand::Deactivate,
    };
    state
        .director_tx
        .send(command)
        .await
        .map_err(|_| ApiError::ControlUnavailable)?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Serialize)]
struct TriggerBody {
    message: String,
}

async fn trigger_cue_handler(
    State(state): State<ApiState>,
    Path(cue_id): Path<Uuid>,
) -> Result<Json<TriggerBody>, ApiError> {
    state
        .director_tx
        .send(DirectorCommand::Activate { cue_id })
        .await
        .map_err(|_| ApiError::ControlUnavailable)?;
    Ok(Json(TriggerBody {
        message: format!("Cue {cue_id} triggered"),
    }))
}

// --- Audience WebSocket ---

#[derive(Serialize)]
struct ConnectionsBody {
    connections: usize,
}

async fn connections_handler(State(state): State<ApiState>) -> Json<ConnectionsBody> {
    Json(ConnectionsBody {
        connections: state.connections.load(Ordering::SeqCst),
    })
}

async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<ApiState>) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(mut socket: WebSocket, state: ApiState) {
    let active = state.connections.fetch_add(1, Ordering::SeqCst) + 1;
    log::info!("New viewer connected ({} active).", active);

    let mut state_rx = state.sync.watch();

    // Subscriptions begin from "now": push the current snapshot before
    // forwarding changes, so a reconnecting viewer is never stale.
    let snapshot = state_rx.borrow_and_update().clone();
    if send_live_state(&mut socket, &snapshot).await.is_err() {
        state.connections.fetch_sub(1, Ordering::SeqCst);
        return;
    }

    loop {
        tokio::select! {
            changed = state_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let new_state = state_rx.borrow_and_update().clone();
                if send_live_state(&mut socket, &new_state).await.is_err() {
                    log::info!("Viewer disconnected (send error).");
                    break;
                }
            }

            msg = socket.recv() => match msg {
                Some(Ok(Message::Close(_))) | None => {
                    log::info!("Viewer closed the connection.");
                    break;
                }
                // This channel is server-push only; anything else a client
                // sends just keeps the connection open.
                Some(Ok(_)) => {}
                Some(Err(_)) => break,
            },
        }
    }

    state.connections.fetch_sub(1, Ordering::SeqCst);
}

async fn send_live_state(socket: &mut WebSocket, live: &LiveState) -> Result<(), axum::Error> {
    let payload = serde_json::to_string(live).map_err(axum::Error::new)?;
    socket.send(Message::Text(payload.into())).await
}
