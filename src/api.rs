//! HTTP API endpoints.
//!
//! Clients poll `GET /api/sessions/{code}` for their view; every mutating
//! call answers with the caller's fresh view.

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;

use crate::error::{GameError, GameResult};
use crate::protocol::*;
use crate::state::AppState;
use crate::types::GameKind;

type Shared = State<Arc<AppState>>;

fn parse_game(raw: &str) -> GameResult<GameKind> {
    raw.parse().map_err(GameError::Validation)
}

/// Build the API router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/games/{game}", get(bootstrap))
        .route("/api/games/{game}/sessions", post(create_session))
        .route("/api/games/{game}/solo", get(deal_solo_hand))
        .route("/api/sessions/{code}", get(get_snapshot))
        .route("/api/sessions/{code}/join", post(join_session))
        .route("/api/sessions/{code}/leave", post(leave_session))
        .route("/api/sessions/{code}/start", post(start_game))
        .route("/api/sessions/{code}/card", post(submit_card))
        .route("/api/sessions/{code}/vote", post(submit_vote))
        .route("/api/sessions/{code}/winner", post(pick_winner))
        .route("/api/sessions/{code}/redaction", post(submit_redaction))
        .route("/api/sessions/{code}/guess", post(submit_guess))
        .route("/api/sessions/{code}/advance", post(advance_round))
        .route("/api/sessions/{code}/end", post(end_game))
        .with_state(state)
}

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub sessions: usize,
    pub quote_supply: String,
}

/// GET /healthz
pub async fn healthz(State(state): Shared) -> Json<Health> {
    Json(Health {
        status: "ok",
        sessions: state.sessions.len().await,
        quote_supply: state.quotes.name().to_string(),
    })
}

/// Game rules plus quote book readiness.
///
/// GET /api/games/{game}
pub async fn bootstrap(State(state): Shared, Path(game): Path<String>) -> GameResult<Json<GameInfo>> {
    let game = parse_game(&game)?;
    Ok(Json(state.bootstrap(game).await?))
}

/// Practice hand for the card game, no session needed.
///
/// GET /api/games/{game}/solo
pub async fn deal_solo_hand(State(state): Shared, Path(game): Path<String>) -> GameResult<Json<SoloHand>> {
    let game = parse_game(&game)?;
    Ok(Json(state.deal_solo_hand(game).await?))
}

/// POST /api/games/{game}/sessions
pub async fn create_session(
    State(state): Shared,
    Path(game): Path<String>,
    Json(request): Json<CreateSessionRequest>,
) -> GameResult<Json<SessionView>> {
    let game = parse_game(&game)?;
    Ok(Json(state.create_session(game, request).await?))
}

/// Viewer-relative snapshot; no `player_id` gives the spectator view.
///
/// GET /api/sessions/{code}?player_id=
pub async fn get_snapshot(
    State(state): Shared,
    Path(code): Path<String>,
    Query(query): Query<SnapshotQuery>,
) -> GameResult<Json<SessionView>> {
    let view = state.get_snapshot(&code, query.player_id.as_deref()).await?;
    Ok(Json(view))
}

/// Join, or reconnect with a previously issued `player_id`.
///
/// POST /api/sessions/{code}/join
pub async fn join_session(
    State(state): Shared,
    Path(code): Path<String>,
    Json(request): Json<JoinRequest>,
) -> GameResult<Json<SessionView>> {
    let view = state
        .join_session(&code, &request.player_name, request.player_id.as_deref())
        .await?;
    Ok(Json(view))
}

/// POST /api/sessions/{code}/leave
pub async fn leave_session(
    State(state): Shared,
    Path(code): Path<String>,
    Json(request): Json<PlayerRequest>,
) -> GameResult<Json<SessionView>> {
    Ok(Json(state.leave_session(&code, &request.player_id).await?))
}

/// POST /api/sessions/{code}/start
pub async fn start_game(
    State(state): Shared,
    Path(code): Path<String>,
    Json(request): Json<PlayerRequest>,
) -> GameResult<Json<SessionView>> {
    Ok(Json(state.start_game(&code, &request.player_id).await?))
}

/// POST /api/sessions/{code}/card
pub async fn submit_card(
    State(state): Shared,
    Path(code): Path<String>,
    Json(request): Json<CardRequest>,
) -> GameResult<Json<SessionView>> {
    let view = state
        .submit_card(&code, &request.player_id, request.card_index)
        .await?;
    Ok(Json(view))
}

/// POST /api/sessions/{code}/vote
pub async fn submit_vote(
    State(state): Shared,
    Path(code): Path<String>,
    Json(request): Json<EntryRequest>,
) -> GameResult<Json<SessionView>> {
    let view = state
        .submit_vote(&code, &request.player_id, &request.entry_id)
        .await?;
    Ok(Json(view))
}

/// POST /api/sessions/{code}/winner
pub async fn pick_winner(
    State(state): Shared,
    Path(code): Path<String>,
    Json(request): Json<EntryRequest>,
) -> GameResult<Json<SessionView>> {
    let view = state
        .pick_winner(&code, &request.player_id, &request.entry_id)
        .await?;
    Ok(Json(view))
}

/// POST /api/sessions/{code}/redaction
pub async fn submit_redaction(
    State(state): Shared,
    Path(code): Path<String>,
    Json(request): Json<RedactionRequest>,
) -> GameResult<Json<SessionView>> {
    let view = state
        .submit_redaction(&code, &request.player_id, request.indices)
        .await?;
    Ok(Json(view))
}

/// POST /api/sessions/{code}/guess
pub async fn submit_guess(
    State(state): Shared,
    Path(code): Path<String>,
    Json(request): Json<GuessRequest>,
) -> GameResult<Json<SessionView>> {
    let view = state
        .submit_guess(&code, &request.player_id, request.guesses)
        .await?;
    Ok(Json(view))
}

/// Force the round forward. The body names either the round it expects to
/// move from (`expected`) or a `step` (`resolve` / `next_round`).
///
/// POST /api/sessions/{code}/advance
pub async fn advance_round(
    State(state): Shared,
    Path(code): Path<String>,
    Json(request): Json<AdvanceRequest>,
) -> GameResult<Json<SessionView>> {
    let advance = request.advance()?;
    let view = state
        .advance_round(&code, &request.player_id, advance)
        .await?;
    Ok(Json(view))
}

/// POST /api/sessions/{code}/end
pub async fn end_game(
    State(state): Shared,
    Path(code): Path<String>,
    Json(request): Json<PlayerRequest>,
) -> GameResult<Json<SessionView>> {
    Ok(Json(state.end_game(&code, &request.player_id).await?))
}
