use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::quotes::QuoteError;

/// Result type for engine operations
pub type GameResult<T> = Result<T, GameError>;

/// Errors surfaced to callers of the session engine
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    InvalidState(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Capacity(String),

    #[error("Session is full ({0} players max)")]
    SessionFull(usize),

    #[error("{0}")]
    SessionNotJoinable(String),

    #[error("Need at least {needed} players, have {have}")]
    NotEnoughPlayers { needed: usize, have: usize },

    #[error("You already submitted this round")]
    AlreadySubmitted,

    #[error("Quote supply unavailable: {0}")]
    SupplyUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl GameError {
    /// Stable machine-readable kind
    pub fn code(&self) -> &'static str {
        match self {
            GameError::NotFound(_) => "not_found",
            GameError::Forbidden(_) => "forbidden",
            GameError::InvalidState(_) => "invalid_state",
            GameError::Validation(_) => "validation",
            GameError::Capacity(_) => "capacity",
            GameError::SessionFull(_) => "session_full",
            GameError::SessionNotJoinable(_) => "session_not_joinable",
            GameError::NotEnoughPlayers { .. } => "not_enough_players",
            GameError::AlreadySubmitted => "already_submitted",
            GameError::SupplyUnavailable(_) => "supply_unavailable",
            GameError::Internal(_) => "internal",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            GameError::NotFound(_) => StatusCode::NOT_FOUND,
            GameError::Forbidden(_) => StatusCode::FORBIDDEN,
            GameError::Validation(_) => StatusCode::BAD_REQUEST,
            GameError::InvalidState(_)
            | GameError::Capacity(_)
            | GameError::SessionFull(_)
            | GameError::SessionNotJoinable(_)
            | GameError::NotEnoughPlayers { .. }
            | GameError::AlreadySubmitted => StatusCode::CONFLICT,
            GameError::SupplyUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            GameError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub(crate) fn session_not_found(code: &str) -> Self {
        GameError::NotFound(format!("Session '{}' not found", code))
    }

    pub(crate) fn not_a_member() -> Self {
        GameError::Forbidden("You are not part of this session".to_string())
    }
}

impl From<QuoteError> for GameError {
    fn from(e: QuoteError) -> Self {
        GameError::SupplyUnavailable(e.to_string())
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    code: &'static str,
}

impl IntoResponse for GameError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(code = self.code(), "{}", self);
        } else {
            tracing::debug!(code = self.code(), "{}", self);
        }
        let body = ErrorBody {
            error: self.to_string(),
            code: self.code(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(GameError::session_not_found("ABC").status(), StatusCode::NOT_FOUND);
        assert_eq!(GameError::not_a_member().status(), StatusCode::FORBIDDEN);
        assert_eq!(GameError::Validation("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(GameError::SessionFull(4).status(), StatusCode::CONFLICT);
        assert_eq!(GameError::AlreadySubmitted.status(), StatusCode::CONFLICT);
        assert_eq!(
            GameError::SupplyUnavailable("down".into()).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_messages() {
        let err = GameError::NotEnoughPlayers { needed: 2, have: 1 };
        assert_eq!(err.to_string(), "Need at least 2 players, have 1");
        assert_eq!(err.code(), "not_enough_players");
    }
}
