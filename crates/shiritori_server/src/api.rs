//! HTTP API over the referee.
//!
//! Keeps the wire shape the browser client expects: `user`/`ai` naming and
//! plain strings for words and syllables.

use axum::{
    Json, Router,
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use shiritori::{MoveRequest, Outcome, Referee, RoundError, Winner};
use std::sync::Arc;
use tower::ServiceBuilder;
use tracing::{debug, info, instrument, warn};

/// Body of `POST /api/ai_move`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiMoveRequest {
    /// Words played so far, oldest first.
    #[serde(default)]
    pub history: Vec<String>,
    /// The player's new word.
    pub user_word: String,
}

impl From<AiMoveRequest> for MoveRequest {
    fn from(req: AiMoveRequest) -> Self {
        MoveRequest::new(req.history, req.user_word)
    }
}

/// Winner as named on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireWinner {
    /// The human player.
    User,
    /// The automated opponent.
    Ai,
    /// Nobody; the turn limit was reached.
    #[serde(rename = "none")]
    Nobody,
}

impl From<Winner> for WireWinner {
    fn from(winner: Winner) -> Self {
        match winner {
            Winner::Player => Self::User,
            Winner::Opponent => Self::Ai,
            Winner::Nobody => Self::Nobody,
        }
    }
}

/// Response of `POST /api/ai_move`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiMoveResponse {
    /// Whether the player's word was accepted.
    pub ok: bool,
    /// Message for the player.
    pub message: String,
    /// The player's word, normalized.
    pub user_word: Option<String>,
    /// The opponent's word.
    pub ai_word: Option<String>,
    /// Syllable the player must start with next.
    pub next_head_for_user: Option<String>,
    /// Words used so far.
    pub used: Vec<String>,
    /// Player moves so far.
    pub turn_count: u32,
    /// Whether the game ended.
    pub game_over: bool,
    /// Who won, once the game ended.
    pub winner: Option<WireWinner>,
}

impl From<&Outcome> for AiMoveResponse {
    fn from(outcome: &Outcome) -> Self {
        Self {
            ok: outcome.accepted(),
            message: outcome.message().clone(),
            user_word: outcome.player_word().as_ref().map(ToString::to_string),
            ai_word: outcome.opponent_word().as_ref().map(ToString::to_string),
            next_head_for_user: outcome.next_required_head().map(|h| h.to_string()),
            used: outcome.used_words().iter().map(ToString::to_string).collect(),
            turn_count: outcome.player_turn_count(),
            game_over: outcome.game_over(),
            winner: outcome.winner().map(WireWinner::from),
        }
    }
}

/// Error body returned with a 4xx status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Player-facing explanation.
    pub detail: String,
}

/// A request the referee refused to play.
#[derive(Debug)]
pub struct ApiError(RoundError);

impl From<RoundError> for ApiError {
    fn from(err: RoundError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        warn!(error = %self.0, "Rejecting request");
        let body = ErrorBody {
            detail: self.0.prompt().to_string(),
        };
        (StatusCode::BAD_REQUEST, Json(body)).into_response()
    }
}

/// Builds the application router.
#[instrument(skip(referee), fields(max_turns = referee.max_turns()))]
pub fn router(referee: Arc<Referee>) -> Router {
    info!(primary = referee.provider().has_primary(), "Building router");
    Router::new()
        .route("/api/ai_move", post(ai_move))
        .route("/health", get(health))
        .layer(ServiceBuilder::new().map_request(log_request))
        .with_state(referee)
}

fn log_request(req: Request<Body>) -> Request<Body> {
    debug!(method = %req.method(), uri = %req.uri(), "Incoming HTTP request");
    req
}

#[instrument(skip(referee, req), fields(history_len = req.history.len()))]
async fn ai_move(
    State(referee): State<Arc<Referee>>,
    Json(req): Json<AiMoveRequest>,
) -> Result<Json<AiMoveResponse>, ApiError> {
    let outcome = referee.play_round(&req.into()).await?;
    Ok(Json(AiMoveResponse::from(&outcome)))
}

async fn health() -> &'static str {
    "ok"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_history_defaults_to_empty() {
        let req: AiMoveRequest = serde_json::from_str(r#"{"user_word": "ねこ"}"#).unwrap();
        assert!(req.history.is_empty());
        assert_eq!(MoveRequest::from(req).candidate, "ねこ");
    }

    #[test]
    fn test_winner_wire_names() {
        let names: Vec<String> = [Winner::Player, Winner::Opponent, Winner::Nobody]
            .into_iter()
            .map(|w| serde_json::to_string(&WireWinner::from(w)).unwrap())
            .collect();
        assert_eq!(names, vec!["\"user\"", "\"ai\"", "\"none\""]);
    }
}
