//! Request bodies and viewer-relative views exchanged over HTTP.

use crate::error::{GameError, GameResult};
use crate::state::session::RoundRecord;
use crate::types::*;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateSessionRequest {
    #[serde(default, alias = "display_name")]
    pub player_name: String,
    pub judging_mode: Option<JudgingMode>,
    pub max_players: Option<usize>,
    pub max_rounds: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JoinRequest {
    #[serde(default, alias = "display_name")]
    pub player_name: String,
    /// Previously issued id, for reconnecting
    pub player_id: Option<PlayerId>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlayerRequest {
    pub player_id: PlayerId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CardRequest {
    pub player_id: PlayerId,
    pub card_index: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EntryRequest {
    pub player_id: PlayerId,
    pub entry_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedactionRequest {
    pub player_id: PlayerId,
    pub indices: Vec<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GuessRequest {
    pub player_id: PlayerId,
    #[serde(alias = "answers")]
    pub guesses: Vec<String>,
}

/// Marker naming the round a forced advance is meant for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundMarker {
    pub round_number: u32,
    pub status: RoundStatus,
}

/// Which way a forced advance moves when no marker pins it to a round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvanceStep {
    /// Close the open phase of the current round
    Resolve,
    /// Leave reveal for the next round
    NextRound,
}

/// What an advance is meant to move on from. Each form is a no-op once
/// its target state has been reached, so retries are safe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Exactly this round and phase
    From(RoundMarker),
    /// Any round that is not yet in reveal
    Resolve,
    /// A round that is in reveal
    NextRound,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdvanceRequest {
    pub player_id: PlayerId,
    #[serde(default)]
    pub expected: Option<RoundMarker>,
    #[serde(default)]
    pub step: Option<AdvanceStep>,
}

impl AdvanceRequest {
    /// A marker wins over a step; a bare request is ambiguous on retry and rejected
    pub fn advance(&self) -> GameResult<Advance> {
        match (self.expected, self.step) {
            (Some(marker), _) => Ok(Advance::From(marker)),
            (None, Some(AdvanceStep::Resolve)) => Ok(Advance::Resolve),
            (None, Some(AdvanceStep::NextRound)) => Ok(Advance::NextRound),
            (None, None) => Err(GameError::Validation(
                "Say what to advance: send `expected` or a `step` of resolve or next_round".to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SnapshotQuery {
    pub player_id: Option<PlayerId>,
}

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

/// Static facts about a game plus how ready the quote book is for it
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GameInfo {
    pub game: GameKind,
    pub game_name: String,
    pub min_players: usize,
    pub max_players: usize,
    pub default_max_rounds: u32,
    pub max_rounds_limit: u32,
    pub rule: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub judging_modes: Vec<JudgingMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hand_size: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_quotes_required: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_words_for_quote: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options_per_question: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_pool_count: Option<usize>,
    pub eligible_quote_count: usize,
    pub total_quote_count: usize,
    pub ready: bool,
}

/// A prompt and a hand for trying the card game alone
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SoloHand {
    pub prompt: String,
    pub hand: Vec<Quote>,
    pub dealt_at: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SessionView {
    pub code: SessionCode,
    pub game: GameKind,
    pub game_name: String,
    pub status: SessionStatus,
    pub version: u64,
    pub host_id: PlayerId,
    pub config: SessionConfig,
    pub round_number: u32,
    pub players: Vec<PlayerView>,
    pub viewer: ViewerInfo,
    pub round: Option<RoundView>,
    pub history: Vec<RoundRecord>,
    pub ended_reason: Option<EndReason>,
    pub ended_message: Option<String>,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PlayerView {
    pub id: PlayerId,
    pub display_name: String,
    pub seat: u32,
    pub score: u32,
    pub is_host: bool,
    pub is_leader: bool,
    /// Whether this player has acted in the current phase
    pub has_submitted: bool,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct ViewerInfo {
    pub player_id: Option<PlayerId>,
    pub display_name: Option<String>,
    pub is_host: bool,
    pub is_judge: bool,
    pub is_redactor: bool,
    /// False for spectators and players who joined mid-round
    pub is_participant: bool,
    pub can_start: bool,
    pub can_submit: bool,
    pub can_vote: bool,
    pub can_pick_winner: bool,
    pub can_advance: bool,
    pub can_end: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RoundView {
    pub number: u32,
    pub status: RoundStatus,
    pub leader_id: Option<PlayerId>,
    pub leader_name: Option<String>,
    /// Acted so far in the current phase
    pub submitted_count: usize,
    /// Expected to act in the current phase
    pub required_count: usize,
    pub detail: RoundDetail,
    /// Only present once the round is in reveal
    pub outcome: Option<OutcomeView>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RoundDetail {
    Cards {
        prompt: String,
        /// Viewer's own hand while cards are being played
        hand: Option<Vec<Quote>>,
        my_entry_id: Option<String>,
        my_vote: Option<String>,
        /// Played cards, once the viewer may see them
        entries: Vec<EntryView>,
    },
    Redaction {
        word_count: usize,
        max_redactions: usize,
        gap_count: usize,
        /// Source words, for the redactor and at reveal
        source_words: Option<Vec<String>>,
        puzzle_text: Option<String>,
        /// Viewer's own submitted words; correctness waits for reveal
        my_answer: Option<Vec<String>>,
        answers: Option<Vec<String>>,
        guesses: Vec<GuessView>,
    },
    AuthorChoice {
        quote_text: String,
        options: Vec<String>,
        my_answer: Option<String>,
        answer: Option<String>,
        guesses: Vec<GuessView>,
    },
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EntryView {
    pub entry_id: String,
    pub text: String,
    pub authors: Vec<String>,
    pub player_id: Option<PlayerId>,
    pub player_name: Option<String>,
    pub votes: Option<u32>,
}

/// A guess as shown at reveal
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GuessView {
    pub player_id: PlayerId,
    pub display_name: String,
    pub answer: Vec<String>,
    pub correct: bool,
    pub rank: Option<u32>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OutcomeView {
    pub winners: Vec<PlayerBrief>,
    pub awards: Vec<AwardView>,
    pub voided: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PlayerBrief {
    pub id: PlayerId,
    pub display_name: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AwardView {
    pub player_id: PlayerId,
    pub display_name: String,
    pub points: u32,
    pub rank: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requests_accept_aliases() {
        let req: CreateSessionRequest =
            serde_json::from_str(r#"{"display_name": "Ada", "judging_mode": "all_vote"}"#).unwrap();
        assert_eq!(req.player_name, "Ada");
        assert_eq!(req.judging_mode, Some(JudgingMode::AllVote));

        let req: GuessRequest =
            serde_json::from_str(r#"{"player_id": "p", "answers": ["fox"]}"#).unwrap();
        assert_eq!(req.guesses, vec!["fox".to_string()]);
    }

    #[test]
    fn test_advance_needs_marker_or_step() {
        let req: AdvanceRequest = serde_json::from_str(r#"{"player_id": "p"}"#).unwrap();
        assert!(matches!(req.advance(), Err(GameError::Validation(_))));

        let req: AdvanceRequest =
            serde_json::from_str(r#"{"player_id": "p", "step": "next_round"}"#).unwrap();
        assert_eq!(req.advance().unwrap(), Advance::NextRound);

        let req: AdvanceRequest = serde_json::from_str(
            r#"{"player_id": "p", "step": "resolve", "expected": {"round_number": 2, "status": "reveal"}}"#,
        )
        .unwrap();
        assert_eq!(
            req.advance().unwrap(),
            Advance::From(RoundMarker {
                round_number: 2,
                status: RoundStatus::Reveal
            })
        );
    }

    #[test]
    fn test_round_detail_is_tagged() {
        let detail = RoundDetail::AuthorChoice {
            quote_text: "Hi".into(),
            options: vec!["Ada".into()],
            my_answer: None,
            answer: None,
            guesses: vec![],
        };
        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(json["kind"], "author_choice");
        assert_eq!(json["quote_text"], "Hi");
    }
}
