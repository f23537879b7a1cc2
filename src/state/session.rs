use serde::Serialize;
use std::collections::{HashSet, VecDeque};

use crate::error::{GameError, GameResult};
use crate::strategy::Round;
use crate::types::*;

/// How many source quotes a session remembers to avoid repeats
pub const USED_QUOTE_MEMORY: usize = 200;

/// Finished round, kept for the scoreboard history
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RoundRecord {
    pub number: u32,
    pub prompt: String,
    pub winner_names: Vec<String>,
    pub voided: bool,
}

/// Everything the engine knows about one live session
#[derive(Debug, Clone)]
pub struct SessionState {
    pub code: SessionCode,
    pub game: GameKind,
    pub status: SessionStatus,
    pub host_id: PlayerId,
    pub config: SessionConfig,
    pub allow_midgame_join: bool,
    /// Ordered by seat
    pub players: Vec<Player>,
    /// Highest seat ever handed out; seats of departed players stay retired
    pub seats_issued: u32,
    pub round_number: u32,
    pub round: Option<Round>,
    pub history: Vec<RoundRecord>,
    pub used_quote_ids: VecDeque<QuoteId>,
    pub end_reason: Option<EndReason>,
    /// Bumped on every committed change
    pub version: u64,
    pub created_at: String,
    pub updated_at: String,
}

impl SessionState {
    pub fn new(code: SessionCode, game: GameKind, config: SessionConfig, host: Player) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            code,
            game,
            status: SessionStatus::Waiting,
            host_id: host.id.clone(),
            config,
            allow_midgame_join: false,
            seats_issued: host.seat,
            players: vec![host],
            round_number: 0,
            round: None,
            history: Vec::new(),
            used_quote_ids: VecDeque::new(),
            end_reason: None,
            version: 1,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    pub fn player(&self, player_id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == player_id)
    }

    pub fn is_member(&self, player_id: &str) -> bool {
        self.player(player_id).is_some()
    }

    pub fn is_host(&self, player_id: &str) -> bool {
        self.host_id == player_id
    }

    pub fn require_member(&self, player_id: &str) -> GameResult<&Player> {
        self.player(player_id).ok_or_else(GameError::not_a_member)
    }

    pub fn require_host(&self, player_id: &str) -> GameResult<()> {
        self.require_member(player_id)?;
        if !self.is_host(player_id) {
            return Err(GameError::Forbidden("Only the host can do that".to_string()));
        }
        Ok(())
    }

    /// Ended sessions only answer snapshot reads
    pub fn require_not_ended(&self) -> GameResult<()> {
        if self.status == SessionStatus::Ended {
            return Err(GameError::InvalidState(self.end_message()));
        }
        Ok(())
    }

    pub fn end_message(&self) -> String {
        self.end_reason
            .map(|r| r.message(self.round_number))
            .unwrap_or_else(|| "This game has ended.".to_string())
    }

    pub fn present_ids(&self) -> HashSet<PlayerId> {
        self.players.iter().map(|p| p.id.clone()).collect()
    }

    pub fn next_seat(&mut self) -> u32 {
        self.seats_issued += 1;
        self.seats_issued
    }

    /// Round leader: lowest seat for the first round, then the next occupied
    /// seat after the previous leader's, wrapping around.
    pub fn next_leader(&self) -> Option<&Player> {
        let previous = self.round.as_ref().and_then(|r| r.leader_seat);
        let lowest = self.players.iter().min_by_key(|p| p.seat);
        match previous {
            None => lowest,
            Some(seat) => self
                .players
                .iter()
                .filter(|p| p.seat > seat)
                .min_by_key(|p| p.seat)
                .or(lowest),
        }
    }

    pub fn remember_quote(&mut self, quote_id: QuoteId) {
        self.used_quote_ids.push_back(quote_id);
        while self.used_quote_ids.len() > USED_QUOTE_MEMORY {
            self.used_quote_ids.pop_front();
        }
    }

    pub fn end(&mut self, reason: EndReason) {
        if self.status == SessionStatus::Ended {
            return;
        }
        tracing::info!(code = %self.code, reason = ?reason, "Session ended");
        self.status = SessionStatus::Ended;
        self.end_reason = Some(reason);
    }

    /// Credit the resolved round's awards and log it in the history
    pub fn score_resolved_round(&mut self) {
        let Some(round) = &self.round else {
            return;
        };
        let Some(outcome) = &round.outcome else {
            return;
        };

        for award in &outcome.awards {
            if let Some(player) = self.players.iter_mut().find(|p| p.id == award.player_id) {
                player.score += award.points;
            }
        }

        let winner_names = outcome
            .winners
            .iter()
            .filter_map(|id| self.players.iter().find(|p| &p.id == id))
            .map(|p| p.display_name.clone())
            .collect();
        let record = RoundRecord {
            number: round.number,
            prompt: round_prompt(round),
            winner_names,
            voided: outcome.voided,
        };
        self.history.push(record);
    }
}

fn round_prompt(round: &Round) -> String {
    use crate::strategy::RoundPlay;
    match &round.play {
        RoundPlay::JudgePick(table) | RoundPlay::AllVote(table) => table.prompt.clone(),
        RoundPlay::Redaction(puzzle) => puzzle.source.text.clone(),
        RoundPlay::AuthorChoice(quiz) => quiz.quote.text.clone(),
    }
}
