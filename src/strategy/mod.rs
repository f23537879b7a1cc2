//! Round lifecycle and the closed set of resolution strategies.
//!
//! A round opens in `collecting` (or straight in `guessing` for author
//! questions), moves to `judging`/`guessing` once every required submission
//! is in, and resolves into `reveal`. Every step can also be forced.

pub mod author_choice;
pub mod cards;
pub mod ranking;
pub mod redaction;

use serde::Serialize;
use std::collections::HashSet;

use crate::error::{GameError, GameResult};
use crate::types::{PlayerId, QuoteId, RoundStatus};

pub use author_choice::AuthorQuiz;
pub use cards::CardTable;
pub use redaction::RedactionPuzzle;

/// A player's move inside a round
#[derive(Debug, Clone, PartialEq)]
pub enum Move {
    Card { card_index: usize },
    Vote { entry_id: String },
    Pick { entry_id: String },
    Redact { indices: Vec<usize> },
    Guess { answers: Vec<String> },
}

impl Move {
    fn label(&self) -> &'static str {
        match self {
            Move::Card { .. } => "Playing a card",
            Move::Vote { .. } => "Voting",
            Move::Pick { .. } => "Picking a winner",
            Move::Redact { .. } => "Redacting",
            Move::Guess { .. } => "Guessing",
        }
    }
}

#[derive(Debug, Clone)]
pub enum RoundPlay {
    /// Rotating judge picks the best card
    JudgePick(CardTable),
    /// Everyone plays a card, then votes for someone else's
    AllVote(CardTable),
    /// Rotating redactor hides words, the rest race to guess them
    Redaction(RedactionPuzzle),
    /// Everyone races to name the quote's author
    AuthorChoice(AuthorQuiz),
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Award {
    pub player_id: PlayerId,
    pub points: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct RoundOutcome {
    pub winners: Vec<PlayerId>,
    pub awards: Vec<Award>,
    /// Round ended without a result (leader left or nothing was played)
    pub voided: bool,
}

impl RoundOutcome {
    fn flat(winners: Vec<PlayerId>) -> Self {
        let awards = winners
            .iter()
            .map(|id| Award {
                player_id: id.clone(),
                points: 1,
                rank: None,
            })
            .collect();
        Self {
            winners,
            awards,
            voided: false,
        }
    }

    fn ranked(awards: Vec<(PlayerId, u32, u32)>) -> Self {
        let winners = awards
            .iter()
            .filter(|(_, rank, _)| *rank == 1)
            .map(|(id, _, _)| id.clone())
            .collect();
        let awards = awards
            .into_iter()
            .map(|(player_id, rank, points)| Award {
                player_id,
                points,
                rank: Some(rank),
            })
            .collect();
        Self {
            winners,
            awards,
            voided: false,
        }
    }

    fn void() -> Self {
        Self {
            voided: true,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct Round {
    pub number: u32,
    pub status: RoundStatus,
    /// Judge or redactor
    pub leader: Option<PlayerId>,
    pub leader_seat: Option<u32>,
    /// Players seated when the round began; later joiners sit it out
    pub participants: Vec<PlayerId>,
    pub play: RoundPlay,
    pub outcome: Option<RoundOutcome>,
    pub started_at: String,
}

impl Round {
    pub fn begin(
        number: u32,
        leader: Option<(PlayerId, u32)>,
        participants: Vec<PlayerId>,
        play: RoundPlay,
    ) -> Self {
        let status = match play {
            RoundPlay::AuthorChoice(_) => RoundStatus::Guessing,
            _ => RoundStatus::Collecting,
        };
        let (leader, leader_seat) = match leader {
            Some((id, seat)) => (Some(id), Some(seat)),
            None => (None, None),
        };
        Self {
            number,
            status,
            leader,
            leader_seat,
            participants,
            play,
            outcome: None,
            started_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn is_participant(&self, player_id: &str) -> bool {
        self.participants.iter().any(|p| p == player_id)
    }

    pub fn is_leader(&self, player_id: &str) -> bool {
        self.leader.as_deref() == Some(player_id)
    }

    pub fn is_resolved(&self) -> bool {
        self.status == RoundStatus::Reveal
    }

    /// Quotes on the winning cards of a resolved card round
    pub fn winning_quotes(&self) -> Vec<QuoteId> {
        let (RoundPlay::JudgePick(table) | RoundPlay::AllVote(table)) = &self.play else {
            return Vec::new();
        };
        let Some(outcome) = &self.outcome else {
            return Vec::new();
        };
        outcome
            .winners
            .iter()
            .filter_map(|w| table.played_by(w))
            .map(|card| card.quote.id)
            .collect()
    }

    /// Number of guessers or card players the round was dealt for
    pub fn field_size(&self) -> usize {
        match self.leader {
            Some(_) => self.participants.len().saturating_sub(1),
            None => self.participants.len(),
        }
    }

    pub fn apply(&mut self, actor: &str, mv: Move) -> GameResult<()> {
        if self.is_resolved() {
            return Err(GameError::InvalidState("This round is already over".to_string()));
        }
        if !self.is_participant(actor) {
            return Err(GameError::Forbidden(
                "You joined mid-round; wait for the next one".to_string(),
            ));
        }

        let status = self.status;
        let is_leader = self.is_leader(actor);
        let label = mv.label();
        let wrong_phase =
            || GameError::InvalidState(format!("{} is not open right now", label));

        match (&mut self.play, mv) {
            (RoundPlay::JudgePick(table), Move::Card { card_index }) => {
                if status != RoundStatus::Collecting {
                    return Err(wrong_phase());
                }
                if is_leader {
                    return Err(GameError::Forbidden("The judge doesn't play a card".to_string()));
                }
                table.play_card(actor, card_index)
            }
            (RoundPlay::AllVote(table), Move::Card { card_index }) => {
                if status != RoundStatus::Collecting {
                    return Err(wrong_phase());
                }
                table.play_card(actor, card_index)
            }
            (RoundPlay::JudgePick(table), Move::Pick { entry_id }) => {
                if status != RoundStatus::Judging {
                    return Err(wrong_phase());
                }
                if !is_leader {
                    return Err(GameError::Forbidden("Only the judge picks the winner".to_string()));
                }
                table.choose_winner(&entry_id)
            }
            (RoundPlay::AllVote(table), Move::Vote { entry_id }) => {
                if status != RoundStatus::Judging {
                    return Err(wrong_phase());
                }
                table.vote(actor, &entry_id)
            }
            (RoundPlay::Redaction(puzzle), Move::Redact { indices }) => {
                if status != RoundStatus::Collecting {
                    return Err(wrong_phase());
                }
                if !is_leader {
                    return Err(GameError::Forbidden("Only the redactor picks words".to_string()));
                }
                puzzle.redact(&indices)
            }
            (RoundPlay::Redaction(puzzle), Move::Guess { answers }) => {
                if status != RoundStatus::Guessing {
                    return Err(wrong_phase());
                }
                if is_leader {
                    return Err(GameError::Forbidden("The redactor cannot guess".to_string()));
                }
                puzzle.guess(actor, answers).map(|_| ())
            }
            (RoundPlay::AuthorChoice(quiz), Move::Guess { answers }) => {
                if status != RoundStatus::Guessing {
                    return Err(wrong_phase());
                }
                let [choice] = answers.as_slice() else {
                    return Err(GameError::Validation("Pick exactly one author".to_string()));
                };
                quiz.choose(actor, choice).map(|_| ())
            }
            _ => Err(GameError::InvalidState(format!(
                "{} is not part of this game",
                label
            ))),
        }
    }

    /// Move through every phase whose requirements are met by the players
    /// still `present`. Returns true if the round resolved.
    pub fn settle(&mut self, present: &HashSet<PlayerId>) -> bool {
        if self.is_resolved() {
            return false;
        }
        let leader_gone = self.leader.as_ref().is_some_and(|l| !present.contains(l));
        if leader_gone && self.leader_still_owes_a_move() {
            tracing::info!(round = self.number, "Leader left, voiding round");
            self.finish(RoundOutcome::void());
            return true;
        }

        let active: Vec<PlayerId> = self
            .participants
            .iter()
            .filter(|p| present.contains(*p))
            .cloned()
            .collect();

        if self.status == RoundStatus::Collecting
            && self.collecting_done(&active)
            && self.close_collecting()
        {
            return true;
        }

        if matches!(self.status, RoundStatus::Judging | RoundStatus::Guessing)
            && self.deciding_done(&active)
        {
            self.resolve();
            return true;
        }
        false
    }

    /// Push the round one phase forward regardless of who is missing.
    /// Returns true if the round resolved.
    pub fn force(&mut self) -> bool {
        match self.status {
            RoundStatus::Collecting => self.close_collecting(),
            RoundStatus::Judging | RoundStatus::Guessing => {
                self.resolve();
                true
            }
            RoundStatus::Reveal => false,
        }
    }

    /// The judge still has to pick; a redactor is done once the words are hidden
    fn leader_still_owes_a_move(&self) -> bool {
        match &self.play {
            RoundPlay::JudgePick(_) => true,
            RoundPlay::Redaction(_) => self.status == RoundStatus::Collecting,
            RoundPlay::AllVote(_) | RoundPlay::AuthorChoice(_) => false,
        }
    }

    fn collecting_done(&self, active: &[PlayerId]) -> bool {
        match &self.play {
            RoundPlay::JudgePick(table) => active
                .iter()
                .filter(|p| !self.is_leader(p))
                .all(|p| table.has_played(p)),
            RoundPlay::AllVote(table) => active.iter().all(|p| table.has_played(p)),
            RoundPlay::Redaction(puzzle) => puzzle.is_redacted(),
            RoundPlay::AuthorChoice(_) => true,
        }
    }

    fn deciding_done(&self, active: &[PlayerId]) -> bool {
        match &self.play {
            RoundPlay::JudgePick(table) => table.pick().is_some(),
            RoundPlay::AllVote(table) => active
                .iter()
                .filter(|p| table.has_played(p))
                .all(|p| table.vote_of(p).is_some()),
            RoundPlay::Redaction(puzzle) => active
                .iter()
                .filter(|p| !self.is_leader(p))
                .all(|p| puzzle.guesses.has_answered(p)),
            RoundPlay::AuthorChoice(quiz) => active.iter().all(|p| quiz.guesses.has_answered(p)),
        }
    }

    /// Leave `collecting`. Returns true when there is nothing to decide and
    /// the round resolved on the spot.
    fn close_collecting(&mut self) -> bool {
        let next = match &mut self.play {
            RoundPlay::JudgePick(table) if !table.played().is_empty() => {
                table.shuffle();
                Some(RoundStatus::Judging)
            }
            RoundPlay::AllVote(table) if table.played().len() >= 2 => {
                table.shuffle();
                Some(RoundStatus::Judging)
            }
            RoundPlay::Redaction(puzzle) if puzzle.is_redacted() => Some(RoundStatus::Guessing),
            RoundPlay::AuthorChoice(_) => Some(RoundStatus::Guessing),
            RoundPlay::Redaction(_) => {
                self.finish(RoundOutcome::void());
                return true;
            }
            RoundPlay::JudgePick(_) | RoundPlay::AllVote(_) => None,
        };

        match next {
            Some(status) => {
                self.status = status;
                false
            }
            None => {
                self.resolve();
                true
            }
        }
    }

    fn resolve(&mut self) {
        let field = self.field_size();
        let outcome = match &self.play {
            RoundPlay::JudgePick(table) => {
                if table.played().is_empty() {
                    RoundOutcome::void()
                } else {
                    RoundOutcome::flat(table.judged_winner())
                }
            }
            RoundPlay::AllVote(table) => {
                if table.played().is_empty() {
                    RoundOutcome::void()
                } else {
                    RoundOutcome::flat(table.voted_winners())
                }
            }
            RoundPlay::Redaction(puzzle) => RoundOutcome::ranked(puzzle.guesses.awards(field)),
            RoundPlay::AuthorChoice(quiz) => RoundOutcome::ranked(quiz.guesses.awards(field)),
        };
        self.finish(outcome);
    }

    fn finish(&mut self, outcome: RoundOutcome) {
        tracing::debug!(
            round = self.number,
            winners = outcome.winners.len(),
            voided = outcome.voided,
            "Round resolved"
        );
        self.status = RoundStatus::Reveal;
        self.outcome = Some(outcome);
    }
}
