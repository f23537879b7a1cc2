use super::session::SessionState;
use super::snapshot::project;
use super::AppState;
use crate::error::{GameError, GameResult};
use crate::protocol::{Advance, RoundMarker, SessionView};
use crate::quotes::QuoteFilter;
use crate::strategy::cards::HAND_SIZE;
use crate::strategy::redaction::MIN_WORDS_FOR_QUOTE;
use crate::strategy::{AuthorQuiz, CardTable, Move, RedactionPuzzle, Round, RoundPlay};
use crate::types::*;

/// Quotes sampled as decoy material for each redaction round
const FILLER_POOL_SIZE: usize = 40;

/// Content fetched from the quote supply before a round begins
pub(crate) enum RoundMaterials {
    Cards { prompt: String, deck: Vec<Quote> },
    Redaction { source: Quote, filler_pool: Vec<Quote> },
    Author { quote: Quote, authors: Vec<String> },
}

fn current_marker(session: &SessionState) -> Option<RoundMarker> {
    session.round.as_ref().map(|r| RoundMarker {
        round_number: r.number,
        status: r.status,
    })
}

/// Build the strategy state for a round; `None` when the materials can't supply it
fn build_play(
    materials: RoundMaterials,
    mode: JudgingMode,
    leader: Option<&str>,
    participants: &[PlayerId],
) -> Option<(RoundPlay, Option<QuoteId>)> {
    match materials {
        RoundMaterials::Cards { prompt, deck } => {
            let receivers: Vec<&PlayerId> = participants
                .iter()
                .filter(|p| Some(p.as_str()) != leader)
                .collect();
            let per_hand = (deck.len() / receivers.len().max(1)).min(HAND_SIZE);
            if per_hand == 0 {
                return None;
            }
            let mut cards = deck.into_iter();
            let hands = receivers
                .into_iter()
                .map(|p| (p.clone(), cards.by_ref().take(per_hand).collect()))
                .collect();
            let table = CardTable::deal(prompt, hands);
            let play = match mode {
                JudgingMode::Judge => RoundPlay::JudgePick(table),
                JudgingMode::AllVote => RoundPlay::AllVote(table),
            };
            Some((play, None))
        }
        RoundMaterials::Redaction {
            source,
            filler_pool,
        } => {
            let id = source.id;
            let puzzle = RedactionPuzzle::new(source, filler_pool);
            Some((RoundPlay::Redaction(puzzle), Some(id)))
        }
        RoundMaterials::Author { quote, authors } => {
            let id = quote.id;
            AuthorQuiz::new(quote, &authors).map(|quiz| (RoundPlay::AuthorChoice(quiz), Some(id)))
        }
    }
}

/// Open the next round, or end the session when there is nothing left to play
pub(crate) fn begin_round(session: &mut SessionState, materials: Option<RoundMaterials>) {
    let leader = if session.game.has_leader(session.config.judging_mode) {
        session.next_leader().map(|p| (p.id.clone(), p.seat))
    } else {
        None
    };
    let participants: Vec<PlayerId> = session.players.iter().map(|p| p.id.clone()).collect();

    let built = materials.and_then(|m| {
        build_play(
            m,
            session.config.judging_mode,
            leader.as_ref().map(|(id, _)| id.as_str()),
            &participants,
        )
    });
    let Some((play, source_id)) = built else {
        tracing::warn!(code = %session.code, "No playable quotes left");
        session.end(EndReason::QuotesExhausted);
        return;
    };

    if let Some(id) = source_id {
        session.remember_quote(id);
    }
    session.round_number += 1;
    tracing::info!(
        code = %session.code,
        round = session.round_number,
        leader = ?leader.as_ref().map(|(id, _)| id),
        "Round started"
    );
    session.round = Some(Round::begin(session.round_number, leader, participants, play));
}

/// Score a freshly resolved round and stop after the last one
pub(crate) fn on_round_resolved(session: &mut SessionState) {
    session.score_resolved_round();
    if session.round_number >= session.config.max_rounds {
        session.end(EndReason::MaxRounds);
    }
}

impl AppState {
    async fn fetch_materials(&self, session: &SessionState) -> GameResult<Option<RoundMaterials>> {
        let unused = QuoteFilter::any().excluding(session.used_quote_ids.iter().copied());

        let materials = match session.game {
            GameKind::QuoteAnarchy => {
                let deck = self
                    .quotes
                    .sample(HAND_SIZE * session.config.max_players, &QuoteFilter::any())
                    .await?;
                (!deck.is_empty()).then(|| RoundMaterials::Cards {
                    prompt: self.prompts.draw(),
                    deck,
                })
            }
            GameKind::BlacklineRush => {
                let filter = unused.min_words(MIN_WORDS_FOR_QUOTE);
                match self.quotes.sample(1, &filter).await?.into_iter().next() {
                    Some(source) => {
                        let others = QuoteFilter::any().excluding([source.id]);
                        let filler_pool = self.quotes.sample(FILLER_POOL_SIZE, &others).await?;
                        Some(RoundMaterials::Redaction {
                            source,
                            filler_pool,
                        })
                    }
                    None => None,
                }
            }
            GameKind::WhoSaidIt => {
                match self.quotes.sample(1, &unused.single_author()).await?.into_iter().next() {
                    Some(quote) => Some(RoundMaterials::Author {
                        quote,
                        authors: self.quotes.authors().await?,
                    }),
                    None => None,
                }
            }
        };
        Ok(materials)
    }

    /// Host starts the game. Starting a running game again is a no-op.
    pub async fn start_game(&self, code: &str, player_id: &str) -> GameResult<SessionView> {
        let observed = self.sessions.snapshot(code).await?;
        observed.require_host(player_id)?;
        if observed.status == SessionStatus::Active {
            return Ok(project(&observed, Some(player_id)));
        }
        observed.require_not_ended()?;
        if observed.players.len() < MIN_PLAYERS {
            return Err(GameError::NotEnoughPlayers {
                needed: MIN_PLAYERS,
                have: observed.players.len(),
            });
        }

        let materials = self.fetch_materials(&observed).await?;

        let mut session = self.sessions.lock(code).await?;
        session.require_host(player_id)?;
        if session.status == SessionStatus::Active {
            let snapshot = session.release().await;
            return Ok(project(&snapshot, Some(player_id)));
        }
        session.require_not_ended()?;
        if session.players.len() < MIN_PLAYERS {
            return Err(GameError::NotEnoughPlayers {
                needed: MIN_PLAYERS,
                have: session.players.len(),
            });
        }

        session.status = SessionStatus::Active;
        tracing::info!(code = %session.code, players = session.players.len(), "Game started");
        begin_round(&mut session, materials);

        let snapshot = session.commit().await;
        Ok(project(&snapshot, Some(player_id)))
    }

    /// Apply a player's move to the current round
    pub async fn submit_move(&self, code: &str, player_id: &str, mv: Move) -> GameResult<SessionView> {
        let mut session = self.sessions.lock(code).await?;
        session.require_member(player_id)?;
        session.require_not_ended()?;
        if session.status != SessionStatus::Active {
            return Err(GameError::InvalidState("The game hasn't started yet".to_string()));
        }

        let present = session.present_ids();
        let round = session
            .round
            .as_mut()
            .ok_or_else(|| GameError::InvalidState("No round in progress".to_string()))?;
        round.apply(player_id, mv)?;
        let resolved = round.settle(&present);
        if resolved {
            on_round_resolved(&mut session);
        }

        let snapshot = session.commit().await;
        if resolved {
            self.record_card_wins(&snapshot).await;
        }
        Ok(project(&snapshot, Some(player_id)))
    }

    /// Credit the winning cards of a round that just resolved, after the commit
    pub(crate) async fn record_card_wins(&self, session: &SessionState) {
        let ids = session
            .round
            .as_ref()
            .map(|r| r.winning_quotes())
            .unwrap_or_default();
        if ids.is_empty() {
            return;
        }
        if let Err(e) = self.quotes.record_wins(&ids).await {
            tracing::warn!(code = %session.code, error = %e, "Could not record winning quotes");
        }
    }

    pub async fn submit_card(&self, code: &str, player_id: &str, card_index: usize) -> GameResult<SessionView> {
        self.submit_move(code, player_id, Move::Card { card_index }).await
    }

    pub async fn submit_vote(&self, code: &str, player_id: &str, entry_id: &str) -> GameResult<SessionView> {
        let mv = Move::Vote {
            entry_id: entry_id.to_string(),
        };
        self.submit_move(code, player_id, mv).await
    }

    pub async fn pick_winner(&self, code: &str, player_id: &str, entry_id: &str) -> GameResult<SessionView> {
        let mv = Move::Pick {
            entry_id: entry_id.to_string(),
        };
        self.submit_move(code, player_id, mv).await
    }

    pub async fn submit_redaction(
        &self,
        code: &str,
        player_id: &str,
        indices: Vec<usize>,
    ) -> GameResult<SessionView> {
        self.submit_move(code, player_id, Move::Redact { indices }).await
    }

    pub async fn submit_guess(
        &self,
        code: &str,
        player_id: &str,
        answers: Vec<String>,
    ) -> GameResult<SessionView> {
        self.submit_move(code, player_id, Move::Guess { answers }).await
    }

    /// Force the round forward one step, or open the next round from reveal.
    /// When the session has already moved past what `advance` names, or it
    /// ended, nothing happens and the current snapshot is returned.
    pub async fn advance_round(
        &self,
        code: &str,
        player_id: &str,
        advance: Advance,
    ) -> GameResult<SessionView> {
        let observed = self.sessions.snapshot(code).await?;
        observed.require_member(player_id)?;
        if observed.status == SessionStatus::Ended {
            return Ok(project(&observed, Some(player_id)));
        }
        if observed.status == SessionStatus::Waiting {
            return Err(GameError::InvalidState("The game hasn't started yet".to_string()));
        }

        let marker = current_marker(&observed);
        let in_reveal = observed.round.as_ref().map_or(true, |r| r.is_resolved());
        let applies = match advance {
            Advance::From(expected) => marker == Some(expected),
            Advance::Resolve => !in_reveal,
            Advance::NextRound => in_reveal,
        };
        if !applies {
            tracing::debug!(code = %observed.code, ?advance, ?marker, "Stale advance ignored");
            return Ok(project(&observed, Some(player_id)));
        }

        let materials = if in_reveal {
            observed.require_host(player_id)?;
            self.fetch_materials(&observed).await?
        } else {
            None
        };

        let mut session = self.sessions.lock(code).await?;
        session.require_member(player_id)?;
        if session.status != SessionStatus::Active || current_marker(&session) != marker {
            let snapshot = session.release().await;
            return Ok(project(&snapshot, Some(player_id)));
        }

        let mut resolved = false;
        if in_reveal {
            begin_round(&mut session, materials);
        } else {
            let is_host = session.is_host(player_id);
            let present = session.present_ids();
            let Some(round) = session.round.as_mut() else {
                return Err(GameError::Internal("Round vanished while locked".to_string()));
            };
            let judge_closing_cards = matches!(round.play, RoundPlay::JudgePick(_))
                && round.is_leader(player_id)
                && round.status == RoundStatus::Collecting;
            if !is_host && !judge_closing_cards {
                return Err(GameError::Forbidden(
                    "Only the host can move the round along".to_string(),
                ));
            }

            resolved = round.force() || round.settle(&present);
            if resolved {
                on_round_resolved(&mut session);
            }
        }

        let snapshot = session.commit().await;
        if resolved {
            self.record_card_wins(&snapshot).await;
        }
        Ok(project(&snapshot, Some(player_id)))
    }

    /// Host ends the game. Ending an ended game is a no-op.
    pub async fn end_game(&self, code: &str, player_id: &str) -> GameResult<SessionView> {
        let mut session = self.sessions.lock(code).await?;
        if session.status == SessionStatus::Ended {
            let snapshot = session.release().await;
            return Ok(project(&snapshot, Some(player_id)));
        }
        session.require_host(player_id)?;
        session.end(EndReason::HostEnded);

        let snapshot = session.commit().await;
        Ok(project(&snapshot, Some(player_id)))
    }
}
