//! Viewer-relative projection of a committed session.
//!
//! Nothing another player submitted is visible before the phase that shows
//! it: cards stay face down while they are played, guesses and answers stay
//! hidden until reveal, and scores only move when a round resolves.

use super::session::SessionState;
use super::AppState;
use crate::error::{GameError, GameResult};
use crate::protocol::*;
use crate::strategy::cards::{CardTable, PlayedCard};
use crate::strategy::ranking::GuessLedger;
use crate::strategy::{Round, RoundPlay};
use crate::types::*;

impl AppState {
    /// Read the last committed state without waiting on writers.
    /// Without a `viewer` the caller gets the spectator view.
    pub async fn get_snapshot(&self, code: &str, viewer: Option<&str>) -> GameResult<SessionView> {
        let session = self.sessions.snapshot(code).await?;
        if let Some(id) = viewer {
            if !session.is_member(id) {
                return Err(GameError::not_a_member());
            }
        }
        Ok(project(&session, viewer))
    }
}

/// Whether `player_id` is expected to act in the round's current phase
fn expected_to_act(round: &Round, player_id: &str) -> bool {
    if !round.is_participant(player_id) {
        return false;
    }
    let is_leader = round.is_leader(player_id);
    match (&round.play, round.status) {
        (RoundPlay::JudgePick(_), RoundStatus::Collecting) => !is_leader,
        (RoundPlay::AllVote(_), RoundStatus::Collecting) => true,
        (RoundPlay::Redaction(_), RoundStatus::Collecting) => is_leader,
        (RoundPlay::JudgePick(_), RoundStatus::Judging) => is_leader,
        (RoundPlay::AllVote(table), RoundStatus::Judging) => table.has_played(player_id),
        (RoundPlay::Redaction(_), RoundStatus::Guessing) => !is_leader,
        (RoundPlay::AuthorChoice(_), RoundStatus::Guessing) => true,
        _ => false,
    }
}

fn has_acted(round: &Round, player_id: &str) -> bool {
    match (&round.play, round.status) {
        (RoundPlay::JudgePick(table) | RoundPlay::AllVote(table), RoundStatus::Collecting) => {
            table.has_played(player_id)
        }
        (RoundPlay::Redaction(puzzle), RoundStatus::Collecting) => puzzle.is_redacted(),
        (RoundPlay::JudgePick(table), RoundStatus::Judging) => table.pick().is_some(),
        (RoundPlay::AllVote(table), RoundStatus::Judging) => table.vote_of(player_id).is_some(),
        (RoundPlay::Redaction(puzzle), RoundStatus::Guessing) => {
            puzzle.guesses.has_answered(player_id)
        }
        (RoundPlay::AuthorChoice(quiz), RoundStatus::Guessing) => quiz.guesses.has_answered(player_id),
        _ => false,
    }
}

fn display_name(session: &SessionState, player_id: &str) -> String {
    session
        .player(player_id)
        .map(|p| p.display_name.clone())
        .unwrap_or_else(|| "Player who left".to_string())
}

/// Project `session` for `viewer`. Unknown viewers get the spectator view.
pub fn project(session: &SessionState, viewer: Option<&str>) -> SessionView {
    let viewer = viewer.and_then(|id| session.player(id));
    let round = session.round.as_ref();
    let active = session.status == SessionStatus::Active;

    let players = session
        .players
        .iter()
        .map(|p| PlayerView {
            id: p.id.clone(),
            display_name: p.display_name.clone(),
            seat: p.seat,
            score: p.score,
            is_host: session.is_host(&p.id),
            is_leader: round.is_some_and(|r| r.is_leader(&p.id)),
            has_submitted: round
                .is_some_and(|r| expected_to_act(r, &p.id) && has_acted(r, &p.id)),
        })
        .collect();

    SessionView {
        code: session.code.clone(),
        game: session.game,
        game_name: session.game.display_name().to_string(),
        status: session.status,
        version: session.version,
        host_id: session.host_id.clone(),
        config: session.config.clone(),
        round_number: session.round_number,
        players,
        viewer: viewer_info(session, viewer, active),
        round: round.map(|r| round_view(session, r, viewer.map(|p| p.id.as_str()))),
        history: session.history.clone(),
        ended_reason: session.end_reason,
        ended_message: (session.status == SessionStatus::Ended).then(|| session.end_message()),
        updated_at: session.updated_at.clone(),
    }
}

fn viewer_info(session: &SessionState, viewer: Option<&Player>, active: bool) -> ViewerInfo {
    let Some(player) = viewer else {
        return ViewerInfo::default();
    };
    let id = player.id.as_str();
    let is_host = session.is_host(id);
    let mut info = ViewerInfo {
        player_id: Some(player.id.clone()),
        display_name: Some(player.display_name.clone()),
        is_host,
        can_start: is_host
            && session.status == SessionStatus::Waiting
            && session.players.len() >= MIN_PLAYERS,
        can_end: is_host && session.status != SessionStatus::Ended,
        ..Default::default()
    };

    let Some(round) = session.round.as_ref() else {
        return info;
    };
    let is_leader = round.is_leader(id);
    info.is_judge = is_leader && matches!(round.play, RoundPlay::JudgePick(_));
    info.is_redactor = is_leader && matches!(round.play, RoundPlay::Redaction(_));
    info.is_participant = round.is_participant(id);

    if !active {
        return info;
    }
    let pending = expected_to_act(round, id) && !has_acted(round, id);
    match round.status {
        RoundStatus::Collecting | RoundStatus::Guessing => info.can_submit = pending,
        RoundStatus::Judging => match round.play {
            RoundPlay::JudgePick(_) => info.can_pick_winner = pending,
            _ => info.can_vote = pending,
        },
        RoundStatus::Reveal => {}
    }
    info.can_advance = is_host || (info.is_judge && round.status == RoundStatus::Collecting);
    info
}

fn round_view(session: &SessionState, round: &Round, viewer: Option<&str>) -> RoundView {
    let (submitted_count, required_count) = session
        .players
        .iter()
        .filter(|p| expected_to_act(round, &p.id))
        .fold((0, 0), |(done, total), p| {
            (done + usize::from(has_acted(round, &p.id)), total + 1)
        });

    let detail = match &round.play {
        RoundPlay::JudgePick(table) | RoundPlay::AllVote(table) => {
            cards_detail(session, round, table, viewer)
        }
        RoundPlay::Redaction(puzzle) => {
            let revealed = round.is_resolved();
            let sees_source = revealed || viewer.is_some_and(|id| round.is_leader(id));
            let sees_puzzle = puzzle.is_redacted() && round.status != RoundStatus::Collecting;
            RoundDetail::Redaction {
                word_count: puzzle.word_count(),
                max_redactions: puzzle.max_redactions(),
                gap_count: puzzle.gap_count(),
                source_words: sees_source
                    .then(|| puzzle.words().into_iter().map(String::from).collect()),
                puzzle_text: sees_puzzle.then(|| puzzle.puzzle_text().to_string()),
                my_answer: viewer
                    .and_then(|id| puzzle.guesses.get(id))
                    .map(|g| g.answer.clone()),
                answers: revealed.then(|| puzzle.answer_words()),
                guesses: revealed_guesses(session, round, &puzzle.guesses),
            }
        }
        RoundPlay::AuthorChoice(quiz) => RoundDetail::AuthorChoice {
            quote_text: quiz.quote.text.clone(),
            options: quiz.options().to_vec(),
            my_answer: viewer
                .and_then(|id| quiz.guesses.get(id))
                .and_then(|g| g.answer.first().cloned()),
            answer: round.is_resolved().then(|| quiz.answer().to_string()),
            guesses: revealed_guesses(session, round, &quiz.guesses),
        },
    };

    let outcome = round
        .outcome
        .as_ref()
        .filter(|_| round.is_resolved())
        .map(|outcome| OutcomeView {
            winners: outcome
                .winners
                .iter()
                .map(|id| PlayerBrief {
                    id: id.clone(),
                    display_name: display_name(session, id),
                })
                .collect(),
            awards: outcome
                .awards
                .iter()
                .map(|a| AwardView {
                    player_id: a.player_id.clone(),
                    display_name: display_name(session, &a.player_id),
                    points: a.points,
                    rank: a.rank,
                })
                .collect(),
            voided: outcome.voided,
        });

    RoundView {
        number: round.number,
        status: round.status,
        leader_id: round.leader.clone(),
        leader_name: round.leader.as_deref().map(|id| display_name(session, id)),
        submitted_count,
        required_count,
        detail,
        outcome,
    }
}

fn cards_detail(
    session: &SessionState,
    round: &Round,
    table: &CardTable,
    viewer: Option<&str>,
) -> RoundDetail {
    let all_vote = matches!(round.play, RoundPlay::AllVote(_));
    let mine = viewer.and_then(|id| table.played_by(id));

    let entries = match round.status {
        RoundStatus::Collecting => mine.map(|card| vec![anonymous_entry(card)]).unwrap_or_default(),
        RoundStatus::Judging => {
            let may_see = viewer.is_some_and(|id| {
                if all_vote {
                    round.is_participant(id)
                } else {
                    round.is_leader(id)
                }
            });
            if may_see {
                table.played().iter().map(anonymous_entry).collect()
            } else {
                mine.map(|card| vec![anonymous_entry(card)]).unwrap_or_default()
            }
        }
        _ => {
            let tally = table.tally();
            table
                .played()
                .iter()
                .map(|card| EntryView {
                    player_id: Some(card.player_id.clone()),
                    player_name: Some(display_name(session, &card.player_id)),
                    votes: all_vote.then(|| tally.get(&card.entry_id).copied().unwrap_or(0)),
                    ..anonymous_entry(card)
                })
                .collect()
        }
    };

    RoundDetail::Cards {
        prompt: table.prompt.clone(),
        hand: viewer
            .filter(|_| round.status == RoundStatus::Collecting)
            .and_then(|id| table.hand(id))
            .map(|hand| hand.to_vec()),
        my_entry_id: mine.map(|card| card.entry_id.clone()),
        my_vote: viewer
            .and_then(|id| table.vote_of(id))
            .map(String::from),
        entries,
    }
}

fn anonymous_entry(card: &PlayedCard) -> EntryView {
    EntryView {
        entry_id: card.entry_id.clone(),
        text: card.quote.text.clone(),
        authors: card.quote.authors.clone(),
        player_id: None,
        player_name: None,
        votes: None,
    }
}

fn revealed_guesses(session: &SessionState, round: &Round, ledger: &GuessLedger) -> Vec<GuessView> {
    if !round.is_resolved() {
        return Vec::new();
    }
    ledger
        .entries()
        .iter()
        .map(|g| GuessView {
            player_id: g.player_id.clone(),
            display_name: display_name(session, &g.player_id),
            answer: g.answer.clone(),
            correct: g.correct,
            rank: g.rank,
        })
        .collect()
}
