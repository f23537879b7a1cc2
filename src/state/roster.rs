use super::session::SessionState;
use super::snapshot::project;
use super::AppState;
use crate::error::{GameError, GameResult};
use crate::protocol::{CreateSessionRequest, SessionView};
use crate::text::sanitize_display_name;
use crate::types::*;

fn new_player(display_name: &str, seat: u32) -> Player {
    Player {
        id: ulid::Ulid::new().to_string(),
        display_name: sanitize_display_name(display_name),
        seat,
        score: 0,
        joined_at: chrono::Utc::now().to_rfc3339(),
    }
}

impl AppState {
    /// Open a new session with the creator as host in seat 1
    pub async fn create_session(
        &self,
        game: GameKind,
        request: CreateSessionRequest,
    ) -> GameResult<SessionView> {
        self.ensure_capacity(game).await?;

        let host = new_player(&request.player_name, 1);
        let host_id = host.id.clone();
        let config = SessionConfig::for_game(
            game,
            request.judging_mode,
            request.max_players,
            request.max_rounds,
        );
        let allow_midgame_join = self.config.allow_midgame_join;

        let snapshot = self
            .sessions
            .insert_new(|code| {
                let mut session = SessionState::new(code, game, config, host);
                session.allow_midgame_join = allow_midgame_join;
                session
            })
            .await?;

        tracing::info!(
            code = %snapshot.code,
            game = %game,
            host = %host_id,
            "Session created"
        );
        Ok(project(&snapshot, Some(&host_id)))
    }

    /// Join a session, or reconnect when `existing_id` is already seated
    pub async fn join_session(
        &self,
        code: &str,
        display_name: &str,
        existing_id: Option<&str>,
    ) -> GameResult<SessionView> {
        let mut session = self.sessions.lock(code).await?;

        if let Some(id) = existing_id.filter(|id| session.is_member(id)) {
            let id = id.to_string();
            let renamed = (!display_name.trim().is_empty())
                .then(|| sanitize_display_name(display_name))
                .filter(|name| session.player(&id).is_some_and(|p| &p.display_name != name));

            let snapshot = match renamed {
                Some(name) => {
                    if let Some(player) = session.players.iter_mut().find(|p| p.id == id) {
                        player.display_name = name;
                    }
                    session.commit().await
                }
                None => session.release().await,
            };
            tracing::debug!(code = %snapshot.code, player = %id, "Player reconnected");
            return Ok(project(&snapshot, Some(&id)));
        }

        match session.status {
            SessionStatus::Ended => {
                return Err(GameError::SessionNotJoinable(
                    "This game has already ended".to_string(),
                ))
            }
            SessionStatus::Active if !session.allow_midgame_join => {
                return Err(GameError::SessionNotJoinable(
                    "This game has already started".to_string(),
                ))
            }
            _ => {}
        }
        if session.players.len() >= session.config.max_players {
            return Err(GameError::SessionFull(session.config.max_players));
        }

        let player = new_player(display_name, session.next_seat());
        let player_id = player.id.clone();
        tracing::info!(
            code = %session.code,
            player = %player_id,
            seat = player.seat,
            "Player joined"
        );
        session.players.push(player);

        let snapshot = session.commit().await;
        Ok(project(&snapshot, Some(&player_id)))
    }

    /// Remove a player. Leaving twice, or leaving an ended session, is a no-op.
    pub async fn leave_session(&self, code: &str, player_id: &str) -> GameResult<SessionView> {
        let mut session = self.sessions.lock(code).await?;

        if !session.is_member(player_id) || session.status == SessionStatus::Ended {
            let snapshot = session.release().await;
            return Ok(project(&snapshot, None));
        }

        session.players.retain(|p| p.id != player_id);
        tracing::info!(code = %session.code, player = %player_id, "Player left");

        if session.players.is_empty() {
            session.end(EndReason::NotEnoughPlayers);
            let snapshot = session.commit().await;
            self.sessions.remove(&snapshot.code).await;
            tracing::info!(code = %snapshot.code, "Last player left, session removed");
            return Ok(project(&snapshot, None));
        }

        if session.is_host(player_id) {
            if session.status == SessionStatus::Waiting {
                session.end(EndReason::HostLeft);
            } else if let Some(next) = session.players.iter().min_by_key(|p| p.seat) {
                let next_id = next.id.clone();
                tracing::info!(code = %session.code, host = %next_id, "Host role passed on");
                session.host_id = next_id;
            }
        }

        let mut resolved = false;
        if session.status == SessionStatus::Active {
            if session.players.len() < MIN_PLAYERS {
                session.end(EndReason::NotEnoughPlayers);
            } else {
                let present = session.present_ids();
                resolved = session
                    .round
                    .as_mut()
                    .is_some_and(|round| round.settle(&present));
                if resolved {
                    super::round::on_round_resolved(&mut session);
                }
            }
        }

        let snapshot = session.commit().await;
        if resolved {
            self.record_card_wins(&snapshot).await;
        }
        Ok(project(&snapshot, None))
    }
}
