use futures::future::join_all;
use quote_party::config::AppConfig;
use quote_party::error::GameError;
use quote_party::prompts::PromptDeck;
use quote_party::protocol::{Advance, CreateSessionRequest, RoundDetail, RoundMarker, SessionView};
use quote_party::quotes::StaticQuoteSupply;
use quote_party::state::AppState;
use quote_party::types::*;
use std::sync::Arc;

fn quote_book(n: u64) -> Vec<Quote> {
    let authors = ["Ada", "Bob", "Cy", "Dee", "Eve"];
    (1..=n)
        .map(|id| {
            Quote::new(
                id,
                format!(
                    "Meeting note {} insists that the printer jammed again before lunch",
                    id
                ),
                &[authors[(id as usize) % authors.len()]],
            )
        })
        .collect()
}

fn app_with(quotes: Vec<Quote>, config: AppConfig) -> Arc<AppState> {
    Arc::new(AppState::new(
        Arc::new(StaticQuoteSupply::new(quotes)),
        PromptDeck::default(),
        config,
    ))
}

fn app() -> Arc<AppState> {
    app_with(quote_book(60), AppConfig::default())
}

struct Party {
    state: Arc<AppState>,
    code: String,
    ids: Vec<PlayerId>,
}

impl Party {
    async fn seat(state: Arc<AppState>, game: GameKind, request: CreateSessionRequest, guests: &[&str]) -> Self {
        let view = state.create_session(game, request).await.unwrap();
        let mut ids = vec![view.host_id.clone()];
        for name in guests {
            let joined = state.join_session(&view.code, name, None).await.unwrap();
            ids.push(joined.viewer.player_id.unwrap());
        }
        Party {
            state,
            code: view.code,
            ids,
        }
    }

    async fn view(&self, who: usize) -> SessionView {
        self.state.get_snapshot(&self.code, Some(&self.ids[who])).await.unwrap()
    }

    fn host(&self) -> &str {
        &self.ids[0]
    }
}

fn host_request(mode: JudgingMode, max_rounds: u32) -> CreateSessionRequest {
    CreateSessionRequest {
        player_name: "Ana".to_string(),
        judging_mode: Some(mode),
        max_players: None,
        max_rounds: Some(max_rounds),
    }
}

fn my_entry(view: &SessionView) -> String {
    match &view.round.as_ref().unwrap().detail {
        RoundDetail::Cards { my_entry_id, .. } => my_entry_id.clone().expect("card played"),
        other => panic!("expected cards, got {:?}", other),
    }
}

fn scores(view: &SessionView) -> Vec<u32> {
    view.players.iter().map(|p| p.score).collect()
}

#[tokio::test]
async fn test_judge_pick_rotation_and_scoring() {
    let party = Party::seat(app(), GameKind::QuoteAnarchy, host_request(JudgingMode::Judge, 8), &["Ben", "Cat"]).await;
    let (a, b, c) = (&party.ids[0], &party.ids[1], &party.ids[2]);

    let started = party.state.start_game(&party.code, a).await.unwrap();
    assert_eq!(started.round.as_ref().unwrap().leader_id.as_deref(), Some(a.as_str()));

    let ben = party.state.submit_card(&party.code, b, 0).await.unwrap();
    party.state.submit_card(&party.code, c, 3).await.unwrap();
    let revealed = party.state.pick_winner(&party.code, a, &my_entry(&ben)).await.unwrap();

    let round = revealed.round.as_ref().unwrap();
    assert_eq!(round.status, RoundStatus::Reveal);
    assert_eq!(round.outcome.as_ref().unwrap().winners[0].id, *b);
    assert_eq!(scores(&revealed), vec![0, 1, 0]);
    assert_eq!(revealed.history.len(), 1);
    assert_eq!(revealed.history[0].winner_names, vec!["Ben".to_string()]);

    let next = party.state.advance_round(&party.code, a, Advance::NextRound).await.unwrap();
    assert_eq!(next.round_number, 2);
    assert_eq!(next.round.as_ref().unwrap().leader_id.as_deref(), Some(b.as_str()));
    assert_eq!(scores(&next), vec![0, 1, 0]);

    // The judge never holds a hand
    let judge_view = party.view(1).await;
    match &judge_view.round.unwrap().detail {
        RoundDetail::Cards { hand, .. } => assert!(hand.is_none()),
        other => panic!("unexpected detail {:?}", other),
    }
}

#[tokio::test]
async fn test_concurrent_card_plays_each_land_once() {
    let party = Party::seat(
        app(),
        GameKind::QuoteAnarchy,
        host_request(JudgingMode::AllVote, 8),
        &["Ben", "Cat", "Dan"],
    )
    .await;
    party.state.start_game(&party.code, party.host()).await.unwrap();

    let plays = vec![
        party.state.submit_card(&party.code, &party.ids[0], 0),
        party.state.submit_card(&party.code, &party.ids[0], 1),
        party.state.submit_card(&party.code, &party.ids[1], 0),
        party.state.submit_card(&party.code, &party.ids[2], 0),
        party.state.submit_card(&party.code, &party.ids[3], 0),
    ];
    let results = join_all(plays).await;

    let accepted = results.iter().filter(|r| r.is_ok()).count();
    let rejected: Vec<&GameError> = results.iter().filter_map(|r| r.as_ref().err()).collect();
    assert_eq!(accepted, 4);
    assert_eq!(rejected.len(), 1);
    assert!(matches!(
        rejected[0],
        GameError::AlreadySubmitted | GameError::InvalidState(_)
    ));

    let view = party.view(0).await;
    assert_eq!(view.round.as_ref().unwrap().status, RoundStatus::Judging);
    match &view.round.unwrap().detail {
        RoundDetail::Cards { entries, .. } => assert_eq!(entries.len(), 4),
        other => panic!("unexpected detail {:?}", other),
    }
}

#[tokio::test]
async fn test_all_vote_tie_rewards_both() {
    let party = Party::seat(
        app(),
        GameKind::QuoteAnarchy,
        host_request(JudgingMode::AllVote, 8),
        &["Ben", "Cat", "Dan"],
    )
    .await;
    party.state.start_game(&party.code, party.host()).await.unwrap();

    let mut entries = Vec::new();
    for id in &party.ids {
        let view = party.state.submit_card(&party.code, id, 0).await.unwrap();
        entries.push(my_entry(&view));
    }

    let err = party
        .state
        .submit_vote(&party.code, &party.ids[0], &entries[0])
        .await
        .unwrap_err();
    assert!(matches!(err, GameError::Validation(_)));

    party.state.submit_vote(&party.code, &party.ids[0], &entries[1]).await.unwrap();
    party.state.submit_vote(&party.code, &party.ids[1], &entries[0]).await.unwrap();
    party.state.submit_vote(&party.code, &party.ids[2], &entries[0]).await.unwrap();
    let view = party.state.submit_vote(&party.code, &party.ids[3], &entries[1]).await.unwrap();

    let outcome = view.round.as_ref().unwrap().outcome.clone().unwrap();
    let mut winners: Vec<String> = outcome.winners.iter().map(|w| w.display_name.clone()).collect();
    winners.sort();
    assert_eq!(winners, vec!["Ana".to_string(), "Ben".to_string()]);
    assert_eq!(scores(&view), vec![1, 1, 0, 0]);
}

#[tokio::test]
async fn test_first_correct_guess_ranks_first() {
    let party = Party::seat(
        app(),
        GameKind::BlacklineRush,
        host_request(JudgingMode::Judge, 8),
        &["Ben", "Cat", "Dan"],
    )
    .await;
    party.state.start_game(&party.code, party.host()).await.unwrap();

    let redactor = party.view(0).await;
    assert!(redactor.viewer.is_redactor);
    let hidden = match &redactor.round.unwrap().detail {
        RoundDetail::Redaction { source_words, .. } => source_words.clone().unwrap()[6].clone(),
        other => panic!("unexpected detail {:?}", other),
    };
    assert_eq!(hidden, "printer");
    party.state.submit_redaction(&party.code, party.host(), vec![6]).await.unwrap();

    let cat = party
        .state
        .submit_guess(&party.code, &party.ids[2], vec!["PRINTER".into()])
        .await
        .unwrap();
    // Points wait for the reveal
    assert_eq!(scores(&cat), vec![0, 0, 0, 0]);
    party
        .state
        .submit_guess(&party.code, &party.ids[1], vec!["printer".into()])
        .await
        .unwrap();
    let view = party
        .state
        .submit_guess(&party.code, &party.ids[3], vec!["stapler".into()])
        .await
        .unwrap();

    let round = view.round.as_ref().unwrap();
    assert_eq!(round.status, RoundStatus::Reveal);
    let outcome = round.outcome.as_ref().unwrap();
    assert_eq!(outcome.winners[0].display_name, "Cat");
    assert_eq!(outcome.awards[0].points, 3);
    assert_eq!(outcome.awards[0].rank, Some(1));
    assert_eq!(scores(&view), vec![0, 2, 3, 0]);
}

#[tokio::test]
async fn test_redaction_limit_for_ten_word_quote() {
    let state = app_with(
        vec![Quote::new(1, "one two three four five six seven eight nine ten", &["Ada"])],
        AppConfig::default(),
    );
    let party = Party::seat(state, GameKind::BlacklineRush, host_request(JudgingMode::Judge, 8), &["Ben"]).await;
    party.state.start_game(&party.code, party.host()).await.unwrap();

    let err = party
        .state
        .submit_redaction(&party.code, party.host(), vec![1, 2])
        .await
        .unwrap_err();
    assert!(matches!(err, GameError::Validation(_)));

    let err = party
        .state
        .submit_redaction(&party.code, &party.ids[1], vec![1])
        .await
        .unwrap_err();
    assert!(matches!(err, GameError::Forbidden(_)));

    let view = party.state.submit_redaction(&party.code, party.host(), vec![1]).await.unwrap();
    assert_eq!(view.round.as_ref().unwrap().status, RoundStatus::Guessing);
}

#[tokio::test]
async fn test_advance_with_marker_is_idempotent() {
    let party = Party::seat(app(), GameKind::WhoSaidIt, host_request(JudgingMode::Judge, 8), &["Ben"]).await;
    party.state.start_game(&party.code, party.host()).await.unwrap();

    let guessing = RoundMarker {
        round_number: 1,
        status: RoundStatus::Guessing,
    };
    let revealed = party
        .state
        .advance_round(&party.code, party.host(), Advance::From(guessing))
        .await
        .unwrap();
    assert_eq!(revealed.round.as_ref().unwrap().status, RoundStatus::Reveal);

    let stale = party
        .state
        .advance_round(&party.code, party.host(), Advance::From(guessing))
        .await
        .unwrap();
    assert_eq!(stale.version, revealed.version);

    let reveal = RoundMarker {
        round_number: 1,
        status: RoundStatus::Reveal,
    };
    let first = party.state.advance_round(&party.code, party.host(), Advance::From(reveal)).await.unwrap();
    let second = party.state.advance_round(&party.code, party.host(), Advance::From(reveal)).await.unwrap();
    assert_eq!(first.round_number, 2);
    assert_eq!(second.round_number, 2);
    assert_eq!(first.version, second.version);
}

#[tokio::test]
async fn test_round_numbers_and_scores_only_grow_until_max_rounds() {
    let party = Party::seat(app(), GameKind::WhoSaidIt, host_request(JudgingMode::Judge, 3), &["Ben"]).await;
    party.state.start_game(&party.code, party.host()).await.unwrap();

    let mut last_round = 1;
    let mut last_scores = vec![0, 0];
    loop {
        let view = party.view(0).await;
        if view.status == SessionStatus::Ended {
            break;
        }
        let options = match &view.round.as_ref().unwrap().detail {
            RoundDetail::AuthorChoice { options, .. } => options.clone(),
            other => panic!("unexpected detail {:?}", other),
        };
        for id in &party.ids {
            party
                .state
                .submit_guess(&party.code, id, vec![options[0].clone()])
                .await
                .unwrap();
        }
        let after = party.view(1).await;
        assert!(scores(&after).iter().zip(&last_scores).all(|(now, before)| now >= before));
        last_scores = scores(&after);

        let next = party.state.advance_round(&party.code, party.host(), Advance::NextRound).await.unwrap();
        assert!(next.round_number >= last_round);
        assert!(next.round_number <= last_round + 1);
        last_round = next.round_number;
    }

    let ended = party.view(1).await;
    assert_eq!(ended.round_number, 3);
    assert_eq!(ended.ended_reason, Some(EndReason::MaxRounds));
    assert_eq!(ended.ended_message.as_deref(), Some("Game ended after 3 rounds."));
    assert_eq!(ended.history.len(), 3);
    assert_eq!(ended.round.as_ref().unwrap().status, RoundStatus::Reveal);

    let err = party.state.start_game(&party.code, party.host()).await.unwrap_err();
    assert!(matches!(err, GameError::InvalidState(_)));
}

#[tokio::test]
async fn test_midgame_join_waits_for_next_round() {
    let config = AppConfig {
        allow_midgame_join: true,
        ..Default::default()
    };
    let party = Party::seat(
        app_with(quote_book(60), config),
        GameKind::WhoSaidIt,
        host_request(JudgingMode::Judge, 8),
        &["Ben"],
    )
    .await;
    party.state.start_game(&party.code, party.host()).await.unwrap();

    let late = party.state.join_session(&party.code, "Liz", None).await.unwrap();
    let liz = late.viewer.player_id.clone().unwrap();
    assert!(!late.viewer.is_participant);
    assert!(!late.viewer.can_submit);

    let err = party
        .state
        .submit_guess(&party.code, &liz, vec!["Ada".into()])
        .await
        .unwrap_err();
    assert!(matches!(err, GameError::Forbidden(_)));

    party.state.advance_round(&party.code, party.host(), Advance::Resolve).await.unwrap();
    party.state.advance_round(&party.code, party.host(), Advance::NextRound).await.unwrap();
    let next = party.state.get_snapshot(&party.code, Some(&liz)).await.unwrap();
    assert_eq!(next.round_number, 2);
    assert!(next.viewer.is_participant);
    assert!(next.viewer.can_submit);
}

#[tokio::test]
async fn test_midgame_join_refused_by_default() {
    let party = Party::seat(app(), GameKind::WhoSaidIt, host_request(JudgingMode::Judge, 8), &["Ben"]).await;
    party.state.start_game(&party.code, party.host()).await.unwrap();

    let err = party.state.join_session(&party.code, "Liz", None).await.unwrap_err();
    assert!(matches!(err, GameError::SessionNotJoinable(_)));
}

#[tokio::test]
async fn test_collecting_snapshots_never_leak_cards() {
    let party = Party::seat(
        app(),
        GameKind::QuoteAnarchy,
        host_request(JudgingMode::Judge, 8),
        &["Ben", "Cat"],
    )
    .await;
    party.state.start_game(&party.code, party.host()).await.unwrap();
    let ben = party.state.submit_card(&party.code, &party.ids[1], 2).await.unwrap();
    let entry = my_entry(&ben);

    for who in [0, 2] {
        let json = serde_json::to_string(&party.view(who).await).unwrap();
        assert!(!json.contains(&entry));
    }
    let spectator = party.state.get_snapshot(&party.code, None).await.unwrap();
    assert!(!serde_json::to_string(&spectator).unwrap().contains(&entry));
}

#[tokio::test]
async fn test_judge_leaving_voids_round_and_host_passes() {
    let party = Party::seat(
        app(),
        GameKind::QuoteAnarchy,
        host_request(JudgingMode::Judge, 8),
        &["Ben", "Cat"],
    )
    .await;
    party.state.start_game(&party.code, party.host()).await.unwrap();
    party.state.submit_card(&party.code, &party.ids[1], 0).await.unwrap();

    party.state.leave_session(&party.code, party.host()).await.unwrap();
    let view = party.view(1).await;
    assert_eq!(view.status, SessionStatus::Active);
    assert_eq!(view.host_id, party.ids[1]);
    let round = view.round.as_ref().unwrap();
    assert_eq!(round.status, RoundStatus::Reveal);
    assert!(round.outcome.as_ref().unwrap().voided);

    party.state.leave_session(&party.code, &party.ids[2]).await.unwrap();
    let view = party.view(1).await;
    assert_eq!(view.status, SessionStatus::Ended);
    assert_eq!(view.ended_reason, Some(EndReason::NotEnoughPlayers));
}

#[tokio::test]
async fn test_redactor_leaving_after_redacting_keeps_round_alive() {
    let party = Party::seat(
        app(),
        GameKind::BlacklineRush,
        host_request(JudgingMode::Judge, 8),
        &["Ben", "Cat", "Dan"],
    )
    .await;
    party.state.start_game(&party.code, party.host()).await.unwrap();
    party.state.submit_redaction(&party.code, party.host(), vec![6]).await.unwrap();
    party
        .state
        .submit_guess(&party.code, &party.ids[2], vec!["printer".into()])
        .await
        .unwrap();

    party.state.leave_session(&party.code, party.host()).await.unwrap();
    let ben = party.view(1).await;
    assert_eq!(ben.round.as_ref().unwrap().status, RoundStatus::Guessing);
    assert!(ben.viewer.can_submit);

    party
        .state
        .submit_guess(&party.code, &party.ids[1], vec!["printer".into()])
        .await
        .unwrap();
    let view = party
        .state
        .submit_guess(&party.code, &party.ids[3], vec!["stapler".into()])
        .await
        .unwrap();

    let round = view.round.as_ref().unwrap();
    assert_eq!(round.status, RoundStatus::Reveal);
    assert!(!round.outcome.as_ref().unwrap().voided);
    assert_eq!(scores(&view), vec![2, 3, 0]);
}
