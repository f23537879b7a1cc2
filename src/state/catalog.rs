use super::AppState;
use crate::error::{GameError, GameResult};
use crate::protocol::{GameInfo, SoloHand};
use crate::quotes::QuoteFilter;
use crate::strategy::{author_choice, cards, redaction};
use crate::types::*;

/// The card game needs a deep deck before it unlocks
pub const MIN_QUOTES_FOR_CARDS: usize = 50;

impl AppState {
    /// Describe a game and whether the quote book can support it
    pub async fn bootstrap(&self, game: GameKind) -> GameResult<GameInfo> {
        let total = self.quotes.count(&QuoteFilter::any()).await?;

        let mut info = GameInfo {
            game,
            game_name: game.display_name().to_string(),
            min_players: MIN_PLAYERS,
            max_players: game.max_players(),
            default_max_rounds: DEFAULT_MAX_ROUNDS,
            max_rounds_limit: MAX_ROUNDS_LIMIT,
            rule: String::new(),
            judging_modes: Vec::new(),
            hand_size: None,
            min_quotes_required: None,
            min_words_for_quote: None,
            options_per_question: None,
            author_pool_count: None,
            eligible_quote_count: total,
            total_quote_count: total,
            ready: false,
        };

        match game {
            GameKind::QuoteAnarchy => {
                info.rule = "Play the quote that best fills the blank.".to_string();
                info.judging_modes = vec![JudgingMode::Judge, JudgingMode::AllVote];
                info.hand_size = Some(cards::HAND_SIZE);
                info.min_quotes_required = Some(MIN_QUOTES_FOR_CARDS);
                info.ready = total >= MIN_QUOTES_FOR_CARDS;
            }
            GameKind::BlacklineRush => {
                let eligible = self
                    .quotes
                    .count(&QuoteFilter::any().min_words(redaction::MIN_WORDS_FOR_QUOTE))
                    .await?;
                info.rule =
                    "Redactor can remove up to one word for every ten words in the quote.".to_string();
                info.min_words_for_quote = Some(redaction::MIN_WORDS_FOR_QUOTE);
                info.eligible_quote_count = eligible;
                info.ready = eligible > 0;
            }
            GameKind::WhoSaidIt => {
                let eligible = self.quotes.count(&QuoteFilter::any().single_author()).await?;
                let authors = self.quotes.authors().await?.len();
                info.rule = "Correct answers score by speed rank each round.".to_string();
                info.options_per_question = Some(author_choice::OPTIONS_PER_QUESTION);
                info.author_pool_count = Some(authors);
                info.eligible_quote_count = eligible;
                info.ready = eligible > 0 && authors >= author_choice::OPTIONS_PER_QUESTION;
            }
        }

        Ok(info)
    }

    /// Deal one prompt and a full hand outside any session
    pub async fn deal_solo_hand(&self, game: GameKind) -> GameResult<SoloHand> {
        if game != GameKind::QuoteAnarchy {
            return Err(GameError::Validation(format!(
                "{} has no solo hands",
                game.display_name()
            )));
        }
        self.ensure_capacity(game).await?;

        let hand = self.quotes.sample(cards::HAND_SIZE, &QuoteFilter::any()).await?;
        tracing::debug!(cards = hand.len(), "Dealt solo hand");
        Ok(SoloHand {
            prompt: self.prompts.draw(),
            hand,
            dealt_at: chrono::Utc::now().to_rfc3339(),
        })
    }

    /// Refuse to open a session the quote book cannot feed
    pub(crate) async fn ensure_capacity(&self, game: GameKind) -> GameResult<()> {
        let info = self.bootstrap(game).await?;
        if info.ready {
            return Ok(());
        }

        let reason = match game {
            GameKind::QuoteAnarchy => format!(
                "{} needs at least {} quotes (have {})",
                info.game_name, MIN_QUOTES_FOR_CARDS, info.total_quote_count
            ),
            GameKind::BlacklineRush => format!(
                "{} needs a quote with at least {} words",
                info.game_name,
                redaction::MIN_WORDS_FOR_QUOTE
            ),
            GameKind::WhoSaidIt => format!(
                "{} needs single-author quotes from at least {} different people",
                info.game_name,
                author_choice::OPTIONS_PER_QUESTION
            ),
        };
        Err(GameError::Capacity(reason))
    }
}
