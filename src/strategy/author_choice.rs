use rand::seq::{IndexedRandom, SliceRandom};

use super::ranking::GuessLedger;
use crate::error::{GameError, GameResult};
use crate::text::normalize_author;
use crate::types::Quote;

pub const OPTIONS_PER_QUESTION: usize = 4;

/// "Who said it?" question: one quote, the real author hidden among decoys
#[derive(Debug, Clone)]
pub struct AuthorQuiz {
    pub quote: Quote,
    answer: String,
    options: Vec<String>,
    pub guesses: GuessLedger,
}

impl AuthorQuiz {
    /// Build a question from a single-author quote and the pool of known authors.
    /// Returns `None` when the quote has no single author or the pool is too small.
    pub fn new(quote: Quote, author_pool: &[String]) -> Option<Self> {
        let answer = quote.single_author()?.to_string();
        let answer_key = normalize_author(&answer);

        let mut seen = vec![answer_key.clone()];
        let decoy_pool: Vec<&String> = author_pool
            .iter()
            .filter(|a| {
                let key = normalize_author(a);
                if key.is_empty() || seen.contains(&key) {
                    return false;
                }
                seen.push(key);
                true
            })
            .collect();
        if decoy_pool.len() < OPTIONS_PER_QUESTION - 1 {
            return None;
        }

        let mut rng = rand::rng();
        let mut options: Vec<String> = decoy_pool
            .choose_multiple(&mut rng, OPTIONS_PER_QUESTION - 1)
            .map(|a| (*a).clone())
            .collect();
        options.push(answer.clone());
        options.shuffle(&mut rng);

        Some(Self {
            quote,
            answer,
            options,
            guesses: GuessLedger::default(),
        })
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn answer(&self) -> &str {
        &self.answer
    }

    /// Lock in a choice; returns the rank when it names the real author
    pub fn choose(&mut self, player_id: &str, choice: &str) -> GameResult<Option<u32>> {
        if self.guesses.has_answered(player_id) {
            return Err(GameError::AlreadySubmitted);
        }
        let key = normalize_author(choice);
        let option = self
            .options
            .iter()
            .find(|o| normalize_author(o) == key)
            .cloned()
            .ok_or_else(|| GameError::Validation("Pick one of the listed authors".to_string()))?;

        let correct = key == normalize_author(&self.answer);
        Ok(self.guesses.record(player_id, vec![option], correct))
    }
}
