mod local;
mod remote;

use async_trait::async_trait;
use rand::seq::IndexedRandom;
use std::collections::HashSet;

use crate::text::normalize_author;
use crate::types::{Quote, QuoteId};

pub use local::StaticQuoteSupply;
pub use remote::HttpQuoteSupply;

/// Result type for quote supply operations
pub type QuoteResult<T> = Result<T, QuoteError>;

/// Errors raised while loading or fetching quotes
#[derive(Debug, thiserror::Error)]
pub enum QuoteError {
    #[error("Quote request failed: {0}")]
    Request(String),

    #[error("Could not parse quotes: {0}")]
    Parse(String),

    #[error("Could not read quotes file: {0}")]
    Io(#[from] std::io::Error),
}

/// Which quotes a game is willing to use
#[derive(Debug, Clone, Default)]
pub struct QuoteFilter {
    /// Minimum number of words in the quote text
    pub min_words: usize,
    /// Only quotes credited to exactly one author
    pub single_author: bool,
    /// Quotes already used in this session
    pub exclude: HashSet<QuoteId>,
}

impl QuoteFilter {
    pub fn any() -> Self {
        Self::default()
    }

    pub fn min_words(mut self, min_words: usize) -> Self {
        self.min_words = min_words;
        self
    }

    pub fn single_author(mut self) -> Self {
        self.single_author = true;
        self
    }

    pub fn excluding(mut self, ids: impl IntoIterator<Item = QuoteId>) -> Self {
        self.exclude.extend(ids);
        self
    }

    pub fn matches(&self, quote: &Quote) -> bool {
        if quote.text.trim().is_empty() || self.exclude.contains(&quote.id) {
            return false;
        }
        if self.single_author && quote.single_author().is_none() {
            return false;
        }
        self.min_words == 0 || quote.word_count() >= self.min_words
    }
}

/// Source of quotes for the games
#[async_trait]
pub trait QuoteSupply: Send + Sync {
    /// Up to `n` distinct random quotes matching `filter`
    async fn sample(&self, n: usize, filter: &QuoteFilter) -> QuoteResult<Vec<Quote>>;

    /// Number of quotes matching `filter`
    async fn count(&self, filter: &QuoteFilter) -> QuoteResult<usize>;

    /// Distinct names of authors credited alone on at least one quote
    async fn authors(&self) -> QuoteResult<Vec<String>>;

    /// Credit card-game wins to these quotes. Supplies that keep no stats ignore it.
    async fn record_wins(&self, _ids: &[QuoteId]) -> QuoteResult<()> {
        Ok(())
    }

    /// Short label for logs
    fn name(&self) -> &str;
}

pub(crate) fn sample_from(quotes: &[Quote], n: usize, filter: &QuoteFilter) -> Vec<Quote> {
    let eligible: Vec<&Quote> = quotes.iter().filter(|q| filter.matches(q)).collect();
    let mut rng = rand::rng();
    eligible
        .choose_multiple(&mut rng, n)
        .map(|q| (*q).clone())
        .collect()
}

pub(crate) fn count_in(quotes: &[Quote], filter: &QuoteFilter) -> usize {
    quotes.iter().filter(|q| filter.matches(q)).count()
}

pub(crate) fn authors_in(quotes: &[Quote]) -> Vec<String> {
    let mut seen = HashSet::new();
    quotes
        .iter()
        .filter(|q| !q.text.trim().is_empty())
        .filter_map(|q| q.single_author())
        .filter(|author| {
            let key = normalize_author(author);
            !key.is_empty() && seen.insert(key)
        })
        .map(|author| author.split_whitespace().collect::<Vec<_>>().join(" "))
        .collect()
}
