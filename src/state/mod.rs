mod catalog;
mod roster;
mod round;
pub mod session;
mod snapshot;
pub mod store;

use std::sync::Arc;

use crate::config::AppConfig;
use crate::prompts::PromptDeck;
use crate::quotes::{QuoteSupply, StaticQuoteSupply};
use crate::types::Quote;

pub use session::SessionState;
pub use snapshot::project;
pub use store::SessionStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionStore>,
    pub quotes: Arc<dyn QuoteSupply>,
    pub prompts: Arc<PromptDeck>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(quotes: Arc<dyn QuoteSupply>, prompts: PromptDeck, config: AppConfig) -> Self {
        Self {
            sessions: Arc::new(SessionStore::new()),
            quotes,
            prompts: Arc::new(prompts),
            config: Arc::new(config),
        }
    }

    /// In-memory quote book with default settings
    pub fn with_quotes(quotes: Vec<Quote>) -> Self {
        Self::new(
            Arc::new(StaticQuoteSupply::new(quotes)),
            PromptDeck::default(),
            AppConfig::default(),
        )
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::types::Quote;

    /// `n` quotes of twelve words, one author each, spread over six authors
    pub fn quote_book(n: u64) -> Vec<Quote> {
        let authors = ["Ada", "Bob", "Cy", "Dee", "Eve", "Finn"];
        (1..=n)
            .map(|id| {
                Quote::new(
                    id,
                    format!(
                        "Quote number {} says something rather memorable about coffee and meetings today",
                        id
                    ),
                    &[authors[(id as usize) % authors.len()]],
                )
            })
            .collect()
    }
}
