use super::*;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tokio::sync::RwLock;

/// Quote book held in memory, optionally loaded from a JSON file
pub struct StaticQuoteSupply {
    quotes: Vec<Quote>,
    /// Card-game wins per quote since startup
    wins: RwLock<HashMap<QuoteId, u32>>,
}

/// Quote files are either a bare array or `{"quotes": [...]}`
#[derive(Deserialize)]
#[serde(untagged)]
enum QuoteFile {
    List(Vec<Quote>),
    Wrapped { quotes: Vec<Quote> },
}

impl StaticQuoteSupply {
    pub fn new(quotes: Vec<Quote>) -> Self {
        let quotes = quotes
            .into_iter()
            .filter(|q| !q.text.trim().is_empty())
            .collect();
        Self {
            quotes,
            wins: RwLock::new(HashMap::new()),
        }
    }

    /// Load a quote book from disk
    pub fn from_json_file(path: impl AsRef<Path>) -> QuoteResult<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let parsed: QuoteFile =
            serde_json::from_str(&raw).map_err(|e| QuoteError::Parse(e.to_string()))?;
        let quotes = match parsed {
            QuoteFile::List(quotes) | QuoteFile::Wrapped { quotes } => quotes,
        };
        let supply = Self::new(quotes);
        tracing::info!(
            path = %path.as_ref().display(),
            count = supply.quotes.len(),
            "Loaded quote book"
        );
        Ok(supply)
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    pub async fn wins(&self, id: QuoteId) -> u32 {
        self.wins.read().await.get(&id).copied().unwrap_or(0)
    }
}

#[async_trait]
impl QuoteSupply for StaticQuoteSupply {
    async fn sample(&self, n: usize, filter: &QuoteFilter) -> QuoteResult<Vec<Quote>> {
        Ok(sample_from(&self.quotes, n, filter))
    }

    async fn count(&self, filter: &QuoteFilter) -> QuoteResult<usize> {
        Ok(count_in(&self.quotes, filter))
    }

    async fn authors(&self) -> QuoteResult<Vec<String>> {
        Ok(authors_in(&self.quotes))
    }

    async fn record_wins(&self, ids: &[QuoteId]) -> QuoteResult<()> {
        let mut wins = self.wins.write().await;
        for id in ids.iter().filter(|id| self.quotes.iter().any(|q| q.id == **id)) {
            *wins.entry(*id).or_insert(0) += 1;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "static"
    }
}
