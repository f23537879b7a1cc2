use super::*;
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// How long a fetched quote list is reused before asking the API again
const CACHE_TTL: Duration = Duration::from_secs(30);

/// Quote book served by a remote quote API (`GET {base}/api/quotes`)
pub struct HttpQuoteSupply {
    base_url: String,
    client: reqwest::Client,
    cache: RwLock<Option<(Instant, Arc<Vec<Quote>>)>>,
    ttl: Duration,
}

#[derive(Debug, Deserialize)]
struct QuoteListResponse {
    #[serde(default)]
    quotes: Vec<Quote>,
}

impl HttpQuoteSupply {
    pub fn new(base_url: impl Into<String>) -> QuoteResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| QuoteError::Request(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
            cache: RwLock::new(None),
            ttl: CACHE_TTL,
        })
    }

    /// Override the cache lifetime (zero disables caching)
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    async fn quotes(&self) -> QuoteResult<Arc<Vec<Quote>>> {
        if let Some((fetched_at, quotes)) = self.cache.read().await.as_ref() {
            if fetched_at.elapsed() < self.ttl {
                return Ok(quotes.clone());
            }
        }

        let quotes = Arc::new(self.fetch().await?);
        *self.cache.write().await = Some((Instant::now(), quotes.clone()));
        Ok(quotes)
    }

    async fn fetch(&self) -> QuoteResult<Vec<Quote>> {
        let url = format!("{}/api/quotes", self.base_url);
        let start = Instant::now();

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| QuoteError::Request(format!("GET {} failed: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(QuoteError::Request(format!(
                "GET {} returned status {}",
                url,
                response.status()
            )));
        }

        let payload: QuoteListResponse = response
            .json()
            .await
            .map_err(|e| QuoteError::Parse(e.to_string()))?;

        let quotes: Vec<Quote> = payload
            .quotes
            .into_iter()
            .filter(|q| !q.text.trim().is_empty())
            .collect();

        tracing::debug!(
            count = quotes.len(),
            latency_ms = start.elapsed().as_millis() as u64,
            "Fetched quotes from {}",
            self.base_url
        );
        Ok(quotes)
    }
}

#[async_trait]
impl QuoteSupply for HttpQuoteSupply {
    async fn sample(&self, n: usize, filter: &QuoteFilter) -> QuoteResult<Vec<Quote>> {
        Ok(sample_from(&self.quotes().await?, n, filter))
    }

    async fn count(&self, filter: &QuoteFilter) -> QuoteResult<usize> {
        Ok(count_in(&self.quotes().await?, filter))
    }

    async fn authors(&self) -> QuoteResult<Vec<String>> {
        Ok(authors_in(&self.quotes().await?))
    }

    async fn record_wins(&self, ids: &[QuoteId]) -> QuoteResult<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let url = format!("{}/api/quote-anarchy-wins", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "quote_ids": ids }))
            .send()
            .await
            .map_err(|e| QuoteError::Request(format!("POST {} failed: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(QuoteError::Request(format!(
                "POST {} returned status {}",
                url,
                response.status()
            )));
        }
        tracing::debug!(count = ids.len(), "Recorded card wins at {}", self.base_url);
        Ok(())
    }

    fn name(&self) -> &str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        routing::{get, post},
        Json, Router,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_fetches_and_caches_quotes() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let router = Router::new().route(
            "/api/quotes",
            get(move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Json(serde_json::json!({
                        "quotes": [
                            {"id": 1, "quote": "Remote wisdom here", "authors": ["Ada"]},
                            {"id": 2, "quote": "", "authors": ["Nobody"]}
                        ],
                        "total": 2
                    }))
                }
            }),
        );
        let base = serve(router).await;

        let supply = HttpQuoteSupply::new(format!("{}/", base)).unwrap();
        assert_eq!(supply.count(&QuoteFilter::any()).await.unwrap(), 1);
        assert_eq!(supply.authors().await.unwrap(), vec!["Ada".to_string()]);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let router = Router::new().route(
            "/api/quotes",
            get(|| async { (axum::http::StatusCode::BAD_GATEWAY, "upstream down") }),
        );
        let base = serve(router).await;

        let supply = HttpQuoteSupply::new(base).unwrap().with_ttl(Duration::ZERO);
        let err = supply.count(&QuoteFilter::any()).await.unwrap_err();
        assert!(matches!(err, QuoteError::Request(_)));
        assert!(err.to_string().contains("502"));
    }

    #[tokio::test]
    async fn test_record_wins_posts_quote_ids() {
        let received = Arc::new(tokio::sync::Mutex::new(Vec::new()));
        let sink = received.clone();
        let router = Router::new().route(
            "/api/quote-anarchy-wins",
            post(move |Json(body): Json<serde_json::Value>| {
                let sink = sink.clone();
                async move {
                    sink.lock().await.push(body);
                    Json(serde_json::json!({ "quotes": [] }))
                }
            }),
        );
        let base = serve(router).await;

        let supply = HttpQuoteSupply::new(base).unwrap();
        supply.record_wins(&[]).await.unwrap();
        supply.record_wins(&[4, 9]).await.unwrap();

        let received = received.lock().await;
        assert_eq!(received.len(), 1);
        assert_eq!(received[0]["quote_ids"], serde_json::json!([4, 9]));
    }
}
