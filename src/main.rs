use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use quote_party::{
    api,
    config::AppConfig,
    prompts::PromptDeck,
    quotes::{HttpQuoteSupply, QuoteSupply, StaticQuoteSupply},
    state::AppState,
    sweeper,
};

fn build_quote_supply(config: &AppConfig) -> Result<Arc<dyn QuoteSupply>, Box<dyn std::error::Error>> {
    if let Some(url) = &config.quotes_api_url {
        tracing::info!("Using quote API at {}", url);
        return Ok(Arc::new(HttpQuoteSupply::new(url)?));
    }
    if let Some(path) = &config.quotes_file {
        let supply = StaticQuoteSupply::from_json_file(path)?;
        tracing::info!("Loaded {} quotes from {}", supply.len(), path.display());
        return Ok(Arc::new(supply));
    }
    tracing::warn!("No QUOTES_API_URL or QUOTES_FILE set. Games will report as not ready.");
    Ok(Arc::new(StaticQuoteSupply::new(Vec::new())))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present (before any env var reads)
    if let Err(e) = dotenvy::dotenv() {
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quote_party=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Quote Party...");

    let config = AppConfig::from_env();
    let quotes = build_quote_supply(&config)?;
    let prompts = match &config.prompts_file {
        Some(path) => PromptDeck::load(path),
        None => PromptDeck::default(),
    };
    let addr = config.bind_addr;

    let state = Arc::new(AppState::new(quotes, prompts, config));

    // Garbage-collect sessions nobody polls anymore
    sweeper::spawn_session_sweeper(state.clone());

    let app = api::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    tracing::info!("Listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
