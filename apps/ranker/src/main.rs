use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ranker::config::Config;
use ranker::llm_client::{LlmClient, LlmSettings};
use ranker::ranking::collaborators::{LlmExperienceEvaluator, LlmNarrator};
use ranker::ranking::RankingEngine;
use ranker::routes::build_router;
use ranker::state::AppState;
use ranker::store::RankingStore;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting ranker v{}", env!("CARGO_PKG_VERSION"));

    let engine = build_engine(&config)?;

    let state = AppState {
        engine,
        store: RankingStore::new(),
    };

    let app = build_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()), // TODO: read allowed origins from a CORS_ALLOWED_ORIGINS setting
    );

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Local scoring only, unless an Anthropic key is configured.
fn build_engine(config: &Config) -> Result<RankingEngine> {
    let engine = RankingEngine::new(config.ranking.clone());

    let Some(api_key) = config.anthropic_api_key.clone() else {
        info!("ANTHROPIC_API_KEY not set; experience and explanations use local heuristics");
        return Ok(engine);
    };

    let mut settings = LlmSettings::new(api_key);
    if let Some(url) = &config.anthropic_api_url {
        settings.api_url = url.clone();
    }
    let llm = LlmClient::new(settings).context("Failed to build LLM client")?;
    info!(
        "LLM collaborators enabled (model: {}, max concurrent calls: {}, timeout: {}ms)",
        llm.model(),
        config.ranking.max_concurrent_calls,
        config.ranking.collaborator_timeout_ms
    );

    Ok(engine
        .with_evaluator(Arc::new(LlmExperienceEvaluator(llm.clone())))
        .with_narrator(Arc::new(LlmNarrator(llm))))
}
