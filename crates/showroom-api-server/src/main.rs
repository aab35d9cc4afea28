use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};
use tracing::info;

use showroom_api_server::catalog::CatalogIndex;
use showroom_api_server::config::Settings;
use showroom_api_server::handlers;
use showroom_api_server::services::conversation::{ConversationManager, SessionStore};
use showroom_api_server::services::{company_info, OpenAiChatService, OpenAiEmbeddingService};
use showroom_api_server::state::AppState;
use showroom_api_server::utils::metrics;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,showroom_api_server=debug".to_string()),
        )
        .with_target(true)
        .json()
        .init();

    info!("starting showroom API server");

    let settings = Settings::load()?;
    info!("configuration loaded");

    metrics::init();

    // Startup is deliberately fail-fast: no briefing or half-embedded
    // catalog ever reaches the serving phase.
    let company_info = company_info::fetch(&settings.company.info_url).await?;

    let embedding_service = Arc::new(OpenAiEmbeddingService::new(
        &settings.openai,
        &settings.embedding,
    ));

    let catalog = Arc::new(
        CatalogIndex::load(&settings.catalog.path, embedding_service.clone()).await?,
    );
    info!(vehicles = catalog.len(), "catalog loaded");

    let llm_service = Arc::new(OpenAiChatService::new(&settings.openai, &settings.llm));

    let conversation = Arc::new(ConversationManager::new(
        SessionStore::new(),
        catalog,
        llm_service,
        &settings.company.name,
        company_info,
        settings.catalog.top_k,
    ));

    let state = AppState {
        conversation,
        settings: settings.clone(),
    };

    let app = build_router(state);

    let addr = SocketAddr::from((
        settings.server.host.parse::<std::net::IpAddr>()?,
        settings.server.port,
    ));
    info!("listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/qa", get(handlers::qa::qa_handler))
        .route("/whatsapp", post(handlers::whatsapp::whatsapp_handler))
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::metrics::metrics_handler))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::default()),
        )
}
