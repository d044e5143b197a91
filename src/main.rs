use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use nichescope::{
    api::{create_router, AppState},
    config::Config,
    db::{create_pool, PgStore, Storage},
    services::{llm::GeminiClient, AnalysisOrchestrator, OpportunityAnalyzer, SimilarityClusterer},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("nichescope=info,tower_http=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    let store = PgStore::new(pool);
    store.migrate().await?;
    let storage: Arc<dyn Storage> = Arc::new(store);

    let model = GeminiClient::new(
        config.gemini_api_key.clone(),
        config.gemini_api_url.clone(),
        config.gemini_model.clone(),
    );
    tracing::info!(model = %model.model(), "Language model configured");

    let orchestrator = AnalysisOrchestrator::new(
        storage.clone(),
        OpportunityAnalyzer::new(Arc::new(model)),
        SimilarityClusterer::new(config.similarity_threshold),
    );

    let state = AppState::new(
        Arc::new(orchestrator),
        storage,
        Duration::from_secs(config.pipeline_timeout_secs),
    );
    let app = create_router(state);

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(address = %address, "Server listening");
    axum::serve(listener, app).await?;

    Ok(())
}
