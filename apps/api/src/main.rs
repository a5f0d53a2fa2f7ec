mod affiliate;
mod config;
mod errors;
mod ideas;
mod keywords;
mod llm_client;
mod routes;
mod state;
mod storage;
mod trends;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::affiliate::linkup::LinkupSource;
use crate::affiliate::mock::MockSource;
use crate::affiliate::AffiliateSource;
use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;
use crate::storage::SupabaseClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing Supabase credentials)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Research API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize Supabase REST client
    let db = SupabaseClient::new(
        &config.supabase_url,
        &config.supabase_key,
        config.http_timeout_secs,
    )?;
    if !db.check_connection().await {
        warn!("Supabase connection check failed at startup");
    }

    // Affiliate offers: Linkup search when keyed, mock networks otherwise
    let affiliate: Arc<dyn AffiliateSource> = match &config.linkup_api_key {
        Some(key) => {
            info!("Affiliate research via Linkup ({})", config.linkup_base_url);
            Arc::new(LinkupSource::new(
                key.clone(),
                &config.linkup_base_url,
                config.http_timeout_secs,
            )?)
        }
        None => {
            warn!("LINKUP_API_KEY not set; affiliate research uses mock offers");
            Arc::new(MockSource)
        }
    };

    // Initialize LLM client
    let llm = match &config.openai_api_key {
        Some(key) => {
            let client = LlmClient::new(
                key.clone(),
                &config.openai_base_url,
                config.openai_model.clone(),
                config.http_timeout_secs,
            )?;
            info!("LLM client initialized (model: {})", client.model());
            Some(client)
        }
        None => {
            warn!("OPENAI_API_KEY not set; blog idea generation uses fallback ideas");
            None
        }
    };

    // Build app state
    let state = AppState {
        db,
        affiliate,
        llm,
        trends: None,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the frontend host is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
