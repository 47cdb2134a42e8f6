//! NEA Studio Service Binary

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use nea_admission::{Session, SessionDriver};
use nea_formalizer::{GeminiFormalizer, SpecFormalizer};
use parking_lot::Mutex;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use nea_studio::{api, config::StudioConfig, STUDIO_VERSION};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    info!("Starting NEA Studio v{}", STUDIO_VERSION);

    // Load configuration
    let config = StudioConfig::load()?;
    info!("Loaded configuration: {:?}", config);

    if config.formalizer.api_key.is_none() {
        warn!("No GEMINI_API_KEY set; formalization requests will return null");
    }

    let session = Arc::new(Mutex::new(Session::with_seed(
        config.simulation.clone(),
        config.mode,
        config.domain,
        config.seed,
    )));
    let driver = SessionDriver::new(session.clone(), config.heartbeat()).spawn();

    let formalizer: Arc<dyn SpecFormalizer> =
        Arc::new(GeminiFormalizer::new(config.formalizer.to_settings()));
    let state = api::AppState::new(session, formalizer)?;
    let app = api::router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("REST API listening on {}", addr);

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install CTRL+C handler");
            std::future::pending::<()>().await;
        }
        info!("Received shutdown signal");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    driver.abort();
    info!("Shutting down NEA Studio");
    Ok(())
}
