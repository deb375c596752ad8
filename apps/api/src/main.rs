use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use dotenv::dotenv;
use tokio::net::TcpListener;
use tower_http::cors::{CorsLayer, Any};
use tower_http::trace::{self, TraceLayer};
use tracing::{Level, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod router;

use booking_cell::services::notifier::notifier_from_config;
use shared_config::{AppConfig, StorageBackend};
use shared_database::{ClinicStore, InMemoryStore, SupabaseStore};
use shared_models::clinic::Service;
use shared_utils::AppState;

/// Catalog served when running without a database.
fn demo_catalog() -> Vec<Service> {
    vec![
        Service::new("Teeth Orthodontics", &["08.00 AM - 08.30 AM", "08.30 AM - 09.00 AM", "09.00 AM - 09.30 AM"]),
        Service::new("Cosmetic Dentistry", &["10.05 AM - 10.30 AM", "10.30 AM - 11.00 AM", "11.05 AM - 11.30 AM"]),
        Service::new("Teeth Cleaning", &["08.00 AM - 08.30 AM", "01.00 PM - 01.30 PM", "05.00 PM - 05.30 PM"]),
        Service::new("Cavity Protection", &["11.00 AM - 11.30 AM", "04.00 PM - 04.30 PM", "06.00 PM - 06.30 PM"]),
    ]
}

fn build_store(config: &AppConfig) -> Arc<dyn ClinicStore> {
    match config.storage_backend {
        StorageBackend::Supabase => {
            info!("Using Supabase store at {}", config.supabase_url);
            Arc::new(SupabaseStore::new(config))
        }
        StorageBackend::Memory => {
            warn!("Using in-memory store; bookings are lost on restart");
            Arc::new(InMemoryStore::with_services(demo_catalog()))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Loading Env Vars
    dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting clinic booking API server");

    let config = AppConfig::from_env();
    let store = build_store(&config);
    let notifier = notifier_from_config(&config);
    let port = config.port;

    let state = Arc::new(AppState::new(config, store));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = router::create_router(state, notifier)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new()
                    .level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new()
                    .level(Level::INFO)),
        )
        .layer(cors);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, app)
        .await
        .context("server terminated unexpectedly")?;

    Ok(())
}
