//! Questline Engine - Main entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use questline_engine::api;
use questline_engine::app::App;
use questline_engine::infrastructure::{
    analytics::TracingAnalytics,
    catalog,
    clock::SystemClock,
    memory::{InMemoryBadgeRepo, InMemoryProgressRepo, InMemoryTemplateRepo},
    ports::{BadgeRepo, ClockPort, ProgressRepo},
    sqlite::{self, SqliteBadgeRepo, SqliteProgressRepo},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "questline_engine=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Questline Engine");

    // Load configuration
    let server_host = std::env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let server_port: u16 = std::env::var("SERVER_PORT")
        .or_else(|_| std::env::var("PORT"))
        .unwrap_or_else(|_| "3000".into())
        .parse()
        .unwrap_or(3000);
    let db_path = std::env::var("QUESTLINE_DB_PATH").unwrap_or_else(|_| "questline.db".into());
    let templates_path = std::env::var("TEMPLATES_PATH").ok();
    let badges_path = std::env::var("BADGES_PATH").ok();

    let clock: Arc<dyn ClockPort> = Arc::new(SystemClock::new());

    // Catalogs are immutable reference data, loaded once
    let badge_catalog = Arc::new(catalog::load_badge_catalog(badges_path.as_deref())?);
    let (templates, default_template_id) =
        catalog::load_templates(templates_path.as_deref(), clock.now())?;
    let template_repo = Arc::new(InMemoryTemplateRepo::new(templates, default_template_id));

    // Progress and badge persistence: SQLite by default, in-memory when
    // QUESTLINE_DB_PATH=memory (useful for local experiments)
    let (progress_repo, badge_repo): (Arc<dyn ProgressRepo>, Arc<dyn BadgeRepo>) =
        if db_path == "memory" {
            tracing::info!("Using in-memory persistence");
            (
                Arc::new(InMemoryProgressRepo::new()),
                Arc::new(InMemoryBadgeRepo::new()),
            )
        } else {
            let pool = sqlite::connect(&db_path)
                .await
                .map_err(|e| anyhow::anyhow!("opening database {db_path}: {e}"))?;
            tracing::info!(db_path = %db_path, "Using SQLite persistence");
            (
                Arc::new(SqliteProgressRepo::new(pool.clone(), clock.clone())),
                Arc::new(SqliteBadgeRepo::new(pool)),
            )
        };

    let app = Arc::new(App::new(
        template_repo,
        progress_repo,
        badge_repo,
        badge_catalog,
        clock,
        Arc::new(TracingAnalytics::new()),
    ));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let router = api::router(app)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{server_host}:{server_port}").parse()?;
    tracing::info!(%addr, "Questline Engine listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
