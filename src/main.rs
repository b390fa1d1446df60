use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use std::time::Instant;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use tutor_match::auth::TokenVerifier;
use tutor_match::config::{LoggingSettings, Settings};
use tutor_match::core::Ranker;
use tutor_match::routes::{self, AppState};
use tutor_match::services::{PostgresStore, RecommendationService};

fn init_logging(defaults: &LoggingSettings) {
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| defaults.level.clone());
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| defaults.format.clone());

    // RUST_LOG wins over LOG_LEVEL when both are set
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if log_format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.init();
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = Settings::load();
    let fallback = LoggingSettings::default();
    init_logging(settings.as_ref().map_or(&fallback, |s| &s.logging));

    info!("Starting tutor-match recommendation service...");

    let settings = settings.map_err(|e| {
        error!("Failed to load configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e)
    })?;

    info!("Configuration loaded successfully");

    let started = Instant::now();
    let store = PostgresStore::from_settings(&settings.database)
        .await
        .map_err(|e| {
            error!("Failed to connect to PostgreSQL: {}", e);
            std::io::Error::new(std::io::ErrorKind::ConnectionRefused, e)
        })?;

    info!(
        "PostgreSQL store ready in {:?} (max: {} connections)",
        started.elapsed(),
        settings.database.max_connections.unwrap_or(10)
    );

    let ranker = Ranker::new(
        settings.scoring.teacher_weights,
        settings.scoring.request_weights,
        settings.matching.params(),
    );

    info!(
        "Ranker initialized with teacher weights {:?} and request weights {:?}",
        ranker.teacher_weights(),
        ranker.request_weights()
    );

    let app_state = AppState::new(
        RecommendationService::new(store, ranker),
        settings.matching.clone(),
    );
    let verifier = TokenVerifier::new(&settings.auth.jwt_secret);

    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::Data::new(verifier.clone()))
            .configure(routes::configure_extractors)
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes::<PostgresStore>)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
