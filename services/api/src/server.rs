use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use tracing::info;

use trustdesk::config::AppConfig;
use trustdesk::error::AppError;
use trustdesk::telemetry;
use trustdesk::workflows::rating::{RatingService, TableRatingStore};

use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryDocumentDirectory, InMemoryRatingTable, LoggingEventSink};
use crate::routes::with_rating_routes;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let directory = Arc::new(InMemoryDocumentDirectory::default());
    let table = Arc::new(InMemoryRatingTable::default());
    let events = Arc::new(LoggingEventSink::default());
    let rating_service = Arc::new(RatingService::new(
        directory.clone(),
        Arc::new(TableRatingStore::new(table)),
        events,
    ));

    let app = with_rating_routes(rating_service)
        .layer(Extension(app_state))
        .layer(Extension(directory))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "rating service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
