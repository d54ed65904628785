use crate::cli::ServeArgs;
use crate::infra::AppState;
use crate::routes::service_router;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;
use vyapar_scoring::config::AppConfig;
use vyapar_scoring::error::AppError;
use vyapar_scoring::scoring::ScoringEngine;
use vyapar_scoring::telemetry;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    args.engine.apply(&mut config.scoring);

    telemetry::init(&config.telemetry)?;

    let engine = Arc::new(ScoringEngine::from_config(&config.scoring)?);

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let app = service_router(engine)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        mode = config.scoring.mode.label(),
        "scoring service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
