use crate::cli::ServeArgs;
use crate::infra::{build_workflow, AppState};
use crate::routes::with_operational_routes;
use axum::extract::DefaultBodyLimit;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use grant_intake::config::AppConfig;
use grant_intake::error::AppError;
use grant_intake::telemetry;
use grant_intake::workflows::submission::submission_router;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

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

    let workflow = Arc::new(build_workflow(&config).await?);

    let app = with_operational_routes(submission_router(workflow))
        .layer(Extension(app_state))
        .layer(DefaultBodyLimit::max(config.server.max_body_bytes))
        .layer(CorsLayer::permissive())
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        base_url = config.links.base_url(),
        "grant intake service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
