use crate::cli::ServeArgs;
use crate::infra::{simulate_latency, AppState, Desk};
use crate::routes::with_origination_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use loan_origination::config::AppConfig;
use loan_origination::error::AppError;
use loan_origination::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    if let Some(latency_ms) = args.latency_ms.take() {
        config.backend.latency_ms = latency_ms;
    }

    telemetry::init(&config.telemetry, config.environment)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let desk = Desk::build(config.backend.seed_demo_data)?;
    info!(
        seeded = config.backend.seed_demo_data,
        applications = desk.applications.len(),
        "in-memory lending desk ready"
    );

    let app = with_origination_routes(desk.api)
        .layer(axum::middleware::from_fn_with_state(
            config.backend.latency(),
            simulate_latency,
        ))
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        latency_ms = config.backend.latency_ms,
        "loan origination service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
