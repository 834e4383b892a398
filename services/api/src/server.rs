use crate::cli::ServeArgs;
use crate::infra::{
    advisory_config_from, build_engine, AppState, InMemoryCaseRepository, InMemoryReviewAlerts,
};
use crate::routes::with_screening_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use riskgate::config::AppConfig;
use riskgate::error::AppError;
use riskgate::screening::{
    transaction_screening, AdvisoryClient, HttpTransport, ScreeningService,
};
use riskgate::telemetry;
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

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let advisory_config = advisory_config_from(&config.advisory);
    let transport = HttpTransport::new(&advisory_config)?;
    let engine = build_engine(
        transaction_screening(),
        AdvisoryClient::new(advisory_config, transport),
    )?;

    let repository = Arc::new(InMemoryCaseRepository::default());
    let alerts = Arc::new(InMemoryReviewAlerts::default());
    let screening_service = Arc::new(ScreeningService::new(engine, repository, alerts));

    let app = with_screening_routes(screening_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "risk screening gateway ready");

    axum::serve(listener, app).await?;
    Ok(())
}
