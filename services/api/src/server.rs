use crate::cli::ServeArgs;
use crate::commands::build_alert_job;
use crate::infra::{AppState, InMemoryCatalog};
use crate::routes::with_loan_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use loan_watch::config::AppConfig;
use loan_watch::error::AppError;
use loan_watch::telemetry;
use loan_watch::workflows::access::{AccessGate, StaticTokenVerifier};
use loan_watch::workflows::loans::CatalogService;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

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

    let catalog = Arc::new(InMemoryCatalog::named(config.catalog.table.clone()));
    if let Some(seed) = args.seed.take() {
        catalog.seed_from_path(&seed)?;
    }

    if config.access.admin_token.is_none() {
        warn!("LOAN_ADMIN_TOKEN is not set; every write request will be denied");
    }
    let gate = Arc::new(AccessGate::new(Arc::new(StaticTokenVerifier::new(
        config.access.admin_token.clone(),
    ))));
    let job = Arc::new(build_alert_job(&config, catalog.clone()));
    let catalog_service = Arc::new(CatalogService::new(catalog));

    let app = with_loan_routes(catalog_service, job, gate)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        table = %config.catalog.table,
        topic = %config.alerts.topic,
        "loan watch service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
