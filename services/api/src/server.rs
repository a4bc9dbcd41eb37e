use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryTimelineEventRepository, LoggingMailTransport};
use crate::routes::with_admin_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use incubator_admin::config::AppConfig;
use incubator_admin::error::AppError;
use incubator_admin::notifications::StartupMailer;
use incubator_admin::telemetry;
use incubator_admin::workflows::timeline::TimelineEventService;
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

    let repository = Arc::new(InMemoryTimelineEventRepository::default());
    let timeline_service = Arc::new(TimelineEventService::new(repository));
    let mailer = Arc::new(StartupMailer::new(
        Arc::new(LoggingMailTransport),
        config.mailer.from.clone(),
    ));

    let app = with_admin_routes(timeline_service, mailer)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "incubator back-office ready");
    warn!("timeline events are held in memory and are lost on restart");

    axum::serve(listener, app).await?;
    Ok(())
}
