use crate::cli::ServeArgs;
use crate::infra::{waitlist_settings, AppState};
use crate::routes::with_waitlist_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;
use void_walker::config::AppConfig;
use void_walker::error::AppError;
use void_walker::telemetry;
use void_walker::workflows::waitlist::{
    HttpSubmissionEndpoint, InMemoryWizardRepository, WaitlistService,
};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    if let Some(endpoint) = args.endpoint.take() {
        config.waitlist.set_endpoint_url(&endpoint)?;
    }
    if let Some(origin) = args.origin.take() {
        config.waitlist.set_site_origin(&origin)?;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let repository = Arc::new(InMemoryWizardRepository::with_idle_ttl(
        config.waitlist.session_ttl,
    ));
    let endpoint = Arc::new(HttpSubmissionEndpoint::new(
        config.waitlist.endpoint_url.clone(),
        config.waitlist.request_timeout,
    )?);
    let waitlist_service = Arc::new(WaitlistService::new(
        repository,
        endpoint,
        waitlist_settings(&config.waitlist),
    ));

    let app = with_waitlist_routes(waitlist_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        endpoint = %config.waitlist.endpoint_url,
        honeypot = ?config.waitlist.honeypot_policy,
        session_ttl_secs = config.waitlist.session_ttl.as_secs(),
        "void-walker waitlist service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
