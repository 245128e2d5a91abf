use super::routes::router;
use super::AppState;
use crate::config::AppConfig;
use crate::error::AppError;
use crate::telemetry::{self, LogSink};
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Default)]
pub struct ServeOptions {
    pub host: Option<String>,
    pub port: Option<u16>,
}

pub async fn run(mut options: ServeOptions) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = options.host.take() {
        config.server.host = host;
    }
    if let Some(port) = options.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry, LogSink::Stdout)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        ppm: Arc::new(config.ppm.clone()),
    };

    let app = router().layer(Extension(state)).layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "ppm tracker ready");

    axum::serve(listener, app).await?;
    Ok(())
}
