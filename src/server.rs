use axum::{
    Router,
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
    routing::get,
};
use color_eyre::eyre::{Context, Result};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::metrics::Metrics;

/// HTTP server exposing the Prometheus pull endpoint and a health probe.
pub struct Server {
    router: Router,
    listener: TcpListener,
}

impl Server {
    /// Bind the metrics listener. A failure here is fatal to the process.
    pub async fn bind(addr: &str, metrics: Metrics) -> Result<Self> {
        let trace_layer =
            TraceLayer::new_for_http().make_span_with(|request: &'_ axum::extract::Request<_>| {
                let uri = request.uri().to_string();
                tracing::info_span!("request", method = %request.method(), uri)
            });

        let router = Router::new()
            .route("/metrics", get(serve_metrics))
            .route("/health", get(health_check))
            .layer(trace_layer)
            .with_state(metrics);

        let listener = TcpListener::bind(addr)
            .await
            .context("Binding metrics listener")?;

        Ok(Self { router, listener })
    }

    /// Port the listener is bound to, for tests binding port 0.
    pub fn port(&self) -> Result<u16> {
        Ok(self
            .listener
            .local_addr()
            .context("Getting local address")?
            .port())
    }

    pub async fn run(self) -> Result<()> {
        let addr = self.listener.local_addr().context("Getting local address")?;
        tracing::info!("Metrics listening on http://{addr}/metrics");

        axum::serve(self.listener, self.router)
            .await
            .context("Serving metrics endpoint")?;
        Ok(())
    }
}

async fn serve_metrics(State(metrics): State<Metrics>) -> impl IntoResponse {
    match metrics.render() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(err) => {
            tracing::error!("failed to render metrics: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn health_check() -> StatusCode {
    StatusCode::OK
}
