use std::path::Path;
use std::sync::{Arc, Mutex};

use axum::{Router, extract::State, routing::get};
use crl_updater::job::{JobConfig, JobSpec};

type SharedBody = Arc<Mutex<Vec<u8>>>;

/// A local HTTP server standing in for a CRL distribution point. The body it
/// serves can be swapped between requests.
#[derive(Clone)]
pub struct SourceServer {
    pub url: String,
    body: SharedBody,
}

impl SourceServer {
    pub fn set_body(&self, body: &[u8]) {
        *self.body.lock().unwrap() = body.to_vec();
    }
}

async fn serve_body(State(body): State<SharedBody>) -> Vec<u8> {
    body.lock().unwrap().clone()
}

/// Spawn the source server on a random port.
pub async fn spawn_source(initial: &[u8]) -> SourceServer {
    let body: SharedBody = Arc::new(Mutex::new(initial.to_vec()));
    let router = Router::new()
        .route("/crl", get(serve_body))
        .with_state(body.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router)
            .await
            .expect("source server failed");
    });

    SourceServer {
        url: format!("http://{addr}/crl"),
        body,
    }
}

/// A payload in the textual CRL encoding.
pub fn pem_body(data: &str) -> Vec<u8> {
    format!("-----BEGIN X509 CRL-----\n{data}\n-----END X509 CRL-----\n").into_bytes()
}

pub fn job_config(url: &str, dest: &Path) -> JobConfig {
    JobConfig {
        url: url.to_string(),
        dest: dest.display().to_string(),
        name: None,
        mode: None,
        owner: None,
        group: None,
        force: false,
        schedule: None,
        limit: Some(1024),
        timeout: None,
    }
}

pub fn job_spec(url: &str, dest: &Path) -> JobSpec {
    job_config(url, dest).prepare(0).unwrap()
}
