use crl_updater::{config::Config, metrics::Metrics, scheduler, server::Server, telemetry};
use tracing::{error, info};

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    telemetry::init_tracing();

    // Optional config file path as the first argument
    let config_path = std::env::args().nth(1);
    let config = Config::load(config_path.as_deref())?;

    let metrics = Metrics::new()?;

    // Prepare and validate job parameters; a bad job is skipped, not fatal
    let mut specs = Vec::new();
    for (index, job) in config.jobs.into_iter().enumerate() {
        let (url, dest) = (job.url.clone(), job.dest.clone());
        match job.prepare(index) {
            Ok(spec) => specs.push(spec),
            Err(err) => error!(dest = %dest, url = %url, error = %err, "skipping job"),
        }
    }
    if specs.is_empty() {
        tracing::warn!("no runnable jobs configured");
    }

    let handles = scheduler::spawn_jobs(specs, metrics.clone());
    info!("scheduled {} CRL update job(s)", handles.len());

    let server = Server::bind(&config.metrics.listen, metrics).await?;
    server.run().await
}
