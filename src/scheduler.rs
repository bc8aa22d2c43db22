//! Drives prepared jobs on their cron cadence.
//!
//! Each job lives on its own tokio task, independent of and parallel to the
//! others. The next tick is computed only after the previous invocation has
//! returned, so overlapping runs of one job cannot happen; ticks that pass
//! while a run is in flight are skipped.

use chrono::Utc;
use reqwest::Client;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::job::{self, JobSpec};
use crate::metrics::Metrics;

pub fn spawn_jobs(jobs: Vec<JobSpec>, metrics: Metrics) -> Vec<JoinHandle<()>> {
    jobs.into_iter()
        .map(|spec| {
            let metrics = metrics.clone();
            tokio::spawn(async move { run_loop(spec, metrics).await })
        })
        .collect()
}

async fn run_loop(spec: JobSpec, metrics: Metrics) {
    // Idle pooling is disabled so a low-frequency job never holds an open
    // connection between ticks; the timeout bounds the network phase of a
    // single attempt.
    let client = match Client::builder()
        .timeout(spec.timeout)
        .pool_max_idle_per_host(0)
        .build()
    {
        Ok(client) => client,
        Err(err) => {
            error!(id = %spec.id, error = %err, "failed to build http client, job disabled");
            return;
        }
    };

    info!(
        id = %spec.id,
        dest = %spec.destination.display(),
        url = %spec.url,
        "added CRL update job"
    );

    loop {
        let Some(next) = spec.schedule.upcoming(Utc).next() else {
            warn!(id = %spec.id, "schedule has no upcoming runs, job finished");
            return;
        };
        let wait = (next - Utc::now()).to_std().unwrap_or_default();
        tokio::time::sleep(wait).await;

        let _ = job::execute(&spec, &client, &metrics).await;
    }
}
