//! Per-job execution pipeline: bounded streaming download with format
//! sniffing, content-based change detection, and atomic replacement of the
//! destination file.

pub mod compare;
pub mod error;
pub mod fetch;
pub mod ownership;
pub mod prepare;
pub mod replace;

use std::path::{Path, PathBuf};
use std::time::Duration;

use cron::Schedule;
use reqwest::Client;
use serde::Deserialize;
use tempfile::NamedTempFile;
use tracing::{error, info};

pub use compare::Outcome;
pub use error::{JobError, PrepareError};
pub use fetch::ContentDigest;
use ownership::Ownership;

use crate::metrics::MetricsSink;

/// Raw job descriptor as it appears in the configuration file. Only `url`
/// and `dest` are mandatory; everything else is defaulted during
/// preparation.
#[derive(Debug, Clone, Deserialize)]
pub struct JobConfig {
    /// Source URL to download the CRL from
    pub url: String,
    /// Destination file to save the CRL to
    pub dest: String,
    /// Stable label for logs and metrics; the job's position in the list is
    /// used when unset
    pub name: Option<String>,
    /// Desired permissions for the CRL file, as an octal string
    pub mode: Option<String>,
    /// Desired owner of the CRL file
    pub owner: Option<String>,
    /// Desired group of the CRL file
    pub group: Option<String>,
    /// Force CRL file update, skip format and change checks
    #[serde(default)]
    pub force: bool,
    /// CRL update job cron schedule
    pub schedule: Option<String>,
    /// CRL file size limit in bytes
    pub limit: Option<i64>,
    /// CRL download attempt timeout
    pub timeout: Option<String>,
}

/// A prepared job. Immutable for the lifetime of the process; every
/// scheduled invocation reads it and keeps all transient state to itself.
#[derive(Debug, Clone)]
pub struct JobSpec {
    pub id: String,
    pub url: String,
    pub destination: PathBuf,
    pub(crate) ownership: Ownership,
    pub force: bool,
    pub schedule: Schedule,
    pub size_limit: u64,
    pub timeout: Duration,
}

impl JobSpec {
    /// Directory the temporary file is staged in. Same directory as the
    /// destination so the final rename stays on one filesystem.
    fn staging_dir(&self) -> &Path {
        self.destination.parent().unwrap_or(Path::new("/"))
    }

    /// One full pipeline pass: stage, download, detect change, publish.
    /// The staged temporary file is removed on every path that does not
    /// rename it over the destination.
    pub async fn run_once(&self, client: &Client) -> Result<Outcome, JobError> {
        let mut staged = NamedTempFile::new_in(self.staging_dir()).map_err(JobError::Stage)?;

        let summary = fetch::fetch_crl(
            client,
            &self.url,
            self.size_limit,
            self.force,
            staged.as_file_mut(),
        )
        .await?;

        // Force mode produced no digest, which also skips change detection.
        if let Some(digest) = &summary.digest {
            if let Outcome::Unchanged = compare::detect_change(&self.destination, digest)? {
                return Ok(Outcome::Unchanged);
            }
        }

        replace::replace(staged, &self.destination, &self.ownership)?;
        Ok(Outcome::Updated)
    }
}

/// Run one scheduled invocation end to end, logging the outcome and
/// recording exactly one metrics observation whichever path the run takes.
pub async fn execute(
    spec: &JobSpec,
    client: &Client,
    metrics: &impl MetricsSink,
) -> Result<Outcome, JobError> {
    let file = spec.destination.display().to_string();
    let result = spec.run_once(client).await;

    match &result {
        Ok(Outcome::Updated) => {
            info!(id = %spec.id, dest = %file, url = %spec.url, "updated target CRL file");
            metrics.record_success(&spec.id, &file);
        }
        Ok(Outcome::Unchanged) => {
            info!(id = %spec.id, dest = %file, url = %spec.url, "CRL source did not change");
            metrics.record_success(&spec.id, &file);
        }
        Err(err) => {
            error!(id = %spec.id, dest = %file, url = %spec.url, error = %err, "CRL update failed");
            metrics.record_error(&spec.id, &file);
        }
    }

    result
}
