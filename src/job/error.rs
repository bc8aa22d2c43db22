use std::io;

use thiserror::Error;

/// Errors that disqualify a job descriptor at registration time. The job is
/// dropped from scheduling; the process keeps running.
#[derive(Debug, Error)]
pub enum PrepareError {
    #[error("empty 'url' and/or 'dest' parameters")]
    MissingEndpoints,

    #[error("user lookup failed for '{name}'")]
    OwnerLookup { name: String },

    #[error("group lookup failed for '{name}'")]
    GroupLookup { name: String },

    #[error("destination path could not be resolved: {0}")]
    Destination(#[source] io::Error),
}

/// Per-run errors. Every failed invocation terminates with exactly one of
/// these; it is logged, counted, and never affects other jobs or future
/// ticks.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("http request failed: {0}")]
    Network(#[source] reqwest::Error),

    #[error("source returned http status {0}")]
    HttpStatus(reqwest::StatusCode),

    #[error("timed out downloading CRL")]
    Timeout,

    #[error("source is not a DER or PEM encoded CRL")]
    Format,

    #[error("CRL exceeds the size limit of {limit} bytes")]
    SizeLimit { limit: u64 },

    #[error("failed to read existing CRL file: {0}")]
    Compare(#[source] io::Error),

    #[error("failed to replace existing CRL file: {0}")]
    Replace(#[source] io::Error),

    #[error("failed to stage temporary CRL file: {0}")]
    Stage(#[source] io::Error),
}

impl JobError {
    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            JobError::Timeout
        } else {
            JobError::Network(err)
        }
    }
}

/// Convenient Result type alias
pub type JobResult<T> = Result<T, JobError>;
