use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use cron::Schedule;

use super::error::PrepareError;
use super::ownership::Ownership;
use super::{JobConfig, JobSpec};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_SIZE_LIMIT: u64 = 10_485_760;
pub const DEFAULT_SCHEDULE: &str = "@hourly";
pub const DEFAULT_FILE_MODE: u32 = 0o644;

impl JobConfig {
    /// Validate the raw descriptor and resolve it into an immutable
    /// [`JobSpec`]. Runs exactly once per job, before scheduling begins; a
    /// failure drops the job from scheduling without affecting others.
    ///
    /// Defaults applied when a field is unset or invalid: mode 0644,
    /// schedule `@hourly`, timeout one minute, size limit 10 MiB.
    pub fn prepare(self, index: usize) -> Result<JobSpec, PrepareError> {
        if self.url.trim().is_empty() || self.dest.trim().is_empty() {
            return Err(PrepareError::MissingEndpoints);
        }

        let destination =
            std::path::absolute(Path::new(&self.dest)).map_err(PrepareError::Destination)?;

        let mode = self
            .mode
            .as_deref()
            .and_then(parse_mode)
            .unwrap_or(DEFAULT_FILE_MODE);
        let ownership = Ownership::resolve(self.owner.as_deref(), self.group.as_deref(), mode)?;

        let schedule = self
            .schedule
            .as_deref()
            .and_then(parse_schedule)
            .unwrap_or_else(default_schedule);

        let timeout = self
            .timeout
            .as_deref()
            .and_then(|raw| humantime::parse_duration(raw.trim()).ok())
            .unwrap_or(DEFAULT_TIMEOUT);

        let size_limit = match self.limit {
            Some(limit) if limit > 0 => limit as u64,
            _ => DEFAULT_SIZE_LIMIT,
        };

        let id = self.name.unwrap_or_else(|| index.to_string());

        Ok(JobSpec {
            id,
            url: self.url,
            destination,
            ownership,
            force: self.force,
            schedule,
            size_limit,
            timeout,
        })
    }
}

fn parse_mode(raw: &str) -> Option<u32> {
    u32::from_str_radix(raw.trim().trim_start_matches("0o"), 8).ok()
}

/// The `cron` crate wants a seconds field and does not know the `@` aliases,
/// so normalize standard five-field expressions and the aliases before
/// parsing. Returns `None` when the expression is invalid.
fn parse_schedule(raw: &str) -> Option<Schedule> {
    let trimmed = raw.trim();
    let expanded = match trimmed {
        "@hourly" => "0 0 * * * *".to_string(),
        "@daily" | "@midnight" => "0 0 0 * * *".to_string(),
        "@weekly" => "0 0 0 * * Sun".to_string(),
        "@monthly" => "0 0 0 1 * *".to_string(),
        "@yearly" | "@annually" => "0 0 0 1 1 *".to_string(),
        other if other.split_whitespace().count() == 5 => format!("0 {other}"),
        other => other.to_string(),
    };
    Schedule::from_str(&expanded).ok()
}

fn default_schedule() -> Schedule {
    Schedule::from_str("0 0 * * * *").expect("default schedule is a valid expression")
}
