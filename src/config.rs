use config::{Config as ConfigLib, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;

use crate::job::JobConfig;

pub const DEFAULT_CONFIG_PATH: &str = "/etc/crl-updater.yaml";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub jobs: Vec<JobConfig>,
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    /// Address the Prometheus endpoint binds to.
    pub listen: String,
}

impl Config {
    /// Load the configuration from a YAML file, with `CRL`-prefixed
    /// environment variables taking precedence. An unreadable or
    /// unparseable file is an error; the caller treats it as fatal.
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let path = path.unwrap_or(DEFAULT_CONFIG_PATH);

        ConfigLib::builder()
            .set_default("metrics.listen", "0.0.0.0:8080")?
            .add_source(File::new(path, FileFormat::Yaml))
            // Should be in the format CRL_METRICS__LISTEN
            .add_source(
                Environment::with_prefix("CRL")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".yaml")
            .tempfile()
            .unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn jobs_and_defaults_are_loaded() {
        let file = write_config(
            r#"
jobs:
  - url: "http://example.com/root.crl"
    dest: "/var/lib/crl/root.crl"
  - url: "http://example.com/sub.crl"
    dest: "/var/lib/crl/sub.crl"
    schedule: "*/10 * * * *"
    force: true
    limit: 1024
    timeout: "30s"
"#,
        );

        let config = Config::load(file.path().to_str()).unwrap();
        assert_eq!(config.jobs.len(), 2);
        assert_eq!(config.metrics.listen, "0.0.0.0:8080");

        assert!(!config.jobs[0].force);
        assert!(config.jobs[1].force);
        assert_eq!(config.jobs[1].limit, Some(1024));
        assert_eq!(config.jobs[1].timeout.as_deref(), Some("30s"));
    }

    #[test]
    fn listen_address_can_be_overridden() {
        let file = write_config(
            r#"
metrics:
  listen: "127.0.0.1:9100"
"#,
        );

        let config = Config::load(file.path().to_str()).unwrap();
        assert!(config.jobs.is_empty());
        assert_eq!(config.metrics.listen, "127.0.0.1:9100");
    }

    #[test]
    fn missing_config_file_is_an_error() {
        assert!(Config::load(Some("/nonexistent/crl-updater.yaml")).is_err());
    }
}
