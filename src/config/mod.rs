//! Runtime configuration for the cronloop daemon

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Default tracing filter; the RUST_LOG environment variable and the
    /// --log-level flag take precedence
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_filter() -> String {
    "cronloop=info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

/// One scheduled command
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobEntry {
    /// Name used in logs
    pub name: String,
    /// Six-field cron expression: second minute hour day-of-month month weekday
    pub schedule: String,
    /// Shell command executed on each run (via `sh -c`)
    pub command: String,
}

/// Top-level daemon configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub log: LogConfig,

    /// Jobs registered at startup
    #[serde(default)]
    pub jobs: Vec<JobEntry>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_file =
            std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".to_string());
        Self::load_from_file(&config_file)
    }

    pub fn load_from_file(config_file: &str) -> Result<Self> {
        if std::path::Path::new(&config_file).exists() {
            let contents = std::fs::read_to_string(config_file)?;
            Ok(toml::from_str(&contents)?)
        } else {
            let default_config = Self::default();
            let contents = toml::to_string_pretty(&default_config)?;
            std::fs::write(config_file, contents)?;
            info!("Created default config file: {}", config_file);
            Ok(default_config)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_gets_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.log.filter, "cronloop=info");
        assert!(config.jobs.is_empty());
    }

    #[test]
    fn test_job_entries_parse() {
        let config: Config = toml::from_str(
            r#"
            [[jobs]]
            name = "heartbeat"
            schedule = "*/30 * * * * *"
            command = "echo beat"

            [[jobs]]
            name = "nightly-report"
            schedule = "0 0 2 * * *"
            command = "/usr/local/bin/report.sh"
            "#,
        )
        .unwrap();

        assert_eq!(config.jobs.len(), 2);
        assert_eq!(config.jobs[0].name, "heartbeat");
        assert_eq!(config.jobs[1].schedule, "0 0 2 * * *");
    }
}
