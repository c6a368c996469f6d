//! Environment configuration
//!
//! Every setting comes from a `LIVEWATCH_*` environment variable. The flat
//! [`Config`] is validated here and then converted into the core's
//! [`LivewatchConfig`].

use std::env;
use std::net::SocketAddr;
use std::path::Path;

use anyhow::Result;
use livewatch_core::config::{PushConfig, SessionStoreConfig};
use livewatch_core::{LivewatchConfig, NotificationTemplates, SchedulerConfig, SourceConfig};
use livewatch_source_chzzk::DEFAULT_API_BASE;
use tracing::Level;

const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";
const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;
const DEFAULT_SOURCE_TIMEOUT_SECS: u64 = 10;

/// Daemon configuration, one field per environment variable
#[derive(Debug, Clone)]
pub struct Config {
    pub channel_id: String,
    pub api_base: String,
    pub fcm_credentials: Option<String>,
    pub push_mode: String,
    pub session_store_type: String,
    pub session_store_path: Option<String>,
    pub token_store_path: Option<String>,
    pub schedules_path: Option<String>,
    pub poll_interval_secs: u64,
    pub bind_address: String,
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let poll_interval_secs = match non_empty("LIVEWATCH_POLL_INTERVAL_SECS") {
            Some(raw) => raw.trim().parse().map_err(|_| {
                anyhow::anyhow!(
                    "LIVEWATCH_POLL_INTERVAL_SECS must be a whole number of seconds. Got: {}",
                    raw
                )
            })?,
            None => DEFAULT_POLL_INTERVAL_SECS,
        };

        Ok(Self {
            channel_id: lookup("LIVEWATCH_CHANNEL_ID").unwrap_or_default(),
            api_base: non_empty("LIVEWATCH_API_BASE")
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            fcm_credentials: non_empty("LIVEWATCH_FCM_CREDENTIALS"),
            push_mode: non_empty("LIVEWATCH_PUSH_MODE").unwrap_or_else(|| "live".to_string()),
            session_store_type: non_empty("LIVEWATCH_SESSION_STORE_TYPE")
                .unwrap_or_else(|| "file".to_string()),
            session_store_path: lookup("LIVEWATCH_SESSION_STORE_PATH"),
            token_store_path: non_empty("LIVEWATCH_TOKEN_STORE_PATH"),
            schedules_path: non_empty("LIVEWATCH_SCHEDULES_PATH"),
            poll_interval_secs,
            bind_address: non_empty("LIVEWATCH_BIND_ADDRESS")
                .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string()),
            log_level: non_empty("LIVEWATCH_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.channel_id.trim().is_empty() {
            anyhow::bail!(
                "LIVEWATCH_CHANNEL_ID is required. \
                Set it via: export LIVEWATCH_CHANNEL_ID=your_channel_id"
            );
        }

        if !self
            .channel_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            anyhow::bail!(
                "LIVEWATCH_CHANNEL_ID contains invalid characters. Got: '{}'. \
                Valid: alphanumeric, hyphen and underscore only.",
                self.channel_id
            );
        }

        if !self.api_base.starts_with("https://") && !self.api_base.starts_with("http://") {
            anyhow::bail!(
                "LIVEWATCH_API_BASE must use HTTP or HTTPS scheme. Got: {}",
                self.api_base
            );
        }

        match self.push_mode.as_str() {
            "live" => {
                if self.fcm_credentials.is_none() {
                    anyhow::bail!(
                        "LIVEWATCH_FCM_CREDENTIALS is required when LIVEWATCH_PUSH_MODE=live. \
                        Set it via: export LIVEWATCH_FCM_CREDENTIALS=/etc/livewatch/service-account.json"
                    );
                }
            }
            "dry-run" => {}
            _ => anyhow::bail!(
                "LIVEWATCH_PUSH_MODE '{}' is not supported. \
                Supported modes: live, dry-run",
                self.push_mode
            ),
        }

        match self.session_store_type.as_str() {
            "file" | "memory" => {}
            _ => anyhow::bail!(
                "LIVEWATCH_SESSION_STORE_TYPE '{}' is not supported. \
                Supported types: file, memory",
                self.session_store_type
            ),
        }

        if self.session_store_type == "file" {
            match self.session_store_path.as_deref() {
                None => anyhow::bail!(
                    "LIVEWATCH_SESSION_STORE_PATH is required when LIVEWATCH_SESSION_STORE_TYPE=file. \
                    Set it via: export LIVEWATCH_SESSION_STORE_PATH=/var/lib/livewatch/sessions.json"
                ),
                Some(path) if path.trim().is_empty() => anyhow::bail!(
                    "LIVEWATCH_SESSION_STORE_PATH cannot be empty when LIVEWATCH_SESSION_STORE_TYPE=file"
                ),
                Some(path) => check_parent_exists("LIVEWATCH_SESSION_STORE_PATH", path)?,
            }
        }

        if let Some(path) = &self.token_store_path {
            check_parent_exists("LIVEWATCH_TOKEN_STORE_PATH", path)?;
        }

        if !(10..=3600).contains(&self.poll_interval_secs) {
            anyhow::bail!(
                "LIVEWATCH_POLL_INTERVAL_SECS must be between 10 and 3600 seconds. Got: {}",
                self.poll_interval_secs
            );
        }

        self.bind_addr()?;

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "LIVEWATCH_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        Ok(())
    }

    /// Socket address the HTTP surface listens on
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        self.bind_address.parse().map_err(|e| {
            anyhow::anyhow!(
                "LIVEWATCH_BIND_ADDRESS '{}' is not a valid socket address: {}",
                self.bind_address,
                e
            )
        })
    }

    /// Maximum tracing level
    pub fn log_level(&self) -> Level {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }

    /// Whether pushes are logged rather than sent
    pub fn is_dry_run(&self) -> bool {
        self.push_mode == "dry-run"
    }

    /// Convert into the core configuration
    pub fn to_livewatch_config(&self) -> LivewatchConfig {
        let session_store = match (self.session_store_type.as_str(), &self.session_store_path) {
            ("file", Some(path)) => SessionStoreConfig::File { path: path.clone() },
            _ => SessionStoreConfig::Memory,
        };

        LivewatchConfig {
            source: SourceConfig::Chzzk {
                channel_id: self.channel_id.trim().to_string(),
                api_base: Some(self.api_base.clone()),
                timeout_secs: DEFAULT_SOURCE_TIMEOUT_SECS,
            },
            push: PushConfig::Fcm {
                credentials_path: self.fcm_credentials.clone(),
                dry_run: self.is_dry_run(),
            },
            session_store,
            scheduler: SchedulerConfig {
                interval_secs: self.poll_interval_secs,
                ..SchedulerConfig::default()
            },
            notifications: NotificationTemplates::default(),
        }
    }
}

fn check_parent_exists(var: &str, path: &str) -> Result<()> {
    if let Some(parent) = Path::new(path).parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        anyhow::bail!(
            "{} parent directory does not exist: {}. \
            Create it first: sudo mkdir -p {}",
            var,
            parent.display(),
            parent.display()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    fn minimal() -> Vec<(&'static str, &'static str)> {
        vec![
            ("LIVEWATCH_CHANNEL_ID", "a1b2c3d4e5"),
            ("LIVEWATCH_PUSH_MODE", "dry-run"),
            ("LIVEWATCH_SESSION_STORE_TYPE", "memory"),
        ]
    }

    #[test]
    fn defaults_apply() {
        let config = config(&minimal()).unwrap();
        config.validate().unwrap();

        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert_eq!(config.poll_interval_secs, 60);
        assert_eq!(config.bind_address, "0.0.0.0:8080");
        assert_eq!(config.log_level(), Level::INFO);
        assert!(config.is_dry_run());
    }

    #[test]
    fn channel_id_is_required() {
        let config = config(&[("LIVEWATCH_PUSH_MODE", "dry-run")]).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("LIVEWATCH_CHANNEL_ID is required"));
    }

    #[test]
    fn live_push_needs_credentials() {
        let config = config(&[
            ("LIVEWATCH_CHANNEL_ID", "a1b2c3d4e5"),
            ("LIVEWATCH_SESSION_STORE_TYPE", "memory"),
        ])
        .unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("LIVEWATCH_FCM_CREDENTIALS"));
    }

    #[test]
    fn unknown_push_mode_is_rejected() {
        let mut vars = minimal();
        vars[1] = ("LIVEWATCH_PUSH_MODE", "carrier-pigeon");
        assert!(config(&vars).unwrap().validate().is_err());
    }

    #[test]
    fn file_store_needs_a_path() {
        let mut vars = minimal();
        vars[2] = ("LIVEWATCH_SESSION_STORE_TYPE", "file");
        let err = config(&vars).unwrap().validate().unwrap_err();
        assert!(err.to_string().contains("LIVEWATCH_SESSION_STORE_PATH is required"));
    }

    #[test]
    fn file_store_parent_must_exist() {
        let mut vars = minimal();
        vars[2] = ("LIVEWATCH_SESSION_STORE_TYPE", "file");
        vars.push(("LIVEWATCH_SESSION_STORE_PATH", "/nonexistent/livewatch/sessions.json"));
        let err = config(&vars).unwrap().validate().unwrap_err();
        assert!(err.to_string().contains("parent directory does not exist"));
    }

    #[test]
    fn poll_interval_range_is_enforced() {
        for (raw, ok) in [("9", false), ("10", true), ("3600", true), ("3601", false)] {
            let mut vars = minimal();
            vars.push(("LIVEWATCH_POLL_INTERVAL_SECS", raw));
            assert_eq!(config(&vars).unwrap().validate().is_ok(), ok, "interval {}", raw);
        }
    }

    #[test]
    fn non_numeric_poll_interval_fails_to_load() {
        let mut vars = minimal();
        vars.push(("LIVEWATCH_POLL_INTERVAL_SECS", "soon"));
        assert!(config(&vars).is_err());
    }

    #[test]
    fn bad_bind_address_is_rejected() {
        let mut vars = minimal();
        vars.push(("LIVEWATCH_BIND_ADDRESS", "localhost"));
        assert!(config(&vars).unwrap().validate().is_err());
    }

    #[test]
    fn bad_log_level_is_rejected() {
        let mut vars = minimal();
        vars.push(("LIVEWATCH_LOG_LEVEL", "loud"));
        assert!(config(&vars).unwrap().validate().is_err());
    }

    #[test]
    fn converts_into_core_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sessions.json").display().to_string();

        let mut vars: Vec<(&str, &str)> = minimal();
        vars[2] = ("LIVEWATCH_SESSION_STORE_TYPE", "file");
        vars.push(("LIVEWATCH_SESSION_STORE_PATH", path.as_str()));
        vars.push(("LIVEWATCH_POLL_INTERVAL_SECS", "30"));

        let config = config(&vars).unwrap();
        config.validate().unwrap();

        let core = config.to_livewatch_config();
        core.validate().unwrap();
        assert_eq!(core.source.channel_id(), "a1b2c3d4e5");
        assert_eq!(core.scheduler.interval_secs, 30);
        assert!(matches!(
            core.session_store,
            SessionStoreConfig::File { path: ref p } if *p == path
        ));
        assert!(matches!(core.push, PushConfig::Fcm { dry_run: true, .. }));
    }
}
