//! Backup configuration file.
//!
//! The configuration is a single JSON object. Keys starting with `comment-`
//! carry documentation in the sample file and are ignored when loading.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, FixedOffset};
use env_logger::Env;
use serde::{Deserialize, Serialize};

use crate::domains::backup::{BackupOptions, ObjectFilter, RESTRICTED_OBJECTS};
use crate::errors::{ConfigError, ConfigResult};
use crate::session::DEFAULT_API_VERSION;

pub const DEFAULT_LOGIN_URL: &str = "https://login.salesforce.com";
pub const DEFAULT_LOG_FILTER: &str = "info";

const SAMPLE_CONFIG: &str = r#"{
"url": "https://login.salesforce.com",
"username": "yoursalesforce@user.name",
"password": "qwerty",
"token": "1234567890",
"path": "/path/to/backup/files-{YYYY}-{MM}-{DD}",
"include": [ "objects", "to", "include" ],
"comment-include-exclude": "use either include or exclude, empty or missing include means all objects.",
"hours": 24,
"comment-hours": "set 0 or delete for initial backups, for deltas set to frequency.",
"email": {
  "server": "smtp.server:port",
  "user": "user.if.needed",
  "password": "password.if.needed",
  "from": "email.from@me.me",
  "to": [ "first.admin@me.me", "second.admin@me.me" ]
},
"comment-email": "delete the email section or leave 'to' empty to print the report to the console.",
"log": "info",
"comment-log": "log filter, e.g. 'sf_backup=debug'; RUST_LOG takes precedence.",
"api_version": "59.0"
}
"#;

fn default_url() -> String {
    DEFAULT_LOGIN_URL.to_string()
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailConfig {
    /// `host:port` of an SMTP server speaking implicit TLS
    #[serde(default)]
    pub server: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub to: Vec<String>,
}

impl EmailConfig {
    /// Email delivery is on when there is at least one recipient
    pub fn enabled(&self) -> bool {
        !self.to.is_empty()
    }

    /// Split `server` into host and port.
    pub fn server_address(&self) -> ConfigResult<(String, u16)> {
        let invalid = |reason: &str| ConfigError::EmailServer {
            server: self.server.clone(),
            reason: reason.to_string(),
        };

        let (host, port) = self
            .server
            .rsplit_once(':')
            .ok_or_else(|| invalid("missing port in address"))?;
        let host = host.trim_start_matches('[').trim_end_matches(']');
        if host.is_empty() {
            return Err(invalid("missing host"));
        }
        let port = port
            .parse::<u16>()
            .map_err(|e| invalid(&format!("invalid port: {}", e)))?;

        Ok((host.to_string(), port))
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.enabled() {
            self.server_address()?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupConfig {
    #[serde(default = "default_url")]
    pub url: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub token: String,
    /// Output directory; `{YYYY}`, `{MM}` and `{DD}` expand to the run date
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
    /// Incremental window in hours; 0 means a full backup
    #[serde(default)]
    pub hours: i64,
    #[serde(default)]
    pub email: Option<EmailConfig>,
    #[serde(default)]
    pub log: Option<String>,
    #[serde(default = "default_api_version")]
    pub api_version: String,
}

impl BackupConfig {
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&content, path)
    }

    fn parse(content: &str, path: &Path) -> ConfigResult<Self> {
        serde_json::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Check the fields a run starting at `now` cannot do without.
    pub fn validate(&self, now: &DateTime<FixedOffset>) -> ConfigResult<()> {
        if self.url.trim().is_empty() {
            return Err(ConfigError::required("url"));
        }
        if self.username.trim().is_empty() {
            return Err(ConfigError::required("username"));
        }
        if self.path.trim().is_empty() {
            return Err(ConfigError::required("path"));
        }
        self.since(now)?;
        if let Some(email) = &self.email {
            email.validate()?;
        }
        Ok(())
    }

    /// Password with the security token appended, as the login call expects
    pub fn login_password(&self) -> String {
        format!("{}{}", self.password, self.token)
    }

    pub fn output_dir(&self, now: &DateTime<FixedOffset>) -> PathBuf {
        let expanded = self
            .path
            .replace("{YYYY}", &now.format("%Y").to_string())
            .replace("{MM}", &now.format("%m").to_string())
            .replace("{DD}", &now.format("%d").to_string());
        PathBuf::from(expanded)
    }

    /// Incremental boundary, or `None` for a full backup
    pub fn since(
        &self,
        now: &DateTime<FixedOffset>,
    ) -> ConfigResult<Option<DateTime<FixedOffset>>> {
        if self.hours <= 0 {
            return Ok(None);
        }
        Duration::try_hours(self.hours)
            .and_then(|window| now.checked_sub_signed(window))
            .map(Some)
            .ok_or(ConfigError::Hours { hours: self.hours })
    }

    pub fn object_filter(&self) -> ObjectFilter {
        ObjectFilter::new(self.include.as_slice(), self.exclude.as_slice(), RESTRICTED_OBJECTS)
    }

    pub fn backup_options(&self, now: &DateTime<FixedOffset>) -> ConfigResult<BackupOptions> {
        Ok(BackupOptions {
            output_dir: self.output_dir(now),
            since: self.since(now)?,
            filter: self.object_filter(),
        })
    }

    /// Initialise the global logger. `RUST_LOG` takes precedence over the
    /// configured filter.
    pub fn init_logging(&self) {
        let filter = self
            .log
            .as_deref()
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .unwrap_or(DEFAULT_LOG_FILTER);
        let _ = env_logger::Builder::from_env(Env::default().default_filter_or(filter)).try_init();
    }
}

/// Write a documented sample configuration. The file must not exist yet.
pub fn write_sample(path: &Path) -> ConfigResult<()> {
    let sample_error = |source| ConfigError::Sample {
        path: path.display().to_string(),
        source,
    };

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(sample_error)?;
    file.write_all(SAMPLE_CONFIG.as_bytes()).map_err(sample_error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::catalog::ObjectSummary;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn now() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(3600)
            .unwrap()
            .with_ymd_and_hms(2024, 3, 7, 22, 15, 0)
            .unwrap()
    }

    fn minimal() -> BackupConfig {
        serde_json::from_str(r#"{"username": "u@example.com", "path": "/backups"}"#).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = minimal();
        assert_eq!(config.url, DEFAULT_LOGIN_URL);
        assert_eq!(config.api_version, DEFAULT_API_VERSION);
        assert_eq!(config.hours, 0);
        assert!(config.email.is_none());
        assert!(config.include.is_empty());
        assert!(config.validate(&now()).is_ok());
    }

    #[test]
    fn test_sample_parses_and_ignores_comments() {
        let config: BackupConfig = serde_json::from_str(SAMPLE_CONFIG).unwrap();
        assert_eq!(config.username, "yoursalesforce@user.name");
        assert_eq!(config.hours, 24);
        assert_eq!(config.include, vec!["objects", "to", "include"]);
        assert_eq!(config.login_password(), "qwerty1234567890");
        let email = config.email.unwrap();
        assert!(email.enabled());
        // the sample server is a placeholder
        assert!(email.validate().is_err());
    }

    #[test]
    fn test_output_dir_placeholders() {
        let mut config = minimal();
        config.path = "/backups/files-{YYYY}-{MM}-{DD}".to_string();
        assert_eq!(config.output_dir(&now()), PathBuf::from("/backups/files-2024-03-07"));
    }

    #[test]
    fn test_since() {
        let mut config = minimal();
        assert_eq!(config.since(&now()).unwrap(), None);

        config.hours = 24;
        let since = config.since(&now()).unwrap().unwrap();
        assert_eq!(since, now() - Duration::hours(24));
        assert_eq!(since.offset(), now().offset());

        config.hours = -5;
        assert_eq!(config.since(&now()).unwrap(), None);
    }

    #[test]
    fn test_out_of_range_hours_are_rejected() {
        for hours in [10_000_000_000, i64::MAX] {
            let mut config = minimal();
            config.hours = hours;

            assert!(matches!(
                config.since(&now()).unwrap_err(),
                ConfigError::Hours { hours: h } if h == hours
            ));
            assert!(matches!(
                config.validate(&now()).unwrap_err(),
                ConfigError::Hours { .. }
            ));
            assert!(config.backup_options(&now()).is_err());
        }
    }

    #[test]
    fn test_backup_options() {
        let mut config = minimal();
        config.hours = 1;
        config.exclude = vec!["Case".to_string()];

        let options = config.backup_options(&now()).unwrap();
        assert_eq!(options.output_dir, PathBuf::from("/backups"));
        assert_eq!(options.since, Some(now() - Duration::hours(1)));
        assert!(!options.filter.accepts(&ObjectSummary::new("case", true, true)));
    }

    #[test]
    fn test_required_fields() {
        let config: BackupConfig = serde_json::from_str(r#"{"path": "/b"}"#).unwrap();
        let err = config.validate(&now()).unwrap_err();
        assert_eq!(err.to_string(), "Field 'username' is required");
    }

    #[test]
    fn test_email_server_address() {
        let mut email = EmailConfig {
            server: "smtp.example.com:465".to_string(),
            to: vec!["ops@example.com".to_string()],
            ..Default::default()
        };
        assert_eq!(
            email.server_address().unwrap(),
            ("smtp.example.com".to_string(), 465)
        );

        email.server = "[::1]:2465".to_string();
        assert_eq!(email.server_address().unwrap(), ("::1".to_string(), 2465));

        email.server = "smtp.example.com".to_string();
        assert!(matches!(
            email.validate().unwrap_err(),
            ConfigError::EmailServer { .. }
        ));

        // no recipients, nothing to validate
        email.to.clear();
        assert!(email.validate().is_ok());
    }

    #[test]
    fn test_load_errors() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(matches!(
            BackupConfig::load(&missing).unwrap_err(),
            ConfigError::Read { .. }
        ));

        let broken = dir.path().join("broken.json");
        fs::write(&broken, "{ not json").unwrap();
        assert!(matches!(
            BackupConfig::load(&broken).unwrap_err(),
            ConfigError::Parse { .. }
        ));
    }

    #[test]
    fn test_write_sample_refuses_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("backup.json");

        write_sample(&path).unwrap();
        let loaded = BackupConfig::load(&path).unwrap();
        assert_eq!(loaded.url, DEFAULT_LOGIN_URL);

        assert!(matches!(
            write_sample(&path).unwrap_err(),
            ConfigError::Sample { .. }
        ));
    }
}
