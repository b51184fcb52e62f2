// Configuration module
//
// Read once at startup. Local runs use a JSON file (`env.json` by default);
// production deployments (`BLANKET_ENV=production`) read environment variables.

use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::data_types::TableSelector;
use crate::pipelines::SpreadsheetSource;
use crate::sheets::{google, ServiceAccountCredentials};

pub const ENV_VAR: &str = "BLANKET_ENV";
pub const CONFIG_PATH_VAR: &str = "BLANKET_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "env.json";
pub const DEFAULT_PLAN_SHEET_NAME: &str = "overview";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("invalid configuration in {origin}: {source}")]
    Parse {
        origin: String,
        source: serde_json::Error,
    },

    #[error("missing environment variable {0}")]
    MissingVar(&'static str),

    #[error("invalid value for {name}: {value:?}")]
    InvalidVar { name: &'static str, value: String },

    #[error("no service account credentials configured")]
    MissingCredentials,
}

/// Where configuration comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deployment {
    Local,
    Production,
}

impl Deployment {
    pub fn from_env_value(value: Option<&str>) -> Self {
        match value {
            Some("production") => Deployment::Production,
            _ => Deployment::Local,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
    pub spreadsheet: SpreadsheetSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// 0 lets actix pick one worker per core.
    #[serde(default)]
    pub workers: usize,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpreadsheetSettings {
    /// Spreadsheet id, or its full URL.
    pub spreadsheet_id: String,
    pub accounts_sheet_id: i32,
    #[serde(default)]
    pub working_fund_sheet_id: Option<i32>,
    #[serde(default = "default_plan_sheet_name")]
    pub plan_sheet_name: String,
    #[serde(default)]
    pub service_account: Option<ServiceAccountCredentials>,
    #[serde(default)]
    pub service_account_key_file: Option<PathBuf>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout() -> u64 {
    60
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "compact".to_string()
}

fn default_plan_sheet_name() -> String {
    DEFAULT_PLAN_SHEET_NAME.to_string()
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: 0,
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl AppConfig {
    /// Loads configuration for the current deployment.
    pub fn load() -> Result<Self, ConfigError> {
        let lookup = |key: &str| std::env::var(key).ok();
        match Deployment::from_env_value(lookup(ENV_VAR).as_deref()) {
            Deployment::Local => {
                let path = lookup(CONFIG_PATH_VAR)
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
                Self::from_file(&path)
            }
            Deployment::Production => Self::from_vars(lookup),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&json).map_err(|source| ConfigError::Parse {
            origin: path.display().to_string(),
            source,
        })
    }

    pub fn from_vars<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let service_account = match (
            lookup("BLANKET_CLIENT_EMAIL"),
            lookup("BLANKET_PRIVATE_KEY"),
        ) {
            // Keys pasted into env vars usually carry escaped newlines.
            (Some(email), Some(key)) => Some(ServiceAccountCredentials::new(
                email,
                key.replace("\\n", "\n"),
            )),
            _ => None,
        };

        let defaults = ServerSettings::default();
        let server = ServerSettings {
            host: lookup("BLANKET_HOST").unwrap_or(defaults.host),
            port: parsed(&lookup, "BLANKET_PORT")?.unwrap_or(defaults.port),
            workers: parsed(&lookup, "BLANKET_WORKERS")?.unwrap_or(defaults.workers),
            request_timeout_secs: parsed(&lookup, "BLANKET_REQUEST_TIMEOUT_SECS")?
                .unwrap_or(defaults.request_timeout_secs),
        };

        let defaults = LoggingSettings::default();
        let logging = LoggingSettings {
            level: lookup("BLANKET_LOG_LEVEL").unwrap_or(defaults.level),
            format: lookup("BLANKET_LOG_FORMAT").unwrap_or(defaults.format),
        };

        let spreadsheet = SpreadsheetSettings {
            spreadsheet_id: required(&lookup, "BLANKET_SPREADSHEET_ID")?,
            accounts_sheet_id: parsed(&lookup, "BLANKET_ACCOUNTS_SHEET_ID")?
                .ok_or(ConfigError::MissingVar("BLANKET_ACCOUNTS_SHEET_ID"))?,
            working_fund_sheet_id: parsed(&lookup, "BLANKET_WORKING_FUND_SHEET_ID")?,
            plan_sheet_name: lookup("BLANKET_PLAN_SHEET_NAME")
                .unwrap_or_else(default_plan_sheet_name),
            service_account,
            service_account_key_file: lookup("BLANKET_SERVICE_ACCOUNT_KEY_FILE")
                .map(PathBuf::from),
        };

        Ok(AppConfig {
            server,
            logging,
            spreadsheet,
        })
    }

    /// Resolves credentials and table selectors for the pipelines.
    pub fn source(&self) -> Result<SpreadsheetSource, ConfigError> {
        let settings = &self.spreadsheet;
        let credentials = match (&settings.service_account, &settings.service_account_key_file) {
            (Some(inline), _) => inline.clone(),
            (None, Some(path)) => read_key_file(path)?,
            (None, None) => return Err(ConfigError::MissingCredentials),
        };

        Ok(SpreadsheetSource {
            spreadsheet_id: google::spreadsheet_id(&settings.spreadsheet_id).to_string(),
            credentials,
            accounts_table: TableSelector::ById(settings.accounts_sheet_id),
            working_fund_table: TableSelector::ById(
                settings
                    .working_fund_sheet_id
                    .unwrap_or(settings.accounts_sheet_id),
            ),
            plan_table: TableSelector::ByName(settings.plan_sheet_name.clone()),
        })
    }
}

fn read_key_file(path: &Path) -> Result<ServiceAccountCredentials, ConfigError> {
    let json = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&json).map_err(|source| ConfigError::Parse {
        origin: path.display().to_string(),
        source,
    })
}

fn required<F>(lookup: &F, name: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name).ok_or(ConfigError::MissingVar(name))
}

fn parsed<F, T>(lookup: &F, name: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    lookup(name)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidVar { name, value })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const MINIMAL: &str = r#"{
        "spreadsheet": {
            "spreadsheet_id": "https://docs.google.com/spreadsheets/d/abc123/edit",
            "accounts_sheet_id": 1873,
            "service_account": {
                "client_email": "reader@example.iam.gserviceaccount.com",
                "private_key": "-----KEY-----"
            }
        }
    }"#;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn json_config_fills_defaults() {
        let config: AppConfig = serde_json::from_str(MINIMAL).unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.request_timeout_secs, 60);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.spreadsheet.plan_sheet_name, "overview");
    }

    #[test]
    fn source_resolves_selectors_and_spreadsheet_id() {
        let config: AppConfig = serde_json::from_str(MINIMAL).unwrap();

        let source = config.source().unwrap();

        assert_eq!(source.spreadsheet_id, "abc123");
        assert_eq!(source.accounts_table, TableSelector::ById(1873));
        assert_eq!(source.working_fund_table, TableSelector::ById(1873));
        assert_eq!(source.plan_table, TableSelector::by_name("overview"));
        assert_eq!(source.credentials.token_uri, crate::sheets::DEFAULT_TOKEN_URI);
    }

    #[test]
    fn credentials_can_come_from_a_key_file() {
        let path = std::env::temp_dir().join(format!("blanket-key-{}.json", std::process::id()));
        fs::write(
            &path,
            r#"{"type": "service_account", "project_id": "blanket",
                "client_email": "file@example.iam.gserviceaccount.com",
                "private_key": "-----FILE KEY-----",
                "token_uri": "https://oauth2.example.com/token"}"#,
        )
        .unwrap();

        let mut config: AppConfig = serde_json::from_str(MINIMAL).unwrap();
        config.spreadsheet.service_account = None;
        config.spreadsheet.service_account_key_file = Some(path.clone());
        let source = config.source();
        let _ = fs::remove_file(&path);

        let credentials = source.unwrap().credentials;
        assert_eq!(credentials.client_email, "file@example.iam.gserviceaccount.com");
        assert_eq!(credentials.token_uri, "https://oauth2.example.com/token");
    }

    #[test]
    fn missing_credentials_are_reported() {
        let mut config: AppConfig = serde_json::from_str(MINIMAL).unwrap();
        config.spreadsheet.service_account = None;

        assert!(matches!(config.source(), Err(ConfigError::MissingCredentials)));
    }

    #[test]
    fn production_config_comes_from_environment() {
        let lookup = vars(&[
            ("BLANKET_SPREADSHEET_ID", "abc123"),
            ("BLANKET_ACCOUNTS_SHEET_ID", "42"),
            ("BLANKET_WORKING_FUND_SHEET_ID", "7"),
            ("BLANKET_CLIENT_EMAIL", "svc@example.com"),
            ("BLANKET_PRIVATE_KEY", "line1\\nline2"),
            ("BLANKET_PORT", "5001"),
        ]);

        let config = AppConfig::from_vars(lookup).unwrap();
        let source = config.source().unwrap();

        assert_eq!(config.server.port, 5001);
        assert_eq!(source.accounts_table, TableSelector::ById(42));
        assert_eq!(source.working_fund_table, TableSelector::ById(7));
        assert_eq!(source.credentials.private_key, "line1\nline2");
    }

    #[test]
    fn production_config_rejects_missing_or_bad_values() {
        let err = AppConfig::from_vars(vars(&[("BLANKET_ACCOUNTS_SHEET_ID", "1")])).unwrap_err();
        assert_eq!(err.to_string(), "missing environment variable BLANKET_SPREADSHEET_ID");

        let err = AppConfig::from_vars(vars(&[
            ("BLANKET_SPREADSHEET_ID", "abc"),
            ("BLANKET_ACCOUNTS_SHEET_ID", "first"),
        ]))
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid value for BLANKET_ACCOUNTS_SHEET_ID: \"first\""
        );
    }

    #[test]
    fn deployment_is_local_unless_production() {
        assert_eq!(Deployment::from_env_value(None), Deployment::Local);
        assert_eq!(Deployment::from_env_value(Some("dev")), Deployment::Local);
        assert_eq!(
            Deployment::from_env_value(Some("production")),
            Deployment::Production
        );
    }
}
