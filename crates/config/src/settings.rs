// Run settings
// Loaded from --config, $BILLSYNC_CONFIG, or ~/.config/billsync/config.toml

use std::fs;
use std::path::{Path, PathBuf};

use billsync_gateway::BatchPolicy;
use billsync_io::RecordSchema;
use billsync_recon::DuplicatePolicy;
use serde::{Deserialize, Serialize};

use crate::env::EnvOverrides;
use crate::ConfigError;

pub const MAX_RETRIES_LIMIT: u32 = 10;

/// Ledger connection settings. The token is never read from the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewaySettings {
    /// qbXML request processor URL
    pub endpoint: String,

    /// Application name announced to the request processor
    pub app_name: String,

    pub qbxml_version: String,

    pub timeout_secs: u64,

    pub max_retries: u32,

    pub batch_policy: BatchPolicy,

    #[serde(skip)]
    pub token: Option<String>,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            app_name: "billsync".to_string(),
            qbxml_version: billsync_gateway::qbxml::DEFAULT_QBXML_VERSION.to_string(),
            timeout_secs: billsync_gateway::transport::DEFAULT_TIMEOUT_SECS,
            max_retries: billsync_gateway::transport::DEFAULT_MAX_RETRIES,
            batch_policy: BatchPolicy::default(),
            token: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkbookSettings {
    /// Worksheet name; first sheet when unset
    pub sheet: Option<String>,

    pub columns: RecordSchema,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompareSettings {
    pub on_duplicate: DuplicatePolicy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    pub path: PathBuf,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("comparison_report.json"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub gateway: GatewaySettings,
    pub workbook: WorkbookSettings,
    pub compare: CompareSettings,
    pub report: ReportSettings,
}

/// Settings plus the file they came from, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedSettings {
    pub settings: Settings,
    pub source: Option<PathBuf>,
}

impl Settings {
    /// Default config file location (`<config dir>/billsync/config.toml`).
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("billsync").join("config.toml"))
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Resolve settings: `explicit` path, then `$BILLSYNC_CONFIG`, then the
    /// default location if it exists, then built-in defaults. Environment
    /// overrides are applied last.
    pub fn load(
        explicit: Option<&Path>,
        env: &EnvOverrides,
    ) -> Result<LoadedSettings, ConfigError> {
        let chosen = explicit
            .map(Path::to_path_buf)
            .or_else(|| env.config_path.clone())
            .or_else(|| Self::default_path().filter(|p| p.is_file()));

        let mut settings = match &chosen {
            Some(path) => {
                log::debug!("loading config from {}", path.display());
                Self::from_file(path)?
            }
            None => {
                log::debug!("no config file, using defaults");
                Self::default()
            }
        };
        settings.apply_env(env);

        Ok(LoadedSettings {
            settings,
            source: chosen,
        })
    }

    pub fn apply_env(&mut self, env: &EnvOverrides) {
        if let Some(url) = env.gateway_url.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
            self.gateway.endpoint = url.to_string();
        }
        if let Some(token) = env.gateway_token.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            self.gateway.token = Some(token.to_string());
        }
    }

    /// Check invariants. `needs_gateway` is false for offline commands.
    pub fn validate(&self, needs_gateway: bool) -> Result<(), ConfigError> {
        if needs_gateway && self.gateway.endpoint.trim().is_empty() {
            return Err(ConfigError::Invalid(format!(
                "gateway.endpoint is empty (set it in the config file or via {})",
                crate::env::GATEWAY_URL_VAR
            )));
        }
        if self.gateway.max_retries > MAX_RETRIES_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "gateway.max_retries must be at most {} (got {})",
                MAX_RETRIES_LIMIT, self.gateway.max_retries
            )));
        }
        if self.gateway.timeout_secs == 0 {
            return Err(ConfigError::Invalid("gateway.timeout_secs must be positive".to_string()));
        }
        if self.gateway.qbxml_version.trim().is_empty() {
            return Err(ConfigError::Invalid("gateway.qbxml_version is empty".to_string()));
        }
        let columns = &self.workbook.columns;
        if let Some(empty) = [
            ("key", &columns.key),
            ("line_id", &columns.line_id),
            ("counterparty", &columns.counterparty),
            ("amount", &columns.amount),
            ("date", &columns.date),
            ("category", &columns.category),
        ]
        .iter()
        .find(|(_, name)| name.trim().is_empty())
        {
            return Err(ConfigError::Invalid(format!("workbook.columns.{} is empty", empty.0)));
        }
        Ok(())
    }

    /// TOML rendering for `config show`. The token is omitted.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}
