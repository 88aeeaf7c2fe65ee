// Environment overrides

use std::path::PathBuf;

pub const CONFIG_PATH_VAR: &str = "BILLSYNC_CONFIG";
pub const GATEWAY_URL_VAR: &str = "BILLSYNC_GATEWAY_URL";
pub const GATEWAY_TOKEN_VAR: &str = "BILLSYNC_GATEWAY_TOKEN";

/// Environment values that affect settings resolution. Captured once so
/// loading stays a pure function of its inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvOverrides {
    pub config_path: Option<PathBuf>,
    pub gateway_url: Option<String>,
    pub gateway_token: Option<String>,
}

impl EnvOverrides {
    pub fn from_process_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        Self {
            config_path: var(CONFIG_PATH_VAR).map(PathBuf::from),
            gateway_url: var(GATEWAY_URL_VAR),
            gateway_token: var(GATEWAY_TOKEN_VAR),
        }
    }
}
