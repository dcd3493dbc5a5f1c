use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};

use crate::error::AppError;

/// Environment variables that override the credential fields
pub const TENANT_ID_ENV: &str = "AZ_TENANT_ID";
pub const CLIENT_ID_ENV: &str = "AZ_CLIENT_ID";
pub const CLIENT_SECRET_ENV: &str = "AZ_CLIENT_SECRET";
pub const SUBSCRIPTION_ID_ENV: &str = "AZ_SUBSCRIPTION_ID";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub azure: AzureConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// "text" or "json"
    #[serde(default = "default_log_format")]
    pub log_format: String,
    /// Directory holding index.html and other landing page assets
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            log_format: default_log_format(),
            static_dir: default_static_dir(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AzureConfig {
    #[serde(default)]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub subscription_id: Option<String>,

    /// Token endpoint host; tokens are requested from `{authority_host}/{tenant}/oauth2/v2.0/token`
    #[serde(default = "default_authority_host")]
    pub authority_host: String,
    #[serde(default = "default_management_host")]
    pub management_host: String,
    #[serde(default = "default_management_scope")]
    pub management_scope: String,
    #[serde(default = "default_graph_scope")]
    pub graph_scope: String,
    #[serde(default = "default_cost_api_version")]
    pub cost_api_version: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    /// Hosts the usage report endpoint may point at
    #[serde(
        default = "default_allowed_report_hosts",
        deserialize_with = "deserialize_host_list"
    )]
    pub allowed_report_hosts: Vec<String>,
}

impl Default for AzureConfig {
    fn default() -> Self {
        Self {
            tenant_id: None,
            client_id: None,
            client_secret: None,
            subscription_id: None,
            authority_host: default_authority_host(),
            management_host: default_management_host(),
            management_scope: default_management_scope(),
            graph_scope: default_graph_scope(),
            cost_api_version: default_cost_api_version(),
            timeout_seconds: default_timeout_seconds(),
            allowed_report_hosts: default_allowed_report_hosts(),
        }
    }
}

/// Service principal credentials for the client-credential flow
#[derive(Clone)]
pub struct ClientCredentials {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
}

impl std::fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .finish()
    }
}

impl AzureConfig {
    /// Tenant, client id and secret, or a config error naming what is missing.
    pub fn client_credentials(&self) -> Result<ClientCredentials, AppError> {
        let (tenant_id, client_id, client_secret) = (
            present(&self.tenant_id),
            present(&self.client_id),
            present(&self.client_secret),
        );

        match (tenant_id, client_id, client_secret) {
            (Some(tenant_id), Some(client_id), Some(client_secret)) => Ok(ClientCredentials {
                tenant_id: tenant_id.to_string(),
                client_id: client_id.to_string(),
                client_secret: client_secret.to_string(),
            }),
            _ => Err(missing_error(&[
                (TENANT_ID_ENV, tenant_id.is_some()),
                (CLIENT_ID_ENV, client_id.is_some()),
                (CLIENT_SECRET_ENV, client_secret.is_some()),
            ])),
        }
    }

    /// Client credentials plus a subscription id.
    ///
    /// `override_id` (from the request) takes precedence over the configured one.
    pub fn subscription_credentials(
        &self,
        override_id: Option<&str>,
    ) -> Result<(ClientCredentials, String), AppError> {
        let subscription = override_id
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .or_else(|| present(&self.subscription_id));

        match (self.client_credentials(), subscription) {
            (Ok(creds), Some(sub)) => Ok((creds, sub.to_string())),
            (_, sub) => Err(missing_error(&[
                (TENANT_ID_ENV, present(&self.tenant_id).is_some()),
                (CLIENT_ID_ENV, present(&self.client_id).is_some()),
                (CLIENT_SECRET_ENV, present(&self.client_secret).is_some()),
                (SUBSCRIPTION_ID_ENV, sub.is_some()),
            ])),
        }
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn missing_error(fields: &[(&str, bool)]) -> AppError {
    let missing: Vec<&str> = fields
        .iter()
        .filter(|(_, ok)| !ok)
        .map(|(name, _)| *name)
        .collect();
    AppError::ConfigError(format!("Missing credential configuration: {}", missing.join(", ")))
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("static")
}

fn default_max_upload_bytes() -> usize {
    20 * 1024 * 1024
}

fn default_authority_host() -> String {
    "https://login.microsoftonline.com".to_string()
}

fn default_management_host() -> String {
    "https://management.azure.com".to_string()
}

fn default_management_scope() -> String {
    "https://management.azure.com/.default".to_string()
}

fn default_graph_scope() -> String {
    "https://graph.microsoft.com/.default".to_string()
}

fn default_cost_api_version() -> String {
    "2021-10-01".to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_allowed_report_hosts() -> Vec<String> {
    vec!["graph.microsoft.com".to_string()]
}

/// Accept a list or a comma-separated string, so a single environment
/// variable can set every host.
fn deserialize_host_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum HostList {
        List(Vec<String>),
        Joined(String),
    }

    Ok(match HostList::deserialize(deserializer)? {
        HostList::List(hosts) => hosts,
        HostList::Joined(joined) => joined.split(',').map(|host| host.trim().to_string()).collect(),
    })
}

/// Load configuration from `path` (optional), `COST_ANALYTICS__*` environment
/// variables and the `AZ_*` credential variables, in increasing precedence.
pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    let settings = config::Config::builder()
        .add_source(config::File::from(path).required(false))
        .add_source(environment())
        .set_override_option("azure.tenant_id", env_value(TENANT_ID_ENV))?
        .set_override_option("azure.client_id", env_value(CLIENT_ID_ENV))?
        .set_override_option("azure.client_secret", env_value(CLIENT_SECRET_ENV))?
        .set_override_option("azure.subscription_id", env_value(SUBSCRIPTION_ID_ENV))?
        .build()?;

    let cfg: Config = settings.try_deserialize()?;
    validate_config(&cfg)?;

    Ok(cfg)
}

/// `COST_ANALYTICS__SECTION__KEY` variables override file values
fn environment() -> config::Environment {
    config::Environment::with_prefix("COST_ANALYTICS").separator("__")
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

pub fn validate_config(cfg: &Config) -> anyhow::Result<()> {
    if cfg.server.port == 0 {
        anyhow::bail!("server.port must be non-zero");
    }

    if !matches!(cfg.server.log_format.as_str(), "text" | "json") {
        anyhow::bail!(
            "server.log_format must be 'text' or 'json', got '{}'",
            cfg.server.log_format
        );
    }

    if cfg.server.max_upload_bytes == 0 {
        anyhow::bail!("server.max_upload_bytes must be greater than zero");
    }

    if cfg.azure.timeout_seconds == 0 {
        anyhow::bail!("azure.timeout_seconds must be greater than zero");
    }

    for (name, value) in [
        ("azure.authority_host", &cfg.azure.authority_host),
        ("azure.management_host", &cfg.azure.management_host),
    ] {
        let parsed = url::Url::parse(value)
            .map_err(|e| anyhow::anyhow!("{} is not a valid URL ({}): {}", name, value, e))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            anyhow::bail!("{} must use http or https, got '{}'", name, value);
        }
    }

    if cfg.azure.allowed_report_hosts.iter().any(|h| h.trim().is_empty()) {
        anyhow::bail!("azure.allowed_report_hosts cannot contain empty entries");
    }

    Ok(())
}
