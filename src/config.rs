use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub monitoring: MonitoringConfig,
    #[serde(default)]
    pub email: EmailConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    Sqlite,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    #[serde(default = "default_db_path")]
    pub path: String,
    #[serde(default = "default_max_pool_size")]
    pub max_pool_size: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            path: default_db_path(),
            max_pool_size: default_max_pool_size(),
        }
    }
}

fn default_db_path() -> String {
    "data/mondash.db".into()
}

fn default_max_pool_size() -> u32 {
    5
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitoringConfig {
    /// How often the alert monitor scans device statuses.
    #[serde(default = "default_scan_interval_secs")]
    pub scan_interval_secs: u64,
    /// Upper bound for a single notification delivery.
    #[serde(default = "default_notify_timeout_secs")]
    pub notify_timeout_secs: u64,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            scan_interval_secs: default_scan_interval_secs(),
            notify_timeout_secs: default_notify_timeout_secs(),
        }
    }
}

fn default_scan_interval_secs() -> u64 {
    5
}

fn default_notify_timeout_secs() -> u64 {
    10
}

impl MonitoringConfig {
    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval_secs)
    }

    pub fn notify_timeout(&self) -> Duration {
        Duration::from_secs(self.notify_timeout_secs)
    }
}

/// SMTP settings for alert emails. Completeness is checked when sending, not here.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmailConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub smtp_host: String,
    #[serde(default)]
    pub smtp_port: Option<u16>,
    #[serde(default)]
    pub smtp_user: String,
    #[serde(default)]
    pub smtp_pass: String,
    #[serde(default)]
    pub smtp_from: String,
}

/// Shared token that report-ingesting clients send in `X-Auth-Token`.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_auth_token")]
    pub token: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token: default_auth_token(),
        }
    }
}

pub const DEFAULT_AUTH_TOKEN: &str = "abc";

fn default_auth_token() -> String {
    DEFAULT_AUTH_TOKEN.into()
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)?;
        let mut config = Self::load_from_str(&s)?;
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Applies EMAIL_ON_ALERT, SMTP_*, SCAN_INTERVAL_SECS and AUTH_TOKEN on top of the file values.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("EMAIL_ON_ALERT") {
            self.email.enabled = v.trim().eq_ignore_ascii_case("true");
        }
        if let Some(v) = lookup("SMTP_HOST") {
            self.email.smtp_host = v;
        }
        if let Some(v) = lookup("SMTP_PORT") {
            let v = v.trim();
            self.email.smtp_port = if v.is_empty() {
                None
            } else {
                Some(
                    v.parse()
                        .map_err(|e| anyhow::anyhow!("SMTP_PORT {:?}: {}", v, e))?,
                )
            };
        }
        if let Some(v) = lookup("SMTP_USERNAME") {
            self.email.smtp_user = v;
        }
        if let Some(v) = lookup("SMTP_PASSWORD") {
            self.email.smtp_pass = v;
        }
        if let Some(v) = lookup("SMTP_FROM") {
            self.email.smtp_from = v;
        }
        if let Some(v) = lookup("SCAN_INTERVAL_SECS") {
            self.monitoring.scan_interval_secs = v
                .trim()
                .parse()
                .map_err(|e| anyhow::anyhow!("SCAN_INTERVAL_SECS {:?}: {}", v, e))?;
        }
        if let Some(v) = lookup("AUTH_TOKEN") {
            self.auth.token = v.trim().to_string();
        }
        Ok(())
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        if self.storage.backend == StorageBackend::Sqlite {
            anyhow::ensure!(
                !self.storage.path.is_empty(),
                "storage.path must be non-empty for the sqlite backend"
            );
        }
        anyhow::ensure!(
            self.storage.max_pool_size > 0,
            "storage.max_pool_size must be > 0, got {}",
            self.storage.max_pool_size
        );
        anyhow::ensure!(
            self.monitoring.scan_interval_secs > 0,
            "monitoring.scan_interval_secs must be > 0, got {}",
            self.monitoring.scan_interval_secs
        );
        anyhow::ensure!(
            self.monitoring.notify_timeout_secs > 0,
            "monitoring.notify_timeout_secs must be > 0, got {}",
            self.monitoring.notify_timeout_secs
        );
        anyhow::ensure!(
            !self.auth.token.trim().is_empty(),
            "auth.token must be non-empty"
        );
        Ok(())
    }
}
