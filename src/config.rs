use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Environment variable that overrides `bootstrap.admin_password`.
pub const ADMIN_PASSWORD_ENV: &str = "QRPROMO_ADMIN_PASSWORD";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub bootstrap: BootstrapConfig,

    pub codes: CodesConfig,

    pub qr: QrConfig,

    pub security: SecurityConfig,

    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    pub max_db_connections: u32,

    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/qrpromo.db".to_string(),
            log_level: "info".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,

    pub cors_allowed_origins: Vec<String>,

    /// Whether to set the Secure flag on session cookies.
    /// Requires the console to be served over HTTPS.
    pub secure_cookies: bool,

    /// Sessions expire this many hours after login, regardless of activity.
    pub session_ttl_hours: i64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3008,
            cors_allowed_origins: vec![
                "http://localhost:3008".to_string(),
                "http://127.0.0.1:3008".to_string(),
            ],
            secure_cookies: false,
            session_ttl_hours: 24,
        }
    }
}

/// One-time provisioning of the administrator account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    pub admin_username: String,

    /// Initial password for a freshly provisioned admin. Ignored once the
    /// account exists. When unset (and no env override), a random one is
    /// generated and logged once.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_password: Option<String>,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            admin_username: "admin".to_string(),
            admin_password: None,
        }
    }
}

impl BootstrapConfig {
    /// Password from the environment first, then from the file.
    #[must_use]
    pub fn configured_password(&self) -> Option<String> {
        std::env::var(ADMIN_PASSWORD_ENV)
            .ok()
            .filter(|p| !p.is_empty())
            .or_else(|| self.admin_password.clone().filter(|p| !p.is_empty()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CodesConfig {
    pub default_page_size: u64,

    pub max_page_size: u64,

    /// Fresh draws attempted when a generated code collides with an existing one.
    pub max_generation_attempts: u32,
}

impl Default for CodesConfig {
    fn default() -> Self {
        Self {
            default_page_size: 10,
            max_page_size: 100,
            max_generation_attempts: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QrConfig {
    /// Side length of the rendered image in pixels.
    pub size_px: u32,

    /// Quiet zone around the symbol, in modules.
    pub margin_modules: u32,
}

impl Default for QrConfig {
    fn default() -> Self {
        Self {
            size_px: 300,
            margin_modules: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Argon2 memory cost in KiB (default: 8192 = 8MB)
    pub argon2_memory_cost_kib: u32,

    /// Argon2 time cost (iterations)
    pub argon2_time_cost: u32,

    pub argon2_parallelism: u32,

    pub min_password_length: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            argon2_memory_cost_kib: 8192,
            argon2_time_cost: 3,
            argon2_parallelism: 1,
            min_password_length: 6,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,

    pub loki_enabled: bool,

    pub loki_url: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: true,
            loki_enabled: false,
            loki_url: "http://localhost:3100".to_string(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        paths.push(PathBuf::from("config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("qrpromo").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".qrpromo").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.bootstrap.admin_username.trim().is_empty() {
            anyhow::bail!("bootstrap.admin_username cannot be empty");
        }

        if self.codes.default_page_size == 0 || self.codes.max_page_size == 0 {
            anyhow::bail!("Page sizes must be greater than 0");
        }

        if self.codes.default_page_size > self.codes.max_page_size {
            anyhow::bail!("codes.default_page_size cannot exceed codes.max_page_size");
        }

        if self.codes.max_generation_attempts == 0 {
            anyhow::bail!("codes.max_generation_attempts must be at least 1");
        }

        if self.qr.size_px == 0 {
            anyhow::bail!("qr.size_px must be greater than 0");
        }

        if self.server.session_ttl_hours <= 0 {
            anyhow::bail!("server.session_ttl_hours must be greater than 0");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.port, 3008);
        assert_eq!(config.server.session_ttl_hours, 24);
        assert_eq!(config.qr.size_px, 300);
        assert_eq!(config.qr.margin_modules, 2);
        assert_eq!(config.security.min_password_length, 6);
        assert!(config.bootstrap.admin_password.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[bootstrap]"));
        assert!(toml_str.contains("[codes]"));
        assert!(!toml_str.contains("admin_password"));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [general]
            log_level = "debug"

            [codes]
            default_page_size = 25
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.codes.default_page_size, 25);

        assert_eq!(config.codes.max_page_size, 100);
        assert_eq!(config.bootstrap.admin_username, "admin");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.codes.default_page_size = 500;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.bootstrap.admin_username = "  ".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.server.session_ttl_hours = 0;
        assert!(config.validate().is_err());
    }
}
