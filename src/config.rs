use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure for the inspection forms client
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct InspectionFormsConfig {
    /// Forms backend settings
    pub api: ApiConfig,
    /// Session persistence
    pub session: SessionConfig,
    /// Logging settings
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the backend; routes are joined under `/api`
    pub base_url: String,
    /// Per-request timeout
    pub timeout_seconds: u64,
    pub rate_limit: RateLimitConfig,
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Sustained requests per second
    pub requests_per_second: u32,
    /// Burst capacity
    pub burst_capacity: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Lifetime of a cached read
    pub ttl_seconds: u64,
    /// Maximum cached responses
    pub max_capacity: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Where the logged-in user is remembered between commands
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level
    pub log_level: String,
    /// Log API counters when a command finishes
    pub metrics_enabled: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout_seconds: 30,
            rate_limit: RateLimitConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: 5,
            burst_capacity: 10,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: 60,
            max_capacity: 500,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(".inspection-forms/session.json"),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            metrics_enabled: false,
        }
    }
}

impl InspectionFormsConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration files (inspection-forms.toml, .inspection-forms-rc)
    /// 3. Environment variables (prefixed with INSPECTION_FORMS_, nested keys split by `__`)
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("."))
    }

    /// Same as [`load`](Self::load) with the configuration files looked up in `dir`
    pub fn load_from(dir: &Path) -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        let toml_path = dir.join("inspection-forms.toml");
        if toml_path.exists() {
            builder = builder.add_source(File::from(toml_path));
        }

        let rc_path = dir.join(".inspection-forms-rc");
        if rc_path.exists() {
            builder = builder.add_source(File::from(rc_path).format(config::FileFormat::Toml));
        }

        builder = builder.add_source(
            Environment::with_prefix("INSPECTION_FORMS")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv().context("failed to read .env")?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }
}

/// Global configuration instance
static CONFIG: std::sync::LazyLock<Result<InspectionFormsConfig, anyhow::Error>> =
    std::sync::LazyLock::new(|| {
        // .env must be applied before the environment layer is read
        InspectionFormsConfig::load_env_file()?;
        InspectionFormsConfig::load()
    });

/// Get the global configuration
pub fn config() -> Result<&'static InspectionFormsConfig> {
    CONFIG
        .as_ref()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))
}

/// Initialize configuration (called at startup)
pub fn init_config() -> Result<()> {
    let _config = config()?;
    tracing::debug!("Configuration loaded successfully");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_without_files() {
        let dir = TempDir::new().unwrap();
        let loaded = InspectionFormsConfig::load_from(dir.path()).unwrap();
        assert_eq!(loaded.api.base_url, "http://localhost:8080");
        assert_eq!(loaded.api.rate_limit.burst_capacity, 10);
        assert_eq!(loaded.session.path, PathBuf::from(".inspection-forms/session.json"));
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("inspection-forms.toml"),
            "[api]\nbase_url = \"http://qa-server:9090\"\n\n[api.cache]\nttl_seconds = 5\n",
        )
        .unwrap();

        let loaded = InspectionFormsConfig::load_from(dir.path()).unwrap();
        assert_eq!(loaded.api.base_url, "http://qa-server:9090");
        assert_eq!(loaded.api.cache.ttl_seconds, 5);
        assert_eq!(loaded.api.cache.max_capacity, 500);
        assert_eq!(loaded.api.timeout_seconds, 30);
    }

    #[test]
    fn test_save_round_trips() {
        let dir = TempDir::new().unwrap();
        let mut settings = InspectionFormsConfig::default();
        settings.observability.log_level = "debug".to_string();
        settings.save_to_file(dir.path().join("inspection-forms.toml")).unwrap();

        let loaded = InspectionFormsConfig::load_from(dir.path()).unwrap();
        assert_eq!(loaded, settings);
    }
}
