//! Configuration management
//!
//! Connection and behavior settings for the single target bucket. Stored in
//! TOML at ~/.config/objview/config.toml, with every field overridable
//! through `OBJVIEW_*` environment variables so a deployment never has to
//! write credentials to disk.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Current configuration schema version
pub const SCHEMA_VERSION: u32 = 1;

/// Default presigned-URL expiry in seconds
pub const DEFAULT_PRESIGN_EXPIRY_SECS: u64 = 900;

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_presign_expiry() -> u64 {
    DEFAULT_PRESIGN_EXPIRY_SECS
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Schema version for migration support
    pub schema_version: u32,

    /// Target bucket name
    #[serde(default)]
    pub bucket: String,

    /// Bucket region
    #[serde(default = "default_region")]
    pub region: String,

    /// Endpoint override for S3-compatible backends
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Access key id
    #[serde(default)]
    pub access_key: String,

    /// Secret access key
    #[serde(default)]
    pub secret_key: String,

    /// Use path-style bucket addressing
    #[serde(default)]
    pub force_path_style: bool,

    /// Upload size limit in bytes; `None` disables the check
    #[serde(default)]
    pub upload_size_limit: Option<u64>,

    /// Default expiry for presigned URLs, in seconds
    #[serde(default = "default_presign_expiry")]
    pub presign_expiry_secs: u64,

    /// Base URL of an external signing service, if one is used
    #[serde(default)]
    pub signing_service_url: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            bucket: String::new(),
            region: default_region(),
            endpoint: None,
            access_key: String::new(),
            secret_key: String::new(),
            force_path_style: false,
            upload_size_limit: None,
            presign_expiry_secs: DEFAULT_PRESIGN_EXPIRY_SECS,
            signing_service_url: None,
        }
    }
}

impl Config {
    /// Overlay values from the environment using the given lookup.
    ///
    /// Separated from `std::env` so tests can inject variables without
    /// touching process state.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("OBJVIEW_BUCKET") {
            self.bucket = v;
        }
        if let Some(v) = lookup("OBJVIEW_REGION") {
            self.region = v;
        }
        if let Some(v) = lookup("OBJVIEW_ENDPOINT") {
            self.endpoint = Some(v);
        }
        if let Some(v) = lookup("OBJVIEW_ACCESS_KEY") {
            self.access_key = v;
        }
        if let Some(v) = lookup("OBJVIEW_SECRET_KEY") {
            self.secret_key = v;
        }
        if let Some(v) = lookup("OBJVIEW_FORCE_PATH_STYLE") {
            self.force_path_style = matches!(v.as_str(), "1" | "true" | "yes");
        }
        if let Some(v) = lookup("OBJVIEW_UPLOAD_SIZE_LIMIT") {
            let bytes = v
                .parse::<u64>()
                .map_err(|e| Error::Config(format!("Invalid OBJVIEW_UPLOAD_SIZE_LIMIT: {e}")))?;
            self.upload_size_limit = Some(bytes);
        }
        if let Some(v) = lookup("OBJVIEW_PRESIGN_EXPIRY") {
            self.presign_expiry_secs = v
                .parse::<u64>()
                .map_err(|e| Error::Config(format!("Invalid OBJVIEW_PRESIGN_EXPIRY: {e}")))?;
        }
        if let Some(v) = lookup("OBJVIEW_SIGNING_SERVICE_URL") {
            self.signing_service_url = Some(v);
        }
        Ok(())
    }

    /// Overlay values from the process environment.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_with(|name| std::env::var(name).ok())
    }

    /// Validate that the configuration is usable for connecting.
    pub fn validate(&self) -> Result<()> {
        if self.bucket.is_empty() {
            return Err(Error::Config("bucket name is required".into()));
        }
        if let Some(endpoint) = &self.endpoint {
            url::Url::parse(endpoint)?;
        }
        if let Some(signer) = &self.signing_service_url {
            url::Url::parse(signer)?;
        }
        if self.presign_expiry_secs == 0 {
            return Err(Error::Config("presign_expiry_secs must be positive".into()));
        }
        Ok(())
    }
}

/// Configuration manager handles loading and saving config
#[derive(Debug)]
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager with the default config path
    pub fn new() -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| Error::Config("Could not determine config directory".into()))?;
        let config_path = config_dir.join("objview").join("config.toml");
        Ok(Self { config_path })
    }

    /// Create a ConfigManager with a custom path (useful for testing)
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the configuration file path
    pub fn config_path(&self) -> &PathBuf {
        &self.config_path
    }

    /// Load configuration from disk.
    ///
    /// A missing file yields the defaults. A newer schema version than this
    /// build supports is an error.
    pub fn load(&self) -> Result<Config> {
        if !self.config_path.exists() {
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(&self.config_path)?;
        let mut config: Config = toml::from_str(&content)?;

        if config.schema_version < SCHEMA_VERSION {
            config = self.migrate(config)?;
        } else if config.schema_version > SCHEMA_VERSION {
            return Err(Error::Config(format!(
                "Configuration file version {} is newer than supported version {}. Please upgrade objview.",
                config.schema_version, SCHEMA_VERSION
            )));
        }

        Ok(config)
    }

    /// Load from disk, then overlay environment variables.
    pub fn load_with_env(&self) -> Result<Config> {
        let mut config = self.load()?;
        config.apply_env()?;
        Ok(config)
    }

    /// Save configuration to disk.
    ///
    /// Creates parent directories if they don't exist.
    /// Sets file permissions to 600 (owner read/write only).
    pub fn save(&self, config: &Config) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(config)?;
        std::fs::write(&self.config_path, content)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&self.config_path, permissions)?;
        }

        Ok(())
    }

    /// Migrate configuration from older schema version
    fn migrate(&self, config: Config) -> Result<Config> {
        let mut config = config;

        // Add migration logic here when the schema version is bumped.
        config.schema_version = SCHEMA_VERSION;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_config_manager() -> (ConfigManager, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        let manager = ConfigManager::with_path(config_path);
        (manager, temp_dir)
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.schema_version, SCHEMA_VERSION);
        assert_eq!(config.region, "us-east-1");
        assert_eq!(config.presign_expiry_secs, 900);
        assert!(config.upload_size_limit.is_none());
        assert!(!config.force_path_style);
    }

    #[test]
    fn test_load_nonexistent_returns_default() {
        let (manager, _temp_dir) = temp_config_manager();
        let config = manager.load().unwrap();
        assert_eq!(config.schema_version, SCHEMA_VERSION);
    }

    #[test]
    fn test_save_and_load() {
        let (manager, _temp_dir) = temp_config_manager();

        let mut config = Config::default();
        config.bucket = "media".to_string();
        config.endpoint = Some("http://localhost:9000".to_string());
        config.access_key = "minioadmin".to_string();
        config.secret_key = "minioadmin".to_string();
        config.upload_size_limit = Some(50 * 1024 * 1024);

        manager.save(&config).unwrap();
        let loaded = manager.load().unwrap();

        assert_eq!(loaded.bucket, "media");
        assert_eq!(loaded.endpoint.as_deref(), Some("http://localhost:9000"));
        assert_eq!(loaded.upload_size_limit, Some(50 * 1024 * 1024));
    }

    #[test]
    fn test_schema_version_too_new() {
        let (manager, _temp_dir) = temp_config_manager();

        let content = format!(
            r#"
            schema_version = {}
            "#,
            SCHEMA_VERSION + 1
        );
        std::fs::write(manager.config_path(), content).unwrap();

        let result = manager.load();
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("newer than supported"));
    }

    #[test]
    fn test_apply_env_overrides() {
        let mut config = Config::default();
        config
            .apply_env_with(|name| match name {
                "OBJVIEW_BUCKET" => Some("assets".to_string()),
                "OBJVIEW_FORCE_PATH_STYLE" => Some("true".to_string()),
                "OBJVIEW_UPLOAD_SIZE_LIMIT" => Some("1048576".to_string()),
                _ => None,
            })
            .unwrap();

        assert_eq!(config.bucket, "assets");
        assert!(config.force_path_style);
        assert_eq!(config.upload_size_limit, Some(1_048_576));
        // Untouched fields keep their defaults.
        assert_eq!(config.presign_expiry_secs, 900);
    }

    #[test]
    fn test_apply_env_invalid_number() {
        let mut config = Config::default();
        let result = config.apply_env_with(|name| {
            (name == "OBJVIEW_UPLOAD_SIZE_LIMIT").then(|| "ten megabytes".to_string())
        });
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_validate() {
        let mut config = Config::default();
        assert!(config.validate().is_err());

        config.bucket = "media".to_string();
        assert!(config.validate().is_ok());

        config.endpoint = Some("not a url".to_string());
        assert!(config.validate().is_err());
    }
}
