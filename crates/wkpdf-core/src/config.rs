use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::artifact::TempFileOptions;
use crate::error::Error;
use crate::options::CmdOptions;

/// Prefix for environment overrides, e.g. `WKPDF_WKHTMLTOPDF__DEBUG=true`.
pub const ENV_PREFIX: &str = "WKPDF";

fn default_cmd() -> String {
    "wkhtmltopdf".to_string()
}

fn default_cmd_options() -> CmdOptions {
    CmdOptions::new().with("quiet", true)
}

/// Settings for the external conversion process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WkhtmltopdfConfig {
    /// Command to run; may include fixed arguments (e.g. `xvfb-run -a wkhtmltopdf`)
    #[serde(default = "default_cmd")]
    pub cmd: String,

    /// Options passed on every invocation, overridden per request
    #[serde(default = "default_cmd_options")]
    pub cmd_options: CmdOptions,

    /// Extra environment variables for the process
    #[serde(default)]
    pub env: BTreeMap<String, String>,

    /// Keep rendered HTML files on disk for inspection
    #[serde(default)]
    pub debug: bool,

    /// Directory for rendered HTML files (defaults to the system temp dir)
    pub tmp_dir: Option<PathBuf>,
}

impl Default for WkhtmltopdfConfig {
    fn default() -> Self {
        Self {
            cmd: default_cmd(),
            cmd_options: default_cmd_options(),
            env: BTreeMap::new(),
            debug: false,
            tmp_dir: None,
        }
    }
}

impl WkhtmltopdfConfig {
    /// Temporary file settings derived from this configuration.
    pub fn temp_file_options(&self) -> TempFileOptions {
        TempFileOptions {
            dir: self.tmp_dir.clone(),
            retain: self.debug,
            ..Default::default()
        }
    }
}

fn default_domain() -> String {
    "localhost:8000".to_string()
}

fn default_static_url() -> String {
    "/static/".to_string()
}

fn default_media_url() -> String {
    "/media/".to_string()
}

/// Site settings used to build absolute asset URLs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Domain of the current site, used when asset URLs are relative
    #[serde(default = "default_domain")]
    pub domain: String,

    /// Base URL of static files (relative or absolute)
    #[serde(default = "default_static_url")]
    pub static_url: String,

    /// Base URL of uploaded media (relative or absolute)
    #[serde(default = "default_media_url")]
    pub media_url: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            domain: default_domain(),
            static_url: default_static_url(),
            media_url: default_media_url(),
        }
    }
}

fn default_template_dir() -> PathBuf {
    PathBuf::from("templates")
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Conversion process settings
    #[serde(default)]
    pub wkhtmltopdf: WkhtmltopdfConfig,

    /// Site settings
    #[serde(default)]
    pub site: SiteConfig,

    /// Directory templates are loaded from
    #[serde(default = "default_template_dir")]
    pub template_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            wkhtmltopdf: WkhtmltopdfConfig::default(),
            site: SiteConfig::default(),
            template_dir: default_template_dir(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, Error> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::ConfigLoad(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, Error> {
        let config: Self = toml::from_str(content)
            .map_err(|e| Error::ConfigLoad(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from default locations (~/.config/wkpdf/config.toml, ./config.toml)
    pub fn load() -> Self {
        // Try user config
        if let Some(config_dir) = crate::util::config_dir() {
            let user_config = config_dir.join("wkpdf").join("config.toml");
            if user_config.exists() {
                match Self::from_file(&user_config) {
                    Ok(config) => {
                        tracing::debug!("Loaded config from {}", user_config.display());
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        // Try local config
        let local_config = std::path::PathBuf::from("config.toml");
        if local_config.exists() {
            match Self::from_file(&local_config) {
                Ok(config) => {
                    tracing::debug!("Loaded config from ./config.toml");
                    return config;
                }
                Err(e) => {
                    tracing::warn!("Failed to load ./config.toml: {}", e);
                }
            }
        }

        // Return defaults
        tracing::debug!("No config file found, using defaults");
        Self::default()
    }

    /// Apply `WKPDF_*` environment variables on top of this configuration.
    ///
    /// Nested keys use a double underscore: `WKPDF_SITE__DOMAIN=example.com`.
    pub fn with_env_overrides(self) -> Result<Self, Error> {
        self.with_environment(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
    }

    fn with_environment(self, environment: config::Environment) -> Result<Self, Error> {
        let layered = config::Config::builder()
            .add_source(
                config::Config::try_from(&self)
                    .map_err(|e| Error::ConfigLoad(format!("Failed to layer config: {e}")))?,
            )
            .add_source(environment)
            .build()
            .map_err(|e| Error::ConfigLoad(format!("Failed to read environment: {e}")))?;

        let config: Self = layered
            .try_deserialize()
            .map_err(|e| Error::ConfigLoad(format!("Invalid environment override: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), Error> {
        if self.wkhtmltopdf.cmd.trim().is_empty() {
            return Err(Error::ConfigInvalid {
                field: "wkhtmltopdf.cmd".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        if self.site.domain.trim().is_empty() {
            return Err(Error::ConfigInvalid {
                field: "site.domain".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}
