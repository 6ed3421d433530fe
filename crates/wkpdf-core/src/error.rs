use thiserror::Error;

/// Unified error type for wkpdf-core
///
/// This enum encompasses all error cases that can occur in the library:
/// - Template operations (lookup, rendering)
/// - Temporary artifact I/O
/// - The external conversion process (spawning, non-zero exit)
/// - Configuration operations (loading, validation)
#[derive(Error, Debug)]
pub enum Error {
    // ==========================================================================
    // Template Errors
    // ==========================================================================
    /// No template is registered under the requested name
    #[error("template not found: {0}")]
    TemplateNotFound(String),

    /// The templating engine failed to render a template
    #[error("failed to render template '{name}': {source}")]
    Template {
        name: String,
        #[source]
        source: tera::Error,
    },

    /// Failed to load templates from disk
    #[error("failed to load templates: {0}")]
    TemplateLoad(#[from] tera::Error),

    // ==========================================================================
    // Conversion Errors
    // ==========================================================================
    /// The conversion command could not be started
    #[error("failed to run '{cmd}': {source}")]
    ConversionSpawn {
        cmd: String,
        #[source]
        source: std::io::Error,
    },

    /// The conversion command exited unsuccessfully
    #[error("conversion failed with {}: {stderr}", status.map_or_else(|| "signal".to_string(), |c| format!("exit code {c}")))]
    ConversionFailed { status: Option<i32>, stderr: String },

    /// The configured conversion command is empty
    #[error("no conversion command configured")]
    ConversionMissingCommand,

    // ==========================================================================
    // Site Errors
    // ==========================================================================
    /// The current site could not be determined
    #[error("failed to resolve current site: {0}")]
    SiteLookup(String),

    // ==========================================================================
    // Configuration Errors
    // ==========================================================================
    /// Failed to load configuration file
    #[error("failed to load config: {0}")]
    ConfigLoad(String),

    /// Invalid configuration value
    #[error("invalid config value for '{field}': {reason}")]
    ConfigInvalid { field: String, reason: String },

    // ==========================================================================
    // I/O Errors
    // ==========================================================================
    /// General I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
