use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur when loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file not found at {path:?}")]
    NotFound { path: PathBuf },

    #[error("failed to read config from {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config from {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("no providers configured - at least one [[providers]] entry is required")]
    NoProvidersConfigured,

    #[error("provider '{provider}' is missing required field 'endpoint'")]
    MissingEndpoint { provider: String },

    #[error("missing required [synthesis] section with 'provider' and 'model'")]
    MissingSynthesisTarget,

    #[error("synthesis provider '{provider}' not found in configured providers")]
    SynthesisProviderUnknown { provider: String },

    #[error("model '{model}' has no [[models.versions]] entries")]
    ModelWithoutVersions { model: String },

    #[error("model version '{version}' of '{model}' routes to unknown provider '{provider}'")]
    VersionProviderUnknown {
        model: String,
        version: String,
        provider: String,
    },
}
