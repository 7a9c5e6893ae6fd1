use std::path::Path;

use crate::application::usage::UsageLimits;
use crate::registry::Model;

use super::error::ConfigError;
use super::loader::load_config;
use super::provider::ModelProviderConfig;

/// Designated synthesis backend from the `[synthesis]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesisTargetConfig {
    /// Provider adapter id
    pub provider: String,
    /// Vendor model string
    pub model: String,
}

/// Remote usage service from the optional `[usage]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageServiceConfig {
    pub endpoint: String,
    pub user_id: String,
}

/// Validated application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub limits: UsageLimits,
    pub synthesis: SynthesisTargetConfig,
    /// Absent means usage is tracked in-process.
    pub usage: Option<UsageServiceConfig>,
    pub providers: Vec<ModelProviderConfig>,
    /// Registry catalog; empty means the built-in catalog applies.
    pub models: Vec<Model>,
}

impl AppConfig {
    /// Load and validate configuration from a file path
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        load_config(path)
    }
}
