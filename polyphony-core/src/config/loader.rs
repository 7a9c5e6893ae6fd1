use std::fs;
use std::io;
use std::path::Path;
use std::sync::Once;

use dotenvy::from_filename;
use serde::Deserialize;
use tracing::debug;

use crate::application::usage::UsageLimits;
use crate::registry::Model;

use super::app::{AppConfig, SynthesisTargetConfig, UsageServiceConfig};
use super::error::ConfigError;
use super::provider::{ModelProviderConfig, RawProviderConfig};
use super::{CONFIG_PATH, ENV_PATH};

static ENV_LOADER: Once = Once::new();

/// Raw configuration structure for deserialization from TOML
#[derive(Debug, Deserialize, Default)]
pub(super) struct RawConfig {
    #[serde(default)]
    pub limits: RawLimits,
    pub synthesis: Option<RawSynthesis>,
    pub usage: Option<RawUsage>,
    #[serde(default)]
    pub providers: Vec<RawProviderConfig>,
    #[serde(default)]
    pub models: Vec<Model>,
}

#[derive(Debug, Deserialize)]
pub(super) struct RawLimits {
    #[serde(default = "default_prompt_limit")]
    pub llm_prompt_limit: u32,
    #[serde(default = "default_synthesize_limit")]
    pub synthesize_limit: u32,
}

impl Default for RawLimits {
    fn default() -> Self {
        Self {
            llm_prompt_limit: default_prompt_limit(),
            synthesize_limit: default_synthesize_limit(),
        }
    }
}

fn default_prompt_limit() -> u32 {
    50
}

fn default_synthesize_limit() -> u32 {
    10
}

#[derive(Debug, Deserialize)]
pub(super) struct RawSynthesis {
    pub provider: String,
    pub model: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct RawUsage {
    pub endpoint: String,
    pub user_id: String,
}

/// Ensures environment variables are loaded from config/.env
pub fn ensure_env_loaded() {
    ENV_LOADER.call_once(|| {
        let _ = from_filename(ENV_PATH);
    });
}

/// Load and validate configuration from a file path
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    ensure_env_loaded();
    let config_path = path.unwrap_or_else(|| Path::new(CONFIG_PATH));
    read_config(config_path)
}

fn read_config(path: &Path) -> Result<AppConfig, ConfigError> {
    debug!(path = %path.display(), "Reading client configuration file");

    let content = fs::read_to_string(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            ConfigError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    let parsed: RawConfig = toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    validate_and_build(parsed)
}

pub(super) fn validate_and_build(parsed: RawConfig) -> Result<AppConfig, ConfigError> {
    if parsed.providers.is_empty() {
        return Err(ConfigError::NoProvidersConfigured);
    }

    let mut providers: Vec<ModelProviderConfig> = Vec::new();
    for raw_provider in parsed.providers {
        if raw_provider.endpoint.is_none() {
            return Err(ConfigError::MissingEndpoint {
                provider: raw_provider.id.clone(),
            });
        }
        providers.push(ModelProviderConfig::from(raw_provider));
    }

    let synthesis = parsed
        .synthesis
        .map(|raw| SynthesisTargetConfig {
            provider: raw.provider,
            model: raw.model,
        })
        .ok_or(ConfigError::MissingSynthesisTarget)?;
    if !providers.iter().any(|p| p.id == synthesis.provider) {
        return Err(ConfigError::SynthesisProviderUnknown {
            provider: synthesis.provider,
        });
    }

    for model in &parsed.models {
        if model.versions.is_empty() {
            return Err(ConfigError::ModelWithoutVersions {
                model: model.id.clone(),
            });
        }
        for version in &model.versions {
            if !providers.iter().any(|p| p.id == version.provider) {
                return Err(ConfigError::VersionProviderUnknown {
                    model: model.id.clone(),
                    version: version.id.clone(),
                    provider: version.provider.clone(),
                });
            }
        }
    }

    Ok(AppConfig {
        limits: UsageLimits {
            llm_prompt_limit: parsed.limits.llm_prompt_limit,
            synthesize_limit: parsed.limits.synthesize_limit,
        },
        synthesis,
        usage: parsed.usage.map(|raw| UsageServiceConfig {
            endpoint: raw.endpoint,
            user_id: raw.user_id,
        }),
        providers,
        models: parsed.models,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml_text: &str) -> Result<AppConfig, ConfigError> {
        let raw: RawConfig = toml::from_str(toml_text).expect("raw parse");
        validate_and_build(raw)
    }

    const MINIMAL: &str = r#"
        [synthesis]
        provider = "openai"
        model = "gpt-4o-mini"

        [[providers]]
        id = "openai"
        type = "openai"
        endpoint = "https://api.openai.com"
        api_key = "OPENAI_API_KEY"
    "#;

    #[test]
    fn minimal_config_gets_default_limits() {
        let config = parse(MINIMAL).unwrap();
        assert_eq!(config.limits.llm_prompt_limit, 50);
        assert_eq!(config.limits.synthesize_limit, 10);
        assert!(config.usage.is_none());
        assert!(config.models.is_empty());
    }

    #[test]
    fn providers_are_required() {
        let result = parse(
            r#"
            [synthesis]
            provider = "openai"
            model = "gpt-4o-mini"
        "#,
        );
        assert!(matches!(result, Err(ConfigError::NoProvidersConfigured)));
    }

    #[test]
    fn provider_endpoint_is_required() {
        let result = parse(
            r#"
            [synthesis]
            provider = "openai"
            model = "gpt-4o-mini"

            [[providers]]
            id = "openai"
            type = "openai"
        "#,
        );
        assert!(matches!(result, Err(ConfigError::MissingEndpoint { .. })));
    }

    #[test]
    fn synthesis_provider_must_be_configured() {
        let result = parse(
            r#"
            [synthesis]
            provider = "ghost"
            model = "gpt-4o-mini"

            [[providers]]
            id = "openai"
            type = "openai"
            endpoint = "https://api.openai.com"
        "#,
        );
        assert!(matches!(
            result,
            Err(ConfigError::SynthesisProviderUnknown { .. })
        ));
    }

    #[test]
    fn catalog_models_need_versions() {
        let result = parse(
            r#"
            [synthesis]
            provider = "openai"
            model = "gpt-4o-mini"

            [[providers]]
            id = "openai"
            type = "openai"
            endpoint = "https://api.openai.com"

            [[models]]
            id = "chatgpt"
            name = "ChatGPT"
            versions = []
        "#,
        );
        assert!(matches!(
            result,
            Err(ConfigError::ModelWithoutVersions { .. })
        ));
    }

    #[test]
    fn catalog_versions_must_route_to_known_providers() {
        let result = parse(
            r#"
            [synthesis]
            provider = "openai"
            model = "gpt-4o-mini"

            [[providers]]
            id = "openai"
            type = "openai"
            endpoint = "https://api.openai.com"

            [[models]]
            id = "chatgpt"
            name = "ChatGPT"

            [[models.versions]]
            id = "gpt-4o"
            name = "GPT-4o"
            provider = "ghost"
            available = true
        "#,
        );
        assert!(matches!(
            result,
            Err(ConfigError::VersionProviderUnknown { .. })
        ));
    }
}
