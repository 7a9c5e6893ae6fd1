//! # Model Registry
//!
//! Static catalog of the AI models the product can talk to. Each model
//! carries one or more versions; a version is either routable to a live
//! provider or gated behind `available = false`, in which case callers must
//! substitute a canned reply instead of contacting anything.

pub mod catalog;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A specific deployable variant of a [`Model`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelVersion {
    /// Version identifier (e.g., "gpt-4o")
    pub id: String,
    /// Human-readable name for UI (e.g., "GPT-4o")
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Provider adapter id this version routes to (e.g., "openai")
    pub provider: String,
    /// Opaque vendor model string passed to the adapter. Absent means the
    /// version id doubles as the vendor key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_key: Option<String>,
    /// Gate: an unavailable version must never reach a live provider.
    pub available: bool,
}

/// An AI vendor/model family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    /// Stable short key (e.g., "chatgpt")
    pub id: String,
    /// Display name (e.g., "ChatGPT")
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub capabilities: Vec<String>,
    pub versions: Vec<ModelVersion>,
}

/// Routing outcome for a model/version pair.
///
/// The source product signalled gated versions with a reserved
/// `"unavailable"` string; the tagged variant keeps the exact branching
/// behaviour without the stringly-typed key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderKey {
    Available(String),
    Unavailable,
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("model '{model}' is not in the registry")]
    ModelNotFound { model: String },
    #[error("model '{model}' has no version '{version}'")]
    VersionNotFound { model: String, version: String },
    #[error("model '{model}' has no versions configured")]
    NoVersions { model: String },
}

impl RegistryError {
    pub fn model_not_found(model: impl Into<String>) -> Self {
        Self::ModelNotFound {
            model: model.into(),
        }
    }

    pub fn version_not_found(model: impl Into<String>, version: impl Into<String>) -> Self {
        Self::VersionNotFound {
            model: model.into(),
            version: version.into(),
        }
    }
}

/// Immutable model catalog, built once at startup.
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    models: Vec<Model>,
}

impl ModelRegistry {
    pub fn new(models: Vec<Model>) -> Self {
        Self { models }
    }

    /// Registry backed by the built-in product catalog.
    pub fn builtin() -> Self {
        Self::new(catalog::builtin())
    }

    /// All configured models, in configuration order.
    pub fn models(&self) -> &[Model] {
        &self.models
    }

    pub fn get(&self, model_id: &str) -> Result<&Model, RegistryError> {
        self.models
            .iter()
            .find(|m| m.id == model_id)
            .ok_or_else(|| RegistryError::model_not_found(model_id))
    }

    pub fn contains(&self, model_id: &str) -> bool {
        self.models.iter().any(|m| m.id == model_id)
    }

    /// Display name for a model id.
    pub fn display_name(&self, model_id: &str) -> Result<&str, RegistryError> {
        Ok(self.get(model_id)?.name.as_str())
    }

    pub fn resolve_version(
        &self,
        model_id: &str,
        version_id: &str,
    ) -> Result<&ModelVersion, RegistryError> {
        self.get(model_id)?
            .versions
            .iter()
            .find(|v| v.id == version_id)
            .ok_or_else(|| RegistryError::version_not_found(model_id, version_id))
    }

    /// First available version, falling back to the first version in list
    /// order when none is available.
    ///
    /// Configuration is external data, so the zero-version case is handled
    /// here even though the catalog builder rejects it.
    pub fn default_version(&self, model_id: &str) -> Result<&ModelVersion, RegistryError> {
        let model = self.get(model_id)?;
        model
            .versions
            .iter()
            .find(|v| v.available)
            .or_else(|| model.versions.first())
            .ok_or_else(|| RegistryError::NoVersions {
                model: model_id.to_string(),
            })
    }

    /// Routing key for a model/version pair.
    ///
    /// Returns [`ProviderKey::Unavailable`] for gated versions so call sites
    /// can short-circuit with a stub reply instead of special-casing
    /// availability everywhere.
    pub fn provider_key(
        &self,
        model_id: &str,
        version_id: &str,
    ) -> Result<ProviderKey, RegistryError> {
        let version = self.resolve_version(model_id, version_id)?;
        if !version.available {
            return Ok(ProviderKey::Unavailable);
        }
        let key = version
            .provider_key
            .clone()
            .unwrap_or_else(|| version.id.clone());
        Ok(ProviderKey::Available(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ModelRegistry {
        ModelRegistry::new(vec![
            Model {
                id: "alpha".into(),
                name: "Alpha".into(),
                description: String::new(),
                icon: String::new(),
                capabilities: vec!["chat".into()],
                versions: vec![
                    ModelVersion {
                        id: "alpha-mini".into(),
                        name: "Alpha Mini".into(),
                        description: String::new(),
                        provider: "openai".into(),
                        provider_key: Some("alpha-mini-2024".into()),
                        available: false,
                    },
                    ModelVersion {
                        id: "alpha-pro".into(),
                        name: "Alpha Pro".into(),
                        description: String::new(),
                        provider: "openai".into(),
                        provider_key: None,
                        available: true,
                    },
                ],
            },
            Model {
                id: "hollow".into(),
                name: "Hollow".into(),
                description: String::new(),
                icon: String::new(),
                capabilities: Vec::new(),
                versions: Vec::new(),
            },
        ])
    }

    #[test]
    fn default_version_prefers_available() {
        let reg = registry();
        assert_eq!(reg.default_version("alpha").unwrap().id, "alpha-pro");
    }

    #[test]
    fn default_version_requires_at_least_one_version() {
        let reg = registry();
        assert!(matches!(
            reg.default_version("hollow"),
            Err(RegistryError::NoVersions { .. })
        ));
    }

    #[test]
    fn provider_key_gates_unavailable_versions() {
        let reg = registry();
        assert_eq!(
            reg.provider_key("alpha", "alpha-mini").unwrap(),
            ProviderKey::Unavailable
        );
    }

    #[test]
    fn provider_key_falls_back_to_version_id() {
        let reg = registry();
        assert_eq!(
            reg.provider_key("alpha", "alpha-pro").unwrap(),
            ProviderKey::Available("alpha-pro".into())
        );
    }

    #[test]
    fn unknown_ids_are_not_found() {
        let reg = registry();
        assert!(matches!(
            reg.resolve_version("alpha", "missing"),
            Err(RegistryError::VersionNotFound { .. })
        ));
        assert!(matches!(
            reg.get("missing"),
            Err(RegistryError::ModelNotFound { .. })
        ));
    }
}
