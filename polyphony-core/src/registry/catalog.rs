//! Built-in model catalog.
//!
//! Used when the configuration file carries no `[[models]]` tables. A
//! config-driven catalog replaces this list entirely.

use super::{Model, ModelVersion};

fn version(
    id: &str,
    name: &str,
    provider: &str,
    provider_key: Option<&str>,
    available: bool,
) -> ModelVersion {
    ModelVersion {
        id: id.to_string(),
        name: name.to_string(),
        description: String::new(),
        provider: provider.to_string(),
        provider_key: provider_key.map(str::to_string),
        available,
    }
}

pub fn builtin() -> Vec<Model> {
    vec![
        Model {
            id: "chatgpt".into(),
            name: "ChatGPT".into(),
            description: "OpenAI general-purpose assistant".into(),
            icon: "openai".into(),
            capabilities: vec!["chat".into(), "code".into(), "analysis".into()],
            versions: vec![
                version("gpt-4o", "GPT-4o", "openai", None, true),
                version("gpt-4o-mini", "GPT-4o mini", "openai", None, true),
            ],
        },
        Model {
            id: "claude".into(),
            name: "Claude".into(),
            description: "Anthropic assistant, served through DeepInfra".into(),
            icon: "anthropic".into(),
            capabilities: vec!["chat".into(), "analysis".into(), "long-context".into()],
            versions: vec![version(
                "claude-sonnet",
                "Claude Sonnet",
                "deepinfra",
                Some("anthropic/claude-sonnet"),
                true,
            )],
        },
        Model {
            id: "gemini".into(),
            name: "Gemini".into(),
            description: "Google multimodal model".into(),
            icon: "google".into(),
            capabilities: vec!["chat".into(), "vision".into()],
            versions: vec![version(
                "gemini-flash",
                "Gemini Flash",
                "deepinfra",
                Some("google/gemini-flash"),
                false,
            )],
        },
        Model {
            id: "grok".into(),
            name: "Grok".into(),
            description: "xAI conversational model".into(),
            icon: "xai".into(),
            capabilities: vec!["chat".into(), "realtime".into()],
            versions: vec![
                version("grok-3", "Grok 3", "grok", None, true),
                version("grok-3-mini", "Grok 3 mini", "grok", None, true),
            ],
        },
        Model {
            id: "deepseek".into(),
            name: "DeepSeek".into(),
            description: "DeepSeek reasoning model, served through DeepInfra".into(),
            icon: "deepseek".into(),
            capabilities: vec!["chat".into(), "reasoning".into()],
            versions: vec![version(
                "deepseek-v3",
                "DeepSeek V3",
                "deepinfra",
                Some("deepseek-ai/DeepSeek-V3"),
                true,
            )],
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_model_has_versions() {
        for model in builtin() {
            assert!(!model.versions.is_empty(), "model {} has no versions", model.id);
        }
    }

    #[test]
    fn ids_are_unique() {
        let models = builtin();
        for (i, a) in models.iter().enumerate() {
            for b in &models[i + 1..] {
                assert_ne!(a.id, b.id);
            }
        }
    }
}
