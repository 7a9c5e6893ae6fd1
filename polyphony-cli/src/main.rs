mod cli;

use std::error::Error;
use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use polyphony_core::{
    AppConfig, ConversationStore, DynamicModelProvider, HttpUsageBackend, LocalUsageLedger,
    MessageRole, ModelRegistry, Orchestrator, SynthesisEngine, SynthesisTarget, UsageBackend,
    UsageTracker, VersionSelection,
};

use cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    init_tracing();

    let config_path = cli.config.as_deref().map(Path::new);
    let config = AppConfig::load(config_path)?;
    info!(
        providers = config.providers.len(),
        "Loaded configuration"
    );

    let registry = Arc::new(if config.models.is_empty() {
        ModelRegistry::builtin()
    } else {
        ModelRegistry::new(config.models.clone())
    });

    if cli.models.is_empty() {
        print_catalog(&registry);
        return Ok(());
    }

    let prompt = cli.prompt.join(" ");
    if prompt.trim().is_empty() {
        return Err("no prompt given (pass it after the flags)".into());
    }

    let store = Arc::new(ConversationStore::new());
    let provider = Arc::new(DynamicModelProvider::from_configs(&config.providers));

    let (backend, user_id): (Box<dyn UsageBackend>, String) = match &config.usage {
        Some(service) => (
            Box::new(HttpUsageBackend::new(service.endpoint.clone())),
            service.user_id.clone(),
        ),
        None => (Box::new(LocalUsageLedger::new()), "local".to_string()),
    };
    let usage = Arc::new(UsageTracker::new(backend, user_id, config.limits));
    if let Err(err) = usage.refresh().await {
        warn!(%err, "could not refresh usage counters, continuing with cached values");
    }

    let orchestrator = Orchestrator::new(
        registry.clone(),
        store.clone(),
        provider.clone(),
        usage.clone(),
    );
    let synthesis = SynthesisEngine::new(
        registry.clone(),
        store.clone(),
        provider,
        usage,
        SynthesisTarget {
            provider: config.synthesis.provider.clone(),
            model: config.synthesis.model.clone(),
        },
    );

    for model_id in &cli.models {
        store.ensure(model_id);
    }

    let versions = parse_versions(&cli.versions)?;
    orchestrator
        .dispatch(&prompt, &cli.models, &versions)
        .await
        .map_err(|err| err.user_message())?;

    for model_id in &cli.models {
        let name = registry.display_name(model_id).unwrap_or(model_id.as_str());
        println!("── {name} ──");
        for message in store.messages(model_id) {
            if message.role == MessageRole::Assistant {
                println!("{}", message.content);
            }
        }
        println!();
    }

    if cli.synthesize {
        match synthesis.synthesize(&cli.models).await {
            Ok(()) => {
                if let Some(result) = synthesis.result() {
                    println!("── Synthesis ({}) ──", result.source_model_names.join(", "));
                    println!("{}", result.content);
                }
            }
            Err(err) => eprintln!("synthesis failed: {}", err.user_message()),
        }
    }

    Ok(())
}

fn print_catalog(registry: &ModelRegistry) {
    println!("Available models:");
    for model in registry.models() {
        println!("  {} - {}", model.id, model.name);
        for version in &model.versions {
            let state = if version.available { "" } else { " (coming soon)" };
            println!("      {}{state}", version.id);
        }
    }
}

fn parse_versions(pairs: &[String]) -> Result<VersionSelection, Box<dyn Error>> {
    let mut selection = VersionSelection::new();
    for pair in pairs {
        let (model, version) = pair
            .split_once('=')
            .ok_or_else(|| format!("invalid --version '{pair}', expected model=version"))?;
        selection.insert(model.to_string(), version.to_string());
    }
    Ok(selection)
}

fn init_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_level(true)
            .init();
    });
}
