use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "polyphony",
    version,
    about = "Fan one prompt out to several AI models and optionally synthesize their answers"
)]
pub struct Cli {
    /// Path to the configuration file (defaults to config/client.toml)
    #[arg(long)]
    pub config: Option<String>,

    /// Model ids to dispatch to (comma-separated); omit to list the catalog
    #[arg(long, value_delimiter = ',')]
    pub models: Vec<String>,

    /// Explicit version picks as model=version pairs (repeatable)
    #[arg(long = "version")]
    pub versions: Vec<String>,

    /// Run a synthesis pass over the completed replies
    #[arg(long)]
    pub synthesize: bool,

    #[arg()]
    pub prompt: Vec<String>,
}
