//! aloud CLI - read text aloud through local or cloud speech synthesis.

use clap::{Parser, Subcommand};

mod commands;

use commands::{ConfigCommand, SpeakCommand, VoicesCommand};

/// aloud - read text aloud.
///
/// Speaks through the native eSpeak engine or the Gemini speech API,
/// choosing automatically based on the text's language and the voices
/// installed on this system.
///
/// Configuration is stored in ~/.aloud/config.yaml.
#[derive(Parser)]
#[command(name = "aloud")]
#[command(about = "Read text aloud through local or cloud speech synthesis")]
#[command(version)]
pub struct Cli {
    /// Config file (default is ~/.aloud/config.yaml)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Verbose output
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Speak text (argument or standard input)
    Speak(SpeakCommand),
    /// List available voices
    Voices(VoicesCommand),
    /// Manage configuration
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::Speak(cmd) => cmd.run(&cli).await,
        Commands::Voices(cmd) => cmd.run(&cli).await,
        Commands::Config(cmd) => cmd.run(&cli).await,
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
