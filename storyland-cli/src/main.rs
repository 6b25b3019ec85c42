//! Storyland CLI - Magic Storyland from the command line
//!
//! Compose story prompts, generate stories and narrate them to audio files.

#![allow(clippy::print_stdout)] // CLI program intentionally uses stdout

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use storyland::prelude::*;
use storyland_cli::config::{
    IssueLevel, NarrationProvider, StoryOverrides, StorylandConfig, VoiceOverrides, config_path,
    init_config, load_config_from, resolve_config,
};
use storyland_cli::error::{CliError, Result};
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Magic Storyland - personalized children's stories, written and narrated
#[derive(Parser)]
#[command(name = "storyland")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file path
    #[arg(short, long, env = "STORYLAND_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the composed prompt and token budget without calling a model
    Prompt(StoryArgs),

    /// Generate a story, optionally saving and narrating it
    Generate(GenerateArgs),

    /// Narrate a saved story
    Narrate(NarrateArgs),

    /// List voices known for a narration provider
    Voices(VoicesArgs),

    /// Show configuration and credential status
    Status,

    /// Manage configuration
    Config(ConfigArgs),
}

/// Story inputs
#[derive(Args)]
struct StoryArgs {
    /// Main character of the story
    #[arg(short, long, default_value = "monkey")]
    subject: String,

    /// Moral theme (friendship, courage, kindness, adventure, inspiration)
    #[arg(short, long, default_value = "friendship")]
    theme: Theme,

    /// Setting or activity
    #[arg(long, default_value = "in a magical forest")]
    setting: String,

    /// Additional story elements
    #[arg(long, default_value = "cookies, rain, and a mysterious treasure")]
    extra: String,

    /// Approximate length in words
    #[arg(short, long, default_value_t = StoryRequest::DEFAULT_WORDS,
          value_parser = clap::value_parser!(u32).range(50..=1000))]
    words: u32,

    /// Approximate reading time in minutes
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..=30))]
    minutes: Option<u32>,

    #[command(flatten)]
    overrides: StoryOverrides,
}

impl StoryArgs {
    fn request(&self) -> Result<StoryRequest> {
        let mut request = StoryRequest::new(&self.subject, self.theme)
            .setting(&self.setting)
            .extra_elements(&self.extra)
            .words(self.words);
        if let Some(minutes) = self.minutes {
            request = request.minutes(minutes);
        }
        request.validate()?;
        Ok(request)
    }
}

/// Arguments for the generate command
#[derive(Args)]
struct GenerateArgs {
    #[command(flatten)]
    story: StoryArgs,

    /// Save the story text to a file
    #[arg(long)]
    save: Option<PathBuf>,

    /// Narrate the story into an audio file
    #[arg(long, value_name = "AUDIO")]
    narrate: Option<PathBuf>,

    #[command(flatten)]
    voice: VoiceOverrides,
}

/// Arguments for the narrate command
#[derive(Args)]
struct NarrateArgs {
    /// Story text file
    #[arg(long)]
    story: PathBuf,

    /// Output audio file
    #[arg(short, long, value_name = "AUDIO")]
    out: PathBuf,

    #[command(flatten)]
    voice: VoiceOverrides,
}

/// Arguments for the voices command
#[derive(Args)]
struct VoicesArgs {
    /// Narration provider (overrides config)
    #[arg(short, long, value_enum)]
    provider: Option<NarrationProvider>,
}

/// Arguments for the config command
#[derive(Args)]
struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommands,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Show configuration file path
    Path,
    /// Create a default configuration file
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
    /// Validate configuration
    Validate,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("failed to create tokio runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match rt.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// Initialize logging with the given verbosity level.
///
/// Logs go to stderr so story text on stdout stays clean.
fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "storyland_cli={level},storyland={level},{}",
            if verbosity >= 2 { "debug" } else { "warn" }
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbosity >= 2)
        .with_writer(std::io::stderr)
        .init();
}

/// Main async entry point.
async fn run(cli: Cli) -> Result<()> {
    let config_file = cli.config.unwrap_or_else(config_path);

    match cli.command {
        Commands::Prompt(args) => cmd_prompt(&args, &config_file).await,
        Commands::Generate(args) => cmd_generate(args, &config_file).await,
        Commands::Narrate(args) => cmd_narrate(args, &config_file).await,
        Commands::Voices(args) => cmd_voices(&args, &config_file).await,
        Commands::Status => cmd_status(&config_file).await,
        Commands::Config(args) => cmd_config(args, &config_file).await,
    }
}

/// Print the composed prompt.
async fn cmd_prompt(args: &StoryArgs, config_file: &Path) -> Result<()> {
    let config = resolve_config(config_file).await?;
    let request = args.request()?;
    let composed = request.compose(config.story.ratio()?, args.overrides.cap(&config));
    let budget = composed.budget;

    println!("{}", composed.prompt);
    println!("max_tokens:  {}", budget.max_tokens);
    println!("word_target: {}", budget.word_target);
    if budget.capped {
        println!(
            "capped:      yes (asked for {} words)",
            request.target_word_count
        );
    }

    Ok(())
}

/// Generate a story.
async fn cmd_generate(args: GenerateArgs, config_file: &Path) -> Result<()> {
    let config = resolve_config(config_file).await?;
    let request = args.story.request()?;

    let flags = &args.story.overrides;
    let model = flags.model(&config);
    let openai = OpenAI::new(config.providers.openai(&model)?)?;
    let mut storyteller = Storyteller::new(Arc::new(openai))
        .model(model)
        .temperature(config.story.temperature)
        .persona(flags.persona(&config))
        .ratio(config.story.ratio()?);
    if let Some(cap) = flags.cap(&config) {
        storyteller = storyteller.cap(cap);
    }

    let story = storyteller.generate(&request).await?;
    println!("{}", story.text);

    if let Some(usage) = story.usage {
        tracing::info!(%usage, "token usage");
    }

    if let Some(path) = &args.save {
        tokio::fs::write(path, &story.text).await?;
        tracing::info!(path = %path.display(), "story saved");
    }

    if let Some(out) = &args.narrate {
        narrate_story(&story, &args.voice, &config, out).await?;
    }

    Ok(())
}

/// Narrate a saved story.
async fn cmd_narrate(args: NarrateArgs, config_file: &Path) -> Result<()> {
    let config = resolve_config(config_file).await?;
    let text = tokio::fs::read_to_string(&args.story).await?;

    narrate_story(&Story::from_text(text), &args.voice, &config, &args.out).await
}

async fn narrate_story(
    story: &Story,
    voice: &VoiceOverrides,
    config: &StorylandConfig,
    out: &Path,
) -> Result<()> {
    let settings = voice.settings(config, out)?;
    let tts = speech_provider(voice.provider(config), config)?;

    let written = narrate_to(story, tts.as_ref(), &settings, out).await?;
    println!("Narration saved to {} ({written} bytes)", out.display());

    Ok(())
}

fn speech_provider(
    provider: NarrationProvider,
    config: &StorylandConfig,
) -> Result<Box<dyn TextToSpeechProvider>> {
    let tts: Box<dyn TextToSpeechProvider> = match provider {
        NarrationProvider::OpenAI => {
            Box::new(OpenAI::new(config.providers.openai(&config.story.model)?)?)
        }
        NarrationProvider::ElevenLabs => Box::new(ElevenLabs::new(config.providers.elevenlabs()?)?),
        NarrationProvider::Google => Box::new(GoogleTts::new(GoogleTtsConfig::default())?),
    };
    tracing::debug!(provider = tts.provider_name(), "using narration provider");
    Ok(tts)
}

/// List voices.
async fn cmd_voices(args: &VoicesArgs, config_file: &Path) -> Result<()> {
    let config = load_config_from(config_file).await?.with_env();
    let provider = args.provider.unwrap_or(config.narration.provider);
    let tts = speech_provider(provider, &config)?;

    let voices = tts.available_voices();
    if voices.is_empty() {
        println!("No voices known for {provider}; pass a voice id with --voice.");
        return Ok(());
    }

    println!("Voices for {provider}:");
    for voice in voices {
        match voice.description {
            Some(description) => println!("  {:<24} {description}", voice.id),
            None => println!("  {}", voice.id),
        }
    }

    Ok(())
}

/// Show status.
async fn cmd_status(config_file: &Path) -> Result<()> {
    println!("Storyland Status\n");

    println!("Configuration:");
    println!("  Path:   {}", config_file.display());
    println!(
        "  Exists: {}",
        if config_file.exists() { "yes" } else { "no" }
    );

    match load_config_from(config_file).await {
        Ok(config) => {
            let config = config.with_env();
            println!("  Valid:  {}", if config.is_valid() { "yes" } else { "no" });
            println!();
            println!("Story:");
            println!("  Model:       {}", config.story.model);
            println!("  Persona:     {}", config.story.persona);
            println!("  Temperature: {}", config.story.temperature);
            match config.story.narration_cap() {
                Some(cap) => println!(
                    "  Cap:         {} min x {} tokens/min = {} tokens",
                    cap.max_minutes,
                    cap.tokens_per_minute,
                    cap.max_tokens()
                ),
                None => println!("  Cap:         none"),
            }
            println!();
            println!("Narration:");
            println!("  Provider: {}", config.narration.provider);
            println!(
                "  Voice:    {}",
                config.narration.voice.as_deref().unwrap_or("(provider default)")
            );
        }
        Err(e) => {
            println!("  Valid:  no ({e})");
        }
    }

    println!();
    println!("Environment:");
    for name in [
        "OPENAI_API_KEY",
        "OPENAI_BASE_URL",
        "OPENAI_MODEL",
        "ELEVENLABS_API_KEY",
        "ELEVENLABS_VOICE_ID",
    ] {
        print_env_status(name);
    }

    Ok(())
}

/// Configuration management.
async fn cmd_config(args: ConfigArgs, config_file: &Path) -> Result<()> {
    match args.command {
        ConfigCommands::Path => {
            println!("{}", config_file.display());
        }
        ConfigCommands::Show => {
            if config_file.exists() {
                let content = tokio::fs::read_to_string(config_file).await?;
                println!("{content}");
            } else {
                println!("Configuration file does not exist.");
                println!("Run 'storyland config init' to create one.");
            }
        }
        ConfigCommands::Init { force } => {
            if init_config(config_file, force).await? {
                println!("Configuration created: {}", config_file.display());
                println!();
                println!("Next steps:");
                println!("  1. export OPENAI_API_KEY=<key>");
                println!("  2. storyland generate --subject dragon --theme courage");
            } else {
                println!("Configuration already exists at: {}", config_file.display());
                println!("Use --force to overwrite.");
            }
        }
        ConfigCommands::Validate => {
            if !config_file.exists() {
                println!("error: configuration file does not exist");
                return Ok(());
            }

            let config = load_config_from(config_file).await?.with_env();
            let issues = config.validate();
            for issue in &issues {
                println!("{issue}");
            }
            if issues.iter().any(|i| i.level == IssueLevel::Error) {
                return Err(CliError::invalid("configuration has errors"));
            }
            println!("Configuration is valid");
        }
    }

    Ok(())
}

/// Print environment variable status.
fn print_env_status(name: &str) {
    let status = if std::env::var(name).is_ok() {
        "set"
    } else {
        "-"
    };
    println!("  {name}: {status}");
}
