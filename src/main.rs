//! Command-line entry point.
//!
//! ```bash
//! audiomate serve --port 5001
//! audiomate script --campaign brief.json
//! audiomate speak --text "Fresh bread daily" --tone "warm and friendly" --background-music acoustic
//! audiomate speak --file script.txt --gender female --language spanish
//! audiomate voices --gender male
//! audiomate options
//! ```

use anyhow::{Context, Result};
use audiomate::config::{load_config, AppConfig, DEFAULT_CONFIG_FILE};
use audiomate::llm::{CampaignInput, OpenAIClient, ScriptGenerator};
use audiomate::pipeline::{PipelineError, SpeechJob, SpeechPipeline};
use audiomate::server::{self, AppState};
use audiomate::tts::{TtsError, VoiceSettings};
use audiomate::voice::{Gender, VoiceTables};
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "audiomate", version, about = "Generate audio advertisements")]
struct Cli {
    /// JSON config file
    #[arg(long, env = "AUDIOMATE_CONFIG", default_value = DEFAULT_CONFIG_FILE, global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the REST API
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    /// Write an ad script from a campaign brief (JSON)
    Script {
        #[arg(long)]
        campaign: PathBuf,
    },
    /// Synthesize speech, optionally over background music
    Speak {
        #[arg(long, conflicts_with = "file", required_unless_present = "file")]
        text: Option<String>,
        #[arg(long)]
        file: Option<PathBuf>,
        /// Skip auto-selection
        #[arg(long)]
        voice_id: Option<String>,
        #[arg(long)]
        output: Option<PathBuf>,
        #[arg(long)]
        stability: Option<f64>,
        #[arg(long)]
        similarity_boost: Option<f64>,
        /// Free-text tone description, e.g. "calm and soothing"
        #[arg(long)]
        tone: Option<String>,
        #[arg(long, value_parser = ["male", "female", "neutral"])]
        gender: Option<String>,
        #[arg(long)]
        background_music: Option<String>,
        #[arg(long)]
        language: Option<String>,
    },
    /// List voices matching the given keywords
    Voices {
        #[arg(long)]
        tone: Option<String>,
        #[arg(long, value_parser = ["male", "female", "neutral"])]
        gender: Option<String>,
        #[arg(long)]
        language: Option<String>,
    },
    /// Show the available tones, genders, music styles and languages
    Options,
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("audiomate=info")),
        )
        .init();
}

fn missing_key_exit(provider: &str, url: &str, env_var: &str, message: &str) -> ! {
    eprintln!("Error: {}", message);
    eprintln!();
    eprintln!("To use {}, you need an API key:", provider);
    eprintln!("  1. Sign up at {}", url);
    eprintln!("  2. Copy your API key from the account settings");
    eprintln!("  3. export {}=<your key>  (or set it in the config file)", env_var);
    std::process::exit(1);
}

fn speech_pipeline(config: &AppConfig, tables: Arc<VoiceTables>) -> SpeechPipeline {
    match SpeechPipeline::from_config(config, tables) {
        Ok(pipeline) => pipeline,
        Err(PipelineError::Tts(TtsError::Config(message))) => missing_key_exit(
            "ElevenLabs",
            "https://elevenlabs.io",
            config.tts.api_key_env.as_deref().unwrap_or("ELEVENLABS_API_KEY"),
            &message,
        ),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn script_generator(config: &AppConfig) -> ScriptGenerator {
    match OpenAIClient::from_config(&config.llm) {
        Ok(client) => {
            let generator = ScriptGenerator::new(Arc::new(client));
            generator.with_params(config.llm.params())
        }
        Err(e) => missing_key_exit(
            "OpenAI",
            "https://platform.openai.com",
            config.llm.api_key_env.as_deref().unwrap_or("OPENAI_API_KEY"),
            &e.to_string(),
        ),
    }
}

/// `notes.txt` → `notes_speech.mp3` beside it.
fn default_speech_output(file: &Path) -> PathBuf {
    let stem = file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    file.with_file_name(format!("{}_speech.mp3", stem))
}

async fn serve(
    config: &AppConfig,
    tables: Arc<VoiceTables>,
    host: Option<String>,
    port: Option<u16>,
) -> Result<()> {
    let speech = SpeechPipeline::from_config(config, tables)
        .map(Arc::new)
        .map_err(|e| {
            tracing::warn!("[Server] Speech generation unavailable: {}", e);
            e.to_string()
        });
    let scripts = OpenAIClient::from_config(&config.llm)
        .map(|client| {
            let generator = ScriptGenerator::new(Arc::new(client));
            Arc::new(generator.with_params(config.llm.params()))
        })
        .map_err(|e| {
            tracing::warn!("[Server] Script generation unavailable: {}", e);
            e.to_string()
        });

    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", host, port))?;

    let state = Arc::new(AppState {
        speech,
        scripts,
        output_dir: config.audio.output_dir.clone(),
    });
    server::serve(state, addr).await;
    Ok(())
}

async fn script(config: &AppConfig, campaign: &Path) -> Result<()> {
    let raw = tokio::fs::read_to_string(campaign)
        .await
        .with_context(|| format!("reading {}", campaign.display()))?;
    let body: serde_json::Value = serde_json::from_str(&raw)
        .with_context(|| format!("parsing {}", campaign.display()))?;
    let input = CampaignInput::from_json(&body)?;
    let script = script_generator(config).generate(&input).await?;
    println!("{}", script);
    Ok(())
}

fn print_options(tables: &VoiceTables) {
    println!("Tones:");
    for tone in tables.tones() {
        println!(
            "  {:<13} stability {:.1}, similarity {:.1}",
            tone.name.as_str(),
            tone.settings.stability,
            tone.settings.similarity_boost
        );
    }
    println!();
    println!("Genders:");
    for gender in Gender::ALL {
        println!("  {}", gender);
    }
    println!();
    println!("Background music:");
    for style in tables.music_styles() {
        println!("  {:<11} {}", style.style, style.description);
    }
    println!();
    println!("Languages:");
    for language in tables.languages() {
        println!("  {:<11} {}", language.name, language.code);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = load_config(&cli.config);
    let tables = VoiceTables::load(config.voice_tables.as_deref())?;

    match cli.command {
        Command::Serve { host, port } => serve(&config, tables, host, port).await?,
        Command::Script { campaign } => script(&config, &campaign).await?,
        Command::Options => print_options(&tables),
        Command::Voices {
            tone,
            gender,
            language,
        } => {
            let pipeline = speech_pipeline(&config, tables);
            let criteria =
                pipeline.criteria(tone.as_deref(), gender.as_deref(), language.as_deref());
            let voices = pipeline.matching_voices(&criteria).await?;
            if voices.is_empty() {
                println!("No voices match your criteria.");
            }
            for voice in voices {
                println!("{} ({})", voice.name, voice.voice_id);
                if !voice.description.is_empty() {
                    println!("  {}", voice.description);
                }
                if !voice.labels.is_empty() {
                    println!("  {}", voice.labels_text());
                }
            }
        }
        Command::Speak {
            text,
            file,
            voice_id,
            output,
            stability,
            similarity_boost,
            tone,
            gender,
            background_music,
            language,
        } => {
            let (script, output) = match (text, file) {
                (Some(text), _) => (text, output),
                (None, Some(file)) => {
                    let content = tokio::fs::read_to_string(&file)
                        .await
                        .with_context(|| format!("reading {}", file.display()))?;
                    let output = output.or_else(|| Some(default_speech_output(&file)));
                    (content, output)
                }
                (None, None) => anyhow::bail!("either --text or --file is required"),
            };
            if script.trim().is_empty() {
                eprintln!("Input text is empty, nothing to synthesize.");
                return Ok(());
            }

            let settings = if stability.is_some() || similarity_boost.is_some() {
                Some(VoiceSettings {
                    stability: stability.unwrap_or(config.tts.default_stability),
                    similarity_boost: similarity_boost
                        .unwrap_or(config.tts.default_similarity_boost),
                })
            } else {
                None
            };

            let pipeline = speech_pipeline(&config, tables);
            let outcome = pipeline
                .run(&SpeechJob {
                    script: script.trim().to_string(),
                    voice_id,
                    tone,
                    gender,
                    background_music,
                    language,
                    settings,
                    output,
                })
                .await?;

            println!("Audio saved to {}", outcome.output.display());
            println!("Voice: {}", outcome.voice_id);
            if let Some(strategy) = outcome.mix_strategy {
                println!("Background music mixed with '{}' strategy", strategy);
            }
        }
    }
    Ok(())
}
