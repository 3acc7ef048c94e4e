//! speakr - command-line entry point
//!
//! Generates speech from text with the Gemini API, then plays it on an
//! audio device and/or saves it as a WAV file. `convert` runs the same
//! pipeline on a base64 payload saved earlier, without calling the API.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use speakr_common::config::{self as common_config, TomlConfig};
use speakr_tts::audio::output::list_devices;
use speakr_tts::audio::{AudioFormat, CpalOutputFactory, EncodedAudio};
use speakr_tts::generation::client::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use speakr_tts::generation::{GeminiClient, SpeechGenerator, VOICES};
use speakr_tts::playback::PlaybackOrchestrator;
use speakr_tts::session::Session;

/// Command-line arguments for speakr
#[derive(Parser, Debug)]
#[command(name = "speakr")]
#[command(about = "Text-to-speech with Gemini prebuilt voices")]
#[command(version)]
struct Cli {
    /// Config file (default: ~/.config/speakr/config.toml)
    #[arg(long, global = true, env = "SPEAKR_CONFIG")]
    config: Option<PathBuf>,

    /// Audio output device name (default: system default)
    #[arg(long, global = true)]
    device: Option<String>,

    /// Gemini API key (falls back to GEMINI_API_KEY, API_KEY, then config file)
    #[arg(long, global = true)]
    api_key: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List voices and speaking styles
    Voices,
    /// List audio output devices
    Devices,
    /// Generate speech from text
    Speak(SpeakArgs),
    /// Play or save a base64 PCM payload without calling the API
    Convert(ConvertArgs),
}

#[derive(Args, Debug)]
struct SpeakArgs {
    /// Text to speak
    #[arg(short, long, conflicts_with = "file", required_unless_present = "file")]
    text: Option<String>,

    /// Read the text from a file
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Voice name
    #[arg(short, long, default_value = "Kore")]
    voice: String,

    /// Speaking style (key or display name)
    #[arg(short, long, default_value = "default")]
    style: String,

    /// Play the generated audio
    #[arg(short, long)]
    play: bool,

    /// Save as WAV to this path (default: <output_dir>/gemini-speech.wav)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Directory for downloads when --out is not given
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Also save the raw base64 payload next to the WAV file
    #[arg(long)]
    keep_payload: bool,

    /// Speech model
    #[arg(long)]
    model: Option<String>,

    /// API base URL
    #[arg(long)]
    base_url: Option<String>,
}

#[derive(Args, Debug)]
struct ConvertArgs {
    /// File holding the base64 payload
    #[arg(short, long)]
    input: PathBuf,

    /// Save as WAV to this path
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Play the payload
    #[arg(short, long)]
    play: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (toml_config, config_source) = common_config::load_config(cli.config.as_deref())
        .context("Failed to load configuration")?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                let level = &toml_config.logging.level;
                format!(
                    "speakr={level},speakr_tts={level},speakr_common={level}",
                    level = level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Configuration: {}", config_source);

    match cli.command {
        Command::Voices => {
            print_voices();
            Ok(())
        }
        Command::Devices => {
            for name in list_devices().context("Failed to list audio devices")? {
                println!("{}", name);
            }
            Ok(())
        }
        Command::Speak(args) => {
            speak(args, cli.api_key.as_deref(), cli.device, &toml_config).await
        }
        Command::Convert(args) => convert(args, cli.device, &toml_config).await,
    }
}

fn print_voices() {
    for voice in VOICES {
        println!("{} ({})", voice.value, voice.name);
        for style in voice.styles {
            println!("    {:<12} {}", style.key, style.name);
        }
    }
}

fn orchestrator(cli_device: Option<String>, toml_config: &TomlConfig) -> PlaybackOrchestrator {
    let device = cli_device.or_else(|| toml_config.device.clone());
    PlaybackOrchestrator::new(
        Arc::new(CpalOutputFactory::new(device)),
        AudioFormat::GEMINI_TTS,
    )
}

async fn speak(
    args: SpeakArgs,
    cli_api_key: Option<&str>,
    cli_device: Option<String>,
    toml_config: &TomlConfig,
) -> Result<()> {
    let text = match (args.text, &args.file) {
        (Some(text), _) => text,
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        (None, None) => String::new(),
    };

    let api_key = common_config::resolve_api_key(cli_api_key, toml_config)?;
    let model = args
        .model
        .or_else(|| toml_config.model.clone())
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());
    let base_url = args
        .base_url
        .or_else(|| toml_config.base_url.clone())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

    let generator: Arc<dyn SpeechGenerator> = Arc::new(
        GeminiClient::new(api_key)?
            .with_model(model)
            .with_base_url(base_url),
    );
    let output_dir = common_config::resolve_output_dir(args.output_dir.as_deref(), toml_config);

    let mut session = Session::new(generator, orchestrator(cli_device, toml_config), output_dir);
    session.select_voice(&args.voice)?;
    session.select_style(&args.style)?;
    session.set_text(text);

    if !session.generate().await {
        return Err(session_failure(&session));
    }

    let target = speak_save_target(args.out, args.play);

    if args.play {
        play_to_end(&mut session).await?;
    }

    let written = match &target {
        SaveTarget::Skip => None,
        SaveTarget::DefaultPath => Some(session.download()),
        SaveTarget::Path(path) => Some(session.download_to(path)),
    };
    if let Some(written) = written {
        let path = written.ok_or_else(|| session_failure(&session))?;
        println!("{}", path.display());

        if args.keep_payload {
            if let Some(audio) = session.audio() {
                let payload_path = payload_path(&path);
                std::fs::write(&payload_path, audio.as_str())
                    .with_context(|| format!("Failed to write {}", payload_path.display()))?;
                info!(path = %payload_path.display(), "Saved base64 payload");
            }
        }
    }

    Ok(())
}

async fn convert(args: ConvertArgs, cli_device: Option<String>, toml_config: &TomlConfig) -> Result<()> {
    let payload = std::fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;

    let orchestrator = orchestrator(cli_device, toml_config);
    let audio = EncodedAudio::from(payload);

    if args.play {
        let outcome = orchestrator.play(&audio).await?;
        if let speakr_tts::playback::PlayOutcome::Started(handle) = outcome {
            info!(duration_ms = handle.duration().as_millis() as u64, "Playing");
            tokio::select! {
                finished = handle.finished() => finished?,
                _ = signal::ctrl_c() => info!("Received Ctrl+C, stopping playback"),
            }
        }
    }

    if let SaveTarget::Path(path) = convert_save_target(args.out, args.play, &args.input) {
        let written = speakr_tts::download::save_wav(&audio, orchestrator.format(), &path)?;
        println!("{}", written.display());
    }

    Ok(())
}

/// Where a WAV file is written after generation or conversion
#[derive(Debug, PartialEq, Eq)]
enum SaveTarget {
    Skip,
    /// `<output_dir>/gemini-speech.wav`
    DefaultPath,
    Path(PathBuf),
}

/// `speak` saves when asked to, or when nothing else was requested
fn speak_save_target(out: Option<PathBuf>, play: bool) -> SaveTarget {
    match out {
        Some(path) => SaveTarget::Path(path),
        None if play => SaveTarget::Skip,
        None => SaveTarget::DefaultPath,
    }
}

/// `convert` without `--out` or `--play` writes `<input>.wav`
fn convert_save_target(out: Option<PathBuf>, play: bool, input: &Path) -> SaveTarget {
    match out {
        Some(path) => SaveTarget::Path(path),
        None if play => SaveTarget::Skip,
        None => SaveTarget::Path(input.with_extension("wav")),
    }
}

/// Base64 payload kept next to a saved WAV file: `speech.wav` → `speech.b64`
fn payload_path(wav: &Path) -> PathBuf {
    wav.with_extension("b64")
}

async fn play_to_end(session: &mut Session) -> Result<()> {
    let Some(handle) = session.play().await else {
        return match session.error() {
            Some(_) => Err(session_failure(session)),
            None => {
                warn!("Nothing to play");
                Ok(())
            }
        };
    };

    info!(
        device = handle.device_name(),
        duration_ms = handle.duration().as_millis() as u64,
        "Playing"
    );

    let completed = tokio::select! {
        ok = session.finish_playback(handle) => Some(ok),
        _ = signal::ctrl_c() => None,
    };
    match completed {
        Some(true) => {}
        Some(false) => return Err(session_failure(session)),
        None => info!("Received Ctrl+C, stopping playback"),
    }
    Ok(())
}

fn session_failure(session: &Session) -> anyhow::Error {
    match session.error() {
        Some(err) => anyhow!("{}", err),
        None => anyhow!("Operation failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speak_saves_to_default_when_nothing_requested() {
        assert_eq!(speak_save_target(None, false), SaveTarget::DefaultPath);
    }

    #[test]
    fn test_speak_play_only_skips_save() {
        assert_eq!(speak_save_target(None, true), SaveTarget::Skip);
    }

    #[test]
    fn test_speak_explicit_out_always_saves() {
        let out = PathBuf::from("clips/greeting.wav");
        assert_eq!(
            speak_save_target(Some(out.clone()), true),
            SaveTarget::Path(out.clone())
        );
        assert_eq!(speak_save_target(Some(out.clone()), false), SaveTarget::Path(out));
    }

    #[test]
    fn test_convert_defaults_to_input_with_wav_extension() {
        assert_eq!(
            convert_save_target(None, false, Path::new("saved/payload.b64")),
            SaveTarget::Path(PathBuf::from("saved/payload.wav"))
        );
        assert_eq!(
            convert_save_target(None, true, Path::new("saved/payload.b64")),
            SaveTarget::Skip
        );
        assert_eq!(
            convert_save_target(Some(PathBuf::from("out.wav")), true, Path::new("payload.b64")),
            SaveTarget::Path(PathBuf::from("out.wav"))
        );
    }

    #[test]
    fn test_payload_path_replaces_wav_extension() {
        assert_eq!(
            payload_path(Path::new("/tmp/gemini-speech.wav")),
            PathBuf::from("/tmp/gemini-speech.b64")
        );
    }

    #[test]
    fn test_cli_parses_speak_subcommand() {
        let cli = Cli::try_parse_from([
            "speakr", "--device", "pulse", "speak", "-t", "Halo", "--voice", "Puck", "--play",
        ])
        .unwrap();

        assert_eq!(cli.device.as_deref(), Some("pulse"));
        match cli.command {
            Command::Speak(args) => {
                assert_eq!(args.text.as_deref(), Some("Halo"));
                assert_eq!(args.voice, "Puck");
                assert_eq!(args.style, "default");
                assert!(args.play);
                assert!(args.out.is_none());
            }
            other => panic!("Expected speak, got {:?}", other),
        }
    }

    #[test]
    fn test_cli_rejects_text_and_file_together() {
        let result = Cli::try_parse_from([
            "speakr", "speak", "--text", "Halo", "--file", "input.txt",
        ]);
        assert!(result.is_err());
    }
}
