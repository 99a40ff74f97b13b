use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use vocal_gateway::{build_orchestrator, build_session_manager, ApiServer, Config, TurnInput};

/// Vocal - voice assistant turn gateway
#[derive(Parser)]
#[command(name = "vocal", version, about)]
struct Cli {
    /// Port to listen on
    #[arg(long, env = "VOCAL_PORT", default_value = "5000")]
    port: u16,

    /// Require live-session signaling at startup
    #[arg(long, env = "VOCAL_LIVE")]
    live: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Sanitize text and synthesize it through the TTS chain to a file
    Speak {
        /// Text to synthesize
        text: String,
        /// Output path for the MP3
        #[arg(short, long, default_value = "speech.mp3")]
        output: std::path::PathBuf,
        /// Reply language hint
        #[arg(short, long)]
        language: Option<String>,
    },
    /// Transcribe an audio file to stdout
    Transcribe {
        /// Audio file path
        file: std::path::PathBuf,
        /// Content type of the audio
        #[arg(long, default_value = "audio/wav")]
        content_type: String,
    },
    /// Run one full text turn and save the spoken reply
    Turn {
        /// User text
        text: String,
        /// Output path for the MP3 reply
        #[arg(short, long, default_value = "reply.mp3")]
        output: std::path::PathBuf,
        /// Reply language hint
        #[arg(short, long)]
        language: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "info,vocal_gateway=info",
        1 => "info,vocal_gateway=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::from_env()?;

    if let Some(cmd) = cli.command {
        return match cmd {
            Command::Speak {
                text,
                output,
                language,
            } => cmd_speak(&config, &text, &output, language.as_deref()).await,
            Command::Transcribe { file, content_type } => {
                cmd_transcribe(&config, &file, &content_type).await
            }
            Command::Turn {
                text,
                output,
                language,
            } => cmd_turn(&config, &text, &output, language.as_deref()).await,
        };
    }

    if cli.live && config.api_keys.daily.is_none() {
        anyhow::bail!("live mode requires DAILY_API_KEY");
    }

    tracing::info!(port = cli.port, live = cli.live, "starting vocal gateway");

    let orchestrator = build_orchestrator(&config)?;
    let sessions = Arc::new(build_session_manager(&config, orchestrator.clone())?);

    ApiServer::new(orchestrator, sessions, cli.port).run().await?;

    Ok(())
}

/// Synthesize text through the fallback chain and write the MP3
async fn cmd_speak(
    config: &Config,
    text: &str,
    output: &std::path::Path,
    language: Option<&str>,
) -> anyhow::Result<()> {
    let orchestrator = build_orchestrator(config)?;

    println!("Synthesizing: \"{text}\"");
    let audio = orchestrator.run_speech(text, language).await?;
    std::fs::write(output, &audio)?;
    println!("Wrote {} bytes to {}", audio.len(), output.display());

    Ok(())
}

/// Transcribe an audio file and print the text
async fn cmd_transcribe(
    config: &Config,
    file: &std::path::Path,
    content_type: &str,
) -> anyhow::Result<()> {
    let orchestrator = build_orchestrator(config)?;

    let audio = std::fs::read(file)?;
    println!("Transcribing {} ({} bytes)...", file.display(), audio.len());
    let text = orchestrator.run_transcription(&audio, content_type).await?;
    println!("{text}");

    Ok(())
}

/// Run one full text turn and save the spoken reply
async fn cmd_turn(
    config: &Config,
    text: &str,
    output: &std::path::Path,
    language: Option<&str>,
) -> anyhow::Result<()> {
    let orchestrator = build_orchestrator(config)?;

    let outcome = orchestrator
        .run_turn(TurnInput::Text(text.to_string()), language, &[])
        .await?;

    println!("Reply: {}", outcome.reply_text);
    if let Some(audio) = outcome.reply_audio {
        std::fs::write(output, &audio)?;
        println!("Wrote {} bytes to {}", audio.len(), output.display());
    }

    Ok(())
}
