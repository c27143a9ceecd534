use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Parser;

use lyrify::{GeminiClient, Lyrify, Opts};

#[derive(Parser, Debug)]
#[command(name = "lyrify")]
#[command(about = "Generate a lyric subtitle file (SRT) for a song")]
struct Params {
    /// Path to the audio file (mp3, wav, ogg, flac, m4a).
    #[arg(short = 'a', long = "audio")]
    pub audio_path: PathBuf,

    /// Where to write the generated SRT.
    #[arg(short = 'o', long = "output", default_value = "subs.srt")]
    pub output_path: PathBuf,

    /// Gemini model to use for generation.
    #[arg(long = "model", default_value = GeminiClient::DEFAULT_MODEL)]
    pub model: String,

    /// Gemini API key. Falls back to the GEMINI_API_KEY environment variable.
    #[arg(long = "api-key")]
    pub api_key: Option<String>,

    /// Maximum accepted audio size (bytes).
    #[arg(long = "max-audio-bytes", default_value_t = 15 * 1024 * 1024)]
    pub max_audio_bytes: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    lyrify::logging::init();
    let params = Params::parse();

    let api_key = match params
        .api_key
        .or_else(|| std::env::var("GEMINI_API_KEY").ok())
    {
        Some(key) if !key.trim().is_empty() => key,
        _ => bail!("no Gemini API key configured: pass --api-key or set GEMINI_API_KEY"),
    };

    let opts = Opts {
        max_audio_bytes: params.max_audio_bytes,
        ..Opts::default()
    };
    let lyrify = Lyrify::new(api_key, params.model, opts)?;

    let audio = tokio::fs::read(&params.audio_path)
        .await
        .with_context(|| format!("failed to read '{}'", params.audio_path.display()))?;
    let mime_type = mime_type_for(&params.audio_path);

    let generated = lyrify.generate(&audio, mime_type, None).await?;

    tokio::fs::write(&params.output_path, &generated.subtitles)
        .await
        .with_context(|| format!("failed to write '{}'", params.output_path.display()))?;

    println!("Subtitles have been saved to {}", params.output_path.display());
    Ok(())
}

/// Map the file extension to the MIME type sent upstream. Unknown extensions are
/// treated as MP3, which the API tolerates for most compressed audio.
fn mime_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("wav") => "audio/wav",
        Some("ogg") => "audio/ogg",
        Some("flac") => "audio/flac",
        Some("m4a") | Some("aac") => "audio/aac",
        _ => "audio/mpeg",
    }
}
