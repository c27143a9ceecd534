//! High-level API for generating and fetching lyric subtitles.
//!
//! We expose a single, ergonomic entry point (`Lyrify`) that wires the generation
//! client to the result cache:
//! - We build the HTTP client and the cache once (cheap, but long-lived).
//! - We reuse both across many uploads.
//! - Callers choose bounds and lifetimes via `Opts`.
//!
//! The server and CLI binaries are thin frontends over this type; anything with
//! actual logic lives in the `captions`, `cache`, `generator`, and `playback`
//! modules where it is testable on its own.

use tracing::info;

use crate::cache::SubtitleCache;
use crate::gemini::GeminiClient;
use crate::generator::SubtitleGenerator;
use crate::opts::Opts;
use crate::{Error, Result};

/// The result of one successful generation: the raw SRT text plus the key under
/// which it can be fetched again.
#[derive(Debug, Clone)]
pub struct Generated {
    pub subtitles: String,
    pub file_id: String,
}

/// The main high-level entry point.
///
/// `Lyrify` owns the long-lived resources of the pipeline:
/// - a [`SubtitleGenerator`] (Gemini in production, a stub in tests)
/// - a [`SubtitleCache`] holding recent results for download
///
/// Typical usage: construct once at startup, share behind an `Arc`, call
/// `generate` per upload and `fetch` per download.
pub struct Lyrify<G: SubtitleGenerator = GeminiClient> {
    generator: G,
    cache: SubtitleCache,
    opts: Opts,
}

impl Lyrify<GeminiClient> {
    /// Create an instance backed by Gemini.
    ///
    /// Fails fast when the credential is missing so a misconfigured process dies
    /// at startup rather than on the first upload.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, opts: Opts) -> Result<Self> {
        let generator = GeminiClient::new(api_key, model, opts.request_timeout)?;
        Ok(Self::with_generator(generator, opts))
    }
}

impl<G: SubtitleGenerator> Lyrify<G> {
    /// Create an instance using a custom generation backend.
    pub fn with_generator(generator: G, opts: Opts) -> Self {
        let cache = SubtitleCache::new(opts.cache_ttl, opts.cache_capacity);
        Self {
            generator,
            cache,
            opts,
        }
    }

    /// Generate lyric subtitles for an uploaded song.
    ///
    /// Input is validated before the generator runs: empty audio is
    /// [`Error::MissingAudio`], audio over the configured bound is
    /// [`Error::PayloadTooLarge`]. On success the raw SRT text is cached under a
    /// fresh key and returned together with that key. Generator failures
    /// propagate unretried.
    pub async fn generate(
        &self,
        audio: &[u8],
        mime_type: &str,
        api_key: Option<&str>,
    ) -> Result<Generated> {
        if audio.is_empty() {
            return Err(Error::MissingAudio);
        }
        if audio.len() > self.opts.max_audio_bytes {
            return Err(Error::PayloadTooLarge {
                size: audio.len(),
                limit: self.opts.max_audio_bytes,
            });
        }

        let subtitles = self.generator.generate(audio, mime_type, api_key).await?;
        let file_id = self.cache.put(subtitles.clone());

        info!(%file_id, subtitle_bytes = subtitles.len(), "generated subtitles");

        Ok(Generated {
            subtitles,
            file_id,
        })
    }

    /// Fetch previously generated subtitle text by its key.
    ///
    /// A miss — expired, evicted, or never issued — is [`Error::NotFound`].
    pub fn fetch(&self, file_id: &str) -> Result<String> {
        self.cache.get(file_id).ok_or(Error::NotFound)
    }

    /// Access the underlying cache (primarily for diagnostics and tests).
    pub fn cache(&self) -> &SubtitleCache {
        &self.cache
    }

    /// The configured audio size bound, in bytes.
    pub fn max_audio_bytes(&self) -> usize {
        self.opts.max_audio_bytes
    }
}
