use std::time::Duration;

/// Options that control the generation pipeline and its cache.
///
/// This struct represents *library-level configuration*, not CLI flags directly.
/// The binaries are responsible for mapping user input into this type so that:
/// - the library remains reusable outside of a CLI or server context
/// - other frontends (tests, batch jobs) can construct options programmatically
#[derive(Debug, Clone)]
pub struct Opts {
    /// Upper bound on accepted audio, in bytes.
    ///
    /// Inputs over this bound are rejected before the generation client runs, so a
    /// too-large upload never costs an upstream call.
    pub max_audio_bytes: usize,

    /// How long a generated result stays downloadable.
    pub cache_ttl: Duration,

    /// Maximum number of generated results held at once.
    pub cache_capacity: usize,

    /// Timeout applied to each upstream generation request.
    pub request_timeout: Duration,
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            max_audio_bytes: 15 * 1024 * 1024,
            cache_ttl: Duration::from_secs(60 * 60),
            cache_capacity: 256,
            request_timeout: Duration::from_secs(120),
        }
    }
}
