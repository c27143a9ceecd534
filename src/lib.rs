//! `lyrify` — a small, focused library for generating synchronized lyric subtitles.
//!
//! This crate provides:
//! - A Gemini-backed generation client that turns a song into raw SRT text
//! - A best-effort SRT parser that recovers timed captions from model output
//! - A TTL-bounded in-memory cache keyed by opaque download identifiers
//! - A playback synchronizer that maps elapsed time to the active lyric
//!
//! The library is designed to be used by both CLI tools and long-running services,
//! with an emphasis on clarity, graceful degradation, and minimal surprises.

// High-level API (most consumers should start here).
pub mod lyrify;
pub mod opts;

// Caption data structures and SRT parsing.
pub mod captions;

// Generated-subtitle storage keyed by download identifiers.
pub mod cache;

// Generation client seam and its Gemini implementation.
pub mod gemini;
pub mod generator;

// Elapsed-time → active-lyric selection.
pub mod playback;

// Logging configuration and control.
#[cfg(feature = "logging")]
pub mod logging;

mod error;

pub use crate::cache::SubtitleCache;
pub use crate::captions::Caption;
pub use crate::error::{Error, Result};
pub use crate::gemini::GeminiClient;
pub use crate::generator::SubtitleGenerator;
pub use crate::lyrify::{Generated, Lyrify};
pub use crate::opts::Opts;
