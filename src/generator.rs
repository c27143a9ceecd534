//! The seam between the core and whatever produces raw subtitle text.
//!
//! Keeping this a trait lets the server and the high-level API run against a stub in
//! tests while production wires in [`crate::GeminiClient`].

use async_trait::async_trait;

use crate::Result;

/// Marker the model is asked to emit immediately before the subtitle payload.
pub const SUBTITLES_START_TAG: &str = "[SUBTITLES_START]";

/// Marker the model is asked to emit immediately after the subtitle payload.
pub const SUBTITLES_END_TAG: &str = "[SUBTITLES_END]";

/// Turns a song into raw SRT-formatted subtitle text.
#[async_trait]
pub trait SubtitleGenerator: Send + Sync {
    /// Generate lyric subtitles for the given audio.
    ///
    /// `mime_type` describes the uploaded bytes (e.g. `audio/mpeg`). `api_key`, when
    /// present, overrides the client's configured credential for this one call.
    ///
    /// Returns the raw SRT payload with the wrapper markers already removed. Any
    /// failure — transport, rejection, unusable response — surfaces as a single
    /// [`crate::Error::Generation`]; the caller does not retry.
    async fn generate(&self, audio: &[u8], mime_type: &str, api_key: Option<&str>)
    -> Result<String>;
}

/// Extract the subtitle payload from a raw model response.
///
/// Returns the trimmed text strictly between [`SUBTITLES_START_TAG`] and
/// [`SUBTITLES_END_TAG`], markers excluded. When either marker is missing the model
/// ignored the wrapping instruction, so the whole trimmed response is the payload.
pub fn extract_payload(response: &str) -> &str {
    let Some(start) = response.find(SUBTITLES_START_TAG) else {
        return response.trim();
    };
    let after_start = start + SUBTITLES_START_TAG.len();
    let Some(end) = response[after_start..].find(SUBTITLES_END_TAG) else {
        return response.trim();
    };

    response[after_start..after_start + end].trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_text_between_markers() {
        let raw = "Here you go!\n[SUBTITLES_START]\n1\n00:01,000 --> 00:04,000\nhi\n[SUBTITLES_END]\nEnjoy.";
        assert_eq!(extract_payload(raw), "1\n00:01,000 --> 00:04,000\nhi");
    }

    #[test]
    fn missing_start_marker_falls_back_to_whole_response() {
        let raw = "  1\n00:01,000 --> 00:04,000\nhi\n[SUBTITLES_END]  ";
        assert_eq!(extract_payload(raw), raw.trim());
    }

    #[test]
    fn missing_end_marker_falls_back_to_whole_response() {
        let raw = "[SUBTITLES_START]\n1\n00:01,000 --> 00:04,000\nhi";
        assert_eq!(extract_payload(raw), raw.trim());
    }

    #[test]
    fn end_marker_before_start_marker_falls_back() {
        let raw = "[SUBTITLES_END]stuff[SUBTITLES_START]";
        assert_eq!(extract_payload(raw), raw.trim());
    }

    #[test]
    fn empty_payload_between_markers_is_empty() {
        assert_eq!(extract_payload("[SUBTITLES_START]  \n [SUBTITLES_END]"), "");
    }
}
