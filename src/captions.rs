//! SRT parsing for model-generated lyric subtitles.
//!
//! The text we parse comes out of a generative model, not an authoring tool, so the
//! format is only loosely honored: stray markers, CRLF line endings, doubled blank
//! lines, and half-formed blocks all show up in practice. The contract here is
//! best-effort recovery: a malformed block is dropped and parsing continues, and the
//! caller always gets back whatever valid captions remained — possibly none. `parse`
//! never returns an error.

use serde::Serialize;

use crate::generator::{SUBTITLES_END_TAG, SUBTITLES_START_TAG};

/// One timed subtitle cue recovered from an SRT block.
///
/// Captions are immutable snapshots: the parser builds them once per call and the
/// caller owns the resulting sequence outright.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Caption {
    /// Source-provided ordinal. Not guaranteed contiguous or unique.
    pub sequence_number: u32,

    /// Seconds from playback start. Always finite and non-negative.
    pub start_seconds: f64,

    /// Seconds from playback start. May be *before* `start_seconds` in malformed
    /// input; such captions are kept but never match any playback time.
    pub end_seconds: f64,

    /// Display text, newline-joined when the block carried multiple lines.
    pub text: String,
}

/// Parse raw SRT-like text into an ordered caption sequence.
///
/// Blocks are separated by blank lines. Each block needs at least three lines: an
/// integer ordinal, a `<time> --> <time>` range, and one or more text lines. A block
/// that fails any of those checks is silently dropped. Input order is preserved —
/// we do not sort by start time and we do not deduplicate ordinals.
pub fn parse(raw: &str) -> Vec<Caption> {
    let cleaned = normalize(raw);

    cleaned.split("\n\n").filter_map(parse_block).collect()
}

/// Strip wrapper markers the generation client normally removes (tolerated here in
/// case raw model output reaches the parser directly), normalize line endings, and
/// collapse runs of blank lines so block splitting sees exactly one `\n\n` per gap.
fn normalize(raw: &str) -> String {
    let mut content = raw.trim();
    if let Some(rest) = content.strip_prefix(SUBTITLES_START_TAG) {
        content = rest.trim_start();
    }
    if let Some(rest) = content.strip_suffix(SUBTITLES_END_TAG) {
        content = rest.trim_end();
    }

    let mut out = String::with_capacity(content.len());
    let mut pending_gap = false;
    for line in content.lines() {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            pending_gap = !out.is_empty();
            continue;
        }
        if pending_gap {
            out.push_str("\n\n");
            pending_gap = false;
        } else if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(line);
    }
    out
}

/// Parse a single block, returning `None` for anything malformed.
fn parse_block(block: &str) -> Option<Caption> {
    let lines: Vec<&str> = block.lines().collect();
    if lines.len() < 3 {
        return None;
    }

    let sequence_number: u32 = lines[0].trim().parse().ok()?;
    let (start_seconds, end_seconds) = parse_time_range(lines[1])?;
    let text = lines[2..].join("\n");

    Some(Caption {
        sequence_number,
        start_seconds,
        end_seconds,
        text,
    })
}

/// Parse a `<time> --> <time>` line into (start, end) seconds.
fn parse_time_range(line: &str) -> Option<(f64, f64)> {
    let (start, end) = line.split_once("-->")?;
    Some((parse_timestamp(start)?, parse_timestamp(end)?))
}

/// Parse an SRT timestamp of the form `[HH:]MM:SS,mmm` into seconds.
///
/// Hours are optional; the model emits both two- and three-part timestamps depending
/// on song length. The millisecond field is treated as a plain integer divided by
/// 1000 rather than a fixed three-digit field.
fn parse_timestamp(raw: &str) -> Option<f64> {
    let parts: Vec<&str> = raw.trim().split(':').collect();

    let (hours, minutes, seconds_part) = match parts.as_slice() {
        [h, m, s] => (h.trim().parse::<u64>().ok()?, m.trim().parse::<u64>().ok()?, *s),
        [m, s] => (0, m.trim().parse::<u64>().ok()?, *s),
        _ => return None,
    };

    let (secs, millis) = seconds_part.trim().split_once(',')?;
    let secs: u64 = secs.trim().parse().ok()?;
    let millis: u64 = millis.trim().parse().ok()?;

    // Absurdly large fields overflow u64 seconds; treat them as malformed so the
    // block is dropped like any other bad timestamp.
    let total_secs = hours
        .checked_mul(3600)?
        .checked_add(minutes.checked_mul(60)?)?
        .checked_add(secs)?;

    Some(total_secs as f64 + millis as f64 / 1000.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_single_block_with_short_timestamps() {
        let captions = parse("1\n00:01,000 --> 00:04,000\nFirst line of lyrics");
        assert_eq!(captions.len(), 1);
        assert_eq!(captions[0].sequence_number, 1);
        assert_eq!(captions[0].start_seconds, 1.0);
        assert_eq!(captions[0].end_seconds, 4.0);
        assert_eq!(captions[0].text, "First line of lyrics");
    }

    #[test]
    fn parses_hour_timestamps_and_millis() {
        let captions = parse("7\n01:02:03,500 --> 01:02:04,250\nhello");
        assert_eq!(captions.len(), 1);
        assert_eq!(captions[0].start_seconds, 3723.5);
        assert_eq!(captions[0].end_seconds, 3724.25);
    }

    #[test]
    fn strips_leading_marker_and_collapses_blank_runs() {
        let raw = "[SUBTITLES_START]\n\n1\n00:01,000 --> 00:02,000\nfirst\n\n\n\n2\n00:03,000 --> 00:04,000\nsecond\n[SUBTITLES_END]";
        let captions = parse(raw);
        assert_eq!(captions.len(), 2);
        assert_eq!(captions[0].text, "first");
        assert_eq!(captions[1].text, "second");
    }

    #[test]
    fn handles_crlf_input() {
        let captions = parse("1\r\n00:01,000 --> 00:02,000\r\nwindows line endings\r\n");
        assert_eq!(captions.len(), 1);
        assert_eq!(captions[0].text, "windows line endings");
    }

    #[test]
    fn joins_multiline_text_with_newlines() {
        let captions = parse("1\n00:01,000 --> 00:04,000\nline one\n[translation]");
        assert_eq!(captions.len(), 1);
        assert_eq!(captions[0].text, "line one\n[translation]");
    }

    #[test]
    fn garbage_input_yields_empty_sequence() {
        assert!(parse("not srt at all").is_empty());
        assert!(parse("").is_empty());
        assert!(parse("   \n\n  \n").is_empty());
    }

    #[test]
    fn drops_blocks_with_bad_ordinals_and_keeps_the_rest() {
        let raw = "one\n00:01,000 --> 00:02,000\nbad\n\n2\n00:03,000 --> 00:04,000\ngood";
        let captions = parse(raw);
        assert_eq!(captions.len(), 1);
        assert_eq!(captions[0].sequence_number, 2);
    }

    #[test]
    fn drops_blocks_with_malformed_time_ranges() {
        let raw = "1\n00:01,000 -> 00:02,000\nmissing arrow\n\n2\nnot a time line\ntext\n\n3\n00:xx,000 --> 00:02,000\nbad digits";
        assert!(parse(raw).is_empty());
    }

    #[test]
    fn drops_blocks_with_too_few_lines() {
        assert!(parse("1\n00:01,000 --> 00:02,000").is_empty());
        assert!(parse("42").is_empty());
    }

    #[test]
    fn preserves_input_order_and_duplicate_ordinals() {
        let raw = "5\n00:03,000 --> 00:04,000\nlater\n\n5\n00:01,000 --> 00:02,000\nearlier";
        let captions = parse(raw);
        assert_eq!(captions.len(), 2);
        assert_eq!(captions[0].text, "later");
        assert_eq!(captions[1].text, "earlier");
    }

    #[test]
    fn keeps_inverted_ranges() {
        let captions = parse("1\n00:04,000 --> 00:01,000\ninverted");
        assert_eq!(captions.len(), 1);
        assert!(captions[0].end_seconds < captions[0].start_seconds);
    }

    #[test]
    fn absurdly_large_time_fields_drop_the_block_without_panicking() {
        let raw = "1\n9999999999999999:00:01,000 --> 00:02,000\nlyrics\n\n\
                   2\n00:99999999999999999999:01,000 --> 00:02,000\nlyrics\n\n\
                   3\n00:01,000 --> 00:02,000\nkept";
        let captions = parse(raw);
        assert_eq!(captions.len(), 1);
        assert_eq!(captions[0].sequence_number, 3);
    }

    #[test]
    fn offsets_are_finite_and_non_negative() {
        let raw = "1\n00:00,000 --> 59:59,999\nedge\n\n2\n10:00:00,1 --> 10:00:01,2\nlong song";
        for caption in parse(raw) {
            assert!(caption.start_seconds.is_finite());
            assert!(caption.end_seconds.is_finite());
            assert!(caption.start_seconds >= 0.0);
            assert!(caption.end_seconds >= 0.0);
        }
    }

    #[test]
    fn reparsing_canonical_text_is_idempotent() {
        let raw = "1\n00:01,000 --> 00:04,000\nFirst line of lyrics\n\n2\n00:05,000 --> 00:06,000\nSecond line of lyrics";
        let once = parse(raw);
        let rendered: Vec<String> = once
            .iter()
            .map(|c| {
                format!(
                    "{}\n00:{:02},000 --> 00:{:02},000\n{}",
                    c.sequence_number, c.start_seconds as u64, c.end_seconds as u64, c.text
                )
            })
            .collect();
        let twice = parse(&rendered.join("\n\n"));
        assert_eq!(once, twice);
    }
}
