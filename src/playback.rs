//! Maps elapsed playback time to the lyric that should be on screen.

use crate::captions::Caption;

/// Return the caption active at `elapsed_seconds`, if any.
///
/// A caption is active when `start_seconds <= t <= end_seconds`. When malformed
/// input produces overlapping ranges, the first match in sequence order wins;
/// overlapping text is never merged. Inverted ranges can never match.
///
/// This is a plain linear scan: caption sequences are lyric-sized (tens of entries)
/// and this runs on every playback time-update tick, so simplicity beats indexing.
pub fn active_caption(captions: &[Caption], elapsed_seconds: f64) -> Option<&Caption> {
    captions
        .iter()
        .find(|c| c.start_seconds <= elapsed_seconds && elapsed_seconds <= c.end_seconds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::captions::parse;

    #[test]
    fn returns_the_active_caption_mid_range() {
        let captions = parse("1\n00:01,000 --> 00:04,000\nFirst line of lyrics");
        let active = active_caption(&captions, 2.5).expect("caption should be active");
        assert_eq!(active.text, "First line of lyrics");
    }

    #[test]
    fn returns_none_outside_all_ranges() {
        let captions = parse("1\n00:01,000 --> 00:04,000\nFirst line of lyrics");
        assert!(active_caption(&captions, 10.0).is_none());
    }

    #[test]
    fn boundaries_are_inclusive() {
        let captions = parse("1\n00:01,000 --> 00:04,000\nedge");
        assert!(active_caption(&captions, 1.0).is_some());
        assert!(active_caption(&captions, 4.0).is_some());
        assert!(active_caption(&captions, 0.999).is_none());
    }

    #[test]
    fn gaps_between_captions_have_no_active_lyric() {
        let raw = "1\n00:01,000 --> 00:02,000\nfirst\n\n2\n00:03,000 --> 00:04,000\nsecond";
        let captions = parse(raw);
        assert!(active_caption(&captions, 2.5).is_none());
        assert_eq!(active_caption(&captions, 1.5).map(|c| c.text.as_str()), Some("first"));
        assert_eq!(active_caption(&captions, 3.5).map(|c| c.text.as_str()), Some("second"));
    }

    #[test]
    fn first_caption_wins_on_overlap() {
        let raw = "1\n00:01,000 --> 00:05,000\nfirst\n\n2\n00:02,000 --> 00:06,000\nsecond";
        let captions = parse(raw);
        assert_eq!(
            active_caption(&captions, 3.0).map(|c| c.text.as_str()),
            Some("first")
        );
    }

    #[test]
    fn inverted_ranges_never_match() {
        let captions = parse("1\n00:04,000 --> 00:01,000\ninverted");
        assert!(active_caption(&captions, 2.5).is_none());
        assert!(active_caption(&captions, 4.0).is_none());
    }

    #[test]
    fn empty_sequence_has_no_active_lyric() {
        assert!(active_caption(&[], 0.0).is_none());
    }
}
