//! Cue parsing and WebVTT rendering.

use regex_lite::Regex;
use std::fmt::Write;

/// `HH:MM:SS,mmm`, `HH:MM:SS.mmm` or the short WebVTT form `MM:SS.mmm`.
const TIMESTAMP_PATTERN: &str = r"^(?:(\d+):)?(\d{1,2}):(\d{2})[,.](\d{1,3})$";

/// One subtitle cue, times in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cue {
    pub start_ms: u64,
    pub end_ms: u64,
    pub text: String,
}

/// Parse SubRip or WebVTT text into cues.
///
/// Blocks without a timing line (WebVTT header, `NOTE`, `STYLE`, stray
/// text) are skipped, as are cues without text. Cue settings after the end
/// timestamp are dropped.
pub fn parse_cues(text: &str) -> Vec<Cue> {
    let Some(timestamp) = Regex::new(TIMESTAMP_PATTERN).ok() else {
        return Vec::new();
    };

    let normalized = text.trim_start_matches('\u{feff}').replace("\r\n", "\n").replace('\r', "\n");
    let mut cues = Vec::new();
    let mut block: Vec<&str> = Vec::new();

    for line in normalized.lines().chain(std::iter::once("")) {
        if !line.trim().is_empty() {
            block.push(line);
            continue;
        }
        if let Some(cue) = parse_block(&block, &timestamp) {
            cues.push(cue);
        }
        block.clear();
    }

    cues
}

fn parse_block(block: &[&str], timestamp: &Regex) -> Option<Cue> {
    let timing_index = block.iter().position(|line| line.contains("-->"))?;
    let (start, end) = block[timing_index].split_once("-->")?;
    let start_ms = parse_timestamp(start.trim(), timestamp)?;
    let end_ms = parse_timestamp(end.split_whitespace().next()?, timestamp)?;

    let text = block[timing_index + 1..]
        .iter()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n");
    if text.trim().is_empty() {
        return None;
    }

    Some(Cue {
        start_ms,
        end_ms,
        text,
    })
}

fn parse_timestamp(s: &str, timestamp: &Regex) -> Option<u64> {
    let caps = timestamp.captures(s)?;
    let hours: u64 = caps.get(1).map_or(Some(0), |m| m.as_str().parse().ok())?;
    let minutes: u64 = caps.get(2)?.as_str().parse().ok()?;
    let seconds: u64 = caps.get(3)?.as_str().parse().ok()?;
    let fraction = caps.get(4)?.as_str();
    // "5" means 500ms, "05" means 50ms
    let millis: u64 = format!("{:0<3}", fraction).parse().ok()?;

    // absurd hour counts overflow; the block is dropped like any bad timing
    hours
        .checked_mul(60)?
        .checked_add(minutes)?
        .checked_mul(60)?
        .checked_add(seconds)?
        .checked_mul(1000)?
        .checked_add(millis)
}

/// Format milliseconds as `HH:MM:SS.mmm`.
pub fn format_timestamp(ms: u64) -> String {
    let hours = ms / 3_600_000;
    let minutes = (ms / 60_000) % 60;
    let seconds = (ms / 1000) % 60;
    let millis = ms % 1000;
    format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, seconds, millis)
}

/// Render cues as a WebVTT document.
pub fn render_webvtt(cues: &[Cue]) -> String {
    let mut out = String::from("WEBVTT\n\n");
    for cue in cues {
        let _ = write!(
            out,
            "{} --> {}\n{}\n\n",
            format_timestamp(cue.start_ms),
            format_timestamp(cue.end_ms),
            cue.text
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const SRT: &str = "1\r\n00:00:01,000 --> 00:00:04,250\r\nHello there.\r\n\r\n\
                       2\r\n00:01:02,5 --> 00:01:03,050\r\nTwo\r\nlines\r\n";

    #[test]
    fn test_parse_srt() {
        let cues = parse_cues(SRT);
        assert_eq!(
            cues,
            vec![
                Cue {
                    start_ms: 1000,
                    end_ms: 4250,
                    text: "Hello there.".to_string()
                },
                Cue {
                    start_ms: 62_500,
                    end_ms: 63_050,
                    text: "Two\nlines".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_parse_webvtt_with_short_timestamps_and_settings() {
        let vtt = "WEBVTT - some title\n\nNOTE a comment\n\nintro\n00:05.000 --> 00:07.500 align:start\n<i>Hi</i>\n";
        let cues = parse_cues(vtt);
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].start_ms, 5000);
        assert_eq!(cues[0].end_ms, 7500);
        assert_eq!(cues[0].text, "<i>Hi</i>");
    }

    #[test]
    fn test_skips_malformed_and_empty_blocks() {
        let text = "1\nnot a timing line\ntext\n\n2\n00:00:01,000 --> 00:00:02,000\n\n3\n00:00:03,000 --> 00:00:04,000\nkept\n";
        let cues = parse_cues(text);
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].text, "kept");
    }

    #[test]
    fn test_overflowing_hours_are_skipped() {
        let text = "1\n999999999999999999:00:00,000 --> 999999999999999999:00:01,000\nboom\n\n\
                    2\n00:00:01,000 --> 00:00:02,000\nfine\n";
        let cues = parse_cues(text);
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].text, "fine");
    }

    #[test]
    fn test_parse_nothing() {
        assert!(parse_cues("").is_empty());
        assert!(parse_cues("just some words").is_empty());
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0), "00:00:00.000");
        assert_eq!(format_timestamp(3_723_004), "01:02:03.004");
    }

    #[test]
    fn test_render_webvtt() {
        let rendered = render_webvtt(&parse_cues(SRT));
        assert_eq!(
            rendered,
            "WEBVTT\n\n00:00:01.000 --> 00:00:04.250\nHello there.\n\n00:01:02.500 --> 00:01:03.050\nTwo\nlines\n\n"
        );
        assert!(!rendered.contains(','));
    }
}
