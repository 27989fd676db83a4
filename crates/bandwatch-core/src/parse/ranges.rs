use std::sync::OnceLock;

use regex::Regex;

use super::Diagnostic;
use crate::SupportRange;

/// Phrase identifying a support-range report line in the analysis output.
pub const SUPPORT_MARKER: &str = "Support Range";

/// One slot per marker line carrying a band, in the order the lines appeared.
///
/// A band that could not form a range (inverted bounds) keeps its slot as
/// `None` so the rows after it stay aligned with their own lines.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedRanges {
    pub ranges: Vec<Option<SupportRange>>,
    pub diagnostics: Vec<Diagnostic>,
}

fn band_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(\d+\.\d+)\s*-\s*(\d+\.\d+)").expect("band pattern is a valid regex")
    })
}

fn count_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)bounced\s+(\d+)\s+times?").expect("count pattern is a valid regex")
    })
}

/// Extracts `<min>-<max>` bands from marker lines of the analysis step's
/// standard output.
///
/// Lines without the marker are ignored, as are marker lines without a band
/// (headings such as `Support Ranges (1D, >=5% Rise):`). Empty output is a
/// valid result with no ranges.
pub fn parse_support_ranges(text: &str) -> ParsedRanges {
    let mut parsed = ParsedRanges::default();

    for (index, line) in text.lines().enumerate() {
        if !line.contains(SUPPORT_MARKER) {
            continue;
        }
        let Some(captures) = band_pattern().captures(line) else {
            continue;
        };

        let bounds = (captures[1].parse::<f64>(), captures[2].parse::<f64>());
        let observation_count = count_pattern()
            .captures(line)
            .and_then(|count| count[1].parse::<u32>().ok());

        let range = match bounds {
            (Ok(min), Ok(max)) => SupportRange::new(min, max, observation_count).ok(),
            _ => None,
        };

        if range.is_none() {
            parsed.diagnostics.push(Diagnostic::InvalidRange {
                line: index as u64 + 1,
                text: captures[0].to_owned(),
            });
        }
        parsed.ranges.push(range);
    }

    parsed
}
