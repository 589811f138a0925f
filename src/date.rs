//! Date patterns in the `DD-MMMM-YYYYTHH` notation used for directory names,
//! file stems and entry timestamps.

use {
    chrono::{DateTime, TimeZone},
    std::fmt::Display,
};

/// Pattern tokens and their `strftime` equivalents, longest first so that
/// `MMMM` wins over `MM`.
const TOKENS: &[(&str, &str)] = &[
    ("YYYY", "%Y"),
    ("YY", "%y"),
    ("Y", "%Y"),
    ("MMMM", "%B"),
    ("MMM", "%b"),
    ("MM", "%m"),
    ("M", "%-m"),
    ("DDDD", "%j"),
    ("DDD", "%-j"),
    ("DD", "%d"),
    ("D", "%-d"),
    ("HH", "%H"),
    ("H", "%-H"),
    ("mm", "%M"),
    ("ss", "%S"),
];

/// Pattern used for the `timestamp` key of every entry.
pub const TIMESTAMP_PATTERN: &str = "YYYY-MMM-DDTHH:mm:ss";

/// A date pattern compiled to a chrono format string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatePattern {
    source: String,
    strftime: String,
}

impl DatePattern {
    /// Compile a pattern. Characters that are not part of a token (`T`,
    /// digits, separators) are copied literally.
    pub fn new(pattern: &str) -> Self {
        let mut strftime = String::with_capacity(pattern.len() * 2);
        let mut rest = pattern;
        'outer: while !rest.is_empty() {
            for (token, spec) in TOKENS {
                if let Some(tail) = rest.strip_prefix(token) {
                    strftime.push_str(spec);
                    rest = tail;
                    continue 'outer;
                }
            }
            let mut chars = rest.chars();
            if let Some(c) = chars.next() {
                if c == '%' {
                    strftime.push_str("%%");
                } else {
                    strftime.push(c);
                }
            }
            rest = chars.as_str();
        }
        DatePattern {
            source: pattern.to_string(),
            strftime,
        }
    }

    /// The pattern as it was configured.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Format `datetime` with this pattern.
    pub fn format<Tz>(&self, datetime: &DateTime<Tz>) -> String
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        datetime.format(&self.strftime).to_string()
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        chrono::{FixedOffset, NaiveDate},
    };

    fn sample() -> DateTime<FixedOffset> {
        let offset = FixedOffset::east_opt(0).unwrap();
        NaiveDate::from_ymd_opt(2024, 3, 7)
            .unwrap()
            .and_hms_opt(9, 5, 2)
            .unwrap()
            .and_local_timezone(offset)
            .unwrap()
    }

    #[test]
    fn default_directory_pattern() {
        assert_eq!(DatePattern::new("DD-MMMM-YYYY").format(&sample()), "07-March-2024");
    }

    #[test]
    fn default_stem_pattern_keeps_literal_t() {
        assert_eq!(DatePattern::new("DD-MMMM-YYYYTHH").format(&sample()), "07-March-2024T09");
    }

    #[test]
    fn timestamp_pattern() {
        assert_eq!(DatePattern::new(TIMESTAMP_PATTERN).format(&sample()), "2024-Mar-07T09:05:02");
    }

    #[test]
    fn unpadded_tokens_and_separators() {
        assert_eq!(DatePattern::new("D/M/YY_H").format(&sample()), "7/3/24_9");
        assert_eq!(DatePattern::new("DDDD").format(&sample()), "067");
    }

    #[test]
    fn percent_is_literal() {
        assert_eq!(DatePattern::new("YYYY%").format(&sample()), "2024%");
    }
}
