use std::fmt;

use super::media_type::{MediaType, MediaTypeError};

/// A quality value stored in thousandths (`0..=1000`).
///
/// Keeping the value as an integer gives exact ordering and guarantees formatting with
/// at most three decimal digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quality(u16);

impl Quality {
    /// The default quality `1`
    pub const MAX: Quality = Quality(1000);
    /// Quality `0`, meaning "not acceptable"
    pub const ZERO: Quality = Quality(0);

    /// Build from thousandths, clamped to `1000`
    #[must_use]
    pub fn from_millis(millis: u16) -> Self {
        Quality(millis.min(1000))
    }

    /// Value in thousandths
    #[must_use]
    pub fn millis(self) -> u16 {
        self.0
    }

    /// Parse a `q` parameter value: `0`, `1`, or `0.` / `1.` followed by up to three
    /// digits, never above `1`.
    fn parse(value: &str) -> Option<Self> {
        let (whole, fraction) = match value.split_once('.') {
            Some((w, f)) => (w, f),
            None => (value, ""),
        };
        if fraction.len() > 3 || !fraction.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let mut millis: u16 = match whole {
            "0" => 0,
            "1" => 1000,
            _ => return None,
        };
        for (idx, digit) in fraction.bytes().enumerate() {
            let scale = [100u16, 10, 1][idx];
            millis += u16::from(digit - b'0') * scale;
        }
        (millis <= 1000).then_some(Quality(millis))
    }
}

impl Default for Quality {
    fn default() -> Self {
        Quality::MAX
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            1000 => write!(f, "1"),
            0 => write!(f, "0"),
            millis => {
                let digits = format!("{millis:03}");
                write!(f, "0.{}", digits.trim_end_matches('0'))
            }
        }
    }
}

/// One element of an `Accept` header: a media type and its quality.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifiedMediaType {
    media_type: MediaType,
    quality: Quality,
}

impl QualifiedMediaType {
    /// Pair a media type with a quality
    #[must_use]
    pub fn new(media_type: MediaType, quality: Quality) -> Self {
        Self {
            media_type,
            quality,
        }
    }

    /// Parse a single `Accept` element such as `text/html;q=0.8`
    ///
    /// # Errors
    ///
    /// Propagates media type errors and rejects `q` values outside `[0, 1]` or with
    /// more than three decimal digits.
    pub fn parse(element: &str) -> Result<Self, MediaTypeError> {
        let (media_type, params) = MediaType::parse_with_params(element)?;
        let quality = match params.iter().find(|(key, _)| key == "q") {
            Some((_, value)) => {
                Quality::parse(value).ok_or_else(|| MediaTypeError::MalformedQuality {
                    input: element.to_string(),
                    value: value.clone(),
                })?
            }
            None => Quality::MAX,
        };
        Ok(Self {
            media_type,
            quality,
        })
    }

    /// The media type without its quality
    #[must_use]
    pub fn media_type(&self) -> &MediaType {
        &self.media_type
    }

    /// The client's preference weight
    #[must_use]
    pub fn quality(&self) -> Quality {
        self.quality
    }
}

impl From<MediaType> for QualifiedMediaType {
    fn from(media_type: MediaType) -> Self {
        Self::new(media_type, Quality::MAX)
    }
}

impl fmt::Display for QualifiedMediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.quality == Quality::MAX {
            write!(f, "{}", self.media_type)
        } else {
            write!(f, "{};q={}", self.media_type, self.quality)
        }
    }
}

/// Parse every `Accept` header value into its comma-separated elements.
///
/// Empty elements (for example from a trailing comma) are skipped. Elements with
/// `q=0` are kept; callers decide whether to drop them.
///
/// # Errors
///
/// Returns the first element that fails to parse.
pub fn parse_accept<'a, I>(values: I) -> Result<Vec<QualifiedMediaType>, MediaTypeError>
where
    I: IntoIterator<Item = &'a str>,
{
    values
        .into_iter()
        .flat_map(|value| value.split(','))
        .map(str::trim)
        .filter(|element| !element.is_empty())
        .map(QualifiedMediaType::parse)
        .collect()
}

/// Order acceptable types by descending quality.
///
/// The sort is stable, so elements with equal quality keep their header order.
/// Elements with quality zero are removed.
#[must_use]
pub fn sort_by_preference(mut accept: Vec<QualifiedMediaType>) -> Vec<QualifiedMediaType> {
    accept.retain(|element| element.quality > Quality::ZERO);
    accept.sort_by(|a, b| b.quality.cmp(&a.quality));
    accept
}
