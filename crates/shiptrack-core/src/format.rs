//! Format rules
//!
//! A [`FormatRule`] recognizes the *shape* of a carrier's tracking number:
//! its length, a fixed prefix, and the character class of positional
//! segments. Rules never look at check digits.
//!
//! Rules operate on normalized numbers and only accept ASCII input.

use std::ops::RangeInclusive;

/// Character class required for a segment of the number
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharClass {
    /// `0-9`
    Digit,
    /// `A-Z` (numbers are uppercased before matching)
    Alpha,
    /// `A-Z` or `0-9`
    Alphanumeric,
}

impl CharClass {
    fn accepts(self, b: u8) -> bool {
        match self {
            CharClass::Digit => b.is_ascii_digit(),
            CharClass::Alpha => b.is_ascii_alphabetic(),
            CharClass::Alphanumeric => b.is_ascii_alphanumeric(),
        }
    }
}

/// A positional constraint: characters `start..end` must belong to `class`
///
/// `end == None` extends the segment to the end of the number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub start: usize,
    pub end: Option<usize>,
    pub class: CharClass,
}

impl Segment {
    /// Segment covering `start..end`
    pub const fn span(start: usize, end: usize, class: CharClass) -> Self {
        Self {
            start,
            end: Some(end),
            class,
        }
    }

    /// Segment covering `start..` to the end of the number
    pub const fn tail(start: usize, class: CharClass) -> Self {
        Self {
            start,
            end: None,
            class,
        }
    }

    fn matches(&self, bytes: &[u8]) -> bool {
        let end = self.end.unwrap_or(bytes.len()).min(bytes.len());
        if self.start > end {
            return false;
        }
        bytes[self.start..end].iter().all(|&b| self.class.accepts(b))
    }
}

/// Shape of a tracking number
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatRule {
    /// Accepted lengths (inclusive)
    pub length: RangeInclusive<usize>,
    /// Literal prefix, empty for none
    pub prefix: &'static str,
    /// Positional character class constraints
    pub segments: &'static [Segment],
}

impl FormatRule {
    /// Rule for an exact length
    pub const fn exact(length: usize, prefix: &'static str, segments: &'static [Segment]) -> Self {
        Self {
            length: length..=length,
            prefix,
            segments,
        }
    }

    /// Rule for a range of lengths
    pub const fn ranged(
        min: usize,
        max: usize,
        prefix: &'static str,
        segments: &'static [Segment],
    ) -> Self {
        Self {
            length: min..=max,
            prefix,
            segments,
        }
    }

    /// Whether a normalized number has this shape
    pub fn matches(&self, number: &str) -> bool {
        if !number.is_ascii() || !self.length.contains(&number.len()) {
            return false;
        }
        if !number.starts_with(self.prefix) {
            return false;
        }
        let bytes = number.as_bytes();
        self.segments.iter().all(|segment| segment.matches(bytes))
    }
}

/// Every character is a digit
pub const ALL_DIGITS: &[Segment] = &[Segment::tail(0, CharClass::Digit)];

/// Return the first `(shape, rule)` pair whose rule matches
pub fn classify<S: Copy>(rules: &[(S, FormatRule)], number: &str) -> Option<S> {
    rules
        .iter()
        .find(|(_, rule)| rule.matches(number))
        .map(|(shape, _)| *shape)
}
