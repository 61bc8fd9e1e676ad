//! Short Term Planning (STP) indicator.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Error returned when parsing an unknown STP indicator code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid STP indicator: {0:?}")]
pub struct InvalidStpIndicator(String);

/// The planning category of one schedule version.
///
/// Variants are declared in code order (`C` < `N` < `O` < `P`) so the derived
/// `Ord` matches the alphabetical ordering used to pick an overlay: a
/// cancellation always sorts ahead of a variation.
///
/// # Examples
///
/// ```
/// use schedule_server::domain::StpIndicator;
///
/// let stp = StpIndicator::parse("O").unwrap();
/// assert_eq!(stp, StpIndicator::Overlay);
/// assert!(StpIndicator::Cancellation < StpIndicator::Overlay);
/// assert!(StpIndicator::parse("X").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StpIndicator {
    /// `C`: planned cancellation; the train does not run on the covered days.
    Cancellation,
    /// `N`: short-term-planning schedule; cannot be overlaid.
    ShortTermPlanning,
    /// `O`: variation overlaying a permanent schedule.
    Overlay,
    /// `P`: permanent schedule from long-term planning.
    Permanent,
}

impl StpIndicator {
    /// Parse a one-letter CIF code. Surrounding whitespace is ignored.
    pub fn parse(s: &str) -> Result<Self, InvalidStpIndicator> {
        match s.trim() {
            "C" => Ok(Self::Cancellation),
            "N" => Ok(Self::ShortTermPlanning),
            "O" => Ok(Self::Overlay),
            "P" => Ok(Self::Permanent),
            other => Err(InvalidStpIndicator(other.to_string())),
        }
    }

    /// The one-letter CIF code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Cancellation => "C",
            Self::ShortTermPlanning => "N",
            Self::Overlay => "O",
            Self::Permanent => "P",
        }
    }

    /// Whether this version amends a base (`O` or `C`).
    pub fn is_amendment(&self) -> bool {
        matches!(self, Self::Overlay | Self::Cancellation)
    }
}

impl fmt::Display for StpIndicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl Serialize for StpIndicator {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

impl<'de> Deserialize<'de> for StpIndicator {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        StpIndicator::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_all_codes() {
        assert_eq!(StpIndicator::parse("C"), Ok(StpIndicator::Cancellation));
        assert_eq!(StpIndicator::parse("N"), Ok(StpIndicator::ShortTermPlanning));
        assert_eq!(StpIndicator::parse("O"), Ok(StpIndicator::Overlay));
        assert_eq!(StpIndicator::parse(" P "), Ok(StpIndicator::Permanent));
    }

    #[test]
    fn reject_unknown() {
        assert!(StpIndicator::parse("").is_err());
        assert!(StpIndicator::parse("p").is_err());
        assert!(StpIndicator::parse("PO").is_err());
    }

    #[test]
    fn ordering_follows_codes() {
        let mut all = vec![
            StpIndicator::Permanent,
            StpIndicator::Overlay,
            StpIndicator::ShortTermPlanning,
            StpIndicator::Cancellation,
        ];
        all.sort();
        let codes: Vec<_> = all.iter().map(|s| s.code()).collect();
        assert_eq!(codes, vec!["C", "N", "O", "P"]);
    }

    #[test]
    fn amendments() {
        assert!(StpIndicator::Overlay.is_amendment());
        assert!(StpIndicator::Cancellation.is_amendment());
        assert!(!StpIndicator::Permanent.is_amendment());
        assert!(!StpIndicator::ShortTermPlanning.is_amendment());
    }

    #[test]
    fn serde_as_code() {
        let json = serde_json::to_string(&StpIndicator::Overlay).unwrap();
        assert_eq!(json, "\"O\"");
        let back: StpIndicator = serde_json::from_str("\"C\"").unwrap();
        assert_eq!(back, StpIndicator::Cancellation);
    }
}
