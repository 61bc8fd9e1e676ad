//! Where a schedule version came from.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// One ingestion source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    /// The periodic full-snapshot schedule file.
    Feed,
    /// The VSTP real-time amendment stream.
    Vstp,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Feed => "Feed",
            Source::Vstp => "VSTP",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "Feed" => Some(Source::Feed),
            "VSTP" => Some(Source::Vstp),
            _ => None,
        }
    }
}

/// The source label carried by a schedule.
///
/// A freshly ingested schedule has exactly one source. Applying an overlay
/// appends the overlay's sources, so a resolved schedule may read
/// `Feed,VSTP`. The first entry is always the origin of the stored row.
///
/// # Examples
///
/// ```
/// use schedule_server::domain::{Source, SourceLabel};
///
/// let mut label = SourceLabel::from(Source::Feed);
/// label.extend(&SourceLabel::from(Source::Vstp));
/// assert_eq!(label.to_string(), "Feed,VSTP");
/// assert_eq!(label.origin(), Some(Source::Feed));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceLabel(Vec<Source>);

impl SourceLabel {
    /// The source the stored row was ingested from.
    pub fn origin(&self) -> Option<Source> {
        self.0.first().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Append another label's sources after this one's.
    pub fn extend(&mut self, other: &SourceLabel) {
        self.0.extend_from_slice(&other.0);
    }
}

impl From<Source> for SourceLabel {
    fn from(source: Source) -> Self {
        SourceLabel(vec![source])
    }
}

impl fmt::Display for SourceLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, source) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            f.write_str(source.as_str())?;
        }
        Ok(())
    }
}

impl Serialize for SourceLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SourceLabel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        if s.is_empty() {
            return Ok(SourceLabel::default());
        }
        s.split(',')
            .map(|part| {
                Source::parse(part)
                    .ok_or_else(|| serde::de::Error::custom(format!("unknown source {part:?}")))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(SourceLabel)
    }
}
