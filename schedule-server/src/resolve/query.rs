//! Query parsing.

use std::fmt;

use chrono::NaiveDate;

use crate::domain::parse_cif_date;
use crate::store::ScheduleFilter;

use super::error::ResolveError;

/// Filter value meaning "no filter".
const ANY: &str = "any";

/// Which identifier a query carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierType {
    /// Four-character signalling ID (headcode), e.g. `2A20`
    SignallingId,
    /// Six-character train UID, e.g. `C45871`
    TrainUid,
}

impl IdentifierType {
    pub fn parse(s: &str) -> Result<Self, ResolveError> {
        match s {
            "headcode" | "signallingid" => Ok(IdentifierType::SignallingId),
            "ciftrainuid" | "trainuid" => Ok(IdentifierType::TrainUid),
            other => Err(ResolveError::UnrecognisedIdentifierType(other.to_string())),
        }
    }
}

impl fmt::Display for IdentifierType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentifierType::SignallingId => write!(f, "signallingid"),
            IdentifierType::TrainUid => write!(f, "trainuid"),
        }
    }
}

/// A validated schedule lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleQuery {
    pub identifier_type: IdentifierType,
    pub identifier: String,
    pub date: NaiveDate,
    /// ATOC operator code, `None` for any operator.
    pub operator: Option<String>,
    /// Tiploc code the service must call at, `None` for anywhere.
    pub location: Option<String>,
}

fn optional_filter(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty() && *v != ANY)
        .map(str::to_string)
}

impl ScheduleQuery {
    pub fn new(identifier_type: IdentifierType, identifier: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            identifier_type,
            identifier: identifier.into(),
            date,
            operator: None,
            location: None,
        }
    }

    pub fn with_operator(mut self, operator: impl Into<String>) -> Self {
        self.operator = Some(operator.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Build a query from raw request values.
    ///
    /// A missing date means `today`. A missing, empty or `any` operator or
    /// location means no filter.
    pub fn parse(
        identifier_type: &str,
        identifier: &str,
        date: Option<&str>,
        operator: Option<&str>,
        location: Option<&str>,
        today: NaiveDate,
    ) -> Result<Self, ResolveError> {
        let identifier_type = IdentifierType::parse(identifier_type)?;
        let date = match date {
            Some(d) => parse_cif_date(d.trim()).map_err(|_| ResolveError::InvalidDate(d.to_string()))?,
            None => today,
        };
        Ok(Self {
            identifier_type,
            identifier: identifier.trim().to_string(),
            date,
            operator: optional_filter(operator),
            location: optional_filter(location),
        })
    }

    /// Identifier, operator and location predicates of this query.
    pub fn filter(&self) -> ScheduleFilter {
        let filter = match self.identifier_type {
            IdentifierType::SignallingId => ScheduleFilter::for_signalling_id(&self.identifier),
            IdentifierType::TrainUid => ScheduleFilter::for_train_uid(&self.identifier),
        };
        filter
            .with_operator(self.operator.clone())
            .with_location(self.location.clone())
    }
}
