//! Query-time resolution against the store.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::debug;

use crate::domain::{Schedule, ScheduleLocation, Source, StpIndicator};
use crate::store::{ScheduleStore, ServiceDay};

use super::enrich::{EnrichedSchedule, endpoints, journey_times};
use super::error::ResolveError;
use super::overlay::apply_overlays;
use super::query::ScheduleQuery;

/// STP indicators of schedules that can be returned.
const BASE_STP: [StpIndicator; 2] = [StpIndicator::Permanent, StpIndicator::ShortTermPlanning];

/// STP indicators of schedules that can only modify a base.
const AMENDMENT_STP: [StpIndicator; 2] = [StpIndicator::Overlay, StpIndicator::Cancellation];

/// Answers schedule queries. Never writes to the store.
pub struct Resolver<S> {
    store: Arc<S>,
}

impl<S> Clone for Resolver<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S: ScheduleStore> Resolver<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// The schedules that apply for `query`, one per matching base version.
    pub async fn resolve(&self, query: &ScheduleQuery) -> Result<Vec<EnrichedSchedule>, ResolveError> {
        let day = ServiceDay::new(query.date);
        let filter = query.filter().on_day(day);

        let bases = self
            .store
            .find_schedules(&filter.clone().with_stp(&BASE_STP))
            .await?;
        let overlays = self
            .store
            .find_schedules(&filter.with_stp(&AMENDMENT_STP).with_source(Source::Vstp))
            .await?;

        debug!(
            identifier = %query.identifier,
            identifier_type = %query.identifier_type,
            date = %query.date,
            bases = bases.len(),
            overlays = overlays.len(),
            "resolving schedules"
        );

        let mut resolved = Vec::with_capacity(bases.len());
        for base in &bases {
            let schedule = apply_overlays(base, &overlays, &day);
            resolved.push(self.enrich(schedule, query.date).await?);
        }
        Ok(resolved)
    }

    async fn enrich(&self, schedule: Schedule, date: NaiveDate) -> Result<EnrichedSchedule, ResolveError> {
        let (origin, destination) = endpoints(&schedule);
        let origin = self.describe(origin).await?;
        let destination = self.describe(destination).await?;
        let (departure, arrival) = journey_times(&schedule, date);

        Ok(EnrichedSchedule {
            schedule,
            origin,
            destination,
            time_of_departure_from_origin_ts: departure,
            time_of_arrival_at_destination_ts: arrival,
        })
    }

    /// Display name of a location: its Tiploc description, or the bare code
    /// when the Tiploc is unknown.
    async fn describe(&self, location: Option<&ScheduleLocation>) -> Result<Option<String>, ResolveError> {
        let Some(location) = location else {
            return Ok(None);
        };
        let name = match self.store.find_tiploc(&location.tiploc_code).await? {
            Some(tiploc) if !tiploc.tps_description.is_empty() => tiploc.tps_description,
            _ => location.tiploc_code.clone(),
        };
        Ok(Some(name))
    }
}
