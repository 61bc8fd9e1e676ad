//! Schedule resolution.
//!
//! Given a service identifier and a date, finds the base schedules (permanent
//! or short-term-planning) that run that day, applies the VSTP overlay or
//! cancellation that takes precedence over each, and adds origin and
//! destination details.

mod enrich;
mod error;
mod overlay;
mod query;
mod resolver;


pub use enrich::{EnrichedSchedule, endpoints, journey_times};
pub use error::ResolveError;
pub use overlay::apply_overlays;
pub use query::{IdentifierType, ScheduleQuery};
pub use resolver::Resolver;
