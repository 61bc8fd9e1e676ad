//! Overlay precedence.

use std::cmp::Reverse;

use crate::domain::{Schedule, StpIndicator};
use crate::store::ServiceDay;

/// The schedule that applies on `day` for one base schedule.
///
/// A short-term-planning base is final. Otherwise the overlays for the same
/// train UID are ranked by STP code (cancellation first, then overlay; the
/// most recently stored wins a tie) and the first whose validity contains
/// the start of `day` is merged onto the base. With no such overlay the
/// base stands.
pub fn apply_overlays(base: &Schedule, overlays: &[Schedule], day: &ServiceDay) -> Schedule {
    if base.stp_indicator == Some(StpIndicator::ShortTermPlanning) {
        return base.clone();
    }

    let mut candidates: Vec<&Schedule> = overlays
        .iter()
        .filter(|o| o.train_uid == base.train_uid)
        .filter(|o| o.stp_indicator.is_some_and(|stp| stp.is_amendment()))
        .collect();
    candidates.sort_by_key(|o| (o.stp_indicator, Reverse(o.id)));

    let applicable = candidates.into_iter().find(|o| {
        o.schedule_start_date_ts <= day.start_ts && day.start_ts < o.schedule_end_date_ts
    });

    match applicable {
        Some(overlay) => base.merge(overlay),
        None => base.clone(),
    }
}
