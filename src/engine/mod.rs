//! Workload balancing and assignment recommendation.
//!
//! Three components, each a thin struct borrowing a [`StaffingStore`] and a
//! [`Clock`]:
//!
//! - [`OccupancyAnalyzer`] classifies contributors from pre-computed staffing
//!   metrics.
//! - [`WorkloadRecommender`] turns that classification into ranked
//!   rebalancing recommendations and can apply one.
//! - [`TaskAssignmentAssistant`] proposes contributors for a project's
//!   unstaffed tasks, independently of the other two.
//!
//! All of them are greedy, explainable heuristics. Nothing here is a solver
//! and nothing is cached between calls.
//!
//! [`StaffingStore`]: crate::store::StaffingStore

pub mod assignment;
pub mod calendar;
pub mod occupancy;
pub mod recommender;

pub use assignment::*;
pub use calendar::{Clock, DateRange, FixedClock, SystemClock};
pub use occupancy::*;
pub use recommender::*;

/// Rounds to two decimals, half away from zero.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
