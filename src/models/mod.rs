//! Domain models for the staffing engine.
//!
//! # Core Concepts
//!
//! ## Reference Data
//!
//! - [`Contributor`]: A person who can be staffed, tagged with [`Profile`]s.
//! - [`EmploymentPeriod`]: A contract giving a contributor's daily capacity.
//! - [`Vacation`]: Leave that depresses availability when approved.
//! - [`Project`] and [`Client`]: Work to staff, weighted by [`ServiceLevel`].
//! - [`ProjectTask`]: Estimated work inside a project that may need an assignee.
//!
//! ## Allocation
//!
//! - [`Planning`]: A dated allocation of a contributor to a project. The only
//!   entity the engine writes.
//!
//! ## Inputs From Aggregation
//!
//! - [`StaffingMetric`]: Periodic occupancy rows computed upstream.

mod contributor;
mod metrics;
mod planning;
mod project;
mod task;

pub use contributor::*;
pub use metrics::*;
pub use planning::*;
pub use project::*;
pub use task::*;
