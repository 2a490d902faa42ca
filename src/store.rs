//! Persistence interface consumed by the engine.
//!
//! The engine owns none of these entities. It reads contributors, projects,
//! tasks, contracts, leave and metrics, and only writes [`Planning`] rows
//! when a recommendation is applied. Writes are committed immediately.

use anyhow::Result;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::models::*;

pub trait StaffingStore {
    fn find_active_contributors(&self) -> Result<Vec<Contributor>>;

    fn find_contributor(&self, id: Uuid) -> Result<Option<Contributor>>;

    /// Metric rows of `granularity` for one contributor whose period date
    /// falls within `[start, end]`, oldest first.
    fn find_staffing_metrics(
        &self,
        contributor_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
        granularity: Granularity,
    ) -> Result<Vec<StaffingMetric>>;

    /// Allocation records of every status matching `filter`.
    fn find_plannings(&self, filter: PlanningFilter) -> Result<Vec<Planning>>;

    fn find_project(&self, id: Uuid) -> Result<Option<Project>>;

    /// Active, non-internal projects with their clients loaded.
    fn find_active_external_projects(&self) -> Result<Vec<Project>>;

    /// Tasks of a project that still need staffing, ordered by position.
    fn find_candidate_tasks(&self, project_id: Uuid) -> Result<Vec<ProjectTask>>;

    /// Active contributors carrying the given profile.
    fn find_contributors_with_profile(&self, profile_id: Uuid) -> Result<Vec<Contributor>>;

    fn find_active_employment_period(
        &self,
        contributor_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<EmploymentPeriod>>;

    /// Whether an approved vacation overlaps `[start, end]`.
    fn has_approved_vacation(
        &self,
        contributor_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<bool>;

    fn create_planning(&self, input: CreatePlanningInput) -> Result<Planning>;

    /// Returns `None` if no planning has this id.
    fn update_planning(&self, id: Uuid, input: UpdatePlanningInput) -> Result<Option<Planning>>;

    /// Updates planning `source_id` and creates `target` atomically: either
    /// both writes are committed or neither is. Returns `None`, writing
    /// nothing, if no planning has this id.
    fn transfer_planning(
        &self,
        source_id: Uuid,
        update: UpdatePlanningInput,
        target: CreatePlanningInput,
    ) -> Result<Option<(Planning, Planning)>>;
}
