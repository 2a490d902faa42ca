//! Rebalancing recommendations derived from occupancy analysis.
//!
//! Overloaded contributors get `reassign_planning` suggestions toward
//! compatible colleagues with spare capacity (or a generic
//! `reduce_workload` when they have no allocation to move). Underutilized
//! contributors get `increase_allocation` suggestions on external projects,
//! favouring important clients. Every recommendation carries a
//! `priority_score` and the whole list is ranked on it.

use anyhow::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::calendar::{count_business_days, Clock, DateRange};
use super::occupancy::{ContributorAnalysis, OccupancyAnalyzer, OccupancyReport, OccupancyStatus};
use crate::models::*;
use crate::store::StaffingStore;

/// Flat hours-per-day used to weigh plannings when choosing what to offload.
///
/// Deliberately ignores the planning's own `daily_hours`.
pub const OFFLOAD_HOURS_PER_DAY: f64 = 7.0;
/// Daily hours of a planning created by an applied `increase_allocation`.
pub const DEFAULT_ALLOCATION_HOURS: f64 = 4.0;
/// At most this many `increase_allocation` suggestions per contributor.
pub const MAX_ALLOCATION_SUGGESTIONS: usize = 3;

const LOW_CLIENT_OFFLOAD_BONUS: u32 = 20;
const VIP_CLIENT_BONUS: u32 = 30;
const PRIORITY_CLIENT_BONUS: u32 = 20;

/// What a recommendation proposes to do, with the fields each kind needs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecommendationAction {
    /// Overloaded with no allocation on record; needs a human to look.
    ReduceWorkload(ReduceWorkload),
    /// Move part of `contributor`'s allocation on `project` to `target`.
    ReassignPlanning(ReassignPlanning),
    /// Allocate `contributor` on `project`.
    IncreaseAllocation(IncreaseAllocation),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReduceWorkload {
    pub contributor: ContributorRef,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReassignPlanning {
    pub contributor: ContributorRef,
    pub target: ContributorRef,
    pub project: ProjectRef,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IncreaseAllocation {
    pub contributor: ContributorRef,
    pub project: ProjectRef,
}

impl RecommendationAction {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::ReduceWorkload(_) => "reduce_workload",
            Self::ReassignPlanning(_) => "reassign_planning",
            Self::IncreaseAllocation(_) => "increase_allocation",
        }
    }

    /// The contributor the recommendation was generated for.
    pub fn contributor(&self) -> &ContributorRef {
        match self {
            Self::ReduceWorkload(r) => &r.contributor,
            Self::ReassignPlanning(r) => &r.contributor,
            Self::IncreaseAllocation(r) => &r.contributor,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SeverityLevel {
    Critical,
    High,
    Medium,
    /// Reserved tier; no generator emits it yet.
    Low,
}

impl SeverityLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(flatten)]
    pub action: RecommendationAction,
    pub title: String,
    pub description: String,
    pub priority_score: u32,
    pub severity_level: SeverityLevel,
    /// Manual steps to carry the recommendation out.
    pub actions: Vec<String>,
    pub expected_impact: Option<String>,
    pub client_priority: Option<ServiceLevel>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RecommendationSummary {
    pub total_contributors: usize,
    pub critical_count: usize,
    pub overloaded_count: usize,
    pub underutilized_count: usize,
    pub optimal_count: usize,
    pub total_recommendations: usize,
    /// Recommendations at `critical` or `high` severity.
    pub high_priority_count: usize,
    pub medium_priority_count: usize,
    /// Zero until a generator emits [`SeverityLevel::Low`].
    pub low_priority_count: usize,
}

impl RecommendationSummary {
    fn new(analysis: &OccupancyReport, recommendations: &[Recommendation]) -> Self {
        let at = |levels: &[SeverityLevel]| {
            recommendations
                .iter()
                .filter(|r| levels.contains(&r.severity_level))
                .count()
        };

        Self {
            total_contributors: analysis.total_contributors(),
            critical_count: analysis.critical.len(),
            overloaded_count: analysis.overloaded.len(),
            underutilized_count: analysis.underutilized.len(),
            optimal_count: analysis.optimal.len(),
            total_recommendations: recommendations.len(),
            high_priority_count: at(&[SeverityLevel::Critical, SeverityLevel::High]),
            medium_priority_count: at(&[SeverityLevel::Medium]),
            low_priority_count: at(&[SeverityLevel::Low]),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RecommendationReport {
    /// Highest `priority_score` first.
    pub recommendations: Vec<Recommendation>,
    pub analysis: OccupancyReport,
    pub period: DateRange,
    pub summary: RecommendationSummary,
}

/// Result of applying a recommendation. Failures are values, never panics.
#[derive(Debug, Clone, Serialize)]
pub struct ApplyOutcome {
    pub success: bool,
    pub message: String,
    /// Plannings created or modified.
    pub planning_ids: Vec<Uuid>,
}

impl ApplyOutcome {
    fn failed(error: ApplyError) -> Self {
        Self {
            success: false,
            message: error.to_string(),
            planning_ids: Vec::new(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ApplyError {
    #[error("Workload reduction cannot be applied automatically; manual action is required")]
    ManualActionRequired,

    #[error("Invalid recommendation: {0}")]
    InvalidPayload(String),

    #[error("No active planning found for {contributor} on {project} in this period")]
    NoSourcePlanning { contributor: String, project: String },

    #[error("Planning {0} no longer exists")]
    PlanningVanished(Uuid),

    #[error("Failed to persist the change: {0:#}")]
    Store(#[from] anyhow::Error),
}

/// Summed offload weight of one project in a contributor's plannings.
#[derive(Debug, Clone)]
struct ProjectWorkload {
    project: Project,
    total_hours: f64,
}

pub struct WorkloadRecommender<'a> {
    store: &'a dyn StaffingStore,
    clock: &'a dyn Clock,
    analyzer: OccupancyAnalyzer<'a>,
}

impl<'a> WorkloadRecommender<'a> {
    pub fn new(store: &'a dyn StaffingStore, clock: &'a dyn Clock) -> Self {
        Self {
            store,
            clock,
            analyzer: OccupancyAnalyzer::new(store, clock),
        }
    }

    /// Ranks recommendations for `[start, end]`, defaulting to the current
    /// and next month.
    pub fn generate_recommendations(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<RecommendationReport> {
        let window = DateRange::month_and_next(self.clock.today());
        let period = DateRange::new(start.unwrap_or(window.start), end.unwrap_or(window.end));

        let analysis = self
            .analyzer
            .analyze_all_contributors(Some(period.start), Some(period.end))?;

        let mut recommendations = Vec::new();

        for item in &analysis.critical {
            match item.status {
                OccupancyStatus::CriticalHigh => {
                    recommendations.extend(self.overload_recommendations(item, &analysis, period)?)
                }
                OccupancyStatus::CriticalLow => {
                    recommendations.extend(self.underutilization_recommendations(item)?)
                }
                _ => {}
            }
        }
        for item in &analysis.overloaded {
            recommendations.extend(self.overload_recommendations(item, &analysis, period)?);
        }
        for item in &analysis.underutilized {
            recommendations.extend(self.underutilization_recommendations(item)?);
        }

        recommendations.sort_by(|a, b| b.priority_score.cmp(&a.priority_score));

        let summary = RecommendationSummary::new(&analysis, &recommendations);
        tracing::info!(
            "Generated {} recommendations ({} high priority) for {} to {}",
            summary.total_recommendations,
            summary.high_priority_count,
            period.start,
            period.end
        );

        Ok(RecommendationReport {
            recommendations,
            analysis,
            period,
            summary,
        })
    }

    /// Recommendations for one overloaded or critically overloaded contributor,
    /// in generation order.
    pub fn overload_recommendations(
        &self,
        item: &ContributorAnalysis,
        analysis: &OccupancyReport,
        period: DateRange,
    ) -> Result<Vec<Recommendation>> {
        let contributor = &item.contributor;
        let name = contributor.full_name();
        let severity_level = if item.status == OccupancyStatus::CriticalHigh {
            SeverityLevel::Critical
        } else {
            SeverityLevel::High
        };

        let plannings: Vec<Planning> = self
            .store
            .find_plannings(
                PlanningFilter::contributor(contributor.id).overlapping(period.start, period.end),
            )?
            .into_iter()
            .filter(|p| !p.is_cancelled())
            .collect();

        if plannings.is_empty() {
            tracing::debug!("{name} is overloaded but has no planning in the period");
            return Ok(vec![Recommendation {
                action: RecommendationAction::ReduceWorkload(ReduceWorkload {
                    contributor: contributor.to_ref(),
                }),
                title: format!("{name} is overloaded ({:.0}% occupancy)", item.tace_value()),
                description: "No planning found for this period. Check the actual workload."
                    .to_string(),
                priority_score: item.severity,
                severity_level,
                actions: Vec::new(),
                expected_impact: None,
                client_priority: None,
            }]);
        }

        let workloads = self.project_workloads(&plannings)?;
        let receivers = compatible_receivers(contributor, analysis);
        let Some(receiver) = receivers.first() else {
            tracing::debug!("No compatible receiver for {name}");
            return Ok(Vec::new());
        };

        let reduction = item.deviation.abs() / workloads.len() as f64;

        Ok(workloads
            .iter()
            .map(|workload| {
                let project = &workload.project;
                let level = project.service_level();
                let target = &receiver.contributor;
                let target_name = target.full_name();
                let bonus = if level == ServiceLevel::Low {
                    LOW_CLIENT_OFFLOAD_BONUS
                } else {
                    0
                };

                Recommendation {
                    action: RecommendationAction::ReassignPlanning(ReassignPlanning {
                        contributor: contributor.to_ref(),
                        target: target.to_ref(),
                        project: project.to_ref(),
                    }),
                    title: format!("Reassign {} from {name} to {target_name}", project.name),
                    description: format!(
                        "Move part of the work on \"{}\" (client {} - level: {}) to {target_name} \
                         (current occupancy: {:.0}%). This lowers the load of {name} (occupancy: {:.0}%).",
                        project.name,
                        project.client_name(),
                        level.label(),
                        receiver.tace_value(),
                        item.tace_value(),
                    ),
                    priority_score: item.severity + bonus,
                    severity_level,
                    actions: vec![
                        format!("Reduce the allocation of {name} on {}", project.name),
                        format!("Increase the allocation of {target_name} on {}", project.name),
                    ],
                    expected_impact: Some(format!(
                        "Estimated occupancy reduction for {name}: {reduction:.1} points"
                    )),
                    client_priority: Some(level),
                }
            })
            .collect())
    }

    /// Groups plannings per project, heaviest offload candidates first:
    /// internal projects, then least important clients, then most hours.
    fn project_workloads(&self, plannings: &[Planning]) -> Result<Vec<ProjectWorkload>> {
        let mut workloads: Vec<ProjectWorkload> = Vec::new();

        for planning in plannings {
            let hours = f64::from(count_business_days(planning.start_date, planning.end_date))
                * OFFLOAD_HOURS_PER_DAY;

            if let Some(existing) = workloads
                .iter_mut()
                .find(|w| w.project.id == planning.project_id)
            {
                existing.total_hours += hours;
                continue;
            }

            let Some(project) = self.store.find_project(planning.project_id)? else {
                continue;
            };
            workloads.push(ProjectWorkload {
                project,
                total_hours: hours,
            });
        }

        workloads.sort_by(|a, b| {
            b.project
                .is_internal
                .cmp(&a.project.is_internal)
                .then(a.project.service_level().cmp(&b.project.service_level()))
                .then(b.total_hours.total_cmp(&a.total_hours))
        });

        Ok(workloads)
    }

    /// Recommendations for one underutilized or critically underutilized contributor.
    pub fn underutilization_recommendations(
        &self,
        item: &ContributorAnalysis,
    ) -> Result<Vec<Recommendation>> {
        let contributor = &item.contributor;
        if !is_compatible_with_any_project(contributor) {
            tracing::debug!("{} has no profile; no allocation suggested", contributor.full_name());
            return Ok(Vec::new());
        }

        let mut projects = self.store.find_active_external_projects()?;
        projects.sort_by(|a, b| b.service_level().cmp(&a.service_level()));

        let name = contributor.full_name();
        let severity_level = if item.status == OccupancyStatus::CriticalLow {
            SeverityLevel::Critical
        } else {
            SeverityLevel::Medium
        };
        let increase = item.deviation.abs() / 3.0;

        Ok(projects
            .iter()
            .take(MAX_ALLOCATION_SUGGESTIONS)
            .map(|project| {
                let level = project.service_level();
                let bonus = match level {
                    ServiceLevel::Vip => VIP_CLIENT_BONUS,
                    ServiceLevel::Priority => PRIORITY_CLIENT_BONUS,
                    _ => 0,
                };

                Recommendation {
                    action: RecommendationAction::IncreaseAllocation(IncreaseAllocation {
                        contributor: contributor.to_ref(),
                        project: project.to_ref(),
                    }),
                    title: format!("Increase the allocation of {name} on {}", project.name),
                    description: format!(
                        "{name} is underutilized (occupancy: {:.0}%). Allocating them on \"{}\" \
                         (client: {} - level: {}) would balance the load and could speed up delivery.",
                        item.tace_value(),
                        project.name,
                        project.client_name(),
                        level.label(),
                    ),
                    priority_score: item.severity + bonus,
                    severity_level,
                    actions: vec![format!("Create a planning for {name} on {}", project.name)],
                    expected_impact: Some(format!(
                        "Estimated occupancy increase: {increase:.1} points"
                    )),
                    client_priority: Some(level),
                }
            })
            .collect())
    }

    /// Applies a recommendation over `[start, end]` by writing plannings.
    ///
    /// Never fails: every problem is reported in the outcome. Applying the
    /// same recommendation twice writes twice.
    pub fn apply_recommendation(
        &self,
        action: &RecommendationAction,
        start: NaiveDate,
        end: NaiveDate,
    ) -> ApplyOutcome {
        let result = match action {
            RecommendationAction::IncreaseAllocation(rec) => {
                self.apply_increase_allocation(rec, start, end)
            }
            RecommendationAction::ReassignPlanning(rec) => {
                self.apply_reassign_planning(rec, start, end)
            }
            RecommendationAction::ReduceWorkload(_) => Err(ApplyError::ManualActionRequired),
        };

        match result {
            Ok(outcome) => {
                tracing::info!("Applied {}: {}", action.type_name(), outcome.message);
                outcome
            }
            Err(e) => {
                tracing::warn!(
                    "Could not apply {} for {}: {}",
                    action.type_name(),
                    action.contributor().name,
                    e
                );
                ApplyOutcome::failed(e)
            }
        }
    }

    /// Applies a recommendation given as JSON, as produced by serializing a
    /// [`Recommendation`]. Unknown types and missing fields are reported as
    /// a failed outcome.
    pub fn apply_recommendation_json(
        &self,
        raw: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> ApplyOutcome {
        match serde_json::from_str::<RecommendationAction>(raw) {
            Ok(action) => self.apply_recommendation(&action, start, end),
            Err(e) => {
                tracing::warn!("Rejected recommendation payload: {e}");
                ApplyOutcome::failed(ApplyError::InvalidPayload(e.to_string()))
            }
        }
    }

    fn apply_increase_allocation(
        &self,
        rec: &IncreaseAllocation,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<ApplyOutcome, ApplyError> {
        let planning = self.store.create_planning(CreatePlanningInput {
            contributor_id: rec.contributor.id,
            project_id: rec.project.id,
            start_date: start,
            end_date: end,
            daily_hours: DEFAULT_ALLOCATION_HOURS,
            status: Some(PlanningStatus::Planned),
            notes: Some("Created from a workload recommendation".to_string()),
        })?;

        Ok(ApplyOutcome {
            success: true,
            message: format!(
                "Planning created for {} on {} ({:.2} h/day)",
                rec.contributor.name, rec.project.name, planning.daily_hours
            ),
            planning_ids: vec![planning.id],
        })
    }

    fn apply_reassign_planning(
        &self,
        rec: &ReassignPlanning,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<ApplyOutcome, ApplyError> {
        if rec.contributor.id == rec.target.id {
            return Err(ApplyError::InvalidPayload(
                "source and target contributors are the same".to_string(),
            ));
        }
        if self.store.find_contributor(rec.target.id)?.is_none() {
            return Err(ApplyError::InvalidPayload(format!(
                "unknown target contributor {}",
                rec.target.name
            )));
        }

        let source = self
            .store
            .find_plannings(
                PlanningFilter::contributor(rec.contributor.id)
                    .project(rec.project.id)
                    .overlapping(start, end),
            )?
            .into_iter()
            .find(|p| !p.is_cancelled())
            .ok_or_else(|| ApplyError::NoSourcePlanning {
                contributor: rec.contributor.name.clone(),
                project: rec.project.name.clone(),
            })?;

        let freed = source.daily_hours / 2.0;
        let note = format!(
            "[{}] {freed:.2} h/day reassigned to {} by workload recommendation",
            self.clock.today(),
            rec.target.name
        );
        let notes = match source.notes.as_deref() {
            Some(existing) if !existing.is_empty() => format!("{existing}\n{note}"),
            _ => note,
        };

        let update = UpdatePlanningInput {
            daily_hours: Some(source.daily_hours - freed),
            notes: Some(notes),
            ..UpdatePlanningInput::default()
        };
        let target = CreatePlanningInput {
            contributor_id: rec.target.id,
            project_id: rec.project.id,
            start_date: start,
            end_date: end,
            daily_hours: freed,
            status: Some(PlanningStatus::Planned),
            notes: Some(format!(
                "Reassigned from {} by workload recommendation",
                rec.contributor.name
            )),
        };

        let (_, created) = self
            .store
            .transfer_planning(source.id, update, target)?
            .ok_or(ApplyError::PlanningVanished(source.id))?;

        Ok(ApplyOutcome {
            success: true,
            message: format!(
                "Reassigned {freed:.2} h/day on {} from {} to {}",
                rec.project.name, rec.contributor.name, rec.target.name
            ),
            planning_ids: vec![source.id, created.id],
        })
    }
}

/// Candidates able to absorb work from `source`: underutilized or optimal,
/// not `source`, sharing a profile with it. Least occupied first.
fn compatible_receivers<'r>(
    source: &Contributor,
    analysis: &'r OccupancyReport,
) -> Vec<&'r ContributorAnalysis> {
    let mut receivers: Vec<&ContributorAnalysis> = analysis
        .underutilized
        .iter()
        .chain(analysis.optimal.iter())
        .filter(|c| c.contributor.id != source.id)
        .filter(|c| c.contributor.shares_profile_with(source))
        .collect();

    receivers.sort_by(|a, b| a.tace_value().total_cmp(&b.tace_value()));
    receivers
}

/// Coarse project compatibility: any profile at all qualifies.
fn is_compatible_with_any_project(contributor: &Contributor) -> bool {
    !contributor.profiles.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_serializes_with_type_tag() {
        let action = RecommendationAction::IncreaseAllocation(IncreaseAllocation {
            contributor: ContributorRef {
                id: Uuid::nil(),
                name: "Ada Lovelace".to_string(),
            },
            project: ProjectRef {
                id: Uuid::nil(),
                name: "Engine".to_string(),
            },
        });

        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["type"], "increase_allocation");
        assert_eq!(json["contributor"]["name"], "Ada Lovelace");
        assert_eq!(json["project"]["name"], "Engine");
    }

    #[test]
    fn unknown_type_does_not_parse() {
        let raw = r#"{"type": "fire_everyone", "contributor": {"id": "00000000-0000-0000-0000-000000000000", "name": "x"}}"#;
        assert!(serde_json::from_str::<RecommendationAction>(raw).is_err());
    }

    #[test]
    fn reassign_requires_target() {
        let raw = r#"{
            "type": "reassign_planning",
            "contributor": {"id": "00000000-0000-0000-0000-000000000000", "name": "x"},
            "project": {"id": "00000000-0000-0000-0000-000000000000", "name": "p"}
        }"#;
        assert!(serde_json::from_str::<RecommendationAction>(raw).is_err());
    }

    #[test]
    fn manual_action_message() {
        let outcome = ApplyOutcome::failed(ApplyError::ManualActionRequired);
        assert!(!outcome.success);
        assert!(outcome.message.contains("manual action"));
        assert!(outcome.planning_ids.is_empty());
    }
}
