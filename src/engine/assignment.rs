//! Contributor suggestions for a project's unstaffed tasks.

use anyhow::Result;
use chrono::NaiveDate;
use serde::Serialize;

use super::calendar::{add_business_days, business_days, next_monday, Clock};
use super::round2;
use crate::models::*;
use crate::store::StaffingStore;

/// Hours of work per day when converting a task estimate to a duration.
pub const TASK_HOURS_PER_DAY: f64 = 7.0;
/// Candidates below this availability are not considered.
pub const MIN_AVAILABILITY: f64 = 0.2;
/// Availability multiplier when any approved vacation overlaps the window.
pub const VACATION_PENALTY: f64 = 0.5;
/// Load at which the load score reaches zero.
pub const FULL_LOAD_HOURS: f64 = 8.0;
/// Loads above this attach a warning to the suggestion.
pub const HIGH_LOAD_WARNING_HOURS: f64 = 6.0;

const AVAILABILITY_POINTS: f64 = 40.0;
const LOAD_POINTS: f64 = 30.0;
const PROJECT_HISTORY_POINTS: f64 = 10.0;
const ALREADY_ASSIGNED_POINTS: f64 = 20.0;

/// A candidate that passed the availability check.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateAvailability {
    pub contributor: Contributor,
    pub contract_daily_hours: f64,
    /// Mean allocated hours per business day in the window.
    pub current_load: f64,
    /// Free share of contract capacity, 0 to 1, halved on vacation overlap.
    pub availability: f64,
    pub on_vacation: bool,
    pub daily_hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateScore {
    /// Additive score out of 100. Ranking only.
    pub total: f64,
    pub confidence: f64,
    pub reasoning: String,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssignmentSuggestion {
    pub task: ProjectTask,
    pub contributor: Contributor,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub daily_hours: f64,
    pub confidence: f64,
    pub score: f64,
    pub reasoning: String,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AssignmentStatistics {
    pub total_tasks: usize,
    pub assigned_tasks: usize,
    pub unassigned_tasks: usize,
    pub average_confidence: f64,
}

impl AssignmentStatistics {
    fn new(suggestions: &[AssignmentSuggestion], unassigned: &[ProjectTask]) -> Self {
        let assigned = suggestions.len();
        let average_confidence = if assigned == 0 {
            0.0
        } else {
            round2(suggestions.iter().map(|s| s.confidence).sum::<f64>() / assigned as f64)
        };

        Self {
            total_tasks: assigned + unassigned.len(),
            assigned_tasks: assigned,
            unassigned_tasks: unassigned.len(),
            average_confidence,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SuggestionReport {
    /// Most confident first.
    pub suggestions: Vec<AssignmentSuggestion>,
    /// Tasks for which no candidate could be found.
    pub unassigned: Vec<ProjectTask>,
    pub statistics: AssignmentStatistics,
}

/// Working days needed for `hours` of work, rounded up.
///
/// `None` when the estimate is not a number or too large to count in days.
pub fn estimate_task_days(hours: f64) -> Option<u32> {
    if hours <= 0.0 {
        return Some(0);
    }
    let days = (hours / TASK_HOURS_PER_DAY).ceil();
    if !days.is_finite() || days > f64::from(u32::MAX) {
        return None;
    }
    Some(days as u32)
}

/// Scores an available candidate.
///
/// `has_history` means the candidate has any planning on the project,
/// `already_assigned` that the task already names them.
pub fn score_candidate(
    candidate: &CandidateAvailability,
    has_history: bool,
    already_assigned: bool,
) -> CandidateScore {
    let mut total = candidate.availability * AVAILABILITY_POINTS;
    let mut reasoning = vec![format!(
        "Availability: {:.0}%",
        candidate.availability * 100.0
    )];
    let mut warnings = Vec::new();

    total += (LOAD_POINTS * (1.0 - candidate.current_load / FULL_LOAD_HOURS)).max(0.0);
    if candidate.current_load > HIGH_LOAD_WARNING_HOURS {
        warnings.push(format!(
            "High current load: {:.1}h/day",
            candidate.current_load
        ));
    }

    if has_history {
        total += PROJECT_HISTORY_POINTS;
        reasoning.push("Has already worked on this project".to_string());
    }

    if already_assigned {
        total += ALREADY_ASSIGNED_POINTS;
        reasoning.push("Already assigned to this task".to_string());
    }

    CandidateScore {
        total,
        confidence: (total / 100.0).min(1.0),
        reasoning: reasoning.join(", "),
        warnings,
    }
}

pub struct TaskAssignmentAssistant<'a> {
    store: &'a dyn StaffingStore,
    clock: &'a dyn Clock,
}

impl<'a> TaskAssignmentAssistant<'a> {
    pub fn new(store: &'a dyn StaffingStore, clock: &'a dyn Clock) -> Self {
        Self { store, clock }
    }

    /// Suggests a contributor for every task of `project` that still needs
    /// staffing, starting at `preferred_start`, the project's start date, or
    /// next Monday, in that order of preference.
    pub fn generate_suggestions(
        &self,
        project: &Project,
        preferred_start: Option<NaiveDate>,
    ) -> Result<SuggestionReport> {
        let start = preferred_start
            .or(project.start_date)
            .unwrap_or_else(|| next_monday(self.clock.today()));

        let mut suggestions = Vec::new();
        let mut unassigned = Vec::new();

        for task in self.store.find_candidate_tasks(project.id)? {
            match self.suggest_assignment(&task, project, start)? {
                Some(suggestion) => suggestions.push(suggestion),
                None => unassigned.push(task),
            }
        }

        suggestions.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        let statistics = AssignmentStatistics::new(&suggestions, &unassigned);

        tracing::info!(
            "Suggested assignments for {}: {}/{} tasks staffed, average confidence {:.2}",
            project.name,
            statistics.assigned_tasks,
            statistics.total_tasks,
            statistics.average_confidence
        );

        Ok(SuggestionReport {
            suggestions,
            unassigned,
            statistics,
        })
    }

    /// Picks the best available contributor for one task, or `None` if the
    /// task has no profile or estimate, or nobody qualifies.
    pub fn suggest_assignment(
        &self,
        task: &ProjectTask,
        project: &Project,
        preferred_start: NaiveDate,
    ) -> Result<Option<AssignmentSuggestion>> {
        let Some(profile) = &task.required_profile else {
            return Ok(None);
        };

        let hours = task.estimated_hours();
        let days = match estimate_task_days(hours) {
            Some(0) => {
                tracing::debug!("Task {} has no estimate; left unassigned", task.name);
                return Ok(None);
            }
            Some(days) => days,
            None => {
                tracing::debug!("Task {} estimate of {}h is out of range; left unassigned", task.name, hours);
                return Ok(None);
            }
        };
        let Some(end) = add_business_days(preferred_start, days) else {
            tracing::debug!("Task {} would end past the calendar; left unassigned", task.name);
            return Ok(None);
        };

        let mut scored = Vec::new();
        for contributor in self.store.find_contributors_with_profile(profile.id)? {
            let Some(candidate) = self.evaluate_availability(contributor, preferred_start, end)?
            else {
                continue;
            };

            let has_history = !self
                .store
                .find_plannings(PlanningFilter::contributor(candidate.contributor.id).project(project.id))?
                .is_empty();
            let already_assigned = task.assigned_contributor_id == Some(candidate.contributor.id);

            let score = score_candidate(&candidate, has_history, already_assigned);
            scored.push((candidate, score));
        }

        scored.sort_by(|(_, a), (_, b)| b.total.total_cmp(&a.total));
        let Some((best, score)) = scored.into_iter().next() else {
            tracing::debug!("No available {} for task {}", profile.name, task.name);
            return Ok(None);
        };

        Ok(Some(AssignmentSuggestion {
            task: task.clone(),
            contributor: best.contributor,
            start_date: preferred_start,
            end_date: end,
            daily_hours: best.daily_hours,
            confidence: score.confidence,
            score: score.total,
            reasoning: score.reasoning,
            warnings: score.warnings,
        }))
    }

    /// Availability of `contributor` over `[start, end]`, or `None` when
    /// they have no contract at `start` or too little free capacity.
    pub fn evaluate_availability(
        &self,
        contributor: Contributor,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Option<CandidateAvailability>> {
        let Some(contract) = self.store.find_active_employment_period(contributor.id, start)?
        else {
            tracing::debug!("{} has no active contract on {start}", contributor.full_name());
            return Ok(None);
        };

        let contract_daily_hours = contract.contract_daily_hours();
        let current_load = self.current_load(&contributor, start, end)?;

        let mut availability = if contract_daily_hours > 0.0 {
            (1.0 - current_load / contract_daily_hours).max(0.0)
        } else {
            0.0
        };

        let on_vacation = self.store.has_approved_vacation(contributor.id, start, end)?;
        if on_vacation {
            availability *= VACATION_PENALTY;
        }

        if availability < MIN_AVAILABILITY {
            return Ok(None);
        }

        Ok(Some(CandidateAvailability {
            contributor,
            contract_daily_hours,
            current_load,
            availability,
            on_vacation,
            daily_hours: contract_daily_hours.min(contract_daily_hours * availability),
        }))
    }

    /// Mean hours allocated per business day over `[start, end]`, ignoring
    /// cancelled plannings. Zero for a window without business days.
    pub fn current_load(
        &self,
        contributor: &Contributor,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<f64> {
        let plannings: Vec<Planning> = self
            .store
            .find_plannings(PlanningFilter::contributor(contributor.id).overlapping(start, end))?
            .into_iter()
            .filter(|p| !p.is_cancelled())
            .collect();

        let mut days = 0u32;
        let mut hours = 0.0;
        for day in business_days(start, end) {
            days += 1;
            hours += plannings
                .iter()
                .filter(|p| p.covers(day))
                .map(|p| p.daily_hours)
                .sum::<f64>();
        }

        if days == 0 {
            return Ok(0.0);
        }
        Ok(hours / f64::from(days))
    }
}
