use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An allocation record: one contributor on one project for a date range.
///
/// This is the unit the engine reads to measure load and the unit it
/// creates or mutates when a recommendation is applied. Plannings are never
/// hard-deleted by the engine; withdrawn allocations are `Cancelled`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Planning {
    pub id: Uuid,
    pub contributor_id: Uuid,
    pub project_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub daily_hours: f64,
    pub status: PlanningStatus,
    /// Free text, also used as an audit trail for engine-applied changes.
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Planning {
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == PlanningStatus::Cancelled
    }
}

/// The status of an allocation record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PlanningStatus {
    Planned,
    Confirmed,
    Cancelled,
}

impl PlanningStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Planned => "planned",
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "planned" => Some(Self::Planned),
            "confirmed" => Some(Self::Confirmed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

/// Input for creating an allocation record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePlanningInput {
    pub contributor_id: Uuid,
    pub project_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub daily_hours: f64,
    /// Defaults to `Planned` if not specified.
    pub status: Option<PlanningStatus>,
    pub notes: Option<String>,
}

/// Input for updating an allocation record. All fields are optional for partial updates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePlanningInput {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub daily_hours: Option<f64>,
    pub status: Option<PlanningStatus>,
    pub notes: Option<String>,
}

/// Query filter for allocation records. Unset fields do not constrain.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlanningFilter {
    pub contributor_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
    /// Inclusive `(start, end)`; keeps plannings overlapping it.
    pub overlapping: Option<(NaiveDate, NaiveDate)>,
}

impl PlanningFilter {
    pub fn contributor(contributor_id: Uuid) -> Self {
        Self {
            contributor_id: Some(contributor_id),
            ..Self::default()
        }
    }

    pub fn project(mut self, project_id: Uuid) -> Self {
        self.project_id = Some(project_id);
        self
    }

    pub fn overlapping(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.overlapping = Some((start, end));
        self
    }
}
