use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One pre-computed staffing row for a contributor and period.
///
/// Rows are produced by an external aggregation job; the engine consumes
/// them as ground truth and never recomputes them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffingMetric {
    pub id: Uuid,
    /// `None` for aggregate rows.
    pub contributor_id: Option<Uuid>,
    /// First day of the period the row describes.
    pub period_date: NaiveDate,
    pub granularity: Granularity,
    pub available_days: f64,
    pub worked_days: f64,
    pub planned_days: f64,
    pub vacation_days: f64,
    /// Occupancy rate in percent, 100 meaning fully booked at contract capacity.
    pub tace: f64,
}

/// Aggregation period of a metric row.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    Weekly,
    Monthly,
    Quarterly,
}

impl Granularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "weekly" => Some(Self::Weekly),
            "monthly" => Some(Self::Monthly),
            "quarterly" => Some(Self::Quarterly),
            _ => None,
        }
    }
}

/// Input for recording a metric row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordMetricInput {
    pub contributor_id: Option<Uuid>,
    pub period_date: NaiveDate,
    pub granularity: Granularity,
    pub available_days: f64,
    pub worked_days: f64,
    #[serde(default)]
    pub planned_days: f64,
    #[serde(default)]
    pub vacation_days: f64,
    pub tace: f64,
}
