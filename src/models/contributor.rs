use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A role or skill category used to match contributors with work.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Profile {
    pub id: Uuid,
    pub name: String,
}

/// A person who can be allocated to projects.
///
/// Contributors are never deleted: on departure they are deactivated and
/// drop out of every analysis, which only considers active contributors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contributor {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub active: bool,
    /// Role/skill tags, used for compatibility matching.
    pub profiles: Vec<Profile>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Contributor {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    pub fn has_profile(&self, profile_id: Uuid) -> bool {
        self.profiles.iter().any(|p| p.id == profile_id)
    }

    /// Whether the two contributors carry at least one common profile.
    pub fn shares_profile_with(&self, other: &Contributor) -> bool {
        self.profiles.iter().any(|p| other.has_profile(p.id))
    }

    pub fn to_ref(&self) -> ContributorRef {
        ContributorRef {
            id: self.id,
            name: self.full_name(),
        }
    }
}

/// Lightweight reference to a contributor, carried in recommendation payloads.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContributorRef {
    pub id: Uuid,
    pub name: String,
}

/// Input for creating a new contributor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateContributorInput {
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    #[serde(default)]
    pub profile_ids: Vec<Uuid>,
}

/// One contiguous employment contract.
///
/// Periods of the same contributor are expected not to overlap; that is
/// enforced by whoever writes them, not here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmploymentPeriod {
    pub id: Uuid,
    pub contributor_id: Uuid,
    pub start_date: NaiveDate,
    /// `None` for an open-ended contract.
    pub end_date: Option<NaiveDate>,
    pub weekly_hours: f64,
    /// Part-time factor, 100 for full time.
    pub work_time_percentage: f64,
    pub daily_rate: Option<f64>,
}

impl EmploymentPeriod {
    /// Contracted hours per business day.
    pub fn contract_daily_hours(&self) -> f64 {
        self.weekly_hours * self.work_time_percentage / 100.0 / 5.0
    }
}

/// Input for recording an employment contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEmploymentPeriodInput {
    pub contributor_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub weekly_hours: f64,
    pub work_time_percentage: f64,
    pub daily_rate: Option<f64>,
}

/// A leave interval. Only approved vacations reduce availability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vacation {
    pub id: Uuid,
    pub contributor_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub kind: VacationKind,
    pub status: VacationStatus,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VacationKind {
    PaidLeave,
    CompensatoryRest,
    ExceptionalAbsence,
    SickLeave,
    Training,
    Other,
}

impl VacationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PaidLeave => "paid_leave",
            Self::CompensatoryRest => "compensatory_rest",
            Self::ExceptionalAbsence => "exceptional_absence",
            Self::SickLeave => "sick_leave",
            Self::Training => "training",
            Self::Other => "other",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "paid_leave" => Some(Self::PaidLeave),
            "compensatory_rest" => Some(Self::CompensatoryRest),
            "exceptional_absence" => Some(Self::ExceptionalAbsence),
            "sick_leave" => Some(Self::SickLeave),
            "training" => Some(Self::Training),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

/// Approval state of a vacation request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VacationStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

impl VacationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

/// Input for recording a vacation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateVacationInput {
    pub contributor_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub kind: VacationKind,
    pub status: VacationStatus,
}
