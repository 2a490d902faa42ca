use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Profile;

/// A unit of sold or internal work within a project.
///
/// Tasks that are active, not completed, count toward profitability and
/// declare a required profile are the ones the assignment assistant tries
/// to staff.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectTask {
    pub id: Uuid,
    pub project_id: Uuid,
    pub name: String,
    pub status: TaskStatus,
    pub active: bool,
    pub counts_for_profitability: bool,
    pub task_type: TaskType,
    pub required_profile: Option<Profile>,
    pub assigned_contributor_id: Option<Uuid>,
    pub estimated_hours_sold: Option<f64>,
    /// Re-estimate made during delivery. Takes precedence over the sold hours.
    pub estimated_hours_revised: Option<f64>,
    pub position: i32,
    pub created_at: DateTime<Utc>,
}

impl ProjectTask {
    /// Best known estimate in hours: revised, else sold, else zero.
    pub fn estimated_hours(&self) -> f64 {
        self.estimated_hours_revised
            .or(self.estimated_hours_sold)
            .unwrap_or(0.0)
    }
}

/// The delivery status of a task.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    NotStarted,
    InProgress,
    OnHold,
    Completed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::InProgress => "in_progress",
            Self::OnHold => "on_hold",
            Self::Completed => "completed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "not_started" => Some(Self::NotStarted),
            "in_progress" => Some(Self::InProgress),
            "on_hold" => Some(Self::OnHold),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

/// Whether a task is regular sold work or something else.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    /// Normal sold work.
    Regular,
    /// Pre-sales effort.
    PreSales,
    /// Work that was not sold to the client.
    Unsold,
}

impl TaskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Regular => "regular",
            Self::PreSales => "pre_sales",
            Self::Unsold => "unsold",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "regular" => Some(Self::Regular),
            "pre_sales" => Some(Self::PreSales),
            "unsold" => Some(Self::Unsold),
            _ => None,
        }
    }
}

/// Input for creating a task within a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTaskInput {
    pub name: String,
    /// Defaults to `NotStarted` if not specified.
    pub status: Option<TaskStatus>,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default = "default_true")]
    pub counts_for_profitability: bool,
    /// Defaults to `Regular` if not specified.
    pub task_type: Option<TaskType>,
    pub required_profile_id: Option<Uuid>,
    pub assigned_contributor_id: Option<Uuid>,
    pub estimated_hours_sold: Option<f64>,
    pub estimated_hours_revised: Option<f64>,
    pub position: Option<i32>,
}

fn default_true() -> bool {
    true
}
