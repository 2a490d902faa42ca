use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Profile;

/// Commercial priority of a client.
///
/// Used only to weight recommendation ordering, never as a hard constraint.
/// Variants are declared in ascending priority so the derived `Ord` gives
/// `Low < Standard < Priority < Vip`.
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(rename_all = "snake_case")]
pub enum ServiceLevel {
    Low,
    #[default]
    Standard,
    Priority,
    Vip,
}

impl ServiceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Standard => "standard",
            Self::Priority => "priority",
            Self::Vip => "vip",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "low" => Some(Self::Low),
            "standard" => Some(Self::Standard),
            "priority" => Some(Self::Priority),
            "vip" => Some(Self::Vip),
            _ => None,
        }
    }

    /// Human-readable label used in recommendation texts.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "Low priority",
            Self::Standard => "Standard",
            Self::Priority => "Priority",
            Self::Vip => "VIP",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub id: Uuid,
    pub name: String,
    /// Unset levels are treated as [`ServiceLevel::Standard`].
    pub service_level: Option<ServiceLevel>,
}

/// Input for creating a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateClientInput {
    pub name: String,
    pub service_level: Option<ServiceLevel>,
}

/// A piece of staffed work, internal or billed to a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub status: ProjectStatus,
    /// Internal projects are not billed to a client.
    pub is_internal: bool,
    pub client: Option<Client>,
    /// Profiles the project needs. Informational only: assignment matches
    /// each task's own required profile and the reassignment check ignores it.
    #[serde(default)]
    pub required_profiles: Vec<Profile>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Effective service level of the project's client.
    pub fn service_level(&self) -> ServiceLevel {
        self.client
            .as_ref()
            .and_then(|c| c.service_level)
            .unwrap_or_default()
    }

    pub fn client_name(&self) -> &str {
        self.client.as_ref().map(|c| c.name.as_str()).unwrap_or("N/A")
    }

    pub fn to_ref(&self) -> ProjectRef {
        ProjectRef {
            id: self.id,
            name: self.name.clone(),
        }
    }
}

/// Lightweight reference to a project, carried in recommendation payloads.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProjectRef {
    pub id: Uuid,
    pub name: String,
}

/// Lifecycle status of a project.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Active,
    Completed,
    Cancelled,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

/// Input for creating a new project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProjectInput {
    pub name: String,
    /// Defaults to `Active` if not specified.
    pub status: Option<ProjectStatus>,
    #[serde(default)]
    pub is_internal: bool,
    pub client_id: Option<Uuid>,
    #[serde(default)]
    pub required_profile_ids: Vec<Uuid>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}
