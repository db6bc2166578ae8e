//! Shift and application records as held by the authoritative store.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShiftStatus {
    Open,
    Filled,
}

impl ShiftStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ShiftStatus::Open => "OPEN",
            ShiftStatus::Filled => "FILLED",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "OPEN" => Some(ShiftStatus::Open),
            "FILLED" => Some(ShiftStatus::Filled),
            _ => None,
        }
    }
}

/// A job posting. The id and creation timestamp are assigned by the store;
/// status starts OPEN and flips to FILLED exactly once, when an application
/// is accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shift {
    pub id: i64,
    pub owner_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub pay_rate: f64,
    pub lat: f64,
    pub lng: f64,
    pub status: ShiftStatus,
    /// Unix timestamp in seconds.
    pub created: i64,
}

/// Fields for a new shift; id, status and timestamp come from the store.
#[derive(Debug, Clone)]
pub struct ShiftDraft {
    pub owner_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub pay_rate: f64,
    pub lat: f64,
    pub lng: f64,
}

/// Full replacement of a shift's mutable fields. Status is deliberately not
/// here: OPEN -> FILLED happens only through application acceptance.
#[derive(Debug, Clone)]
pub struct ShiftChanges {
    pub title: String,
    pub description: Option<String>,
    pub pay_rate: f64,
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicationStatus {
    Pending,
    Accepted,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "PENDING",
            ApplicationStatus::Accepted => "ACCEPTED",
            ApplicationStatus::Rejected => "REJECTED",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(ApplicationStatus::Pending),
            "ACCEPTED" => Some(ApplicationStatus::Accepted),
            "REJECTED" => Some(ApplicationStatus::Rejected),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, ApplicationStatus::Accepted | ApplicationStatus::Rejected)
    }
}

/// A worker's bid to fill a shift. At most one per (shift, worker) pair,
/// enforced by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Application {
    pub id: i64,
    pub shift_id: i64,
    pub worker_id: i64,
    pub status: ApplicationStatus,
    /// Unix timestamp in seconds.
    pub created: i64,
}

/// Worker-facing application listing, joined with the parent shift.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerApplication {
    pub id: i64,
    pub shift_id: i64,
    pub worker_id: i64,
    pub status: ApplicationStatus,
    pub created: i64,
    pub shift_title: String,
    pub shift_pay_rate: f64,
}
