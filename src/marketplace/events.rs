use serde::Serialize;

use crate::shift_store::{ApplicationStatus, ShiftStatus};

/// Notifications emitted after a successful marketplace mutation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MarketplaceEvent {
    ShiftCreated {
        id: i64,
        title: String,
        lat: f64,
        lng: f64,
        pay_rate: f64,
        status: ShiftStatus,
    },
    ApplicationCreated {
        shift_id: i64,
        worker_id: i64,
        status: ApplicationStatus,
    },
    ApplicationStatusUpdated {
        application_id: i64,
        new_status: ApplicationStatus,
        updated_by: i64,
    },
}

impl MarketplaceEvent {
    pub fn name(&self) -> &'static str {
        match self {
            MarketplaceEvent::ShiftCreated { .. } => "shift_created",
            MarketplaceEvent::ApplicationCreated { .. } => "application_created",
            MarketplaceEvent::ApplicationStatusUpdated { .. } => "application_status_updated",
        }
    }
}

/// Fire-and-forget outlet for [MarketplaceEvent]. Implementations must not
/// block and cannot report failure back to the caller; a lost event never
/// fails the operation that produced it.
pub trait EventSink: Send + Sync {
    fn publish(&self, event: MarketplaceEvent);
}

pub struct NoOpEventSink;

impl EventSink for NoOpEventSink {
    fn publish(&self, _event: MarketplaceEvent) {}
}
