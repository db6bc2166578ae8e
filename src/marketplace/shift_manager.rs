use std::sync::Arc;

use tracing::warn;

use crate::geo_index::GeoIndex;
use crate::shift_store::{Shift, ShiftChanges, ShiftDraft, ShiftStatus, ShiftStore};

use super::error::MarketplaceError;
use super::events::{EventSink, MarketplaceEvent};
use super::guard::{authorize, Action, Caller};

/// Shift lifecycle: create, update, delete, and the two read paths.
///
/// All writes follow the dual-write policy: the authoritative store goes
/// first and its failure aborts the operation; the proximity index is
/// written after and its failure is logged and swallowed.
pub struct ShiftManager {
    store: Arc<dyn ShiftStore>,
    geo_index: Arc<dyn GeoIndex>,
    event_sink: Arc<dyn EventSink>,
}

fn validate_shift_fields(title: &str, pay_rate: f64) -> Result<(), MarketplaceError> {
    if title.trim().is_empty() {
        return Err(MarketplaceError::Validation(
            "Title must not be empty".to_string(),
        ));
    }
    if pay_rate <= 0.0 {
        return Err(MarketplaceError::Validation(
            "Pay rate must be positive".to_string(),
        ));
    }
    Ok(())
}

impl ShiftManager {
    pub fn new(
        store: Arc<dyn ShiftStore>,
        geo_index: Arc<dyn GeoIndex>,
        event_sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            store,
            geo_index,
            event_sink,
        }
    }

    pub fn create_shift(
        &self,
        caller: &Caller,
        draft: ShiftDraft,
    ) -> Result<Shift, MarketplaceError> {
        authorize(caller, &Action::CreateShift)?;
        validate_shift_fields(&draft.title, draft.pay_rate)?;

        // Ownership comes from the authenticated identity, never from the
        // request payload.
        let draft = ShiftDraft {
            owner_id: caller.user_id,
            ..draft
        };
        let shift = self.store.create_shift(draft)?;

        if let Err(err) = self.geo_index.upsert(&shift) {
            warn!("Failed to index shift {}: {:#}", shift.id, err);
        }
        self.event_sink.publish(MarketplaceEvent::ShiftCreated {
            id: shift.id,
            title: shift.title.clone(),
            lat: shift.lat,
            lng: shift.lng,
            pay_rate: shift.pay_rate,
            status: shift.status,
        });
        Ok(shift)
    }

    pub fn update_shift(
        &self,
        caller: &Caller,
        shift_id: i64,
        changes: ShiftChanges,
    ) -> Result<Shift, MarketplaceError> {
        let existing = self
            .store
            .get_shift(shift_id)?
            .ok_or(MarketplaceError::NotFound("Shift"))?;
        authorize(caller, &Action::UpdateShift { owner_id: existing.owner_id })?;
        validate_shift_fields(&changes.title, changes.pay_rate)?;

        let updated = self
            .store
            .update_shift(shift_id, &changes)?
            .ok_or(MarketplaceError::NotFound("Shift"))?;

        // Only biddable shifts belong in the index.
        let index_result = if updated.status == ShiftStatus::Open {
            self.geo_index.upsert(&updated)
        } else {
            self.geo_index.remove(updated.id)
        };
        if let Err(err) = index_result {
            warn!("Failed to re-index shift {}: {:#}", updated.id, err);
        }
        Ok(updated)
    }

    pub fn delete_shift(&self, caller: &Caller, shift_id: i64) -> Result<(), MarketplaceError> {
        let existing = self
            .store
            .get_shift(shift_id)?
            .ok_or(MarketplaceError::NotFound("Shift"))?;
        authorize(caller, &Action::DeleteShift { owner_id: existing.owner_id })?;

        if !self.store.delete_shift(shift_id)? {
            return Err(MarketplaceError::NotFound("Shift"));
        }
        if let Err(err) = self.geo_index.remove(shift_id) {
            warn!("Failed to remove shift {} from index: {:#}", shift_id, err);
        }
        Ok(())
    }

    /// Pure read-through to the proximity index. Radius defaulting and
    /// clamping are the transport layer's business.
    pub fn nearby_shifts(
        &self,
        caller: &Caller,
        lat: f64,
        lng: f64,
        radius_km: f64,
    ) -> Result<Vec<Shift>, MarketplaceError> {
        authorize(caller, &Action::ReadNearby)?;
        Ok(self.geo_index.search_within_radius(lat, lng, radius_km)?)
    }

    pub fn shifts_by_owner(&self, caller: &Caller) -> Result<Vec<Shift>, MarketplaceError> {
        Ok(self.store.get_shifts_by_owner(caller.user_id)?)
    }
}
