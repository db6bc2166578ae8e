//! GeoIndex trait definition.
//!
//! The proximity index is derived from the authoritative shift store and is
//! best-effort: losing it degrades search, never correctness. Writes to it
//! happen strictly after the corresponding authoritative write, and callers
//! are expected to log-and-swallow its errors.

use anyhow::Result;

use crate::shift_store::Shift;

pub trait GeoIndex: Send + Sync {
    /// Inserts or replaces the snapshot for a shift, keyed by shift id.
    fn upsert(&self, shift: &Shift) -> Result<()>;

    /// Removes a shift from the index. Removing an absent shift is not an
    /// error (removal is idempotent).
    fn remove(&self, shift_id: i64) -> Result<()>;

    /// All indexed shift snapshots within `radius_km` of the given point.
    /// Order is unspecified.
    fn search_within_radius(&self, lat: f64, lng: f64, radius_km: f64) -> Result<Vec<Shift>>;

    /// Drops the current contents and re-indexes the given shifts. Used at
    /// startup to derive the index from the authoritative store.
    fn rebuild(&self, shifts: &[Shift]) -> Result<()>;
}

/// Index that remembers nothing and finds nothing. For tests and for running
/// the server without proximity search.
pub struct NoOpGeoIndex;

impl GeoIndex for NoOpGeoIndex {
    fn upsert(&self, _shift: &Shift) -> Result<()> {
        Ok(())
    }

    fn remove(&self, _shift_id: i64) -> Result<()> {
        Ok(())
    }

    fn search_within_radius(&self, _lat: f64, _lng: f64, _radius_km: f64) -> Result<Vec<Shift>> {
        Ok(Vec::new())
    }

    fn rebuild(&self, _shifts: &[Shift]) -> Result<()> {
        Ok(())
    }
}
