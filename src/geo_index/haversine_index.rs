use anyhow::Result;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::shift_store::Shift;

use super::trait_def::GeoIndex;

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two (lat, lng) points in kilometers.
pub fn haversine_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().atan2((1.0 - a).sqrt())
}

/// In-process proximity index over shift snapshots.
///
/// A flat map scanned with the haversine formula; at marketplace scale that
/// beats maintaining a spatial tree, and the whole structure is rebuilt from
/// the authoritative store on startup anyway. Concurrent writers may race,
/// which is fine: the index tolerates transient staleness by contract.
#[derive(Default)]
pub struct HaversineGeoIndex {
    entries: RwLock<HashMap<i64, Shift>>,
}

impl HaversineGeoIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().unwrap().is_empty()
    }
}

impl GeoIndex for HaversineGeoIndex {
    fn upsert(&self, shift: &Shift) -> Result<()> {
        self.entries
            .write()
            .unwrap()
            .insert(shift.id, shift.clone());
        Ok(())
    }

    fn remove(&self, shift_id: i64) -> Result<()> {
        self.entries.write().unwrap().remove(&shift_id);
        Ok(())
    }

    fn search_within_radius(&self, lat: f64, lng: f64, radius_km: f64) -> Result<Vec<Shift>> {
        let entries = self.entries.read().unwrap();
        Ok(entries
            .values()
            .filter(|shift| haversine_km(lat, lng, shift.lat, shift.lng) <= radius_km)
            .cloned()
            .collect())
    }

    fn rebuild(&self, shifts: &[Shift]) -> Result<()> {
        let mut entries = self.entries.write().unwrap();
        entries.clear();
        for shift in shifts {
            entries.insert(shift.id, shift.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shift_store::ShiftStatus;

    fn shift_at(id: i64, lat: f64, lng: f64) -> Shift {
        Shift {
            id,
            owner_id: 1,
            title: format!("shift-{}", id),
            description: None,
            pay_rate: 100.0,
            lat,
            lng,
            status: ShiftStatus::Open,
            created: 0,
        }
    }

    #[test]
    fn haversine_known_distances() {
        // Paris <-> London is roughly 344 km
        let d = haversine_km(48.8566, 2.3522, 51.5074, -0.1278);
        assert!((d - 344.0).abs() < 5.0, "got {}", d);

        // Same point is zero
        assert!(haversine_km(-8.6478, 115.1385, -8.6478, 115.1385) < 1e-9);
    }

    #[test]
    fn finds_shift_near_its_own_coordinates() {
        let index = HaversineGeoIndex::new();
        index.upsert(&shift_at(1, -8.6478, 115.1385)).unwrap();

        let hits = index
            .search_within_radius(-8.6478, 115.1385, 0.01)
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, 1);
    }

    #[test]
    fn search_respects_radius() {
        let index = HaversineGeoIndex::new();
        index.upsert(&shift_at(1, -8.6478, 115.1385)).unwrap();

        // ~1 km away
        let near = index.search_within_radius(-8.64, 115.13, 10.0).unwrap();
        assert_eq!(near.len(), 1);

        // Other side of the planet
        let far = index.search_within_radius(0.0, 0.0, 10.0).unwrap();
        assert!(far.is_empty());
    }

    #[test]
    fn upsert_replaces_existing_entry() {
        let index = HaversineGeoIndex::new();
        index.upsert(&shift_at(1, 10.0, 10.0)).unwrap();
        index.upsert(&shift_at(1, 50.0, 50.0)).unwrap();

        assert_eq!(index.len(), 1);
        assert!(index.search_within_radius(10.0, 10.0, 5.0).unwrap().is_empty());
        assert_eq!(index.search_within_radius(50.0, 50.0, 5.0).unwrap().len(), 1);
    }

    #[test]
    fn remove_is_idempotent() {
        let index = HaversineGeoIndex::new();
        index.upsert(&shift_at(1, 10.0, 10.0)).unwrap();
        index.remove(1).unwrap();
        index.remove(1).unwrap();
        assert!(index.is_empty());
    }

    #[test]
    fn rebuild_replaces_contents() {
        let index = HaversineGeoIndex::new();
        index.upsert(&shift_at(1, 10.0, 10.0)).unwrap();

        index
            .rebuild(&[shift_at(2, 20.0, 20.0), shift_at(3, 30.0, 30.0)])
            .unwrap();

        assert_eq!(index.len(), 2);
        assert!(index.search_within_radius(10.0, 10.0, 5.0).unwrap().is_empty());
        assert_eq!(index.search_within_radius(20.0, 20.0, 5.0).unwrap().len(), 1);
    }
}
