mod haversine_index;
mod trait_def;

pub use haversine_index::{haversine_km, HaversineGeoIndex};
pub use trait_def::{GeoIndex, NoOpGeoIndex};
