//! Shiftkerja Server Library
//!
//! This library exposes the internal modules for testing and potential reuse.

pub mod geo_index;
pub mod marketplace;
pub mod server;
pub mod shift_store;
pub mod sqlite_persistence;
pub mod user;

// Re-export commonly used types for convenience
pub use geo_index::{GeoIndex, HaversineGeoIndex};
pub use marketplace::{ApplicationManager, MarketplaceError, ShiftManager};
pub use server::{run_server, RequestsLoggingLevel};
pub use shift_store::{ShiftStore, SqliteShiftStore};
pub use user::{SqliteUserStore, TokenService, UserRole, UserStore};
