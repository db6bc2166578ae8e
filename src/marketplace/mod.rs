//! The shift and application consistency engine.
//!
//! Everything here runs between the transport layer and the two stores:
//! the authorization guard, the two lifecycle managers, and the dual-write
//! policy (authoritative store first, proximity index best-effort after).

mod application_manager;
mod error;
mod events;
mod guard;
mod shift_manager;

pub use application_manager::{ApplicationManager, ShiftApplicant};
pub use error::MarketplaceError;
pub use events::{EventSink, MarketplaceEvent, NoOpEventSink};
pub use guard::{authorize, Action, Caller};
pub use shift_manager::ShiftManager;
