//! WebSocket event feed.
//!
//! Connected clients receive every marketplace event as a `{type, payload}`
//! envelope. The hub is the transport-side [EventSink] implementation.
//!
//! [EventSink]: crate::marketplace::EventSink

mod handler;
mod hub;
mod messages;

pub use handler::ws_handler;
pub use hub::EventHub;
pub use messages::{msg_types, system, ClientMessage, ServerMessage};
