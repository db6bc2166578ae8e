use axum::extract::FromRef;

use crate::marketplace::{ApplicationManager, ShiftManager};
use crate::user::{TokenService, UserStore};
use std::sync::Arc;
use std::time::Instant;

use super::websocket::EventHub;
use super::ServerConfig;

pub type GuardedShiftManager = Arc<ShiftManager>;
pub type GuardedApplicationManager = Arc<ApplicationManager>;
pub type GuardedUserStore = Arc<dyn UserStore>;
pub type GuardedTokenService = Arc<TokenService>;
pub type GuardedEventHub = Arc<EventHub>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub shift_manager: GuardedShiftManager,
    pub application_manager: GuardedApplicationManager,
    pub user_store: GuardedUserStore,
    pub token_service: GuardedTokenService,
    pub event_hub: GuardedEventHub,
    pub hash: String,
}

impl FromRef<ServerState> for GuardedShiftManager {
    fn from_ref(input: &ServerState) -> Self {
        input.shift_manager.clone()
    }
}

impl FromRef<ServerState> for GuardedApplicationManager {
    fn from_ref(input: &ServerState) -> Self {
        input.application_manager.clone()
    }
}

impl FromRef<ServerState> for GuardedUserStore {
    fn from_ref(input: &ServerState) -> Self {
        input.user_store.clone()
    }
}

impl FromRef<ServerState> for GuardedTokenService {
    fn from_ref(input: &ServerState) -> Self {
        input.token_service.clone()
    }
}

impl FromRef<ServerState> for GuardedEventHub {
    fn from_ref(input: &ServerState) -> Self {
        input.event_hub.clone()
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}
