use anyhow::Result;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, error};

use crate::geo_index::GeoIndex;
use crate::marketplace::{ApplicationManager, MarketplaceError, ShiftManager};
use crate::shift_store::{ApplicationStatus, ShiftChanges, ShiftDraft, ShiftStore};
use crate::user::{NewUser, TokenService, UserRole, UserStore};
use tower_http::services::ServeDir;

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{response, HeaderValue, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::session::Session;
use super::websocket::{ws_handler, EventHub};
use super::{log_requests, state::*, RequestsLoggingLevel, ServerConfig};

const DEFAULT_SEARCH_RADIUS_KM: f64 = 10.0;
const MAX_SEARCH_RADIUS_KM: f64 = 100.0;

const MAX_TITLE_LENGTH: usize = 100;
const MAX_DESCRIPTION_LENGTH: usize = 500;
const MIN_PASSWORD_LENGTH: usize = 6;

impl IntoResponse for MarketplaceError {
    fn into_response(self) -> Response {
        let status = match &self {
            MarketplaceError::Validation(_) => StatusCode::BAD_REQUEST,
            MarketplaceError::Unauthorized => StatusCode::FORBIDDEN,
            MarketplaceError::NotFound(_) => StatusCode::NOT_FOUND,
            MarketplaceError::Conflict(_) => StatusCode::CONFLICT,
            MarketplaceError::Store(err) => {
                error!("Store failure: {:#}", err);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        // Store details stay in the logs, not on the wire.
        let message = match &self {
            MarketplaceError::Store(_) => "Internal error".to_string(),
            other => other.to_string(),
        };
        let body = serde_json::json!({
            "error": self.kind(),
            "message": message,
        });
        (status, Json(body)).into_response()
    }
}

fn validation(message: impl Into<String>) -> MarketplaceError {
    MarketplaceError::Validation(message.into())
}

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub hash: String,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

async fn home(State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        hash: state.hash.clone(),
    };
    Json(stats)
}

#[derive(Deserialize, Debug)]
struct RegisterBody {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub role: String,
}

#[derive(Deserialize, Debug)]
struct LoginBody {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
struct LoginSuccessResponse {
    token: String,
    role: UserRole,
}

async fn register(
    State(user_store): State<GuardedUserStore>,
    Json(body): Json<RegisterBody>,
) -> Response {
    if body.email.trim().is_empty() || !body.email.contains('@') {
        return validation("A valid email is required").into_response();
    }
    if body.password.len() < MIN_PASSWORD_LENGTH {
        return validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        ))
        .into_response();
    }
    if body.full_name.trim().is_empty() {
        return validation("Full name is required").into_response();
    }
    let role = match UserRole::from_str(&body.role) {
        Some(role) => role,
        None => return validation("Role must be worker, business or admin").into_response(),
    };

    let new_user = NewUser {
        email: body.email.trim().to_lowercase(),
        full_name: body.full_name.trim().to_string(),
        role,
    };
    match user_store.create_user(new_user, &body.password) {
        Ok(Some(user)) => (StatusCode::CREATED, Json(user)).into_response(),
        Ok(None) => {
            MarketplaceError::Conflict("Email already registered".to_string()).into_response()
        }
        Err(err) => MarketplaceError::Store(err).into_response(),
    }
}

async fn login(State(state): State<ServerState>, Json(body): Json<LoginBody>) -> Response {
    debug!("login() called for {}", body.email);
    let email = body.email.trim().to_lowercase();
    let user = match state.user_store.get_user_by_email(&email) {
        Ok(Some(user)) => user,
        Ok(None) => return StatusCode::UNAUTHORIZED.into_response(),
        Err(err) => return MarketplaceError::Store(err).into_response(),
    };
    let credentials = match state.user_store.get_credentials(user.id) {
        Ok(Some(credentials)) => credentials,
        Ok(None) => return StatusCode::UNAUTHORIZED.into_response(),
        Err(err) => return MarketplaceError::Store(err).into_response(),
    };
    match credentials.verify(&body.password) {
        Ok(true) => {}
        Ok(false) => return StatusCode::UNAUTHORIZED.into_response(),
        Err(err) => return MarketplaceError::Store(err).into_response(),
    }

    match state.token_service.issue(user.id, user.role) {
        Ok(token) => {
            let response_body = LoginSuccessResponse {
                token: token.clone(),
                role: user.role,
            };
            let response_body = serde_json::to_string(&response_body).unwrap();

            let cookie_value = HeaderValue::from_str(&format!(
                "session_token={}; Path=/; HttpOnly",
                token
            ))
            .unwrap();
            response::Builder::new()
                .status(StatusCode::OK)
                .header(axum::http::header::SET_COOKIE, cookie_value)
                .header(axum::http::header::CONTENT_TYPE, "application/json")
                .body(Body::from(response_body))
                .unwrap()
        }
        Err(err) => {
            error!("Error signing session token: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[derive(Deserialize, Debug)]
struct ShiftBody {
    pub title: String,
    pub description: Option<String>,
    pub pay_rate: f64,
    pub lat: f64,
    pub lng: f64,
}

fn validate_shift_body(body: &ShiftBody) -> Result<(), MarketplaceError> {
    let title = body.title.trim();
    if title.is_empty() || title.chars().count() > MAX_TITLE_LENGTH {
        return Err(validation(format!(
            "Title must be between 1 and {} characters",
            MAX_TITLE_LENGTH
        )));
    }
    if let Some(description) = &body.description {
        if description.chars().count() > MAX_DESCRIPTION_LENGTH {
            return Err(validation(format!(
                "Description must be at most {} characters",
                MAX_DESCRIPTION_LENGTH
            )));
        }
    }
    if body.pay_rate <= 0.0 {
        return Err(validation("Pay rate must be positive"));
    }
    validate_coordinates(body.lat, body.lng)
}

fn validate_coordinates(lat: f64, lng: f64) -> Result<(), MarketplaceError> {
    if !(-90.0..=90.0).contains(&lat) {
        return Err(validation("Latitude must be between -90 and 90"));
    }
    if !(-180.0..=180.0).contains(&lng) {
        return Err(validation("Longitude must be between -180 and 180"));
    }
    Ok(())
}

/// Missing or non-positive radius falls back to the default; oversized
/// requests are clamped rather than rejected.
fn effective_radius(rad: Option<f64>) -> f64 {
    match rad {
        Some(rad) if rad > 0.0 => rad.min(MAX_SEARCH_RADIUS_KM),
        _ => DEFAULT_SEARCH_RADIUS_KM,
    }
}

async fn create_shift(
    session: Session,
    State(shift_manager): State<GuardedShiftManager>,
    Json(body): Json<ShiftBody>,
) -> Response {
    if let Err(err) = validate_shift_body(&body) {
        return err.into_response();
    }
    let draft = ShiftDraft {
        owner_id: session.user_id,
        title: body.title.trim().to_string(),
        description: body.description,
        pay_rate: body.pay_rate,
        lat: body.lat,
        lng: body.lng,
    };
    match shift_manager.create_shift(&session.caller(), draft) {
        Ok(shift) => (StatusCode::CREATED, Json(shift)).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn update_shift(
    session: Session,
    State(shift_manager): State<GuardedShiftManager>,
    Path(id): Path<i64>,
    Json(body): Json<ShiftBody>,
) -> Response {
    if let Err(err) = validate_shift_body(&body) {
        return err.into_response();
    }
    let changes = ShiftChanges {
        title: body.title.trim().to_string(),
        description: body.description,
        pay_rate: body.pay_rate,
        lat: body.lat,
        lng: body.lng,
    };
    match shift_manager.update_shift(&session.caller(), id, changes) {
        Ok(shift) => Json(shift).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn delete_shift(
    session: Session,
    State(shift_manager): State<GuardedShiftManager>,
    Path(id): Path<i64>,
) -> Response {
    match shift_manager.delete_shift(&session.caller(), id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => err.into_response(),
    }
}

#[derive(Deserialize, Debug)]
struct NearbyQuery {
    pub lat: f64,
    pub lng: f64,
    pub rad: Option<f64>,
}

async fn nearby_shifts(
    session: Session,
    State(shift_manager): State<GuardedShiftManager>,
    Query(query): Query<NearbyQuery>,
) -> Response {
    if let Err(err) = validate_coordinates(query.lat, query.lng) {
        return err.into_response();
    }
    let radius_km = effective_radius(query.rad);
    match shift_manager.nearby_shifts(&session.caller(), query.lat, query.lng, radius_km) {
        Ok(shifts) => Json(shifts).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn my_shifts(
    session: Session,
    State(shift_manager): State<GuardedShiftManager>,
) -> Response {
    match shift_manager.shifts_by_owner(&session.caller()) {
        Ok(shifts) => Json(shifts).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn shift_applications(
    session: Session,
    State(application_manager): State<GuardedApplicationManager>,
    Path(id): Path<i64>,
) -> Response {
    match application_manager.applicants_for_shift(&session.caller(), id) {
        Ok(applicants) => Json(applicants).into_response(),
        Err(err) => err.into_response(),
    }
}

#[derive(Deserialize, Debug)]
struct ApplyBody {
    pub shift_id: i64,
}

async fn apply(
    session: Session,
    State(application_manager): State<GuardedApplicationManager>,
    Json(body): Json<ApplyBody>,
) -> Response {
    match application_manager.apply(&session.caller(), body.shift_id) {
        Ok(application) => (StatusCode::CREATED, Json(application)).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn my_applications(
    session: Session,
    State(application_manager): State<GuardedApplicationManager>,
) -> Response {
    match application_manager.applications_for_worker(&session.caller()) {
        Ok(applications) => Json(applications).into_response(),
        Err(err) => err.into_response(),
    }
}

#[derive(Deserialize, Debug)]
struct DecideBody {
    pub status: String,
}

async fn decide_application(
    session: Session,
    State(application_manager): State<GuardedApplicationManager>,
    Path(id): Path<i64>,
    Json(body): Json<DecideBody>,
) -> Response {
    let status = match ApplicationStatus::from_str(&body.status) {
        Some(status) => status,
        None => {
            return validation("Status must be ACCEPTED or REJECTED").into_response();
        }
    };
    match application_manager.decide(&session.caller(), id, status) {
        Ok(()) => StatusCode::OK.into_response(),
        Err(err) => err.into_response(),
    }
}

async fn withdraw_application(
    session: Session,
    State(application_manager): State<GuardedApplicationManager>,
    Path(id): Path<i64>,
) -> Response {
    match application_manager.withdraw(&session.caller(), id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => err.into_response(),
    }
}

impl ServerState {
    fn new(
        config: ServerConfig,
        shift_manager: Arc<ShiftManager>,
        application_manager: Arc<ApplicationManager>,
        user_store: Arc<dyn UserStore>,
        token_service: Arc<TokenService>,
        event_hub: Arc<EventHub>,
    ) -> ServerState {
        ServerState {
            config,
            start_time: Instant::now(),
            shift_manager,
            application_manager,
            user_store,
            token_service,
            event_hub,
            hash: env!("GIT_HASH").to_owned(),
        }
    }
}

pub fn make_app(
    config: ServerConfig,
    shift_store: Arc<dyn ShiftStore>,
    user_store: Arc<dyn UserStore>,
    geo_index: Arc<dyn GeoIndex>,
    token_service: Arc<TokenService>,
) -> Result<Router> {
    let event_hub = Arc::new(EventHub::new());
    let shift_manager = Arc::new(ShiftManager::new(
        shift_store.clone(),
        geo_index.clone(),
        event_hub.clone(),
    ));
    let application_manager = Arc::new(ApplicationManager::new(
        shift_store,
        user_store.clone(),
        geo_index,
        event_hub.clone(),
    ));
    let state = ServerState::new(
        config.clone(),
        shift_manager,
        application_manager,
        user_store,
        token_service,
        event_hub,
    );

    let auth_routes: Router = Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .with_state(state.clone());

    let shift_routes: Router = Router::new()
        .route("/", post(create_shift))
        .route("/nearby", get(nearby_shifts))
        .route("/mine", get(my_shifts))
        .route("/{id}", put(update_shift))
        .route("/{id}", delete(delete_shift))
        .route("/{id}/applications", get(shift_applications))
        .with_state(state.clone());

    let application_routes: Router = Router::new()
        .route("/", post(apply))
        .route("/mine", get(my_applications))
        .route("/{id}/status", put(decide_application))
        .route("/{id}", delete(withdraw_application))
        .with_state(state.clone());

    let home_router: Router = match &config.frontend_dir_path {
        Some(frontend_path) => {
            let static_files_service =
                ServeDir::new(frontend_path).append_index_html_on_directories(true);
            Router::new().fallback_service(static_files_service)
        }
        None => Router::new()
            .route("/", get(home))
            .with_state(state.clone()),
    };

    let mut app: Router = home_router
        .route("/ws", get(ws_handler).with_state(state.clone()))
        .nest("/v1/auth", auth_routes)
        .nest("/v1/shifts", shift_routes)
        .nest("/v1/applications", application_routes);

    app = app.layer(middleware::from_fn_with_state(state.clone(), log_requests));

    Ok(app)
}

pub async fn run_server(
    shift_store: Arc<dyn ShiftStore>,
    user_store: Arc<dyn UserStore>,
    geo_index: Arc<dyn GeoIndex>,
    token_service: Arc<TokenService>,
    requests_logging_level: RequestsLoggingLevel,
    port: u16,
    frontend_dir_path: Option<String>,
) -> Result<()> {
    let config = ServerConfig {
        port,
        requests_logging_level,
        frontend_dir_path,
    };
    let app = make_app(config, shift_store, user_store, geo_index, token_service)?;

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    Ok(axum::serve(listener, app).await?)
}
