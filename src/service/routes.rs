//! Axum routes for the channel ranking service.
//!
//! Chat-bot command routes answer in plain text so the bot can relay the
//! reply verbatim. Overlay and query routes answer in JSON.

use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::policy::GrowthCommand;
use crate::ranking::DEFAULT_RANKING_LIMIT;
use crate::registry::RegistryError;
use crate::types::{Channel, ChannelId};

use super::state::ServiceState;

/// Type alias for the shared handler state.
pub type AppState = Arc<ServiceState>;

/// Reply for commands naming a channel that was never registered.
pub const NOT_REGISTERED_REPLY: &str = "Use !wall to add it to your system";

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters identifying the calling chat user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserQuery {
    /// Chat user id.
    pub user_id: Option<String>,
    /// Chat display name.
    pub user_name: Option<String>,
}

/// Query parameters for name search.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Substring to look for.
    pub query: Option<String>,
}

/// Service health response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `healthy`, or `degraded` while snapshot saves are failing.
    pub status: String,
    pub version: String,
    pub channel_count: usize,
    /// xxHash64 of the in-memory registry.
    pub registry_fingerprint: String,
    pub ticks_completed: u64,
    pub tick_interval_ms: u64,
    pub uptime_secs: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_tick_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_saved_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_save_error: Option<String>,
}

/// Simple liveness response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LivenessResponse {
    pub status: String,
}

/// Structured JSON error body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
    /// Machine-readable error code.
    pub code: String,
}

impl ErrorResponse {
    /// Create a new error response with code and message.
    pub fn new(code: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Errors surfaced by the HTTP layer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// A required parameter was absent or empty.
    #[error("{0} is required")]
    MissingInput(&'static str),
    /// The registry rejected the operation.
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl ApiError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingInput(_) => StatusCode::BAD_REQUEST,
            Self::Registry(RegistryError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Registry(RegistryError::AlreadyExists(_)) => StatusCode::CONFLICT,
            Self::Registry(RegistryError::InsufficientData { .. }) => StatusCode::BAD_REQUEST,
        }
    }

    /// Machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingInput(_) => "MISSING_INPUT",
            Self::Registry(RegistryError::NotFound(_)) => "NOT_FOUND",
            Self::Registry(RegistryError::AlreadyExists(_)) => "ALREADY_EXISTS",
            Self::Registry(RegistryError::InsufficientData { .. }) => "INSUFFICIENT_DATA",
        }
    }

    fn log(&self) {
        tracing::warn!(code = self.code(), error = %self, "Request error");
    }
}

/// JSON rendering, used by query routes.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.log();
        let message = match &self {
            Self::MissingInput("query") => "Query parameter is required.".to_string(),
            Self::Registry(RegistryError::NotFound(_)) => "Channel not found.".to_string(),
            Self::Registry(RegistryError::InsufficientData { .. }) => {
                "Not enough channels for a battle.".to_string()
            }
            other => other.to_string(),
        };
        (self.status(), Json(ErrorResponse::new(self.code(), message))).into_response()
    }
}

/// Plain-text error for chat command routes.
#[derive(Debug)]
pub struct CommandError(ApiError, String);

impl CommandError {
    fn new(error: impl Into<ApiError>, reply: impl Into<String>) -> Self {
        Self(error.into(), reply.into())
    }
}

impl IntoResponse for CommandError {
    fn into_response(self) -> Response {
        self.0.log();
        (self.0.status(), self.1).into_response()
    }
}

fn required<'a>(value: &'a Option<String>, field: &'static str) -> Result<&'a str, ApiError> {
    value
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or(ApiError::MissingInput(field))
}

fn command_error(e: RegistryError) -> CommandError {
    if matches!(e, RegistryError::NotFound(_)) {
        CommandError::new(e, NOT_REGISTERED_REPLY)
    } else {
        let reply = e.to_string();
        CommandError::new(e, reply)
    }
}

// ============================================================================
// Command Handlers (plain text)
// ============================================================================

/// `!register`: add the caller's channel to the ranking.
async fn add_handler(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> Result<String, CommandError> {
    let (user_id, user_name) = match (required(&query.user_id, "user_id"), required(&query.user_name, "user_name")) {
        (Ok(id), Ok(name)) => (id, name),
        (Err(e), _) | (_, Err(e)) => {
            return Err(CommandError::new(e, "user_id and user_name are required"));
        }
    };

    match state.registry.register(ChannelId::from(user_id), user_name).await {
        Ok(channel) => Ok(format!("{} has been added to the ranking!", channel.name)),
        Err(e @ RegistryError::AlreadyExists(_)) => {
            Err(CommandError::new(e, format!("{user_name} is already registered.")))
        }
        Err(e) => Err(command_error(e)),
    }
}

/// `!video`, `!short`, `!viral`, `!trend`: add a random amount of growth.
async fn growth_handler(
    command: GrowthCommand,
    state: AppState,
    query: UserQuery,
) -> Result<String, CommandError> {
    let user_id = required(&query.user_id, "user_id")
        .map_err(|e| CommandError::new(e, "user_id is required"))?;

    // Drawn before the await: ThreadRng is not Send.
    let amount = command.roll(&mut rand::thread_rng());

    state
        .registry
        .add_growth(&ChannelId::from(user_id), amount)
        .await
        .map_err(command_error)?;

    tracing::info!(channel_id = user_id, command = %command, amount, "Growth command applied");
    Ok(command.reply().to_string())
}

/// `!growth-check`: report the caller's pending growth.
async fn growth_check_handler(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> Result<String, CommandError> {
    let user_id = required(&query.user_id, "user_id")
        .map_err(|e| CommandError::new(e, "user_id is required"))?;

    let channel = state
        .registry
        .get(&ChannelId::from(user_id))
        .await
        .map_err(command_error)?;

    Ok(format!("{}'s current Growth is {}.", channel.name, channel.formatted_growth()))
}

/// Remove every channel. Development use only.
async fn clear_handler(State(state): State<AppState>) -> String {
    state.registry.clear().await;
    "All channels have been cleared.".to_string()
}

// ============================================================================
// Query Handlers (JSON)
// ============================================================================

/// Ranking by subscribers.
async fn channels_handler(State(state): State<AppState>) -> Json<Vec<Channel>> {
    Json(state.registry.top_by_subscribers(DEFAULT_RANKING_LIMIT).await)
}

/// Ranking by pending growth.
async fn faster_growth_handler(State(state): State<AppState>) -> Json<Vec<Channel>> {
    Json(state.registry.top_by_growth(DEFAULT_RANKING_LIMIT).await)
}

/// Every channel.
async fn all_channels_handler(State(state): State<AppState>) -> Json<Vec<Channel>> {
    Json(state.registry.all().await)
}

/// One channel by id.
async fn channel_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Channel>, ApiError> {
    Ok(Json(state.registry.get(&ChannelId::from(user_id)).await?))
}

/// Case-insensitive name search.
async fn search_handler(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Channel>>, ApiError> {
    let needle = required(&query.query, "query")?;
    Ok(Json(state.registry.search_by_name(needle).await))
}

/// The two channels closest in subscribers.
async fn battle_handler(State(state): State<AppState>) -> Result<Json<Vec<Channel>>, ApiError> {
    let (a, b) = state.registry.nearest_pair().await?;
    Ok(Json(vec![a, b]))
}

// ============================================================================
// Health
// ============================================================================

/// Health check endpoint (detailed).
///
/// Reports `degraded` while the most recent snapshot save has failed.
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let stats = state.registry.stats().await;
    let registry_fingerprint = state
        .registry
        .fingerprint()
        .await
        .unwrap_or_else(|e| format!("unavailable: {e}"));

    Json(HealthResponse {
        status: if stats.last_save_error.is_none() { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        channel_count: stats.channel_count,
        registry_fingerprint,
        ticks_completed: stats.ticks_completed,
        tick_interval_ms: state.registry.policy().tick_interval.as_millis() as u64,
        uptime_secs: state.uptime_secs(),
        last_tick_at: stats.last_tick_at.map(|t| t.to_rfc3339()),
        last_saved_at: stats.last_saved_at.map(|t| t.to_rfc3339()),
        last_save_error: stats.last_save_error,
    })
}

/// Liveness check endpoint.
async fn liveness_handler() -> Json<LivenessResponse> {
    Json(LivenessResponse {
        status: "alive".to_string(),
    })
}

// ============================================================================
// Router Construction
// ============================================================================

/// Create the Axum router for the channel ranking service.
pub fn create_router(state: ServiceState) -> Router {
    let state = Arc::new(state);

    let mut router = Router::new()
        // Chat commands
        .route("/add", get(add_handler))
        .route("/growth-check", get(growth_check_handler))
        .route("/clear", get(clear_handler))
        // Rankings and lookups
        .route("/channels", get(channels_handler))
        .route("/channels/all", get(all_channels_handler))
        .route("/growth/faster", get(faster_growth_handler))
        .route("/channel/:user_id", get(channel_handler))
        .route("/search", get(search_handler))
        .route("/battle/auto", get(battle_handler))
        // Health checks
        .route("/health", get(health_handler))
        .route("/health/live", get(liveness_handler));

    for command in GrowthCommand::ALL {
        router = router.route(
            &format!("/{command}"),
            get(move |State(state): State<AppState>, Query(query): Query<UserQuery>| {
                growth_handler(command, state, query)
            }),
        );
    }

    router.with_state(state)
}
