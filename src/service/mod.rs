//! Channel Ranking REST Service
//!
//! Thin HTTP layer over [`ChannelRegistry`](crate::registry::ChannelRegistry),
//! called by the chat bot and the ranking overlay.
//!
//! ## Endpoints
//!
//! - `GET /add?user_id&user_name` - Register a channel
//! - `GET /video|/short|/viral|/trend?user_id` - Add random growth
//! - `GET /growth-check?user_id` - Report pending growth
//! - `GET /clear` - Remove every channel
//! - `GET /channels` - Top 105 by subscribers
//! - `GET /growth/faster` - Top 105 by growth
//! - `GET /channels/all` - Every channel
//! - `GET /channel/:user_id` - One channel
//! - `GET /search?query` - Name search
//! - `GET /battle/auto` - Closest pair by subscribers
//! - `GET /health` - Detailed service health check
//! - `GET /health/live` - Liveness check

pub mod middleware;
pub mod routes;
pub mod state;

pub use middleware::{access_log_middleware, metrics_middleware, REQUEST_ID_HEADER};
pub use routes::{create_router, ApiError, AppState};
pub use state::ServiceState;
