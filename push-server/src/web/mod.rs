//! HTTP surface: message ingest and operational endpoints.

mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
