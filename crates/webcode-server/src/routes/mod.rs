//! HTTP routes under `/api`.

pub mod migration;
pub mod owner;
pub mod project;
pub mod response;
pub mod session;
pub mod setting;
pub mod system;
pub mod template;

use axum::Router;
use axum::routing::get;

use crate::app::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(session::routes())
        .merge(setting::routes())
        .merge(template::routes())
        .merge(migration::routes())
        .merge(project::routes())
        .merge(system::routes())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
