//! HTTP surface of WebCode: state wiring, routes and logging setup.

pub mod app;
pub mod logging;
pub mod routes;

pub use app::{AppState, bootstrap};
pub use routes::router;
