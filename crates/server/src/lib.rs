//! REST/SSE boundary over the simulation controller.
//!
//! The engine core is self-contained; this crate only translates HTTP
//! requests into controller calls and controller state into JSON.

mod app;
mod error;
mod routes;
mod state;

pub use app::{create_app, ServerConfig};
pub use error::{AppError, AppResult};
pub use state::ServerState;
