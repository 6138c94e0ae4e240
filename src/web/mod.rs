//! Web server module
//!
//! Serves the search container as a small JSON API for storefront front ends.

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
