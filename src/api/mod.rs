//! API module
//!
//! HTTP surface: thin route handlers plus request-correlated logging
//! middleware.

pub mod middleware;
pub mod routes;

pub use routes::create_router;
