//! HTTP layer: router, handlers and auth middleware

pub mod admin;
pub mod billing;
pub mod error;
pub mod middleware;
pub mod practice;
pub mod routes;

pub use error::AppError;
pub use routes::build_router;
