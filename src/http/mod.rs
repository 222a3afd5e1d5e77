//! HTTP server layer: REST endpoints over the service and repository layers.

pub mod dto;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod router;
pub mod state;

pub use error::{ApiError, AppError};
pub use extract::AuthUser;
pub use router::create_router;
pub use state::AppState;
