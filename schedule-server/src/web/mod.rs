//! HTTP surface.
//!
//! Schedule lookups go through the resolver; `/refresh` starts a background
//! load of the full feed.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::AppState;
