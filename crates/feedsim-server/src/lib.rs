//! HTTP front end for the contest event feed simulator.
//!
//! This crate exposes a [`feedsim_engine`] replay over Axum:
//!
//! - **Event feed** (`/event-feed`, NDJSON) and its **`WebSocket`**
//!   variant (`/ws/event-feed`). Every connection replays the released
//!   prefix from the start and then follows the operator.
//! - **Control endpoints** (`/api/control/*`) that advance the shared
//!   release cursor one record at a time or skip to the next submission
//!   or accepted judgement.
//! - **Operator page** (`GET /`) with progress and control buttons.

pub mod config;
pub mod error;
pub mod feed;
pub mod handlers;
pub mod operator;
pub mod router;
pub mod server;
pub mod state;
pub mod ws;

// Re-export primary types for convenience.
pub use config::FeedsimConfig;
pub use router::build_router;
pub use server::{start_server, ServerConfig, ServerError};
pub use state::{AppState, FeedStatus};
