//! Farmstead Engine library.
//!
//! Persistence and real-time session layer for the farming game.
//!
//! ## Structure
//!
//! - `use_cases/` - Lifecycle sagas, tile batches and resource reconciliation
//! - `infrastructure/` - Store implementations (sqlite link store, MongoDB documents)
//! - `api/` - HTTP and WebSocket entry points, session state machine
//! - `app` - Application composition

pub mod api;
pub mod app;
pub mod infrastructure;
pub mod use_cases;

/// Shared test fixtures: in-memory stores and seeded records.
#[cfg(test)]
pub mod test_fixtures;

pub use app::App;
