//! Use cases - User story orchestration.
//!
//! Each module contains use cases for a specific domain area. Use cases
//! orchestrate across the link store and the document store; neither store
//! knows about the other.

pub mod economy;
pub mod error;
pub mod farm;
pub mod lifecycle;
pub mod maps;
pub mod status;
pub mod tiles;

#[cfg(test)]
mod scenario_tests;

pub use economy::EconomyUseCases;
pub use error::{ErrorKind, InconsistencyReport};
pub use farm::FarmActions;
pub use lifecycle::LifecycleUseCases;
pub use maps::MapOps;
pub use status::StatusOps;
pub use tiles::MapTileEngine;
