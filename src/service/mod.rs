//! Service layer for the lobby herald
//!
//! This module contains the main application state, service coordination,
//! and health reporting for the production service.

pub mod app;
pub mod health;

pub use app::{AppState, Components, ServiceError};
pub use health::{HealthCheck, HealthView, HealthStatus};
