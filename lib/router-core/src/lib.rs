//! Reconciliation core for the Router operator
//!
//! This library provides:
//! - Defaulting of Router specifications and certificate-request detection
//! - Compilation of a RouterSpec into the router configuration document
//! - Synthesis of the managed Deployment and Service
//! - The convergence engine driving observed state toward desired state

pub mod config;
pub mod converge;
pub mod defaults;
pub mod error;
pub mod resources;
pub mod store;

pub use config::router_config;
pub use converge::{handle_notification, reconcile_router, Notification};
pub use defaults::apply_router_defaults;
pub use error::{CoreError, Result};
pub use store::{CreateOutcome, Store, StoreError};
