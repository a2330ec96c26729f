// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod artifact;
pub mod config;
pub mod error;
pub mod ledger;
pub mod notify;
pub mod orchestrator;
pub mod run;
pub mod signing;
pub mod sources;
pub mod store;
pub mod telemetry;
pub mod transport;
pub mod types;

// ---- Re-exports for stable public API ----
pub use crate::config::RelayConfig;
pub use crate::error::{RelayError, Result};
pub use crate::notify::{AlertNotifier, Messenger, NotificationDispatcher};
pub use crate::orchestrator::{FetchOrchestrator, VariantPolicy};
pub use crate::run::{RunCoordinator, RunReport, RunState};
pub use crate::types::{DeliveryOutcome, FetchAttemptRecord, ListVariant, Offer, SourceTier};
