pub mod client;
pub mod error;
pub mod worker;

pub use client::{Coordinator, HttpCoordinator};
pub use error::{TransportError, WorkerError};
pub use worker::{RunSummary, TaskOutcome, Worker};
