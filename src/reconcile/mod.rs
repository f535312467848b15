//! Directory registration reconciliation.
//!
//! Each room owns one [`ReconciliationEngine`], which compares the local
//! room with the directory's record, writes the record when they differ and
//! hands unavailable-directory cases to a single-flight [`RetryScheduler`].

pub mod compare;
pub mod engine;
pub mod retry;

pub use compare::{Comparison, Mismatch, compare};
pub use engine::{ReconciliationEngine, RegistrationStatus};
pub use retry::{RetryAttempt, RetryScheduler};
