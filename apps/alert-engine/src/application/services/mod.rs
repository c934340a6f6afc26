//! Application Services
//!
//! The alert pipeline proper: evaluation, dispatch, and the polling loop
//! that drives them.

pub mod dispatcher;
pub mod evaluator;
pub mod scheduler;

pub use dispatcher::NotificationDispatcher;
pub use evaluator::{AlertEvaluator, CycleOutcome};
pub use scheduler::{PollingScheduler, SchedulerStats};
