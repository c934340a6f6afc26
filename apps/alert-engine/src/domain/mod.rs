//! Domain layer - Core alert and portfolio types with no external dependencies.

pub mod alert;
pub mod holding;
pub mod quote;
pub mod symbol;
