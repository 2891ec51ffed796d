pub mod calendar;
pub mod error;
pub mod metrics;
pub mod nav;
pub mod types;

#[cfg(feature = "simulation")]
pub mod simulation;

#[cfg(feature = "rolling")]
pub mod rolling;

pub use error::NavEngineError;
pub use types::*;

/// Standard result type for all NAV engine operations
pub type NavEngineResult<T> = Result<T, NavEngineError>;
