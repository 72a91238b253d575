pub mod config;
pub mod error;
pub mod reporter;
pub mod scheduler;

pub use config::EngineConfig;
pub use error::EngineError;
pub use reporter::{ErrorReporter, TracingReporter};
pub use scheduler::{CreateTimer, Scheduler};
