pub mod error;
pub mod executor;
pub mod orchestrator;
pub mod status;

pub use error::*;
pub use executor::RemoteExecutor;
pub use orchestrator::DeploymentOrchestrator;
pub use status::{status_line, MemoryReporter, StatusReporter, TracingReporter};
