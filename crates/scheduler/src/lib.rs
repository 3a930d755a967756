pub mod api;
pub mod category;
pub mod error;
pub mod metrics;
pub mod model;
pub mod orchestrator;
pub mod ports;
pub mod readiness;
pub mod reader;
pub mod runtime;

#[cfg(test)]
mod testing;

pub use api::{AutoBuyerService, EnginePorts};
pub use category::CategoryRunner;
pub use error::SchedulerError;
pub use model::{
    BulkReport, CategoryReport, CycleReport, CycleState, EngineConfig, Pacing, ReadinessConfig,
    StatusTone,
};
pub use orchestrator::{CycleOrchestrator, CycleRunner};
pub use reader::StateReader;
pub use runtime::Scheduler;
