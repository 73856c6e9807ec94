pub mod orchestrator;
pub mod probe;
pub mod report;
pub mod selection;
pub mod shared_mock;
pub mod tiered;

pub use crate::domain::model::{
    CommandResult, CommandSpec, Integration, Priority, PriorityStats, ProbeOutcome, RunSummary,
    TestResult, TestTrigger,
};
pub use crate::domain::ports::{CommandExecutor, ConfigProvider, IntegrationProbe, Storage};
pub use crate::utils::error::Result;
