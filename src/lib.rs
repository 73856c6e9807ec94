pub mod config;
pub mod core;
pub mod domain;
pub mod fixtures;
pub mod utils;

pub use config::cli::LocalStorage;
#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use config::registry_config::RegistryConfig;
pub use config::suite_config::{SuiteConfig, TierSelection};
pub use core::{
    orchestrator::PriorityOrchestrator,
    probe::HttpProbe,
    report::ReportWriter,
    tiered::{ShellExecutor, TieredRunner},
};
pub use domain::model::{Integration, Priority, RunSummary, TestResult, TestTrigger};
pub use utils::error::{OrchestratorError, Result};
