pub mod cli;
pub mod registry_config;
pub mod suite_config;

#[cfg(feature = "cli")]
use crate::domain::model::TestTrigger;
use crate::utils::error::{OrchestratorError, Result};
#[cfg(feature = "cli")]
use crate::utils::validation::{validate_path, validate_positive_number, validate_range, Validate};
#[cfg(feature = "cli")]
use clap::Parser;
use regex::Regex;
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};

pub const SUPPORTED_OUTPUT_FORMATS: [&str; 2] = ["json", "csv"];

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "tier-orchestrator")]
#[command(about = "Priority-tiered integration test orchestrator")]
pub struct CliConfig {
    /// Path to the integration registry (created with sample data if missing)
    #[arg(long, default_value = "integration_registry.toml")]
    pub registry: String,

    /// Trigger that decides which integrations are tested
    #[arg(long, default_value = "every_commit")]
    pub trigger: TestTrigger,

    /// Run every_commit, nightly, weekly and rotating one after another
    #[arg(long)]
    pub all_triggers: bool,

    /// Override max_parallel_tests from the registry
    #[arg(long)]
    pub max_parallel: Option<usize>,

    /// Weekday used by the rotating trigger (0 = Monday); defaults to today
    #[arg(long)]
    pub weekday: Option<u32>,

    #[arg(long, default_value = "./test-results")]
    pub output_path: String,

    #[arg(long, value_delimiter = ',', default_value = "json")]
    pub output_formats: Vec<String>,

    /// Also pack the reports into a ZIP archive
    #[arg(long)]
    pub bundle: bool,

    /// Check GET {base_url}/health for every selected service before running
    #[arg(long)]
    pub preflight: bool,

    /// Show the execution plan without probing anything
    #[arg(long)]
    pub dry_run: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,

    #[arg(long, help = "Log process CPU and memory usage during the run")]
    pub monitor: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    pub fn triggers(&self) -> Vec<TestTrigger> {
        if self.all_triggers {
            vec![
                TestTrigger::EveryCommit,
                TestTrigger::Nightly,
                TestTrigger::Weekly,
                TestTrigger::Rotating,
            ]
        } else {
            vec![self.trigger]
        }
    }

    pub fn wants_format(&self, format: &str) -> bool {
        self.output_formats.iter().any(|f| f == format)
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_path("output_path", &self.output_path)?;
        validate_path("registry", &self.registry)?;

        if let Some(max_parallel) = self.max_parallel {
            validate_positive_number("max_parallel", max_parallel, 1)?;
        }
        if let Some(weekday) = self.weekday {
            validate_range("weekday", weekday, 0, 6)?;
        }

        for format in &self.output_formats {
            if !SUPPORTED_OUTPUT_FORMATS.contains(&format.as_str()) {
                return Err(OrchestratorError::InvalidConfigValueError {
                    field: "output_formats".to_string(),
                    value: format.clone(),
                    reason: format!(
                        "Unsupported format. Valid formats: {}",
                        SUPPORTED_OUTPUT_FORMATS.join(", ")
                    ),
                });
            }
        }

        Ok(())
    }
}

/// 替換環境變數 (例如 ${MOCK_HOST})，未設定的變數保持原樣
pub fn substitute_env_vars(content: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| OrchestratorError::ConfigValidationError {
        field: "env_substitution".to_string(),
        message: e.to_string(),
    })?;

    let result = re.replace_all(content, |caps: &regex::Captures| {
        let var_name = &caps[1];
        std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
    });

    Ok(result.to_string())
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliConfig {
        let mut argv = vec!["tier-orchestrator"];
        argv.extend_from_slice(args);
        CliConfig::parse_from(argv)
    }

    #[test]
    fn test_cli_defaults() {
        let config = parse(&[]);
        assert_eq!(config.trigger, TestTrigger::EveryCommit);
        assert_eq!(config.triggers(), vec![TestTrigger::EveryCommit]);
        assert!(config.wants_format("json"));
        assert!(!config.wants_format("csv"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_cli_all_triggers_and_formats() {
        let config = parse(&["--all-triggers", "--output-formats", "json,csv"]);
        assert_eq!(config.triggers().len(), 4);
        assert!(config.wants_format("csv"));
    }

    #[test]
    fn test_cli_validation() {
        assert!(parse(&["--weekday", "7"]).validate().is_err());
        assert!(parse(&["--max-parallel", "0"]).validate().is_err());
        assert!(parse(&["--output-formats", "xml"]).validate().is_err());
    }

    #[test]
    fn test_unknown_env_var_is_left_verbatim() {
        let out = substitute_env_vars("url = \"${TIER_TEST_SURELY_UNSET_VAR}\"").unwrap();
        assert_eq!(out, "url = \"${TIER_TEST_SURELY_UNSET_VAR}\"");
    }
}
