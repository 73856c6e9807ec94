use crate::config::substitute_env_vars;
use crate::domain::model::CommandSpec;
use crate::utils::error::{OrchestratorError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_positive_number, validate_unique_names,
    Validate,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

fn default_root() -> String {
    ".".to_string()
}

fn default_command_timeout() -> u64 {
    300
}

fn default_parallel() -> bool {
    true
}

/// 分層測試指令組態
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteConfig {
    /// 各元件目錄所在的根目錄
    #[serde(default = "default_root")]
    pub root: String,
    #[serde(default = "default_command_timeout")]
    pub command_timeout_seconds: u64,
    pub tiers: Vec<TierSuite>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierSuite {
    pub name: String,
    pub title: String,
    #[serde(default = "default_parallel")]
    pub parallel: bool,
    /// 平行執行時的 worker 上限，預設為指令數
    pub max_workers: Option<usize>,
    /// 為 true 時忽略 `--sequential`
    #[serde(default)]
    pub ignore_sequential: bool,
    pub commands: Vec<SuiteCommand>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteCommand {
    pub command: String,
    pub component: String,
    /// 結果的分層標籤，預設為所屬 suite 名稱
    pub tier: Option<String>,
    /// 需要 docker 服務才能執行的整合測試
    #[serde(default)]
    pub requires_services: bool,
}

impl SuiteCommand {
    fn new(command: &str, component: &str, tier: &str) -> Self {
        Self {
            command: command.to_string(),
            component: component.to_string(),
            tier: Some(tier.to_string()),
            requires_services: false,
        }
    }

    fn requiring_services(mut self) -> Self {
        self.requires_services = true;
        self
    }
}

impl TierSuite {
    /// 展開為實際要執行的指令；需要服務的指令在服務不可用時略過
    pub fn command_specs(&self, services_available: bool) -> Vec<CommandSpec> {
        self.commands
            .iter()
            .filter(|c| !c.requires_services || services_available)
            .map(|c| {
                CommandSpec::new(
                    c.command.clone(),
                    c.component.clone(),
                    c.tier.clone().unwrap_or_else(|| self.name.clone()),
                )
            })
            .collect()
    }

    pub fn worker_count(&self, command_count: usize) -> usize {
        if !self.parallel {
            return 1;
        }
        self.max_workers
            .unwrap_or(command_count)
            .min(command_count)
            .max(1)
    }
}

/// 要執行哪些分層
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TierSelection {
    Tier1,
    Tier2,
    Tier3,
    Smoke,
    Regression,
    All,
}

impl TierSelection {
    pub fn suite_names(&self) -> Vec<&'static str> {
        match self {
            TierSelection::Tier1 => vec!["tier1"],
            TierSelection::Tier2 => vec!["tier2"],
            TierSelection::Tier3 => vec!["tier3"],
            TierSelection::Smoke => vec!["smoke"],
            TierSelection::Regression => vec!["regression"],
            TierSelection::All => vec!["tier1", "tier2", "tier3", "smoke", "regression"],
        }
    }
}

impl fmt::Display for TierSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TierSelection::Tier1 => "1",
            TierSelection::Tier2 => "2",
            TierSelection::Tier3 => "3",
            TierSelection::Smoke => "smoke",
            TierSelection::Regression => "regression",
            TierSelection::All => "all",
        };
        f.write_str(s)
    }
}

impl FromStr for TierSelection {
    type Err = OrchestratorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1" | "tier1" => Ok(TierSelection::Tier1),
            "2" | "tier2" => Ok(TierSelection::Tier2),
            "3" | "tier3" => Ok(TierSelection::Tier3),
            "smoke" => Ok(TierSelection::Smoke),
            "regression" => Ok(TierSelection::Regression),
            "all" => Ok(TierSelection::All),
            other => Err(OrchestratorError::InvalidConfigValueError {
                field: "tier".to_string(),
                value: other.to_string(),
                reason: "Expected one of: 1, 2, 3, smoke, regression, all".to_string(),
            }),
        }
    }
}

/// 在 CI 中只有 docker 服務啟動時才跑整合測試
pub fn services_available_from(ci: Option<&str>, docker_services_running: Option<&str>) -> bool {
    ci.is_none() || docker_services_running.is_some()
}

pub fn services_available() -> bool {
    let ci = std::env::var("CI").ok();
    let docker = std::env::var("DOCKER_SERVICES_RUNNING").ok();
    services_available_from(ci.as_deref(), docker.as_deref())
}

impl SuiteConfig {
    pub fn load(path: Option<&str>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::builtin()),
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(OrchestratorError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| OrchestratorError::ConfigValidationError {
            field: "suite_toml_parsing".to_string(),
            message: format!("Suite TOML parsing error: {}", e),
        })
    }

    /// 內建的分層指令，對應各元件的 pytest 標記
    pub fn builtin() -> Self {
        let tier1 = TierSuite {
            name: "tier1".to_string(),
            title: "🔥 TIER 1 CRITICAL TESTS (Every Commit)".to_string(),
            parallel: true,
            max_workers: Some(3),
            ignore_sequential: false,
            commands: vec![
                SuiteCommand::new(
                    "pytest -m 'tier1_critical and standalone' -v",
                    "slack-mock",
                    "tier1",
                ),
                SuiteCommand::new(
                    "pytest -m 'tier1_critical and standalone' -v",
                    "e2e-testing",
                    "tier1",
                ),
                SuiteCommand::new(
                    "pytest -m 'tier1_critical and integration' -v",
                    "slack-mock",
                    "tier1_integration",
                )
                .requiring_services(),
            ],
        };

        let tier2 = TierSuite {
            name: "tier2".to_string(),
            title: "⚡ TIER 2 IMPORTANT TESTS (Schema Changes)".to_string(),
            parallel: true,
            max_workers: Some(2),
            ignore_sequential: false,
            commands: vec![
                SuiteCommand::new(
                    "pytest -m 'tier2_important and standalone' -v",
                    "test-data-seeding",
                    "tier2",
                ),
                SuiteCommand::new(
                    "pytest -m 'tier2_important and integration' -v",
                    "test-data-seeding",
                    "tier2_integration",
                ),
            ],
        };

        let tier3 = TierSuite {
            name: "tier3".to_string(),
            title: "📊 TIER 3 SECONDARY TESTS (Weekly)".to_string(),
            parallel: true,
            max_workers: Some(2),
            ignore_sequential: false,
            commands: vec![
                SuiteCommand::new(
                    "pytest -m 'tier3_secondary and standalone' -v",
                    "monitoring-system",
                    "tier3",
                ),
                SuiteCommand::new(
                    "pytest -m 'tier3_secondary and standalone' -v",
                    "bubble-frontend-mock",
                    "tier3",
                ),
            ],
        };

        let smoke = TierSuite {
            name: "smoke".to_string(),
            title: "💨 SMOKE TESTS (Quick Validation)".to_string(),
            parallel: false,
            max_workers: None,
            ignore_sequential: false,
            commands: ["slack-mock", "test-data-seeding", "e2e-testing"]
                .iter()
                .map(|component| SuiteCommand::new("pytest -m smoke -v", component, "smoke"))
                .collect(),
        };

        let regression = TierSuite {
            name: "regression".to_string(),
            title: "🔄 FULL REGRESSION SUITE".to_string(),
            parallel: true,
            max_workers: Some(5),
            ignore_sequential: true,
            commands: [
                "slack-mock",
                "test-data-seeding",
                "e2e-testing",
                "monitoring-system",
                "bubble-frontend-mock",
            ]
            .iter()
            .map(|component| SuiteCommand::new("pytest -v", component, "regression"))
            .collect(),
        };

        Self {
            root: default_root(),
            command_timeout_seconds: default_command_timeout(),
            tiers: vec![tier1, tier2, tier3, smoke, regression],
        }
    }

    pub fn get_tier(&self, name: &str) -> Option<&TierSuite> {
        self.tiers.iter().find(|t| t.name == name)
    }

    /// 依選擇回傳要執行的 suite，缺少的 suite 視為組態錯誤
    pub fn select(&self, selection: TierSelection) -> Result<Vec<&TierSuite>> {
        selection
            .suite_names()
            .into_iter()
            .map(|name| {
                self.get_tier(name)
                    .ok_or_else(|| OrchestratorError::ConfigValidationError {
                        field: "tiers".to_string(),
                        message: format!("Tier suite '{}' is not defined", name),
                    })
            })
            .collect()
    }
}

impl Validate for SuiteConfig {
    fn validate(&self) -> Result<()> {
        validate_path("root", &self.root)?;
        validate_positive_number(
            "command_timeout_seconds",
            self.command_timeout_seconds as usize,
            1,
        )?;
        if self.tiers.is_empty() {
            return Err(OrchestratorError::MissingConfigError {
                field: "tiers".to_string(),
            });
        }
        validate_unique_names("tiers", self.tiers.iter().map(|t| t.name.as_str()))?;

        for tier in &self.tiers {
            validate_non_empty_string("tiers.name", &tier.name)?;
            if let Some(workers) = tier.max_workers {
                validate_positive_number(&format!("tiers.{}.max_workers", tier.name), workers, 1)?;
            }
            for command in &tier.commands {
                validate_non_empty_string(
                    &format!("tiers.{}.command", tier.name),
                    &command.command,
                )?;
                validate_path(&format!("tiers.{}.component", tier.name), &command.component)?;
            }
        }

        Ok(())
    }
}
