use crate::utils::error::{OrchestratorError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// 整合的優先層級，決定在 CI 中被測試的頻率
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Critical,
    Important,
    Secondary,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Critical, Priority::Important, Priority::Secondary];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Critical => "critical",
            Priority::Important => "important",
            Priority::Secondary => "secondary",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = OrchestratorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "critical" => Ok(Priority::Critical),
            "important" => Ok(Priority::Important),
            "secondary" => Ok(Priority::Secondary),
            other => Err(OrchestratorError::InvalidConfigValueError {
                field: "priority".to_string(),
                value: other.to_string(),
                reason: "Expected one of: critical, important, secondary".to_string(),
            }),
        }
    }
}

/// 觸發測試的時機
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestTrigger {
    EveryCommit,
    SchemaChange,
    Nightly,
    Weekly,
    Rotating,
}

impl TestTrigger {
    pub const ALL: [TestTrigger; 5] = [
        TestTrigger::EveryCommit,
        TestTrigger::SchemaChange,
        TestTrigger::Nightly,
        TestTrigger::Weekly,
        TestTrigger::Rotating,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TestTrigger::EveryCommit => "every_commit",
            TestTrigger::SchemaChange => "schema_change",
            TestTrigger::Nightly => "nightly",
            TestTrigger::Weekly => "weekly",
            TestTrigger::Rotating => "rotating",
        }
    }

    /// 人類可讀的測試範圍描述
    pub fn scope(&self) -> &'static str {
        match self {
            TestTrigger::EveryCommit => "Critical only",
            TestTrigger::SchemaChange => "Critical + Important",
            TestTrigger::Nightly => "Critical + Important",
            TestTrigger::Weekly => "All Secondary",
            TestTrigger::Rotating => "Secondary (rotating window)",
        }
    }
}

impl fmt::Display for TestTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TestTrigger {
    type Err = OrchestratorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "every_commit" | "commit" => Ok(TestTrigger::EveryCommit),
            "schema_change" | "schema" => Ok(TestTrigger::SchemaChange),
            "nightly" => Ok(TestTrigger::Nightly),
            "weekly" => Ok(TestTrigger::Weekly),
            "rotating" => Ok(TestTrigger::Rotating),
            other => Err(OrchestratorError::InvalidConfigValueError {
                field: "trigger".to_string(),
                value: other.to_string(),
                reason: "Expected one of: every_commit, schema_change, nightly, weekly, rotating"
                    .to_string(),
            }),
        }
    }
}

fn default_test_suite() -> String {
    "default".to_string()
}

fn default_test_data_count() -> usize {
    100
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Integration {
    pub name: String,
    pub connector_type: String,
    pub priority: Priority,
    pub base_url: String,
    pub endpoints: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mock_service: Option<String>,
    #[serde(default = "default_test_suite")]
    pub test_suite: String,
    #[serde(default = "default_test_data_count")]
    pub test_data_count: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
}

impl Integration {
    pub fn new(
        name: impl Into<String>,
        connector_type: impl Into<String>,
        priority: Priority,
        base_url: impl Into<String>,
        endpoints: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            connector_type: connector_type.into(),
            priority,
            base_url: base_url.into(),
            endpoints,
            mock_service: None,
            test_suite: default_test_suite(),
            test_data_count: default_test_data_count(),
            dependencies: Vec::new(),
        }
    }

    pub fn with_mock_service(mut self, mock_service: impl Into<String>) -> Self {
        self.mock_service = Some(mock_service.into());
        self
    }

    pub fn with_test_data_count(mut self, count: usize) -> Self {
        self.test_data_count = count;
        self
    }

    /// 組合完整的端點 URL，避免重複的斜線
    pub fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), endpoint)
    }
}

/// 探測單一整合後得到的錯誤與警告
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProbeOutcome {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ProbeOutcome {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub integration_name: String,
    pub test_suite: String,
    pub connector_type: String,
    pub priority: Priority,
    pub passed: bool,
    /// 秒
    pub duration: f64,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl TestResult {
    pub fn from_outcome(integration: &Integration, outcome: ProbeOutcome, duration: f64) -> Self {
        Self {
            integration_name: integration.name.clone(),
            test_suite: integration.test_suite.clone(),
            connector_type: integration.connector_type.clone(),
            priority: integration.priority,
            passed: outcome.is_success(),
            duration,
            errors: outcome.errors,
            warnings: outcome.warnings,
            timestamp: Utc::now(),
        }
    }

    /// 未能執行的測試，一律記為失敗且耗時為零
    pub fn failed(integration: &Integration, error: impl Into<String>) -> Self {
        Self::from_outcome(
            integration,
            ProbeOutcome {
                errors: vec![error.into()],
                warnings: Vec::new(),
            },
            0.0,
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriorityStats {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub success_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub trigger: TestTrigger,
    pub total_tests: usize,
    pub passed: usize,
    pub failed: usize,
    pub success_rate: f64,
    /// 整體牆鐘時間（秒）
    pub total_duration: f64,
    pub avg_test_duration: f64,
    pub priority_stats: BTreeMap<Priority, PriorityStats>,
    pub timestamp: DateTime<Utc>,
    pub results: Vec<TestResult>,
}

/// 分層指令執行器中的一條指令
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub command: String,
    pub component: String,
    pub tier: String,
}

impl CommandSpec {
    pub fn new(
        command: impl Into<String>,
        component: impl Into<String>,
        tier: impl Into<String>,
    ) -> Self {
        Self {
            command: command.into(),
            component: component.into(),
            tier: tier.into(),
        }
    }

    pub fn key(&self) -> String {
        format!("{}_{}", self.component, self.tier)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandResult {
    pub component: String,
    pub tier: String,
    pub duration: f64,
    pub return_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
}
