use crate::config::substitute_env_vars;
use crate::core::ConfigProvider;
use crate::domain::model::{Integration, Priority};
use crate::utils::error::{OrchestratorError, Result};
use crate::utils::validation::{
    validate_endpoint, validate_non_empty_string, validate_positive_number, validate_range,
    validate_unique_names, validate_url, Validate,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tokio::sync::Semaphore;

fn default_max_parallel_tests() -> usize {
    20
}

fn default_rotation_size() -> usize {
    20
}

fn default_request_timeout() -> u64 {
    10
}

/// 整合註冊表：所有要測試的整合與執行設定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(default = "default_max_parallel_tests")]
    pub max_parallel_tests: usize,
    #[serde(default = "default_rotation_size")]
    pub rotation_size: usize,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    #[serde(default)]
    pub integrations: Vec<Integration>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_parallel_tests: default_max_parallel_tests(),
            rotation_size: default_rotation_size(),
            request_timeout_seconds: default_request_timeout(),
            integrations: Vec::new(),
        }
    }
}

impl RegistryConfig {
    /// 載入註冊表；檔案不存在時產生範例註冊表並寫回該路徑
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            return Self::from_file(path);
        }

        tracing::warn!(
            "⚠️ Registry file {} not found, creating sample registry",
            path.display()
        );
        let registry = Self::sample();
        registry.save(path)?;
        tracing::info!(
            "✅ Created sample registry with {} integrations",
            registry.integrations.len()
        );
        Ok(registry)
    }

    /// 從 TOML 檔案載入註冊表
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(OrchestratorError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析註冊表
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| OrchestratorError::ConfigValidationError {
            field: "registry_toml_parsing".to_string(),
            message: format!("Registry TOML parsing error: {}", e),
        })
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }

    /// 4 個關鍵、8 個重要、142 個次要整合，共 154 個
    pub fn sample() -> Self {
        let mut integrations = Vec::new();

        let critical = [
            (
                "quickbooks",
                "accounting",
                "http://localhost:5000",
                vec!["/api/customers", "/api/invoices"],
            ),
            (
                "salesforce",
                "crm",
                "http://localhost:5001",
                vec!["/api/accounts", "/api/contacts"],
            ),
            (
                "slack",
                "messaging",
                "http://localhost:8080",
                vec!["/api/chat.postMessage"],
            ),
            ("gmail", "email", "http://localhost:5004", vec!["/api/messages"]),
        ];
        for (name, connector_type, base_url, endpoints) in critical {
            integrations.push(
                Integration::new(
                    name,
                    connector_type,
                    Priority::Critical,
                    base_url,
                    owned(&endpoints),
                )
                .with_test_data_count(200),
            );
        }

        let important = [
            ("hubspot", "crm", "http://localhost:5002", "/api/contacts"),
            ("stripe", "payment", "http://localhost:5003", "/api/charges"),
            ("zendesk", "support", "http://localhost:5005", "/api/tickets"),
            ("asana", "project_management", "http://localhost:5006", "/api/tasks"),
            ("trello", "project_management", "http://localhost:5007", "/api/boards"),
            ("notion", "productivity", "http://localhost:5008", "/api/pages"),
            ("airtable", "database", "http://localhost:5009", "/api/records"),
            ("monday", "project_management", "http://localhost:5010", "/api/items"),
        ];
        for (name, connector_type, base_url, endpoint) in important {
            integrations.push(
                Integration::new(
                    name,
                    connector_type,
                    Priority::Important,
                    base_url,
                    vec![endpoint.to_string()],
                )
                .with_test_data_count(150),
            );
        }

        let connector_types = [
            "crm",
            "accounting",
            "marketing",
            "support",
            "project_management",
            "communication",
            "productivity",
        ];
        for i in 0..142 {
            let connector_type = connector_types[i % connector_types.len()];
            integrations.push(
                Integration::new(
                    format!("integration_{:03}", i + 1),
                    connector_type,
                    Priority::Secondary,
                    format!("http://localhost:{}", 5100 + (i % 100)),
                    vec![format!("/api/{}/data", connector_type)],
                )
                .with_mock_service(format!("shared_{}", connector_type))
                .with_test_data_count(50),
            );
        }

        Self {
            integrations,
            ..Self::default()
        }
    }

    /// 驗證註冊表的合理性
    pub fn validate_config(&self) -> Result<()> {
        // 並行數即 semaphore 的 permit 數
        validate_range(
            "max_parallel_tests",
            self.max_parallel_tests,
            1,
            Semaphore::MAX_PERMITS,
        )?;
        validate_positive_number("rotation_size", self.rotation_size, 1)?;
        validate_positive_number(
            "request_timeout_seconds",
            self.request_timeout_seconds as usize,
            1,
        )?;

        validate_unique_names(
            "integrations",
            self.integrations.iter().map(|i| i.name.as_str()),
        )?;

        for integration in &self.integrations {
            self.validate_integration(integration)?;
        }

        self.validate_dependencies()?;

        Ok(())
    }

    fn validate_integration(&self, integration: &Integration) -> Result<()> {
        validate_non_empty_string("integrations.name", &integration.name)?;
        validate_non_empty_string(
            &format!("integrations.{}.connector_type", integration.name),
            &integration.connector_type,
        )?;
        validate_url(
            &format!("integrations.{}.base_url", integration.name),
            &integration.base_url,
        )?;

        if integration.endpoints.is_empty() {
            return Err(OrchestratorError::ConfigValidationError {
                field: format!("integrations.{}.endpoints", integration.name),
                message: "At least one endpoint is required".to_string(),
            });
        }
        for endpoint in &integration.endpoints {
            validate_endpoint(
                &format!("integrations.{}.endpoints", integration.name),
                endpoint,
            )?;
        }

        for dep in &integration.dependencies {
            if self.get(dep).is_none() {
                return Err(OrchestratorError::ConfigValidationError {
                    field: format!("integrations.{}.dependencies", integration.name),
                    message: format!("Dependency integration '{}' not found", dep),
                });
            }
        }

        Ok(())
    }

    fn validate_dependencies(&self) -> Result<()> {
        // 檢查循環依賴
        let mut visited = HashSet::new();
        let mut rec_stack = HashSet::new();

        for integration in &self.integrations {
            if !visited.contains(integration.name.as_str())
                && self.has_circular_dependency(&integration.name, &mut visited, &mut rec_stack)
            {
                return Err(OrchestratorError::ConfigValidationError {
                    field: "integrations.dependencies".to_string(),
                    message: format!(
                        "Circular dependency detected involving '{}'",
                        integration.name
                    ),
                });
            }
        }

        Ok(())
    }

    fn has_circular_dependency<'a>(
        &'a self,
        name: &'a str,
        visited: &mut HashSet<&'a str>,
        rec_stack: &mut HashSet<&'a str>,
    ) -> bool {
        visited.insert(name);
        rec_stack.insert(name);

        if let Some(integration) = self.get(name) {
            for dep in &integration.dependencies {
                if !visited.contains(dep.as_str()) {
                    if self.has_circular_dependency(dep, visited, rec_stack) {
                        return true;
                    }
                } else if rec_stack.contains(dep.as_str()) {
                    return true;
                }
            }
        }

        rec_stack.remove(name);
        false
    }

    /// 取得指定名稱的整合
    pub fn get(&self, name: &str) -> Option<&Integration> {
        self.integrations.iter().find(|i| i.name == name)
    }

    /// 依優先層級取得整合（保持註冊表順序）
    pub fn by_priority(&self, priority: Priority) -> Vec<&Integration> {
        self.integrations
            .iter()
            .filter(|i| i.priority == priority)
            .collect()
    }

    pub fn total_test_data(&self) -> usize {
        self.integrations.iter().map(|i| i.test_data_count).sum()
    }
}

fn owned(endpoints: &[&str]) -> Vec<String> {
    endpoints.iter().map(|e| e.to_string()).collect()
}

impl ConfigProvider for RegistryConfig {
    fn max_parallel_tests(&self) -> usize {
        self.max_parallel_tests
    }

    fn rotation_size(&self) -> usize {
        self.rotation_size
    }

    fn request_timeout_seconds(&self) -> u64 {
        self.request_timeout_seconds
    }
}

impl Validate for RegistryConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
