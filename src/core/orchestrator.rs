use crate::config::registry_config::RegistryConfig;
use crate::core::selection::select;
use crate::core::shared_mock::{SharedMockPool, SHARED_MOCK_BASE_PORT};
use crate::core::{ConfigProvider, IntegrationProbe};
use crate::domain::model::{Integration, Priority, RunSummary, TestResult, TestTrigger};
use crate::utils::monitor::SystemMonitor;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;

pub const MOCK_CONNECTION_REFUSED: &str = "Could not acquire mock service connection";

/// 依優先層級挑選整合並以有限並行度執行測試
pub struct PriorityOrchestrator {
    registry: RegistryConfig,
    probe: Arc<dyn IntegrationProbe>,
    shared_mocks: Arc<SharedMockPool>,
    max_parallel_tests: usize,
    monitor: Option<SystemMonitor>,
}

impl PriorityOrchestrator {
    pub fn new(registry: RegistryConfig, probe: Arc<dyn IntegrationProbe>) -> Self {
        let shared_mocks =
            SharedMockPool::from_integrations(&registry.integrations, SHARED_MOCK_BASE_PORT);
        let max_parallel_tests = clamp_parallelism(registry.max_parallel_tests());
        Self {
            registry,
            probe,
            shared_mocks: Arc::new(shared_mocks),
            max_parallel_tests,
            monitor: None,
        }
    }

    /// 覆蓋註冊表中的 max_parallel_tests，限制在 1 到 `Semaphore::MAX_PERMITS`
    pub fn with_max_parallel(mut self, max_parallel_tests: usize) -> Self {
        self.max_parallel_tests = clamp_parallelism(max_parallel_tests);
        self
    }

    pub fn with_shared_mocks(mut self, shared_mocks: SharedMockPool) -> Self {
        self.shared_mocks = Arc::new(shared_mocks);
        self
    }

    pub fn with_monitoring(mut self, enabled: bool) -> Self {
        self.monitor = enabled.then(|| SystemMonitor::new(true));
        self
    }

    pub fn registry(&self) -> &RegistryConfig {
        &self.registry
    }

    pub fn shared_mocks(&self) -> &SharedMockPool {
        &self.shared_mocks
    }

    pub fn max_parallel_tests(&self) -> usize {
        self.max_parallel_tests
    }

    pub async fn run_test_suite(&self, integration: &Integration) -> TestResult {
        execute_suite(self.probe.as_ref(), &self.shared_mocks, integration).await
    }

    /// 每個整合一個 task，以 semaphore 限制並行數；結果依輸入順序回傳，
    /// panic 或被取消的 task 轉為失敗結果
    pub async fn run_parallel_tests(&self, integrations: Vec<Integration>) -> Vec<TestResult> {
        tracing::info!(
            "🚀 Running {} tests in parallel (max {})",
            integrations.len(),
            self.max_parallel_tests
        );

        let semaphore = Arc::new(Semaphore::new(self.max_parallel_tests));

        let handles: Vec<_> = integrations
            .iter()
            .cloned()
            .map(|integration| {
                let semaphore = Arc::clone(&semaphore);
                let probe = Arc::clone(&self.probe);
                let shared_mocks = Arc::clone(&self.shared_mocks);

                tokio::spawn(async move {
                    let _permit = match semaphore.acquire_owned().await {
                        Ok(permit) => permit,
                        Err(e) => {
                            return TestResult::failed(
                                &integration,
                                format!("Test execution failed: {}", e),
                            )
                        }
                    };
                    execute_suite(probe.as_ref(), &shared_mocks, &integration).await
                })
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for (handle, integration) in handles.into_iter().zip(&integrations) {
            match handle.await {
                Ok(result) => results.push(result),
                Err(e) => {
                    tracing::error!("❌ Test task for {} failed: {}", integration.name, e);
                    results.push(TestResult::failed(
                        integration,
                        format!("Test execution failed: {}", e),
                    ));
                }
            }
        }

        results
    }

    /// 依觸發條件選取、啟動共用 mock、執行並彙整
    pub async fn run_priority_tests(&self, trigger: TestTrigger, weekday: u32) -> RunSummary {
        tracing::info!("🎯 Running priority tests for trigger: {}", trigger);

        let selected: Vec<Integration> = select(&self.registry, trigger, weekday)
            .into_iter()
            .cloned()
            .collect();
        tracing::info!("📊 Testing {} integrations", selected.len());

        let mut distribution: BTreeMap<Priority, usize> = BTreeMap::new();
        for integration in &selected {
            *distribution.entry(integration.priority).or_insert(0) += 1;
        }
        for (priority, count) in &distribution {
            tracing::info!("📈 {}: {} integrations", priority, count);
        }

        if let Some(monitor) = &self.monitor {
            monitor.log_stats("Test run started");
        }

        let start = Instant::now();
        let results = {
            let _lifecycle = MockLifecycle::start(&self.shared_mocks);
            self.run_parallel_tests(selected).await
        };
        let total_duration = start.elapsed().as_secs_f64();

        if let Some(monitor) = &self.monitor {
            monitor.log_stats("Test run completed");
        }

        RunSummary::from_results(trigger, results, total_duration)
    }
}

fn clamp_parallelism(requested: usize) -> usize {
    requested.clamp(1, Semaphore::MAX_PERMITS)
}

async fn execute_suite(
    probe: &dyn IntegrationProbe,
    shared_mocks: &SharedMockPool,
    integration: &Integration,
) -> TestResult {
    let start = Instant::now();

    // 連線憑證要活到探測結束
    let _connection = match integration
        .mock_service
        .as_deref()
        .and_then(|name| shared_mocks.get(name))
    {
        Some(service) => match service.acquire() {
            Some(connection) => Some(connection),
            None => {
                tracing::warn!(
                    "⚠️ {} could not acquire a connection to {}",
                    integration.name,
                    service.service_type()
                );
                return TestResult::failed(integration, MOCK_CONNECTION_REFUSED);
            }
        },
        None => None,
    };

    let outcome = probe.run_suite(integration).await;
    let result = TestResult::from_outcome(integration, outcome, start.elapsed().as_secs_f64());

    if result.passed {
        tracing::debug!("✅ {} passed in {:.2}s", result.integration_name, result.duration);
    } else {
        tracing::warn!(
            "❌ {} failed: {}",
            result.integration_name,
            result.errors.join("; ")
        );
    }

    result
}

/// 共用 mock 在這個值存活期間保持啟動
struct MockLifecycle<'a> {
    pool: &'a SharedMockPool,
}

impl<'a> MockLifecycle<'a> {
    fn start(pool: &'a SharedMockPool) -> Self {
        pool.start_all();
        Self { pool }
    }
}

impl Drop for MockLifecycle<'_> {
    fn drop(&mut self) {
        self.pool.stop_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::shared_mock::SharedMockService;
    use crate::domain::model::ProbeOutcome;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// 依整合名稱回傳固定結果；名稱含 "explode" 時 panic
    #[derive(Default)]
    struct ScriptedProbe {
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        delay: Option<Duration>,
    }

    #[async_trait]
    impl IntegrationProbe for ScriptedProbe {
        async fn run_suite(&self, integration: &Integration) -> ProbeOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);

            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if integration.name.contains("explode") {
                panic!("probe blew up");
            }
            if integration.name.starts_with("bad") {
                return ProbeOutcome {
                    errors: vec!["Endpoint /api returned 500".to_string()],
                    warnings: vec![],
                };
            }
            ProbeOutcome::default()
        }
    }

    fn integration(name: &str, priority: Priority) -> Integration {
        Integration::new(
            name,
            "crm",
            priority,
            "http://localhost:5000",
            vec!["/api".to_string()],
        )
    }

    fn registry_of(integrations: Vec<Integration>) -> RegistryConfig {
        RegistryConfig {
            integrations,
            ..RegistryConfig::default()
        }
    }

    #[tokio::test]
    async fn test_results_keep_input_order_and_isolate_panics() {
        let integrations = vec![
            integration("alpha", Priority::Critical),
            integration("explode", Priority::Critical),
            integration("bad_gamma", Priority::Important),
            integration("delta", Priority::Secondary),
        ];
        let orchestrator = PriorityOrchestrator::new(
            registry_of(integrations.clone()),
            Arc::new(ScriptedProbe::default()),
        );

        let results = orchestrator.run_parallel_tests(integrations).await;

        let names: Vec<&str> = results.iter().map(|r| r.integration_name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "explode", "bad_gamma", "delta"]);

        assert!(results[0].passed);
        assert!(!results[1].passed);
        assert!(results[1].errors[0].starts_with("Test execution failed"));
        assert_eq!(results[1].duration, 0.0);
        assert!(!results[2].passed);
        assert!(results[3].passed);
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded_by_semaphore() {
        let integrations: Vec<Integration> = (0..12)
            .map(|i| integration(&format!("svc_{}", i), Priority::Secondary))
            .collect();
        let probe = Arc::new(ScriptedProbe {
            delay: Some(Duration::from_millis(20)),
            ..ScriptedProbe::default()
        });
        let orchestrator =
            PriorityOrchestrator::new(registry_of(integrations.clone()), probe.clone())
                .with_max_parallel(3);

        let results = orchestrator.run_parallel_tests(integrations).await;

        assert_eq!(results.len(), 12);
        assert_eq!(probe.calls.load(Ordering::SeqCst), 12);
        assert!(probe.max_in_flight.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn test_refused_mock_connection_fails_without_probing() {
        let crm = integration("hubspot", Priority::Important).with_mock_service("shared_crm");
        let probe = Arc::new(ScriptedProbe::default());

        let mut pool = SharedMockPool::default();
        pool.insert(SharedMockService::new("shared_crm", 6000, 0));

        let orchestrator = PriorityOrchestrator::new(registry_of(vec![crm.clone()]), probe.clone())
            .with_shared_mocks(pool);

        let result = orchestrator.run_test_suite(&crm).await;

        assert!(!result.passed);
        assert_eq!(result.errors, vec![MOCK_CONNECTION_REFUSED.to_string()]);
        assert_eq!(result.duration, 0.0);
        assert_eq!(probe.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_mock_connections_are_released_after_run() {
        let registry = RegistryConfig::sample();
        let orchestrator = PriorityOrchestrator::new(registry, Arc::new(ScriptedProbe::default()));

        let summary = orchestrator.run_priority_tests(TestTrigger::Rotating, 1).await;

        assert_eq!(summary.total_tests, 20);
        assert_eq!(summary.passed, 20);
        for service in orchestrator.shared_mocks().services() {
            assert_eq!(service.active_connections(), 0);
            assert!(!service.is_running());
        }
    }

    #[tokio::test]
    async fn test_run_priority_tests_every_commit() {
        let orchestrator =
            PriorityOrchestrator::new(RegistryConfig::sample(), Arc::new(ScriptedProbe::default()));

        let summary = orchestrator.run_priority_tests(TestTrigger::EveryCommit, 0).await;

        assert_eq!(summary.trigger, TestTrigger::EveryCommit);
        assert_eq!(summary.total_tests, 4);
        assert_eq!(summary.passed + summary.failed, summary.total_tests);
        assert_eq!(summary.priority_stats[&Priority::Critical].total, 4);
        assert_eq!(summary.priority_stats[&Priority::Secondary].total, 0);
    }

    #[tokio::test]
    async fn test_with_max_parallel_has_floor_of_one() {
        let orchestrator =
            PriorityOrchestrator::new(registry_of(vec![]), Arc::new(ScriptedProbe::default()))
                .with_max_parallel(0);
        assert_eq!(orchestrator.max_parallel_tests(), 1);
        assert!(orchestrator.run_parallel_tests(vec![]).await.is_empty());
    }

    #[tokio::test]
    async fn test_oversized_parallelism_is_clamped_to_semaphore_limit() {
        let mut registry = registry_of(vec![integration("alpha", Priority::Critical)]);
        registry.max_parallel_tests = usize::MAX;
        let orchestrator = PriorityOrchestrator::new(registry, Arc::new(ScriptedProbe::default()));
        assert_eq!(orchestrator.max_parallel_tests(), Semaphore::MAX_PERMITS);

        let summary = orchestrator.run_priority_tests(TestTrigger::EveryCommit, 0).await;
        assert_eq!(summary.total_tests, 1);
        assert_eq!(summary.passed, 1);

        let orchestrator = orchestrator.with_max_parallel(usize::MAX);
        assert_eq!(orchestrator.max_parallel_tests(), Semaphore::MAX_PERMITS);
    }

    #[tokio::test]
    async fn test_mock_connection_released_when_suite_panics() {
        let crm = integration("explode_crm", Priority::Secondary).with_mock_service("shared_crm");
        let orchestrator = PriorityOrchestrator::new(
            registry_of(vec![crm.clone()]),
            Arc::new(ScriptedProbe::default()),
        );

        let results = orchestrator.run_parallel_tests(vec![crm]).await;

        assert!(!results[0].passed);
        assert!(results[0].errors[0].starts_with("Test execution failed"));
        let service = orchestrator.shared_mocks().get("shared_crm").unwrap();
        assert_eq!(service.active_connections(), 0);
    }
}
