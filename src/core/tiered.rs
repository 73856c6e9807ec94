use crate::config::suite_config::{SuiteConfig, TierSelection, TierSuite};
use crate::core::CommandExecutor;
use crate::domain::model::{CommandResult, CommandSpec};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tokio::sync::Semaphore;

pub const TIMEOUT_MESSAGE: &str = "Command timed out";
const STDERR_PREVIEW_CHARS: usize = 100;

/// 透過 `sh -c` 在 `{root}/{component}` 目錄下執行指令
#[derive(Debug, Clone)]
pub struct ShellExecutor {
    root: PathBuf,
    timeout: Duration,
}

impl ShellExecutor {
    pub fn new(root: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            root: root.into(),
            timeout,
        }
    }

    pub fn from_config(config: &SuiteConfig) -> Self {
        Self::new(&config.root, Duration::from_secs(config.command_timeout_seconds))
    }

    fn failed(spec: &CommandSpec, duration: f64, stderr: String) -> CommandResult {
        CommandResult {
            component: spec.component.clone(),
            tier: spec.tier.clone(),
            duration,
            return_code: -1,
            stdout: String::new(),
            stderr,
            success: false,
        }
    }
}

#[async_trait]
impl CommandExecutor for ShellExecutor {
    async fn execute(&self, spec: &CommandSpec) -> CommandResult {
        tracing::info!("🚀 Running {} tests for {}...", spec.tier, spec.component);
        let start = Instant::now();

        let mut command = Command::new("sh");
        command
            .arg("-c")
            .arg(&spec.command)
            .current_dir(self.root.join(&spec.component))
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, command.output()).await;
        let duration = start.elapsed().as_secs_f64();

        let result = match output {
            Ok(Ok(output)) => CommandResult {
                component: spec.component.clone(),
                tier: spec.tier.clone(),
                duration,
                // 被 signal 終止時沒有 exit code
                return_code: output.status.code().unwrap_or(-1),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                success: output.status.success(),
            },
            Ok(Err(e)) => Self::failed(spec, duration, e.to_string()),
            Err(_) => Self::failed(spec, duration, TIMEOUT_MESSAGE.to_string()),
        };

        if result.success {
            tracing::info!("   ✅ PASSED {} ({}) - {:.2}s", spec.component, spec.tier, duration);
        } else {
            tracing::warn!("   ❌ FAILED {} ({}) - {:.2}s", spec.component, spec.tier, duration);
        }

        result
    }
}

/// 依分層執行指令並以 `{component}_{tier}` 記錄結果
pub struct TieredRunner<E: CommandExecutor + 'static> {
    executor: Arc<E>,
    config: SuiteConfig,
    sequential: bool,
    services_available: bool,
    results: Vec<(String, CommandResult)>,
    start_time: Instant,
}

impl<E: CommandExecutor + 'static> TieredRunner<E> {
    pub fn new(executor: E, config: SuiteConfig) -> Self {
        Self {
            executor: Arc::new(executor),
            config,
            sequential: false,
            services_available: crate::config::suite_config::services_available(),
            results: Vec::new(),
            start_time: Instant::now(),
        }
    }

    pub fn with_sequential(mut self, sequential: bool) -> Self {
        self.sequential = sequential;
        self
    }

    pub fn with_services_available(mut self, available: bool) -> Self {
        self.services_available = available;
        self
    }

    pub fn config(&self) -> &SuiteConfig {
        &self.config
    }

    /// 執行一個 suite，結果依指令順序回傳
    pub async fn run_suite(&self, suite: &TierSuite) -> Vec<CommandResult> {
        let specs = suite.command_specs(self.services_available);

        println!("\n{}", suite.title);
        println!("{}", "=".repeat(50));

        if specs.is_empty() {
            tracing::warn!("⚠️ Suite {} has no runnable commands", suite.name);
            return Vec::new();
        }

        let workers = if self.sequential && !suite.ignore_sequential {
            1
        } else {
            suite.worker_count(specs.len())
        };
        tracing::debug!("Suite {}: {} commands, {} workers", suite.name, specs.len(), workers);

        if workers == 1 {
            let mut results = Vec::with_capacity(specs.len());
            for spec in &specs {
                results.push(self.executor.execute(spec).await);
            }
            return results;
        }

        let semaphore = Arc::new(Semaphore::new(workers));
        let handles: Vec<_> = specs
            .iter()
            .cloned()
            .map(|spec| {
                let semaphore = Arc::clone(&semaphore);
                let executor = Arc::clone(&self.executor);
                tokio::spawn(async move {
                    let _permit = semaphore.acquire_owned().await.ok();
                    executor.execute(&spec).await
                })
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for (handle, spec) in handles.into_iter().zip(&specs) {
            match handle.await {
                Ok(result) => results.push(result),
                Err(e) => results.push(ShellExecutor::failed(
                    spec,
                    0.0,
                    format!("Command execution failed: {}", e),
                )),
            }
        }
        results
    }

    /// 依選擇依序執行各分層；回傳是否全部成功
    pub async fn run(&mut self, selection: TierSelection) -> Result<bool> {
        let suites: Vec<TierSuite> = self
            .config
            .select(selection)?
            .into_iter()
            .cloned()
            .collect();

        for suite in &suites {
            let results = self.run_suite(suite).await;
            for result in results {
                self.record(result);
            }
        }

        Ok(self.all_succeeded())
    }

    /// 同一個 key 再次出現時覆蓋，保留原本的位置
    pub fn record(&mut self, result: CommandResult) {
        let key = format!("{}_{}", result.component, result.tier);
        match self.results.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = result,
            None => self.results.push((key, result)),
        }
    }

    pub fn results(&self) -> &[(String, CommandResult)] {
        &self.results
    }

    pub fn get(&self, key: &str) -> Option<&CommandResult> {
        self.results.iter().find(|(k, _)| k == key).map(|(_, r)| r)
    }

    pub fn all_succeeded(&self) -> bool {
        self.results.iter().all(|(_, r)| r.success)
    }

    pub fn exit_code(&self) -> i32 {
        if self.all_succeeded() {
            0
        } else {
            1
        }
    }

    pub fn format_summary(&self) -> String {
        let total = self.results.len();
        let successful = self.results.iter().filter(|(_, r)| r.success).count();
        let success_rate = if total == 0 {
            0.0
        } else {
            successful as f64 / total as f64 * 100.0
        };

        let rule = "=".repeat(60);
        let mut out = String::new();
        out.push_str(&format!("\n{}\n📊 TEST EXECUTION SUMMARY\n{}\n", rule, rule));
        out.push_str(&format!("Total Tests: {}\n", total));
        out.push_str(&format!("Successful: {}\n", successful));
        out.push_str(&format!("Failed: {}\n", total - successful));
        out.push_str(&format!("Success Rate: {:.1}%\n", success_rate));
        out.push_str(&format!(
            "Total Time: {:.2}s\n",
            self.start_time.elapsed().as_secs_f64()
        ));

        out.push_str("\n📋 DETAILED RESULTS:\n");
        for (_, result) in &self.results {
            let status = if result.success { "✅" } else { "❌" };
            out.push_str(&format!(
                "  {} {} ({}) - {:.2}s\n",
                status, result.component, result.tier, result.duration
            ));
            if !result.success && !result.stderr.is_empty() {
                let preview: String = result.stderr.chars().take(STDERR_PREVIEW_CHARS).collect();
                out.push_str(&format!("    Error: {}...\n", preview));
            }
        }
        out
    }

    pub fn print_summary(&self) {
        println!("{}", self.format_summary());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::suite_config::SuiteCommand;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// 記錄呼叫順序；component 名稱含 "broken" 時回傳失敗
    #[derive(Default)]
    struct RecordingExecutor {
        calls: Mutex<Vec<String>>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    #[async_trait]
    impl CommandExecutor for RecordingExecutor {
        async fn execute(&self, spec: &CommandSpec) -> CommandResult {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            self.calls.lock().unwrap().push(spec.key());
            let success = !spec.component.contains("broken");
            CommandResult {
                component: spec.component.clone(),
                tier: spec.tier.clone(),
                duration: 0.01,
                return_code: if success { 0 } else { 1 },
                stdout: String::new(),
                stderr: if success { String::new() } else { "E".repeat(250) },
                success,
            }
        }
    }

    fn suite(name: &str, parallel: bool, components: &[&str]) -> TierSuite {
        TierSuite {
            name: name.to_string(),
            title: name.to_uppercase(),
            parallel,
            max_workers: None,
            ignore_sequential: false,
            commands: components
                .iter()
                .map(|c| SuiteCommand {
                    command: "true".to_string(),
                    component: c.to_string(),
                    tier: None,
                    requires_services: false,
                })
                .collect(),
        }
    }

    fn config_with(tiers: Vec<TierSuite>) -> SuiteConfig {
        SuiteConfig {
            root: ".".to_string(),
            command_timeout_seconds: 5,
            tiers,
        }
    }

    #[tokio::test]
    async fn test_tier1_without_services_skips_integration_command() {
        let mut runner = TieredRunner::new(RecordingExecutor::default(), SuiteConfig::builtin())
            .with_services_available(false);

        let ok = runner.run(TierSelection::Tier1).await.unwrap();

        assert!(ok);
        let keys: Vec<&str> = runner.results().iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["slack-mock_tier1", "e2e-testing_tier1"]);
        assert_eq!(runner.exit_code(), 0);
    }

    #[tokio::test]
    async fn test_tier1_with_services_runs_integration_command() {
        let mut runner = TieredRunner::new(RecordingExecutor::default(), SuiteConfig::builtin())
            .with_services_available(true);

        runner.run(TierSelection::Tier1).await.unwrap();

        assert_eq!(runner.results().len(), 3);
        assert!(runner.get("slack-mock_tier1_integration").is_some());
    }

    #[tokio::test]
    async fn test_all_runs_every_suite_in_order() {
        let mut runner = TieredRunner::new(RecordingExecutor::default(), SuiteConfig::builtin())
            .with_services_available(true);

        runner.run(TierSelection::All).await.unwrap();

        // tier1: 3, tier2: 2, tier3: 兩個不同元件, smoke: 3, regression: 5
        assert_eq!(runner.results().len(), 15);
        assert_eq!(runner.results()[0].0, "slack-mock_tier1");
        assert_eq!(runner.results()[14].0, "bubble-frontend-mock_regression");
    }

    #[tokio::test]
    async fn test_failure_sets_exit_code_and_truncates_stderr() {
        let config = config_with(vec![suite("tier2", true, &["ok-component", "broken-component"])]);
        let mut runner = TieredRunner::new(RecordingExecutor::default(), config);

        let ok = runner.run(TierSelection::Tier2).await.unwrap();

        assert!(!ok);
        assert_eq!(runner.exit_code(), 1);

        let summary = runner.format_summary();
        assert!(summary.contains("Total Tests: 2"));
        assert!(summary.contains("Success Rate: 50.0%"));
        assert!(summary.contains(&format!("    Error: {}...", "E".repeat(100))));
        assert!(!summary.contains(&"E".repeat(101)));
    }

    #[tokio::test]
    async fn test_sequential_runs_one_at_a_time() {
        let config = config_with(vec![suite("regression", true, &["a", "b", "c", "d"])]);
        let executor = RecordingExecutor::default();
        let mut runner = TieredRunner::new(executor, config).with_sequential(true);

        runner.run(TierSelection::Regression).await.unwrap();

        assert_eq!(runner.executor.max_in_flight.load(Ordering::SeqCst), 1);
        assert_eq!(
            *runner.executor.calls.lock().unwrap(),
            vec!["a_regression", "b_regression", "c_regression", "d_regression"]
        );
    }

    #[tokio::test]
    async fn test_builtin_regression_stays_parallel_when_sequential() {
        let mut runner = TieredRunner::new(RecordingExecutor::default(), SuiteConfig::builtin())
            .with_sequential(true);

        runner.run(TierSelection::Regression).await.unwrap();

        assert_eq!(runner.results().len(), 5);
        assert!(runner.executor.max_in_flight.load(Ordering::SeqCst) > 1);
    }

    #[tokio::test]
    async fn test_parallel_results_keep_command_order() {
        let config = config_with(vec![suite("regression", true, &["a", "b", "c"])]);
        let mut runner = TieredRunner::new(RecordingExecutor::default(), config);

        runner.run(TierSelection::Regression).await.unwrap();

        let keys: Vec<&str> = runner.results().iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["a_regression", "b_regression", "c_regression"]);
    }

    #[tokio::test]
    async fn test_missing_suite_is_config_error() {
        let config = config_with(vec![suite("tier1", true, &["a"])]);
        let mut runner = TieredRunner::new(RecordingExecutor::default(), config);
        assert!(runner.run(TierSelection::Smoke).await.is_err());
    }

    #[test]
    fn test_record_overwrites_same_key_in_place() {
        let mut runner = TieredRunner::new(RecordingExecutor::default(), config_with(vec![]));
        let result = |component: &str, success: bool| CommandResult {
            component: component.to_string(),
            tier: "smoke".to_string(),
            duration: 0.0,
            return_code: if success { 0 } else { 1 },
            stdout: String::new(),
            stderr: String::new(),
            success,
        };

        runner.record(result("a", true));
        runner.record(result("b", true));
        runner.record(result("a", false));

        assert_eq!(runner.results().len(), 2);
        assert_eq!(runner.results()[0].0, "a_smoke");
        assert!(!runner.results()[0].1.success);
    }

    #[tokio::test]
    async fn test_shell_executor_reports_exit_codes() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::create_dir(temp_dir.path().join("component")).unwrap();
        let executor = ShellExecutor::new(temp_dir.path(), Duration::from_secs(5));

        let ok = executor
            .execute(&CommandSpec::new("echo hello", "component", "tier1"))
            .await;
        assert!(ok.success);
        assert_eq!(ok.return_code, 0);
        assert_eq!(ok.stdout.trim(), "hello");

        let failed = executor
            .execute(&CommandSpec::new("echo oops >&2; exit 3", "component", "tier1"))
            .await;
        assert!(!failed.success);
        assert_eq!(failed.return_code, 3);
        assert_eq!(failed.stderr.trim(), "oops");
    }

    #[tokio::test]
    async fn test_shell_executor_missing_directory_is_failed_result() {
        let temp_dir = TempDir::new().unwrap();
        let executor = ShellExecutor::new(temp_dir.path(), Duration::from_secs(5));

        let result = executor
            .execute(&CommandSpec::new("true", "does-not-exist", "tier1"))
            .await;

        assert!(!result.success);
        assert_eq!(result.return_code, -1);
        assert!(!result.stderr.is_empty());
    }

    #[tokio::test]
    async fn test_shell_executor_timeout() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::create_dir(temp_dir.path().join("slow")).unwrap();
        let executor = ShellExecutor::new(temp_dir.path(), Duration::from_millis(200));

        let result = executor
            .execute(&CommandSpec::new("sleep 5", "slow", "tier3"))
            .await;

        assert!(!result.success);
        assert_eq!(result.stderr, TIMEOUT_MESSAGE);
    }
}
