use std::io::Write;
use tempfile::{NamedTempFile, TempDir};
use tier_orchestrator::utils::validation::Validate;
use tier_orchestrator::{ShellExecutor, SuiteConfig, TierSelection, TieredRunner};

fn suites_toml(root: &str) -> String {
    format!(
        r#"
root = "{root}"
command_timeout_seconds = 2

[[tiers]]
name = "tier1"
title = "TIER 1"
max_workers = 2

[[tiers.commands]]
command = "echo ok"
component = "slack-mock"

[[tiers.commands]]
command = "echo 'assertion failed in test_post_message' >&2; exit 2"
component = "e2e-testing"

[[tiers]]
name = "smoke"
title = "SMOKE"
parallel = false

[[tiers.commands]]
command = "test -f marker.txt"
component = "slack-mock"

[[tiers]]
name = "tier3"
title = "TIER 3"

[[tiers.commands]]
command = "sleep 10"
component = "monitoring-system"
"#,
        root = root
    )
}

fn workspace() -> (TempDir, SuiteConfig) {
    let temp_dir = TempDir::new().unwrap();
    for component in ["slack-mock", "e2e-testing", "monitoring-system"] {
        std::fs::create_dir(temp_dir.path().join(component)).unwrap();
    }
    std::fs::write(temp_dir.path().join("slack-mock").join("marker.txt"), "").unwrap();

    let mut file = NamedTempFile::new().unwrap();
    file.write_all(suites_toml(temp_dir.path().to_str().unwrap()).as_bytes())
        .unwrap();

    let config = SuiteConfig::load(Some(file.path().to_str().unwrap())).unwrap();
    config.validate().unwrap();
    (temp_dir, config)
}

#[tokio::test]
async fn test_tier_run_through_shell() {
    let (_temp_dir, config) = workspace();
    let executor = ShellExecutor::from_config(&config);
    let mut runner = TieredRunner::new(executor, config).with_services_available(false);

    let ok = runner.run(TierSelection::Tier1).await.unwrap();

    assert!(!ok);
    assert_eq!(runner.exit_code(), 1);

    let passed = runner.get("slack-mock_tier1").unwrap();
    assert!(passed.success);
    assert_eq!(passed.stdout.trim(), "ok");

    let failed = runner.get("e2e-testing_tier1").unwrap();
    assert_eq!(failed.return_code, 2);
    assert!(runner
        .format_summary()
        .contains("Error: assertion failed in test_post_message"));
}

#[tokio::test]
async fn test_commands_run_inside_component_directory() {
    let (_temp_dir, config) = workspace();
    let executor = ShellExecutor::from_config(&config);
    let mut runner = TieredRunner::new(executor, config).with_sequential(true);

    let ok = runner.run(TierSelection::Smoke).await.unwrap();

    assert!(ok);
    assert_eq!(runner.exit_code(), 0);
    assert_eq!(runner.results().len(), 1);
}

#[tokio::test]
async fn test_slow_command_times_out() {
    let (_temp_dir, config) = workspace();
    let executor = ShellExecutor::from_config(&config);
    let mut runner = TieredRunner::new(executor, config);

    runner.run(TierSelection::Tier3).await.unwrap();

    let result = runner.get("monitoring-system_tier3").unwrap();
    assert!(!result.success);
    assert_eq!(result.stderr, "Command timed out");
    assert!(result.duration < 5.0);
}

#[tokio::test]
async fn test_selection_missing_from_custom_suites_is_error() {
    let (_temp_dir, config) = workspace();
    let executor = ShellExecutor::from_config(&config);
    let mut runner = TieredRunner::new(executor, config);

    assert!(runner.run(TierSelection::Regression).await.is_err());
    assert!(runner.results().is_empty());
}
