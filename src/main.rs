use clap::Parser;
use std::collections::BTreeSet;
use std::sync::Arc;
use tier_orchestrator::core::report::{default_report_name, print_summary};
use tier_orchestrator::core::selection::{current_weekday, plan, select};
use tier_orchestrator::utils::monitor::SystemMonitor;
use tier_orchestrator::utils::{logger, validation::Validate};
use tier_orchestrator::{
    CliConfig, HttpProbe, LocalStorage, PriorityOrchestrator, RegistryConfig, ReportWriter, Result,
    TestTrigger,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    // 初始化日誌
    logger::init_logger(config.verbose, config.json_logs);

    tracing::info!("🎯 Starting tier-orchestrator");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    match run(&config).await {
        Ok(true) => {}
        Ok(false) => {
            eprintln!("❌ Some integration tests failed");
            std::process::exit(1);
        }
        Err(e) => {
            tracing::error!(
                "❌ Test run failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());

            // 根據錯誤嚴重程度決定退出碼
            let exit_code = e.exit_code();
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

/// 回傳所有測試是否通過
async fn run(config: &CliConfig) -> Result<bool> {
    tracing::info!("📁 Loading registry from: {}", config.registry);
    let mut registry = RegistryConfig::load(&config.registry)?;

    // 應用命令列覆蓋設定
    if let Some(max_parallel) = config.max_parallel {
        registry.max_parallel_tests = max_parallel;
        tracing::info!("🔧 max_parallel_tests overridden to: {}", max_parallel);
    }

    registry.validate()?;
    tracing::info!("✅ Registry loaded and validated successfully");

    let weekday = config.weekday.unwrap_or_else(current_weekday);
    let triggers = config.triggers();

    display_registry_summary(&registry, config, weekday);

    if config.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No integration will be probed");
        perform_dry_run(&registry, &triggers, weekday);
        return Ok(true);
    }

    let probe = HttpProbe::from_config(&registry)?;

    if config.preflight {
        preflight(&probe, &registry, &triggers, weekday).await;
    }

    let monitor = SystemMonitor::new(config.monitor);
    if monitor.is_enabled() {
        tracing::info!("🔍 System monitoring enabled");
    }

    let orchestrator =
        PriorityOrchestrator::new(registry, Arc::new(probe)).with_monitoring(config.monitor);
    let writer = ReportWriter::new(LocalStorage::new(config.output_path.clone()));

    let mut all_passed = true;
    for trigger in triggers.iter().copied() {
        let summary = orchestrator.run_priority_tests(trigger, weekday).await;
        print_summary(&summary);
        all_passed &= summary.all_passed();

        // 一次跑多個觸發條件時在檔名加上前綴，避免同一秒內互相覆蓋
        let name_for = |extension: &str| {
            let name = default_report_name(summary.timestamp, extension);
            if triggers.len() > 1 {
                format!("{}_{}", trigger, name)
            } else {
                name
            }
        };

        if config.wants_format("json") {
            writer.write_json(&summary, Some(&name_for("json"))).await?;
        }
        if config.wants_format("csv") {
            writer.write_csv(&summary, Some(&name_for("csv"))).await?;
        }
        if config.bundle {
            writer.write_bundle(&summary, Some(&name_for("zip"))).await?;
        }
    }

    monitor.log_final_stats();
    println!("📁 Reports saved to: {}", config.output_path);
    if all_passed {
        println!("✅ All selected integration tests passed");
    }

    Ok(all_passed)
}

fn display_registry_summary(registry: &RegistryConfig, config: &CliConfig, weekday: u32) {
    println!("📋 Registry Summary:");
    println!("  Integrations: {}", registry.integrations.len());
    for priority in tier_orchestrator::Priority::ALL {
        println!("    {}: {}", priority, registry.by_priority(priority).len());
    }
    println!("  Max parallel tests: {}", registry.max_parallel_tests);
    println!("  Rotation size: {}", registry.rotation_size);
    println!("  Weekday: {}", weekday);
    println!("  Output: {}", config.output_path);
    println!("  Formats: {}", config.output_formats.join(", "));

    if config.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }
}

fn perform_dry_run(registry: &RegistryConfig, triggers: &[TestTrigger], weekday: u32) {
    println!("\n🔍 Execution plan:");
    for trigger in triggers {
        let execution = plan(registry, *trigger, weekday);
        println!(
            "  {} ({}): {} integrations, {} test data records, parallelism {}",
            trigger,
            trigger.scope(),
            execution.integrations,
            execution.test_data_records,
            execution.parallelism
        );
    }
    println!("\n✅ Dry run completed - no integrations were probed");
}

/// 檢查被選到的服務是否健康；只記錄，不中止
async fn preflight(
    probe: &HttpProbe,
    registry: &RegistryConfig,
    triggers: &[TestTrigger],
    weekday: u32,
) {
    let base_urls: BTreeSet<&str> = triggers
        .iter()
        .flat_map(|trigger| select(registry, *trigger, weekday))
        .map(|integration| integration.base_url.as_str())
        .collect();

    tracing::info!("🩺 Checking {} services", base_urls.len());
    for base_url in base_urls {
        if probe.check_health(base_url).await {
            tracing::info!("✅ {} is healthy", base_url);
        } else {
            tracing::warn!("⚠️ {} failed its health check", base_url);
        }
    }
}
