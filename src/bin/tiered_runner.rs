use clap::Parser;
use tier_orchestrator::utils::{logger, validation::Validate};
use tier_orchestrator::{ShellExecutor, SuiteConfig, TierSelection, TieredRunner};

#[derive(Parser)]
#[command(name = "tiered-runner")]
#[command(about = "Run component test suites tier by tier")]
struct Args {
    /// Which tier to run: 1, 2, 3, smoke, regression or all
    #[arg(long, default_value = "1")]
    tier: TierSelection,

    /// Run commands one at a time (suites with ignore_sequential, like regression, stay parallel)
    #[arg(long)]
    sequential: bool,

    /// Path to a TOML file overriding the built-in suites
    #[arg(long)]
    suites: Option<String>,

    /// Override the directory containing the components
    #[arg(long)]
    root: Option<String>,

    /// Override the per-command timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 初始化日誌
    logger::init_cli_logger(args.verbose);

    let mut config = match SuiteConfig::load(args.suites.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load suite config: {}", e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 應用命令列覆蓋設定
    if let Some(root) = args.root {
        config.root = root;
    }
    if let Some(timeout) = args.timeout {
        config.command_timeout_seconds = timeout;
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    println!("🎯 Person.ai Tiered Test Runner");
    println!("{}", "=".repeat(60));
    println!("Strategy: Critical tests run fast, secondary tests run when needed");
    println!("Scaling: Parallel execution for 150+ integrations");
    println!("{}", "=".repeat(60));

    let executor = ShellExecutor::from_config(&config);
    let mut runner = TieredRunner::new(executor, config).with_sequential(args.sequential);

    if let Err(e) = runner.run(args.tier).await {
        tracing::error!("❌ Tier run failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(e.exit_code());
    }

    runner.print_summary();
    std::process::exit(runner.exit_code());
}
