use clap::Parser;
use tier_orchestrator::fixtures::base::DEFAULT_SEED;
use tier_orchestrator::fixtures::{SeedCounts, SeedData};
use tier_orchestrator::utils::logger;
use tier_orchestrator::LocalStorage;

#[derive(Parser)]
#[command(name = "seed-data")]
#[command(about = "Generate deterministic QuickBooks and Salesforce test data")]
struct Args {
    /// Directory the JSON files are written to
    #[arg(short, long, default_value = "./seed-data")]
    output_path: String,

    /// Random seed; the same seed always yields the same data
    #[arg(long, default_value_t = DEFAULT_SEED)]
    seed: u64,

    /// Override CUSTOMER_COUNT
    #[arg(long)]
    customers: Option<usize>,

    /// Override INVOICE_COUNT
    #[arg(long)]
    invoices: Option<usize>,

    /// Override ACCOUNT_COUNT
    #[arg(long)]
    accounts: Option<usize>,

    /// Override CONTACT_COUNT
    #[arg(long)]
    contacts: Option<usize>,

    /// Override OPPORTUNITY_COUNT
    #[arg(long)]
    opportunities: Option<usize>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 初始化日誌
    logger::init_cli_logger(args.verbose);

    tracing::info!("🌱 Starting test data seeding...");

    // 環境變數為預設，命令列旗標優先
    let mut counts = match SeedCounts::from_env() {
        Ok(counts) => counts,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };
    counts.customers = args.customers.unwrap_or(counts.customers);
    counts.invoices = args.invoices.unwrap_or(counts.invoices);
    counts.accounts = args.accounts.unwrap_or(counts.accounts);
    counts.contacts = args.contacts.unwrap_or(counts.contacts);
    counts.opportunities = args.opportunities.unwrap_or(counts.opportunities);

    tracing::debug!("Seed counts: {:?} (seed {})", counts, args.seed);

    let data = SeedData::generate(args.seed, counts);
    let storage = LocalStorage::new(args.output_path.clone());

    if let Err(e) = data.write_to(&storage).await {
        tracing::error!("❌ Seeding failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 建議: {}", e.recovery_suggestion());
        std::process::exit(e.exit_code());
    }

    println!("\n📊 Seeding Summary:");
    println!("   • Customers: {}", data.customers.len());
    println!("   • Invoices: {}", data.invoices.len());
    println!("   • Accounts: {}", data.accounts.len());
    println!("   • Contacts: {}", data.contacts.len());
    println!("   • Opportunities: {}", data.opportunities.len());
    println!("📁 Output saved to: {}", args.output_path);
    println!("\n✅ Data seeding completed successfully!");

    Ok(())
}
