use clap::Parser;
use voyage_value::config::toml_config::TomlConfig;
use voyage_value::core::dashboard::view_ids;
use voyage_value::core::export::render_summary;
use voyage_value::core::schema::{expected_columns, SchemaCheck};
use voyage_value::core::ConfigProvider;
use voyage_value::utils::error::ErrorSeverity;
use voyage_value::utils::{logger, validation::Validate};
use voyage_value::{Category, DashboardEngine, LocalStorage};

#[derive(Parser)]
#[command(name = "toml-dashboard")]
#[command(about = "Build a dashboard from a TOML configuration file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "dashboard.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override the category from the config
    #[arg(long, value_enum)]
    category: Option<Category>,

    /// Dry run - check the input against the category's columns without writing output
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // 載入 TOML 配置
    let mut config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 初始化日誌
    // --verbose 只會提高等級，不會蓋掉 trace
    let level = match (args.verbose, config.log_level()) {
        (true, "trace") | (false, _) => config.log_level(),
        (true, _) => logger::level_for(true),
    };
    logger::init_logger(config.log_format(), level);

    tracing::info!("🚀 Starting TOML-based dashboard tool");
    tracing::info!("📁 Configuration loaded from: {}", args.config);

    // 應用命令列覆蓋設定
    if let Some(category) = args.category {
        config.dashboard.category = category;
        tracing::info!("🔧 Category overridden to: {}", category);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    tracing::info!("✅ Configuration loaded and validated successfully");

    display_config_summary(&config, &args);

    let engine = DashboardEngine::new(LocalStorage::default(), config);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No output will be written");
        perform_dry_run(&engine).await?;
        return Ok(());
    }

    match engine.run().await {
        Ok(run) => {
            tracing::info!(
                "✅ Dashboard built: {}/{} views ready",
                run.report.ready_count(),
                run.report.views.len()
            );
            println!("{}", render_summary(&run.report));
            for path in &run.outputs {
                println!("📁 {}", path);
            }
        }
        Err(e) => {
            tracing::error!(
                "❌ Dashboard run failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };

            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

fn display_config_summary(config: &TomlConfig, args: &Args) {
    let histogram = config.age_histogram();

    println!("📋 Configuration Summary:");
    println!("  Dashboard: {}", config.dashboard_name());
    println!("  Category: {}", config.category());
    println!("  Input: {}", config.input_path());
    println!("  Output: {}", config.output_path());
    println!("  Formats: {}", config.output_formats().join(", "));
    if config.compress() {
        println!("  Compression: {} (ZIP)", config.archive_name());
    }
    if config.category() == Category::Employee {
        println!(
            "  Age histogram: width {} over [{}, {})",
            histogram.width, histogram.start, histogram.end
        );
    }

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}

async fn perform_dry_run(
    engine: &DashboardEngine<LocalStorage, TomlConfig>,
) -> Result<(), Box<dyn std::error::Error>> {
    let category = engine.config().category();
    let table = engine.load().await?;

    println!("🔍 Dry Run Analysis:");
    println!();
    println!("📥 Input: {} rows, {} columns", table.row_count(), table.column_names().len());

    let requirements = expected_columns(category);
    let check = SchemaCheck::run(&table, requirements);

    println!();
    println!("🧾 Columns read by the {} dashboard:", category);
    for requirement in requirements {
        match check.failure(requirement.name) {
            None => println!("  ✅ {} ({:?})", requirement.name, requirement.kind),
            Some(err) => println!("  ❌ {}: {}", requirement.name, err),
        }
    }

    println!();
    println!("📊 Views: {}", view_ids(category).join(", "));

    println!();
    if check.is_clean() {
        println!("✅ Dry run complete. Every view has the columns it needs.");
    } else {
        println!("⚠️ Dry run complete. Views reading the columns above marked ❌ will be reported as unavailable.");
    }

    Ok(())
}
