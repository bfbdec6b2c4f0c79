use clap::Parser;
use voyage_value::core::export::render_summary;
use voyage_value::utils::error::ErrorSeverity;
use voyage_value::utils::{logger, validation::Validate};
use voyage_value::{CliConfig, DashboardEngine, LocalStorage};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CliConfig::parse();

    // 初始化日誌
    logger::init_logger(&config.log_format, logger::level_for(config.verbose));

    tracing::info!("Starting voyage-value CLI");
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

    let engine = DashboardEngine::new(LocalStorage::default(), config);

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

            // 根據錯誤嚴重程度決定退出碼
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
