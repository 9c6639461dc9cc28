use clap::Parser;
use doc_text_etl::utils::error::EtlError;
use doc_text_etl::utils::{logger, validation::Validate};
use doc_text_etl::{CliConfig, ConversionPipeline, EtlEngine, LocalStorage};

fn report_error(e: &EtlError) {
    tracing::error!(
        "❌ Conversion failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 建議: {}", e.recovery_suggestion());
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CliConfig::parse();

    // 初始化日誌
    logger::init_logger(config.verbose, config.log_json);

    tracing::info!("Starting doc-text-etl");
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

    let monitor_enabled = config.monitor;
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let storage = LocalStorage::default();
    let pipeline = match ConversionPipeline::new(storage, config) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            report_error(&e);
            std::process::exit(1);
        }
    };

    let engine = EtlEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(report) => {
            for doc in &report.converted {
                println!("✅ {} -> {} ({})", doc.source, doc.output, doc.method);
            }
            for doc in &report.failed {
                println!("❌ {}: {}", doc.source, doc.reason);
            }
            for artifact in &report.artifacts {
                println!("📁 {}", artifact);
            }
            println!(
                "Converted {}/{} documents",
                report.converted.len(),
                report.total()
            );

            if report.has_failures() {
                tracing::warn!("{} documents failed to convert", report.failed.len());
                std::process::exit(2);
            }
            tracing::info!("✅ All documents converted successfully!");
        }
        Err(e) => {
            report_error(&e);
            std::process::exit(e.exit_code());
        }
    }

    Ok(())
}
