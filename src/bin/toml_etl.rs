use clap::Parser;
use doc_text_etl::config::toml_config::TomlConfig;
use doc_text_etl::core::{ConfigProvider, Pipeline};
use doc_text_etl::utils::{logger, validation::Validate};
use doc_text_etl::{ConversionPipeline, EtlEngine, LocalStorage};

#[derive(Parser)]
#[command(name = "toml-etl")]
#[command(about = "Batch document conversion driven by a TOML configuration file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "doc-text-etl.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    monitor: Option<bool>,

    /// Dry run - list the documents that would be converted without writing anything
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // 載入 TOML 配置
    let config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 初始化日誌：設定檔中的 log_level = "debug" 等同 --verbose
    let verbose = args.verbose || config.log_level() == Some("debug");
    logger::init_cli_logger(verbose);

    tracing::info!("🚀 Starting TOML-based conversion");
    tracing::info!("📁 Loaded configuration from: {}", args.config);

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    display_config_summary(&config, &args);

    let monitor_enabled = args.monitor.unwrap_or_else(|| config.monitoring_enabled());
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let pipeline = match ConversionPipeline::new(LocalStorage::default(), config) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No files will be written");
        perform_dry_run(&pipeline).await?;
        return Ok(());
    }

    let engine = EtlEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(report) => {
            println!(
                "✅ Converted {}/{} documents",
                report.converted.len(),
                report.total()
            );
            for doc in &report.failed {
                println!("❌ {}: {}", doc.source, doc.reason);
            }
            for artifact in &report.artifacts {
                println!("📁 {}", artifact);
            }
            if report.has_failures() {
                std::process::exit(2);
            }
        }
        Err(e) => {
            tracing::error!(
                "❌ Conversion failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());

            // 根據錯誤嚴重程度決定退出碼
            std::process::exit(e.exit_code());
        }
    }

    Ok(())
}

fn display_config_summary(config: &TomlConfig, args: &Args) {
    println!("📋 Configuration Summary:");
    println!("  Input: {}", config.input_path());
    println!("  Recursive: {}", config.recursive());
    println!(
        "  Output: {}",
        config.output_dir().unwrap_or("(next to each document)")
    );
    println!("  Encoding: {}", config.output_encoding());
    println!(
        "  Thresholds: min_chars={} min_ratio={} min_kana_share={}",
        config.heuristics.min_chars, config.heuristics.min_ratio, config.heuristics.min_kana_share
    );
    println!(
        "  Decode encodings: {}",
        config.heuristics.decode_encodings.join(", ")
    );
    if let Some(mode) = config.cleaning.mode {
        println!("  Cleaning: {:?}", mode);
    }

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}

async fn perform_dry_run<P: Pipeline>(pipeline: &P) -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Dry Run Analysis:");

    let sources = pipeline.extract().await?;
    println!("  📊 Documents to convert: {}", sources.len());
    for source in &sources {
        println!("  - {}", source.path);
    }

    println!();
    println!("✅ Dry run analysis complete. Use --verbose for more details during actual run.");

    Ok(())
}
