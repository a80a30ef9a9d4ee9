use clap::Parser;
use poke_etl::domain::ports::ConfigProvider;
use poke_etl::utils::error::ErrorSeverity;
use poke_etl::utils::logger::{init_pipeline_logger, LoggerConfig};
use poke_etl::utils::validation::Validate;
use poke_etl::{CliConfig, EtlEngine, EtlError, LocalStorage, PokemonPipeline, TomlConfig};
use std::path::Path;

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    let exit_code = match cli.config.as_deref() {
        Some(path) => match TomlConfig::from_file(path) {
            Ok(config) => run(config, &cli).await,
            Err(e) => {
                eprintln!("❌ Failed to load config file '{}': {}", path, e);
                eprintln!("💡 建議: {}", e.recovery_suggestion());
                1
            }
        },
        None => run(cli.clone(), &cli).await,
    };

    // 日誌 guard 已在 run 結束時釋放
    std::process::exit(exit_code);
}

async fn run<C: ConfigProvider + Validate>(config: C, cli: &CliConfig) -> i32 {
    // 驗證配置
    if let Err(e) = config.validate() {
        eprintln!("❌ Configuration validation failed: {}", e);
        eprintln!("💡 建議: {}", e.recovery_suggestion());
        return 1;
    }

    if cli.dry_run {
        println!("🔍 Dry run, configuration is valid");
        println!("   catalog:     {}", config.catalog_url());
        println!("   concurrency: {}", config.concurrency());
        println!("   timeout:     {:?}", config.request_timeout());
        println!("   top_n:       {}", config.top_n());
        println!("   output_dir:  {}", config.output_dir());
        return 0;
    }

    let logger_config = LoggerConfig {
        log_path: Some(Path::new(config.output_dir()).join(&config.output_files().log)),
        verbose: cli.verbose,
        json: cli.json_logs || config.json_logs(),
        level: config.log_level().map(str::to_string),
    };
    let guard = match init_pipeline_logger(&logger_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("❌ Failed to initialise logging: {}", e);
            return exit_code(&e);
        }
    };

    tracing::info!("Starting poke-etl");
    if let Some(path) = guard.log_path() {
        tracing::debug!("Logging to {}", path.display());
    }

    let storage = LocalStorage::new(config.output_dir().to_string());
    let engine = EtlEngine::new(PokemonPipeline::new(storage, config));

    match engine.run().await {
        Ok(outputs) => {
            println!("✅ ETL process completed successfully!");
            for path in &outputs {
                println!("📁 {}", path);
            }
            0
        }
        Err(e) => {
            tracing::error!(
                "❌ ETL process failed: {} (Severity: {:?})",
                e,
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e);
            eprintln!("💡 建議: {}", e.recovery_suggestion());
            exit_code(&e)
        }
    }
}

/// 根據錯誤嚴重程度決定退出碼
fn exit_code(error: &EtlError) -> i32 {
    match error.severity() {
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}
