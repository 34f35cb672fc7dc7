use clap::Parser;
use scrape_export::utils::logger;
use scrape_export::{
    CliConfig, ExportCoordinator, ExportEngine, ExportError, JsonFileSource, LocalStorage,
};
use std::process::ExitCode;

const EXIT_EXPORT_FAILED: u8 = 1;
const EXIT_BAD_CONFIG: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = CliConfig::parse();

    let settings = match cli.resolve() {
        Ok(settings) => settings,
        Err(e) => {
            logger::init_cli_logger(cli.verbose);
            return report_error(&e);
        }
    };

    if settings.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }
    tracing::debug!("Resolved settings: {:?}", settings);

    let mut source = JsonFileSource::new(&settings.input);
    if let Some(fields) = &settings.fields {
        source = source.with_schema(fields.clone());
    }

    let coordinator = ExportCoordinator::new(settings, LocalStorage::new());
    let engine = ExportEngine::new(source, coordinator);

    match engine.run().await {
        Ok(report) => {
            for result in &report.results {
                println!("{}", result);
            }

            if report.is_success() {
                tracing::info!("✅ Export completed successfully");
                ExitCode::SUCCESS
            } else {
                for (format, error) in report.failures() {
                    eprintln!("❌ {}: {}", format, error.user_friendly_message());
                    eprintln!("💡 {}", error.recovery_suggestion());
                }
                ExitCode::from(EXIT_EXPORT_FAILED)
            }
        }
        Err(e) => report_error(&e),
    }
}

fn report_error(e: &ExportError) -> ExitCode {
    tracing::error!("❌ Export aborted: {} (Kind: {})", e, e.kind());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    if e.is_config_error() {
        ExitCode::from(EXIT_BAD_CONFIG)
    } else {
        ExitCode::from(EXIT_EXPORT_FAILED)
    }
}
