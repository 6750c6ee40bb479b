use clap::Parser;
use direct_upload::debug_logger::DebugLogger;
use direct_upload::logging::init_logging;
use direct_upload::{FormBinding, SelectedFile, UploadCoordinator, UploaderConfig};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

/// Upload a file to object storage through a signed POST policy
#[derive(Debug, Parser)]
#[command(name = "direct-upload", version, about)]
struct Cli {
    /// File to upload
    file: PathBuf,

    /// Signing endpoint; overrides config and environment
    #[arg(long)]
    signing_url: Option<String>,

    /// MIME type to declare instead of guessing from the extension
    #[arg(long)]
    mime: Option<String>,

    /// Reject files of this many bytes or more
    #[arg(long)]
    max_size: Option<u64>,

    /// Read configuration from this JSON file instead of the default location
    #[arg(long)]
    config: Option<PathBuf>,

    /// Emit JSON logs on stderr
    #[arg(long)]
    json_logs: bool,

    /// Write a debug report to the logs directory when done
    #[arg(long)]
    save_report: bool,

    /// Store the effective configuration in the config directory
    #[arg(long)]
    save_config: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let _log_guard = match init_logging(cli.json_logs) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{}", e);
            None
        }
    };

    let loaded = match &cli.config {
        Some(path) => UploaderConfig::load_from(path),
        None => UploaderConfig::load(),
    };
    let mut config = match loaded {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Some(url) = cli.signing_url {
        config.signing_url = url;
    }
    if let Some(max_size) = cli.max_size {
        config.max_file_size_bytes = max_size;
    }

    if cli.save_config {
        match config.save() {
            Ok(path) => tracing::info!("Configuration saved to {}", path.display()),
            Err(e) => tracing::warn!("{}", e),
        }
    }

    let logger = Arc::new(DebugLogger::new());
    let coordinator = UploadCoordinator::from_config(&config, Arc::clone(&logger));
    let binding = FormBinding::from_config(&coordinator, &config);

    // An unreadable path counts as no selection
    let file = match SelectedFile::from_path(&cli.file, cli.mime.as_deref()).await {
        Ok(file) => Some(file),
        Err(e) => {
            logger.warn(e);
            None
        }
    };

    let outcome = coordinator.select_file(file).await;
    let view = binding.detach().await;

    if cli.save_report {
        match logger.save_report_to_file(Some(config.signing_url.clone())) {
            Ok(path) => tracing::info!("Debug report written to {}", path.display()),
            Err(e) => tracing::warn!("{}", e),
        }
    }

    match outcome.public_url() {
        Some(url) => {
            tracing::info!(input = %view.url_input.name, "Form input set to {}", url);
            println!("{}", url);
            ExitCode::SUCCESS
        }
        None => {
            let reason = outcome.reason().unwrap_or_default().to_string();
            eprintln!("{}", view.alert.unwrap_or(reason));
            ExitCode::FAILURE
        }
    }
}
