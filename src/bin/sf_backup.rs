use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Local};
use clap::Parser;
use log::{error, info};

use sf_backup::config::{self, BackupConfig};
use sf_backup::{BackupError, BackupService, Reporter, SoapSession};

/// Back up every object of a salesforce.com organisation to CSV files
#[derive(Parser, Debug)]
#[command(name = "sf-backup")]
#[command(version)]
#[command(about = "Back up salesforce.com objects to CSV files", long_about = None)]
struct Cli {
    /// Write a sample configuration to FILE and exit
    #[arg(long = "config", value_name = "FILE", conflicts_with = "config_file")]
    sample: Option<PathBuf>,

    /// Configuration of the backup to run
    #[arg(value_name = "CONFIG", required_unless_present = "sample")]
    config_file: Option<PathBuf>,
}

fn fail(message: impl std::fmt::Display) -> ExitCode {
    eprintln!("{}", message);
    ExitCode::FAILURE
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Some(path) = cli.sample {
        return match config::write_sample(&path) {
            Ok(()) => {
                println!("Sample configuration written to {}", path.display());
                ExitCode::SUCCESS
            }
            Err(e) => fail(e),
        };
    }
    let Some(config_path) = cli.config_file else {
        return fail("no configuration file given");
    };

    let config = match BackupConfig::load(&config_path) {
        Ok(config) => config,
        Err(e) => return fail(e),
    };
    config.init_logging();

    let now: DateTime<FixedOffset> = Local::now().into();
    if let Err(e) = config.validate(&now) {
        error!("{}", e);
        return fail(e);
    }
    let reporter = match Reporter::from_config(config.email.as_ref()) {
        Ok(reporter) => reporter,
        Err(e) => return fail(BackupError::from(e)),
    };

    let options = match config.backup_options(&now) {
        Ok(options) => options,
        Err(e) => {
            let e = BackupError::from(e);
            reporter.fatal(&e.to_string()).await;
            return fail(e);
        }
    };
    match &options.since {
        Some(since) => info!("Incremental backup of records changed since {}", since),
        None => info!("Full backup"),
    }

    let session = match SoapSession::login(
        &config.url,
        &config.username,
        &config.login_password(),
        &config.api_version,
    )
    .await
    {
        Ok(session) => session,
        Err(e) => {
            let e = BackupError::Login(e);
            error!("{}", e);
            reporter.fatal(&e.to_string()).await;
            return fail(e);
        }
    };

    let service = BackupService::new(Arc::new(session), options);
    match service.run(reporter).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            fail(e)
        }
    }
}
