mod platform;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use log::LevelFilter;
use tracker_engine::{TaskKind, TaskRef};
use tracker_logging::{tracker_error, tracker_info};

use platform::{JobSource, LoadedConfig, TrackerConfig};

#[derive(Parser, Debug)]
#[command(name = "export-tracker")]
#[command(version, about = "Follow long-running PPTX export jobs from the terminal", long_about = None)]
struct Cli {
    /// RON config file (default: ./export-tracker.ron when present)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Backend base url, overrides the config file
    #[arg(long, value_name = "URL", global = true)]
    base_url: Option<String>,

    /// Bearer token sent with every request
    #[arg(long, value_name = "TOKEN", global = true)]
    token: Option<String>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start an editable PPTX export of a project and follow it
    Export {
        project_id: String,
        /// Name of the generated file
        #[arg(long)]
        filename: Option<String>,
        /// Times to resubmit the export after a failure
        #[arg(long, default_value = "0")]
        retries: u32,
    },
    /// Follow a running PDF to PPTX conversion
    WatchPdf { task_id: String },
    /// Follow a running editable PPTX export
    WatchExport { project_id: String, task_id: String },
    /// Show recently finished jobs
    History {
        #[arg(long, default_value = "20")]
        limit: usize,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let LoadedConfig {
        mut config,
        source: config_source,
    } = match TrackerConfig::load(cli.config.as_deref()) {
        Ok(loaded) => loaded,
        Err(err) => {
            eprintln!("{err:#}");
            return ExitCode::FAILURE;
        }
    };
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url;
    }
    if cli.token.is_some() {
        config.auth_token = cli.token;
    }

    let level = match cli.verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    platform::initialize_logging(config.log_destination, level);
    match &config_source {
        Some(path) => tracker_info!("Loaded config from {:?}", path),
        None => tracker_info!("No config file, using defaults"),
    }

    let (source, retries) = match cli.command {
        Command::History { limit } => return platform::run_history(&config, limit),
        Command::Export {
            project_id,
            filename,
            retries,
        } => (
            JobSource::Export {
                project_id,
                filename,
            },
            retries,
        ),
        Command::WatchPdf { task_id } => {
            (JobSource::Attach(TaskRef::new(TaskKind::PdfToPptx, task_id)), 0)
        }
        Command::WatchExport {
            project_id,
            task_id,
        } => (
            JobSource::Attach(TaskRef::new(TaskKind::EditablePptx { project_id }, task_id)),
            0,
        ),
    };

    match platform::run_job(&config, source, retries) {
        Ok(code) => code,
        Err(err) => {
            tracker_error!("{:#}", err);
            eprintln!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
