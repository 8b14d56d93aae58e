use clap::{Parser, ValueEnum};
use leetbot::core::config::{self, CliOverrides};
use leetbot::tui;
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};
use std::fs::File;
use std::io;
use std::path::Path;

const LOG_FILE: &str = "leetbot.log";

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    #[default]
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Parser)]
#[command(name = "leetbot", about = "Terminal chat client for the Leet coding tutor")]
struct Args {
    /// Chat backend base URL (overrides config file and LEETBOT_BASE_URL)
    #[arg(long)]
    base_url: Option<String>,

    /// Seconds to wait for a reply before giving up
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Verbosity of leetbot.log
    #[arg(long, default_value_t, value_enum)]
    log_level: LogLevel,
}

/// Install the file logger. Fails if the file can't be created or a logger
/// is already installed.
fn init_logging(level: LevelFilter, path: &Path) -> io::Result<()> {
    let log_config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .build();

    let log_file = File::create(path)
        .map_err(|e| io::Error::new(e.kind(), format!("{}: {e}", path.display())))?;
    WriteLogger::init(level, log_config, log_file).map_err(io::Error::other)
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();
    dotenv::dotenv().ok();

    // Still on the normal screen here, so stderr is visible
    if let Err(e) = init_logging(args.log_level.into(), Path::new(LOG_FILE)) {
        eprintln!("leetbot: logging disabled: {e}");
    }

    let file_config = config::load_config().map_err(std::io::Error::other)?;
    let resolved = config::resolve(
        &file_config,
        &CliOverrides {
            base_url: args.base_url,
            timeout_secs: args.timeout,
        },
    );

    log::info!(
        "Leetbot starting up against {} (timeout {:?})",
        resolved.base_url,
        resolved.timeout
    );

    tui::run(resolved)
}
