use chrono::Local;
use log::LevelFilter;
use std::path::Path;

use log4rs::append::console::ConsoleAppender;
use log4rs::append::file::FileAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;

use crate::error::{Error, Result};

/// Initialize console plus per-run file logging and return the run id.
/// The run id names both the log file and the manifest, so one run's
/// artifacts sort together.
pub fn init(log_dir: &Path, verbose: bool) -> Result<String> {
    std::fs::create_dir_all(log_dir)?;

    let run_id = format!("photo-curator_{}", Local::now().format("%Y%m%d_%H%M%S"));
    let log_path = log_dir.join(format!("{}.log", run_id));

    let console = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new("{h({l})} {m}{n}")))
        .build();

    let file = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S)} [{l}] [{M}] {m}{n}",
        )))
        .build(&log_path)
        .map_err(|e| {
            Error::Configuration(format!("cannot open log file {}: {}", log_path.display(), e))
        })?;

    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let config = Config::builder()
        .appender(Appender::builder().build("console", Box::new(console)))
        .appender(Appender::builder().build("file", Box::new(file)))
        .build(
            Root::builder()
                .appender("console")
                .appender("file")
                .build(level),
        )
        .map_err(|e| Error::Configuration(format!("cannot build log config: {}", e)))?;

    log4rs::init_config(config)
        .map_err(|e| Error::Configuration(format!("cannot initialise logging: {}", e)))?;

    Ok(run_id)
}
