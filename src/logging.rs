use log::LevelFilter;
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::append::file::FileAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use log4rs::Handle;
use thiserror::Error;

const LOG_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S)} - {l} - {m}{n}";

/// Sets up the log4rs logger with a console appender and an optional file appender
///
/// # Arguments
///
/// * 'log_path' - path to the log file, no file logging if None
/// * 'level' - maximum log level
/// * 'log_to_stdout' - whether to log to stdout
pub fn setup_logger(log_path: Option<&str>, level: LevelFilter, log_to_stdout: bool) -> Result<Handle, LoggerError> {
    let mut builder = Config::builder();
    let mut root = Root::builder();

    if log_to_stdout {
        let stdout = ConsoleAppender::builder()
            .target(Target::Stdout)
            .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
            .build();
        builder = builder.appender(Appender::builder().build("stdout", Box::new(stdout)));
        root = root.appender("stdout");
    }

    if let Some(path) = log_path {
        let file = FileAppender::builder()
            .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
            .build(path)
            .map_err(|e| LoggerError(format!("file appender {}: {}", path, e)))?;
        builder = builder.appender(Appender::builder().build("file", Box::new(file)));
        root = root.appender("file");
    }

    let config = builder
        .build(root.build(level))
        .map_err(|e| LoggerError(e.to_string()))?;

    log4rs::init_config(config).map_err(|e| LoggerError(e.to_string()))
}

/// Error depicting errors that occur while setting up the logger
///
#[derive(Debug, Error)]
#[error("LoggerError: {0}")]
pub struct LoggerError(pub String);
