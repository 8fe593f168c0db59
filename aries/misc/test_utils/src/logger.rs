use std::{env, io::Write, sync::Once};

use chrono::{
    format::{DelayedFormat, StrftimeItems},
    Local,
};
use env_logger::{fmt::Formatter, Builder as EnvLoggerBuilder};
use log::{LevelFilter, Record};

use crate::errors::error::{TestUtilsError, TestUtilsResult};

static TEST_LOGGING_INIT: Once = Once::new();

/// Installs the test logger once per process. Does nothing unless `RUST_LOG` is set.
pub fn init_logger() {
    TEST_LOGGING_INIT.call_once(|| {
        if let Ok(pattern) = env::var("RUST_LOG") {
            if let Err(err) = TestLogger::init(Some(pattern)) {
                eprintln!("{err}");
            }
        }
    })
}

#[derive(Debug)]
pub struct TestLogger;

fn timestamp<'a>() -> DelayedFormat<StrftimeItems<'a>> {
    Local::now().format("%Y-%m-%d %H:%M:%S.%f")
}

fn text_format(buf: &mut Formatter, record: &Record<'_>) -> std::io::Result<()> {
    let style = buf.default_level_style(record.level());
    writeln!(
        buf,
        "{}|{style}{:>5}{style:#}|{:<30}|{:>35}:{:<4}| {}",
        timestamp(),
        record.level(),
        record.target(),
        record.file().unwrap_or(""),
        record.line().unwrap_or(0),
        record.args()
    )
}

fn text_no_color_format(buf: &mut Formatter, record: &Record<'_>) -> std::io::Result<()> {
    writeln!(
        buf,
        "{}|{:>5}|{:<30}|{:>35}:{:<4}| {}",
        timestamp(),
        record.level(),
        record.target(),
        record.file().unwrap_or(""),
        record.line().unwrap_or(0),
        record.args()
    )
}

impl TestLogger {
    /// `RUST_LOG_FORMATTER=text_no_color` drops the ANSI level colors.
    pub fn init(pattern: Option<String>) -> TestUtilsResult<()> {
        let pattern = pattern.or(env::var("RUST_LOG").ok());
        let formatter = match env::var("RUST_LOG_FORMATTER").as_deref() {
            Ok("text_no_color") => text_no_color_format,
            _ => text_format,
        };
        EnvLoggerBuilder::new()
            .format(formatter)
            .filter(None, LevelFilter::Off)
            .parse_filters(pattern.as_deref().unwrap_or("warn"))
            .try_init()
            .map_err(|err| TestUtilsError::LoggingError(format!("Cannot init logger: {err:?}")))
    }
}
