use colored::{ColoredString, Colorize};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};

/// Colored logger writing to stderr
///
/// The level is read from [`log::max_level`] so it can be raised once the
/// configuration file has been loaded.
pub struct Logger;

impl Logger {
    pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_max_level(level);
        log::set_boxed_logger(Box::new(Self))
    }

    /// Make the logger at least as verbose as `level`
    pub fn raise_level(level: LevelFilter) {
        if level > log::max_level() {
            log::set_max_level(level);
        }
    }
}

fn colorize(level: Level, msg: &str) -> ColoredString {
    match level {
        Level::Error => msg.bright_red(),
        Level::Warn => msg.bright_yellow(),
        Level::Info => msg.bright_blue(),
        Level::Debug => msg.bright_magenta(),
        Level::Trace => msg.bright_black(),
    }
}

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let msg = record.args().to_string();

        // Error chains and tables span several lines, each one is colored on its own
        let lines = msg
            .lines()
            .map(|line| colorize(record.level(), line).to_string())
            .collect::<Vec<_>>();

        eprintln!("{}", lines.join("\n"));
    }

    fn flush(&self) {}
}
