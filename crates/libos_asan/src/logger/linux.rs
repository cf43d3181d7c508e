use log::{Level, Log, Metadata, Record, SetLoggerError};
use rustix::{io::write, stdio::stderr};
use spin::Once;

use crate::{logger::write_record, report::sink::LineSink};

static ONCE: Once<LinuxLogger> = Once::new();

/// Writes lines to stderr using raw syscalls
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrSink;

impl LineSink for StderrSink {
    fn write_line(&self, line: &str) {
        #[allow(unused_unsafe)]
        let fd = unsafe { stderr() };
        let _ = write(fd, line.as_bytes());
        let _ = write(fd, b"\n");
    }
}

pub struct LinuxLogger {
    level: Level,
}

impl LinuxLogger {
    /// Installs the logger. Only the level passed on the first call is
    /// honoured, installation fails if another logger is already in use.
    pub fn initialize(level: Level) -> Result<(), SetLoggerError> {
        let logger = ONCE.call_once(|| LinuxLogger { level });
        log::set_logger(logger)?;
        log::set_max_level(logger.level.to_level_filter());
        Ok(())
    }
}

impl Log for LinuxLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.level >= metadata.level()
    }

    fn flush(&self) {}

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            write_record(&StderrSink, record);
        }
    }
}
