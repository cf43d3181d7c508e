use core::ffi::c_void;

use libc::{STDERR_FILENO, size_t};
use log::{Level, Log, Metadata, Record, SetLoggerError};
use spin::Once;

use crate::{logger::write_record, report::sink::LineSink};

static ONCE: Once<LibcLogger> = Once::new();

/// Writes lines to stderr through `libc::write`
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrSink;

impl StderrSink {
    fn write_bytes(buf: &[u8]) {
        unsafe { libc::write(STDERR_FILENO, buf.as_ptr() as *const c_void, buf.len() as size_t) };
    }
}

impl LineSink for StderrSink {
    fn write_line(&self, line: &str) {
        Self::write_bytes(line.as_bytes());
        Self::write_bytes(b"\n");
    }
}

pub struct LibcLogger {
    level: Level,
}

impl LibcLogger {
    /// Installs the logger. Only the level passed on the first call is
    /// honoured, installation fails if another logger is already in use.
    pub fn initialize(level: Level) -> Result<(), SetLoggerError> {
        let logger = ONCE.call_once(|| LibcLogger { level });
        log::set_logger(logger)?;
        log::set_max_level(logger.level.to_level_filter());
        Ok(())
    }
}

impl Log for LibcLogger {
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
