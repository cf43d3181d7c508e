//! # sink
//! The destination of the lines making up a report. The runtime only
//! assembles lines, persisting them is left to the sink.
use log::error;

#[cfg_attr(test, mockall::automock)]
pub trait LineSink {
    fn write_line(&self, line: &str);
}

/// Forwards each line to the `log` facade at the error level, see
/// [`crate::logger`] for backends suited to freestanding environments.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl LineSink for LogSink {
    fn write_line(&self, line: &str) {
        error!("{line}");
    }
}
