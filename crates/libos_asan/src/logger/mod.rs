//! # logger
//! This module provides `log` backends which write to stderr without
//! allocating, suitable for environments without a Rust standard library.
//! Each record is formatted into a fixed size [`LineBuffer`], records longer
//! than a line are split.
use core::fmt::Write;

use log::Record;

use crate::report::{buffer::LineBuffer, sink::LineSink};

#[cfg(feature = "libc")]
pub mod libc;

#[cfg(all(feature = "linux", target_os = "linux"))]
pub mod linux;

#[cfg(any(test, feature = "libc", all(feature = "linux", target_os = "linux")))]
fn write_record<S: LineSink>(sink: &S, record: &Record) {
    let mut buf = LineBuffer::new(sink);
    let _ = write!(
        buf,
        "{} [{}]: {}",
        record.metadata().level(),
        record.metadata().target(),
        record.args()
    );
    buf.flush();
}
