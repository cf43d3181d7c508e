//! # buffer
//! A fixed capacity line buffer. Report lines are formatted into it through
//! [`core::fmt::Write`] and handed to the sink one line at a time, without
//! requiring an allocator.
use core::fmt;

use heapless::String;

use crate::report::sink::LineSink;

pub const LINE_CAPACITY: usize = 256;

pub struct LineBuffer<'a, S: LineSink> {
    sink: &'a S,
    line: String<LINE_CAPACITY>,
}

impl<'a, S: LineSink> LineBuffer<'a, S> {
    pub fn new(sink: &'a S) -> LineBuffer<'a, S> {
        LineBuffer {
            sink,
            line: String::new(),
        }
    }

    /// Passes the buffered line to the sink, even when it is empty
    pub fn flush(&mut self) {
        self.sink.write_line(self.line.as_str());
        self.line.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.line.is_empty()
    }
}

impl<S: LineSink> fmt::Write for LineBuffer<'_, S> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        if self.line.push_str(s).is_ok() {
            return Ok(());
        }

        // Overlong lines are split rather than truncated.
        for c in s.chars() {
            if self.line.push(c).is_err() {
                self.flush();
                self.line.push(c).map_err(|_| fmt::Error)?;
            }
        }
        Ok(())
    }
}
