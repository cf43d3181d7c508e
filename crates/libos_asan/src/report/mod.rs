//! # report
//! Rendering of the diagnostic emitted when an invalid access is detected.
//! A report looks like this:
//!
//! ```text
//! asan: trying to load 4 bytes at 0x10000001c, IP = 0x55555555a0e4
//! asan: (for a full traceback, run GDB and set a breakpoint for "abort")
//! asan: the bad address is 0x10000001c (0 from beginning)
//! asan: the shadow byte there is fd (freed heap region)
//! asan:
//! asan: 0xffffff00  00 00 00 ...
//! ...
//! asan: 0x100000000  00 00 00[fd]fd fd ...
//! ...
//! asan:
//! asan: shadow byte legend (1 shadow byte = 8 application bytes):
//! asan:           addressable: 00
//! ...
//! ```
//!
//! Producing the report never terminates the process, that is left to the
//! caller (see [`crate::runtime::Asan::report`]).
use core::fmt::{self, Display, Write};

use crate::{
    GuestAddr,
    shadow::{GuestShadow, PoisonType, ShadowByte},
};

pub mod buffer;

pub mod sink;

use buffer::LineBuffer;
use sink::LineSink;

const PREFIX: &str = "asan: ";
const LEGEND_WIDTH: usize = 22;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessKind {
    Load,
    Store,
}

impl Display for AccessKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessKind::Load => f.write_str("load"),
            AccessKind::Store => f.write_str("store"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Violation {
    pub ip: Option<GuestAddr>,
    pub addr: GuestAddr,
    pub size: usize,
    pub kind: AccessKind,
    /// The first inaccessible byte of the access, or the end of the access
    /// when none of its bytes are poisoned.
    pub bad_addr: GuestAddr,
}

impl Violation {
    pub fn locate(
        shadow: &GuestShadow,
        ip: Option<GuestAddr>,
        addr: GuestAddr,
        size: usize,
        kind: AccessKind,
    ) -> Violation {
        let bad_addr = shadow
            .first_poisoned(addr, size)
            .unwrap_or(addr.saturating_add(size));
        Violation {
            ip,
            addr,
            size,
            kind,
            bad_addr,
        }
    }

    pub fn offset(&self) -> usize {
        self.bad_addr - self.addr
    }
}

/// The shape of the shadow dump, `lines` rows of `width` shadow bytes are
/// printed either side of the row holding the faulting byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportGeometry {
    pub width: usize,
    pub lines: usize,
}

impl ReportGeometry {
    pub const DEFAULT_WIDTH: usize = 16;
    pub const DEFAULT_LINES: usize = 4;
}

impl Default for ReportGeometry {
    fn default() -> Self {
        ReportGeometry {
            width: Self::DEFAULT_WIDTH,
            lines: Self::DEFAULT_LINES,
        }
    }
}

struct InstructionPointer(Option<GuestAddr>);

impl Display for InstructionPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(ip) => write!(f, "{ip:#x}"),
            None => f.write_str("unknown"),
        }
    }
}

/// A legend label, right aligned including its trailing colon
struct Label(&'static str);

impl Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for _ in self.0.len() + 1..LEGEND_WIDTH {
            f.write_char(' ')?;
        }
        write!(f, "{}:", self.0)
    }
}

pub struct Reporter<'a, S: LineSink> {
    shadow: &'a GuestShadow,
    sink: &'a S,
    geometry: ReportGeometry,
    abort_name: &'static str,
}

impl<'a, S: LineSink> Reporter<'a, S> {
    pub fn new(
        shadow: &'a GuestShadow,
        sink: &'a S,
        geometry: ReportGeometry,
        abort_name: &'static str,
    ) -> Reporter<'a, S> {
        Reporter {
            shadow,
            sink,
            geometry,
            abort_name,
        }
    }

    pub fn emit(&self, violation: &Violation) {
        let mut buf = LineBuffer::new(self.sink);
        // Writes into the buffer cannot fail, overlong lines are split.
        let _ = self.write_report(&mut buf, violation);
    }

    fn write_report(&self, buf: &mut LineBuffer<'_, S>, v: &Violation) -> fmt::Result {
        let layout = self.shadow.layout();

        write!(
            buf,
            "{PREFIX}trying to {} {} bytes at {:#x}, IP = {}",
            v.kind,
            v.size,
            v.addr,
            InstructionPointer(v.ip)
        )?;
        buf.flush();

        write!(
            buf,
            "{PREFIX}(for a full traceback, run GDB and set a breakpoint for \"{}\")",
            self.abort_name
        )?;
        buf.flush();

        write!(
            buf,
            "{PREFIX}the bad address is {:#x} ({} from beginning)",
            v.bad_addr,
            v.offset()
        )?;
        buf.flush();

        let bad_shadow = layout.to_shadow(v.bad_addr);
        if layout.contains_shadow(bad_shadow) {
            let value = self.shadow.load_shadow(bad_shadow);
            let byte = ShadowByte::decode(value, layout.granule_size());
            write!(
                buf,
                "{PREFIX}the shadow byte there is {:02x} ({})",
                value as u8,
                byte.describe()
            )?;
            buf.flush();
        }

        self.write_separator(buf)?;
        self.write_dump(buf, bad_shadow)?;
        self.write_separator(buf)?;
        self.write_legend(buf)
    }

    fn write_separator(&self, buf: &mut LineBuffer<'_, S>) -> fmt::Result {
        buf.write_str(PREFIX.trim_end())?;
        buf.flush();
        Ok(())
    }

    fn write_dump(&self, buf: &mut LineBuffer<'_, S>, bad_shadow: GuestAddr) -> fmt::Result {
        let layout = self.shadow.layout();
        let width = self.geometry.width;
        let first = (bad_shadow - bad_shadow % width).wrapping_sub(width * self.geometry.lines);
        let rows = self.geometry.lines * 2 + 1;

        for row in (0..rows).map(|i| first.wrapping_add(i * width)) {
            let last = row.wrapping_add(width - 1);
            if !layout.contains_shadow(row) || !layout.contains_shadow(last) {
                continue;
            }

            write!(buf, "{PREFIX}{:#x} ", layout.to_app(row))?;
            for shadow in row..=last {
                let value = self.shadow.load_shadow(shadow) as u8;
                if shadow == bad_shadow {
                    write!(buf, "[{value:02x}]")?;
                } else if shadow == bad_shadow.wrapping_add(1) {
                    write!(buf, "{value:02x}")?;
                } else {
                    write!(buf, " {value:02x}")?;
                }
            }
            buf.flush();
        }
        Ok(())
    }

    fn write_legend(&self, buf: &mut LineBuffer<'_, S>) -> fmt::Result {
        let granule = self.shadow.layout().granule_size();
        write!(
            buf,
            "{PREFIX}shadow byte legend (1 shadow byte = {granule} application bytes):"
        )?;
        buf.flush();

        write!(buf, "{PREFIX}{} 00", Label("addressable"))?;
        buf.flush();

        write!(
            buf,
            "{PREFIX}{} {:02x}..{:02x}",
            Label("partially addressable"),
            1,
            granule - 1
        )?;
        buf.flush();

        for poison in PoisonType::ALL {
            write!(
                buf,
                "{PREFIX}{} {:02x}",
                Label(poison.name()),
                u8::from(poison)
            )?;
            buf.flush();
        }
        Ok(())
    }
}
