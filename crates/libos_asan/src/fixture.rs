//! # fixture
//! A small shadow region backed by heap buffers, used by the unit tests in
//! place of the real shadow mapping.

use std::sync::Mutex;

use crate::{
    GuestAddr,
    report::sink::LineSink,
    shadow::{GuestShadow, ShadowLayout},
};

pub const APP_LEN: usize = 0x4000;
const SHADOW_PAD: usize = 0x400;

pub struct Fixture {
    _app: Vec<u64>,
    _shadow: Vec<u8>,
    app_base: GuestAddr,
    layout: ShadowLayout,
}

impl Fixture {
    pub fn new() -> Fixture {
        let mut app = vec![0u64; APP_LEN / size_of::<u64>()];
        let mut shadow = vec![0u8; (APP_LEN >> ShadowLayout::DEFAULT_SHADOW_SHIFT) + 2 * SHADOW_PAD];
        let app_base = app.as_mut_ptr() as GuestAddr;
        let shadow_base = shadow.as_mut_ptr() as GuestAddr + SHADOW_PAD;
        let start = shadow_base - (app_base >> ShadowLayout::DEFAULT_SHADOW_SHIFT);
        let length = (app_base >> ShadowLayout::DEFAULT_SHADOW_SHIFT) + shadow.len() - SHADOW_PAD;
        let layout =
            ShadowLayout::new(start, ShadowLayout::DEFAULT_SHADOW_SHIFT, length).unwrap();
        Fixture {
            _app: app,
            _shadow: shadow,
            app_base,
            layout,
        }
    }

    pub fn layout(&self) -> ShadowLayout {
        self.layout
    }

    pub fn shadow(&self) -> GuestShadow {
        unsafe { GuestShadow::new(self.layout) }
    }

    pub fn addr(&self, offset: usize) -> GuestAddr {
        assert!(offset < APP_LEN);
        self.app_base + offset
    }
}

/// Collects report lines for later inspection
#[derive(Default)]
pub struct RecordingSink {
    lines: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }
}

impl LineSink for RecordingSink {
    fn write_line(&self, line: &str) {
        self.lines.lock().unwrap().push(line.to_string());
    }
}
