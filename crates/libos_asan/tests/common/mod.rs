#![allow(dead_code)]
use std::{
    panic::{AssertUnwindSafe, catch_unwind},
    sync::Mutex,
};

use libos_asan::{
    Asan, GuestAddr,
    config::AsanConfig,
    exit::Abort,
    report::sink::LineSink,
    shadow::{GuestShadow, ShadowLayout},
};
use spin::Lazy;

pub const APP_LEN: usize = 0x4000;
const SHADOW_PAD: usize = 0x400;

/// Shadow bytes of [`Env::low`], covering application addresses `0..0x800`
pub const LOW_SHADOW_LEN: usize = 0x100;

static INIT_ONCE: Lazy<()> = Lazy::new(|| {
    let _ = env_logger::builder().is_test(true).try_init();
});

/// Unwinds instead of terminating, so that tests can observe a report
pub struct PanicAbort;

impl Abort for PanicAbort {
    const NAME: &'static str = "test_abort";

    fn abort() -> ! {
        panic!("asan abort");
    }
}

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

pub type TestAsan = Asan<RecordingSink, PanicAbort>;

/// Application memory and its shadow, both backed by heap buffers
pub struct Env {
    _app: Vec<u64>,
    _shadow: Vec<u8>,
    base: GuestAddr,
    pub asan: TestAsan,
}

impl Env {
    pub fn new() -> Env {
        Lazy::force(&INIT_ONCE);
        let mut app = vec![0u64; APP_LEN / size_of::<u64>()];
        let mut shadow = vec![0u8; (APP_LEN >> 3) + 2 * SHADOW_PAD];
        let base = app.as_mut_ptr() as GuestAddr;
        let shadow_base = shadow.as_mut_ptr() as GuestAddr + SHADOW_PAD;
        let config = AsanConfig::builder()
            .shadow_start(shadow_base - (base >> 3))
            .shadow_length((base >> 3) + shadow.len() - SHADOW_PAD)
            .build();
        let asan = unsafe { TestAsan::new(&config, RecordingSink::default()) }.unwrap();
        Env {
            _app: app,
            _shadow: shadow,
            base,
            asan,
        }
    }

    /// A shadow describing the bottom of the address space, starting at
    /// the shadow byte of the null page. Only the shadow is backed, the
    /// application addresses must never be dereferenced.
    pub fn low() -> Env {
        Lazy::force(&INIT_ONCE);
        // Report rows start at shadow addresses aligned to their width.
        let mut shadow = vec![0u8; LOW_SHADOW_LEN + 0x10];
        let start = (shadow.as_mut_ptr() as GuestAddr + 0xf) & !0xf;
        let config = AsanConfig::builder()
            .shadow_start(start)
            .shadow_length(LOW_SHADOW_LEN)
            .build();
        let asan = unsafe { TestAsan::new(&config, RecordingSink::default()) }.unwrap();
        Env {
            _app: Vec::new(),
            _shadow: shadow,
            base: 0,
            asan,
        }
    }

    pub fn shadow(&self) -> &GuestShadow {
        self.asan.shadow()
    }

    pub fn layout(&self) -> &ShadowLayout {
        self.asan.shadow().layout()
    }

    pub fn addr(&self, offset: usize) -> GuestAddr {
        assert!(offset < APP_LEN);
        self.base + offset
    }

    /// An address within the application memory, aligned to `align`
    pub fn aligned_addr(&self, offset: usize, align: usize) -> GuestAddr {
        let addr = (self.addr(offset) + align - 1) & !(align - 1);
        assert!(addr < self.base + APP_LEN);
        addr
    }

    pub fn fill(&self, addr: GuestAddr, len: usize, value: u8) {
        unsafe { std::ptr::write_bytes(addr as *mut u8, value, len) };
    }

    pub fn bytes(&self, addr: GuestAddr, len: usize) -> Vec<u8> {
        unsafe { std::slice::from_raw_parts(addr as *const u8, len) }.to_vec()
    }

    pub fn lines(&self) -> Vec<String> {
        self.asan.sink().lines()
    }

    /// The hex dump rows of a report
    pub fn dump_rows(lines: &[String]) -> Vec<&String> {
        lines.iter().filter(|l| l.starts_with("asan: 0x")).collect()
    }

    /// Runs `f`, which must report a violation, returning the report
    pub fn expect_violation<F: FnOnce(&TestAsan)>(&self, f: F) -> Vec<String> {
        let before = self.lines().len();
        let result = catch_unwind(AssertUnwindSafe(|| f(&self.asan)));
        assert!(result.is_err(), "no violation reported");
        self.lines().split_off(before)
    }
}
