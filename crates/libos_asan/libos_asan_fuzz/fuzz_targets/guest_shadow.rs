#![no_main]

use std::sync::{LazyLock, Mutex, MutexGuard};

use libfuzzer_sys::fuzz_target;
use libos_asan::{
    GuestAddr,
    shadow::{GuestShadow, PoisonType, ShadowLayout},
};
use log::{debug, info};

const APP_LEN: usize = 0x10000;
const MAX_LENGTH: usize = 0x3ff;
const GRANULE: usize = 8;

/// Application memory with its shadow, alongside a model recording the
/// accessibility of every byte.
struct Region {
    _app: Vec<u64>,
    _shadow: Vec<u8>,
    base: GuestAddr,
    shadow: GuestShadow,
    model: Vec<bool>,
}

impl Region {
    fn new() -> Region {
        let mut app = vec![0u64; APP_LEN / size_of::<u64>()];
        let mut shadow = vec![0u8; APP_LEN / GRANULE];
        let base = app.as_mut_ptr() as GuestAddr;
        let shadow_base = shadow.as_mut_ptr() as GuestAddr;
        let layout = ShadowLayout::new(
            shadow_base - base / GRANULE,
            ShadowLayout::DEFAULT_SHADOW_SHIFT,
            base / GRANULE + shadow.len(),
        )
        .unwrap();
        Region {
            _app: app,
            _shadow: shadow,
            base,
            shadow: unsafe { GuestShadow::new(layout) },
            model: vec![true; APP_LEN],
        }
    }

    fn reset(&mut self) {
        self.shadow.unpoison(self.base, APP_LEN);
        self.model.iter_mut().for_each(|b| *b = true);
    }

    fn set(&mut self, offset: usize, len: usize, accessible: bool) {
        let end = (offset + len).min(APP_LEN);
        self.model[offset..end]
            .iter_mut()
            .for_each(|b| *b = accessible);
    }

    fn unpoison(&mut self, offset: usize, len: usize) {
        self.shadow.unpoison(self.base + offset, len);
        self.set(offset, len, true);
        let tail = (offset + len) % GRANULE;
        if tail != 0 {
            self.set(offset + len, GRANULE - tail, false);
        }
    }

    fn poison(&mut self, offset: usize, len: usize) {
        self.shadow.poison(self.base + offset, len, PoisonType::HeapFreed);
        self.set(offset, len.next_multiple_of(GRANULE), false);
    }

    fn poison_unaligned(&mut self, offset: usize, len: usize) {
        self.shadow
            .poison_unaligned(self.base + offset, len, PoisonType::AllocaRightRedzone);
        let left = offset.next_multiple_of(GRANULE) - offset;
        if left != 0 {
            let granule = offset - offset % GRANULE;
            self.set(granule, offset - granule, true);
            self.set(offset, left, false);
        }
        self.set(
            offset + left,
            len.saturating_sub(left).next_multiple_of(GRANULE),
            false,
        );
    }

    fn check(&self, offset: usize, len: usize) {
        let expected = self.model[offset..offset + len].iter().any(|b| !b);
        let poisoned = self.shadow.is_poison(self.base + offset, len);
        assert_eq!(expected, poisoned, "offset: {offset:#x}, len: {len:#x}");

        let first = self.model[offset..offset + len]
            .iter()
            .position(|b| !b)
            .map(|i| self.base + offset + i);
        assert_eq!(first, self.shadow.first_poisoned(self.base + offset, len));
    }
}

static REGION: LazyLock<Mutex<Region>> = LazyLock::new(|| {
    env_logger::init();
    Mutex::new(Region::new())
});

fn get_region() -> MutexGuard<'static, Region> {
    REGION.lock().unwrap()
}

fuzz_target!(|data: Vec<GuestAddr>| {
    let mut region = get_region();
    region.reset();

    // Leave room for the rounding applied by each operation.
    let limit = APP_LEN - MAX_LENGTH - 2 * GRANULE;
    for op in data.chunks_exact(3) {
        let offset = op[1] % limit;
        let len = op[2] & MAX_LENGTH;
        let aligned = offset - offset % GRANULE;
        debug!("op: {:#x}, offset: {offset:#x}, len: {len:#x}", op[0] % 4);
        match op[0] % 4 {
            0 => region.unpoison(aligned, len),
            1 => region.poison(aligned, len),
            2 => region.poison_unaligned(offset, len),
            _ => region.check(offset, len),
        }
    }

    info!("ops: {}", data.len() / 3);
    for offset in (0..APP_LEN - MAX_LENGTH).step_by(0x101) {
        region.check(offset, 1);
        region.check(offset, 0x11);
    }
});
