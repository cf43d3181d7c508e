//! # shadow
//! The shadow memory. [`GuestShadow`] poisons and unpoisons ranges of
//! application memory and validates accesses against the resulting shadow
//! state.
//!
//! The shadow region is shared by every thread of the process without any
//! locking. Individual shadow bytes are accessed with relaxed atomics and
//! bulk updates use the trusted fill from [`crate::mem`], so updates made by
//! a thread are observed by that thread's later accesses in program order,
//! while visibility to other threads is best-effort.
use core::sync::atomic::{AtomicI8, Ordering};

use log::trace;

use crate::{GuestAddr, mem};

pub mod layout;

pub mod poison;

pub use layout::{ShadowLayout, ShadowLayoutError};
pub use poison::{PoisonType, ShadowByte};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuestShadow {
    layout: ShadowLayout,
}

impl GuestShadow {
    /// # Safety
    /// The whole of `layout.shadow_range()` must be mapped readable and
    /// writeable for as long as the returned value (or any copy of it) is
    /// used.
    pub const unsafe fn new(layout: ShadowLayout) -> GuestShadow {
        GuestShadow { layout }
    }

    #[inline]
    pub const fn layout(&self) -> &ShadowLayout {
        &self.layout
    }

    /// Reads the shadow byte stored at the shadow address `shadow`
    #[inline]
    pub fn load_shadow(&self, shadow: GuestAddr) -> i8 {
        unsafe { AtomicI8::from_ptr(shadow as *mut i8) }.load(Ordering::Relaxed)
    }

    #[inline]
    fn store_shadow(&self, shadow: GuestAddr, value: i8) {
        unsafe { AtomicI8::from_ptr(shadow as *mut i8) }.store(value, Ordering::Relaxed);
    }

    /// Reads the shadow byte describing the granule containing `addr`
    #[inline]
    pub fn shadow_value(&self, addr: GuestAddr) -> i8 {
        self.load_shadow(self.layout.to_shadow(addr))
    }

    pub fn shadow_byte(&self, addr: GuestAddr) -> ShadowByte {
        ShadowByte::decode(self.shadow_value(addr), self.layout.granule_size())
    }

    /// Poisons `[start, start + len)` with `val`. `start` must be granule
    /// aligned, `len` is rounded up to a whole number of granules.
    pub fn poison(&self, start: GuestAddr, len: usize, val: PoisonType) {
        self.poison_raw(start, len, val.as_shadow());
    }

    /// As [`GuestShadow::poison`], but writes an arbitrary shadow value
    pub fn poison_raw(&self, start: GuestAddr, len: usize, value: i8) {
        trace!("poison - start: {start:#x}, len: {len:#x}, value: {value:#x}");
        assert!(
            self.layout.is_aligned(start),
            "poison - unaligned start: {start:#x}"
        );
        let shadow = self.layout.to_shadow(start);
        let shadow_len = self.layout.shadow_len(len);
        unsafe { mem::memset(shadow as *mut u8, value as u8, shadow_len) };
    }

    /// Poisons a range which need not begin on a granule boundary. The
    /// granule containing `start` records how many of its bytes remain
    /// accessible before `start`, the rest of the range is poisoned from the
    /// next granule boundary onwards.
    pub fn poison_unaligned(&self, start: GuestAddr, len: usize, val: PoisonType) {
        trace!("poison_unaligned - start: {start:#x}, len: {len:#x}, poison: {val:?}");
        let aligned = self.layout.align_up(start);
        let left = aligned - start;
        if left != 0 {
            let shadow = self.layout.to_shadow(aligned).wrapping_sub(1);
            let accessible = self.layout.granule_size() - left;
            self.store_shadow(shadow, accessible as i8);
        }
        self.poison_raw(aligned, len.saturating_sub(left), val.as_shadow());
    }

    /// Marks exactly `len` bytes from `start` as accessible. `start` must be
    /// granule aligned. When `len` is not a whole number of granules, the
    /// trailing granule records how many of its bytes are accessible.
    pub fn unpoison(&self, start: GuestAddr, len: usize) {
        trace!("unpoison - start: {start:#x}, len: {len:#x}");
        assert!(
            self.layout.is_aligned(start),
            "unpoison - unaligned start: {start:#x}"
        );
        let shadow = self.layout.to_shadow(start);
        let full = len >> self.layout.shift();
        let tail = self.layout.granule_offset(len);
        unsafe { mem::memset(shadow as *mut u8, 0, full) };
        if tail != 0 {
            self.store_shadow(shadow.wrapping_add(full), tail as i8);
        }
    }

    /// Whether the byte at `addr` is inaccessible
    #[inline]
    pub fn is_poison_byte(&self, addr: GuestAddr) -> bool {
        let value = self.shadow_value(addr);
        !ShadowByte::is_accessible_at(value, self.layout.granule_offset(addr))
    }

    /// Whether any byte of `[start, start + len)` is inaccessible. The first
    /// and last bytes are checked directly, which settles every access
    /// falling within a single granule. Otherwise the shadow bytes of every
    /// granule before the last must be zero.
    pub fn is_poison(&self, start: GuestAddr, len: usize) -> bool {
        if len == 0 {
            return false;
        }

        let Some(last) = start.checked_add(len - 1) else {
            return true;
        };

        if self.is_poison_byte(start) {
            return true;
        }

        if len > 1 && self.is_poison_byte(last) {
            return true;
        }

        let first_shadow = self.layout.to_shadow(start);
        let last_shadow = self.layout.to_shadow(last);
        (first_shadow..last_shadow).any(|shadow| self.load_shadow(shadow) != 0)
    }

    /// The first inaccessible byte of `[start, start + len)`, found by a
    /// linear scan. Bytes without a shadow byte count as inaccessible.
    pub fn first_poisoned(&self, start: GuestAddr, len: usize) -> Option<GuestAddr> {
        let end = start.saturating_add(len);
        (start..end).find(|addr| {
            !self.layout.contains_shadow(self.layout.to_shadow(*addr)) || self.is_poison_byte(*addr)
        })
    }
}
