//! # layout
//! Pure address arithmetic translating between an application address and
//! the shadow byte which describes the granule containing it:
//!
//! ```text
//! shadow = (addr >> shift) + start
//! addr   = (shadow - start) << shift
//! ```
//!
//! The layout performs no validation of the addresses it is given, an
//! unaligned input to [`ShadowLayout::to_app`] is a bug in the caller.
use core::ops::Range;

use thiserror::Error;

use crate::GuestAddr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShadowLayout {
    start: GuestAddr,
    shift: u32,
    length: usize,
}

impl ShadowLayout {
    /// The default used by the compiler for x86_64, it may be changed with
    /// `-mllvm -asan-mapping-offset=0x...`
    #[cfg(target_pointer_width = "64")]
    pub const DEFAULT_SHADOW_START: GuestAddr = 0x7fff8000;

    #[cfg(target_pointer_width = "64")]
    pub const DEFAULT_SHADOW_LENGTH: usize = 1 << 44;

    #[cfg(target_pointer_width = "32")]
    pub const DEFAULT_SHADOW_START: GuestAddr = 0x20000000;

    #[cfg(target_pointer_width = "32")]
    pub const DEFAULT_SHADOW_LENGTH: usize = 1 << 29;

    pub const DEFAULT_SHADOW_SHIFT: u32 = 3;

    /// Partially addressable granules store the number of accessible bytes
    /// as a positive `i8`, so granules may not exceed 128 bytes.
    pub const MIN_SHADOW_SHIFT: u32 = 3;
    pub const MAX_SHADOW_SHIFT: u32 = 7;

    pub const DEFAULT: ShadowLayout = ShadowLayout {
        start: Self::DEFAULT_SHADOW_START,
        shift: Self::DEFAULT_SHADOW_SHIFT,
        length: Self::DEFAULT_SHADOW_LENGTH,
    };

    pub fn new(
        start: GuestAddr,
        shift: u32,
        length: usize,
    ) -> Result<ShadowLayout, ShadowLayoutError> {
        if !(Self::MIN_SHADOW_SHIFT..=Self::MAX_SHADOW_SHIFT).contains(&shift) {
            Err(ShadowLayoutError::InvalidShift(shift))?;
        }

        if length == 0 {
            Err(ShadowLayoutError::EmptyShadow)?;
        }

        if start.checked_add(length).is_none() {
            Err(ShadowLayoutError::ShadowOverflow(start, length))?;
        }

        Ok(ShadowLayout {
            start,
            shift,
            length,
        })
    }

    #[inline]
    pub const fn start(&self) -> GuestAddr {
        self.start
    }

    #[inline]
    pub const fn shift(&self) -> u32 {
        self.shift
    }

    #[inline]
    pub const fn length(&self) -> usize {
        self.length
    }

    /// The number of application bytes described by one shadow byte
    #[inline]
    pub const fn granule_size(&self) -> usize {
        1 << self.shift
    }

    #[inline]
    pub const fn granule_mask(&self) -> usize {
        self.granule_size() - 1
    }

    #[inline]
    pub const fn granule_offset(&self, addr: GuestAddr) -> usize {
        addr & self.granule_mask()
    }

    #[inline]
    pub const fn is_aligned(&self, addr: GuestAddr) -> bool {
        self.granule_offset(addr) == 0
    }

    #[inline]
    pub const fn align_down(&self, addr: GuestAddr) -> GuestAddr {
        addr & !self.granule_mask()
    }

    #[inline]
    pub fn align_up(&self, addr: GuestAddr) -> GuestAddr {
        assert!(addr <= GuestAddr::MAX - self.granule_mask());
        self.align_down(addr + self.granule_mask())
    }

    /// The number of shadow bytes covering `len` application bytes, counting
    /// a trailing partial granule.
    #[inline]
    pub fn shadow_len(&self, len: usize) -> usize {
        self.align_up(len) >> self.shift
    }

    #[inline]
    pub const fn to_shadow(&self, addr: GuestAddr) -> GuestAddr {
        (addr >> self.shift).wrapping_add(self.start)
    }

    #[inline]
    pub const fn to_app(&self, shadow: GuestAddr) -> GuestAddr {
        shadow.wrapping_sub(self.start) << self.shift
    }

    /// The range which the embedding environment must map (read/write, not
    /// backed by swap, at exactly this address) before the runtime is used.
    pub const fn shadow_range(&self) -> Range<GuestAddr> {
        self.start..self.start + self.length
    }

    pub fn contains_shadow(&self, shadow: GuestAddr) -> bool {
        self.shadow_range().contains(&shadow)
    }
}

impl Default for ShadowLayout {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[derive(Error, Debug, PartialEq, Eq, Clone, Copy)]
pub enum ShadowLayoutError {
    #[error("Invalid shadow shift: {0}")]
    InvalidShift(u32),
    #[error("Empty shadow region")]
    EmptyShadow,
    #[error("Shadow region overflows - start: {0:#x}, length: {1:#x}")]
    ShadowOverflow(GuestAddr, usize),
}
