//! # redzone
//! Redzones around dynamically sized stack buffers. The instrumentation
//! over-allocates each `alloca` and asks the runtime to poison the space
//! either side of the buffer, then unpoisons the whole dynamic area of the
//! frame before it is released.
//!
//! ```text
//!   base - width        base           base + size    align_up(base + size) + width
//!        | alloca left   | user buffer   | alloca right                |
//! ```
use core::ops::Range;

use log::trace;

use crate::{
    GuestAddr,
    shadow::{GuestShadow, PoisonType},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocaRedzones {
    pub left: Range<GuestAddr>,
    pub right: Range<GuestAddr>,
}

impl AllocaRedzones {
    /// `width` must be a power of two
    pub fn compute(base: GuestAddr, size: usize, width: usize) -> AllocaRedzones {
        debug_assert!(width.is_power_of_two());
        let end = base.wrapping_add(size);
        let right_end = (end.wrapping_add(width - 1) & !(width - 1)).wrapping_add(width);
        AllocaRedzones {
            left: base.wrapping_sub(width)..base,
            right: end..right_end,
        }
    }
}

/// Poisons the redzones of the buffer `[base, base + size)`. `base` must be
/// granule aligned, the buffer itself is left untouched.
pub fn alloca_poison(shadow: &GuestShadow, width: usize, base: GuestAddr, size: usize) {
    let redzones = AllocaRedzones::compute(base, size, width);
    trace!("alloca_poison - base: {base:#x}, size: {size:#x}, redzones: {redzones:x?}");
    shadow.poison(
        redzones.left.start,
        redzones.left.end.wrapping_sub(redzones.left.start),
        PoisonType::AllocaLeftRedzone,
    );
    shadow.poison_unaligned(
        redzones.right.start,
        redzones.right.end.wrapping_sub(redzones.right.start),
        PoisonType::AllocaRightRedzone,
    );
}

/// Unpoisons `[top, bottom)` in one call. Empty or inverted ranges and a
/// null `top` are ignored.
pub fn allocas_unpoison(shadow: &GuestShadow, top: GuestAddr, bottom: GuestAddr) {
    trace!("allocas_unpoison - top: {top:#x}, bottom: {bottom:#x}");
    if top != 0 && top < bottom {
        shadow.unpoison(top, bottom - top);
    }
}
