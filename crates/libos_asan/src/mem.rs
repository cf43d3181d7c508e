//! # mem
//! Trusted memory primitives. Nothing in this module consults the shadow
//! memory, these are the implementations which the checked primitives in
//! [`crate::hooks`] delegate to once an access has been validated, and which
//! the runtime uses to fill shadow memory directly.
//!
//! These routines are plain byte loops. When the checked primitives are
//! exported under the default `memcpy` family of symbols (feature
//! `alias_libc`) the crate is built with `no_builtins`, so the loops are
//! never lowered back into calls to those symbols.

/// # Safety
/// `src` must be valid for reads and `dest` valid for writes of `count`
/// bytes, the ranges must not overlap.
pub unsafe fn memcpy(dest: *mut u8, src: *const u8, count: usize) {
    for i in 0..count {
        unsafe { *dest.add(i) = *src.add(i) };
    }
}

/// # Safety
/// `src` must be valid for reads and `dest` valid for writes of `count`
/// bytes, the ranges may overlap.
pub unsafe fn memmove(dest: *mut u8, src: *const u8, count: usize) {
    if (src as usize) < (dest as usize) {
        for i in (0..count).rev() {
            unsafe { *dest.add(i) = *src.add(i) };
        }
    } else {
        for i in 0..count {
            unsafe { *dest.add(i) = *src.add(i) };
        }
    }
}

/// # Safety
/// `dest` must be valid for writes of `count` bytes.
pub unsafe fn memset(dest: *mut u8, value: u8, count: usize) {
    for i in 0..count {
        unsafe { *dest.add(i) = value };
    }
}

/// Returns the difference between the first pair of differing bytes, or zero
/// if the ranges are equal.
///
/// # Safety
/// `ptr1` and `ptr2` must be valid for reads of `count` bytes.
pub unsafe fn memcmp(ptr1: *const u8, ptr2: *const u8, count: usize) -> i32 {
    for i in 0..count {
        let (l, r) = unsafe { (*ptr1.add(i), *ptr2.add(i)) };
        if l != r {
            return i32::from(l) - i32::from(r);
        }
    }
    0
}

/// # Safety
/// `ptr1` and `ptr2` must be valid for reads of `count` bytes.
pub unsafe fn bcmp(ptr1: *const u8, ptr2: *const u8, count: usize) -> i32 {
    for i in 0..count {
        if unsafe { *ptr1.add(i) != *ptr2.add(i) } {
            return 1;
        }
    }
    0
}
