use core::ffi::{c_int, c_void};

use crate::{
    Asan, GuestAddr,
    exit::Abort,
    mem,
    report::{AccessKind, sink::LineSink},
};

#[cfg(feature = "alias_libc")]
use crate::runtime::runtime;

impl<S: LineSink, A: Abort> Asan<S, A> {
    /// Compares `n` bytes once both ranges are found to be readable,
    /// returning the difference of the first pair of differing bytes.
    ///
    /// # Safety
    /// See man pages
    pub unsafe fn memcmp(
        &self,
        ptr1: *const c_void,
        ptr2: *const c_void,
        n: usize,
        entry: GuestAddr,
    ) -> c_int {
        if n == 0 {
            return 0;
        }

        self.check_operand(ptr1, n, AccessKind::Load, entry);
        self.check_operand(ptr2, n, AccessKind::Load, entry);
        unsafe { mem::memcmp(ptr1 as *const u8, ptr2 as *const u8, n) }
    }
}

/// # Safety
/// See man pages
#[cfg(feature = "alias_libc")]
#[unsafe(export_name = "memcmp")]
pub unsafe extern "C" fn memcmp(ptr1: *const c_void, ptr2: *const c_void, n: usize) -> c_int {
    unsafe { runtime().memcmp(ptr1, ptr2, n, memcmp as *const () as GuestAddr) }
}
