use core::ffi::c_void;

use crate::{
    Asan, GuestAddr,
    exit::Abort,
    mem,
    report::{AccessKind, sink::LineSink},
    runtime::runtime,
};

impl<S: LineSink, A: Abort> Asan<S, A> {
    /// Copies `n` bytes from `src` to `dest` once both ranges are found to be
    /// accessible.
    ///
    /// # Safety
    /// See man pages
    pub unsafe fn memcpy(
        &self,
        dest: *mut c_void,
        src: *const c_void,
        n: usize,
        entry: GuestAddr,
    ) -> *mut c_void {
        if n == 0 {
            return dest;
        }

        self.check_operand(src, n, AccessKind::Load, entry);
        self.check_operand(dest, n, AccessKind::Store, entry);
        unsafe { mem::memcpy(dest as *mut u8, src as *const u8, n) };
        dest
    }
}

/// # Safety
/// See man pages
#[unsafe(export_name = "__asan_memcpy")]
pub unsafe extern "C" fn asan_memcpy(
    dest: *mut c_void,
    src: *const c_void,
    n: usize,
) -> *mut c_void {
    unsafe { runtime().memcpy(dest, src, n, asan_memcpy as *const () as GuestAddr) }
}

/// # Safety
/// See man pages
#[cfg(feature = "alias_libc")]
#[unsafe(export_name = "memcpy")]
pub unsafe extern "C" fn memcpy(dest: *mut c_void, src: *const c_void, n: usize) -> *mut c_void {
    unsafe { runtime().memcpy(dest, src, n, memcpy as *const () as GuestAddr) }
}
