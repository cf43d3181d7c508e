use core::ffi::{c_int, c_void};

use crate::{
    Asan, GuestAddr,
    exit::Abort,
    mem,
    report::{AccessKind, sink::LineSink},
    runtime::runtime,
};

impl<S: LineSink, A: Abort> Asan<S, A> {
    /// # Safety
    /// See man pages
    pub unsafe fn memset(
        &self,
        dest: *mut c_void,
        c: c_int,
        n: usize,
        entry: GuestAddr,
    ) -> *mut c_void {
        if n == 0 {
            return dest;
        }

        self.check_operand(dest, n, AccessKind::Store, entry);
        unsafe { mem::memset(dest as *mut u8, c as u8, n) };
        dest
    }
}

/// # Safety
/// See man pages
#[unsafe(export_name = "__asan_memset")]
pub unsafe extern "C" fn asan_memset(dest: *mut c_void, c: c_int, n: usize) -> *mut c_void {
    unsafe { runtime().memset(dest, c, n, asan_memset as *const () as GuestAddr) }
}

/// # Safety
/// See man pages
#[cfg(feature = "alias_libc")]
#[unsafe(export_name = "memset")]
pub unsafe extern "C" fn memset(dest: *mut c_void, c: c_int, n: usize) -> *mut c_void {
    unsafe { runtime().memset(dest, c, n, memset as *const () as GuestAddr) }
}
