use core::ffi::c_void;

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
    pub unsafe fn memmove(
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
        unsafe { mem::memmove(dest as *mut u8, src as *const u8, n) };
        dest
    }
}

/// # Safety
/// See man pages
#[unsafe(export_name = "__asan_memmove")]
pub unsafe extern "C" fn asan_memmove(
    dest: *mut c_void,
    src: *const c_void,
    n: usize,
) -> *mut c_void {
    unsafe { runtime().memmove(dest, src, n, asan_memmove as *const () as GuestAddr) }
}

/// # Safety
/// See man pages
#[cfg(feature = "alias_libc")]
#[unsafe(export_name = "memmove")]
pub unsafe extern "C" fn memmove(dest: *mut c_void, src: *const c_void, n: usize) -> *mut c_void {
    unsafe { runtime().memmove(dest, src, n, memmove as *const () as GuestAddr) }
}
