//! # hooks
//! Checked versions of the memory primitives. Compiler instrumentation does
//! not cover the bodies of `memcpy` and friends, so instrumented code calls
//! `__asan_memcpy`, `__asan_memset` and `__asan_memmove` instead. Each hook
//! validates every operand for the whole length before any byte is touched,
//! then delegates to the trusted routines in [`crate::mem`].
//!
//! With the `alias_libc` feature the hooks are also exported under the
//! default symbol names, so that uninstrumented callers within the same
//! image are checked too.
//!
//! The hooks never log, the logger may itself copy memory.
use core::ffi::c_void;

use crate::{
    Asan, GuestAddr,
    exit::Abort,
    report::{AccessKind, sink::LineSink},
};

pub mod bcmp;
pub mod memcmp;
pub mod memcpy;
pub mod memmove;
pub mod memset;

impl<S: LineSink, A: Abort> Asan<S, A> {
    /// Validates an operand of a memory primitive, a null pointer with a
    /// non-zero length is an invalid access.
    #[inline]
    fn check_operand(&self, ptr: *const c_void, n: usize, kind: AccessKind, entry: GuestAddr) {
        if ptr.is_null() {
            self.report(ptr as GuestAddr, n, kind, entry);
        }
        self.check(ptr as GuestAddr, n, kind, entry);
    }
}
