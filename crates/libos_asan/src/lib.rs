//! # libos_asan
//!
//! `libos_asan` is an `AddressSanitizer` runtime intended for processes which
//! cannot link against the compiler's own sanitizer support library, most
//! notably code running in a freestanding (no-stdlib) environment such as a
//! library OS shim or the platform adaptation layer underneath it.
//!
//! Code compiled with `-fsanitize=address` calls into this crate at every
//! instrumented memory access. The runtime keeps one shadow byte per granule
//! (8 bytes) of application memory and aborts the process with a diagnostic
//! as soon as an access touches a poisoned granule.
//!
//! The crate is split into the following components:
//!
//! - [`shadow`] - address translation, the shadow byte encoding, poisoning
//!   and access validation.
//! - [`report`] - formatting of the diagnostic written when an invalid access
//!   is detected.
//! - [`redzone`] - redzones around `alloca` buffers.
//! - [`heap`] - helpers for an allocator owned by the embedding environment.
//! - [`hooks`] and [`mem`] - checked memory primitives and the trusted,
//!   unchecked implementations they delegate to.
//! - [`runtime`] and [`callbacks`] - the process wide context and the entry
//!   points expected by the compiler instrumentation.
//!
//! Only heap and explicitly poisoned regions are covered, programs should be
//! compiled with:
//!
//! ```text
//! -fsanitize=address
//! -mllvm -asan-use-after-return=0
//! -mllvm -asan-stack=0
//! -mllvm -asan-globals=0
//! ```
//!
//! The shadow memory region itself must be mapped by the embedding
//! environment before any instrumented code runs, see
//! [`shadow::layout::ShadowLayout::shadow_range`].
#![cfg_attr(not(test), no_std)]
#![cfg_attr(feature = "alias_libc", no_builtins)]
#![cfg_attr(feature = "document-features", doc = document_features::document_features!())]

pub mod arch;

pub mod callbacks;

pub mod config;

pub mod exit;

#[cfg(test)]
mod fixture;

pub mod heap;

pub mod hooks;

pub mod logger;

pub mod mem;

#[cfg(all(feature = "nostd", not(test)))]
mod nostd;

pub mod redzone;

pub mod report;

pub mod runtime;

pub mod shadow;

pub type GuestAddr = usize;

pub use runtime::{Asan, DefaultAsan, install, runtime};
