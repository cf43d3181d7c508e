//! # exit
//! This module supports aborting the process once a violation has been
//! reported.
#[cfg(feature = "libc")]
pub use crate::exit::libc::abort;
#[cfg(all(feature = "linux", target_os = "linux", not(feature = "libc")))]
pub use crate::exit::linux::abort;

#[cfg(feature = "libc")]
pub mod libc;

#[cfg(all(feature = "linux", target_os = "linux"))]
pub mod linux;

#[cfg(all(
    not(feature = "libc"),
    not(all(feature = "linux", target_os = "linux"))
))]
pub fn abort() -> ! {
    loop {
        core::hint::spin_loop();
    }
}

/// The name of the routine on which to set a breakpoint to catch a
/// violation, as printed in the report.
#[cfg(feature = "shim")]
pub const ABORT_NAME: &str = "shim_abort";
#[cfg(all(feature = "pal", not(feature = "shim")))]
pub const ABORT_NAME: &str = "pal_abort";
#[cfg(not(any(feature = "shim", feature = "pal")))]
pub const ABORT_NAME: &str = "abort";

/// Terminates the process after a violation has been reported
pub trait Abort {
    const NAME: &'static str;

    fn abort() -> !;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessAbort;

impl Abort for ProcessAbort {
    const NAME: &'static str = ABORT_NAME;

    fn abort() -> ! {
        abort()
    }
}
