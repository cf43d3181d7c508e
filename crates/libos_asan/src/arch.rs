//! # arch
//! Recovery of the address of the instrumented access which triggered a
//! report. The compiler instrumentation calls straight into the entry points
//! in [`crate::callbacks`], so the faulting instruction is the return address
//! of that entry point's frame.

use crate::GuestAddr;

/// Returns the return address of the innermost frame belonging to the
/// function at `callee`, or `None` if the stack cannot be walked.
#[cfg(feature = "backtrace")]
pub fn caller_ip(callee: GuestAddr) -> Option<GuestAddr> {
    let mut found = false;
    let mut ip = None;
    // The runtime may be running before any synchronization primitive has
    // been set up, walking our own stack needs none.
    unsafe {
        backtrace::trace_unsynchronized(|frame| {
            if found {
                ip = Some(frame.ip() as GuestAddr);
                return false;
            }
            found = frame.symbol_address() as GuestAddr == callee;
            true
        })
    };
    ip
}

#[cfg(not(feature = "backtrace"))]
pub fn caller_ip(_callee: GuestAddr) -> Option<GuestAddr> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_callee() {
        assert_eq!(caller_ip(0), None);
    }
}
