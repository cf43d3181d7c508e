//! # callbacks
//! The entry points called by code compiled with `-fsanitize=address`.
//!
//! - `load` / `store` - validate an access, reporting and aborting if any of
//!   its bytes are inaccessible.
//! - `report_load` / `report_store` - report an access already found to be
//!   invalid by a check inlined by the compiler, then abort. The compiler
//!   chooses between the two forms based on
//!   `-mllvm -asan-instrumentation-with-call-threshold=N`.
//!
//! Stack and global instrumentation are not supported, the remaining
//! initialization and bookkeeping callbacks are accepted and ignored.
use crate::{GuestAddr, mem, runtime::runtime};

macro_rules! define_access_callbacks {
    ($($size:literal),+) => {
        paste::paste! {
            $(
                /// # Safety
                /// Must only be called by instrumented code
                #[unsafe(no_mangle)]
                pub unsafe extern "C" fn [<__asan_load $size>](addr: GuestAddr) {
                    unsafe { runtime() }.load(
                        addr,
                        $size,
                        [<__asan_load $size>] as *const () as GuestAddr,
                    );
                }

                /// # Safety
                /// Must only be called by instrumented code
                #[unsafe(no_mangle)]
                pub unsafe extern "C" fn [<__asan_store $size>](addr: GuestAddr) {
                    unsafe { runtime() }.store(
                        addr,
                        $size,
                        [<__asan_store $size>] as *const () as GuestAddr,
                    );
                }

                /// # Safety
                /// Must only be called by instrumented code
                #[unsafe(no_mangle)]
                pub unsafe extern "C" fn [<__asan_report_load $size>](addr: GuestAddr) -> ! {
                    unsafe { runtime() }.report_load(
                        addr,
                        $size,
                        [<__asan_report_load $size>] as *const () as GuestAddr,
                    )
                }

                /// # Safety
                /// Must only be called by instrumented code
                #[unsafe(no_mangle)]
                pub unsafe extern "C" fn [<__asan_report_store $size>](addr: GuestAddr) -> ! {
                    unsafe { runtime() }.report_store(
                        addr,
                        $size,
                        [<__asan_report_store $size>] as *const () as GuestAddr,
                    )
                }
            )+
        }
    };
}

define_access_callbacks!(1, 2, 4, 8, 16);

/// # Safety
/// Must only be called by instrumented code
#[unsafe(no_mangle)]
#[allow(non_snake_case)]
pub unsafe extern "C" fn __asan_loadN(addr: GuestAddr, size: usize) {
    unsafe { runtime() }.load(addr, size, __asan_loadN as *const () as GuestAddr);
}

/// # Safety
/// Must only be called by instrumented code
#[unsafe(no_mangle)]
#[allow(non_snake_case)]
pub unsafe extern "C" fn __asan_storeN(addr: GuestAddr, size: usize) {
    unsafe { runtime() }.store(addr, size, __asan_storeN as *const () as GuestAddr);
}

/// # Safety
/// Must only be called by instrumented code
#[unsafe(no_mangle)]
pub unsafe extern "C" fn __asan_report_load_n(addr: GuestAddr, size: usize) -> ! {
    unsafe { runtime() }.report_load(addr, size, __asan_report_load_n as *const () as GuestAddr)
}

/// # Safety
/// Must only be called by instrumented code
#[unsafe(no_mangle)]
pub unsafe extern "C" fn __asan_report_store_n(addr: GuestAddr, size: usize) -> ! {
    unsafe { runtime() }.report_store(addr, size, __asan_report_store_n as *const () as GuestAddr)
}

// Emitted into the init sections of instrumented objects, the runtime is
// set up by the embedding environment instead.
#[unsafe(no_mangle)]
pub extern "C" fn __asan_init() {}

#[unsafe(no_mangle)]
pub extern "C" fn __asan_version_mismatch_check_v8() {}

#[unsafe(no_mangle)]
pub extern "C" fn __asan_handle_no_return() {}

/// # Safety
/// Must only be called by instrumented code
#[unsafe(no_mangle)]
pub unsafe extern "C" fn __asan_alloca_poison(addr: GuestAddr, size: usize) {
    unsafe { runtime() }.alloca_poison(addr, size);
}

/// # Safety
/// Must only be called by instrumented code
#[unsafe(no_mangle)]
pub unsafe extern "C" fn __asan_allocas_unpoison(top: GuestAddr, bottom: GuestAddr) {
    unsafe { runtime() }.allocas_unpoison(top, bottom);
}

macro_rules! define_set_shadow {
    ($($name:tt => $value:literal),+) => {
        paste::paste! {
            $(
                /// Fills `size` bytes of shadow memory at the shadow address
                /// `addr`.
                ///
                /// # Safety
                /// `[addr, addr + size)` must lie within the mapped shadow
                #[unsafe(no_mangle)]
                pub unsafe extern "C" fn [<__asan_set_shadow_ $name>](addr: GuestAddr, size: usize) {
                    unsafe { mem::memset(addr as *mut u8, $value, size) };
                }
            )+
        }
    };
}

define_set_shadow!(00 => 0x00, f1 => 0xf1, f2 => 0xf2, f3 => 0xf3, f5 => 0xf5, f8 => 0xf8);

/// Poisons `[addr, addr + size)` with `value`. `addr` must be granule
/// aligned, `size` is rounded up to a whole number of granules.
///
/// # Safety
/// The runtime must be installed with the shadow mapped
#[unsafe(no_mangle)]
pub unsafe extern "C" fn asan_poison_region(addr: GuestAddr, size: usize, value: i8) {
    unsafe { runtime() }.shadow().poison_raw(addr, size, value);
}

/// Unpoisons exactly `size` bytes at `addr`, which must be granule aligned.
///
/// # Safety
/// The runtime must be installed with the shadow mapped
#[unsafe(no_mangle)]
pub unsafe extern "C" fn asan_unpoison_region(addr: GuestAddr, size: usize) {
    unsafe { runtime() }.shadow().unpoison(addr, size);
}
