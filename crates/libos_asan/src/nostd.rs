use core::panic::PanicInfo;

use log::error;

use crate::exit::abort;

#[panic_handler]
fn panic(info: &PanicInfo) -> ! {
    error!("panic: {info}");
    abort();
}

#[unsafe(no_mangle)]
extern "C" fn _Unwind_Resume() {
    error!("_Unwind_Resume");
    abort();
}
