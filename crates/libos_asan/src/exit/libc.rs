pub fn abort() -> ! {
    unsafe { libc::abort() }
}
