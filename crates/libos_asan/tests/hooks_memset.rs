mod common;

#[cfg(test)]
mod tests {
    use core::{ffi::c_void, ptr::null_mut};

    use libos_asan::shadow::PoisonType;

    use crate::common::Env;

    #[test]
    fn test_memset_zero_length() {
        let env = Env::new();
        let ret = unsafe { env.asan.memset(null_mut(), 0, 0, 0) };
        assert!(ret.is_null());
    }

    #[test]
    fn test_memset_partial_buffer() {
        let env = Env::new();
        let addr = env.addr(0x100);
        env.shadow().unpoison(addr, 10);
        env.fill(addr, 10, 0xff);

        unsafe { env.asan.memset((addr + 2) as *mut c_void, 0x88, 6, 0) };
        assert_eq!(
            env.bytes(addr, 10),
            [0xff, 0xff, 0x88, 0x88, 0x88, 0x88, 0x88, 0x88, 0xff, 0xff]
        );
    }

    #[test]
    fn test_memset_past_end() {
        let env = Env::new();
        let addr = env.addr(0x100);
        env.shadow().poison(addr, 0x20, PoisonType::HeapLeftRedzone);
        env.shadow().unpoison(addr, 10);
        env.fill(addr, 0x10, 0xff);

        let lines = env.expect_violation(|asan| unsafe {
            asan.memset(addr as *mut c_void, 0, 11, 0);
        });
        assert_eq!(
            lines[2],
            format!("asan: the bad address is {:#x} (10 from beginning)", addr + 10)
        );
        assert_eq!(env.bytes(addr, 0x10), vec![0xff; 0x10]);
    }

    #[test]
    fn test_memset_null_dest() {
        let env = Env::low();
        let lines = env.expect_violation(|asan| unsafe {
            asan.memset(null_mut(), 0x41, 4, 0);
        });
        assert_eq!(lines[0], "asan: trying to store 4 bytes at 0x0, IP = unknown");
    }
}
