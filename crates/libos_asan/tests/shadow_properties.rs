mod common;

#[cfg(test)]
mod tests {
    use libos_asan::{redzone::AllocaRedzones, shadow::PoisonType};

    use crate::common::Env;

    #[test]
    fn test_unpoison_then_check_is_clean() {
        let env = Env::new();
        let shadow = env.shadow();
        for offset in (0..0x100).step_by(8) {
            for len in [1, 2, 7, 8, 9, 15, 16, 17, 63, 64, 65, 0x1ff] {
                let addr = env.addr(0x1000 + offset);
                shadow.poison(addr, 0x400, PoisonType::HeapFreed);
                shadow.unpoison(addr, len);
                assert!(!shadow.is_poison(addr, len), "offset: {offset:#x}, len: {len:#x}");
                for start in 0..len.min(24) {
                    assert!(!shadow.is_poison(addr + start, len - start));
                }
            }
        }
    }

    #[test]
    fn test_poison_then_check_is_bad() {
        let env = Env::new();
        let shadow = env.shadow();
        for poison in PoisonType::ALL {
            for len in [1, 8, 9, 0x40, 0x101] {
                let addr = env.addr(0x800);
                shadow.unpoison(addr, 0x400);
                shadow.poison(addr, len, poison);
                assert!(shadow.is_poison(addr, len), "{poison:?}, len: {len:#x}");
                assert!(shadow.is_poison(addr + len - 1, 1));
                // Accesses which merely overlap the region are bad too.
                assert!(shadow.is_poison(addr - 4, 8));
            }
        }
    }

    #[test]
    fn test_partial_granule_boundary() {
        let env = Env::new();
        let shadow = env.shadow();
        let addr = env.addr(0x200);
        shadow.poison(addr, 0x20, PoisonType::HeapLeftRedzone);
        shadow.unpoison(addr, 10);
        assert!(!shadow.is_poison_byte(addr + 9));
        assert!(shadow.is_poison_byte(addr + 10));

        for accessible in 1..8 {
            shadow.poison(addr, 0x20, PoisonType::HeapLeftRedzone);
            shadow.unpoison(addr, accessible);
            assert!(!shadow.is_poison_byte(addr + accessible - 1), "{accessible}");
            assert!(shadow.is_poison_byte(addr + accessible), "{accessible}");
        }
    }

    #[test]
    fn test_interior_granule_is_found() {
        let env = Env::new();
        let shadow = env.shadow();
        let addr = env.addr(0x2000);
        for len in [0x18, 0x40, 0x200] {
            for granule in (8..len - 8).step_by(8) {
                shadow.unpoison(addr, len);
                shadow.poison(addr + granule, 1, PoisonType::GlobalRedzone);
                assert!(shadow.is_poison(addr, len), "len: {len:#x}, granule: {granule:#x}");
                assert_eq!(shadow.first_poisoned(addr, len), Some(addr + granule));
            }
        }
    }

    #[test]
    fn test_alloca_redzones() {
        let env = Env::new();
        let shadow = env.shadow();
        let width = env.asan.alloca_redzone_size();
        assert_eq!(width, 32);
        for size in 0..0x90 {
            let base = env.aligned_addr(0x3000, width);
            shadow.unpoison(base - 0x100, 0x300);
            env.asan.alloca_poison(base, size);

            let redzones = AllocaRedzones::compute(base, size, width);
            assert_eq!(redzones.right.start, base + size);
            assert!(redzones.left.end <= base);
            assert!(!shadow.is_poison(base, size), "size: {size:#x}");
            assert!(shadow.is_poison_byte(base + size), "size: {size:#x}");
            assert!(shadow.is_poison_byte(base - 1));
            assert!(shadow.is_poison(redzones.left.start, width));
            assert_eq!(
                shadow.first_poisoned(redzones.right.start, redzones.right.end - redzones.right.start),
                Some(base + size)
            );

            env.asan.allocas_unpoison(base - width, redzones.right.end);
            assert!(!shadow.is_poison(base - width, redzones.right.end - (base - width)));
        }
    }
}
