//! # heap
//! Shadow bookkeeping for an allocator owned by the embedding environment.
//! The allocator keeps its own metadata, these helpers only record which of
//! its memory the application may touch:
//!
//! - pages freshly mapped for the heap are inaccessible until allocated,
//! - an allocation exposes exactly the bytes requested, any header placed in
//!   front of it is a left redzone,
//! - freed memory is inaccessible until it is allocated again.
use log::trace;

use crate::{
    GuestAddr,
    shadow::{GuestShadow, PoisonType},
};

/// Records a new allocation of `size` bytes at `data`, whose allocator header
/// occupies `[header, data)`. Both addresses must be granule aligned.
pub fn on_alloc(shadow: &GuestShadow, header: GuestAddr, data: GuestAddr, size: usize) {
    trace!("on_alloc - header: {header:#x}, data: {data:#x}, size: {size:#x}");
    assert!(header <= data, "on_alloc - header: {header:#x} follows data: {data:#x}");
    if header != data {
        shadow.poison(header, data - header, PoisonType::HeapLeftRedzone);
    }
    shadow.unpoison(data, size);
}

pub fn on_free(shadow: &GuestShadow, data: GuestAddr, size: usize) {
    trace!("on_free - data: {data:#x}, size: {size:#x}");
    shadow.poison(data, size, PoisonType::HeapFreed);
}

/// Records pages newly mapped for the heap, nothing in them may be accessed
/// until it is allocated.
pub fn on_map(shadow: &GuestShadow, addr: GuestAddr, len: usize) {
    trace!("on_map - addr: {addr:#x}, len: {len:#x}");
    shadow.poison(addr, len, PoisonType::GlobalRedzone);
}

pub fn on_unmap(shadow: &GuestShadow, addr: GuestAddr, len: usize) {
    trace!("on_unmap - addr: {addr:#x}, len: {len:#x}");
    shadow.unpoison(addr, len);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{fixture::Fixture, shadow::ShadowByte};

    #[test]
    fn test_lifecycle() {
        let fixture = Fixture::new();
        let shadow = fixture.shadow();
        let page = fixture.addr(0x2000) & !0xf;

        on_map(&shadow, page, 0x1000);
        assert!(shadow.is_poison(page, 1));
        assert_eq!(
            shadow.shadow_byte(page + 0x800),
            ShadowByte::Poisoned(PoisonType::GlobalRedzone)
        );

        let header = page + 0x100;
        let data = header + 0x10;
        on_alloc(&shadow, header, data, 0x1c);
        assert_eq!(
            shadow.shadow_byte(header),
            ShadowByte::Poisoned(PoisonType::HeapLeftRedzone)
        );
        assert!(shadow.is_poison_byte(data - 1));
        assert!(!shadow.is_poison(data, 0x1c));
        assert!(shadow.is_poison_byte(data + 0x1c));
        assert_eq!(shadow.shadow_byte(data + 0x18), ShadowByte::Partial(4));

        on_free(&shadow, data, 0x1c);
        assert!(shadow.is_poison(data, 1));
        assert_eq!(
            shadow.shadow_byte(data + 0x18),
            ShadowByte::Poisoned(PoisonType::HeapFreed)
        );

        on_alloc(&shadow, header, data, 0x8);
        assert!(!shadow.is_poison(data, 0x8));
        assert!(shadow.is_poison_byte(data + 0x8));

        on_unmap(&shadow, page, 0x1000);
        assert!(!shadow.is_poison(page, 0x1000));
    }

    #[test]
    fn test_headerless_alloc() {
        let fixture = Fixture::new();
        let shadow = fixture.shadow();
        let data = fixture.addr(0x100);
        on_map(&shadow, data - 0x10, 0x110);
        on_alloc(&shadow, data, data, 0x20);
        assert!(!shadow.is_poison(data, 0x20));
        assert!(shadow.is_poison_byte(data - 1));
    }
}
