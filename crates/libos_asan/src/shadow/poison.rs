//! # poison
//! The shadow byte encoding. Each shadow byte describes one granule of
//! application memory:
//!
//! - `0x00` - all bytes of the granule are accessible.
//! - `0x01..granule_size` - only the first N bytes are accessible.
//! - `0x80..0xff` - the whole granule is inaccessible, the value records why.
//!
//! The poison values are shared with the compiler's own runtime and must not
//! be changed.
use num_enum::{IntoPrimitive, TryFromPrimitive};

#[derive(IntoPrimitive, TryFromPrimitive, Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PoisonType {
    HeapLeftRedzone = 0xfa,
    HeapFreed = 0xfd,
    GlobalRedzone = 0xf9,
    StackLeftRedzone = 0xf1,
    StackMidRedzone = 0xf2,
    StackRightRedzone = 0xf3,
    StackAfterReturn = 0xf5,
    StackUseAfterScope = 0xf8,
    AllocaLeftRedzone = 0xca,
    AllocaRightRedzone = 0xcb,
}

impl PoisonType {
    /// Every poison value, in the order of the report legend
    pub const ALL: [PoisonType; 10] = [
        PoisonType::HeapLeftRedzone,
        PoisonType::HeapFreed,
        PoisonType::GlobalRedzone,
        PoisonType::StackLeftRedzone,
        PoisonType::StackMidRedzone,
        PoisonType::StackRightRedzone,
        PoisonType::StackAfterReturn,
        PoisonType::StackUseAfterScope,
        PoisonType::AllocaLeftRedzone,
        PoisonType::AllocaRightRedzone,
    ];

    pub const fn name(&self) -> &'static str {
        match self {
            PoisonType::HeapLeftRedzone => "heap left redzone",
            PoisonType::HeapFreed => "freed heap region",
            PoisonType::GlobalRedzone => "global redzone",
            PoisonType::StackLeftRedzone => "stack left redzone",
            PoisonType::StackMidRedzone => "stack mid redzone",
            PoisonType::StackRightRedzone => "stack right redzone",
            PoisonType::StackAfterReturn => "stack after return",
            PoisonType::StackUseAfterScope => "use after scope",
            PoisonType::AllocaLeftRedzone => "alloca left redzone",
            PoisonType::AllocaRightRedzone => "alloca right redzone",
        }
    }

    /// The value as stored in shadow memory
    #[inline]
    pub const fn as_shadow(&self) -> i8 {
        *self as u8 as i8
    }
}

impl From<PoisonType> for i8 {
    fn from(value: PoisonType) -> Self {
        value.as_shadow()
    }
}

/// A decoded shadow byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShadowByte {
    Addressable,
    /// Only the first `n` bytes of the granule are accessible
    Partial(u8),
    Poisoned(PoisonType),
    /// A value outside of the catalogue, typically memory the allocator never
    /// touched.
    Unknown(u8),
}

impl ShadowByte {
    pub fn decode(value: i8, granule_size: usize) -> ShadowByte {
        match value {
            0 => ShadowByte::Addressable,
            v if v > 0 && (v as usize) < granule_size => ShadowByte::Partial(v as u8),
            v => PoisonType::try_from(v as u8)
                .map(ShadowByte::Poisoned)
                .unwrap_or(ShadowByte::Unknown(v as u8)),
        }
    }

    /// Whether the byte at `offset` within a granule whose shadow byte is
    /// `value` may be accessed. A positive `value` admits offsets
    /// `0..value`, any negative value admits nothing.
    #[inline]
    pub const fn is_accessible_at(value: i8, offset: usize) -> bool {
        value == 0 || (value > 0 && offset < value as usize)
    }

    pub const fn describe(&self) -> &'static str {
        match self {
            ShadowByte::Addressable => "addressable",
            ShadowByte::Partial(_) => "partially addressable",
            ShadowByte::Poisoned(p) => p.name(),
            ShadowByte::Unknown(_) => "unknown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values() {
        assert_eq!(PoisonType::HeapLeftRedzone.as_shadow(), -6);
        assert_eq!(PoisonType::HeapFreed.as_shadow(), -3);
        assert_eq!(PoisonType::GlobalRedzone.as_shadow(), -7);
        assert_eq!(PoisonType::AllocaLeftRedzone.as_shadow(), -54);
        assert_eq!(PoisonType::AllocaRightRedzone.as_shadow(), -53);
        assert_eq!(u8::from(PoisonType::StackUseAfterScope), 0xf8);
    }

    #[test]
    fn test_all_poison_values_are_negative() {
        PoisonType::ALL
            .iter()
            .for_each(|p| assert!(p.as_shadow() < 0, "{p:?}"));
    }

    #[test]
    fn test_decode() {
        assert_eq!(ShadowByte::decode(0, 8), ShadowByte::Addressable);
        assert_eq!(ShadowByte::decode(3, 8), ShadowByte::Partial(3));
        assert_eq!(ShadowByte::decode(8, 8), ShadowByte::Unknown(8));
        assert_eq!(
            ShadowByte::decode(0xfdu8 as i8, 8),
            ShadowByte::Poisoned(PoisonType::HeapFreed)
        );
        assert_eq!(ShadowByte::decode(-1, 8), ShadowByte::Unknown(0xff));
        assert_eq!(ShadowByte::decode(-1, 8).describe(), "unknown");
    }

    #[test]
    fn test_partial_boundary() {
        // The first `value` bytes are accessible, offset `value` is not.
        for value in 1..8i8 {
            assert!(ShadowByte::is_accessible_at(value, value as usize - 1));
            assert!(!ShadowByte::is_accessible_at(value, value as usize));
        }
        assert!(ShadowByte::is_accessible_at(0, 7));
        assert!(!ShadowByte::is_accessible_at(-6, 0));
    }
}
