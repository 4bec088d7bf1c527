//! Scalar element kinds and the conversion rules between them.
//!
//! ## Supported Kinds
//!
//! | Kind | Rust type | Integer | Signed |
//! |------|-----------|---------|--------|
//! | `i8` / `u8` | `i8` / `u8` | yes | yes / no |
//! | `i16` / `u16` | `i16` / `u16` | yes | yes / no |
//! | `i32` / `u32` | `i32` / `u32` | yes | yes / no |
//! | `i64` / `u64` | `i64` / `u64` | yes | yes / no |
//! | `f32` / `f64` | `f32` / `f64` | no | yes |
//!
//! ## Widening
//!
//! A buffer of one kind may be read as another kind only when the conversion
//! widens: same kind, integer to a wider integer of the same signedness,
//! integer to floating point, or `f32` to `f64`. Narrowing and
//! cross-signedness reads are rejected.

use std::fmt;

use ndarray::{Array, Dimension};
use num_traits::{Bounded, NumCast, ToPrimitive, Zero};
use serde::{Deserialize, Serialize};

use crate::array::ArrayData;
use crate::view::DynImage;

/// Declared scalar type of one array element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
}

impl ElementKind {
    pub const ALL: [ElementKind; 10] = [
        ElementKind::I8,
        ElementKind::U8,
        ElementKind::I16,
        ElementKind::U16,
        ElementKind::I32,
        ElementKind::U32,
        ElementKind::I64,
        ElementKind::U64,
        ElementKind::F32,
        ElementKind::F64,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ElementKind::I8 => "i8",
            ElementKind::U8 => "u8",
            ElementKind::I16 => "i16",
            ElementKind::U16 => "u16",
            ElementKind::I32 => "i32",
            ElementKind::U32 => "u32",
            ElementKind::I64 => "i64",
            ElementKind::U64 => "u64",
            ElementKind::F32 => "f32",
            ElementKind::F64 => "f64",
        }
    }

    /// Width of one element in bits.
    pub fn bits(self) -> u32 {
        match self {
            ElementKind::I8 | ElementKind::U8 => 8,
            ElementKind::I16 | ElementKind::U16 => 16,
            ElementKind::I32 | ElementKind::U32 | ElementKind::F32 => 32,
            ElementKind::I64 | ElementKind::U64 | ElementKind::F64 => 64,
        }
    }

    pub fn is_integer(self) -> bool {
        !self.is_floating()
    }

    pub fn is_floating(self) -> bool {
        matches!(self, ElementKind::F32 | ElementKind::F64)
    }

    pub fn is_signed(self) -> bool {
        !matches!(
            self,
            ElementKind::U8 | ElementKind::U16 | ElementKind::U32 | ElementKind::U64
        )
    }

    /// Whether a buffer of `self` may be read as `target` without narrowing.
    pub fn can_widen_to(self, target: ElementKind) -> bool {
        if self == target {
            return true;
        }
        match (self.is_integer(), target.is_integer()) {
            (true, true) => self.is_signed() == target.is_signed() && target.bits() > self.bits(),
            (true, false) => true,
            (false, false) => target.bits() > self.bits(),
            (false, true) => false,
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A scalar type with a compiled instantiation in the dispatch table.
pub trait Element:
    Copy
    + Default
    + PartialOrd
    + fmt::Debug
    + Send
    + Sync
    + 'static
    + NumCast
    + ToPrimitive
    + Bounded
    + Zero
{
    const KIND: ElementKind;

    /// Borrow the buffer if it stores this type.
    fn slice(data: &ArrayData) -> Option<&[Self]>;

    fn slice_mut(data: &mut ArrayData) -> Option<&mut [Self]>;

    fn into_data(values: Vec<Self>) -> ArrayData;

    fn into_image<D: Dimension>(image: Array<Self, D>) -> DynImage<D>;
}

macro_rules! impl_element {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl Element for $ty {
                const KIND: ElementKind = ElementKind::$variant;

                fn slice(data: &ArrayData) -> Option<&[Self]> {
                    match data {
                        ArrayData::$variant(values) => Some(values.as_slice()),
                        _ => None,
                    }
                }

                fn slice_mut(data: &mut ArrayData) -> Option<&mut [Self]> {
                    match data {
                        ArrayData::$variant(values) => Some(values.as_mut_slice()),
                        _ => None,
                    }
                }

                fn into_data(values: Vec<Self>) -> ArrayData {
                    ArrayData::$variant(values)
                }

                fn into_image<D: Dimension>(image: Array<Self, D>) -> DynImage<D> {
                    DynImage::$variant(image)
                }
            }
        )*
    };
}

impl_element!(
    i8 => I8,
    u8 => U8,
    i16 => I16,
    u16 => U16,
    i32 => I32,
    u32 => U32,
    i64 => I64,
    u64 => U64,
    f32 => F32,
    f64 => F64,
);

/// Convert between element types, clamping to the target range.
///
/// Exact for every widening allowed by [`ElementKind::can_widen_to`].
/// Float-to-integer conversions truncate toward zero; NaN maps to zero.
#[inline]
pub fn saturating_cast<S: Element, T: Element>(value: S) -> T {
    if let Some(converted) = <T as NumCast>::from(value) {
        return converted;
    }
    match value.to_f64() {
        Some(v) if v.is_nan() => T::zero(),
        None => T::zero(),
        Some(_) if value > S::zero() => T::max_value(),
        Some(_) => T::min_value(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========================================================================
    // Widening Rules
    // ========================================================================

    #[test]
    fn test_same_kind_always_widens() {
        for kind in ElementKind::ALL {
            assert!(kind.can_widen_to(kind), "{kind} should accept itself");
        }
    }

    #[test]
    fn test_integer_widening_keeps_signedness() {
        assert!(ElementKind::U8.can_widen_to(ElementKind::U16));
        assert!(ElementKind::U8.can_widen_to(ElementKind::U64));
        assert!(ElementKind::I16.can_widen_to(ElementKind::I32));
        assert!(!ElementKind::U8.can_widen_to(ElementKind::I16));
        assert!(!ElementKind::I8.can_widen_to(ElementKind::U16));
        assert!(!ElementKind::I32.can_widen_to(ElementKind::I16));
    }

    #[test]
    fn test_integer_to_float_widens() {
        for kind in ElementKind::ALL.into_iter().filter(|k| k.is_integer()) {
            assert!(kind.can_widen_to(ElementKind::F32));
            assert!(kind.can_widen_to(ElementKind::F64));
        }
    }

    #[test]
    fn test_float_rules() {
        assert!(ElementKind::F32.can_widen_to(ElementKind::F64));
        assert!(!ElementKind::F64.can_widen_to(ElementKind::F32));
        assert!(!ElementKind::F32.can_widen_to(ElementKind::I64));
    }

    // ========================================================================
    // Saturating Cast
    // ========================================================================

    #[test]
    fn test_saturating_cast_clamps() {
        assert_eq!(saturating_cast::<f64, u8>(300.0), 255);
        assert_eq!(saturating_cast::<f64, u8>(-3.0), 0);
        assert_eq!(saturating_cast::<i32, i8>(-1000), i8::MIN);
        assert_eq!(saturating_cast::<f32, i16>(12.9), 12);
        assert_eq!(saturating_cast::<f32, u8>(f32::NAN), 0);
    }

    #[test]
    fn test_saturating_cast_exact_for_widening() {
        assert_eq!(saturating_cast::<u32, u64>(u32::MAX), u32::MAX as u64);
        assert_eq!(saturating_cast::<i16, f32>(-1234), -1234.0);
        assert_eq!(saturating_cast::<u64, f64>(1 << 40), (1u64 << 40) as f64);
    }

    #[test]
    fn test_kind_serde_names() {
        let json = serde_json::to_string(&ElementKind::F32).unwrap();
        assert_eq!(json, "\"f32\"");
        let kind: ElementKind = serde_json::from_str("\"u16\"").unwrap();
        assert_eq!(kind, ElementKind::U16);
    }
}
