//! Pixel-wise filters: Cast, Tan, Sqrt, Binary Threshold.
//!
//! Each output element depends only on the input element at the same
//! position, so every filter is a single parallel `Zip` over the image.

use ndarray::{Array, ArrayView, Dimension, Zip};

use crate::element::{saturating_cast, Element, ElementKind};
use crate::shim::OperatorError;
use crate::view::DynImage;

// ============================================================================
// Cast
// ============================================================================

/// Convert every element to `U`, saturating at the bounds of `U`.
pub fn cast<S: Element, U: Element, D: Dimension>(input: ArrayView<'_, S, D>) -> Array<U, D> {
    Zip::from(input).par_map_collect(|&v| saturating_cast::<S, U>(v))
}

/// Convert to an element kind chosen at runtime.
pub fn cast_to<S: Element, D: Dimension>(input: ArrayView<'_, S, D>, to: ElementKind) -> DynImage<D> {
    match to {
        ElementKind::I8 => DynImage::I8(cast(input)),
        ElementKind::U8 => DynImage::U8(cast(input)),
        ElementKind::I16 => DynImage::I16(cast(input)),
        ElementKind::U16 => DynImage::U16(cast(input)),
        ElementKind::I32 => DynImage::I32(cast(input)),
        ElementKind::U32 => DynImage::U32(cast(input)),
        ElementKind::I64 => DynImage::I64(cast(input)),
        ElementKind::U64 => DynImage::U64(cast(input)),
        ElementKind::F32 => DynImage::F32(cast(input)),
        ElementKind::F64 => DynImage::F64(cast(input)),
    }
}

// ============================================================================
// Intensity Transforms
// ============================================================================

fn map_floating<T: Element, D: Dimension>(
    input: ArrayView<'_, T, D>,
    name: &str,
    f: fn(f64) -> f64,
) -> Result<Array<T, D>, OperatorError> {
    if !T::KIND.is_floating() {
        return Err(OperatorError::new(format!("{name} requires floating-point input, got {}", T::KIND)));
    }
    Ok(Zip::from(input).par_map_collect(|&v| {
        let x = v.to_f64().unwrap_or(f64::NAN);
        saturating_cast::<f64, T>(f(x))
    }))
}

/// Element-wise tangent.
pub fn tan<T: Element, D: Dimension>(input: ArrayView<'_, T, D>) -> Result<Array<T, D>, OperatorError> {
    map_floating(input, "tan", f64::tan)
}

/// Element-wise square root; negative inputs give NaN.
pub fn sqrt<T: Element, D: Dimension>(input: ArrayView<'_, T, D>) -> Result<Array<T, D>, OperatorError> {
    map_floating(input, "sqrt", f64::sqrt)
}

// ============================================================================
// Threshold
// ============================================================================

/// Label `inside` where `lower <= v <= upper`, `outside` elsewhere.
///
/// NaN inputs are always outside.
pub fn binary_threshold<T: Element, D: Dimension>(
    input: ArrayView<'_, T, D>,
    lower: f64,
    upper: f64,
    inside: u8,
    outside: u8,
) -> Array<u8, D> {
    Zip::from(input).par_map_collect(|&v| match v.to_f64() {
        Some(x) if x >= lower && x <= upper => inside,
        _ => outside,
    })
}
