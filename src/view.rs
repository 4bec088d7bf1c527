//! Typed image view adapter.
//!
//! Bridges a type-erased [`GenericArray`] plus its [`ShapeDescriptor`] into a
//! statically typed `ndarray` image, and typed results back into generic
//! arrays.
//!
//! ## Axis Order
//!
//! Generic buffers store tuples with the x axis varying fastest. `ndarray`'s
//! standard layout varies the *last* axis fastest, so a view over an image
//! with extent `(x, y, z)` has shape `(z, y, x)` and indexes as
//! `view[[z, y, x]]`. Iterating a view in logical order therefore visits
//! elements in exactly the generic buffer order.
//!
//! ## Copying
//!
//! - Same element kind: the view borrows the generic buffer (no copy), even
//!   for one component of an interleaved vector array.
//! - Widened kind: the selected component is converted into an owned buffer.

use ndarray::{Array, ArrayView, Axis, CowArray, Dim, Dimension, Ix2, Ix3, IxDyn};

use crate::array::{ArrayData, GenericArray};
use crate::element::{Element, ElementKind};
use crate::error::BridgeError;
use crate::geometry::ShapeDescriptor;

// ============================================================================
// Compiled Dimensionalities
// ============================================================================

/// An `ndarray` dimension with a compiled image instantiation.
pub trait ImageDimension: Dimension {
    const RANK: usize;

    /// Storage-order dimension for `shape`, or `None` if the rank differs.
    fn from_shape(shape: &ShapeDescriptor) -> Option<Self>;
}

impl ImageDimension for Ix2 {
    const RANK: usize = 2;

    fn from_shape(shape: &ShapeDescriptor) -> Option<Self> {
        match *shape.extent() {
            [x, y] => Some(Dim([y, x])),
            _ => None,
        }
    }
}

impl ImageDimension for Ix3 {
    const RANK: usize = 3;

    fn from_shape(shape: &ShapeDescriptor) -> Option<Self> {
        match *shape.extent() {
            [x, y, z] => Some(Dim([z, y, x])),
            _ => None,
        }
    }
}

// ============================================================================
// Typed Views
// ============================================================================

/// Typed, dimensioned view over one component of a generic array.
///
/// Lives only for the duration of one dispatch call.
#[derive(Debug)]
pub struct TypedImageView<'a, T, D: Dimension> {
    data: CowArray<'a, T, D>,
    shape: ShapeDescriptor,
}

impl<'a, T: Element, D: ImageDimension> TypedImageView<'a, T, D> {
    /// Wrap an owned image, e.g. one produced by an operator.
    pub fn owned(data: Array<T, D>, shape: ShapeDescriptor) -> Result<Self, BridgeError> {
        check_dim(&data.raw_dim(), &shape)?;
        Ok(Self {
            data: CowArray::from(data),
            shape,
        })
    }

    pub fn view(&self) -> ArrayView<'_, T, D> {
        self.data.view()
    }

    pub fn shape(&self) -> &ShapeDescriptor {
        &self.shape
    }

    /// `true` when the view aliases the generic buffer instead of a copy.
    pub fn is_borrowed(&self) -> bool {
        self.data.is_view()
    }

    pub fn into_owned(self) -> Array<T, D> {
        self.data.into_owned()
    }
}

fn check_dim<D: ImageDimension>(dim: &D, shape: &ShapeDescriptor) -> Result<(), BridgeError> {
    match D::from_shape(shape) {
        Some(expected) if &expected == dim => Ok(()),
        _ => Err(BridgeError::shape(format!(
            "image of shape {:?} does not match geometry extent {:?}",
            dim.slice(),
            shape.extent()
        ))),
    }
}

/// Interpret one component of `array` as a typed image of element type `T`.
///
/// # Arguments
/// * `array` - Generic source array
/// * `shape` - Geometry indexing the array's tuples
/// * `component` - Component to view (0 for scalar arrays)
///
/// # Returns
/// A borrowed view when the array already stores `T`, otherwise an owned
/// widened copy. Fails with `TypeMismatch` if the array's kind cannot widen to
/// `T`, and with `ShapeMismatch` if the extent product differs from the tuple
/// count or the geometry rank differs from `D`.
pub fn to_typed_view<'a, T: Element, D: ImageDimension>(
    array: &'a GenericArray,
    shape: &ShapeDescriptor,
    component: usize,
) -> Result<TypedImageView<'a, T, D>, BridgeError> {
    if !array.kind().can_widen_to(T::KIND) {
        return Err(BridgeError::TypeMismatch {
            from: array.kind(),
            to: T::KIND,
        });
    }
    let dim = D::from_shape(shape).ok_or_else(|| {
        BridgeError::shape(format!(
            "{}-D geometry cannot back a {}-D image",
            shape.rank(),
            D::RANK
        ))
    })?;
    if shape.element_count() != array.tuple_count() {
        return Err(BridgeError::shape(format!(
            "extent product {} does not match the {} tuples of '{}'",
            shape.element_count(),
            array.tuple_count(),
            array.name()
        )));
    }
    let components = array.components();
    if component >= components {
        return Err(BridgeError::shape(format!(
            "component {component} out of range for '{}' with {components} components",
            array.name()
        )));
    }

    let data = match T::slice(array.data()) {
        Some(values) => {
            let mut full = shape.storage_shape();
            full.push(components);
            let interleaved = ArrayView::from_shape(IxDyn(&full), values)
                .map_err(|e| BridgeError::shape(e.to_string()))?;
            let plane = interleaved
                .index_axis_move(Axis(full.len() - 1), component)
                .into_dimensionality::<D>()
                .map_err(|e| BridgeError::shape(e.to_string()))?;
            CowArray::from(plane)
        }
        None => {
            let values = array.data().strided_as::<T>(component, components);
            let image = Array::from_shape_vec(dim, values)
                .map_err(|e| BridgeError::shape(e.to_string()))?;
            CowArray::from(image)
        }
    };

    Ok(TypedImageView {
        data,
        shape: shape.clone(),
    })
}

/// Copy a typed view back into a new single-component generic array.
///
/// Elements are written in logical order, so the round trip through
/// [`to_typed_view`] reproduces the source buffer exactly.
pub fn from_typed_view<T: Element, D: ImageDimension>(
    view: &TypedImageView<'_, T, D>,
    name: impl Into<String>,
) -> GenericArray {
    let values: Vec<T> = view.data.iter().copied().collect();
    GenericArray::scalar(name, T::into_data(values))
}

/// Write a single-component `source` into component `component` of `dest`.
pub fn write_component(
    dest: &mut GenericArray,
    component: usize,
    source: &GenericArray,
) -> Result<(), BridgeError> {
    if source.components() != 1 {
        return Err(BridgeError::shape(format!(
            "'{}' has {} components, expected a scalar result",
            source.name(),
            source.components()
        )));
    }
    if component >= dest.components() {
        return Err(BridgeError::shape(format!(
            "component {component} out of range for '{}' with {} components",
            dest.name(),
            dest.components()
        )));
    }
    if source.len() != dest.tuple_count() {
        return Err(BridgeError::shape(format!(
            "result holds {} elements but '{}' has {} tuples",
            source.len(),
            dest.name(),
            dest.tuple_count()
        )));
    }
    let stride = dest.components();
    dest.data_mut().scatter_from(source.data(), component, stride)
}

// ============================================================================
// Runtime-Typed Images
// ============================================================================

/// Owned typed image whose element kind is only known at runtime.
///
/// This is what operators return: the output kind is declared by the
/// operator, not by the dispatch instantiation.
#[derive(Debug, Clone, PartialEq)]
pub enum DynImage<D: Dimension> {
    I8(Array<i8, D>),
    U8(Array<u8, D>),
    I16(Array<i16, D>),
    U16(Array<u16, D>),
    I32(Array<i32, D>),
    U32(Array<u32, D>),
    I64(Array<i64, D>),
    U64(Array<u64, D>),
    F32(Array<f32, D>),
    F64(Array<f64, D>),
}

macro_rules! for_each_image {
    ($image:expr, $inner:ident => $body:expr) => {
        match $image {
            DynImage::I8($inner) => $body,
            DynImage::U8($inner) => $body,
            DynImage::I16($inner) => $body,
            DynImage::U16($inner) => $body,
            DynImage::I32($inner) => $body,
            DynImage::U32($inner) => $body,
            DynImage::I64($inner) => $body,
            DynImage::U64($inner) => $body,
            DynImage::F32($inner) => $body,
            DynImage::F64($inner) => $body,
        }
    };
}

impl<D: Dimension> DynImage<D> {
    pub fn kind(&self) -> ElementKind {
        match self {
            DynImage::I8(_) => ElementKind::I8,
            DynImage::U8(_) => ElementKind::U8,
            DynImage::I16(_) => ElementKind::I16,
            DynImage::U16(_) => ElementKind::U16,
            DynImage::I32(_) => ElementKind::I32,
            DynImage::U32(_) => ElementKind::U32,
            DynImage::I64(_) => ElementKind::I64,
            DynImage::U64(_) => ElementKind::U64,
            DynImage::F32(_) => ElementKind::F32,
            DynImage::F64(_) => ElementKind::F64,
        }
    }

    pub fn raw_dim(&self) -> D {
        for_each_image!(self, image => image.raw_dim())
    }

    /// Flatten into generic storage in logical (x-fastest) order.
    pub fn into_data(self) -> ArrayData {
        match self {
            DynImage::I8(image) => ArrayData::I8(into_logical_vec(image)),
            DynImage::U8(image) => ArrayData::U8(into_logical_vec(image)),
            DynImage::I16(image) => ArrayData::I16(into_logical_vec(image)),
            DynImage::U16(image) => ArrayData::U16(into_logical_vec(image)),
            DynImage::I32(image) => ArrayData::I32(into_logical_vec(image)),
            DynImage::U32(image) => ArrayData::U32(into_logical_vec(image)),
            DynImage::I64(image) => ArrayData::I64(into_logical_vec(image)),
            DynImage::U64(image) => ArrayData::U64(into_logical_vec(image)),
            DynImage::F32(image) => ArrayData::F32(into_logical_vec(image)),
            DynImage::F64(image) => ArrayData::F64(into_logical_vec(image)),
        }
    }

    pub fn into_generic(self, name: impl Into<String>) -> GenericArray {
        GenericArray::scalar(name, self.into_data())
    }
}

fn into_logical_vec<T: Copy, D: Dimension>(image: Array<T, D>) -> Vec<T> {
    if !image.is_standard_layout() {
        return image.iter().copied().collect();
    }
    let len = image.len();
    let (mut raw, offset) = image.into_raw_vec_and_offset();
    raw.drain(..offset.unwrap_or(0));
    raw.truncate(len);
    raw
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, s, Array3};

    fn ramp<T: Element>(len: usize) -> Vec<T> {
        (0..len).map(|i| crate::element::saturating_cast(i as i64)).collect()
    }

    fn round_trip<T: Element, D: ImageDimension>(extent: Vec<usize>) {
        let shape = ShapeDescriptor::from_extent(extent);
        let values = ramp::<T>(shape.element_count());
        let array = GenericArray::from_vec("src", 1, values).unwrap();

        let view = to_typed_view::<T, D>(&array, &shape, 0).unwrap();
        assert!(view.is_borrowed());
        let back = from_typed_view(&view, "back");

        assert_eq!(back.data(), array.data(), "round trip failed for {}", T::KIND);
    }

    // ========================================================================
    // Round Trip
    // ========================================================================

    #[test]
    fn test_round_trip_every_kind_2d() {
        round_trip::<i8, Ix2>(vec![5, 4]);
        round_trip::<u8, Ix2>(vec![5, 4]);
        round_trip::<i16, Ix2>(vec![5, 4]);
        round_trip::<u16, Ix2>(vec![5, 4]);
        round_trip::<i32, Ix2>(vec![5, 4]);
        round_trip::<u32, Ix2>(vec![5, 4]);
        round_trip::<i64, Ix2>(vec![5, 4]);
        round_trip::<u64, Ix2>(vec![5, 4]);
        round_trip::<f32, Ix2>(vec![5, 4]);
        round_trip::<f64, Ix2>(vec![5, 4]);
    }

    #[test]
    fn test_round_trip_every_kind_3d() {
        round_trip::<i8, Ix3>(vec![3, 4, 5]);
        round_trip::<u8, Ix3>(vec![3, 4, 5]);
        round_trip::<i16, Ix3>(vec![3, 4, 5]);
        round_trip::<u16, Ix3>(vec![3, 4, 5]);
        round_trip::<i32, Ix3>(vec![3, 4, 5]);
        round_trip::<u32, Ix3>(vec![3, 4, 5]);
        round_trip::<i64, Ix3>(vec![3, 4, 5]);
        round_trip::<u64, Ix3>(vec![3, 4, 5]);
        round_trip::<f32, Ix3>(vec![3, 4, 5]);
        round_trip::<f64, Ix3>(vec![3, 4, 5]);
    }

    // ========================================================================
    // Layout
    // ========================================================================

    #[test]
    fn test_x_axis_varies_fastest() {
        let shape = ShapeDescriptor::from_extent(vec![3, 2]);
        let array = GenericArray::from_vec("a", 1, vec![0u8, 1, 2, 10, 11, 12]).unwrap();
        let view = to_typed_view::<u8, Ix2>(&array, &shape, 0).unwrap();

        assert_eq!(view.view(), array![[0u8, 1, 2], [10, 11, 12]]);
        assert_eq!(view.view()[[1, 2]], 12);
    }

    #[test]
    fn test_component_view_borrows() {
        let shape = ShapeDescriptor::from_extent(vec![2, 1]);
        let array = GenericArray::from_vec("rgb", 3, vec![1u8, 2, 3, 4, 5, 6]).unwrap();

        let green = to_typed_view::<u8, Ix2>(&array, &shape, 1).unwrap();
        assert!(green.is_borrowed());
        assert_eq!(green.view(), array![[2u8, 5]]);
    }

    #[test]
    fn test_widening_copies() {
        let shape = ShapeDescriptor::from_extent(vec![2, 2]);
        let array = GenericArray::from_vec("a", 1, vec![1u16, 2, 3, 65535]).unwrap();

        let view = to_typed_view::<f64, Ix2>(&array, &shape, 0).unwrap();
        assert!(!view.is_borrowed());
        assert_eq!(view.view()[[1, 1]], 65535.0);
    }

    #[test]
    fn test_owned_view_checks_geometry() {
        let shape = ShapeDescriptor::from_extent(vec![3, 2]);
        let image = Array::from_shape_vec((2, 3), vec![1i64, 2, 3, 4, 5, 6]).unwrap();
        let view = TypedImageView::owned(image.clone(), shape.clone()).unwrap();
        assert!(!view.is_borrowed());
        assert_eq!(view.shape(), &shape);
        assert_eq!(view.into_owned(), image);

        let transposed = Array::from_shape_vec((3, 2), vec![0i64; 6]).unwrap();
        assert!(TypedImageView::owned(transposed, shape).is_err());
    }

    // ========================================================================
    // Failures
    // ========================================================================

    #[test]
    fn test_narrowing_is_type_mismatch() {
        let shape = ShapeDescriptor::from_extent(vec![2, 2]);
        let array = GenericArray::from_vec("a", 1, vec![1.0f32; 4]).unwrap();
        let err = to_typed_view::<u8, Ix2>(&array, &shape, 0).unwrap_err();
        assert!(matches!(
            err,
            BridgeError::TypeMismatch {
                from: ElementKind::F32,
                to: ElementKind::U8
            }
        ));
    }

    #[test]
    fn test_cross_signedness_is_type_mismatch() {
        let shape = ShapeDescriptor::from_extent(vec![2, 2]);
        let array = GenericArray::from_vec("a", 1, vec![1u8; 4]).unwrap();
        assert!(to_typed_view::<i16, Ix2>(&array, &shape, 0).is_err());
        assert!(to_typed_view::<u16, Ix2>(&array, &shape, 0).is_ok());
    }

    #[test]
    fn test_extent_mismatch_is_shape_mismatch() {
        let shape = ShapeDescriptor::from_extent(vec![3, 3]);
        let array = GenericArray::from_vec("a", 1, vec![0u8; 8]).unwrap();
        let err = to_typed_view::<u8, Ix2>(&array, &shape, 0).unwrap_err();
        assert_eq!(err.code(), -6);
    }

    #[test]
    fn test_rank_mismatch_is_shape_mismatch() {
        let shape = ShapeDescriptor::from_extent(vec![2, 2, 2]);
        let array = GenericArray::from_vec("a", 1, vec![0u8; 8]).unwrap();
        let err = to_typed_view::<u8, Ix2>(&array, &shape, 0).unwrap_err();
        assert_eq!(err.code(), -6);
    }

    // ========================================================================
    // Write Back
    // ========================================================================

    #[test]
    fn test_write_component_interleaves() {
        let mut dest = GenericArray::zeros("out", ElementKind::I32, 2, 3).unwrap();
        let first = GenericArray::from_vec("c0", 1, vec![1i32, 2, 3]).unwrap();
        let second = GenericArray::from_vec("c1", 1, vec![-1i32, -2, -3]).unwrap();

        write_component(&mut dest, 0, &first).unwrap();
        write_component(&mut dest, 1, &second).unwrap();

        assert_eq!(dest.as_slice::<i32>().unwrap(), &[1, -1, 2, -2, 3, -3]);
    }

    #[test]
    fn test_write_component_checks_length() {
        let mut dest = GenericArray::zeros("out", ElementKind::U8, 1, 4).unwrap();
        let short = GenericArray::from_vec("c0", 1, vec![1u8, 2]).unwrap();
        assert_eq!(write_component(&mut dest, 0, &short).unwrap_err().code(), -6);
    }

    #[test]
    fn test_dyn_image_flattens_sliced_arrays() {
        let full = Array3::<u8>::from_shape_fn((2, 2, 3), |(z, y, x)| (z * 6 + y * 3 + x) as u8);
        let sliced = full.slice_move(s![1.., .., ..]);
        let data = DynImage::U8(sliced).into_data();
        assert_eq!(data, ArrayData::U8(vec![6, 7, 8, 9, 10, 11]));
    }
}
