//! Standard operator library.
//!
//! ## Catalog
//!
//! | Operator | Input kinds | Output kind | Module |
//! |----------|-------------|-------------|--------|
//! | identity | any | input | - |
//! | cast | any | `to` | pixelwise |
//! | tan | f32, f64 | input | pixelwise |
//! | sqrt | f32, f64 (integers promoted to f64) | input | pixelwise |
//! | binary_threshold | any | u8 | pixelwise |
//! | box_mean | any | input | blur |
//! | dilate, erode | any | input | morphology |
//! | valued_regional_minima | any | input | regional |
//!
//! Every filter is generic over the element type and the `ndarray`
//! dimension, so one source serves all 20 compiled instantiations. Output
//! shape always equals input shape.
//!
//! ## Parallelism
//!
//! Pixel-wise and separable passes run through `Zip::par_*`; neighborhood
//! filters split the output buffer with rayon. The flood fill in `regional`
//! is sequential.

pub mod blur;
pub mod morphology;
mod neighborhood;
pub mod pixelwise;
pub mod regional;

use crate::element::Element;
use crate::operator::OperatorDescriptor;
use crate::shim::{OperatorError, OperatorLibrary};
use crate::view::{DynImage, ImageDimension, TypedImageView};

/// The built-in implementations of every [`OperatorDescriptor`].
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardOperators;

impl OperatorLibrary for StandardOperators {
    fn run<T: Element, D: ImageDimension>(
        &self,
        operator: &OperatorDescriptor,
        input: &TypedImageView<'_, T, D>,
    ) -> Result<DynImage<D>, OperatorError> {
        let view = input.view();
        match operator {
            OperatorDescriptor::Identity => Ok(T::into_image(view.to_owned())),
            OperatorDescriptor::Cast { to } => Ok(pixelwise::cast_to(view, *to)),
            OperatorDescriptor::Tan => pixelwise::tan(view).map(T::into_image),
            OperatorDescriptor::Sqrt => pixelwise::sqrt(view).map(T::into_image),
            OperatorDescriptor::BinaryThreshold {
                lower,
                upper,
                inside,
                outside,
            } => Ok(DynImage::U8(pixelwise::binary_threshold(
                view, *lower, *upper, *inside, *outside,
            ))),
            OperatorDescriptor::BoxMean { radius } => Ok(T::into_image(blur::box_mean(view, radius))),
            OperatorDescriptor::Dilate { radius } => morphology::dilate(view, *radius).map(T::into_image),
            OperatorDescriptor::Erode { radius } => morphology::erode(view, *radius).map(T::into_image),
            OperatorDescriptor::ValuedRegionalMinima { fully_connected } => {
                regional::valued_regional_minima(view, *fully_connected).map(T::into_image)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array::GenericArray;
    use crate::element::ElementKind;
    use crate::geometry::ShapeDescriptor;
    use crate::view::to_typed_view;
    use ndarray::{array, Ix2, Ix3};

    fn run_2d<T: Element>(op: OperatorDescriptor, values: Vec<T>, extent: Vec<usize>) -> DynImage<Ix2> {
        let shape = ShapeDescriptor::from_extent(extent);
        let array = GenericArray::from_vec("in", 1, values).unwrap();
        let view = to_typed_view::<T, Ix2>(&array, &shape, 0).unwrap();
        StandardOperators.run(&op, &view).unwrap()
    }

    #[test]
    fn test_every_operator_keeps_shape() {
        let ops = [
            OperatorDescriptor::Identity,
            OperatorDescriptor::Cast {
                to: ElementKind::I64,
            },
            OperatorDescriptor::Tan,
            OperatorDescriptor::Sqrt,
            OperatorDescriptor::BinaryThreshold {
                lower: 0.0,
                upper: 1.0,
                inside: 1,
                outside: 0,
            },
            OperatorDescriptor::BoxMean { radius: [1, 1, 1] },
            OperatorDescriptor::Dilate { radius: 1.0 },
            OperatorDescriptor::Erode { radius: 1.0 },
            OperatorDescriptor::ValuedRegionalMinima {
                fully_connected: true,
            },
        ];
        let shape = ShapeDescriptor::from_extent(vec![4, 3, 2]);
        let array = GenericArray::from_vec("in", 1, (0..24).map(|i| i as f64 * 0.05).collect::<Vec<f64>>()).unwrap();
        let view = to_typed_view::<f64, Ix3>(&array, &shape, 0).unwrap();

        for op in ops {
            let out = StandardOperators.run(&op, &view).unwrap();
            assert_eq!(out.raw_dim(), view.view().raw_dim(), "{} changed the shape", op.name());
            assert_eq!(out.kind(), op.output_kind(ElementKind::F64), "{} output kind", op.name());
        }
    }

    #[test]
    fn test_identity_copies() {
        let out = run_2d(OperatorDescriptor::Identity, vec![1u32, 2, 3, 4], vec![2, 2]);
        assert_eq!(out, DynImage::U32(array![[1, 2], [3, 4]]));
    }

    #[test]
    fn test_threshold_outputs_labels() {
        let op = OperatorDescriptor::BinaryThreshold {
            lower: 2.0,
            upper: 3.0,
            inside: 7,
            outside: 1,
        };
        let out = run_2d(op, vec![1i8, 2, 3, 4], vec![4, 1]);
        assert_eq!(out, DynImage::U8(array![[1, 7, 7, 1]]));
    }

    #[test]
    fn test_tan_on_integer_view_fails() {
        let shape = ShapeDescriptor::from_extent(vec![1, 1]);
        let array = GenericArray::from_vec("in", 1, vec![1u8]).unwrap();
        let view = to_typed_view::<u8, Ix2>(&array, &shape, 0).unwrap();
        assert!(StandardOperators.run(&OperatorDescriptor::Tan, &view).is_err());
    }
}
