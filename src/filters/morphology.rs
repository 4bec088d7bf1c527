//! Grayscale morphology filters: Dilate, Erode.
//!
//! Both use a ball structuring element of `radius` voxels in every axis.
//! Neighbors outside the image are skipped, so borders see a clipped ball.

use ndarray::{Array, ArrayView, Dimension};
use rayon::prelude::*;

use super::neighborhood::Grid;
use crate::element::Element;
use crate::shim::OperatorError;

// ============================================================================
// Dilate
// ============================================================================

/// Grayscale dilation.
///
/// Takes the maximum value in the neighborhood, making bright regions grow
/// and dark regions shrink.
pub fn dilate<T: Element, D: Dimension>(
    input: ArrayView<'_, T, D>,
    radius: f64,
) -> Result<Array<T, D>, OperatorError> {
    rank_filter(input, radius, |candidate, best| candidate > best)
}

// ============================================================================
// Erode
// ============================================================================

/// Grayscale erosion.
///
/// Takes the minimum value in the neighborhood, making dark regions grow
/// and bright regions shrink.
pub fn erode<T: Element, D: Dimension>(
    input: ArrayView<'_, T, D>,
    radius: f64,
) -> Result<Array<T, D>, OperatorError> {
    rank_filter(input, radius, |candidate, best| candidate < best)
}

fn rank_filter<T: Element, D: Dimension>(
    input: ArrayView<'_, T, D>,
    radius: f64,
    replaces: fn(T, T) -> bool,
) -> Result<Array<T, D>, OperatorError> {
    if !radius.is_finite() || radius < 0.0 {
        return Err(OperatorError::new(format!("invalid structuring element radius {radius}")));
    }
    let grid = Grid::new(input.shape());
    let offsets = grid.ball(radius);
    let values: Vec<T> = input.iter().copied().collect();

    let mut output = values.clone();
    output.par_iter_mut().enumerate().for_each(|(index, slot)| {
        let coords = grid.coords(index);
        let mut best = values[index];
        for offset in &offsets {
            if let Some(neighbor) = grid.neighbor(&coords, offset) {
                let candidate = values[neighbor];
                if replaces(candidate, best) {
                    best = candidate;
                }
            }
        }
        *slot = best;
    });

    Array::from_shape_vec(input.raw_dim(), output).map_err(|e| OperatorError::new(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array3};

    #[test]
    fn test_dilate_single_point_2d() {
        let input = array![[0u8, 0, 0], [0, 9, 0], [0, 0, 0]];
        let out = dilate(input.view(), 1.0).unwrap();
        // Radius 1 ball is the cross.
        assert_eq!(out, array![[0, 9, 0], [9, 9, 9], [0, 9, 0]]);
    }

    #[test]
    fn test_erode_single_hole() {
        let input = array![[5.0f32, 5.0, 5.0], [5.0, -1.0, 5.0], [5.0, 5.0, 5.0]];
        let out = erode(input.view(), 1.5).unwrap();
        assert!(out.iter().all(|&v| v == -1.0));
    }

    #[test]
    fn test_zero_radius_is_identity() {
        let input = array![[3i16, -2], [7, 1]];
        assert_eq!(dilate(input.view(), 0.0).unwrap(), input);
        assert_eq!(erode(input.view(), 0.0).unwrap(), input);
    }

    #[test]
    fn test_dilate_3d_reaches_across_slices() {
        let mut input = Array3::<u16>::zeros((3, 3, 3));
        input[[0, 1, 1]] = 100;
        let out = dilate(input.view(), 1.0).unwrap();
        assert_eq!(out[[1, 1, 1]], 100);
        assert_eq!(out[[2, 1, 1]], 0);
        assert_eq!(out[[0, 0, 0]], 0);
    }

    #[test]
    fn test_radius_far_beyond_image_covers_everything() {
        let input = array![[1u8, 4], [2, 3]];
        assert_eq!(dilate(input.view(), 100_000.0).unwrap(), array![[4u8, 4], [4, 4]]);
        assert_eq!(erode(input.view(), 1e300).unwrap(), array![[1u8, 1], [1, 1]]);
    }

    #[test]
    fn test_negative_radius_fails() {
        let input = array![[1u8]];
        assert!(dilate(input.view(), -1.0).is_err());
    }
}
