//! Box mean filter.
//!
//! Separable: one pass per axis, each pass summing `2r + 1` samples along
//! the axis with edge samples replicated. Floating kinds are averaged in
//! `f64` after every pass. Integer kinds keep exact `i128` box sums through
//! all passes and are divided once, rounding half away from zero, so 64-bit
//! values survive unchanged.

use std::ops::{Add, Mul};

use ndarray::{Array, ArrayView, ArrayView1, ArrayViewMut1, Axis, Dimension, Zip};
use num_traits::{NumCast, Zero};

use crate::element::{saturating_cast, Element};

/// Largest accepted half-width per axis.
///
/// Keeps the product of window widths over three axes below 2^52, so integer
/// box sums of 64-bit values fit in `i128`.
pub const MAX_BOX_RADIUS: usize = 1 << 16;

/// Mean over a box of half-widths `radius`, given as `(x, y, z)`.
///
/// # Arguments
/// * `input` - Image in storage order (`[y, x]` or `[z, y, x]`)
/// * `radius` - Half-width per spatial axis, at most [`MAX_BOX_RADIUS`];
///   axes beyond the image rank are ignored
///
/// # Returns
/// Smoothed image of the same shape and element type
pub fn box_mean<T: Element, D: Dimension>(input: ArrayView<'_, T, D>, radius: &[usize; 3]) -> Array<T, D> {
    let ndim = input.ndim();
    // Storage axes run (z, y, x); radius runs (x, y, z).
    let radii: Vec<usize> = (0..ndim)
        .map(|axis| radius[ndim - 1 - axis].min(MAX_BOX_RADIUS))
        .collect();
    if radii.iter().all(|&r| r == 0) {
        return input.to_owned();
    }

    if T::KIND.is_integer() {
        let mut sums: Array<i128, D> = input.mapv(|v| v.to_i128().unwrap_or(0));
        let mut width: i128 = 1;
        for (axis, &r) in radii.iter().enumerate() {
            if r > 0 {
                window_pass(&mut sums, axis, r);
                width *= 2 * r as i128 + 1;
            }
        }
        sums.mapv(|sum| <T as NumCast>::from(div_round(sum, width)).unwrap_or_else(T::zero))
    } else {
        let mut acc: Array<f64, D> = input.mapv(|v| v.to_f64().unwrap_or(f64::NAN));
        for (axis, &r) in radii.iter().enumerate() {
            if r > 0 {
                window_pass(&mut acc, axis, r);
                let width = (2 * r + 1) as f64;
                acc.par_mapv_inplace(|v| v / width);
            }
        }
        acc.mapv(saturating_cast::<f64, T>)
    }
}

/// Replace every lane along `axis` by its `2r + 1` window sums.
fn window_pass<A, D>(values: &mut Array<A, D>, axis: usize, radius: usize)
where
    A: Copy + Zero + Add<Output = A> + Mul<Output = A> + NumCast + Send + Sync,
    D: Dimension,
{
    let source = values.clone();
    Zip::from(values.lanes_mut(Axis(axis)))
        .and(source.lanes(Axis(axis)))
        .par_for_each(|out, lane| window_sums(lane, out, radius));
}

fn window_sums<A>(source: ArrayView1<'_, A>, mut out: ArrayViewMut1<'_, A>, radius: usize)
where
    A: Copy + Zero + Add<Output = A> + Mul<Output = A> + NumCast,
{
    let n = source.len();
    if n == 0 {
        return;
    }
    let last = n - 1;
    let count = |c: usize| <A as NumCast>::from(c).unwrap_or_else(A::zero);

    for i in 0..n {
        let reach = i + radius;
        // Window positions before 0 and after `last` repeat the edge samples.
        let below = radius.saturating_sub(i);
        let above = reach.saturating_sub(last);
        let mut sum = count(below) * source[0] + count(above) * source[last];
        for j in i.saturating_sub(radius)..=reach.min(last) {
            sum = sum + source[j];
        }
        out[i] = sum;
    }
}

fn div_round(sum: i128, width: i128) -> i128 {
    let quotient = sum / width;
    let remainder = sum % width;
    if 2 * remainder.abs() >= width {
        quotient + sum.signum()
    } else {
        quotient
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2, Array3};

    #[test]
    fn test_zero_radius_is_identity() {
        let input = array![[1u8, 2, 3], [4, 5, 6]];
        assert_eq!(box_mean(input.view(), &[0, 0, 0]), input);
    }

    #[test]
    fn test_zero_radius_keeps_wide_integers() {
        let big = (1i64 << 53) + 1;
        let input = array![[big, 3]];
        assert_eq!(box_mean(input.view(), &[0, 0, 0]), input);

        let input = array![[u64::MAX, u64::MAX - 1]];
        assert_eq!(box_mean(input.view(), &[0, 5, 0]), input);
    }

    #[test]
    fn test_wide_integer_means_are_exact() {
        let base = 1i64 << 53;
        let input = array![[base + 1, base + 3, base + 5]];
        let out = box_mean(input.view(), &[1, 0, 0]);
        // Window sums / 3: base + 5/3, base + 3, base + 13/3.
        assert_eq!(out, array![[base + 2, base + 3, base + 4]]);
    }

    #[test]
    fn test_constant_image_unchanged() {
        let input = Array3::<f32>::from_elem((3, 4, 5), 2.5);
        let out = box_mean(input.view(), &[1, 2, 1]);
        for v in out.iter() {
            assert!((v - 2.5).abs() < 1e-6);
        }
    }

    #[test]
    fn test_x_radius_only_smooths_rows() {
        let input = array![[0.0f64, 3.0, 0.0], [6.0, 6.0, 6.0]];
        let out = box_mean(input.view(), &[1, 0, 0]);
        // Row 0 with replicated edges: [0,0,3], [0,3,0], [3,0,0].
        assert_eq!(out, array![[1.0, 1.0, 1.0], [6.0, 6.0, 6.0]]);
    }

    #[test]
    fn test_integer_rounding() {
        let input = array![[0u8, 0, 2]];
        let out = box_mean(input.view(), &[1, 0, 0]);
        // Means are 0, 0.667, 1.333.
        assert_eq!(out, array![[0u8, 1, 1]]);

        let negative = array![[-1i8, -2, 0]];
        // Means are -1.333, -1, -0.667.
        assert_eq!(box_mean(negative.view(), &[1, 0, 0]), array![[-1i8, -1, -1]]);
    }

    #[test]
    fn test_y_axis_maps_to_rows() {
        let input = Array2::<i32>::from_shape_fn((3, 1), |(y, _)| if y == 1 { 9 } else { 0 });
        let out = box_mean(input.view(), &[0, 1, 0]);
        assert_eq!(out, array![[3], [3], [3]]);
    }

    #[test]
    fn test_radius_longer_than_lane_replicates_edges() {
        let input = array![[4u8, 8]];
        // Sums are 720004 and 720008 over 120001 samples.
        assert_eq!(box_mean(input.view(), &[60_000, 0, 0]), array![[6u8, 6]]);

        let input = array![[4.0f32, 8.0]];
        let out = box_mean(input.view(), &[MAX_BOX_RADIUS, 0, 0]);
        assert!(out.iter().all(|&v| (v - 6.0).abs() < 1e-3));
    }
}
