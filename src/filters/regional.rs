//! Valued regional minima.
//!
//! A regional minimum is a connected plateau of equal values with no
//! strictly lower neighbor. Plateaus are found by breadth-first flood fill;
//! minima keep their value and every other element is set to the maximum
//! of the element type. A flat image is a single minimum and comes back
//! unchanged.

use std::collections::VecDeque;

use ndarray::{Array, ArrayView, Dimension};

use super::neighborhood::Grid;
use crate::element::Element;
use crate::shim::OperatorError;

/// Mark regional minima of `input`.
///
/// # Arguments
/// * `input` - Scalar image
/// * `fully_connected` - Use the full 3^n neighborhood instead of face neighbors
pub fn valued_regional_minima<T: Element, D: Dimension>(
    input: ArrayView<'_, T, D>,
    fully_connected: bool,
) -> Result<Array<T, D>, OperatorError> {
    let grid = Grid::new(input.shape());
    let offsets = grid.connectivity(fully_connected);
    let values: Vec<T> = input.iter().copied().collect();
    let len = grid.len();

    let mut output = vec![T::max_value(); len];
    let mut visited = vec![false; len];
    let mut queue = VecDeque::new();
    let mut plateau = Vec::new();

    for seed in 0..len {
        if visited[seed] {
            continue;
        }
        let level = values[seed];
        let mut is_minimum = true;

        plateau.clear();
        visited[seed] = true;
        queue.push_back(seed);

        while let Some(index) = queue.pop_front() {
            plateau.push(index);
            let coords = grid.coords(index);
            for offset in &offsets {
                let Some(neighbor) = grid.neighbor(&coords, offset) else {
                    continue;
                };
                let value = values[neighbor];
                if value == level {
                    if !visited[neighbor] {
                        visited[neighbor] = true;
                        queue.push_back(neighbor);
                    }
                } else if value < level {
                    is_minimum = false;
                }
            }
        }

        if is_minimum {
            for &index in &plateau {
                output[index] = level;
            }
        }
    }

    Array::from_shape_vec(input.raw_dim(), output).map_err(|e| OperatorError::new(e.to_string()))
}
