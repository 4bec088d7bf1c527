//! Index arithmetic shared by the neighborhood filters.
//!
//! Images are handled as flat buffers in standard (last-axis-fastest)
//! order; a [`Grid`] converts between flat indices and coordinates and
//! enumerates structuring-element offsets for any rank.

/// Shape and strides of a flat standard-layout buffer.
#[derive(Debug, Clone)]
pub(crate) struct Grid {
    shape: Vec<usize>,
    strides: Vec<usize>,
}

impl Grid {
    pub fn new(shape: &[usize]) -> Self {
        let mut strides = vec![1; shape.len()];
        for axis in (0..shape.len().saturating_sub(1)).rev() {
            strides[axis] = strides[axis + 1] * shape[axis + 1];
        }
        Self {
            shape: shape.to_vec(),
            strides,
        }
    }

    pub fn len(&self) -> usize {
        self.shape.iter().product()
    }

    pub fn coords(&self, index: usize) -> Vec<usize> {
        self.strides
            .iter()
            .zip(&self.shape)
            .map(|(&stride, &extent)| (index / stride) % extent.max(1))
            .collect()
    }

    /// Flat index of `coords + offset`, or `None` outside the image.
    pub fn neighbor(&self, coords: &[usize], offset: &[isize]) -> Option<usize> {
        let mut index = 0;
        for axis in 0..self.shape.len() {
            let c = coords[axis] as isize + offset[axis];
            if c < 0 || c >= self.shape[axis] as isize {
                return None;
            }
            index += c as usize * self.strides[axis];
        }
        Some(index)
    }

    /// Offsets of a ball of `radius` voxels, center excluded.
    ///
    /// Each axis reaches at most `extent - 1`; longer offsets never land
    /// inside the image.
    pub fn ball(&self, radius: f64) -> Vec<Vec<isize>> {
        let reach: Vec<isize> = self
            .shape
            .iter()
            .map(|&extent| (radius.floor() as isize).min(extent as isize - 1).max(0))
            .collect();
        let r_sq = radius * radius;
        cube(&reach)
            .into_iter()
            .filter(|offset| {
                let dist_sq: isize = offset.iter().map(|d| d * d).sum();
                dist_sq > 0 && dist_sq as f64 <= r_sq
            })
            .collect()
    }

    /// Face neighbors, or every neighbor in the 3^n cube when `full`.
    pub fn connectivity(&self, full: bool) -> Vec<Vec<isize>> {
        cube(&vec![1; self.shape.len()])
            .into_iter()
            .filter(|offset| {
                let moved = offset.iter().filter(|&&d| d != 0).count();
                moved > 0 && (full || moved == 1)
            })
            .collect()
    }
}

/// Every offset with `|offset[axis]| <= reach[axis]`.
fn cube(reach: &[isize]) -> Vec<Vec<isize>> {
    let mut offsets = vec![Vec::with_capacity(reach.len())];
    for &r in reach {
        offsets = offsets
            .into_iter()
            .flat_map(|prefix| {
                (-r..=r).map(move |d| {
                    let mut next = prefix.clone();
                    next.push(d);
                    next
                })
            })
            .collect();
    }
    offsets
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coords_round_trip() {
        let grid = Grid::new(&[2, 3, 4]);
        assert_eq!(grid.len(), 24);
        assert_eq!(grid.coords(0), vec![0, 0, 0]);
        assert_eq!(grid.coords(23), vec![1, 2, 3]);
        assert_eq!(grid.neighbor(&[1, 2, 3], &[0, 0, 0]), Some(23));
    }

    #[test]
    fn test_neighbor_bounds() {
        let grid = Grid::new(&[3, 3]);
        assert_eq!(grid.neighbor(&[0, 0], &[-1, 0]), None);
        assert_eq!(grid.neighbor(&[2, 2], &[0, 1]), None);
        assert_eq!(grid.neighbor(&[1, 1], &[1, -1]), Some(6));
    }

    #[test]
    fn test_connectivity_counts() {
        assert_eq!(Grid::new(&[3, 3]).connectivity(false).len(), 4);
        assert_eq!(Grid::new(&[3, 3]).connectivity(true).len(), 8);
        assert_eq!(Grid::new(&[3, 3, 3]).connectivity(false).len(), 6);
        assert_eq!(Grid::new(&[3, 3, 3]).connectivity(true).len(), 26);
    }

    #[test]
    fn test_ball_offsets() {
        let grid = Grid::new(&[5, 5]);
        assert!(grid.ball(0.0).is_empty());
        assert_eq!(grid.ball(1.0).len(), 4);
        assert_eq!(grid.ball(1.5).len(), 8);
    }

    #[test]
    fn test_ball_reach_is_bounded_by_extent() {
        assert_eq!(Grid::new(&[2, 2]).ball(100_000.0).len(), 8);
        assert_eq!(Grid::new(&[1, 3]).ball(f64::MAX).len(), 4);
        assert_eq!(Grid::new(&[2, 1, 2]).ball(1e300).len(), 8);
    }
}
