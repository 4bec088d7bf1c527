//! Image geometry: per-axis extent, spacing and origin.
//!
//! Axes are listed fastest-varying first (x, y, z), matching the order in
//! which tuples are stored in a [`GenericArray`](crate::array::GenericArray).

use serde::{Deserialize, Serialize};

use crate::error::BridgeError;

/// Kind of geometry attached to a data container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeometryKind {
    /// Uniform grid image geometry.
    Image,
    Other,
}

/// Shape of a uniform grid image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeDescriptor {
    extent: Vec<usize>,
    spacing: Vec<f64>,
    origin: Vec<f64>,
}

impl ShapeDescriptor {
    /// Build a descriptor; all three vectors must have the same, non-zero length.
    pub fn new(extent: Vec<usize>, spacing: Vec<f64>, origin: Vec<f64>) -> Result<Self, BridgeError> {
        if extent.is_empty() {
            return Err(BridgeError::shape("image geometry has no axes"));
        }
        if spacing.len() != extent.len() || origin.len() != extent.len() {
            return Err(BridgeError::shape(format!(
                "extent has {} axes but spacing has {} and origin has {}",
                extent.len(),
                spacing.len(),
                origin.len()
            )));
        }
        Ok(Self {
            extent,
            spacing,
            origin,
        })
    }

    /// Unit spacing, zero origin.
    pub fn from_extent(extent: Vec<usize>) -> Self {
        let rank = extent.len();
        Self {
            extent,
            spacing: vec![1.0; rank],
            origin: vec![0.0; rank],
        }
    }

    pub fn rank(&self) -> usize {
        self.extent.len()
    }

    pub fn extent(&self) -> &[usize] {
        &self.extent
    }

    pub fn spacing(&self) -> &[f64] {
        &self.spacing
    }

    pub fn origin(&self) -> &[f64] {
        &self.origin
    }

    /// Number of grid points (product of the extents).
    pub fn element_count(&self) -> usize {
        self.extent.iter().product()
    }

    /// Extents in storage order, slowest axis first (z, y, x).
    pub fn storage_shape(&self) -> Vec<usize> {
        self.extent.iter().rev().copied().collect()
    }
}
