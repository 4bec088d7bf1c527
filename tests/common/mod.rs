//! Fixtures shared by the integration tests.

#![allow(dead_code)]

use imagestag_bridge::{DataContainer, DataContainerArray, Element, GenericArray, ShapeDescriptor};

pub const CONTAINER: &str = "ImageDataContainer";
pub const INPUT: &str = "ImageData";

/// Geometry with extent `42 + 3i`, spacing `10.3 + 0.2i` and origin `-1.3 + i`.
pub fn reference_shape(rank: usize) -> ShapeDescriptor {
    let extent = (0..rank).map(|i| 42 + 3 * i).collect();
    let spacing = (0..rank).map(|i| 10.3 + 0.2 * i as f64).collect();
    let origin = (0..rank).map(|i| -1.3 + i as f64).collect();
    ShapeDescriptor::new(extent, spacing, origin).unwrap()
}

/// Tuple-major ramp: tuple `t`, component `c` holds `t * components + c`, saturated.
pub fn ramp<T: Element>(tuples: usize, components: usize) -> Vec<T> {
    (0..tuples * components)
        .map(|i| imagestag_bridge::element::saturating_cast::<i64, T>(i as i64))
        .collect()
}

/// Store with one image container holding `values` as the input array.
pub fn image_store<T: Element>(
    shape: ShapeDescriptor,
    components: usize,
    values: Vec<T>,
) -> DataContainerArray {
    let mut container = DataContainer::image(CONTAINER, shape);
    container.insert(GenericArray::from_vec(INPUT, components, values).unwrap());
    let mut data = DataContainerArray::new();
    data.add(container);
    data
}
