//! Container and geometry collaborator.
//!
//! The engine only needs to look arrays up by path, read a container's
//! geometry and create output arrays. [`ContainerAccess`] is that contract;
//! [`DataContainerArray`] is the in-memory implementation used by the Python
//! module and the tests.

use std::collections::BTreeMap;
use std::fmt;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::array::{ArrayId, GenericArray};
use crate::element::ElementKind;
use crate::error::BridgeError;
use crate::geometry::{GeometryKind, ShapeDescriptor};

/// Location of an array: `container/array`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArrayPath {
    pub container: String,
    pub array: String,
}

impl ArrayPath {
    pub fn new(container: impl Into<String>, array: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            array: array.into(),
        }
    }

    /// Sibling array in the same container.
    pub fn with_array(&self, array: impl Into<String>) -> Self {
        Self::new(self.container.clone(), array)
    }
}

impl fmt::Display for ArrayPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.container, self.array)
    }
}

/// Data structure the controller reads from and writes into.
pub trait ContainerAccess {
    fn array(&self, path: &ArrayPath) -> Option<&GenericArray>;

    fn array_mut(&mut self, path: &ArrayPath) -> Option<&mut GenericArray>;

    /// `None` when the container does not exist.
    fn geometry_kind(&self, container: &str) -> Option<GeometryKind>;

    /// Shape of the container's image geometry, if it has one.
    fn shape_of(&self, container: &str) -> Option<ShapeDescriptor>;

    /// Create (or replace) a zero-filled array at `path`.
    fn create_array(
        &mut self,
        path: &ArrayPath,
        kind: ElementKind,
        components: usize,
        tuples: usize,
    ) -> Result<ArrayId, BridgeError>;
}

/// Geometry attached to a [`DataContainer`].
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Image(ShapeDescriptor),
    Other,
}

impl Geometry {
    pub fn kind(&self) -> GeometryKind {
        match self {
            Geometry::Image(_) => GeometryKind::Image,
            Geometry::Other => GeometryKind::Other,
        }
    }
}

/// A geometry plus the cell arrays defined on it.
#[derive(Debug)]
pub struct DataContainer {
    name: String,
    geometry: Geometry,
    arrays: BTreeMap<String, GenericArray>,
}

impl DataContainer {
    pub fn new(name: impl Into<String>, geometry: Geometry) -> Self {
        Self {
            name: name.into(),
            geometry,
            arrays: BTreeMap::new(),
        }
    }

    pub fn image(name: impl Into<String>, shape: ShapeDescriptor) -> Self {
        Self::new(name, Geometry::Image(shape))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// Insert `array` under its own name, returning the array it replaced.
    pub fn insert(&mut self, array: GenericArray) -> Option<GenericArray> {
        self.arrays.insert(array.name().to_string(), array)
    }

    pub fn get(&self, name: &str) -> Option<&GenericArray> {
        self.arrays.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<GenericArray> {
        self.arrays.remove(name)
    }

    pub fn array_names(&self) -> impl Iterator<Item = &str> {
        self.arrays.keys().map(String::as_str)
    }
}

/// Name-keyed set of data containers.
#[derive(Debug, Default)]
pub struct DataContainerArray {
    containers: BTreeMap<String, DataContainer>,
}

impl DataContainerArray {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, container: DataContainer) {
        self.containers.insert(container.name().to_string(), container);
    }

    pub fn container(&self, name: &str) -> Option<&DataContainer> {
        self.containers.get(name)
    }

    pub fn container_mut(&mut self, name: &str) -> Option<&mut DataContainer> {
        self.containers.get_mut(name)
    }
}

impl ContainerAccess for DataContainerArray {
    fn array(&self, path: &ArrayPath) -> Option<&GenericArray> {
        self.containers.get(&path.container)?.arrays.get(&path.array)
    }

    fn array_mut(&mut self, path: &ArrayPath) -> Option<&mut GenericArray> {
        self.containers
            .get_mut(&path.container)?
            .arrays
            .get_mut(&path.array)
    }

    fn geometry_kind(&self, container: &str) -> Option<GeometryKind> {
        self.containers.get(container).map(|c| c.geometry.kind())
    }

    fn shape_of(&self, container: &str) -> Option<ShapeDescriptor> {
        match &self.containers.get(container)?.geometry {
            Geometry::Image(shape) => Some(shape.clone()),
            Geometry::Other => None,
        }
    }

    fn create_array(
        &mut self,
        path: &ArrayPath,
        kind: ElementKind,
        components: usize,
        tuples: usize,
    ) -> Result<ArrayId, BridgeError> {
        let container = self
            .containers
            .get_mut(&path.container)
            .ok_or_else(|| BridgeError::not_found(format!("data container '{}'", path.container)))?;
        let array = GenericArray::zeros(path.array.clone(), kind, components, tuples)?;
        let id = array.id();
        debug!("allocated {path} as {kind} x{components} with {tuples} tuples");
        container.insert(array);
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> DataContainerArray {
        let mut data = DataContainerArray::new();
        data.add(DataContainer::image(
            "Image",
            ShapeDescriptor::from_extent(vec![4, 3]),
        ));
        data.add(DataContainer::new("Vertices", Geometry::Other));
        data
    }

    #[test]
    fn test_geometry_lookup() {
        let data = store();
        assert_eq!(data.geometry_kind("Image"), Some(GeometryKind::Image));
        assert_eq!(data.geometry_kind("Vertices"), Some(GeometryKind::Other));
        assert_eq!(data.geometry_kind("Missing"), None);
        assert_eq!(data.shape_of("Image").unwrap().element_count(), 12);
        assert!(data.shape_of("Vertices").is_none());
    }

    #[test]
    fn test_create_array_replaces_existing() {
        let mut data = store();
        let path = ArrayPath::new("Image", "Out");
        let first = data.create_array(&path, ElementKind::U8, 1, 12).unwrap();
        let second = data.create_array(&path, ElementKind::F32, 2, 12).unwrap();
        assert_ne!(first, second);

        let array = data.array(&path).unwrap();
        assert_eq!(array.id(), second);
        assert_eq!(array.kind(), ElementKind::F32);
        assert_eq!(array.len(), 24);
    }

    #[test]
    fn test_create_array_in_missing_container() {
        let mut data = store();
        let err = data
            .create_array(&ArrayPath::new("Nope", "Out"), ElementKind::U8, 1, 1)
            .unwrap_err();
        assert_eq!(err.code(), -2);
    }

    #[test]
    fn test_container_array_names() {
        let mut container = DataContainer::image("Image", ShapeDescriptor::from_extent(vec![2, 1]));
        container.insert(GenericArray::from_vec("b", 1, vec![1u8, 2]).unwrap());
        container.insert(GenericArray::from_vec("a", 1, vec![3u8, 4]).unwrap());
        assert_eq!(container.array_names().collect::<Vec<_>>(), vec!["a", "b"]);

        assert!(container.remove("a").is_some());
        assert!(container.get("a").is_none());
        assert_eq!(container.name(), "Image");
    }

    #[test]
    fn test_path_display() {
        assert_eq!(ArrayPath::new("Image", "Data").to_string(), "Image/Data");
    }
}
