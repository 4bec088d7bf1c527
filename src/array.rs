//! Type-erased, contiguous element buffers.
//!
//! A [`GenericArray`] is what the hosting pipeline stores: a named buffer of
//! one declared [`ElementKind`] with a fixed number of components per tuple.
//! Components are interleaved, so tuple `i` occupies
//! `[i * components, (i + 1) * components)`.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::element::{saturating_cast, Element, ElementKind};
use crate::error::BridgeError;

static NEXT_ARRAY_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of one allocated array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArrayId(u64);

impl ArrayId {
    fn next() -> Self {
        ArrayId(NEXT_ARRAY_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

/// Raw storage of a [`GenericArray`], one variant per element kind.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayData {
    I8(Vec<i8>),
    U8(Vec<u8>),
    I16(Vec<i16>),
    U16(Vec<u16>),
    I32(Vec<i32>),
    U32(Vec<u32>),
    I64(Vec<i64>),
    U64(Vec<u64>),
    F32(Vec<f32>),
    F64(Vec<f64>),
}

macro_rules! for_each_data {
    ($data:expr, $values:ident => $body:expr) => {
        match $data {
            ArrayData::I8($values) => $body,
            ArrayData::U8($values) => $body,
            ArrayData::I16($values) => $body,
            ArrayData::U16($values) => $body,
            ArrayData::I32($values) => $body,
            ArrayData::U32($values) => $body,
            ArrayData::I64($values) => $body,
            ArrayData::U64($values) => $body,
            ArrayData::F32($values) => $body,
            ArrayData::F64($values) => $body,
        }
    };
}

impl ArrayData {
    /// Zero-filled storage of `len` elements.
    pub fn zeros(kind: ElementKind, len: usize) -> Self {
        match kind {
            ElementKind::I8 => ArrayData::I8(vec![0; len]),
            ElementKind::U8 => ArrayData::U8(vec![0; len]),
            ElementKind::I16 => ArrayData::I16(vec![0; len]),
            ElementKind::U16 => ArrayData::U16(vec![0; len]),
            ElementKind::I32 => ArrayData::I32(vec![0; len]),
            ElementKind::U32 => ArrayData::U32(vec![0; len]),
            ElementKind::I64 => ArrayData::I64(vec![0; len]),
            ElementKind::U64 => ArrayData::U64(vec![0; len]),
            ElementKind::F32 => ArrayData::F32(vec![0.0; len]),
            ElementKind::F64 => ArrayData::F64(vec![0.0; len]),
        }
    }

    pub fn kind(&self) -> ElementKind {
        match self {
            ArrayData::I8(_) => ElementKind::I8,
            ArrayData::U8(_) => ElementKind::U8,
            ArrayData::I16(_) => ElementKind::I16,
            ArrayData::U16(_) => ElementKind::U16,
            ArrayData::I32(_) => ElementKind::I32,
            ArrayData::U32(_) => ElementKind::U32,
            ArrayData::I64(_) => ElementKind::I64,
            ArrayData::U64(_) => ElementKind::U64,
            ArrayData::F32(_) => ElementKind::F32,
            ArrayData::F64(_) => ElementKind::F64,
        }
    }

    pub fn len(&self) -> usize {
        for_each_data!(self, values => values.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy every `stride`-th element starting at `offset`, converted to `T`.
    ///
    /// Used to pull one component out of an interleaved buffer.
    pub fn strided_as<T: Element>(&self, offset: usize, stride: usize) -> Vec<T> {
        for_each_data!(self, values => values
            .iter()
            .skip(offset)
            .step_by(stride.max(1))
            .map(|&v| saturating_cast(v))
            .collect())
    }

    /// Scatter `source` into every `stride`-th element starting at `offset`.
    ///
    /// Both buffers must hold the same kind.
    pub(crate) fn scatter_from(
        &mut self,
        source: &ArrayData,
        offset: usize,
        stride: usize,
    ) -> Result<(), BridgeError> {
        macro_rules! scatter {
            ($($variant:ident),*) => {
                match (self, source) {
                    $(
                        (ArrayData::$variant(dst), ArrayData::$variant(src)) => {
                            for (d, s) in dst.iter_mut().skip(offset).step_by(stride.max(1)).zip(src) {
                                *d = *s;
                            }
                            Ok(())
                        }
                    )*
                    (dst, src) => Err(BridgeError::TypeMismatch {
                        from: src.kind(),
                        to: dst.kind(),
                    }),
                }
            };
        }
        scatter!(I8, U8, I16, U16, I32, U32, I64, U64, F32, F64)
    }
}

/// A named, type-erased element buffer owned by a data container.
#[derive(Debug)]
pub struct GenericArray {
    id: ArrayId,
    name: String,
    components: usize,
    data: ArrayData,
}

impl GenericArray {
    /// Wrap `data` as an array of `components`-tuples.
    ///
    /// Fails with `ShapeMismatch` when `components` is zero or does not
    /// divide the buffer length.
    pub fn new(
        name: impl Into<String>,
        components: usize,
        data: ArrayData,
    ) -> Result<Self, BridgeError> {
        let name = name.into();
        if components == 0 {
            return Err(BridgeError::shape(format!(
                "array '{name}' declares zero components"
            )));
        }
        if data.len() % components != 0 {
            return Err(BridgeError::shape(format!(
                "array '{name}' holds {} elements, not a multiple of {components} components",
                data.len()
            )));
        }
        Ok(Self {
            id: ArrayId::next(),
            name,
            components,
            data,
        })
    }

    /// Single-component array over `data`.
    pub fn scalar(name: impl Into<String>, data: ArrayData) -> Self {
        Self {
            id: ArrayId::next(),
            name: name.into(),
            components: 1,
            data,
        }
    }

    /// Zero-filled array of `tuples` tuples.
    pub fn zeros(
        name: impl Into<String>,
        kind: ElementKind,
        components: usize,
        tuples: usize,
    ) -> Result<Self, BridgeError> {
        Self::new(name, components, ArrayData::zeros(kind, tuples * components))
    }

    pub fn from_vec<T: Element>(
        name: impl Into<String>,
        components: usize,
        values: Vec<T>,
    ) -> Result<Self, BridgeError> {
        Self::new(name, components, T::into_data(values))
    }

    pub fn id(&self) -> ArrayId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ElementKind {
        self.data.kind()
    }

    pub fn components(&self) -> usize {
        self.components
    }

    /// Number of tuples (spatial locations).
    pub fn tuple_count(&self) -> usize {
        self.data.len() / self.components
    }

    /// Total number of scalar elements.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &ArrayData {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut ArrayData {
        &mut self.data
    }

    pub fn as_slice<T: Element>(&self) -> Option<&[T]> {
        T::slice(&self.data)
    }

    pub fn as_slice_mut<T: Element>(&mut self) -> Option<&mut [T]> {
        T::slice_mut(&mut self.data)
    }

    /// Same layout and contents under a new name and identity.
    pub fn duplicate(&self, name: impl Into<String>) -> Self {
        Self {
            id: ArrayId::next(),
            name: name.into(),
            components: self.components,
            data: self.data.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_ragged_components() {
        let err = GenericArray::from_vec("a", 3, vec![1u8, 2, 3, 4]).unwrap_err();
        assert_eq!(err.code(), -6);
        assert!(GenericArray::from_vec("a", 0, vec![1u8]).is_err());
    }

    #[test]
    fn test_tuple_count_and_kind() {
        let array = GenericArray::zeros("vec", ElementKind::I16, 3, 10).unwrap();
        assert_eq!(array.kind(), ElementKind::I16);
        assert_eq!(array.tuple_count(), 10);
        assert_eq!(array.len(), 30);
        assert!(array.as_slice::<i16>().is_some());
        assert!(array.as_slice::<u16>().is_none());
    }

    #[test]
    fn test_ids_are_unique() {
        let a = GenericArray::zeros("a", ElementKind::U8, 1, 4).unwrap();
        let b = a.duplicate("b");
        assert_ne!(a.id(), b.id());
        assert_eq!(a.data(), b.data());
    }

    #[test]
    fn test_strided_extracts_component() {
        let data = ArrayData::U8(vec![1, 10, 2, 20, 3, 30]);
        let second: Vec<u16> = data.strided_as(1, 2);
        assert_eq!(second, vec![10, 20, 30]);
    }

    #[test]
    fn test_scatter_writes_component() {
        let mut data = ArrayData::F32(vec![0.0; 6]);
        data.scatter_from(&ArrayData::F32(vec![1.0, 2.0]), 2, 3).unwrap();
        assert_eq!(data, ArrayData::F32(vec![0.0, 0.0, 1.0, 0.0, 0.0, 2.0]));

        let err = data
            .scatter_from(&ArrayData::U8(vec![1, 2]), 0, 3)
            .unwrap_err();
        assert_eq!(err.code(), -5);
    }
}
