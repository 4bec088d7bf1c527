//! Scalar-type × dimensionality dispatch table.
//!
//! The table is closed: every `(element kind, dimensionality)` pair below has
//! exactly one compiled instantiation, and everything else resolves to an
//! explicit `UnsupportedType`. Resolution is a pure lookup on the declared
//! metadata of the input array; no values are inspected.
//!
//! | Kind | 2-D | 3-D |
//! |------|-----|-----|
//! | i8, u8, i16, u16, i32, u32, i64, u64 | yes | yes |
//! | f32, f64 | yes | yes |
//!
//! Component count is orthogonal to the table: every operator works on scalar
//! images, so vector arrays are run once per component through the scalar
//! instantiation and recomposed in order. A component count of 1 is always a
//! scalar array.

use std::fmt;

use log::debug;
use ndarray::{Ix2, Ix3};

use crate::array::GenericArray;
use crate::element::{Element, ElementKind};
use crate::error::BridgeError;
use crate::geometry::ShapeDescriptor;
use crate::operator::OperatorDescriptor;
use crate::view::ImageDimension;

/// Image dimensionalities with compiled instantiations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimensionality {
    Two,
    Three,
}

impl Dimensionality {
    pub const ALL: [Dimensionality; 2] = [Dimensionality::Two, Dimensionality::Three];

    pub fn from_rank(rank: usize) -> Option<Self> {
        match rank {
            2 => Some(Dimensionality::Two),
            3 => Some(Dimensionality::Three),
            _ => None,
        }
    }

    pub fn rank(self) -> usize {
        match self {
            Dimensionality::Two => 2,
            Dimensionality::Three => 3,
        }
    }
}

/// Runtime metadata that selects an instantiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DispatchKey {
    pub kind: ElementKind,
    pub components: usize,
    pub rank: usize,
}

impl DispatchKey {
    pub fn new(kind: ElementKind, components: usize, rank: usize) -> Self {
        Self {
            kind,
            components,
            rank,
        }
    }

    /// Key for `array` indexed by `shape`.
    pub fn of(array: &GenericArray, shape: &ShapeDescriptor) -> Self {
        Self::new(array.kind(), array.components(), shape.rank())
    }
}

impl fmt::Display for DispatchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} x{} {}-D", self.kind, self.components, self.rank)
    }
}

/// Code path selected for one key and one operator.
///
/// Only [`DispatchTable::resolve`] constructs these, so every value refers to
/// a compiled pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instantiation {
    key: DispatchKey,
    input_kind: ElementKind,
    output_kind: ElementKind,
    dimensionality: Dimensionality,
}

impl Instantiation {
    pub fn key(&self) -> DispatchKey {
        self.key
    }

    /// Element kind the operator receives (the array kind, or its promotion).
    pub fn input_kind(&self) -> ElementKind {
        self.input_kind
    }

    pub fn output_kind(&self) -> ElementKind {
        self.output_kind
    }

    pub fn dimensionality(&self) -> Dimensionality {
        self.dimensionality
    }

    pub fn components(&self) -> usize {
        self.key.components
    }

    /// Run `target` with the static element type and dimension of this
    /// instantiation.
    pub fn dispatch<V: Instantiate>(&self, target: V) -> V::Output {
        instantiate_with(self.input_kind, self.dimensionality, target)
    }
}

/// Code that is generic over the element type and image dimension.
///
/// The dispatch table calls [`Instantiate::instantiate`] with the single
/// `(T, D)` pair selected at runtime.
pub trait Instantiate {
    type Output;

    fn instantiate<T: Element, D: ImageDimension>(self) -> Self::Output;
}

macro_rules! instantiation_table {
    ($($kind:ident => $ty:ty),* $(,)?) => {
        const SUPPORTED: &[(ElementKind, Dimensionality)] = &[
            $(
                (ElementKind::$kind, Dimensionality::Two),
                (ElementKind::$kind, Dimensionality::Three),
            )*
        ];

        fn instantiate_with<V: Instantiate>(
            kind: ElementKind,
            dimensionality: Dimensionality,
            target: V,
        ) -> V::Output {
            match (kind, dimensionality) {
                $(
                    (ElementKind::$kind, Dimensionality::Two) => target.instantiate::<$ty, Ix2>(),
                    (ElementKind::$kind, Dimensionality::Three) => target.instantiate::<$ty, Ix3>(),
                )*
            }
        }
    };
}

instantiation_table!(
    I8 => i8,
    U8 => u8,
    I16 => i16,
    U16 => u16,
    I32 => i32,
    U32 => u32,
    I64 => i64,
    U64 => u64,
    F32 => f32,
    F64 => f64,
);

/// The closed `(kind, dimensionality)` lookup.
pub struct DispatchTable;

impl DispatchTable {
    /// Every compiled pair.
    pub fn supported() -> &'static [(ElementKind, Dimensionality)] {
        SUPPORTED
    }

    pub fn contains(kind: ElementKind, dimensionality: Dimensionality) -> bool {
        SUPPORTED.contains(&(kind, dimensionality))
    }

    /// Resolve `key` for `operator`.
    ///
    /// Fails with `UnsupportedType` when the rank has no instantiation, the
    /// component count is zero, or the operator is not compiled for the
    /// array's kind (and the kind does not widen to the operator's promotion
    /// kind).
    pub fn resolve(
        key: &DispatchKey,
        operator: &OperatorDescriptor,
    ) -> Result<Instantiation, BridgeError> {
        let dimensionality = Dimensionality::from_rank(key.rank).ok_or_else(|| {
            BridgeError::unsupported(format!("no instantiation for {}-D images", key.rank))
        })?;
        if key.components == 0 {
            return Err(BridgeError::unsupported("arrays must have at least one component"));
        }

        let input_kind = if operator.input_kinds().accepts(key.kind) {
            key.kind
        } else {
            match operator.promotion() {
                Some(promoted) if key.kind.can_widen_to(promoted) => promoted,
                _ => {
                    return Err(BridgeError::unsupported(format!(
                        "{} is not defined for {} input",
                        operator.name(),
                        key.kind
                    )))
                }
            }
        };
        if !Self::contains(input_kind, dimensionality) {
            return Err(BridgeError::unsupported(format!(
                "no instantiation for {input_kind} {}-D images",
                key.rank
            )));
        }

        let output_kind = operator.output_kind(input_kind);
        debug!(
            "resolved {key} for {}: input {input_kind}, output {output_kind}",
            operator.name()
        );
        Ok(Instantiation {
            key: *key,
            input_kind,
            output_kind,
            dimensionality,
        })
    }
}
