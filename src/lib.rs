//! ImageStag Bridge
//!
//! Runs statically typed image operators on arrays whose element type,
//! component count and dimensionality are only known at runtime, with
//! Python bindings via PyO3.
//!
//! ## Pipeline
//!
//! ```text
//! GenericArray + ShapeDescriptor
//!     -> DispatchKey (kind, components, rank)
//!     -> DispatchTable::resolve       (closed table, 10 kinds x {2-D, 3-D})
//!     -> to_typed_view                (borrowed, or widened copy)
//!     -> shim::invoke                 (one call per component)
//!     -> DynImage -> GenericArray     (written back in x-fastest order)
//! ```
//!
//! [`FilterController`] drives the two phases (data check, execute) and
//! reports failures through numeric codes in an [`OutcomeReporter`]:
//!
//! | Code | Meaning |
//! |------|---------|
//! | -2 | array or container not found |
//! | -3 | geometry is not an image |
//! | -4 | unsupported element type, rank or component count |
//! | -5 | element type mismatch |
//! | -6 | shape mismatch |
//! | -7 | operator execution failed |
//! | -8 | execute without a successful data check |
//! | -9 | invalid parameter |
//!
//! ## Element Types
//!
//! `i8`, `u8`, `i16`, `u16`, `i32`, `u32`, `i64`, `u64`, `f32`, `f64`.
//! Multi-component arrays are interleaved per tuple and processed one
//! component at a time.

pub mod array;
pub mod config;
pub mod container;
pub mod controller;
pub mod dispatch;
pub mod element;
pub mod error;
pub mod filters;
pub mod geometry;
pub mod operator;
pub mod outcome;
pub mod shim;
pub mod view;

pub use array::{ArrayData, ArrayId, GenericArray};
pub use config::{ConfigError, FilterConfig};
pub use container::{ArrayPath, ContainerAccess, DataContainer, DataContainerArray, Geometry};
pub use controller::{FilterController, FilterState};
pub use dispatch::{Dimensionality, DispatchKey, DispatchTable, Instantiate, Instantiation};
pub use element::{Element, ElementKind};
pub use error::{BridgeError, BridgeWarning};
pub use filters::StandardOperators;
pub use geometry::{GeometryKind, ShapeDescriptor};
pub use operator::OperatorDescriptor;
pub use outcome::OutcomeReporter;
pub use shim::{OperatorError, OperatorLibrary};
pub use view::{DynImage, ImageDimension, TypedImageView};

// Python bindings (only when python feature is enabled)
#[cfg(feature = "python")]
mod python {
    use ndarray::{ArrayD, IxDyn};
    use numpy::{IntoPyArray, PyArrayDyn, PyArrayMethods};
    use pyo3::exceptions::PyValueError;
    use pyo3::prelude::*;

    use crate::array::{ArrayData, GenericArray};
    use crate::config::FilterConfig;
    use crate::container::{ArrayPath, ContainerAccess, DataContainer, DataContainerArray};
    use crate::controller::{FilterController, FilterState};
    use crate::geometry::ShapeDescriptor;
    use crate::operator::OperatorDescriptor;

    const CONTAINER: &str = "Image";
    const INPUT: &str = "Input";
    const OUTPUT: &str = "Output";

    /// Read any supported numpy array into generic storage.
    fn read_array(array: &Bound<'_, PyAny>) -> PyResult<(Vec<usize>, ArrayData)> {
        macro_rules! try_dtype {
            ($($ty:ty => $variant:ident),*) => {
                $(
                    if let Ok(typed) = array.downcast::<PyArrayDyn<$ty>>() {
                        let readonly = typed.readonly();
                        let view = readonly.as_array();
                        return Ok((view.shape().to_vec(), ArrayData::$variant(view.iter().copied().collect())));
                    }
                )*
            };
        }
        try_dtype!(
            i8 => I8, u8 => U8, i16 => I16, u16 => U16, i32 => I32,
            u32 => U32, i64 => I64, u64 => U64, f32 => F32, f64 => F64
        );
        Err(PyValueError::new_err("unsupported array dtype"))
    }

    /// Geometry extent (x first) for a numpy shape `(y, x[, c])` or `(z, y, x[, c])`.
    fn extent_of(shape: &[usize], components: usize) -> PyResult<Vec<usize>> {
        let spatial = match (components, shape.len()) {
            (0, _) => return Err(PyValueError::new_err("components must be at least 1")),
            (1, 2 | 3) => shape,
            (c, 3 | 4) if shape[shape.len() - 1] == c => &shape[..shape.len() - 1],
            _ => {
                return Err(PyValueError::new_err(format!(
                    "array of shape {shape:?} is not a 2-D or 3-D image with {components} component(s)"
                )))
            }
        };
        Ok(spatial.iter().rev().copied().collect())
    }

    fn to_numpy<'py>(py: Python<'py>, shape: &[usize], data: &ArrayData) -> PyResult<Bound<'py, PyAny>> {
        macro_rules! emit {
            ($($variant:ident),*) => {
                match data {
                    $(
                        ArrayData::$variant(values) => ArrayD::from_shape_vec(IxDyn(shape), values.clone())
                            .map(|a| a.into_pyarray(py).into_any()),
                    )*
                }
            };
        }
        emit!(I8, U8, I16, U16, I32, U32, I64, U64, F32, F64)
            .map_err(|e| PyValueError::new_err(e.to_string()))
    }

    /// Run one operator on a numpy image.
    ///
    /// # Arguments
    /// * `array` - Image of shape (y, x), (z, y, x), or with a trailing
    ///   component axis when `components > 1`
    /// * `operator` - JSON descriptor, e.g. `{"operator": "box_mean", "radius": [1, 1, 0]}`
    /// * `components` - Number of interleaved components per pixel
    ///
    /// # Returns
    /// The filtered image; shape follows the input, dtype the operator's output kind
    #[pyfunction]
    #[pyo3(signature = (array, operator, components=1))]
    pub fn apply_filter<'py>(
        py: Python<'py>,
        array: &Bound<'py, PyAny>,
        operator: &str,
        components: usize,
    ) -> PyResult<Bound<'py, PyAny>> {
        let operator: OperatorDescriptor =
            serde_json::from_str(operator).map_err(|e| PyValueError::new_err(e.to_string()))?;
        let (shape, data) = read_array(array)?;
        let extent = extent_of(&shape, components)?;

        let input = GenericArray::new(INPUT, components, data).map_err(|e| PyValueError::new_err(e.to_string()))?;
        let mut container = DataContainer::image(CONTAINER, ShapeDescriptor::from_extent(extent));
        container.insert(input);
        let mut store = DataContainerArray::new();
        store.add(container);

        let config = FilterConfig::new(ArrayPath::new(CONTAINER, INPUT), operator).with_output_name(OUTPUT);
        let mut controller = FilterController::new(config);
        let state = py.allow_threads(|| controller.process(&mut store));
        if state != FilterState::Executed {
            let outcome = controller.outcome();
            return Err(PyValueError::new_err(format!(
                "[{}] {}",
                outcome.error_code(),
                outcome.error_message().unwrap_or("filter failed")
            )));
        }

        let output = store
            .array(&ArrayPath::new(CONTAINER, OUTPUT))
            .ok_or_else(|| PyValueError::new_err("filter produced no output"))?;
        to_numpy(py, &shape, output.data())
    }

    /// Python module definition
    #[pymodule]
    pub fn imagestag_bridge(m: &Bound<'_, PyModule>) -> PyResult<()> {
        m.add_function(wrap_pyfunction!(apply_filter, m)?)?;
        Ok(())
    }
}
