//! Filter invocation shim.
//!
//! Runs one operator on one typed image and hands back its typed output. The
//! shim only does plumbing: it asks the [`OperatorLibrary`] to run the
//! descriptor, checks that the produced element kind is the declared one, and
//! turns every failure (including a panic inside the operator) into
//! `OperatorExecutionFailed`.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use log::debug;
use thiserror::Error;

use crate::element::{Element, ElementKind};
use crate::error::BridgeError;
use crate::operator::OperatorDescriptor;
use crate::view::{DynImage, ImageDimension, TypedImageView};

/// Failure reported by an operator implementation.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct OperatorError {
    pub message: String,
}

impl OperatorError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Supplier of compiled operator instantiations.
///
/// `run` is called with the element type and dimension selected by the
/// dispatch table; the library configures the algorithm from the descriptor,
/// runs it synchronously and returns an image of the descriptor's output kind.
pub trait OperatorLibrary {
    fn run<T: Element, D: ImageDimension>(
        &self,
        operator: &OperatorDescriptor,
        input: &TypedImageView<'_, T, D>,
    ) -> Result<DynImage<D>, OperatorError>;
}

/// Run `operator` on `input` through `library`.
///
/// # Arguments
/// * `library` - Operator implementations
/// * `operator` - Descriptor of the algorithm to run
/// * `input` - Typed input image
/// * `declared_output` - Output kind resolved by the dispatch table
///
/// # Returns
/// The operator's output image, or `OperatorExecutionFailed` carrying the
/// operator's own diagnostic text.
pub fn invoke<L, T, D>(
    library: &L,
    operator: &OperatorDescriptor,
    input: &TypedImageView<'_, T, D>,
    declared_output: ElementKind,
) -> Result<DynImage<D>, BridgeError>
where
    L: OperatorLibrary,
    T: Element,
    D: ImageDimension,
{
    let failed = |message: String| BridgeError::OperatorExecutionFailed {
        operator: operator.name().to_string(),
        message,
    };

    let output = match panic::catch_unwind(AssertUnwindSafe(|| library.run(operator, input))) {
        Ok(Ok(output)) => output,
        Ok(Err(err)) => return Err(failed(err.message)),
        Err(payload) => return Err(failed(panic_message(payload.as_ref()))),
    };

    if output.kind() != declared_output {
        return Err(failed(format!(
            "produced {} output, declared {declared_output}",
            output.kind()
        )));
    }
    debug!(
        "{} finished on {} {}-D input",
        operator.name(),
        T::KIND,
        D::RANK
    );
    Ok(output)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "operator panicked".to_string()
    }
}
