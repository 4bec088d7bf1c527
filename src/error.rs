//! Error and warning taxonomy for the dispatch engine.
//!
//! Every failure inside the adapter, dispatch table or shim is a
//! [`BridgeError`]. The controller turns them into recorded outcomes using the
//! stable codes below; hosts compare against the codes, not the messages.
//!
//! | Kind | Code |
//! |------|------|
//! | `NotFound` | -2 |
//! | `UnsupportedGeometry` | -3 |
//! | `UnsupportedType` | -4 |
//! | `TypeMismatch` | -5 |
//! | `ShapeMismatch` | -6 |
//! | `OperatorExecutionFailed` | -7 |
//! | `NotChecked` | -8 |
//! | `InvalidParameter` | -9 |

use thiserror::Error;

use crate::element::ElementKind;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BridgeError {
    #[error("{what} does not exist")]
    NotFound { what: String },
    #[error("container '{container}' does not have a uniform grid image geometry")]
    UnsupportedGeometry { container: String },
    #[error("unsupported type: {reason}")]
    UnsupportedType { reason: String },
    #[error("type mismatch: {from} cannot be interpreted as {to}")]
    TypeMismatch { from: ElementKind, to: ElementKind },
    #[error("shape mismatch: {reason}")]
    ShapeMismatch { reason: String },
    #[error("operator '{operator}' failed: {message}")]
    OperatorExecutionFailed { operator: String, message: String },
    #[error("execution requested without a successful data check")]
    NotChecked,
    #[error("invalid parameter: {reason}")]
    InvalidParameter { reason: String },
}

impl BridgeError {
    /// Stable negative code reported to the pipeline host.
    pub fn code(&self) -> i32 {
        match self {
            BridgeError::NotFound { .. } => -2,
            BridgeError::UnsupportedGeometry { .. } => -3,
            BridgeError::UnsupportedType { .. } => -4,
            BridgeError::TypeMismatch { .. } => -5,
            BridgeError::ShapeMismatch { .. } => -6,
            BridgeError::OperatorExecutionFailed { .. } => -7,
            BridgeError::NotChecked => -8,
            BridgeError::InvalidParameter { .. } => -9,
        }
    }

    pub(crate) fn not_found(what: impl Into<String>) -> Self {
        BridgeError::NotFound { what: what.into() }
    }

    pub(crate) fn unsupported(reason: impl Into<String>) -> Self {
        BridgeError::UnsupportedType {
            reason: reason.into(),
        }
    }

    pub(crate) fn shape(reason: impl Into<String>) -> Self {
        BridgeError::ShapeMismatch {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        BridgeError::InvalidParameter {
            reason: reason.into(),
        }
    }
}

/// Conditions that are reported but do not block the next state.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BridgeWarning {
    #[error("replaced existing array '{path}' with the filter output")]
    ReplacedExistingArray { path: String },
    #[error("converting {from} to {to} may lose precision or saturate")]
    LossyConversion { from: ElementKind, to: ElementKind },
}

impl BridgeWarning {
    /// Stable positive code reported to the pipeline host.
    pub fn code(&self) -> i32 {
        match self {
            BridgeWarning::ReplacedExistingArray { .. } => 1,
            BridgeWarning::LossyConversion { .. } => 2,
        }
    }
}
