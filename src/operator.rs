//! Operator catalog.
//!
//! Every image algorithm the engine can run is one [`OperatorDescriptor`]
//! variant: the operator's identity plus its typed parameters. The descriptor
//! also declares what the dispatch table needs to know about it (accepted
//! input kinds, promotion, output kind) so the table and the shim are
//! written once for the whole catalog. Every operator runs on one scalar
//! image; vector arrays are decomposed by the controller.
//!
//! Descriptors deserialize from an internally tagged map:
//!
//! ```toml
//! operator = "box_mean"
//! radius = [1, 1, 1]
//! ```

use serde::{Deserialize, Serialize};

use crate::element::ElementKind;
use crate::error::{BridgeError, BridgeWarning};
use crate::filters::blur::MAX_BOX_RADIUS;

/// Element kinds an operator is compiled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKinds {
    Any,
    Integer,
    Floating,
}

impl InputKinds {
    pub fn accepts(self, kind: ElementKind) -> bool {
        match self {
            InputKinds::Any => true,
            InputKinds::Integer => kind.is_integer(),
            InputKinds::Floating => kind.is_floating(),
        }
    }
}

fn default_lower() -> f64 {
    f64::NEG_INFINITY
}

fn default_upper() -> f64 {
    f64::INFINITY
}

fn default_inside() -> u8 {
    255
}

/// One algorithm and its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "operator", rename_all = "snake_case")]
pub enum OperatorDescriptor {
    /// Copy the input unchanged.
    Identity,
    /// Convert to another element kind, saturating at its bounds.
    Cast { to: ElementKind },
    /// Element-wise tangent.
    Tan,
    /// Element-wise square root; integer inputs are promoted to `f64`.
    Sqrt,
    /// Label image: `inside` where `lower <= v <= upper`, `outside` elsewhere.
    BinaryThreshold {
        #[serde(default = "default_lower")]
        lower: f64,
        #[serde(default = "default_upper")]
        upper: f64,
        #[serde(default = "default_inside")]
        inside: u8,
        #[serde(default)]
        outside: u8,
    },
    /// Mean over a box of half-widths `radius` (x, y, z), edges replicated.
    BoxMean { radius: [usize; 3] },
    /// Grayscale dilation with a ball of `radius` voxels.
    Dilate { radius: f64 },
    /// Grayscale erosion with a ball of `radius` voxels.
    Erode { radius: f64 },
    /// Keep regional minima at their value, set everything else to the
    /// maximum of the element type.
    ValuedRegionalMinima {
        #[serde(default)]
        fully_connected: bool,
    },
}

impl OperatorDescriptor {
    pub fn name(&self) -> &'static str {
        match self {
            OperatorDescriptor::Identity => "identity",
            OperatorDescriptor::Cast { .. } => "cast",
            OperatorDescriptor::Tan => "tan",
            OperatorDescriptor::Sqrt => "sqrt",
            OperatorDescriptor::BinaryThreshold { .. } => "binary_threshold",
            OperatorDescriptor::BoxMean { .. } => "box_mean",
            OperatorDescriptor::Dilate { .. } => "dilate",
            OperatorDescriptor::Erode { .. } => "erode",
            OperatorDescriptor::ValuedRegionalMinima { .. } => "valued_regional_minima",
        }
    }

    pub fn human_label(&self) -> &'static str {
        match self {
            OperatorDescriptor::Identity => "Identity Image Filter",
            OperatorDescriptor::Cast { .. } => "Cast Image Filter",
            OperatorDescriptor::Tan => "Tan Image Filter",
            OperatorDescriptor::Sqrt => "Sqrt Image Filter",
            OperatorDescriptor::BinaryThreshold { .. } => "Binary Threshold Image Filter",
            OperatorDescriptor::BoxMean { .. } => "Box Mean Image Filter",
            OperatorDescriptor::Dilate { .. } => "Grayscale Dilate Image Filter",
            OperatorDescriptor::Erode { .. } => "Grayscale Erode Image Filter",
            OperatorDescriptor::ValuedRegionalMinima { .. } => "Valued Regional Minima Image Filter",
        }
    }

    pub fn sub_group(&self) -> &'static str {
        match self {
            OperatorDescriptor::Identity | OperatorDescriptor::Cast { .. } => "Conversion",
            OperatorDescriptor::Tan | OperatorDescriptor::Sqrt => "IntensityTransformation",
            OperatorDescriptor::BinaryThreshold { .. } => "Thresholding",
            OperatorDescriptor::BoxMean { .. } => "Smoothing",
            OperatorDescriptor::Dilate { .. }
            | OperatorDescriptor::Erode { .. }
            | OperatorDescriptor::ValuedRegionalMinima { .. } => "MathematicalMorphology",
        }
    }

    pub fn input_kinds(&self) -> InputKinds {
        match self {
            OperatorDescriptor::Tan | OperatorDescriptor::Sqrt => InputKinds::Floating,
            _ => InputKinds::Any,
        }
    }

    /// Kind that rejected inputs may be widened to before running.
    pub fn promotion(&self) -> Option<ElementKind> {
        match self {
            OperatorDescriptor::Sqrt => Some(ElementKind::F64),
            _ => None,
        }
    }

    /// Output kind produced for an input of kind `input`.
    pub fn output_kind(&self, input: ElementKind) -> ElementKind {
        match self {
            OperatorDescriptor::Cast { to } => *to,
            OperatorDescriptor::BinaryThreshold { .. } => ElementKind::U8,
            _ => input,
        }
    }

    /// Check parameter consistency.
    pub fn validate(&self) -> Result<(), BridgeError> {
        match self {
            OperatorDescriptor::BinaryThreshold { lower, upper, .. } => {
                if lower.is_nan() || upper.is_nan() {
                    return Err(BridgeError::invalid("threshold bounds must be numbers"));
                }
                if lower > upper {
                    return Err(BridgeError::invalid(format!(
                        "lower threshold {lower} exceeds upper threshold {upper}"
                    )));
                }
                Ok(())
            }
            OperatorDescriptor::Dilate { radius } | OperatorDescriptor::Erode { radius } => {
                if !radius.is_finite() || *radius < 0.0 {
                    return Err(BridgeError::invalid(format!(
                        "structuring element radius must be a non-negative number, got {radius}"
                    )));
                }
                Ok(())
            }
            OperatorDescriptor::BoxMean { radius } => {
                if let Some(r) = radius.iter().find(|&&r| r > MAX_BOX_RADIUS) {
                    return Err(BridgeError::invalid(format!(
                        "box radius {r} exceeds the limit of {MAX_BOX_RADIUS}"
                    )));
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Warning for operators that narrow their input.
    pub fn conversion_warning(&self, input: ElementKind) -> Option<BridgeWarning> {
        match self {
            OperatorDescriptor::Cast { to } if !input.can_widen_to(*to) => {
                Some(BridgeWarning::LossyConversion {
                    from: input,
                    to: *to,
                })
            }
            _ => None,
        }
    }
}
