//! Data-check / execute controller.
//!
//! One [`FilterController`] drives one filter step over one target array:
//!
//! ```text
//! Idle --data_check--> Checked --execute--> Executed
//!   \                     \
//!    `------------------- `--------------> Failed
//! ```
//!
//! The data check validates the geometry and input array, resolves the
//! dispatch key and allocates (or locates) the output array. Execution
//! re-resolves the recorded key, builds typed views, runs the operator once
//! per component and writes the results back. Errors never escape a phase;
//! they are recorded in the [`OutcomeReporter`] and move the controller to
//! `Failed`. A fresh data check restarts from there.
//!
//! A controller is not reentrant: the host serializes calls per step.

use log::debug;

use crate::array::{ArrayId, GenericArray};
use crate::config::FilterConfig;
use crate::container::{ArrayPath, ContainerAccess};
use crate::dispatch::{DispatchKey, DispatchTable, Instantiate, Instantiation};
use crate::element::{Element, ElementKind};
use crate::error::{BridgeError, BridgeWarning};
use crate::filters::StandardOperators;
use crate::geometry::{GeometryKind, ShapeDescriptor};
use crate::operator::OperatorDescriptor;
use crate::outcome::OutcomeReporter;
use crate::shim::{self, OperatorLibrary};
use crate::view::{self, ImageDimension};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterState {
    Idle,
    Checked,
    Executed,
    Failed,
}

/// What the data check decided, reused by execution.
#[derive(Debug, Clone, PartialEq)]
struct ExecutionPlan {
    instantiation: Instantiation,
    output: ArrayPath,
    output_id: ArrayId,
}

pub struct FilterController<L = StandardOperators> {
    config: FilterConfig,
    library: L,
    state: FilterState,
    plan: Option<ExecutionPlan>,
    allocated: Option<(ArrayPath, ArrayId)>,
    outcome: OutcomeReporter,
}

impl FilterController<StandardOperators> {
    pub fn new(config: FilterConfig) -> Self {
        Self::with_library(config, StandardOperators)
    }
}

impl<L: OperatorLibrary> FilterController<L> {
    pub fn with_library(config: FilterConfig, library: L) -> Self {
        Self {
            config,
            library,
            state: FilterState::Idle,
            plan: None,
            allocated: None,
            outcome: OutcomeReporter::new(),
        }
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Replace the configuration; the controller returns to `Idle`.
    pub fn set_config(&mut self, config: FilterConfig) {
        self.config = config;
        self.state = FilterState::Idle;
        self.plan = None;
    }

    pub fn state(&self) -> FilterState {
        self.state
    }

    pub fn outcome(&self) -> &OutcomeReporter {
        &self.outcome
    }

    /// Key recorded by the last successful data check.
    pub fn resolved_key(&self) -> Option<DispatchKey> {
        self.plan.as_ref().map(|p| p.instantiation.key())
    }

    pub fn instantiation(&self) -> Option<Instantiation> {
        self.plan.as_ref().map(|p| p.instantiation)
    }

    pub fn output_path(&self) -> Option<&ArrayPath> {
        self.plan.as_ref().map(|p| &p.output)
    }

    pub fn output_array_id(&self) -> Option<ArrayId> {
        self.plan.as_ref().map(|p| p.output_id)
    }

    // ========================================================================
    // Data Check
    // ========================================================================

    /// Validate the configuration against `data` and prepare the output.
    pub fn data_check<C: ContainerAccess>(&mut self, data: &mut C) -> FilterState {
        self.outcome.reset();
        self.plan = None;
        match self.check(data) {
            Ok(plan) => {
                self.plan = Some(plan);
                self.state = FilterState::Checked;
            }
            Err(err) => {
                self.outcome.record(&err);
                self.state = FilterState::Failed;
            }
        }
        self.state
    }

    fn check<C: ContainerAccess>(&mut self, data: &mut C) -> Result<ExecutionPlan, BridgeError> {
        self.config.operator.validate()?;

        let input_path = self.config.input.clone();
        let shape = image_shape(data, &input_path.container)?;
        let input = data
            .array(&input_path)
            .ok_or_else(|| BridgeError::not_found(format!("array '{input_path}'")))?;
        if shape.element_count() != input.tuple_count() {
            return Err(BridgeError::shape(format!(
                "geometry has {} cells but '{input_path}' has {} tuples",
                shape.element_count(),
                input.tuple_count()
            )));
        }

        let key = DispatchKey::of(input, &shape);
        let instantiation = DispatchTable::resolve(&key, &self.config.operator)?;
        let input_id = input.id();

        let (output, output_id) = if self.config.save_as_new_array {
            self.locate_output(data, &instantiation, shape.element_count())?
        } else {
            if instantiation.output_kind() != key.kind {
                return Err(BridgeError::TypeMismatch {
                    from: instantiation.output_kind(),
                    to: key.kind,
                });
            }
            (input_path, input_id)
        };

        if let Some(warning) = self
            .config
            .operator
            .conversion_warning(instantiation.input_kind())
        {
            self.outcome.record_warn(&warning);
        }

        Ok(ExecutionPlan {
            instantiation,
            output,
            output_id,
        })
    }

    /// Reuse the array this controller allocated last time if it still fits,
    /// otherwise allocate a new one.
    fn locate_output<C: ContainerAccess>(
        &mut self,
        data: &mut C,
        instantiation: &Instantiation,
        tuples: usize,
    ) -> Result<(ArrayPath, ArrayId), BridgeError> {
        let name = &self.config.output_name;
        if name.is_empty() {
            return Err(BridgeError::invalid("output array name is empty"));
        }
        if name == &self.config.input.array {
            return Err(BridgeError::invalid(format!(
                "output array '{name}' would overwrite the input; use in-place mode instead"
            )));
        }

        let path = self.config.input.with_array(name.clone());
        let kind = instantiation.output_kind();
        let components = instantiation.components();

        if let Some(existing) = data.array(&path) {
            let ours = matches!(&self.allocated, Some((p, id)) if p == &path && *id == existing.id());
            if ours
                && existing.kind() == kind
                && existing.components() == components
                && existing.tuple_count() == tuples
            {
                debug!("reusing output array {path}");
                return Ok((path, existing.id()));
            }
            if !ours {
                self.outcome.record_warn(&BridgeWarning::ReplacedExistingArray {
                    path: path.to_string(),
                });
            }
        }

        let id = data.create_array(&path, kind, components, tuples)?;
        self.allocated = Some((path.clone(), id));
        Ok((path, id))
    }

    // ========================================================================
    // Execute
    // ========================================================================

    /// Run the operator and write its output; requires a successful check.
    pub fn execute<C: ContainerAccess>(&mut self, data: &mut C) -> FilterState {
        self.outcome.reset();
        let plan = match (&self.plan, self.state) {
            (Some(plan), FilterState::Checked) => plan.clone(),
            _ => {
                self.outcome.record(&BridgeError::NotChecked);
                self.state = FilterState::Failed;
                return self.state;
            }
        };

        match self.run(data, &plan) {
            Ok(()) => self.state = FilterState::Executed,
            Err(err) => {
                self.outcome.record(&err);
                self.state = FilterState::Failed;
            }
        }
        self.state
    }

    /// Data check followed by execution if the check passed.
    pub fn process<C: ContainerAccess>(&mut self, data: &mut C) -> FilterState {
        if self.data_check(data) == FilterState::Checked {
            self.execute(data);
        }
        self.state
    }

    fn run<C: ContainerAccess>(&self, data: &mut C, plan: &ExecutionPlan) -> Result<(), BridgeError> {
        let input_path = &self.config.input;
        let shape = image_shape(data, &input_path.container)?;
        let input = data
            .array(input_path)
            .ok_or_else(|| BridgeError::not_found(format!("array '{input_path}'")))?;

        let key = DispatchKey::of(input, &shape);
        if key != plan.instantiation.key() {
            return Err(BridgeError::NotChecked);
        }
        let instantiation = DispatchTable::resolve(&key, &self.config.operator)?;

        let results = instantiation.dispatch(ComponentRun {
            library: &self.library,
            operator: &self.config.operator,
            input,
            shape: &shape,
            output_kind: instantiation.output_kind(),
        })?;

        let output = data
            .array_mut(&plan.output)
            .filter(|array| array.id() == plan.output_id)
            .ok_or_else(|| {
                BridgeError::not_found(format!("output array '{}' prepared by the data check", plan.output))
            })?;
        if output.kind() != instantiation.output_kind() {
            return Err(BridgeError::TypeMismatch {
                from: instantiation.output_kind(),
                to: output.kind(),
            });
        }
        if output.components() != results.len() || output.tuple_count() != shape.element_count() {
            return Err(BridgeError::shape(format!(
                "output '{}' no longer matches the input layout",
                plan.output
            )));
        }
        for (component, result) in results.iter().enumerate() {
            view::write_component(output, component, result)?;
        }
        debug!("wrote {} component(s) to {}", results.len(), plan.output);
        Ok(())
    }
}

fn image_shape<C: ContainerAccess>(data: &C, container: &str) -> Result<ShapeDescriptor, BridgeError> {
    let unsupported = || BridgeError::UnsupportedGeometry {
        container: container.to_string(),
    };
    match data.geometry_kind(container) {
        None => Err(BridgeError::not_found(format!("data container '{container}'"))),
        Some(GeometryKind::Other) => Err(unsupported()),
        Some(GeometryKind::Image) => data.shape_of(container).ok_or_else(unsupported),
    }
}

/// Runs the operator once per component of the input array.
struct ComponentRun<'a, L> {
    library: &'a L,
    operator: &'a OperatorDescriptor,
    input: &'a GenericArray,
    shape: &'a ShapeDescriptor,
    output_kind: ElementKind,
}

impl<L: OperatorLibrary> Instantiate for ComponentRun<'_, L> {
    type Output = Result<Vec<GenericArray>, BridgeError>;

    fn instantiate<T: Element, D: ImageDimension>(self) -> Self::Output {
        (0..self.input.components())
            .map(|component| {
                let input = view::to_typed_view::<T, D>(self.input, self.shape, component)?;
                let output = shim::invoke(self.library, self.operator, &input, self.output_kind)?;
                if output.raw_dim() != input.view().raw_dim() {
                    return Err(BridgeError::shape(format!(
                        "{} returned shape {:?} for input shape {:?}",
                        self.operator.name(),
                        output.raw_dim().slice(),
                        input.view().shape()
                    )));
                }
                Ok(output.into_generic(format!("{}[{component}]", self.input.name())))
            })
            .collect()
    }
}
