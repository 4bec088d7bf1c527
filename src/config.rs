//! Filter step configuration.
//!
//! The pipeline host owns one [`FilterConfig`] per step and hands it to the
//! controller before the data check. Configs can be written by hand in TOML
//! or JSON:
//!
//! ```toml
//! save_as_new_array = true        # false = overwrite the input array
//! output_name = "Filtered Array"  # new-array mode only
//!
//! [input]
//! container = "ImageDataContainer"
//! array = "ImageData"
//!
//! [operator]
//! operator = "binary_threshold"
//! lower = 10.0
//! upper = 200.0
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::container::ArrayPath;
use crate::operator::OperatorDescriptor;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

fn default_output_name() -> String {
    "Filtered Array".to_string()
}

fn default_save_as_new_array() -> bool {
    true
}

/// Configuration of one filter step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterConfig {
    /// Array to filter.
    pub input: ArrayPath,
    /// Write into a new array instead of overwriting the input.
    #[serde(default = "default_save_as_new_array")]
    pub save_as_new_array: bool,
    /// Name of the created array, in the input's container.
    #[serde(default = "default_output_name")]
    pub output_name: String,
    pub operator: OperatorDescriptor,
}

impl FilterConfig {
    /// New-array configuration with the default output name.
    pub fn new(input: ArrayPath, operator: OperatorDescriptor) -> Self {
        Self {
            input,
            save_as_new_array: default_save_as_new_array(),
            output_name: default_output_name(),
            operator,
        }
    }

    pub fn with_output_name(mut self, name: impl Into<String>) -> Self {
        self.output_name = name.into();
        self.save_as_new_array = true;
        self
    }

    pub fn in_place(mut self) -> Self {
        self.save_as_new_array = false;
        self
    }

    /// Path the filter writes to.
    pub fn output_path(&self) -> ArrayPath {
        if self.save_as_new_array {
            self.input.with_array(self.output_name.clone())
        } else {
            self.input.clone()
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Load from a file; `.json` files are JSON, everything else TOML.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&content),
            _ => Self::from_toml_str(&content),
        }
    }
}
