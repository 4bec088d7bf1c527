//! Outcome reporter.
//!
//! Accumulates the error and warning codes raised during one controller
//! phase. The first error of a phase sets the reported error code; later
//! errors are kept as messages only. Warnings behave the same way.

use log::{error, warn};

use crate::error::{BridgeError, BridgeWarning};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// One recorded message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutcomeMessage {
    pub severity: Severity,
    pub code: i32,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutcomeReporter {
    error_code: i32,
    warning_code: i32,
    messages: Vec<OutcomeMessage>,
}

impl OutcomeReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear codes and messages at the start of a phase.
    pub fn reset(&mut self) {
        self.error_code = 0;
        self.warning_code = 0;
        self.messages.clear();
    }

    /// Record an error. Non-negative codes are flipped negative, 0 becomes -1.
    pub fn record_error(&mut self, code: i32, message: impl Into<String>) {
        let code = if code < 0 { code } else { -code.max(1) };
        let text = message.into();
        error!("[{code}] {text}");
        if self.error_code == 0 {
            self.error_code = code;
        }
        self.messages.push(OutcomeMessage {
            severity: Severity::Error,
            code,
            text,
        });
    }

    /// Record a warning. Non-positive codes are flipped positive, 0 becomes 1.
    pub fn record_warning(&mut self, code: i32, message: impl Into<String>) {
        let code = code.saturating_abs().max(1);
        let text = message.into();
        warn!("[{code}] {text}");
        if self.warning_code == 0 {
            self.warning_code = code;
        }
        self.messages.push(OutcomeMessage {
            severity: Severity::Warning,
            code,
            text,
        });
    }

    pub fn record(&mut self, err: &BridgeError) {
        self.record_error(err.code(), err.to_string());
    }

    pub fn record_warn(&mut self, warning: &BridgeWarning) {
        self.record_warning(warning.code(), warning.to_string());
    }

    /// First error code of the phase, or 0.
    pub fn error_code(&self) -> i32 {
        self.error_code
    }

    /// First warning code of the phase, or 0.
    pub fn warning_code(&self) -> i32 {
        self.warning_code
    }

    pub fn has_error(&self) -> bool {
        self.error_code < 0
    }

    pub fn messages(&self) -> &[OutcomeMessage] {
        &self.messages
    }

    /// Text of the first error, if any.
    pub fn error_message(&self) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| m.severity == Severity::Error)
            .map(|m| m.text.as_str())
    }
}
