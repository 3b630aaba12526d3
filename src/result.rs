//! `OperationResult`: the structured outcome every CLI operation returns.
//!
//! Key order is stable because `serde_json::to_string_pretty` preserves
//! struct field declaration order, and we never route this type through a
//! `HashMap`.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub status: Status,
    pub message: String,
    #[serde(default)]
    pub context: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Summary {
    pub success_count: usize,
    pub warning_count: usize,
    pub error_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationResult {
    pub success: bool,
    pub operation: String,
    pub data: Option<serde_json::Value>,
    pub messages: Vec<Message>,
    pub summary: Summary,
}

impl OperationResult {
    /// Starts a new result for `operation`, optimistic until an error lands.
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            success: true,
            operation: operation.into(),
            data: None,
            messages: Vec::new(),
            summary: Summary::default(),
        }
    }

    pub fn push_success(&mut self, message: impl Into<String>, context: Option<String>) {
        self.messages.push(Message {
            status: Status::Success,
            message: message.into(),
            context,
        });
        self.summary.success_count += 1;
    }

    pub fn push_warning(&mut self, message: impl Into<String>, context: Option<String>) {
        let message = message.into();
        tracing::warn!(%message, "operation warning");
        self.messages.push(Message {
            status: Status::Warning,
            message,
            context,
        });
        self.summary.warning_count += 1;
    }

    pub fn push_error(&mut self, message: impl Into<String>, context: Option<String>) {
        let message = message.into();
        tracing::error!(%message, "operation error");
        self.messages.push(Message {
            status: Status::Error,
            message,
            context,
        });
        self.summary.error_count += 1;
        self.success = false;
    }

    /// Records an `Error`, mapping it to a single error `Message` whose
    /// context carries the error kind.
    pub fn push_error_from(&mut self, err: &Error) {
        self.push_error(err.to_string(), Some(err.kind().to_string()));
    }

    pub fn set_data(&mut self, data: serde_json::Value) {
        self.data = Some(data);
    }

    /// True if the result carries at least one error-level message.
    pub fn has_errors(&self) -> bool {
        self.summary.error_count > 0
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// A short human summary for non-JSON output mode.
    pub fn human_summary(&self) -> String {
        let mut out = BTreeMap::new();
        out.insert("success", self.summary.success_count);
        out.insert("warning", self.summary.warning_count);
        out.insert("error", self.summary.error_count);
        let counts = out
            .iter()
            .map(|(k, v)| format!("{v} {k}"))
            .collect::<Vec<_>>()
            .join(", ");
        let headline = if self.success { "ok" } else { "failed" };
        format!("{}: {} ({})", self.operation, headline, counts)
    }

    /// Exit code per the external contract: 0 on success, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.success {
            0
        } else {
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_is_default() {
        let result = OperationResult::new("save");
        assert!(result.success);
        assert_eq!(result.exit_code(), 0);
    }

    #[test]
    fn error_flips_success_false() {
        let mut result = OperationResult::new("save");
        result.push_error("boom", None);
        assert!(!result.success);
        assert_eq!(result.exit_code(), 1);
        assert_eq!(result.summary.error_count, 1);
    }

    #[test]
    fn warning_keeps_success_true() {
        let mut result = OperationResult::new("save");
        result.push_warning("heads up", None);
        assert!(result.success);
        assert_eq!(result.summary.warning_count, 1);
    }

    #[test]
    fn json_round_trips_stable_keys() {
        let mut result = OperationResult::new("list");
        result.push_success("listed 2 sessions", None);
        let json = result.to_json_pretty().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["operation"], "list");
        assert_eq!(value["success"], true);
        assert_eq!(value["summary"]["success_count"], 1);
    }

    #[test]
    fn message_context_key_is_always_present_even_when_none() {
        let mut result = OperationResult::new("list");
        result.push_success("listed 2 sessions", None);
        let json = result.to_json_pretty().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value["messages"][0].as_object().unwrap().contains_key("context"));
        assert!(value["messages"][0]["context"].is_null());
    }

    #[test]
    fn error_from_maps_kind_into_context() {
        let mut result = OperationResult::new("recover");
        let err = Error::not_found("work", "archived/");
        result.push_error_from(&err);
        assert_eq!(result.messages[0].context.as_deref(), Some("not_found"));
    }
}
