use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub title: String,
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub is_free: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default)]
    pub source: String,
    /// Long-form date the record was matched against during date enrichment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relevant_date: Option<String>,
}

impl Event {
    pub fn tagged(mut self, source: &str) -> Self {
        self.source = source.to_string();
        self
    }
}

/// One upstream that failed while a result was being assembled.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct SourceFailure {
    pub source: String,
    pub message: String,
}

impl SourceFailure {
    pub fn new(source: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self {
            source: source.into(),
            message: err.to_string(),
        }
    }
}

/// A value plus the upstream failures hit while producing it, so "empty because
/// nothing exists" can be told apart from "empty because a source failed".
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Retrieved<T> {
    pub value: T,
    pub failures: Vec<SourceFailure>,
}

impl<T> Retrieved<T> {
    pub fn complete(value: T) -> Self {
        Self {
            value,
            failures: Vec::new(),
        }
    }

    pub fn degraded(value: T, failures: Vec<SourceFailure>) -> Self {
        Self { value, failures }
    }

    pub fn is_degraded(&self) -> bool {
        !self.failures.is_empty()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct DateEvents {
    pub date: String,
    pub events: Vec<Event>,
}
