//! Change notifications published by the order service.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The kind of mutation an order went through.
///
/// Kinds this crate does not know about are kept as [`ChangeKind::Unknown`]
/// so consumers can log and drop them instead of failing deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ChangeKind {
    Created,
    Updated,
    Deleted,
    Unknown(String),
}

impl ChangeKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Created => "Created",
            Self::Updated => "Updated",
            Self::Deleted => "Deleted",
            Self::Unknown(raw) => raw,
        }
    }
}

impl From<String> for ChangeKind {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "Created" => Self::Created,
            "Updated" => Self::Updated,
            "Deleted" => Self::Deleted,
            _ => Self::Unknown(raw),
        }
    }
}

impl From<ChangeKind> for String {
    fn from(kind: ChangeKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// "An order changed" notification.
///
/// Delivery is at-least-once, so the same event may be observed twice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// Identifier of the order that changed.
    #[serde(rename = "orderID")]
    pub order_id: String,
    /// What happened to it. Older producers wrote this under `status`.
    #[serde(rename = "changeKind", alias = "status")]
    pub change_kind: ChangeKind,
}

impl ChangeEvent {
    pub fn new(order_id: impl Into<String>, change_kind: ChangeKind) -> Self {
        Self {
            order_id: order_id.into(),
            change_kind,
        }
    }

    pub fn created(order_id: impl Into<String>) -> Self {
        Self::new(order_id, ChangeKind::Created)
    }

    pub fn updated(order_id: impl Into<String>) -> Self {
        Self::new(order_id, ChangeKind::Updated)
    }

    pub fn deleted(order_id: impl Into<String>) -> Self {
        Self::new(order_id, ChangeKind::Deleted)
    }
}
