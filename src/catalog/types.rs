/// Catalog type definitions: connectors and action catalog entries
///
/// These records are created by seeding and treated as immutable reference
/// data afterwards. Contracts are stored as plain JSON Schema documents so the
/// schema module can compile them directly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Connection state of a connector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectorStatus {
    NotConnected,
    Connected,
}

impl ConnectorStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectorStatus::NotConnected => "not_connected",
            ConnectorStatus::Connected => "connected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "not_connected" => Some(ConnectorStatus::NotConnected),
            "connected" => Some(ConnectorStatus::Connected),
            _ => None,
        }
    }
}

/// A third-party system that owns a set of catalog actions
///
/// Created by seeding; mutated only by explicit connect/disconnect operations;
/// never deleted in normal operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connector {
    /// Unique, stable slug (e.g. "shopify")
    pub key: String,
    /// Display name (e.g. "Shopify")
    pub name: String,
    pub status: ConnectorStatus,
    pub connected_at: Option<DateTime<Utc>>,
    pub disconnected_at: Option<DateTime<Utc>>,
}

/// Whether a catalog entry starts a workflow or performs work inside one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    Trigger,
    Action,
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::Trigger => "trigger",
            ActionType::Action => "action",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "trigger" => Some(ActionType::Trigger),
            "action" => Some(ActionType::Action),
            _ => None,
        }
    }
}

/// Sample input/output payloads demonstrating an action's contracts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionExamples {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
}

/// One entry in the action catalog
///
/// Invariant: an `action`-typed entry with no input contract cannot be
/// executed; a `trigger`-typed entry has no input contract by convention.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionCatalogEntry {
    /// Unique key in "connector.verb" form (e.g. "stripe.verify_payment")
    pub key: String,
    #[serde(rename = "type")]
    pub action_type: ActionType,
    /// Owning connector slug
    pub connector_key: String,
    pub title: String,
    pub description: String,
    /// JSON Schema for the action's input, when it takes one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_contract: Option<Value>,
    /// JSON Schema for the action's output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_contract: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub examples: Option<ActionExamples>,
}
