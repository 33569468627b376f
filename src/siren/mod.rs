//! Siren hypermedia representation used by the swap node
//!
//! Only the parts the orchestrator reads are modelled: entity properties,
//! sub-entities, links and actions with their fields.

use crate::error::{OrchestratorError, OrchestratorResult};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A URI-addressable resource with properties and actions
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Entity<P = serde_json::Value> {
    #[serde(default)]
    pub class: Vec<String>,
    pub properties: P,
    #[serde(default)]
    pub entities: Vec<SubEntity>,
    #[serde(default)]
    pub actions: Vec<Action>,
    #[serde(default)]
    pub links: Vec<Link>,
}

/// Embedded link or representation; only the link form is followed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubEntity {
    #[serde(default)]
    pub class: Vec<String>,
    #[serde(default)]
    pub rel: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Link {
    #[serde(default)]
    pub class: Vec<String>,
    pub rel: Vec<String>,
    pub href: String,
}

/// A behaviour exposed by an entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Action {
    pub name: String,
    #[serde(default)]
    pub class: Vec<String>,
    /// HTTP method; `GET` when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    pub href: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Request encoding; form encoding when absent
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    #[serde(default)]
    pub fields: Vec<Field>,
}

impl Action {
    /// Whether the resolved field values travel in the query string
    pub fn is_query(&self) -> bool {
        self.method
            .as_deref()
            .map_or(true, |method| method.eq_ignore_ascii_case("GET"))
    }
}

/// A control inside an action whose value the client must supply
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Field {
    pub name: String,
    #[serde(default)]
    pub class: Vec<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub field_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl Field {
    pub fn has_class(&self, class: &str) -> bool {
        self.class.iter().any(|c| c == class)
    }
}

/// Supplies concrete values for action fields, keyed by their class tags
#[async_trait]
pub trait FieldValueResolver: Send + Sync {
    /// `None` means the field is left out of the request
    async fn resolve(&self, field: &Field) -> anyhow::Result<Option<String>>;
}

/// Extract the single recommended action of an entity, if any.
///
/// The swap node recommends at most one action at a time; several actions are
/// reported as a protocol violation rather than picked from.
pub fn resolve_next_action<P>(entity: &Entity<P>) -> OrchestratorResult<Option<Action>> {
    match entity.actions.as_slice() {
        [] => Ok(None),
        [action] => Ok(Some(action.clone())),
        actions => Err(OrchestratorError::ProtocolViolation(format!(
            "swap node recommended {} actions at once ({}), expected at most one",
            actions.len(),
            actions
                .iter()
                .map(|a| a.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        ))),
    }
}
