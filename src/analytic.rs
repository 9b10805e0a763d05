use crate::event::Event;
use crate::query::Query;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// How likely a hit is to be malicious rather than administrative noise
#[derive(Deserialize, Serialize, PartialEq, Debug, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    /// Expect benign hits; review in context.
    Low,
    Medium,
    /// Rarely fires on legitimate activity.
    High,
}

/// Descriptive fields of an analytic. Only `id` and `name` are required.
#[derive(Deserialize, Serialize, Debug)]
pub struct Metadata {
    /// Globally unique identifier of the analytic
    pub id: Uuid,
    /// A brief human-readable title
    pub name: String,
    /// What the analytic detects and why it matters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Platforms the analytic applies to, e.g. `windows`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub os: Vec<String>,
    /// ATT&CK tactic names
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tactics: Vec<String>,
    /// ATT&CK technique identifiers
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub techniques: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<Confidence>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contributors: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_date: Option<String>,
}

/// The `Analytic` struct is a declarative detection: metadata plus one query.
///
/// ```yaml
/// metadata:
///   id: 7f8e6b32-4c1d-4a5e-9b0f-2d3c6a1e8f47
///   name: Some analytic
///   os: [windows]
/// query: |
///   process where subtype.create and process_name : "sc.exe"
/// ```
#[derive(Deserialize, Serialize, Debug)]
pub struct Analytic {
    pub metadata: Metadata,
    pub query: Query,
    /// Capture any additional fields
    #[serde(flatten)]
    pub custom_fields: HashMap<String, serde_yml::Value>,
}

impl Analytic {
    /// Check if the event matches the analytic
    ///
    /// # Example
    /// ```rust
    /// use eql_analytic::{analytic_from_yaml, Event};
    /// let yaml = r#"
    /// metadata:
    ///     id: 7f8e6b32-4c1d-4a5e-9b0f-2d3c6a1e8f47
    ///     name: Service started with sc.exe
    /// query: |
    ///     process where subtype.create and process_name : "sc.exe"
    /// "#;
    /// let analytic = analytic_from_yaml(yaml).unwrap();
    /// let mut event = Event::with_type("process");
    /// event.insert("subtype", "create");
    /// event.insert("process_name", "sc.exe");
    /// assert!(analytic.is_match(&event));
    /// ```
    pub fn is_match(&self, event: &Event) -> bool {
        self.query.evaluate(event)
    }

    /// Whether the analytic lists the platform, compared case-insensitively
    pub fn applies_to(&self, os: &str) -> bool {
        self.metadata.os.iter().any(|o| o.eq_ignore_ascii_case(os))
    }
}
