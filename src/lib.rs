#![forbid(unsafe_code)]
//! `eql-analytic` is a library for loading EQL-style analytics and checking them against events.

mod analytic;
mod attack;
mod error;
mod event;
mod field;
pub mod library;
mod normalization;
mod query;

pub use analytic::{Analytic, Confidence, Metadata};
pub use attack::AttackCoverage;
#[cfg(feature = "serde_json")]
pub use error::JSONError;
pub use error::{NormalizationError, ParserError};
pub use event::{Event, EventValue, ProcessEvent, Subtype, EVENT_TYPE_KEY};
pub use field::FieldValue;
pub use normalization::{Normalizer, GENERIC_EVENT_TYPE, TIMESTAMP_KEY};
pub use query::Query;

/// Parse an analytic from a YAML string
pub fn analytic_from_yaml(yaml: &str) -> Result<Analytic, serde_yml::Error> {
    serde_yml::from_str(yaml)
}

/// Parse a data source normalizer from a YAML string
pub fn normalizer_from_yaml(yaml: &str) -> Result<Normalizer, serde_yml::Error> {
    serde_yml::from_str(yaml)
}

/// Parse an event from a JSON string
#[cfg(feature = "serde_json")]
pub fn event_from_json(json: &str) -> Result<Event, serde_json::Error> {
    serde_json::from_str(json)
}

/// Parse a list of events from a JSON string
#[cfg(feature = "serde_json")]
pub fn events_from_json(json: &str) -> Result<Vec<Event>, serde_json::Error> {
    serde_json::from_str(json)
}

/// Check if an analytic matches an event
pub fn check_analytic(analytic: &Analytic, event: &Event) -> bool {
    analytic.is_match(event)
}
