//! Normalization of raw events from a data source into the schema analytics are
//! written against.
//!
//! A [`Normalizer`] is loaded from a YAML description of one data source:
//!
//! ```yaml
//! name: Microsoft Sysmon
//! domain: endpoint
//! strict: true
//! timestamp:
//!   field: UtcTime
//!   format: "%Y-%m-%d %H:%M:%S%.f"
//! fields:
//!   mapping:
//!     process_name: baseName(Image)
//!     command_line: CommandLine
//! events:
//!   process:
//!     filter: EventId in (1, 5)
//!     enum:
//!       subtype:
//!         create: EventId == 1
//!         terminate: EventId == 5
//! ```
//!
//! Filters and enum options are query conditions evaluated against the raw event.
//! Field mappings read the event below `fields.scope` if one is configured.

use crate::error::NormalizationError;
use crate::event::{Event, EventValue, EVENT_TYPE_KEY};
use crate::query::Query;
use chrono::{NaiveDate, NaiveDateTime};
use log::{debug, trace};
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::borrow::Cow;
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;

/// Event class assigned when no configured filter matches
pub const GENERIC_EVENT_TYPE: &str = "generic";

/// Key the normalized timestamp is stored under
pub const TIMESTAMP_KEY: &str = "timestamp";

/// Timestamps in this format are already FILETIME ticks and are copied unchanged
const FILETIME_FORMAT: &str = "filetime";

/// FILETIME counts 100ns ticks
const TICKS_PER_MICROSECOND: i64 = 10;

/// A YAML mapping read as a list of entries in document order
#[derive(Debug)]
struct Ordered<T>(Vec<(String, T)>);

impl<T> Default for Ordered<T> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Ordered<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderedVisitor<T>(PhantomData<T>);

        impl<'de, T: Deserialize<'de>> Visitor<'de> for OrderedVisitor<T> {
            type Value = Ordered<T>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a mapping")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry()? {
                    entries.push(entry);
                }
                Ok(Ordered(entries))
            }
        }

        deserializer.deserialize_map(OrderedVisitor(PhantomData))
    }
}

#[derive(Debug, Deserialize)]
struct TimestampProxy {
    field: String,
    format: String,
}

#[derive(Debug, Default, Deserialize)]
struct FieldsProxy {
    #[serde(default)]
    mapping: Ordered<String>,
    #[serde(default)]
    scope: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EventProxy {
    filter: String,
    #[serde(default)]
    mapping: Ordered<String>,
    #[serde(default, rename = "enum")]
    enums: Ordered<Ordered<String>>,
}

#[derive(Debug, Deserialize)]
struct NormalizerProxy {
    name: String,
    #[serde(default)]
    domain: Option<String>,
    #[serde(default)]
    strict: bool,
    #[serde(default)]
    timestamp: Option<TimestampProxy>,
    #[serde(default)]
    fields: FieldsProxy,
    #[serde(default)]
    events: Ordered<EventProxy>,
}

/// How the value of one normalized field is computed from the source event
#[derive(Debug, Clone, PartialEq)]
enum Mapping {
    /// Copy a (possibly dotted) source field
    Field(String),
    /// Last component of a Windows or POSIX path
    BaseName(String),
    /// Everything before the last path separator
    DirName(String),
}

fn is_field_name(s: &str) -> bool {
    !s.is_empty()
        && !s.starts_with('.')
        && !s.ends_with('.')
        && s.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '.')
}

impl FromStr for Mapping {
    type Err = NormalizationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let mapping = match s.strip_suffix(')').and_then(|s| s.split_once('(')) {
            Some(("baseName", field)) => Self::BaseName(field.trim().to_string()),
            Some(("dirName", field)) => Self::DirName(field.trim().to_string()),
            Some(_) => return Err(NormalizationError::InvalidMapping(s.to_string())),
            None => Self::Field(s.to_string()),
        };
        let valid = match &mapping {
            Self::Field(f) | Self::BaseName(f) | Self::DirName(f) => is_field_name(f),
        };
        match valid {
            true => Ok(mapping),
            false => Err(NormalizationError::InvalidMapping(s.to_string())),
        }
    }
}

const PATH_SEPARATORS: [char; 2] = ['\\', '/'];

impl Mapping {
    fn evaluate(&self, event: &Event) -> Option<EventValue> {
        match self {
            Self::Field(field) => event.get(field).cloned(),
            Self::BaseName(field) => {
                let path = string_value(event, field)?;
                let name = path.rsplit(PATH_SEPARATORS).next().unwrap_or(path);
                Some(EventValue::from(name))
            }
            Self::DirName(field) => {
                let path = string_value(event, field)?;
                path.rfind(PATH_SEPARATORS)
                    .map(|i| EventValue::from(&path[..i]))
            }
        }
    }
}

fn string_value<'a>(event: &'a Event, field: &str) -> Option<&'a str> {
    match event.get(field) {
        Some(EventValue::Value(v)) => v.as_str(),
        _ => None,
    }
}

fn compile_mappings(
    entries: Vec<(String, String)>,
) -> Result<Vec<(String, Mapping)>, NormalizationError> {
    let mut result = Vec::with_capacity(entries.len());
    for (target, source) in entries {
        result.push((target, Mapping::from_str(&source)?));
    }
    Ok(result)
}

fn compile_condition(context: String, source: &str) -> Result<Query, NormalizationError> {
    Query::condition(source)
        .map_err(|err| NormalizationError::InvalidCondition(context, source.to_string(), err))
}

/// Normalization rules for one event class of the data source
#[derive(Debug)]
struct EventMapping {
    name: String,
    filter: Query,
    mapping: Vec<(String, Mapping)>,
    /// Enum field, then its options in the order they are tried
    enums: Vec<(String, Vec<(String, Query)>)>,
}

impl EventMapping {
    fn compile(name: String, proxy: EventProxy) -> Result<Self, NormalizationError> {
        let filter = compile_condition(format!("'{}' filter", name), &proxy.filter)?;
        let mapping = compile_mappings(proxy.mapping.0)?;
        let mut enums = Vec::with_capacity(proxy.enums.0.len());
        for (field, options) in proxy.enums.0 {
            let mut compiled = Vec::with_capacity(options.0.len());
            for (option, condition) in options.0 {
                let context = format!("'{}.{}' enum", field, option);
                compiled.push((option, compile_condition(context, &condition)?));
            }
            enums.push((field, compiled));
        }
        Ok(Self {
            name,
            filter,
            mapping,
            enums,
        })
    }
}

#[derive(Debug)]
struct Timestamp {
    field: String,
    format: String,
}

/// Converts raw events of one data source into the analytic schema.
///
/// # Example
/// ```rust
/// use eql_analytic::{normalizer_from_yaml, Event};
/// let normalizer = normalizer_from_yaml(r#"
/// name: Sysmon
/// strict: true
/// fields:
///   mapping:
///     process_name: baseName(Image)
/// events:
///   process:
///     filter: EventId == 1
///     enum:
///       subtype:
///         create: EventId == 1
/// "#).unwrap();
///
/// let mut raw = Event::from([("EventId", 1)]);
/// raw.insert("Image", r"C:\Windows\System32\sc.exe");
/// let event = normalizer.normalize(&raw).unwrap();
/// assert_eq!(event.event_type(), Some("process"));
/// assert_eq!(event.get("process_name"), Some(&"sc.exe".into()));
/// assert_eq!(event.get("subtype"), Some(&"create".into()));
/// ```
#[derive(Debug, Deserialize)]
#[serde(try_from = "NormalizerProxy")]
pub struct Normalizer {
    /// Name of the data source
    pub name: String,
    pub domain: Option<String>,
    /// Drop every source field that is not mapped explicitly
    pub strict: bool,
    timestamp: Option<Timestamp>,
    scope: Option<String>,
    mapping: Vec<(String, Mapping)>,
    events: Vec<EventMapping>,
}

impl TryFrom<NormalizerProxy> for Normalizer {
    type Error = NormalizationError;

    fn try_from(proxy: NormalizerProxy) -> Result<Self, Self::Error> {
        let mut events = Vec::with_capacity(proxy.events.0.len());
        for (name, event) in proxy.events.0 {
            events.push(EventMapping::compile(name, event)?);
        }
        if let Some(scope) = &proxy.fields.scope {
            if !is_field_name(scope) {
                return Err(NormalizationError::InvalidMapping(scope.clone()));
            }
        }

        let normalizer = Self {
            name: proxy.name,
            domain: proxy.domain,
            strict: proxy.strict,
            timestamp: proxy.timestamp.map(|t| Timestamp {
                field: t.field,
                format: t.format,
            }),
            scope: proxy.fields.scope,
            mapping: compile_mappings(proxy.fields.mapping.0)?,
            events,
        };
        debug!(
            "Loaded normalizer '{}' for event types [{}]",
            normalizer.name,
            normalizer.event_types().collect::<Vec<&str>>().join(", ")
        );
        Ok(normalizer)
    }
}

impl Normalizer {
    /// The event classes this data source is normalized into, in the order they are detected
    pub fn event_types(&self) -> impl Iterator<Item = &str> {
        self.events.iter().map(|e| e.name.as_str())
    }

    /// Map a raw event into the analytic schema.
    ///
    /// The output carries `event_type`, every mapped field that has a value and the
    /// matching option of each enum field. Outside strict mode the (scoped) source
    /// fields are kept as well. Fails only when the configured timestamp is missing
    /// or cannot be parsed.
    pub fn normalize(&self, raw: &Event) -> Result<Event, NormalizationError> {
        let timestamp = self.timestamp(raw)?;
        let scoped = self.scoped(raw);
        let event_mapping = self.detect(raw);
        let event_type = event_mapping.map_or(GENERIC_EVENT_TYPE, |e| e.name.as_str());
        trace!("Normalizing '{}' event from {}", event_type, self.name);

        let mut output = match self.strict {
            true => Event::new(),
            false => scoped.as_ref().clone(),
        };
        for (target, mapping) in self.mapping.iter() {
            if let Some(value) = mapping.evaluate(&scoped) {
                output.insert(target.as_str(), value);
            }
        }

        if let Some(event_mapping) = event_mapping {
            // enums test the raw event, not the scoped one
            for (field, options) in event_mapping.enums.iter() {
                if let Some((option, _)) = options.iter().find(|(_, c)| c.evaluate(raw)) {
                    output.insert(field.as_str(), option.as_str());
                }
            }
            for (target, mapping) in event_mapping.mapping.iter() {
                if let Some(value) = mapping.evaluate(&scoped) {
                    output.insert(target.as_str(), value);
                }
            }
        }

        output.insert(EVENT_TYPE_KEY, event_type);
        if let Some(timestamp) = timestamp {
            output.insert(TIMESTAMP_KEY, timestamp);
        }
        Ok(output)
    }

    fn scoped<'a>(&self, raw: &'a Event) -> Cow<'a, Event> {
        match &self.scope {
            None => Cow::Borrowed(raw),
            Some(scope) => match raw.get(scope) {
                Some(EventValue::Map(map)) => Cow::Owned(Event::from(map.clone())),
                _ => Cow::Owned(Event::new()),
            },
        }
    }

    /// A source event that already names a known class keeps it, otherwise the first
    /// matching filter decides.
    fn detect(&self, raw: &Event) -> Option<&EventMapping> {
        if let Some(event_type) = raw.event_type() {
            if let Some(known) = self.events.iter().find(|e| e.name == event_type) {
                return Some(known);
            }
        }
        self.events.iter().find(|e| e.filter.evaluate(raw))
    }

    fn timestamp(&self, raw: &Event) -> Result<Option<EventValue>, NormalizationError> {
        let Some(config) = &self.timestamp else {
            return Ok(None);
        };
        let value = raw.get(&config.field).ok_or_else(|| {
            NormalizationError::MissingTimestamp(config.field.clone(), self.name.clone())
        })?;
        if config.format == FILETIME_FORMAT {
            return Ok(Some(value.clone()));
        }

        let invalid = || {
            NormalizationError::InvalidTimestamp(format!("{:?}", value), config.format.clone())
        };
        let text = match value {
            EventValue::Value(v) => v.as_str().ok_or_else(invalid)?,
            _ => return Err(invalid()),
        };
        let parsed = NaiveDateTime::parse_from_str(text, &config.format).map_err(|_| {
            NormalizationError::InvalidTimestamp(text.to_string(), config.format.clone())
        })?;
        to_filetime(parsed)
            .map(|ticks| Some(EventValue::from(ticks)))
            .ok_or_else(invalid)
    }
}

/// 100ns ticks since 1601-01-01 00:00:00
fn to_filetime(timestamp: NaiveDateTime) -> Option<i64> {
    let base = NaiveDate::from_ymd_opt(1601, 1, 1)?.and_hms_opt(0, 0, 0)?;
    (timestamp - base)
        .num_microseconds()?
        .checked_mul(TICKS_PER_MICROSECOND)
}
