use crate::field::FieldValue;
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::hash::Hash;
use std::str::FromStr;
use strum::{Display, EnumString};

/// Key holding the event class a query's `<event_type> where` head is checked against
pub const EVENT_TYPE_KEY: &str = "event_type";

#[cfg(feature = "serde_json")]
#[derive(Debug, serde::Deserialize)]
struct EventProxy {
    #[serde(flatten)]
    value: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventValue {
    Value(FieldValue),
    Sequence(Vec<EventValue>),
    Map(HashMap<String, EventValue>),
}

#[cfg(feature = "serde_json")]
impl TryFrom<serde_json::Value> for EventValue {
    type Error = crate::error::JSONError;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        match value {
            serde_json::Value::Null
            | serde_json::Value::Bool(_)
            | serde_json::Value::Number(_)
            | serde_json::Value::String(_) => Ok(Self::Value(FieldValue::try_from(value)?)),
            serde_json::Value::Array(a) => {
                let mut result = Vec::with_capacity(a.len());
                for item in a {
                    result.push(Self::try_from(item)?);
                }
                Ok(Self::Sequence(result))
            }
            serde_json::Value::Object(data) => {
                let mut result = HashMap::with_capacity(data.len());
                for (key, value) in data {
                    result.insert(key, Self::try_from(value)?);
                }
                Ok(Self::Map(result))
            }
        }
    }
}

impl<T> From<T> for EventValue
where
    T: Into<FieldValue>,
{
    fn from(value: T) -> Self {
        Self::Value(value.into())
    }
}

/// The `Event` struct represents a single log event.
///
/// It is a collection of key-value pairs where the key is a string and the value
/// is a string, number, boolean, null, a nested mapping or a sequence.
/// The optional `event_type` key names the class of the event, e.g. `process`.
#[derive(Debug, Default, Clone)]
#[cfg_attr(feature = "serde_json", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde_json", serde(try_from = "EventProxy"))]
pub struct Event {
    inner: HashMap<String, EventValue>,
}

#[cfg(feature = "serde_json")]
impl TryFrom<EventProxy> for Event {
    type Error = crate::error::JSONError;

    fn try_from(other: EventProxy) -> Result<Self, Self::Error> {
        Self::try_from(other.value)
    }
}

impl<T, S, const N: usize> From<[(S, T); N]> for Event
where
    S: Into<String> + Hash + Eq,
    T: Into<EventValue>,
{
    fn from(values: [(S, T); N]) -> Self {
        let mut data = HashMap::with_capacity(N);
        for (k, v) in values {
            data.insert(k.into(), v.into());
        }
        Self { inner: data }
    }
}

impl From<HashMap<String, EventValue>> for Event {
    fn from(inner: HashMap<String, EventValue>) -> Self {
        Self { inner }
    }
}

impl Event {
    /// Create a new empty event
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty event of the given class
    ///
    /// # Example
    /// ```rust
    /// use eql_analytic::Event;
    /// let mut event = Event::with_type("process");
    /// event.insert("process_name", "sc.exe");
    /// assert_eq!(event.event_type(), Some("process"));
    /// ```
    pub fn with_type<S: Into<String>>(event_type: S) -> Self {
        let mut event = Self::new();
        event.insert(EVENT_TYPE_KEY, event_type.into());
        event
    }

    /// Insert a key-value pair into the event.
    /// If the key already exists, the value will be replaced.
    ///
    /// # Example
    /// ```rust
    /// use eql_analytic::Event;
    /// let mut event = Event::new();
    /// event.insert("process_name", "net.exe");
    /// event.insert("pid", 4312);
    /// event.insert("elevated", true);
    /// event.insert("parent_name", None);
    /// ```
    pub fn insert<T, S>(&mut self, key: S, value: T)
    where
        S: Into<String> + Hash + Eq,
        T: Into<EventValue>,
    {
        self.inner.insert(key.into(), value.into());
    }

    /// Iterate over the key-value pairs in the event
    pub fn iter(&self) -> impl Iterator<Item = (&String, &EventValue)> {
        self.inner.iter()
    }

    /// Get the value for a key in the event, dotted keys descend into nested maps
    pub fn get(&self, key: &str) -> Option<&EventValue> {
        if let Some(ev) = self.inner.get(key) {
            return Some(ev);
        }

        let mut nested_key = key;
        let mut current = &self.inner;
        while let Some((head, tail)) = nested_key.split_once('.') {
            if let Some(EventValue::Map(map)) = current.get(head) {
                if let Some(value) = map.get(tail) {
                    return Some(value);
                }
                current = map;
                nested_key = tail;
            } else {
                return None;
            }
        }
        None
    }

    /// The event class, if the event carries a string `event_type`
    pub fn event_type(&self) -> Option<&str> {
        match self.inner.get(EVENT_TYPE_KEY) {
            Some(EventValue::Value(v)) => v.as_str(),
            _ => None,
        }
    }
}

#[cfg(feature = "serde_json")]
impl TryFrom<serde_json::Value> for Event {
    type Error = crate::error::JSONError;

    fn try_from(data: serde_json::Value) -> Result<Self, Self::Error> {
        let mut result = Self::default();
        match data {
            serde_json::Value::Object(data) => {
                for (key, value) in data {
                    result.insert(key, EventValue::try_from(value)?);
                }
            }
            _ => return Err(Self::Error::InvalidEvent()),
        }
        Ok(result)
    }
}

/// Lifecycle stage reported by a process event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Deserialize, Serialize)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(from = "String", into = "String")]
pub enum Subtype {
    Create,
    Terminate,
    /// Any subtype this crate does not know about
    Unknown,
}

impl From<String> for Subtype {
    fn from(s: String) -> Self {
        Self::from_str(&s).unwrap_or(Self::Unknown)
    }
}

impl From<Subtype> for String {
    fn from(subtype: Subtype) -> Self {
        subtype.to_string()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Lenient<T> {
    Valid(T),
    Invalid(IgnoredAny),
}

/// Deserialize an optional attribute, a value of the wrong type becomes `None`
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    match Option::<Lenient<T>>::deserialize(deserializer)? {
        Some(Lenient::Valid(value)) => Ok(Some(value)),
        Some(Lenient::Invalid(_)) | None => Ok(None),
    }
}

/// A process lifecycle record in the schema analytics are written against.
///
/// Every attribute is optional, an absent attribute simply never matches.
/// Attributes of the wrong type are read as absent rather than failing the record.
#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
pub struct ProcessEvent {
    #[serde(default, deserialize_with = "lenient")]
    pub subtype: Option<Subtype>,
    /// Executable file name, e.g. `sc.exe`
    #[serde(default, deserialize_with = "lenient")]
    pub process_name: Option<String>,
    /// Full invocation text
    #[serde(default, deserialize_with = "lenient")]
    pub command_line: Option<String>,
}

impl ProcessEvent {
    pub fn new<S: Into<String>>(subtype: Subtype, process_name: S, command_line: S) -> Self {
        Self {
            subtype: Some(subtype),
            process_name: Some(process_name.into()),
            command_line: Some(command_line.into()),
        }
    }
}

impl From<&ProcessEvent> for Event {
    fn from(process: &ProcessEvent) -> Self {
        let mut event = Event::with_type("process");
        if let Some(subtype) = process.subtype {
            event.insert("subtype", subtype.to_string());
        }
        if let Some(name) = &process.process_name {
            event.insert("process_name", name.as_str());
        }
        if let Some(command_line) = &process.command_line {
            event.insert("command_line", command_line.as_str());
        }
        event
    }
}
