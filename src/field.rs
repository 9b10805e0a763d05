mod function;
mod pattern;
mod value;

pub use function::*;
pub(crate) use pattern::Pattern;
pub use value::*;

use crate::error::ParserError;
use crate::event::{Event, EventValue};
use std::fmt;
use strum::{Display, EnumString};

#[derive(Debug, PartialEq, Clone, Copy, Display, EnumString)]
pub enum Comparison {
    #[strum(serialize = "==")]
    Equals,
    #[strum(serialize = "!=")]
    NotEquals,
    #[strum(serialize = ":")]
    Matches,
}

#[derive(Debug)]
pub(crate) enum Operand {
    Pattern(Pattern),
    Value(FieldValue),
}

impl Operand {
    fn from_value(value: FieldValue, wildcards: bool, cased: bool) -> Result<Self, ParserError> {
        match value {
            FieldValue::String(s) if wildcards => Ok(Self::Pattern(Pattern::wildcard(&s, cased)?)),
            FieldValue::String(s) => Ok(Self::Pattern(Pattern::exact(&s, cased))),
            v => Ok(Self::Value(v)),
        }
    }

    #[inline(always)]
    fn is_match(&self, target: &FieldValue) -> bool {
        match self {
            Self::Pattern(p) => target.as_str().is_some_and(|s| p.is_match(s)),
            Self::Value(v) => v == target,
        }
    }
}

/// A single test of one event field, the leaf of a query
#[derive(Debug)]
pub struct Field {
    pub name: String,
    pub(crate) operands: Vec<Operand>,
    pub(crate) negated: bool,
    source: String,
}

impl Field {
    /// `name == value`, `name != value` or `name : value`
    pub(crate) fn compare<S: AsRef<str>>(
        name: S,
        comparison: Comparison,
        value: FieldValue,
    ) -> Result<Self, ParserError> {
        let name = name.as_ref();
        let source = format!("{} {} {}", name, comparison, value.to_literal());
        let cased = comparison != Comparison::Matches;
        Ok(Self {
            name: name.to_string(),
            operands: vec![Operand::from_value(value, true, cased)?],
            negated: comparison == Comparison::NotEquals,
            source,
        })
    }

    /// `name in (a, b, ...)`, compared without wildcard expansion
    pub(crate) fn one_of<S: AsRef<str>>(
        name: S,
        values: Vec<FieldValue>,
        cased: bool,
    ) -> Result<Self, ParserError> {
        let name = name.as_ref();
        let source = format!(
            "{} {} ({})",
            name,
            if cased { "in" } else { "in~" },
            values
                .iter()
                .map(|v| v.to_literal())
                .collect::<Vec<String>>()
                .join(", ")
        );
        let mut operands = Vec::with_capacity(values.len());
        for value in values {
            operands.push(Operand::from_value(value, false, cased)?);
        }
        Ok(Self {
            name: name.to_string(),
            operands,
            negated: false,
            source,
        })
    }

    pub(crate) fn function<S: AsRef<str>>(
        name: S,
        call: FunctionCall,
        arguments: Vec<String>,
    ) -> Result<Self, ParserError> {
        if arguments.is_empty() {
            return Err(ParserError::InvalidFunctionArguments(call.to_string()));
        }
        let name = name.as_ref();
        let mut source = format!("{}({}", call, name);
        let mut operands = Vec::with_capacity(arguments.len());
        for argument in arguments.iter() {
            source.push_str(&format!(", {:?}", argument));
            operands.push(Operand::Pattern(call.compile(argument)?));
        }
        source.push(')');
        Ok(Self {
            name: name.to_string(),
            operands,
            negated: false,
            source,
        })
    }

    /// `subtype.create` is shorthand for `subtype : "create"`
    pub(crate) fn enum_option<S: AsRef<str>>(name: S, option: S) -> Self {
        Self {
            name: name.as_ref().to_string(),
            operands: vec![Operand::Pattern(Pattern::exact(option.as_ref(), false))],
            negated: false,
            source: format!("{}.{}", name.as_ref(), option.as_ref()),
        }
    }

    fn matches_value(&self, value: &EventValue) -> bool {
        match value {
            EventValue::Value(target) => self.operands.iter().any(|op| op.is_match(target)),
            EventValue::Sequence(seq) => seq.iter().any(|v| self.matches_value(v)),
            EventValue::Map(_) => false,
        }
    }

    pub(crate) fn evaluate(&self, event: &Event) -> bool {
        match event.get(&self.name) {
            // a missing field never matches, not even a negated comparison
            None => false,
            Some(value) => self.matches_value(value) != self.negated,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}
