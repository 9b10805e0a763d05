use crate::error::ParserError;
use crate::field::Pattern;
use std::str::FromStr;
use strum::{Display, EnumString};

#[derive(Debug, PartialEq, Clone, Copy, Display, EnumString)]
#[strum(serialize_all = "camelCase", ascii_case_insensitive)]
pub enum Function {
    Wildcard,
    Match,
    StartsWith,
    EndsWith,
    StringContains,
}

/// A function name as written in a query; a trailing `~` makes it case-insensitive
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct FunctionCall {
    pub function: Function,
    pub cased: bool,
}

impl FromStr for FunctionCall {
    type Err = ParserError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, cased) = match s.strip_suffix('~') {
            Some(name) => (name, false),
            None => (s, true),
        };
        match Function::from_str(name) {
            Ok(function) => Ok(Self { function, cased }),
            Err(_) => Err(ParserError::UnknownFunction(s.to_string())),
        }
    }
}

impl std::fmt::Display for FunctionCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.cased {
            true => write!(f, "{}", self.function),
            false => write!(f, "{}~", self.function),
        }
    }
}

impl FunctionCall {
    pub(crate) fn compile(&self, argument: &str) -> Result<Pattern, ParserError> {
        match self.function {
            Function::Wildcard => Pattern::wildcard(argument, self.cased),
            Function::Match => Pattern::regex(argument, self.cased),
            Function::StartsWith => Pattern::starts_with(argument, self.cased),
            Function::EndsWith => Pattern::ends_with(argument, self.cased),
            Function::StringContains => Pattern::contains(argument, self.cased),
        }
    }
}
