#[derive(Debug, thiserror::Error)]
pub enum ParserError {
    #[error("Query is empty")]
    EmptyQuery(),

    #[error("Unterminated string literal starting at offset {0}")]
    UnterminatedString(usize),

    #[error("Unexpected character '{0}' at offset {1}")]
    UnexpectedCharacter(char, usize),

    #[error("Invalid number literal '{0}'")]
    InvalidNumber(String),

    #[error("Query must start with '<event_type> where', got: '{0}'")]
    MissingWhere(String),

    #[error("Missing closing parenthesis in query")]
    MissingClosingParenthesis(),

    #[error("Encountered unexpected token '{0}' in query")]
    UnexpectedToken(String),

    #[error("Query ended unexpectedly")]
    UnexpectedEnd(),

    #[error("Encountered invalid operator '{0}' in query")]
    InvalidOperator(String),

    #[error("Unknown function '{0}'")]
    UnknownFunction(String),

    #[error("Function '{0}' expects a field followed by at least one string pattern")]
    InvalidFunctionArguments(String),

    #[error("Operator '{0}' requires a string, number, boolean or null literal, got: '{1}'")]
    InvalidComparisonValue(String, String),

    #[error("Failed to parse regular expression: '{0}'")]
    RegexParsing(Box<fancy_regex::Error>),
}

#[cfg(feature = "serde_json")]
#[derive(Debug, thiserror::Error)]
pub enum JSONError {
    #[error("{0} is not a valid field value")]
    InvalidFieldValue(String),

    #[error("Events must be plain key value mappings")]
    InvalidEvent(),
}

#[derive(Debug, thiserror::Error)]
pub enum NormalizationError {
    #[error("Invalid {0} condition '{1}': {2}")]
    InvalidCondition(String, String, ParserError),

    #[error("Invalid field mapping '{0}'")]
    InvalidMapping(String),

    #[error("Missing timestamp field '{0}', check that the input comes from {1}")]
    MissingTimestamp(String, String),

    #[error("Timestamp '{0}' does not match the format '{1}'")]
    InvalidTimestamp(String, String),
}
