mod ast;
mod lexer;

use crate::error::ParserError;
use crate::event::Event;
use crate::query::ast::Ast;
use crate::query::lexer::{Lexer, Token};
use log::debug;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Event type that selects every event regardless of its class
const ANY: &str = "any";

/// A compiled single-event query of the form `<event_type> where <condition>`.
///
/// The source text is kept verbatim so an analytic can be written back unchanged.
///
/// # Example
/// ```rust
/// use eql_analytic::{Event, Query};
/// let query: Query = r#"process where process_name : "sc.exe""#.parse().unwrap();
/// let mut event = Event::with_type("process");
/// event.insert("process_name", "SC.exe");
/// assert!(query.evaluate(&event));
/// ```
#[derive(Debug, Deserialize)]
#[serde(try_from = "String")]
pub struct Query {
    source: String,
    event_type: Option<String>,
    ast: Ast,
}

impl FromStr for Query {
    type Err = ParserError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut lexer = Lexer::new(s)?;
        let event_type = match (lexer.next(), lexer.next()) {
            (Token::End, _) => return Err(ParserError::EmptyQuery()),
            (Token::Identifier(t), Token::Where) if !t.contains('.') => t,
            (t, _) => return Err(ParserError::MissingWhere(t.to_string())),
        };
        let ast = Ast::new(&mut lexer)?;
        debug!("Compiled query for '{}' events: {}", event_type, ast);

        Ok(Self {
            source: s.trim().to_string(),
            event_type: match event_type.eq_ignore_ascii_case(ANY) {
                true => None,
                false => Some(event_type),
            },
            ast,
        })
    }
}

impl TryFrom<String> for Query {
    type Error = ParserError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_str(&s)
    }
}

impl Serialize for Query {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.source)
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}

impl Query {
    /// Compile a bare condition without the `<event_type> where` head.
    /// The result applies to events of every class.
    ///
    /// # Example
    /// ```rust
    /// use eql_analytic::{Event, Query};
    /// let filter = Query::condition("EventId == 1 or EventId == 5").unwrap();
    /// assert!(filter.evaluate(&Event::from([("EventId", 5)])));
    /// ```
    pub fn condition(s: &str) -> Result<Self, ParserError> {
        let mut lexer = Lexer::new(s)?;
        if lexer.peek() == Token::End {
            return Err(ParserError::EmptyQuery());
        }
        let ast = Ast::new(&mut lexer)?;

        Ok(Self {
            source: s.trim().to_string(),
            event_type: None,
            ast,
        })
    }

    /// The event class the query applies to, `None` for `any`
    pub fn event_type(&self) -> Option<&str> {
        self.event_type.as_deref()
    }

    /// The query text as written
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Names of all event fields the condition reads
    pub fn fields(&self) -> Vec<&str> {
        self.ast.fields()
    }

    /// Check whether the event matches; events of a different class never do
    pub fn evaluate(&self, event: &Event) -> bool {
        if let Some(expected) = &self.event_type {
            match event.event_type() {
                Some(actual) if actual.eq_ignore_ascii_case(expected) => {}
                _ => return false,
            }
        }
        self.ast.evaluate(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_head() {
        let query = Query::from_str("process where subtype.create").unwrap();
        assert_eq!(query.event_type(), Some("process"));
        assert_eq!(query.source(), "process where subtype.create");

        let query = Query::from_str("  ANY where true \n").unwrap();
        assert!(query.event_type().is_none());
        assert_eq!(query.to_string(), "ANY where true");
    }

    #[test]
    fn test_empty_query() {
        let err = Query::from_str("   ").unwrap_err();
        assert!(matches!(err, ParserError::EmptyQuery()));
    }

    #[test]
    fn test_missing_where() {
        let err = Query::from_str(r#"process_name : "sc.exe""#).unwrap_err();
        assert!(matches!(err, ParserError::MissingWhere(ref a) if a == "process_name"));

        let err = Query::from_str("subtype.create where true").unwrap_err();
        assert!(matches!(err, ParserError::MissingWhere(_)));
    }

    #[test]
    fn test_evaluate_event_type() {
        let query = Query::from_str("process where subtype.create").unwrap();
        let mut event = Event::with_type("Process");
        event.insert("subtype", "create");
        assert!(query.evaluate(&event));

        let mut event = Event::with_type("file");
        event.insert("subtype", "create");
        assert!(!query.evaluate(&event));

        let event = Event::from([("subtype", "create")]);
        assert!(!query.evaluate(&event));

        let query = Query::from_str("any where subtype.create").unwrap();
        assert!(query.evaluate(&event));
    }

    #[test]
    fn test_condition() {
        let filter = Query::condition(r#"EventId == 1 and Image : "*\\sc.exe""#).unwrap();
        assert!(filter.event_type().is_none());
        assert_eq!(filter.fields(), vec!["EventId", "Image"]);
        let mut event = Event::from([("EventId", 1)]);
        event.insert("Image", "C:\\Windows\\SC.EXE");
        assert!(filter.evaluate(&event));
        event.insert("EventId", 5);
        assert!(!filter.evaluate(&event));

        assert!(matches!(
            Query::condition(" ").unwrap_err(),
            ParserError::EmptyQuery()
        ));
        assert!(Query::condition("process where EventId == 1").is_err());
    }

    #[test]
    fn test_deserialize_from_yaml_string() {
        let query: Query = serde_yml::from_str(r#""process where pid == 4""#).unwrap();
        assert_eq!(query.fields(), vec!["pid"]);

        let err = serde_yml::from_str::<Query>(r#""process where pid ==""#).unwrap_err();
        assert!(err.to_string().contains("Query ended unexpectedly"), "{}", err);
    }
}
