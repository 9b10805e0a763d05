use crate::error::ParserError;
use crate::field::FieldValue;
use std::fmt;
use std::fmt::Display;
use std::iter::Peekable;
use std::str::CharIndices;

#[derive(Debug, PartialEq, Clone)]
pub(crate) enum Token {
    Identifier(String),
    String(String),
    Integer(i64),
    True,
    False,
    Null,
    Not,
    And,
    Or,
    Where,
    In,
    InInsensitive,
    Equals,
    NotEquals,
    Colon,
    Comma,
    OpeningParenthesis,
    ClosingParenthesis,
    End,
}

impl Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Identifier(ref s) => write!(f, "{}", s),
            Self::String(ref s) => write!(f, "{:?}", s),
            Self::Integer(i) => write!(f, "{}", i),
            Self::True => write!(f, "true"),
            Self::False => write!(f, "false"),
            Self::Null => write!(f, "null"),
            Self::Not => write!(f, "not"),
            Self::And => write!(f, "and"),
            Self::Or => write!(f, "or"),
            Self::Where => write!(f, "where"),
            Self::In => write!(f, "in"),
            Self::InInsensitive => write!(f, "in~"),
            Self::Equals => write!(f, "=="),
            Self::NotEquals => write!(f, "!="),
            Self::Colon => write!(f, ":"),
            Self::Comma => write!(f, ","),
            Self::OpeningParenthesis => write!(f, "("),
            Self::ClosingParenthesis => write!(f, ")"),
            Self::End => write!(f, "<END>"),
        }
    }
}

impl Token {
    /// The field value a literal token stands for
    pub(crate) fn literal(&self) -> Option<FieldValue> {
        match self {
            Self::String(s) => Some(FieldValue::from(s.as_str())),
            Self::Integer(i) => Some(FieldValue::Int(*i)),
            Self::True => Some(FieldValue::Boolean(true)),
            Self::False => Some(FieldValue::Boolean(false)),
            Self::Null => Some(FieldValue::Null),
            _ => None,
        }
    }
}

pub(crate) struct Lexer {
    tokens: Vec<Token>,
}

impl Lexer {
    pub(crate) fn new(input: &str) -> Result<Self, ParserError> {
        let mut tokens = Self::tokenize(input)?;
        tokens.reverse();
        Ok(Self { tokens })
    }

    pub(crate) fn next(&mut self) -> Token {
        self.tokens.pop().unwrap_or(Token::End)
    }

    pub(crate) fn peek(&mut self) -> Token {
        self.tokens.last().cloned().unwrap_or(Token::End)
    }

    fn tokenize(input: &str) -> Result<Vec<Token>, ParserError> {
        let mut tokens: Vec<Token> = Vec::new();
        let mut chars = input.char_indices().peekable();

        while let Some((i, c)) = chars.next() {
            match c {
                c if c.is_whitespace() => {}
                '(' => tokens.push(Token::OpeningParenthesis),
                ')' => tokens.push(Token::ClosingParenthesis),
                ',' => tokens.push(Token::Comma),
                ':' => tokens.push(Token::Colon),
                '=' | '!' => match chars.next_if(|(_, next)| *next == '=') {
                    Some(_) if c == '=' => tokens.push(Token::Equals),
                    Some(_) => tokens.push(Token::NotEquals),
                    None => return Err(ParserError::UnexpectedCharacter(c, i)),
                },
                '"' => tokens.push(Token::String(Self::string(&mut chars, i)?)),
                c if c.is_ascii_digit() || c == '-' => {
                    tokens.push(Self::number(&mut chars, c)?)
                }
                c if c.is_alphabetic() || c == '_' => {
                    tokens.push(Self::word(&mut chars, c))
                }
                c => return Err(ParserError::UnexpectedCharacter(c, i)),
            }
        }
        Ok(tokens)
    }

    /// Reads a double-quoted string; `\"` and `\\` are unescaped, other escapes are kept verbatim
    fn string(chars: &mut Peekable<CharIndices>, start: usize) -> Result<String, ParserError> {
        let mut result = String::new();
        while let Some((_, c)) = chars.next() {
            match c {
                '"' => return Ok(result),
                '\\' => match chars.next() {
                    Some((_, '"')) => result.push('"'),
                    Some((_, '\\')) => result.push('\\'),
                    Some((_, 'n')) => result.push('\n'),
                    Some((_, 't')) => result.push('\t'),
                    Some((_, other)) => {
                        result.push('\\');
                        result.push(other);
                    }
                    None => break,
                },
                c => result.push(c),
            }
        }
        Err(ParserError::UnterminatedString(start))
    }

    fn number(chars: &mut Peekable<CharIndices>, first: char) -> Result<Token, ParserError> {
        let mut digits = first.to_string();
        while let Some((_, c)) = chars.next_if(|(_, c)| c.is_ascii_digit()) {
            digits.push(c);
        }
        match digits.parse::<i64>() {
            Ok(i) => Ok(Token::Integer(i)),
            Err(_) => Err(ParserError::InvalidNumber(digits)),
        }
    }

    fn word(chars: &mut Peekable<CharIndices>, first: char) -> Token {
        let mut word = first.to_string();
        while let Some((_, c)) =
            chars.next_if(|(_, c)| c.is_alphanumeric() || *c == '_' || *c == '.')
        {
            word.push(c);
        }
        if let Some((_, c)) = chars.next_if(|(_, c)| *c == '~') {
            word.push(c);
        }

        match word.to_lowercase().as_str() {
            "not" => Token::Not,
            "and" => Token::And,
            "or" => Token::Or,
            "where" => Token::Where,
            "in" => Token::In,
            "in~" => Token::InInsensitive,
            "true" => Token::True,
            "false" => Token::False,
            "null" => Token::Null,
            _ => Token::Identifier(word),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_empty() {
        assert_eq!(Lexer::tokenize("").unwrap(), vec![]);
        assert_eq!(Lexer::tokenize("  \n\t ").unwrap(), vec![]);
    }

    #[test]
    fn test_tokenize_head() {
        let tokens = Lexer::tokenize("process WHERE subtype.create").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Identifier("process".to_string()),
                Token::Where,
                Token::Identifier("subtype.create".to_string()),
            ]
        );
    }

    #[test]
    fn test_tokenize_comparisons() {
        let tokens =
            Lexer::tokenize(r#"(process_name : "sc.exe" and pid!=-4) or ppid == 1"#).unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::OpeningParenthesis,
                Token::Identifier("process_name".to_string()),
                Token::Colon,
                Token::String("sc.exe".to_string()),
                Token::And,
                Token::Identifier("pid".to_string()),
                Token::NotEquals,
                Token::Integer(-4),
                Token::ClosingParenthesis,
                Token::Or,
                Token::Identifier("ppid".to_string()),
                Token::Equals,
                Token::Integer(1),
            ]
        );
    }

    #[test]
    fn test_tokenize_functions_and_sets() {
        let tokens =
            Lexer::tokenize(r#"match~(command_line, "a") and name in~ ("x", null)"#).unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Identifier("match~".to_string()),
                Token::OpeningParenthesis,
                Token::Identifier("command_line".to_string()),
                Token::Comma,
                Token::String("a".to_string()),
                Token::ClosingParenthesis,
                Token::And,
                Token::Identifier("name".to_string()),
                Token::InInsensitive,
                Token::OpeningParenthesis,
                Token::String("x".to_string()),
                Token::Comma,
                Token::Null,
                Token::ClosingParenthesis,
            ]
        );
    }

    #[test]
    fn test_tokenize_string_escapes() {
        let tokens = Lexer::tokenize(r#""net start \"Print Spooler\"" ".*\\sstart\s""#).unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::String("net start \"Print Spooler\"".to_string()),
                Token::String(r".*\sstart\s".to_string()),
            ]
        );
    }

    #[test]
    fn test_unterminated_string() {
        let err = Lexer::tokenize(r#"name == "sc.exe"#).unwrap_err();
        assert!(matches!(err, ParserError::UnterminatedString(8)));
    }

    #[test]
    fn test_single_equals() {
        let err = Lexer::tokenize("name = 1").unwrap_err();
        assert!(matches!(err, ParserError::UnexpectedCharacter('=', 5)));
    }

    #[test]
    fn test_invalid_number() {
        let err = Lexer::tokenize("pid == -").unwrap_err();
        assert!(matches!(err, ParserError::InvalidNumber(ref a) if a == "-"));
    }

    #[test]
    fn test_unexpected_character() {
        let err = Lexer::tokenize("name | pid").unwrap_err();
        assert!(matches!(err, ParserError::UnexpectedCharacter('|', 5)));
    }
}
