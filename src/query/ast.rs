use crate::error::ParserError;
use crate::event::Event;
use crate::field::{Comparison, Field, FieldValue, FunctionCall};
use crate::query::lexer::{Lexer, Token};
use std::fmt;
use std::str::FromStr;

enum PrefixOperator {
    Not,
}

impl PrefixOperator {
    fn binding_power(&self) -> u8 {
        match self {
            Self::Not => 3,
        }
    }
}

enum InfixOperator {
    And,
    Or,
}

impl InfixOperator {
    fn binding_power(&self) -> u8 {
        match self {
            Self::And => 2,
            Self::Or => 1,
        }
    }
}

#[derive(Debug)]
pub(crate) enum Ast {
    Boolean(bool),
    Field(Field),
    Not(Box<Ast>),
    And(Box<Ast>, Box<Ast>),
    Or(Box<Ast>, Box<Ast>),
}

impl Ast {
    /// Parses the condition following `where`; the whole token stream must be consumed
    pub(crate) fn new(lexer: &mut Lexer) -> Result<Self, ParserError> {
        let ast = Self::parse_token_stream(lexer, 0)?;
        match lexer.next() {
            Token::End => Ok(ast),
            t => Err(ParserError::UnexpectedToken(t.to_string())),
        }
    }

    fn parse_token_stream(lexer: &mut Lexer, min_binding_power: u8) -> Result<Self, ParserError> {
        let mut left = match lexer.next() {
            Token::Identifier(name) => Self::parse_term(name, lexer)?,
            Token::True => Self::Boolean(true),
            Token::False => Self::Boolean(false),
            Token::OpeningParenthesis => {
                let left = Self::parse_token_stream(lexer, 0)?;
                if lexer.next() != Token::ClosingParenthesis {
                    return Err(ParserError::MissingClosingParenthesis());
                }
                left
            }
            Token::Not => {
                let right = Self::parse_token_stream(lexer, PrefixOperator::Not.binding_power())?;
                Self::Not(Box::new(right))
            }
            Token::End => return Err(ParserError::UnexpectedEnd()),
            t => return Err(ParserError::UnexpectedToken(t.to_string())),
        };

        loop {
            let operator = match lexer.peek() {
                Token::End | Token::ClosingParenthesis => break,
                Token::And => InfixOperator::And,
                Token::Or => InfixOperator::Or,
                t => return Err(ParserError::InvalidOperator(t.to_string())),
            };

            let bp = operator.binding_power();
            if bp < min_binding_power {
                break;
            }
            lexer.next();

            left = {
                let right = Self::parse_token_stream(lexer, bp)?;
                match operator {
                    InfixOperator::And => Self::And(Box::new(left), Box::new(right)),
                    InfixOperator::Or => Self::Or(Box::new(left), Box::new(right)),
                }
            };
        }

        Ok(left)
    }

    fn parse_term(name: String, lexer: &mut Lexer) -> Result<Self, ParserError> {
        let field = match lexer.peek() {
            Token::Equals | Token::NotEquals | Token::Colon => {
                let operator = lexer.next();
                let comparison = match operator {
                    Token::Equals => Comparison::Equals,
                    Token::NotEquals => Comparison::NotEquals,
                    _ => Comparison::Matches,
                };
                let value = Self::parse_literal(lexer, &operator)?;
                Field::compare(name, comparison, value)?
            }
            Token::In | Token::InInsensitive => {
                let operator = lexer.next();
                if lexer.next() != Token::OpeningParenthesis {
                    return Err(ParserError::UnexpectedToken(operator.to_string()));
                }
                let mut values = vec![Self::parse_literal(lexer, &operator)?];
                loop {
                    match lexer.next() {
                        Token::Comma => values.push(Self::parse_literal(lexer, &operator)?),
                        Token::ClosingParenthesis => break,
                        _ => return Err(ParserError::MissingClosingParenthesis()),
                    }
                }
                Field::one_of(name, values, operator == Token::In)?
            }
            Token::OpeningParenthesis => {
                let call = FunctionCall::from_str(&name)?;
                lexer.next();
                let field = match lexer.next() {
                    Token::Identifier(field) => field,
                    _ => return Err(ParserError::InvalidFunctionArguments(name)),
                };
                let mut arguments = vec![];
                loop {
                    match lexer.next() {
                        Token::Comma => match lexer.next() {
                            Token::String(s) => arguments.push(s),
                            _ => return Err(ParserError::InvalidFunctionArguments(name)),
                        },
                        Token::ClosingParenthesis => break,
                        _ => return Err(ParserError::MissingClosingParenthesis()),
                    }
                }
                Field::function(field, call, arguments)?
            }
            _ => match name.rsplit_once('.') {
                Some((field, option)) if !field.is_empty() && !option.is_empty() => {
                    Field::enum_option(field, option)
                }
                _ => return Err(ParserError::UnexpectedToken(name)),
            },
        };
        Ok(Self::Field(field))
    }

    fn parse_literal(lexer: &mut Lexer, operator: &Token) -> Result<FieldValue, ParserError> {
        match lexer.next() {
            Token::End => Err(ParserError::UnexpectedEnd()),
            t => t.literal().ok_or_else(|| {
                ParserError::InvalidComparisonValue(operator.to_string(), t.to_string())
            }),
        }
    }

    pub(crate) fn evaluate(&self, event: &Event) -> bool {
        match self {
            Self::Boolean(b) => *b,
            Self::Field(field) => field.evaluate(event),
            Self::Not(ref operand) => !operand.evaluate(event),
            Self::And(ref left, ref right) => left.evaluate(event) && right.evaluate(event),
            Self::Or(ref left, ref right) => left.evaluate(event) || right.evaluate(event),
        }
    }

    /// Names of all fields the condition reads
    pub(crate) fn fields(&self) -> Vec<&str> {
        let mut result = vec![];
        Self::fields_recursive(self, &mut result);
        result
    }

    fn fields_recursive<'a>(current: &'a Self, acc: &mut Vec<&'a str>) {
        match current {
            Self::Field(f) => {
                if !acc.contains(&f.name.as_str()) {
                    acc.push(&f.name)
                }
            }
            Self::Not(s) => Self::fields_recursive(s, acc),
            Self::Or(left, right) | Self::And(left, right) => {
                Self::fields_recursive(left, acc);
                Self::fields_recursive(right, acc);
            }
            Self::Boolean(_) => {}
        }
    }
}

impl fmt::Display for Ast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(b) => write!(f, "{}", b),
            Self::Field(field) => write!(f, "{}", field),
            Self::Not(a) => write!(f, "not ({})", a),
            Self::And(a, b) => write!(f, "({} and {})", a, b),
            Self::Or(a, b) => write!(f, "({} or {})", a, b),
        }
    }
}
