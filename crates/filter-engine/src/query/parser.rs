//! Recursive-descent parser producing the query AST.

use map_common::AttributeValue;

use super::lexer::{tokenize, Spanned, Token};
use crate::error::QueryError;

/// One bracketed step of a query.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// `[?cond]`
    Filter(Condition),
    /// `[/field]` or `[\field]`
    Sort { field: String, descending: bool },
    /// `[=field]`
    Project(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// `~` case-insensitive wildcard match
    Match,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Literal(AttributeValue),
    /// `$N`, 1-based
    Param(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Compare {
        field: String,
        op: CompareOp,
        operand: Operand,
    },
    And(Box<Condition>, Box<Condition>),
    Or(Box<Condition>, Box<Condition>),
}

pub(crate) fn parse(src: &str) -> Result<Vec<Step>, QueryError> {
    let tokens = tokenize(src)?;
    let mut parser = Parser { tokens, cursor: 0 };
    parser.steps()
}

struct Parser {
    tokens: Vec<Spanned>,
    cursor: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.cursor).map(|s| &s.token)
    }

    fn next(&mut self, expected: &'static str) -> Result<Spanned, QueryError> {
        let spanned = self
            .tokens
            .get(self.cursor)
            .cloned()
            .ok_or(QueryError::UnexpectedEnd(expected))?;
        self.cursor += 1;
        Ok(spanned)
    }

    fn expect(&mut self, want: Token, expected: &'static str) -> Result<(), QueryError> {
        let spanned = self.next(expected)?;
        if spanned.token == want {
            Ok(())
        } else {
            Err(unexpected(&spanned, expected))
        }
    }

    fn ident(&mut self) -> Result<String, QueryError> {
        let spanned = self.next("field name")?;
        match &spanned.token {
            Token::Ident(name) | Token::QuotedIdent(name) => Ok(name.clone()),
            _ => Err(unexpected(&spanned, "field name")),
        }
    }

    fn steps(&mut self) -> Result<Vec<Step>, QueryError> {
        let mut steps = Vec::new();
        while self.peek().is_some() {
            if matches!(steps.last(), Some(Step::Project(_))) {
                return Err(QueryError::ProjectionNotLast);
            }

            self.expect(Token::LBracket, "'['")?;
            let marker = self.next("'?', '/', '\\' or '='")?;
            let step = match marker.token {
                Token::Question => Step::Filter(self.or_condition()?),
                Token::Slash => Step::Sort {
                    field: self.ident()?,
                    descending: false,
                },
                Token::Backslash => Step::Sort {
                    field: self.ident()?,
                    descending: true,
                },
                Token::Eq => Step::Project(self.ident()?),
                _ => return Err(unexpected(&marker, "'?', '/', '\\' or '='")),
            };
            self.expect(Token::RBracket, "']'")?;
            steps.push(step);
        }
        Ok(steps)
    }

    fn or_condition(&mut self) -> Result<Condition, QueryError> {
        let mut left = self.and_condition()?;
        while self.peek() == Some(&Token::Pipe) {
            self.cursor += 1;
            let right = self.and_condition()?;
            left = Condition::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn and_condition(&mut self) -> Result<Condition, QueryError> {
        let mut left = self.primary()?;
        while self.peek() == Some(&Token::Amp) {
            self.cursor += 1;
            let right = self.primary()?;
            left = Condition::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn primary(&mut self) -> Result<Condition, QueryError> {
        if self.peek() == Some(&Token::LParen) {
            self.cursor += 1;
            let inner = self.or_condition()?;
            self.expect(Token::RParen, "')'")?;
            return Ok(inner);
        }

        let field = self.ident()?;
        let op_token = self.next("comparison operator")?;
        let op = match op_token.token {
            Token::Tilde => CompareOp::Match,
            Token::Eq => CompareOp::Eq,
            Token::Ne => CompareOp::Ne,
            Token::Lt => CompareOp::Lt,
            Token::Le => CompareOp::Le,
            Token::Gt => CompareOp::Gt,
            Token::Ge => CompareOp::Ge,
            _ => return Err(unexpected(&op_token, "comparison operator")),
        };
        let operand = self.operand()?;

        Ok(Condition::Compare { field, op, operand })
    }

    fn operand(&mut self) -> Result<Operand, QueryError> {
        let spanned = self.next("value")?;
        let operand = match &spanned.token {
            Token::Str(s) => Operand::Literal(AttributeValue::Text(s.clone())),
            Token::Int(v) => Operand::Literal(AttributeValue::Int(*v)),
            Token::Float(v) => Operand::Literal(AttributeValue::Float(*v)),
            Token::Param(n) => Operand::Param(*n),
            Token::Ident(word) => match word.as_str() {
                "true" => Operand::Literal(AttributeValue::Bool(true)),
                "false" => Operand::Literal(AttributeValue::Bool(false)),
                "null" => Operand::Literal(AttributeValue::Null),
                _ => return Err(unexpected(&spanned, "value")),
            },
            _ => return Err(unexpected(&spanned, "value")),
        };
        Ok(operand)
    }
}

fn unexpected(spanned: &Spanned, expected: &'static str) -> QueryError {
    QueryError::UnexpectedToken {
        found: spanned.token.describe(),
        expected,
        pos: spanned.pos,
    }
}
