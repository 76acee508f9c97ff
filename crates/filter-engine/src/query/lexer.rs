//! Tokenizer for query expressions.

use crate::error::QueryError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    LBracket,
    RBracket,
    LParen,
    RParen,
    Question,
    Slash,
    Backslash,
    Tilde,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Amp,
    Pipe,
    Ident(String),
    QuotedIdent(String),
    Str(String),
    Int(i64),
    Float(f64),
    Param(usize),
}

impl Token {
    pub(crate) fn describe(&self) -> String {
        match self {
            Token::Ident(s) => format!("identifier '{}'", s),
            Token::QuotedIdent(s) => format!("field `{}`", s),
            Token::Str(s) => format!("string '{}'", s),
            Token::Int(v) => format!("number {}", v),
            Token::Float(v) => format!("number {}", v),
            Token::Param(n) => format!("argument ${}", n),
            other => format!("'{}'", other.symbol()),
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            Token::LBracket => "[",
            Token::RBracket => "]",
            Token::LParen => "(",
            Token::RParen => ")",
            Token::Question => "?",
            Token::Slash => "/",
            Token::Backslash => "\\",
            Token::Tilde => "~",
            Token::Eq => "=",
            Token::Ne => "!=",
            Token::Lt => "<",
            Token::Le => "<=",
            Token::Gt => ">",
            Token::Ge => ">=",
            Token::Amp => "&",
            Token::Pipe => "|",
            _ => "",
        }
    }
}

/// A token with its byte offset in the source.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Spanned {
    pub token: Token,
    pub pos: usize,
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.'
}

/// Whether `name` can be written as a bare field reference.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if is_ident_start(c) => chars.all(is_ident_char),
        _ => false,
    }
}

/// `name` as a field reference: bare when possible, otherwise in backticks.
pub fn quote_field(name: &str) -> String {
    if is_identifier(name) {
        return name.to_string();
    }
    let mut out = String::with_capacity(name.len() + 2);
    out.push('`');
    for c in name.chars() {
        if c == '`' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('`');
    out
}

/// Read a quoted run starting at `chars[start]` (the opening quote).
/// Returns the unescaped content and the index just past the closing quote.
fn quoted(chars: &[(usize, char)], start: usize) -> Option<(String, usize)> {
    let quote = chars[start].1;
    let mut value = String::new();
    let mut j = start + 1;
    while j < chars.len() {
        let (_, ch) = chars[j];
        if ch == '\\' && j + 1 < chars.len() {
            value.push(chars[j + 1].1);
            j += 2;
            continue;
        }
        if ch == quote {
            return Some((value, j + 1));
        }
        value.push(ch);
        j += 1;
    }
    None
}

pub(crate) fn tokenize(src: &str) -> Result<Vec<Spanned>, QueryError> {
    let chars: Vec<(usize, char)> = src.char_indices().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let (pos, c) = chars[i];
        let next = chars.get(i + 1).map(|&(_, c)| c);

        let simple = match c {
            '[' => Some(Token::LBracket),
            ']' => Some(Token::RBracket),
            '(' => Some(Token::LParen),
            ')' => Some(Token::RParen),
            '?' => Some(Token::Question),
            '/' => Some(Token::Slash),
            '\\' => Some(Token::Backslash),
            '~' => Some(Token::Tilde),
            '=' => Some(Token::Eq),
            '&' => Some(Token::Amp),
            '|' => Some(Token::Pipe),
            _ => None,
        };
        if let Some(token) = simple {
            tokens.push(Spanned { token, pos });
            i += 1;
            continue;
        }

        match c {
            c if c.is_whitespace() => i += 1,
            '!' if next == Some('=') => {
                tokens.push(Spanned { token: Token::Ne, pos });
                i += 2;
            }
            '<' | '>' => {
                let or_equal = next == Some('=');
                let token = match (c, or_equal) {
                    ('<', false) => Token::Lt,
                    ('<', true) => Token::Le,
                    ('>', false) => Token::Gt,
                    _ => Token::Ge,
                };
                tokens.push(Spanned { token, pos });
                i += if or_equal { 2 } else { 1 };
            }
            '\'' | '"' | '`' => {
                let (value, end) =
                    quoted(&chars, i).ok_or(QueryError::UnterminatedString(pos))?;
                // Backticks quote a field name, other quotes a string value
                let token = if c == '`' {
                    Token::QuotedIdent(value)
                } else {
                    Token::Str(value)
                };
                tokens.push(Spanned { token, pos });
                i = end;
            }
            '$' => {
                let mut j = i + 1;
                while j < chars.len() && chars[j].1.is_ascii_digit() {
                    j += 1;
                }
                let digits: String = chars[i + 1..j].iter().map(|&(_, c)| c).collect();
                let n: usize = digits
                    .parse()
                    .map_err(|_| QueryError::UnexpectedChar { ch: '$', pos })?;
                tokens.push(Spanned {
                    token: Token::Param(n),
                    pos,
                });
                i = j;
            }
            c if c.is_ascii_digit() || (c == '-' && next.is_some_and(|n| n.is_ascii_digit())) => {
                let mut j = i + 1;
                while j < chars.len()
                    && (chars[j].1.is_ascii_digit()
                        || matches!(chars[j].1, '.' | 'e' | 'E')
                        || (matches!(chars[j].1, '+' | '-') && matches!(chars[j - 1].1, 'e' | 'E')))
                {
                    j += 1;
                }
                let text: String = chars[i..j].iter().map(|&(_, c)| c).collect();
                let token = match text.parse::<i64>() {
                    Ok(v) => Token::Int(v),
                    Err(_) => Token::Float(
                        text.parse()
                            .map_err(|_| QueryError::InvalidNumber(text.clone()))?,
                    ),
                };
                tokens.push(Spanned { token, pos });
                i = j;
            }
            c if is_ident_start(c) => {
                let mut j = i + 1;
                while j < chars.len() && is_ident_char(chars[j].1) {
                    j += 1;
                }
                let ident: String = chars[i..j].iter().map(|&(_, c)| c).collect();
                tokens.push(Spanned {
                    token: Token::Ident(ident),
                    pos,
                });
                i = j;
            }
            other => return Err(QueryError::UnexpectedChar { ch: other, pos }),
        }
    }

    Ok(tokens)
}
