use super::error::{FilterError, FilterResult};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Ident(String),
    Str(String),
    Number(f64),
    Bool(bool),
    Null,
    Dot,
    Eq,
    Ne,
    And,
    Or,
    Not,
    LParen,
    RParen,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Ident(name) => write!(f, "name '{}'", name),
            Token::Str(s) => write!(f, "string \"{}\"", s),
            Token::Number(n) => write!(f, "number {}", n),
            Token::Bool(b) => write!(f, "'{}'", b),
            Token::Null => f.write_str("'null'"),
            Token::Dot => f.write_str("'.'"),
            Token::Eq => f.write_str("'=='"),
            Token::Ne => f.write_str("'!='"),
            Token::And => f.write_str("'&&'"),
            Token::Or => f.write_str("'||'"),
            Token::Not => f.write_str("'!'"),
            Token::LParen => f.write_str("'('"),
            Token::RParen => f.write_str("')'"),
        }
    }
}

/// Token with its byte offset in the source
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Spanned {
    pub token: Token,
    pub pos: usize,
}

pub(crate) struct Lexer<'a> {
    input: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    tokens: Vec<Spanned>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.char_indices().peekable(),
            tokens: Vec::new(),
        }
    }

    pub fn tokenize(mut self) -> FilterResult<Vec<Spanned>> {
        while let Some(&(pos, ch)) = self.chars.peek() {
            match ch {
                c if c.is_whitespace() => {
                    self.chars.next();
                }
                '.' => self.single(Token::Dot, pos),
                '(' => self.single(Token::LParen, pos),
                ')' => self.single(Token::RParen, pos),
                '=' => self.pair('=', Token::Eq, pos, ch)?,
                '&' => self.pair('&', Token::And, pos, ch)?,
                '|' => self.pair('|', Token::Or, pos, ch)?,
                '!' => {
                    self.chars.next();
                    if self.chars.next_if(|&(_, c)| c == '=').is_some() {
                        self.push(Token::Ne, pos);
                    } else {
                        self.push(Token::Not, pos);
                    }
                }
                '"' | '\'' => self.string(pos, ch)?,
                c if c.is_ascii_digit() || c == '-' => self.number(pos)?,
                c if c.is_alphabetic() || c == '_' => self.word(pos),
                _ => return Err(FilterError::UnexpectedChar { ch, pos }),
            }
        }
        Ok(self.tokens)
    }

    fn push(&mut self, token: Token, pos: usize) {
        self.tokens.push(Spanned { token, pos });
    }

    fn single(&mut self, token: Token, pos: usize) {
        self.chars.next();
        self.push(token, pos);
    }

    /// Two-character operators: `==`, `&&`, `||`
    fn pair(&mut self, second: char, token: Token, pos: usize, first: char) -> FilterResult<()> {
        self.chars.next();
        match self.chars.next() {
            Some((_, c)) if c == second => {
                self.push(token, pos);
                Ok(())
            }
            _ => Err(FilterError::UnexpectedChar { ch: first, pos }),
        }
    }

    fn string(&mut self, start: usize, quote: char) -> FilterResult<()> {
        self.chars.next();
        let mut value = String::new();

        loop {
            match self.chars.next() {
                None => return Err(FilterError::UnterminatedString { pos: start }),
                Some((_, c)) if c == quote => break,
                Some((_, '\\')) => match self.chars.next() {
                    Some((_, 'n')) => value.push('\n'),
                    Some((_, 't')) => value.push('\t'),
                    Some((_, c)) => value.push(c),
                    None => return Err(FilterError::UnterminatedString { pos: start }),
                },
                Some((_, c)) => value.push(c),
            }
        }

        self.push(Token::Str(value), start);
        Ok(())
    }

    fn number(&mut self, start: usize) -> FilterResult<()> {
        let mut end = start;
        let mut first = true;
        while let Some(&(pos, c)) = self.chars.peek() {
            let accepted = c.is_ascii_digit() || c == '.' || (first && c == '-');
            if !accepted {
                break;
            }
            end = pos + c.len_utf8();
            first = false;
            self.chars.next();
        }

        let text = &self.input[start..end];
        let value = text.parse::<f64>().map_err(|_| FilterError::InvalidNumber {
            text: text.to_string(),
            pos: start,
        })?;
        self.push(Token::Number(value), start);
        Ok(())
    }

    fn word(&mut self, start: usize) {
        let mut end = start;
        while let Some(&(pos, c)) = self.chars.peek() {
            if !(c.is_alphanumeric() || c == '_') {
                break;
            }
            end = pos + c.len_utf8();
            self.chars.next();
        }

        let text = &self.input[start..end];
        // Words after a dot are field names, never keywords
        let after_dot = matches!(self.tokens.last(), Some(Spanned { token: Token::Dot, .. }));
        let token = if after_dot {
            Token::Ident(text.to_string())
        } else {
            match text {
                "and" => Token::And,
                "or" => Token::Or,
                "not" => Token::Not,
                "true" => Token::Bool(true),
                "false" => Token::Bool(false),
                "null" => Token::Null,
                _ => Token::Ident(text.to_string()),
            }
        };
        self.push(token, start);
    }
}
