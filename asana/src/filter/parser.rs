use super::ast::Expr;
use super::error::{FilterError, FilterResult};
use super::lexer::{Lexer, Spanned, Token};
use serde_json::{Number, Value};

/// Root variable every path starts from
const ROOT: &str = "event";

/// Deepest allowed nesting of `(` and `!`
pub(crate) const MAX_DEPTH: usize = 64;

/// Recursive-descent parser, lowest precedence first: `||`, `&&`, `!`, `==`/`!=`
pub(crate) struct Parser {
    tokens: Vec<Spanned>,
    cursor: usize,
    depth: usize,
}

impl Parser {
    pub fn parse(input: &str) -> FilterResult<Expr> {
        let tokens = Lexer::new(input).tokenize()?;
        if tokens.is_empty() {
            return Err(FilterError::Empty);
        }

        let mut parser = Parser {
            tokens,
            cursor: 0,
            depth: 0,
        };
        let expr = parser.or()?;
        if let Some(extra) = parser.peek() {
            return Err(FilterError::UnexpectedToken {
                found: extra.token.to_string(),
                expected: "end of expression",
                pos: extra.pos,
            });
        }

        if let Some(value) = expr.non_boolean_literal() {
            return Err(FilterError::NotBoolean {
                found: value.to_string(),
            });
        }
        Ok(expr)
    }

    fn peek(&self) -> Option<&Spanned> {
        self.tokens.get(self.cursor)
    }

    fn next_is(&self, token: &Token) -> bool {
        self.peek().is_some_and(|s| &s.token == token)
    }

    fn advance(&mut self) -> Option<Spanned> {
        let spanned = self.tokens.get(self.cursor).cloned();
        self.cursor += 1;
        spanned
    }

    fn enter(&mut self, pos: usize) -> FilterResult<()> {
        if self.depth >= MAX_DEPTH {
            return Err(FilterError::TooDeep {
                max: MAX_DEPTH,
                pos,
            });
        }
        self.depth += 1;
        Ok(())
    }

    fn or(&mut self) -> FilterResult<Expr> {
        let mut left = self.and()?;
        while self.next_is(&Token::Or) {
            self.advance();
            let right = self.and()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn and(&mut self) -> FilterResult<Expr> {
        let mut left = self.unary()?;
        while self.next_is(&Token::And) {
            self.advance();
            let right = self.unary()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn unary(&mut self) -> FilterResult<Expr> {
        if self.next_is(&Token::Not) {
            let pos = self.advance().map_or(0, |s| s.pos);
            self.enter(pos)?;
            let inner = self.unary()?;
            self.depth -= 1;
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.comparison()
    }

    fn comparison(&mut self) -> FilterResult<Expr> {
        let left = self.operand()?;
        if self.next_is(&Token::Eq) {
            self.advance();
            let right = self.operand()?;
            return Ok(Expr::Eq(Box::new(left), Box::new(right)));
        }
        if self.next_is(&Token::Ne) {
            self.advance();
            let right = self.operand()?;
            return Ok(Expr::Ne(Box::new(left), Box::new(right)));
        }
        Ok(left)
    }

    fn operand(&mut self) -> FilterResult<Expr> {
        const EXPECTED: &str = "a value, a path or '('";

        let Some(Spanned { token, pos }) = self.advance() else {
            return Err(FilterError::UnexpectedEnd { expected: EXPECTED });
        };

        match token {
            Token::Str(s) => Ok(Expr::Literal(Value::String(s))),
            Token::Number(n) => Ok(Expr::Literal(
                Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null),
            )),
            Token::Bool(b) => Ok(Expr::Literal(Value::Bool(b))),
            Token::Null => Ok(Expr::Literal(Value::Null)),
            Token::LParen => {
                self.enter(pos)?;
                let inner = self.or()?;
                self.depth -= 1;
                match self.advance() {
                    Some(Spanned { token: Token::RParen, .. }) => Ok(inner),
                    Some(other) => Err(FilterError::UnexpectedToken {
                        found: other.token.to_string(),
                        expected: "')'",
                        pos: other.pos,
                    }),
                    None => Err(FilterError::UnexpectedEnd { expected: "')'" }),
                }
            }
            Token::Ident(name) if name == ROOT => self.path(),
            Token::Ident(name) => Err(FilterError::UnknownName { name, pos }),
            other => Err(FilterError::UnexpectedToken {
                found: other.to_string(),
                expected: EXPECTED,
                pos,
            }),
        }
    }

    /// Segments following `event`
    fn path(&mut self) -> FilterResult<Expr> {
        let mut segments = Vec::new();
        while self.next_is(&Token::Dot) {
            self.advance();
            match self.advance() {
                Some(Spanned { token: Token::Ident(name), .. }) => segments.push(name),
                Some(other) => {
                    return Err(FilterError::UnexpectedToken {
                        found: other.token.to_string(),
                        expected: "a field name",
                        pos: other.pos,
                    })
                }
                None => return Err(FilterError::UnexpectedEnd { expected: "a field name" }),
            }
        }
        Ok(Expr::Path(segments))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(segments: &[&str]) -> Box<Expr> {
        Box::new(Expr::Path(segments.iter().map(|s| s.to_string()).collect()))
    }

    #[test]
    fn test_precedence() {
        // a || b && !c  ==>  a || (b && (!c))
        let expr = Parser::parse("event.a == 1 || event.b and not event.c").unwrap();
        assert_eq!(
            expr,
            Expr::Or(
                Box::new(Expr::Eq(path(&["a"]), Box::new(Expr::Literal(json!(1.0))))),
                Box::new(Expr::And(path(&["b"]), Box::new(Expr::Not(path(&["c"]))))),
            )
        );
    }

    #[test]
    fn test_parentheses_override_precedence() {
        let expr = Parser::parse("(event.a || event.b) && event.c").unwrap();
        assert_eq!(
            expr,
            Expr::And(
                Box::new(Expr::Or(path(&["a"]), path(&["b"]))),
                path(&["c"]),
            )
        );
    }

    #[test]
    fn test_bare_event_is_root_path() {
        assert_eq!(Parser::parse("event == null").unwrap(), Expr::Eq(path(&[]), Box::new(Expr::Literal(Value::Null))));
    }

    #[test]
    fn test_incomplete_comparison() {
        assert_eq!(
            Parser::parse("event.action ==").unwrap_err(),
            FilterError::UnexpectedEnd {
                expected: "a value, a path or '('"
            }
        );
    }

    #[test]
    fn test_rejections() {
        assert_eq!(Parser::parse("   ").unwrap_err(), FilterError::Empty);
        assert!(matches!(
            Parser::parse("task.action == \"x\"").unwrap_err(),
            FilterError::UnknownName { ref name, pos: 0 } if name == "task"
        ));
        assert!(matches!(
            Parser::parse("(event.a == 1").unwrap_err(),
            FilterError::UnexpectedEnd { expected: "')'" }
        ));
        assert!(matches!(
            Parser::parse("event.a == 1 event.b").unwrap_err(),
            FilterError::UnexpectedToken { pos: 13, .. }
        ));
        assert!(matches!(
            Parser::parse("event.").unwrap_err(),
            FilterError::UnexpectedEnd { .. }
        ));
        assert!(matches!(
            Parser::parse("\"changed\"").unwrap_err(),
            FilterError::NotBoolean { .. }
        ));
        assert!(Parser::parse("true").is_ok());
    }

    #[test]
    fn test_nesting_depth_is_bounded() {
        let nested = |n: usize| format!("{}event.a == 1{}", "(".repeat(n), ")".repeat(n));
        assert!(Parser::parse(&nested(MAX_DEPTH)).is_ok());
        assert_eq!(
            Parser::parse(&nested(MAX_DEPTH + 1)).unwrap_err(),
            FilterError::TooDeep {
                max: MAX_DEPTH,
                pos: MAX_DEPTH
            }
        );

        let huge = "(".repeat(200_000);
        assert!(matches!(
            Parser::parse(&huge).unwrap_err(),
            FilterError::TooDeep { .. }
        ));

        let negations = format!("{}true", "!".repeat(MAX_DEPTH + 1));
        assert!(matches!(
            Parser::parse(&negations).unwrap_err(),
            FilterError::TooDeep { .. }
        ));
    }
}
