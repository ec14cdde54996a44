//! Boolean filter expressions over events
//!
//! A filter is written against a single variable, `event`, holding the JSON
//! form of an [`Event`]:
//!
//! ```text
//! event.action == "changed" && event.resource.resource_subtype == "default_task"
//! event.change.new_value.gid == "1210930954402852"
//! not (event.type == "story") or event.user.name != 'Bot'
//! ```
//!
//! Supported: field paths, `==`, `!=`, `&&`/`and`, `||`/`or`, `!`/`not`,
//! parentheses, string/number/`true`/`false`/`null` literals.
//!
//! Syntax errors surface from [`EventFilter::compile`]. Once compiled, a
//! filter never fails. A field the event does not have reads as `null`, so
//! `event.change == null` selects events without a change. An event whose
//! evaluation errors (for instance a path through a missing field) simply
//! does not match.

mod ast;
mod error;
mod evaluator;
mod lexer;
mod parser;

pub use error::{FilterError, FilterResult};

use crate::events::Event;
use ast::Expr;
use serde_json::Value;

/// Compiled filter expression
#[derive(Debug, Clone)]
pub struct EventFilter {
    source: String,
    expr: Expr,
}

impl EventFilter {
    /// Parses and checks `expression`
    pub fn compile(expression: &str) -> FilterResult<Self> {
        let expr = parser::Parser::parse(expression)?;
        Ok(Self {
            source: expression.to_string(),
            expr,
        })
    }

    /// Expression text as given to [`compile`](Self::compile)
    pub fn source(&self) -> &str {
        &self.source
    }

    /// True when the event satisfies the expression
    pub fn matches(&self, event: &Event) -> bool {
        self.matches_value(&event.to_value())
    }

    /// Same as [`matches`](Self::matches) for an event already in JSON form
    pub fn matches_value(&self, event: &Value) -> bool {
        match evaluator::truth(&self.expr, event) {
            Ok(matched) => matched,
            Err(e) => {
                tracing::trace!("event excluded by filter '{}': {}", self.source, e);
                false
            }
        }
    }

    /// Keeps the matching events, in order
    pub fn apply(&self, events: Vec<Event>) -> Vec<Event> {
        events.into_iter().filter(|event| self.matches(event)).collect()
    }
}
