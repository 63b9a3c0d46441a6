//! Statement rendering
//!
//! Pure functions that append one T-SQL statement to a buffer, plus the
//! existence guards that can be prepended to them.

mod builder;
mod guard;
mod ident;


pub use builder::*;
pub use guard::*;
pub use ident::*;

use std::fmt;

/// What a statement does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    CreateModule,
    CreateRoutine,
    DropRoutine,
    DropModule,
    ConfigureClr,
}

/// One generated statement, ready to be submitted as a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    kind: StatementKind,
    guarded: bool,
    text: String,
}

impl Statement {
    pub fn new(kind: StatementKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            guarded: false,
            text: text.into(),
        }
    }

    /// A statement whose action runs only when its guard holds
    pub fn guarded(kind: StatementKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            guarded: true,
            text: text.into(),
        }
    }

    pub fn kind(&self) -> StatementKind {
        self.kind
    }

    pub fn is_guarded(&self) -> bool {
        self.guarded
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl AsRef<str> for Statement {
    fn as_ref(&self) -> &str {
        &self.text
    }
}

impl From<Statement> for String {
    fn from(statement: Statement) -> Self {
        statement.text
    }
}
