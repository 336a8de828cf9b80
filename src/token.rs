//! Building blocks of the decoder's state machine.
//!
//! The decoder reads one character at a time. Each character is classified
//! ([`CharClass`]) and handed to the transition function of the current
//! [`State`]; transitions push [`Token`]s onto the decoder's stack, and the
//! stack is reduced after every character.

use crate::{BinaryBuffer, Record, RecordLink, Value};

/// What the decoder is currently collecting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    /// Start of a record, or right after a top-level comma
    Guess,
    /// Field name or class name
    Name,
    /// Dispatch on the first character of a value
    Value,
    /// Inside a double-quoted string
    String,
    /// Boundary between fields or elements
    Comma,
    Link,
    Number,
    /// Quoted map key
    Key,
    Boolean,
    Buffer,
}

impl State {
    /// Number of states; sizes the transition table.
    pub const COUNT: usize = 10;

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Character classes the transitions distinguish.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CharClass {
    /// ASCII letter or `_`
    Word,
    Digit,
    Other,
}

impl CharClass {
    #[inline]
    pub fn of(ch: char) -> Self {
        if ch.is_ascii_alphabetic() || ch == '_' {
            CharClass::Word
        } else if ch.is_ascii_digit() {
            CharClass::Digit
        } else {
            CharClass::Other
        }
    }
}

/// An entry on the decoder's working stack.
#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    Name(String),
    Class(String),
    Null,
    String(String),
    CollectionStart,
    CollectionEnd,
    Link(RecordLink),
    /// Any value produced by the number state: numbers, timestamps, dates
    Number(Value),
    MapStart,
    MapEnd,
    Boolean(bool),
    Key(String),
    Embedded(Record),
    Buffer(BinaryBuffer),
    /// A collection or map already folded by reduction, awaiting its owner
    Composite(Value),
}

impl Token {
    /// Whether this token is a finished value that reduction can assign.
    pub fn is_value(&self) -> bool {
        matches!(
            self,
            Token::Null
                | Token::String(_)
                | Token::Link(_)
                | Token::Number(_)
                | Token::Boolean(_)
                | Token::Embedded(_)
                | Token::Buffer(_)
                | Token::Composite(_)
        )
    }

    /// Converts a value token into its [`Value`]; `None` for structural tokens.
    pub fn into_value(self) -> Option<Value> {
        Some(match self {
            Token::Null => Value::Null,
            Token::String(s) => Value::String(s),
            Token::Link(link) => Value::Link(link),
            Token::Number(v) | Token::Composite(v) => v,
            Token::Boolean(b) => Value::Bool(b),
            Token::Embedded(rec) => Value::Embedded(rec),
            Token::Buffer(buf) => Value::Buffer(buf),
            _ => return None,
        })
    }
}

/// An open collection or map, recorded with the offset of its opening
/// character.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Container {
    Collection(usize),
    Map(usize),
}

impl Container {
    pub const fn offset(self) -> usize {
        match self {
            Container::Collection(offset) | Container::Map(offset) => offset,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Container::Collection(_) => "collection",
            Container::Map(_) => "map",
        }
    }
}
