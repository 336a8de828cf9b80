//! Error types for record encoding and decoding.
//!
//! Every failure is raised synchronously from the call that hit it; a failed
//! decode never hands back a half-populated [`Record`](crate::Record).
//!
//! ## Error Categories
//!
//! - **Grammar errors**: malformed booleans, numbers, links and names, stray
//!   structural characters ([`Error::Syntax`])
//! - **Truncation**: input exhausted while a string, collection, map, buffer or
//!   embedded record awaits its terminator
//! - **Type commingling**: a collection element cannot be coerced to the type
//!   established by the first element
//! - **Limits**: nesting deeper than [`CodecOptions::max_depth`](crate::CodecOptions)
//!
//! Offsets are byte offsets into the buffer handed to the decoder.
//!
//! ## Examples
//!
//! ```rust
//! use serde_orient::{decode, Error};
//!
//! let err = decode("tags:[1,\"a\"]").unwrap_err();
//! assert!(matches!(err, Error::TypeCommingling { .. }));
//! ```

use crate::value::ValueKind;
use std::fmt;
use thiserror::Error;

/// Represents all possible errors raised while encoding or decoding records.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// IO error during reading or writing
    #[error("IO error: {0}")]
    Io(String),

    /// Value-position text matches neither `true` nor `false`
    #[error("malformed boolean literal `{literal}` at offset {offset}")]
    MalformedBoolean { offset: usize, literal: String },

    /// Input ended while a composite awaited its terminator
    #[error("unterminated {composite} opened at offset {offset}")]
    UnterminatedComposite {
        offset: usize,
        composite: &'static str,
    },

    /// A collection element does not share the type of the first element
    #[error("wrong type commingling in collection: expected {expected}, found {found}")]
    TypeCommingling { expected: ValueKind, found: ValueKind },

    /// Value that has no textual representation
    #[error("unsupported value type: {0}")]
    UnsupportedType(String),

    #[error("invalid number literal `{literal}` at offset {offset}")]
    InvalidNumber { offset: usize, literal: String },

    #[error("invalid record link `{0}`")]
    InvalidLink(String),

    /// Field or class name that cannot be written without breaking the grammar
    #[error("invalid name `{0}`: names may not contain structural characters")]
    InvalidName(String),

    #[error("nesting depth exceeds the limit of {limit}")]
    DepthLimitExceeded { limit: usize },

    #[error("syntax error at offset {offset}: {msg}")]
    Syntax { offset: usize, msg: String },

    /// Custom error
    #[error("Error: {0}")]
    Custom(String),
}

impl Error {
    /// Creates a syntax error at the given byte offset.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_orient::Error;
    ///
    /// let err = Error::syntax(10, "unexpected ')'");
    /// assert!(err.to_string().contains("offset 10"));
    /// ```
    pub fn syntax(offset: usize, msg: &str) -> Self {
        Error::Syntax {
            offset,
            msg: msg.to_string(),
        }
    }

    pub fn malformed_boolean(offset: usize, literal: &str) -> Self {
        Error::MalformedBoolean {
            offset,
            literal: literal.to_string(),
        }
    }

    /// Creates an error for a composite (`"string"`, `"collection"`, ...) whose
    /// terminator never arrived.
    pub fn unterminated(offset: usize, composite: &'static str) -> Self {
        Error::UnterminatedComposite { offset, composite }
    }

    /// Creates a type commingling error.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_orient::{Error, ValueKind};
    ///
    /// let err = Error::type_commingling(ValueKind::Integer, ValueKind::String);
    /// assert!(err.to_string().contains("expected integer, found string"));
    /// ```
    pub fn type_commingling(expected: ValueKind, found: ValueKind) -> Self {
        Error::TypeCommingling { expected, found }
    }

    pub fn invalid_number(offset: usize, literal: &str) -> Self {
        Error::InvalidNumber {
            offset,
            literal: literal.to_string(),
        }
    }

    pub fn invalid_link(text: &str) -> Self {
        Error::InvalidLink(text.to_string())
    }

    pub fn invalid_name(name: &str) -> Self {
        Error::InvalidName(name.to_string())
    }

    /// Creates an unsupported type error for values that cannot be encoded.
    pub fn unsupported_type(msg: &str) -> Self {
        Error::UnsupportedType(msg.to_string())
    }

    /// Creates a custom error with a display message.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_orient::Error;
    ///
    /// let err = Error::custom("something went wrong");
    /// assert!(err.to_string().contains("something went wrong"));
    /// ```
    pub fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }

    /// Creates an I/O error for reader/writer failures.
    pub fn io(msg: &str) -> Self {
        Error::Io(msg.to_string())
    }
}

impl serde::ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

impl serde::de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
