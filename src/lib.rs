//! # serde_orient
//!
//! A codec for the comma-delimited textual record format used by OrientDB's
//! document protocol, with a Serde bridge for typed Rust structs.
//!
//! ## The Format
//!
//! A record is an optional class name followed by `name:value` fields:
//!
//! ```text
//! Person@name:"John",age:29,tags:["a","b"],address:(city:"Rome"),friend:#12:345
//! ```
//!
//! Values carry their type in their shape: quoted strings, `true`/`false`,
//! numbers with an optional width suffix (`b`, `s`, `l`, `f`, `d`, `t` for
//! timestamps, `a` for dates), `[..]` collections, `{"key":..}` maps, `(..)`
//! embedded records, `#cluster:position` links and `_.._` binary buffers. An
//! empty value is null.
//!
//! ## Key Features
//!
//! - **Explicit state machine**: the decoder walks the input one character at
//!   a time through a state-indexed transition table, with a token stack
//!   reduced after every character
//! - **Homogeneous collections**: elements are coerced to the type of the
//!   first element; anything else is a type commingling error
//! - **Bounded nesting**: embedded records, collections and maps count against
//!   [`CodecOptions::max_depth`]
//! - **Serde compatible**: `#[derive(Serialize, Deserialize)]` types map to
//!   records, with the struct name as class name
//!
//! ## Quick Start
//!
//! ```rust
//! use serde_orient::{decode, encode, Value};
//!
//! let decoded = decode("Person@name:\"John\",age:29").unwrap();
//! assert_eq!(decoded.class_name(), Some("Person"));
//! assert_eq!(decoded.fields().get("name"), Some(&Value::from("John")));
//!
//! let text = encode(&decoded.record).unwrap();
//! assert_eq!(text, "Person@name:\"John\",age:29");
//! ```
//!
//! ### Typed Structs
//!
//! ```rust
//! use serde::{Deserialize, Serialize};
//! use serde_orient::{from_str, to_string};
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! struct User {
//!     id: u32,
//!     name: String,
//!     tags: Vec<String>,
//! }
//!
//! let user = User { id: 7, name: "Alice".to_string(), tags: vec!["admin".to_string()] };
//! let text = to_string(&user).unwrap();
//! assert_eq!(text, r#"User@id:7l,name:"Alice",tags:["admin"]"#);
//!
//! let back: User = from_str(&text).unwrap();
//! assert_eq!(user, back);
//! ```
//!
//! ### Dynamic Records
//!
//! ```rust
//! use serde_orient::{record, encode, RecordLink, Value};
//!
//! let mut rec = record!("Order", { "total": 9.5, "items": [1, 2, 3] });
//! rec.insert("customer", RecordLink::new(12, 345));
//!
//! assert_eq!(
//!     encode(&rec).unwrap(),
//!     "Order@total:9.5d,items:[1,2,3],customer:#12:345"
//! );
//! ```
//!
//! ## Logging
//!
//! The crate emits [`tracing`] events (`debug` for completed and failed
//! top-level operations, `trace` for embedded-record descent) and installs no
//! subscriber.

pub mod de;
pub mod error;
pub mod macros;
pub mod map;
pub mod options;
pub mod record;
pub mod ser;
pub mod token;
pub mod value;

pub use de::{Decoded, Decoder, ValueDeserializer};
pub use error::{Error, Result};
pub use map::ValueMap;
pub use options::CodecOptions;
pub use record::{BinaryBuffer, Record, RecordLink};
pub use ser::{Encoder, ValueSerializer};
pub use value::{Number, Value, ValueKind};

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io;
use tracing::debug;

/// Encodes a record with default options.
///
/// # Examples
///
/// ```rust
/// use serde_orient::{encode, Record};
///
/// let rec = Record::new().with_field("flag", true).with_field("n", 12i64);
/// assert_eq!(encode(&rec).unwrap(), "flag:true,n:12l");
/// ```
///
/// # Errors
///
/// Returns an error for names containing structural characters, non-finite
/// floats and commingled collections.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn encode(record: &Record) -> Result<String> {
    encode_with_options(record, CodecOptions::default())
}

/// Encodes a record with custom options.
///
/// # Errors
///
/// Same as [`encode`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn encode_with_options(record: &Record, options: CodecOptions) -> Result<String> {
    let mut encoder = Encoder::new(options);
    encoder.encode_record(record)?;
    let text = encoder.into_inner();
    debug!(
        class = ?record.class_name(),
        fields = record.len(),
        bytes = text.len(),
        "encoded record"
    );
    Ok(text)
}

/// Decodes a top-level record with default options.
///
/// # Examples
///
/// ```rust
/// use serde_orient::{decode, Value};
///
/// let decoded = decode("flag:true,empty:,n:12l,f:3.5f").unwrap();
/// assert_eq!(decoded.fields().get("flag"), Some(&Value::Bool(true)));
/// assert_eq!(decoded.fields().get("empty"), Some(&Value::Null));
/// assert_eq!(decoded.consumed, 29);
/// ```
///
/// # Errors
///
/// Returns an error for malformed literals, unterminated composites,
/// commingled collections and nesting beyond the depth limit.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn decode(input: &str) -> Result<Decoded> {
    decode_with_options(input, CodecOptions::default())
}

/// Decodes a top-level record with custom options.
///
/// # Errors
///
/// Same as [`decode`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn decode_with_options(input: &str, options: CodecOptions) -> Result<Decoded> {
    Decoder::new(input, options).run().map_err(|err| {
        debug!(error = %err, bytes = input.len(), "failed to decode record");
        err
    })
}

/// Decodes an embedded record from a buffer positioned at its `(`.
///
/// `consumed` counts both parentheses.
///
/// # Errors
///
/// Same as [`decode`], plus a syntax error when the buffer does not start
/// with `(`.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn decode_embedded(input: &str) -> Result<Decoded> {
    Decoder::embedded(input, CodecOptions::default()).map_err(|err| {
        debug!(error = %err, bytes = input.len(), "failed to decode embedded record");
        err
    })
}

/// Converts any `T: Serialize` to a [`Value`].
///
/// # Examples
///
/// ```rust
/// use serde_orient::{to_value, Value};
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Point { x: i32, y: i32 }
///
/// let value = to_value(&Point { x: 1, y: 2 }).unwrap();
/// assert!(value.is_embedded());
/// ```
///
/// # Errors
///
/// Returns an error for values with no record representation, such as
/// `u64` above `i64::MAX` or non-UTF-8 byte strings.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_value<T>(value: &T) -> Result<Value>
where
    T: ?Sized + Serialize,
{
    ser::to_value(value)
}

/// Converts any `T: Serialize` that maps to a record (a struct or a
/// string-keyed map) into a [`Record`].
///
/// # Errors
///
/// Returns [`Error::UnsupportedType`] for scalars, sequences and enums.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_record<T>(value: &T) -> Result<Record>
where
    T: ?Sized + Serialize,
{
    match to_value(value)? {
        Value::Embedded(rec) => Ok(rec),
        Value::Map(fields) => Ok(Record::from_parts(None, fields)),
        other => Err(Error::unsupported_type(&format!(
            "{} at the top level; expected a struct or map",
            other.kind()
        ))),
    }
}

/// Serializes any `T: Serialize` to record text.
///
/// # Examples
///
/// ```rust
/// use serde_orient::to_string;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Point { x: i32, y: i32 }
///
/// assert_eq!(to_string(&Point { x: 1, y: 2 }).unwrap(), "Point@x:1,y:2");
/// ```
///
/// # Errors
///
/// Returns an error if the value is not record-shaped or cannot be encoded.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string<T>(value: &T) -> Result<String>
where
    T: ?Sized + Serialize,
{
    to_string_with_options(value, CodecOptions::default())
}

/// Serializes any `T: Serialize` to record text with custom options.
///
/// # Errors
///
/// Same as [`to_string`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string_with_options<T>(value: &T, options: CodecOptions) -> Result<String>
where
    T: ?Sized + Serialize,
{
    encode_with_options(&to_record(value)?, options)
}

/// Serializes any `T: Serialize` to a writer as record text.
///
/// # Examples
///
/// ```rust
/// use serde_orient::to_writer;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Point { x: i32, y: i32 }
///
/// let mut buffer = Vec::new();
/// to_writer(&mut buffer, &Point { x: 1, y: 2 }).unwrap();
/// assert_eq!(buffer, b"Point@x:1,y:2");
/// ```
///
/// # Errors
///
/// Returns an error if serialization fails or writing to the writer fails.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_writer<W, T>(writer: W, value: &T) -> Result<()>
where
    W: io::Write,
    T: ?Sized + Serialize,
{
    to_writer_with_options(writer, value, CodecOptions::default())
}

/// Serializes any `T: Serialize` to a writer with custom options.
///
/// # Errors
///
/// Returns an error if serialization fails or writing to the writer fails.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_writer_with_options<W, T>(mut writer: W, value: &T, options: CodecOptions) -> Result<()>
where
    W: io::Write,
    T: ?Sized + Serialize,
{
    let text = to_string_with_options(value, options)?;
    writer
        .write_all(text.as_bytes())
        .map_err(|e| Error::io(&e.to_string()))?;
    Ok(())
}

/// Deserializes a `T` from a decoded [`Value`].
///
/// # Errors
///
/// Returns an error if the value's shape does not match `T`.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_value<T>(value: Value) -> Result<T>
where
    T: DeserializeOwned,
{
    T::deserialize(ValueDeserializer::new(value))
}

/// Deserializes a `T` from record text.
///
/// The record's fields are presented as a map; the class name is not
/// checked against the type.
///
/// # Examples
///
/// ```rust
/// use serde_orient::from_str;
/// use serde::Deserialize;
///
/// #[derive(Deserialize, PartialEq, Debug)]
/// struct Point { x: i32, y: i32 }
///
/// let point: Point = from_str("Point@x:1,y:2").unwrap();
/// assert_eq!(point, Point { x: 1, y: 2 });
/// ```
///
/// # Errors
///
/// Returns an error if the text does not decode or does not match `T`.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_str<T>(s: &str) -> Result<T>
where
    T: DeserializeOwned,
{
    let decoded = decode(s)?;
    from_value(Value::Embedded(decoded.record))
}

/// Deserializes a `T` from record text held in bytes.
///
/// # Errors
///
/// Returns an error if the bytes are not valid UTF-8, or as [`from_str`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_slice<T>(v: &[u8]) -> Result<T>
where
    T: DeserializeOwned,
{
    let s = std::str::from_utf8(v).map_err(|e| Error::custom(e.to_string()))?;
    from_str(s)
}

/// Deserializes a `T` from an I/O stream of record text.
///
/// # Examples
///
/// ```rust
/// use serde_orient::from_reader;
/// use serde::Deserialize;
/// use std::io::Cursor;
///
/// #[derive(Deserialize, PartialEq, Debug)]
/// struct Point { x: i32, y: i32 }
///
/// let point: Point = from_reader(Cursor::new(b"x:1,y:2")).unwrap();
/// assert_eq!(point, Point { x: 1, y: 2 });
/// ```
///
/// # Errors
///
/// Returns an error if reading fails, or as [`from_str`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_reader<R, T>(mut reader: R) -> Result<T>
where
    R: io::Read,
    T: DeserializeOwned,
{
    let mut string = String::new();
    reader
        .read_to_string(&mut string)
        .map_err(|e| Error::io(&e.to_string()))?;
    from_str(&string)
}
