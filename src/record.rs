//! Records and the out-of-band tokens that appear inside them.
//!
//! - [`Record`]: an optional class name plus an insertion-ordered field map
//! - [`RecordLink`]: a `#cluster:position` reference, never dereferenced here
//! - [`BinaryBuffer`]: an opaque payload written between `_` markers
//!
//! ## Examples
//!
//! ```rust
//! use serde_orient::{Record, RecordLink, Value};
//!
//! let rec = Record::with_class("Person")
//!     .with_field("name", "John")
//!     .with_field("age", 29)
//!     .with_field("friend", RecordLink::new(12, 345));
//!
//! assert_eq!(rec.class_name(), Some("Person"));
//! assert_eq!(rec.get("age"), Some(&Value::from(29)));
//! assert_eq!(
//!     serde_orient::encode(&rec).unwrap(),
//!     r##"Person@name:"John",age:29,friend:#12:345"##
//! );
//! ```

use crate::{Error, Result, Value, ValueMap};
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A named, typed field mapping with an optional schema class name.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Record {
    class_name: Option<String>,
    fields: ValueMap,
}

impl Record {
    /// Creates an empty record without a class name.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty record tagged with `class_name`.
    #[must_use]
    pub fn with_class(class_name: impl Into<String>) -> Self {
        Record {
            class_name: Some(class_name.into()),
            fields: ValueMap::new(),
        }
    }

    /// Builds a record from its parts.
    #[must_use]
    pub fn from_parts(class_name: Option<String>, fields: ValueMap) -> Self {
        Record { class_name, fields }
    }

    /// Adds a field, builder style.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn class_name(&self) -> Option<&str> {
        self.class_name.as_deref()
    }

    pub fn set_class_name(&mut self, class_name: Option<String>) {
        self.class_name = class_name;
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Sets a field, returning the previous value if the name was taken.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(name.into(), value.into())
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.fields.remove(name)
    }

    #[must_use]
    pub fn fields(&self) -> &ValueMap {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut ValueMap {
        &mut self.fields
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates fields in insertion order.
    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Value> {
        self.fields.iter()
    }

    pub fn into_parts(self) -> (Option<String>, ValueMap) {
        (self.class_name, self.fields)
    }
}

impl FromStr for Record {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        crate::decode(s).map(|decoded| decoded.record)
    }
}

impl Serialize for Record {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (k, v) in self.fields.iter() {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// An opaque `#cluster:position` reference to another record.
///
/// The link keeps its textual hash exactly as read; the codec never resolves
/// it.
///
/// # Examples
///
/// ```rust
/// use serde_orient::RecordLink;
///
/// let link: RecordLink = "#12:345".parse().unwrap();
/// assert_eq!(link.cluster(), 12);
/// assert_eq!(link.position(), 345);
/// assert_eq!(link.hash(), "#12:345");
///
/// assert!("12:345".parse::<RecordLink>().is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RecordLink {
    hash: String,
    cluster: i32,
    position: i64,
}

impl RecordLink {
    #[must_use]
    pub fn new(cluster: i32, position: i64) -> Self {
        RecordLink {
            hash: format!("#{}:{}", cluster, position),
            cluster,
            position,
        }
    }

    /// The literal `#cluster:position` text.
    #[must_use]
    pub fn hash(&self) -> &str {
        &self.hash
    }

    #[must_use]
    pub fn cluster(&self) -> i32 {
        self.cluster
    }

    #[must_use]
    pub fn position(&self) -> i64 {
        self.position
    }
}

fn is_link_part(part: &str) -> bool {
    let digits = part.strip_prefix('-').unwrap_or(part);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

impl FromStr for RecordLink {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (cluster, position) = s
            .strip_prefix('#')
            .and_then(|body| body.split_once(':'))
            .filter(|(c, p)| is_link_part(c) && is_link_part(p))
            .ok_or_else(|| Error::invalid_link(s))?;

        Ok(RecordLink {
            hash: s.to_string(),
            cluster: cluster.parse().map_err(|_| Error::invalid_link(s))?,
            position: position.parse().map_err(|_| Error::invalid_link(s))?,
        })
    }
}

impl fmt::Display for RecordLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hash)
    }
}

/// An opaque binary payload, carried verbatim.
///
/// The payload is whatever text sat between the `_` markers (usually base64);
/// it is never decoded by this crate.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct BinaryBuffer {
    raw: String,
}

impl BinaryBuffer {
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        BinaryBuffer { raw: raw.into() }
    }

    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.raw.as_bytes()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    pub fn into_raw(self) -> String {
        self.raw
    }
}
