//! Dynamic value representation for record fields.
//!
//! This module provides the [`Value`] enum, the closed set of typed values a
//! record field can hold, and [`Number`], which keeps the width/precision tag
//! carried by the textual type suffix.
//!
//! ## Core Types
//!
//! - [`Value`]: null, string, boolean, number, timestamp, date, collection,
//!   map, embedded record, record link, binary buffer
//! - [`Number`]: `Int` (no suffix, `b`, `s`), `Long` (`l`), `Float` (`f`),
//!   `Double` (`d`)
//! - [`ValueKind`]: the variant tag, used for coercion and error messages
//!
//! ## Homogeneous Collections
//!
//! Collection elements share the type of the first non-null element. Numbers
//! convert between widths where the conversion is lossless for integers; any
//! other mismatch is a type commingling error.
//!
//! ```rust
//! use serde_orient::{Number, Value};
//!
//! let template = Value::Number(Number::Long(0));
//! let coerced = Value::from(7).coerce_to(&template).unwrap().into_owned();
//! assert_eq!(coerced, Value::Number(Number::Long(7)));
//!
//! assert!(Value::from("x").coerce_to(&template).is_err());
//! ```

use crate::{BinaryBuffer, Error, Record, RecordLink, Result, ValueMap};
use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Cow;
use std::fmt;

/// A dynamically-typed record field value.
///
/// # Examples
///
/// ```rust
/// use serde_orient::{Number, Value};
///
/// let null = Value::Null;
/// let num = Value::Number(Number::Int(42));
/// let text = Value::String("hello".to_string());
///
/// assert!(null.is_null());
/// assert!(num.is_number());
/// assert!(text.is_string());
/// ```
#[derive(Clone, Debug, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    /// Timestamp, written as epoch seconds with a `t` suffix.
    DateTime(DateTime<Local>),
    /// Calendar date, written as epoch milliseconds with an `a` suffix.
    Date(NaiveDate),
    Collection(Vec<Value>),
    Map(ValueMap),
    Embedded(Record),
    Link(RecordLink),
    Buffer(BinaryBuffer),
}

/// A numeric value tagged with its wire width.
///
/// # Examples
///
/// ```rust
/// use serde_orient::Number;
///
/// assert_eq!(Number::Int(42).as_i64(), Some(42));
/// assert_eq!(Number::Double(42.0).as_i64(), Some(42));
/// assert_eq!(Number::Float(3.5).as_f64(), 3.5);
/// assert_eq!(Number::Long(7).suffix(), Some('l'));
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Number {
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
}

impl Number {
    #[inline]
    #[must_use]
    pub const fn is_integer(&self) -> bool {
        matches!(self, Number::Int(_) | Number::Long(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_float(&self) -> bool {
        matches!(self, Number::Float(_) | Number::Double(_))
    }

    /// The type suffix written after the digits, if any.
    #[must_use]
    pub const fn suffix(&self) -> Option<char> {
        match self {
            Number::Int(_) => None,
            Number::Long(_) => Some('l'),
            Number::Float(_) => Some('f'),
            Number::Double(_) => Some('d'),
        }
    }

    /// Converts this number to an `i64` if it is integral and in range.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Number::Int(i) => Some(i64::from(i)),
            Number::Long(l) => Some(l),
            Number::Float(f) => float_to_i64(f64::from(f)),
            Number::Double(d) => float_to_i64(d),
        }
    }

    #[must_use]
    pub fn as_f64(&self) -> f64 {
        match *self {
            Number::Int(i) => f64::from(i),
            Number::Long(l) => l as f64,
            Number::Float(f) => f64::from(f),
            Number::Double(d) => d,
        }
    }

    /// Converts to the width of `template`, or `None` when that would lose
    /// an integer's value.
    #[must_use]
    pub fn coerce_to(&self, template: &Number) -> Option<Number> {
        match template {
            Number::Int(_) => self
                .as_i64()
                .and_then(|i| i32::try_from(i).ok())
                .map(Number::Int),
            Number::Long(_) => self.as_i64().map(Number::Long),
            Number::Float(_) => Some(Number::Float(self.as_f64() as f32)),
            Number::Double(_) => Some(Number::Double(self.as_f64())),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> ValueKind {
        match self {
            Number::Int(_) => ValueKind::Integer,
            Number::Long(_) => ValueKind::Long,
            Number::Float(_) => ValueKind::Float,
            Number::Double(_) => ValueKind::Double,
        }
    }
}

fn float_to_i64(f: f64) -> Option<i64> {
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(i) => write!(f, "{}", i),
            Number::Long(l) => write!(f, "{}", l),
            Number::Float(fl) => write!(f, "{}", fl),
            Number::Double(d) => write!(f, "{}", d),
        }
    }
}

/// The variant tag of a [`Value`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Boolean,
    Integer,
    Long,
    Float,
    Double,
    String,
    DateTime,
    Date,
    Collection,
    Map,
    Embedded,
    Link,
    Buffer,
}

impl ValueKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Null => "null",
            ValueKind::Boolean => "boolean",
            ValueKind::Integer => "integer",
            ValueKind::Long => "long",
            ValueKind::Float => "float",
            ValueKind::Double => "double",
            ValueKind::String => "string",
            ValueKind::DateTime => "datetime",
            ValueKind::Date => "date",
            ValueKind::Collection => "collection",
            ValueKind::Map => "map",
            ValueKind::Embedded => "embedded record",
            ValueKind::Link => "link",
            ValueKind::Buffer => "binary buffer",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Value {
    #[must_use]
    pub const fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Boolean,
            Value::Number(n) => n.kind(),
            Value::String(_) => ValueKind::String,
            Value::DateTime(_) => ValueKind::DateTime,
            Value::Date(_) => ValueKind::Date,
            Value::Collection(_) => ValueKind::Collection,
            Value::Map(_) => ValueKind::Map,
            Value::Embedded(_) => ValueKind::Embedded,
            Value::Link(_) => ValueKind::Link,
            Value::Buffer(_) => ValueKind::Buffer,
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    #[inline]
    #[must_use]
    pub const fn is_bool(&self) -> bool {
        matches!(self, Value::Bool(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_number(&self) -> bool {
        matches!(self, Value::Number(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_collection(&self) -> bool {
        matches!(self, Value::Collection(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_map(&self) -> bool {
        matches!(self, Value::Map(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_embedded(&self) -> bool {
        matches!(self, Value::Embedded(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_link(&self) -> bool {
        matches!(self, Value::Link(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_buffer(&self) -> bool {
        matches!(self, Value::Buffer(_))
    }

    /// If the value is a boolean, returns it. Otherwise returns `None`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_orient::Value;
    ///
    /// assert_eq!(Value::Bool(true).as_bool(), Some(true));
    /// assert_eq!(Value::from(42).as_bool(), None);
    /// ```
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_number(&self) -> Option<&Number> {
        match self {
            Value::Number(n) => Some(n),
            _ => None,
        }
    }

    /// If the value is an integral number of any width, returns it as `i64`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_orient::{Number, Value};
    ///
    /// assert_eq!(Value::Number(Number::Long(42)).as_i64(), Some(42));
    /// assert_eq!(Value::Number(Number::Double(42.5)).as_i64(), None);
    /// ```
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        self.as_number().and_then(Number::as_i64)
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        self.as_number().map(Number::as_f64)
    }

    #[must_use]
    pub fn as_datetime(&self) -> Option<&DateTime<Local>> {
        match self {
            Value::DateTime(dt) => Some(dt),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_date(&self) -> Option<&NaiveDate> {
        match self {
            Value::Date(d) => Some(d),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_collection(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Collection(items) => Some(items),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_map(&self) -> Option<&ValueMap> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Embedded(rec) => Some(rec),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_link(&self) -> Option<&RecordLink> {
        match self {
            Value::Link(link) => Some(link),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_buffer(&self) -> Option<&BinaryBuffer> {
        match self {
            Value::Buffer(buf) => Some(buf),
            _ => None,
        }
    }

    /// Coerces this value to the type of `template`.
    ///
    /// Null coerces to anything, and anything coerces to a null template.
    /// Returns the value borrowed when no conversion was needed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeCommingling`] when the kinds differ and no numeric
    /// conversion applies.
    pub fn coerce_to(&self, template: &Value) -> Result<Cow<'_, Value>> {
        match (self, template) {
            (Value::Null, _) | (_, Value::Null) => Ok(Cow::Borrowed(self)),
            (Value::Number(n), Value::Number(t)) => {
                if n.kind() == t.kind() {
                    return Ok(Cow::Borrowed(self));
                }
                n.coerce_to(t)
                    .map(|n| Cow::Owned(Value::Number(n)))
                    .ok_or_else(|| Error::type_commingling(t.kind(), n.kind()))
            }
            _ if self.kind() == template.kind() => Ok(Cow::Borrowed(self)),
            _ => Err(Error::type_commingling(template.kind(), self.kind())),
        }
    }

    /// Owned variant of [`Value::coerce_to`].
    pub fn coerce_into(self, template: &Value) -> Result<Value> {
        let converted = match self.coerce_to(template)? {
            Cow::Borrowed(_) => None,
            Cow::Owned(v) => Some(v),
        };
        Ok(converted.unwrap_or(self))
    }
}

/// The element every other collection element is coerced to.
pub(crate) fn collection_template(items: &[Value]) -> Option<&Value> {
    items.iter().find(|v| !v.is_null())
}

/// Applies the homogeneous-collection policy to decoded elements.
pub(crate) fn homogenize(items: Vec<Value>) -> Result<Vec<Value>> {
    let Some(template) = collection_template(&items).cloned() else {
        return Ok(items);
    };
    items
        .into_iter()
        .map(|item| item.coerce_into(&template))
        .collect()
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(Number::Int(i)) => serializer.serialize_i32(*i),
            Value::Number(Number::Long(l)) => serializer.serialize_i64(*l),
            Value::Number(Number::Float(f)) => serializer.serialize_f32(*f),
            Value::Number(Number::Double(d)) => serializer.serialize_f64(*d),
            Value::String(s) => serializer.serialize_str(s),
            Value::DateTime(dt) => serializer.serialize_str(&dt.to_rfc3339()),
            Value::Date(d) => serializer.serialize_str(&d.to_string()),
            Value::Collection(items) => {
                use serde::ser::SerializeSeq;
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for element in items {
                    seq.serialize_element(element)?;
                }
                seq.end()
            }
            Value::Map(map) => {
                use serde::ser::SerializeMap;
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map.iter() {
                    out.serialize_entry(k, v)?;
                }
                out.end()
            }
            Value::Embedded(rec) => rec.serialize(serializer),
            Value::Link(link) => serializer.serialize_str(link.hash()),
            Value::Buffer(buf) => serializer.serialize_str(buf.raw()),
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{self, Visitor};

        struct ValueVisitor;

        impl<'de> Visitor<'de> for ValueVisitor {
            type Value = Value;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("any record field value")
            }

            fn visit_bool<E>(self, value: bool) -> std::result::Result<Value, E> {
                Ok(Value::Bool(value))
            }

            fn visit_i32<E>(self, value: i32) -> std::result::Result<Value, E> {
                Ok(Value::Number(Number::Int(value)))
            }

            fn visit_i64<E>(self, value: i64) -> std::result::Result<Value, E> {
                Ok(match i32::try_from(value) {
                    Ok(i) => Value::Number(Number::Int(i)),
                    Err(_) => Value::Number(Number::Long(value)),
                })
            }

            fn visit_u64<E>(self, value: u64) -> std::result::Result<Value, E>
            where
                E: de::Error,
            {
                match i64::try_from(value) {
                    Ok(l) => self.visit_i64(l),
                    Err(_) => Ok(Value::Number(Number::Double(value as f64))),
                }
            }

            fn visit_f32<E>(self, value: f32) -> std::result::Result<Value, E> {
                Ok(Value::Number(Number::Float(value)))
            }

            fn visit_f64<E>(self, value: f64) -> std::result::Result<Value, E> {
                Ok(Value::Number(Number::Double(value)))
            }

            fn visit_str<E>(self, value: &str) -> std::result::Result<Value, E> {
                Ok(Value::String(value.to_string()))
            }

            fn visit_string<E>(self, value: String) -> std::result::Result<Value, E> {
                Ok(Value::String(value))
            }

            fn visit_unit<E>(self) -> std::result::Result<Value, E> {
                Ok(Value::Null)
            }

            fn visit_none<E>(self) -> std::result::Result<Value, E> {
                Ok(Value::Null)
            }

            fn visit_some<D>(self, deserializer: D) -> std::result::Result<Value, D::Error>
            where
                D: Deserializer<'de>,
            {
                Deserialize::deserialize(deserializer)
            }

            fn visit_seq<A>(self, mut seq: A) -> std::result::Result<Value, A::Error>
            where
                A: de::SeqAccess<'de>,
            {
                let mut items = Vec::new();
                while let Some(elem) = seq.next_element()? {
                    items.push(elem);
                }
                Ok(Value::Collection(items))
            }

            fn visit_map<A>(self, mut map: A) -> std::result::Result<Value, A::Error>
            where
                A: de::MapAccess<'de>,
            {
                let mut values = ValueMap::new();
                while let Some((key, value)) = map.next_entry()? {
                    values.insert(key, value);
                }
                Ok(Value::Map(values))
            }
        }

        deserializer.deserialize_any(ValueVisitor)
    }
}

impl TryFrom<Value> for i64 {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        value
            .as_i64()
            .ok_or_else(|| Error::custom(format!("expected integer, found {:?}", value)))
    }
}

impl TryFrom<Value> for f64 {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        value
            .as_f64()
            .ok_or_else(|| Error::custom(format!("expected number, found {:?}", value)))
    }
}

impl TryFrom<Value> for bool {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Bool(b) => Ok(b),
            _ => Err(Error::custom(format!("expected bool, found {:?}", value))),
        }
    }
}

impl TryFrom<Value> for String {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::String(s) => Ok(s),
            _ => Err(Error::custom(format!("expected string, found {:?}", value))),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i8> for Value {
    fn from(value: i8) -> Self {
        Value::Number(Number::Int(i32::from(value)))
    }
}

impl From<i16> for Value {
    fn from(value: i16) -> Self {
        Value::Number(Number::Int(i32::from(value)))
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Number(Number::Int(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(Number::Long(value))
    }
}

impl From<u8> for Value {
    fn from(value: u8) -> Self {
        Value::Number(Number::Int(i32::from(value)))
    }
}

impl From<u16> for Value {
    fn from(value: u16) -> Self {
        Value::Number(Number::Int(i32::from(value)))
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Number(Number::Long(i64::from(value)))
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Number(Number::Float(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(Number::Double(value))
    }
}

impl From<Number> for Value {
    fn from(value: Number) -> Self {
        Value::Number(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<DateTime<Local>> for Value {
    fn from(value: DateTime<Local>) -> Self {
        Value::DateTime(value)
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Value::Date(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::Collection(value)
    }
}

impl From<ValueMap> for Value {
    fn from(value: ValueMap) -> Self {
        Value::Map(value)
    }
}

impl From<Record> for Value {
    fn from(value: Record) -> Self {
        Value::Embedded(value)
    }
}

impl From<RecordLink> for Value {
    fn from(value: RecordLink) -> Self {
        Value::Link(value)
    }
}

impl From<BinaryBuffer> for Value {
    fn from(value: BinaryBuffer) -> Self {
        Value::Buffer(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_coercion_widens() {
        let long = Value::Number(Number::Long(0));
        assert_eq!(
            Value::from(5).coerce_into(&long).unwrap(),
            Value::Number(Number::Long(5))
        );

        let double = Value::Number(Number::Double(0.0));
        assert_eq!(
            Value::from(5).coerce_into(&double).unwrap(),
            Value::Number(Number::Double(5.0))
        );
    }

    #[test]
    fn test_number_coercion_rejects_lossy_integers() {
        let int = Value::Number(Number::Int(0));
        assert!(Value::Number(Number::Long(i64::MAX)).coerce_to(&int).is_err());
        assert!(Value::Number(Number::Double(2.5)).coerce_to(&int).is_err());
        assert_eq!(
            Value::Number(Number::Double(2.0)).coerce_into(&int).unwrap(),
            Value::Number(Number::Int(2))
        );
    }

    #[test]
    fn test_kind_mismatch_is_commingling() {
        let err = Value::from("a").coerce_to(&Value::from(1)).unwrap_err();
        assert_eq!(
            err,
            Error::type_commingling(ValueKind::Integer, ValueKind::String)
        );
    }

    #[test]
    fn test_null_is_always_accepted() {
        assert!(Value::Null.coerce_to(&Value::from("a")).is_ok());
        assert!(Value::from("a").coerce_to(&Value::Null).is_ok());
    }

    #[test]
    fn test_homogenize_uses_first_non_null() {
        let items = vec![Value::Null, Value::from(1i64), Value::from(2)];
        let out = homogenize(items).unwrap();
        assert_eq!(
            out,
            vec![
                Value::Null,
                Value::Number(Number::Long(1)),
                Value::Number(Number::Long(2)),
            ]
        );
    }

    #[test]
    fn test_tryfrom() {
        assert_eq!(i64::try_from(Value::from(42)).unwrap(), 42);
        assert_eq!(f64::try_from(Value::from(1.5f32)).unwrap(), 1.5);
        assert!(bool::try_from(Value::from(1)).is_err());
        assert_eq!(String::try_from(Value::from("x")).unwrap(), "x");
    }

    #[test]
    fn test_from_option() {
        assert_eq!(Value::from(None::<i32>), Value::Null);
        assert_eq!(Value::from(Some("a")), Value::from("a"));
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(Value::from(1i64).kind().to_string(), "long");
        assert_eq!(
            Value::Embedded(Record::new()).kind().to_string(),
            "embedded record"
        );
    }
}
