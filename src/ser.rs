//! Record encoding.
//!
//! This module provides the [`Encoder`], which writes a [`Record`] in field
//! insertion order, and the [`ValueSerializer`], which turns any
//! `T: Serialize` into a [`Value`].
//!
//! ## Value Forms
//!
//! | Value | Written as |
//! |-------|------------|
//! | null | nothing |
//! | `Int` / `Long` | `29` / `29l` |
//! | `Float` / `Double` | `3.5f` / `3.5d` |
//! | timestamp / date | `1700000000t` / `1699999200000a` |
//! | string | `"..."`, with `"` and `\` escaped |
//! | collection / map | `[..]` / `{"key":..}` |
//! | embedded record | `(..)` |
//! | link / buffer | `#12:345` / `_payload_` |
//!
//! ## Usage
//!
//! ```rust
//! use serde_orient::{CodecOptions, Encoder, Record, RecordLink};
//!
//! let rec = Record::with_class("Person")
//!     .with_field("name", "John")
//!     .with_field("tags", vec!["a".into(), "b".into()])
//!     .with_field("friend", RecordLink::new(12, 345));
//!
//! let mut encoder = Encoder::new(CodecOptions::default());
//! encoder.encode_record(&rec).unwrap();
//! assert_eq!(
//!     encoder.into_inner(),
//!     r##"Person@name:"John",tags:["a","b"],friend:#12:345"##
//! );
//! ```

use crate::value::collection_template;
use crate::{
    BinaryBuffer, CodecOptions, Error, Number, Record, Result, Value, ValueMap,
};
use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeZone};
use serde::{ser, Serialize};

/// Characters that would end or restructure a field or class name.
const NAME_DELIMITERS: &[char] = &[':', '@', ',', '"', '(', ')', '[', ']', '{', '}'];

/// The record encoder.
///
/// Output accumulates in an internal buffer; call [`Encoder::into_inner`] to
/// take it.
pub struct Encoder {
    output: String,
    options: CodecOptions,
}

impl Encoder {
    pub fn new(options: CodecOptions) -> Self {
        Encoder {
            output: String::with_capacity(128),
            options,
        }
    }

    pub fn into_inner(self) -> String {
        self.output
    }

    /// Writes `Class@` (if any) and every field as `name:value`.
    ///
    /// # Errors
    ///
    /// Fails on names containing structural characters, non-finite floats and
    /// commingled collections.
    pub fn encode_record(&mut self, record: &Record) -> Result<()> {
        if let Some(class) = record.class_name() {
            write_name(&mut self.output, class)?;
            self.output.push('@');
        }
        for (i, (name, value)) in record.iter().enumerate() {
            if i > 0 {
                self.output.push(',');
            }
            write_name(&mut self.output, name)?;
            self.output.push(':');
            self.write_value(value)?;
        }
        Ok(())
    }

    /// Writes a single value in its field-value form.
    pub fn write_value(&mut self, value: &Value) -> Result<()> {
        match value {
            Value::Null => {}
            Value::Bool(b) => self.output.push_str(if *b { "true" } else { "false" }),
            Value::Number(n) => self.write_number(n)?,
            Value::String(s) => self.write_string(s),
            Value::DateTime(dt) => self.write_datetime(dt),
            Value::Date(d) => self.write_date(d),
            Value::Collection(items) => self.write_collection(items)?,
            Value::Map(map) => self.write_map(map)?,
            Value::Embedded(rec) => {
                self.output.push('(');
                self.encode_record(rec)?;
                self.output.push(')');
            }
            Value::Link(link) => self.output.push_str(link.hash()),
            Value::Buffer(buf) => self.write_buffer(buf)?,
        }
        Ok(())
    }

    fn write_number(&mut self, n: &Number) -> Result<()> {
        let finite = match *n {
            Number::Float(f) => f.is_finite(),
            Number::Double(d) => d.is_finite(),
            Number::Int(_) | Number::Long(_) => true,
        };
        if !finite {
            return Err(Error::unsupported_type(&format!("non-finite number {}", n)));
        }
        self.output.push_str(&n.to_string());
        self.output.extend(n.suffix());
        Ok(())
    }

    #[inline]
    fn write_string(&mut self, s: &str) {
        self.output.push('"');
        if self.options.escape_strings {
            for ch in s.chars() {
                if ch == '"' || ch == '\\' {
                    self.output.push('\\');
                }
                self.output.push(ch);
            }
        } else {
            self.output.push_str(s);
        }
        self.output.push('"');
    }

    fn write_datetime(&mut self, dt: &DateTime<Local>) {
        self.output.push_str(&dt.timestamp().to_string());
        self.output.push('t');
    }

    fn write_date(&mut self, date: &NaiveDate) {
        let midnight = date.and_time(NaiveTime::MIN);
        let millis = Local
            .from_local_datetime(&midnight)
            .earliest()
            .map_or_else(|| midnight.and_utc().timestamp_millis(), |dt| dt.timestamp_millis());
        self.output.push_str(&millis.to_string());
        self.output.push('a');
    }

    fn write_collection(&mut self, items: &[Value]) -> Result<()> {
        // `[]` already means empty
        if let [Value::Null] = items {
            return Err(Error::unsupported_type(
                "collection holding a single null element",
            ));
        }
        let template = collection_template(items);
        self.output.push('[');
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.output.push(',');
            }
            match template {
                Some(template) => {
                    let item = item.coerce_to(template)?;
                    self.write_value(&item)?;
                }
                None => self.write_value(item)?,
            }
        }
        self.output.push(']');
        Ok(())
    }

    fn write_map(&mut self, map: &ValueMap) -> Result<()> {
        self.output.push('{');
        for (i, (key, value)) in map.iter().enumerate() {
            if i > 0 {
                self.output.push(',');
            }
            self.write_string(key);
            self.output.push(':');
            self.write_value(value)?;
        }
        self.output.push('}');
        Ok(())
    }

    fn write_buffer(&mut self, buf: &BinaryBuffer) -> Result<()> {
        if self.options.delimit_buffers {
            if buf.raw().contains('_') {
                return Err(Error::unsupported_type(&format!(
                    "buffer payload `{}` contains the `_` delimiter",
                    buf.raw()
                )));
            }
            self.output.push('_');
            self.output.push_str(buf.raw());
            self.output.push('_');
        } else {
            self.output.push_str(buf.raw());
        }
        Ok(())
    }
}

fn write_name(output: &mut String, name: &str) -> Result<()> {
    if name.is_empty() || name.contains(NAME_DELIMITERS) {
        return Err(Error::invalid_name(name));
    }
    output.push_str(name);
    Ok(())
}

/// Serializes any `T: Serialize` into a [`Value`].
///
/// Structs become embedded records tagged with the struct name; unit
/// variants become strings, other variants single-entry maps.
///
/// # Examples
///
/// ```rust
/// use serde::Serialize;
/// use serde_orient::{Number, Value, ValueSerializer};
///
/// #[derive(Serialize)]
/// struct Point { x: i32, y: i64 }
///
/// let value = Point { x: 1, y: 2 }.serialize(ValueSerializer).unwrap();
/// let rec = value.as_record().unwrap();
/// assert_eq!(rec.class_name(), Some("Point"));
/// assert_eq!(rec.get("y"), Some(&Value::Number(Number::Long(2))));
/// ```
pub struct ValueSerializer;

pub struct SerializeVec {
    vec: Vec<Value>,
    variant: Option<&'static str>,
}

pub struct SerializeMap {
    map: ValueMap,
    current_key: Option<String>,
}

pub struct SerializeRecord {
    class_name: Option<&'static str>,
    fields: ValueMap,
    variant: Option<&'static str>,
}

impl ser::Serializer for ValueSerializer {
    type Ok = Value;
    type Error = Error;

    type SerializeSeq = SerializeVec;
    type SerializeTuple = SerializeVec;
    type SerializeTupleStruct = SerializeVec;
    type SerializeTupleVariant = SerializeVec;
    type SerializeMap = SerializeMap;
    type SerializeStruct = SerializeRecord;
    type SerializeStructVariant = SerializeRecord;

    fn serialize_bool(self, v: bool) -> Result<Value> {
        Ok(Value::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_i16(self, v: i16) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_i32(self, v: i32) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_i64(self, v: i64) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_u8(self, v: u8) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_u16(self, v: u16) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_u32(self, v: u32) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_u64(self, v: u64) -> Result<Value> {
        i64::try_from(v)
            .map(|l| Value::Number(Number::Long(l)))
            .map_err(|_| Error::unsupported_type(&format!("u64 {} exceeds the long range", v)))
    }

    fn serialize_f32(self, v: f32) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_f64(self, v: f64) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_char(self, v: char) -> Result<Value> {
        Ok(Value::String(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<Value> {
        Ok(Value::String(v.to_string()))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Value> {
        std::str::from_utf8(v)
            .map(|raw| Value::Buffer(BinaryBuffer::new(raw)))
            .map_err(|_| Error::unsupported_type("binary payload that is not valid UTF-8 text"))
    }

    fn serialize_none(self) -> Result<Value> {
        Ok(Value::Null)
    }

    fn serialize_some<T>(self, value: &T) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Value> {
        Ok(Value::Null)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Value> {
        Ok(Value::Null)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Value> {
        Ok(Value::String(variant.to_string()))
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        Ok(single_entry(variant, to_value(value)?))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SerializeVec> {
        Ok(SerializeVec::new(len.unwrap_or(0), None))
    }

    fn serialize_tuple(self, len: usize) -> Result<SerializeVec> {
        Ok(SerializeVec::new(len, None))
    }

    fn serialize_tuple_struct(self, _name: &'static str, len: usize) -> Result<SerializeVec> {
        Ok(SerializeVec::new(len, None))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SerializeVec> {
        Ok(SerializeVec::new(len, Some(variant)))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<SerializeMap> {
        Ok(SerializeMap {
            map: ValueMap::new(),
            current_key: None,
        })
    }

    fn serialize_struct(self, name: &'static str, len: usize) -> Result<SerializeRecord> {
        Ok(SerializeRecord::new(Some(name), len, None))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SerializeRecord> {
        Ok(SerializeRecord::new(None, len, Some(variant)))
    }
}

fn single_entry(key: &str, value: Value) -> Value {
    let mut map = ValueMap::with_capacity(1);
    map.insert(key.to_string(), value);
    Value::Map(map)
}

impl SerializeVec {
    fn new(len: usize, variant: Option<&'static str>) -> Self {
        SerializeVec {
            vec: Vec::with_capacity(len),
            variant,
        }
    }

    fn finish(self) -> Value {
        let items = Value::Collection(self.vec);
        match self.variant {
            Some(variant) => single_entry(variant, items),
            None => items,
        }
    }
}

impl SerializeRecord {
    fn new(class_name: Option<&'static str>, len: usize, variant: Option<&'static str>) -> Self {
        SerializeRecord {
            class_name,
            fields: ValueMap::with_capacity(len),
            variant,
        }
    }

    fn finish(self) -> Value {
        let rec = Record::from_parts(self.class_name.map(str::to_string), self.fields);
        match self.variant {
            Some(variant) => single_entry(variant, Value::Embedded(rec)),
            None => Value::Embedded(rec),
        }
    }
}

impl ser::SerializeSeq for SerializeVec {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.vec.push(to_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}

impl ser::SerializeTuple for SerializeVec {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.vec.push(to_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}

impl ser::SerializeTupleStruct for SerializeVec {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.vec.push(to_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}

impl ser::SerializeTupleVariant for SerializeVec {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.vec.push(to_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}

impl ser::SerializeMap for SerializeMap {
    type Ok = Value;
    type Error = Error;

    fn serialize_key<T>(&mut self, key: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let key = match to_value(key)? {
            Value::String(s) => s,
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            other => {
                return Err(Error::unsupported_type(&format!(
                    "{} as a map key",
                    other.kind()
                )))
            }
        };
        self.current_key = Some(key);
        Ok(())
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let key = self
            .current_key
            .take()
            .ok_or_else(|| Error::custom("serialize_value called without serialize_key"))?;
        self.map.insert(key, to_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(Value::Map(self.map))
    }
}

impl ser::SerializeStruct for SerializeRecord {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.fields.insert(key.to_string(), to_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}

impl ser::SerializeStructVariant for SerializeRecord {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.fields.insert(key.to_string(), to_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}

/// Converts any `T: Serialize` into a [`Value`].
pub fn to_value<T: Serialize + ?Sized>(value: &T) -> Result<Value> {
    value.serialize(ValueSerializer)
}
