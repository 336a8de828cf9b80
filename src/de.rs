//! Record decoding.
//!
//! This module provides the [`Decoder`], a character-driven state machine
//! that turns the textual record form into a [`Record`], and the
//! [`ValueDeserializer`] that feeds decoded values into `serde`.
//!
//! ## Overview
//!
//! - **Dispatch table**: every [`State`] owns one transition function,
//!   looked up by index; a transition sees the current character and its
//!   [`CharClass`] and may push tokens
//! - **Token stack**: names, keys and collection/map boundaries live on the
//!   same stack as values; the stack is reduced after every character
//! - **Recursion**: `(` starts a nested decoder over the same buffer; the
//!   parent skips ahead by the number of bytes it consumed
//!
//! ## Usage
//!
//! ```rust
//! use serde_orient::{decode, Value};
//!
//! let decoded = decode("Person@name:\"John\",age:29").unwrap();
//! assert_eq!(decoded.class_name(), Some("Person"));
//! assert_eq!(decoded.fields().get("age"), Some(&Value::from(29)));
//! assert_eq!(decoded.consumed, 25);
//! ```

use crate::token::{CharClass, Container, State, Token};
use crate::value::homogenize;
use crate::{
    BinaryBuffer, CodecOptions, Error, Number, Record, RecordLink, Result, Value, ValueMap,
};
use chrono::{DateTime, Local};
use serde::{de, forward_to_deserialize_any};
use tracing::{debug, trace};

/// Outcome of a decode: the record and the number of bytes consumed.
///
/// For an embedded record `consumed` includes the closing `)`.
#[derive(Clone, Debug, PartialEq)]
pub struct Decoded {
    pub record: Record,
    pub consumed: usize,
}

impl Decoded {
    #[must_use]
    pub fn class_name(&self) -> Option<&str> {
        self.record.class_name()
    }

    #[must_use]
    pub fn fields(&self) -> &ValueMap {
        self.record.fields()
    }

    pub fn into_record(self) -> Record {
        self.record
    }
}

type Transition = fn(&mut Decoder<'_>, char, CharClass) -> Result<()>;

/// Indexed by [`State::index`].
const TRANSITIONS: [Transition; State::COUNT] = [
    in_guess, in_name, in_value, in_string, in_comma, in_link, in_number, in_key, in_boolean,
    in_buffer,
];

/// The record decoder.
///
/// One decoder owns the cursor, buffers and token stack of a single record;
/// embedded records are decoded by nested instances over the same input.
pub struct Decoder<'a> {
    input: &'a str,
    options: CodecOptions,
    start: usize,
    cursor: usize,
    state: State,
    buffer: String,
    token_start: usize,
    stack: Vec<Token>,
    open: Vec<Container>,
    class_name: Option<String>,
    fields: ValueMap,
    escaped: bool,
    quoted: bool,
    key_ready: bool,
    depth: usize,
    embedded: bool,
    closed: bool,
}

impl<'a> Decoder<'a> {
    pub fn new(input: &'a str, options: CodecOptions) -> Self {
        Decoder {
            input,
            options,
            start: 0,
            cursor: 0,
            state: State::Guess,
            buffer: String::new(),
            token_start: 0,
            stack: Vec::new(),
            open: Vec::new(),
            class_name: None,
            fields: ValueMap::new(),
            escaped: false,
            quoted: false,
            key_ready: false,
            depth: 0,
            embedded: false,
            closed: false,
        }
    }

    /// Starts decoding at byte `offset` instead of the beginning of the input.
    #[must_use]
    pub fn starting_at(mut self, offset: usize) -> Self {
        self.start = offset;
        self.cursor = offset;
        self.token_start = offset;
        self
    }

    /// Decodes an embedded record from a buffer positioned at its `(`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_orient::{CodecOptions, Decoder};
    ///
    /// let decoded = Decoder::embedded("(name:\"Sub\"),rest:1", CodecOptions::default()).unwrap();
    /// assert_eq!(decoded.consumed, 12);
    /// assert_eq!(decoded.fields().len(), 1);
    /// ```
    ///
    /// # Errors
    ///
    /// Fails when the buffer does not start with `(` or the record is not
    /// closed by `)`.
    pub fn embedded(input: &'a str, options: CodecOptions) -> Result<Decoded> {
        if !input.starts_with('(') {
            return Err(Error::syntax(0, "expected '(' opening an embedded record"));
        }
        let parent = Decoder::new(input, options);
        let nested = parent.nested(1)?.run()?;
        Ok(Decoded {
            record: nested.record,
            consumed: nested.consumed + 1,
        })
    }

    /// Runs the state machine to the end of the input, or to the `)` closing
    /// an embedded record.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed booleans, numbers and links,
    /// unterminated strings and composites, commingled collections and
    /// nesting beyond [`CodecOptions::max_depth`].
    pub fn run(mut self) -> Result<Decoded> {
        if !self.input.is_char_boundary(self.start) {
            return Err(Error::syntax(self.start, "start offset is not inside the input"));
        }
        while !self.closed {
            let Some(ch) = self.peek() else { break };
            let class = CharClass::of(ch);
            TRANSITIONS[self.state.index()](&mut self, ch, class)?;
            self.reduce()?;
        }
        self.finish()
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.cursor..)?.chars().next()
    }

    fn rest(&self) -> &'a str {
        self.input.get(self.cursor..).unwrap_or("")
    }

    #[inline]
    fn advance(&mut self, ch: char) {
        self.cursor += ch.len_utf8();
    }

    fn push(&mut self, token: Token) {
        self.stack.push(token);
    }

    fn take_buffer(&mut self) -> String {
        std::mem::take(&mut self.buffer)
    }

    /// Begins collecting a token whose first character is at the cursor.
    fn begin(&mut self, state: State) {
        self.state = state;
        self.token_start = self.cursor;
        self.buffer.clear();
    }

    fn nesting(&self) -> usize {
        self.depth + self.open.len()
    }

    fn check_depth(&self, depth: usize) -> Result<()> {
        if depth > self.options.max_depth {
            return Err(Error::DepthLimitExceeded {
                limit: self.options.max_depth,
            });
        }
        Ok(())
    }

    fn nested(&self, offset: usize) -> Result<Decoder<'a>> {
        let depth = self.nesting() + 1;
        self.check_depth(depth)?;
        let mut nested = Decoder::new(self.input, self.options).starting_at(offset);
        nested.depth = depth;
        nested.embedded = true;
        Ok(nested)
    }

    fn open_container(&mut self, container: Container) -> Result<()> {
        self.check_depth(self.nesting() + 1)?;
        self.open.push(container);
        Ok(())
    }

    fn close_container(&mut self, ch: char) -> Result<()> {
        match (ch, self.open.last()) {
            (']', Some(Container::Collection(_))) | ('}', Some(Container::Map(_))) => {
                self.open.pop();
                Ok(())
            }
            _ => Err(Error::syntax(self.cursor, &format!("unexpected '{}'", ch))),
        }
    }

    /// Decodes the embedded record opening at the cursor.
    fn descend(&mut self) -> Result<()> {
        let nested = self.nested(self.cursor + 1)?;
        trace!(offset = self.cursor, depth = nested.depth, "descending into embedded record");
        let decoded = nested.run()?;
        self.push(Token::Embedded(decoded.record));
        self.cursor += 1 + decoded.consumed;
        self.state = State::Comma;
        Ok(())
    }

    /// Feeds one character of a quoted string or key into the buffer.
    /// Returns `true` on the closing (unescaped) quote.
    fn scan_quoted(&mut self, ch: char) -> bool {
        if self.escaped {
            if ch != '"' && ch != '\\' {
                self.buffer.push('\\');
            }
            self.buffer.push(ch);
            self.escaped = false;
            return false;
        }
        match ch {
            '\\' => self.escaped = true,
            '"' => return true,
            _ => self.buffer.push(ch),
        }
        false
    }

    fn push_number(&mut self, suffix: Option<char>) -> Result<()> {
        let literal = self.take_buffer();
        let value = parse_number(&literal, suffix).ok_or_else(|| {
            let mut text = literal.clone();
            text.extend(suffix);
            Error::invalid_number(self.token_start, &text)
        })?;
        self.push(Token::Number(value));
        Ok(())
    }

    fn push_link(&mut self) -> Result<()> {
        let link: RecordLink = self.take_buffer().parse()?;
        self.push(Token::Link(link));
        Ok(())
    }

    /// Folds the top of the stack into fields, collections and maps.
    fn reduce(&mut self) -> Result<()> {
        loop {
            match self.stack.last() {
                None
                | Some(Token::Name(_))
                | Some(Token::Key(_))
                | Some(Token::CollectionStart)
                | Some(Token::MapStart) => return Ok(()),
                Some(Token::Class(_)) => return self.reduce_class(),
                Some(Token::CollectionEnd) => self.reduce_collection()?,
                Some(Token::MapEnd) => self.reduce_map()?,
                Some(token) if token.is_value() => {
                    // Elements stay on the stack until their container closes
                    if !self.open.is_empty() {
                        return Ok(());
                    }
                    return self.assign_field();
                }
                Some(_) => return Ok(()),
            }
        }
    }

    fn reduce_class(&mut self) -> Result<()> {
        if let Some(Token::Class(class)) = self.stack.pop() {
            if self.class_name.is_some() || !self.fields.is_empty() || !self.stack.is_empty() {
                return Err(Error::syntax(
                    self.token_start,
                    "class name must precede the first field",
                ));
            }
            self.class_name = Some(class);
        }
        Ok(())
    }

    fn reduce_collection(&mut self) -> Result<()> {
        self.stack.pop();
        let mut items = Vec::new();
        loop {
            match self.stack.pop() {
                Some(Token::CollectionStart) => break,
                Some(token) => match token.into_value() {
                    Some(value) => items.push(value),
                    None => return Err(Error::syntax(self.cursor, "malformed collection")),
                },
                None => return Err(Error::syntax(self.cursor, "unbalanced ']'")),
            }
        }
        items.reverse();
        let items = homogenize(items)?;
        self.push(Token::Composite(Value::Collection(items)));
        Ok(())
    }

    fn reduce_map(&mut self) -> Result<()> {
        self.stack.pop();
        let mut entries = Vec::new();
        loop {
            let value = match self.stack.pop() {
                Some(Token::MapStart) => break,
                Some(token) => token
                    .into_value()
                    .ok_or_else(|| Error::syntax(self.cursor, "malformed map"))?,
                None => return Err(Error::syntax(self.cursor, "unbalanced '}'")),
            };
            match self.stack.pop() {
                Some(Token::Key(key)) => entries.push((key, value)),
                _ => return Err(Error::syntax(self.cursor, "map value without a key")),
            }
        }
        entries.reverse();
        self.push(Token::Composite(Value::Map(entries.into_iter().collect())));
        Ok(())
    }

    fn assign_field(&mut self) -> Result<()> {
        let value = self.stack.pop().and_then(Token::into_value);
        match (self.stack.pop(), value) {
            (Some(Token::Name(name)), Some(value)) => {
                self.fields.insert(name, value);
                Ok(())
            }
            _ => Err(Error::syntax(self.cursor, "value without a field name")),
        }
    }

    /// Flushes pending tokens at end of input (or after `)`) and checks that
    /// nothing is left open.
    fn finish(mut self) -> Result<Decoded> {
        match self.state {
            State::String => return Err(Error::unterminated(self.token_start, "string")),
            State::Buffer => return Err(Error::unterminated(self.token_start, "binary buffer")),
            State::Key if self.quoted => {
                return Err(Error::unterminated(self.token_start, "map key"))
            }
            State::Boolean => {
                return Err(Error::malformed_boolean(self.token_start, &self.buffer))
            }
            State::Number => {
                self.push_number(None)?;
                self.reduce()?;
            }
            State::Link => {
                self.push_link()?;
                self.reduce()?;
            }
            State::Name if !self.buffer.is_empty() => {
                return Err(Error::syntax(
                    self.token_start,
                    &format!("field `{}` has no value", self.buffer),
                ));
            }
            _ => {}
        }

        if let Some(container) = self.open.last() {
            return Err(Error::unterminated(container.offset(), container.name()));
        }
        if self.embedded && !self.closed {
            return Err(Error::unterminated(
                self.start.saturating_sub(1),
                "embedded record",
            ));
        }

        // A field with nothing after its colon is null
        if matches!(self.stack.last(), Some(Token::Name(_))) {
            self.push(Token::Null);
            self.reduce()?;
        }
        if !self.stack.is_empty() {
            return Err(Error::syntax(self.cursor, "incomplete record"));
        }

        let consumed = self.cursor - self.start;
        if self.depth == 0 {
            debug!(
                class = ?self.class_name,
                fields = self.fields.len(),
                consumed,
                "decoded record"
            );
        }
        Ok(Decoded {
            record: Record::from_parts(self.class_name, self.fields),
            consumed,
        })
    }
}

fn in_guess(d: &mut Decoder<'_>, _ch: char, _class: CharClass) -> Result<()> {
    d.begin(State::Name);
    Ok(())
}

fn in_name(d: &mut Decoder<'_>, ch: char, _class: CharClass) -> Result<()> {
    match ch {
        ':' => {
            if d.buffer.is_empty() {
                return Err(Error::syntax(d.cursor, "empty field name"));
            }
            let name = d.take_buffer();
            d.push(Token::Name(name));
            d.state = State::Value;
        }
        '@' => {
            if d.buffer.is_empty() {
                return Err(Error::syntax(d.cursor, "empty class name"));
            }
            let class = d.take_buffer();
            d.push(Token::Class(class));
        }
        // `()` or `(Class@)`: nothing but the terminator
        ')' if d.buffer.is_empty() && d.embedded => {
            d.state = State::Value;
            return Ok(());
        }
        ',' | '"' | '(' | ')' | '[' | ']' | '{' | '}' => {
            return Err(Error::syntax(
                d.cursor,
                &format!("unexpected '{}' in field name", ch),
            ));
        }
        _ => d.buffer.push(ch),
    }
    d.advance(ch);
    Ok(())
}

fn in_value(d: &mut Decoder<'_>, ch: char, class: CharClass) -> Result<()> {
    match ch {
        ',' => {
            d.push(Token::Null);
            d.state = State::Comma;
        }
        '"' => {
            d.begin(State::String);
            d.advance(ch);
        }
        '_' => {
            d.begin(State::Buffer);
            d.advance(ch);
        }
        '#' => {
            d.begin(State::Link);
            d.buffer.push(ch);
            d.advance(ch);
        }
        '[' => {
            d.open_container(Container::Collection(d.cursor))?;
            d.push(Token::CollectionStart);
            d.advance(ch);
        }
        ']' => {
            d.close_container(ch)?;
            d.push(Token::CollectionEnd);
            d.state = State::Comma;
            d.advance(ch);
        }
        '{' => {
            d.open_container(Container::Map(d.cursor))?;
            d.push(Token::MapStart);
            d.state = State::Key;
            d.quoted = false;
            d.key_ready = false;
            d.advance(ch);
        }
        '}' => {
            // A key with no value right before `}` is null
            if matches!(d.stack.last(), Some(Token::Key(_))) {
                d.push(Token::Null);
                return Ok(());
            }
            d.close_container(ch)?;
            d.push(Token::MapEnd);
            d.state = State::Comma;
            d.advance(ch);
        }
        '(' => d.descend()?,
        ')' => {
            if !d.embedded {
                return Err(Error::syntax(
                    d.cursor,
                    "unexpected ')' outside an embedded record",
                ));
            }
            if let Some(container) = d.open.last() {
                return Err(Error::unterminated(container.offset(), container.name()));
            }
            d.advance(ch);
            d.closed = true;
        }
        _ if ch == '-' || class == CharClass::Digit => {
            d.begin(State::Number);
            d.buffer.push(ch);
            d.advance(ch);
        }
        _ if class == CharClass::Word => {
            d.begin(State::Boolean);
            d.buffer.push(ch);
            d.advance(ch);
        }
        _ => {
            return Err(Error::syntax(
                d.cursor,
                &format!("unexpected '{}' in value position", ch),
            ));
        }
    }
    Ok(())
}

fn in_string(d: &mut Decoder<'_>, ch: char, _class: CharClass) -> Result<()> {
    if d.scan_quoted(ch) {
        let text = d.take_buffer();
        d.push(Token::String(text));
        d.state = State::Comma;
    }
    d.advance(ch);
    Ok(())
}

fn in_comma(d: &mut Decoder<'_>, ch: char, _class: CharClass) -> Result<()> {
    if ch != ',' {
        d.state = State::Value;
        return Ok(());
    }
    d.state = match d.open.last() {
        Some(Container::Collection(_)) => State::Value,
        Some(Container::Map(_)) => {
            d.quoted = false;
            d.key_ready = false;
            State::Key
        }
        None => State::Guess,
    };
    d.advance(ch);
    // A comma right before `]` leaves a null last element
    if d.state == State::Value && d.peek() == Some(']') {
        d.push(Token::Null);
    }
    Ok(())
}

fn in_link(d: &mut Decoder<'_>, ch: char, class: CharClass) -> Result<()> {
    if class == CharClass::Digit || ch == ':' || ch == '-' {
        d.buffer.push(ch);
        d.advance(ch);
        return Ok(());
    }
    d.push_link()?;
    d.state = State::Comma;
    Ok(())
}

fn in_number(d: &mut Decoder<'_>, ch: char, class: CharClass) -> Result<()> {
    if class == CharClass::Digit || matches!(ch, '.' | '-' | '+' | 'e' | 'E') {
        d.buffer.push(ch);
        d.advance(ch);
        return Ok(());
    }
    let suffix = if class == CharClass::Word {
        d.advance(ch);
        Some(ch)
    } else {
        None
    };
    d.push_number(suffix)?;
    d.state = State::Comma;
    Ok(())
}

fn in_key(d: &mut Decoder<'_>, ch: char, _class: CharClass) -> Result<()> {
    if d.quoted {
        if d.scan_quoted(ch) {
            d.quoted = false;
            d.key_ready = true;
        }
    } else {
        match ch {
            '"' if !d.key_ready => {
                d.begin(State::Key);
                d.quoted = true;
            }
            ':' if d.key_ready => {
                let key = d.take_buffer();
                d.push(Token::Key(key));
                d.key_ready = false;
                d.state = State::Value;
            }
            '}' if !d.key_ready => {
                d.close_container(ch)?;
                d.push(Token::MapEnd);
                d.state = State::Comma;
            }
            _ => {
                return Err(Error::syntax(
                    d.cursor,
                    &format!("unexpected '{}' where a quoted map key was expected", ch),
                ));
            }
        }
    }
    d.advance(ch);
    Ok(())
}

fn in_boolean(d: &mut Decoder<'_>, _ch: char, _class: CharClass) -> Result<()> {
    let (rest, value) = match d.buffer.as_str() {
        "t" => ("rue", true),
        "f" => ("alse", false),
        _ => ("", false),
    };
    let tail = d.rest();
    let word_follows = tail
        .get(rest.len()..)
        .and_then(|after| after.chars().next())
        .map_or(false, |c| CharClass::of(c) != CharClass::Other);

    if rest.is_empty() || !tail.starts_with(rest) || word_follows {
        let mut literal = d.take_buffer();
        literal.extend(
            tail.chars()
                .take_while(|c| CharClass::of(*c) != CharClass::Other),
        );
        return Err(Error::malformed_boolean(d.token_start, &literal));
    }

    d.cursor += rest.len();
    d.buffer.clear();
    d.push(Token::Boolean(value));
    d.state = State::Comma;
    Ok(())
}

fn in_buffer(d: &mut Decoder<'_>, ch: char, _class: CharClass) -> Result<()> {
    if ch == '_' {
        let raw = d.take_buffer();
        d.push(Token::Buffer(BinaryBuffer::new(raw)));
        d.state = State::Comma;
    } else {
        d.buffer.push(ch);
    }
    d.advance(ch);
    Ok(())
}

/// Applies the type suffix to a collected numeric literal.
fn parse_number(literal: &str, suffix: Option<char>) -> Option<Value> {
    let number = match suffix {
        None if literal.contains(['.', 'e', 'E']) => Number::Double(literal.parse().ok()?),
        None => {
            let wide: i64 = literal.parse().ok()?;
            i32::try_from(wide).map_or(Number::Long(wide), Number::Int)
        }
        Some('b') | Some('s') => Number::Int(literal.parse().ok()?),
        Some('l') => Number::Long(literal.parse().ok()?),
        Some('f') => Number::Float(literal.parse().ok()?),
        Some('d') => Number::Double(literal.parse().ok()?),
        Some('t') => {
            let seconds: f64 = literal.parse().ok()?;
            return from_epoch_seconds(seconds).map(Value::DateTime);
        }
        Some('a') => {
            let millis: f64 = literal.parse().ok()?;
            return from_epoch_seconds(millis / 1000.0).map(|dt| Value::Date(dt.date_naive()));
        }
        Some(_) => return None,
    };
    Some(Value::Number(number))
}

/// Last second of year 9999.
const MAX_EPOCH_SECONDS: f64 = 253_402_300_799.0;

fn from_epoch_seconds(seconds: f64) -> Option<DateTime<Local>> {
    if !seconds.is_finite() || seconds.abs() > MAX_EPOCH_SECONDS {
        return None;
    }
    let whole = seconds.floor();
    let nanos = (((seconds - whole) * 1e9).round() as u32).min(999_999_999);
    DateTime::from_timestamp(whole as i64, nanos).map(|dt| dt.with_timezone(&Local))
}

/// Deserializes a decoded [`Value`] into any `T: Deserialize`.
///
/// Embedded records and maps present themselves as serde maps, collections
/// as sequences; links, buffers, dates and timestamps as strings.
pub struct ValueDeserializer {
    value: Value,
}

impl ValueDeserializer {
    pub fn new(value: Value) -> Self {
        ValueDeserializer { value }
    }
}

impl<'de> de::Deserializer<'de> for ValueDeserializer {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::Null => visitor.visit_unit(),
            Value::Bool(b) => visitor.visit_bool(b),
            Value::Number(Number::Int(i)) => visitor.visit_i32(i),
            Value::Number(Number::Long(l)) => visitor.visit_i64(l),
            Value::Number(Number::Float(f)) => visitor.visit_f32(f),
            Value::Number(Number::Double(d)) => visitor.visit_f64(d),
            Value::String(s) => visitor.visit_string(s),
            Value::DateTime(dt) => visitor.visit_string(dt.to_rfc3339()),
            Value::Date(d) => visitor.visit_string(d.to_string()),
            Value::Collection(items) => visitor.visit_seq(SeqDeserializer::new(items)),
            Value::Map(map) => visitor.visit_map(MapDeserializer::new(map)),
            Value::Embedded(rec) => visitor.visit_map(MapDeserializer::new(rec.into_parts().1)),
            Value::Link(link) => visitor.visit_string(link.to_string()),
            Value::Buffer(buf) => visitor.visit_string(buf.into_raw()),
        }
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::Null => visitor.visit_none(),
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_newtype_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::String(variant) => visitor.visit_enum(EnumDeserializer::new(variant, None)),
            Value::Map(map) if map.len() == 1 => match map.into_iter().next() {
                Some((variant, value)) => {
                    visitor.visit_enum(EnumDeserializer::new(variant, Some(value)))
                }
                None => Err(Error::custom("expected enum variant")),
            },
            other => Err(Error::custom(format!(
                "expected string or single-entry map for enum, found {}",
                other.kind()
            ))),
        }
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit unit_struct seq tuple
        tuple_struct map struct identifier ignored_any
    }
}

struct SeqDeserializer {
    iter: std::vec::IntoIter<Value>,
}

impl SeqDeserializer {
    fn new(items: Vec<Value>) -> Self {
        SeqDeserializer {
            iter: items.into_iter(),
        }
    }
}

impl<'de> de::SeqAccess<'de> for SeqDeserializer {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>>
    where
        T: de::DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some(value) => seed.deserialize(ValueDeserializer::new(value)).map(Some),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        match self.iter.size_hint() {
            (lower, Some(upper)) if lower == upper => Some(upper),
            _ => None,
        }
    }
}

struct MapDeserializer {
    iter: indexmap::map::IntoIter<String, Value>,
    value: Option<Value>,
}

impl MapDeserializer {
    fn new(map: ValueMap) -> Self {
        MapDeserializer {
            iter: map.into_iter(),
            value: None,
        }
    }
}

impl<'de> de::MapAccess<'de> for MapDeserializer {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: de::DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some((key, value)) => {
                self.value = Some(value);
                seed.deserialize(ValueDeserializer::new(Value::String(key)))
                    .map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: de::DeserializeSeed<'de>,
    {
        match self.value.take() {
            Some(value) => seed.deserialize(ValueDeserializer::new(value)),
            None => Err(Error::custom("next_value_seed called before next_key_seed")),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        match self.iter.size_hint() {
            (lower, Some(upper)) if lower == upper => Some(upper),
            _ => None,
        }
    }
}

struct EnumDeserializer {
    variant: String,
    value: Option<Value>,
}

impl EnumDeserializer {
    fn new(variant: String, value: Option<Value>) -> Self {
        EnumDeserializer { variant, value }
    }
}

impl<'de> de::EnumAccess<'de> for EnumDeserializer {
    type Error = Error;
    type Variant = VariantDeserializer;

    fn variant_seed<V>(self, seed: V) -> Result<(V::Value, Self::Variant)>
    where
        V: de::DeserializeSeed<'de>,
    {
        let variant = seed.deserialize(ValueDeserializer::new(Value::String(self.variant)))?;
        Ok((variant, VariantDeserializer { value: self.value }))
    }
}

struct VariantDeserializer {
    value: Option<Value>,
}

impl<'de> de::VariantAccess<'de> for VariantDeserializer {
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        match self.value {
            Some(Value::Null) | None => Ok(()),
            _ => Err(Error::custom("expected unit variant")),
        }
    }

    fn newtype_variant_seed<T>(self, seed: T) -> Result<T::Value>
    where
        T: de::DeserializeSeed<'de>,
    {
        match self.value {
            Some(value) => seed.deserialize(ValueDeserializer::new(value)),
            None => Err(Error::custom("expected newtype variant")),
        }
    }

    fn tuple_variant<V>(self, _len: usize, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Some(Value::Collection(items)) => visitor.visit_seq(SeqDeserializer::new(items)),
            _ => Err(Error::custom("expected tuple variant")),
        }
    }

    fn struct_variant<V>(self, _fields: &'static [&'static str], visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Some(Value::Embedded(rec)) => {
                visitor.visit_map(MapDeserializer::new(rec.into_parts().1))
            }
            Some(Value::Map(map)) => visitor.visit_map(MapDeserializer::new(map)),
            _ => Err(Error::custom("expected struct variant")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};

    fn decode(input: &str) -> Result<Decoded> {
        Decoder::new(input, CodecOptions::default()).run()
    }

    fn fields(input: &str) -> ValueMap {
        decode(input).unwrap().record.into_parts().1
    }

    /// A decoder parked in `state` with `buffer` already collected.
    fn parked<'a>(input: &'a str, state: State, buffer: &str) -> Decoder<'a> {
        let mut d = Decoder::new(input, CodecOptions::default());
        d.state = state;
        d.buffer = buffer.to_string();
        d
    }

    #[test]
    fn test_number_transition_consumes_suffix() {
        let mut d = parked("l,", State::Number, "12");
        in_number(&mut d, 'l', CharClass::Word).unwrap();
        assert_eq!(d.state, State::Comma);
        assert_eq!(d.cursor, 1);
        assert_eq!(
            d.stack,
            vec![Token::Number(Value::Number(Number::Long(12)))]
        );
    }

    #[test]
    fn test_number_transition_stops_at_structure() {
        let mut d = parked(",", State::Number, "12");
        in_number(&mut d, ',', CharClass::Other).unwrap();
        assert_eq!(d.state, State::Comma);
        assert_eq!(d.cursor, 0);
        assert_eq!(d.stack, vec![Token::Number(Value::from(12))]);
    }

    #[test]
    fn test_value_transition_null_before_map_end() {
        let mut d = parked("}", State::Value, "");
        d.stack = vec![Token::MapStart, Token::Key("k".to_string())];
        d.open.push(Container::Map(0));
        in_value(&mut d, '}', CharClass::Other).unwrap();
        assert_eq!(d.stack.last(), Some(&Token::Null));
        assert_eq!(d.cursor, 0);
    }

    #[test]
    fn test_comma_transition_follows_context() {
        let mut d = parked(",", State::Comma, "");
        in_comma(&mut d, ',', CharClass::Other).unwrap();
        assert_eq!(d.state, State::Guess);

        let mut d = parked(",", State::Comma, "");
        d.open.push(Container::Collection(0));
        in_comma(&mut d, ',', CharClass::Other).unwrap();
        assert_eq!(d.state, State::Value);

        let mut d = parked(",", State::Comma, "");
        d.open.push(Container::Map(0));
        in_comma(&mut d, ',', CharClass::Other).unwrap();
        assert_eq!(d.state, State::Key);
    }

    #[test]
    fn test_comma_transition_null_before_collection_end() {
        let mut d = parked(",]", State::Comma, "");
        d.stack = vec![Token::CollectionStart, Token::Number(Value::from(1))];
        d.open.push(Container::Collection(0));
        in_comma(&mut d, ',', CharClass::Other).unwrap();
        assert_eq!(d.state, State::Value);
        assert_eq!(d.stack.last(), Some(&Token::Null));
        assert_eq!(d.cursor, 1);
    }

    #[test]
    fn test_string_escapes() {
        let f = fields(r#"s:"a\"b\\c\nd""#);
        assert_eq!(f.get("s"), Some(&Value::from(r#"a"b\c\nd"#)));
    }

    #[test]
    fn test_class_name_and_fields() {
        let decoded = decode("Person@name:\"John\",age:29").unwrap();
        assert_eq!(decoded.class_name(), Some("Person"));
        assert_eq!(decoded.fields().get("name"), Some(&Value::from("John")));
        assert_eq!(decoded.fields().get("age"), Some(&Value::from(29)));
        assert_eq!(decoded.consumed, 25);
    }

    #[test]
    fn test_numeric_suffixes() {
        let f = fields("a:1b,b:2s,c:3l,d:1.5f,e:2.5d,g:7,h:-4,i:1e3,j:5000000000");
        assert_eq!(f.get("a"), Some(&Value::Number(Number::Int(1))));
        assert_eq!(f.get("b"), Some(&Value::Number(Number::Int(2))));
        assert_eq!(f.get("c"), Some(&Value::Number(Number::Long(3))));
        assert_eq!(f.get("d"), Some(&Value::Number(Number::Float(1.5))));
        assert_eq!(f.get("e"), Some(&Value::Number(Number::Double(2.5))));
        assert_eq!(f.get("g"), Some(&Value::Number(Number::Int(7))));
        assert_eq!(f.get("h"), Some(&Value::Number(Number::Int(-4))));
        assert_eq!(f.get("i"), Some(&Value::Number(Number::Double(1000.0))));
        assert_eq!(
            f.get("j"),
            Some(&Value::Number(Number::Long(5_000_000_000)))
        );
    }

    #[test]
    fn test_timestamp_and_date() {
        let f = fields("t:1700000000t,a:1700000000000a");
        let expected = Local.timestamp_opt(1_700_000_000, 0).unwrap();
        assert_eq!(f.get("t"), Some(&Value::DateTime(expected)));
        assert_eq!(f.get("a"), Some(&Value::Date(expected.date_naive())));
        assert!(expected.date_naive() > NaiveDate::from_ymd_opt(2023, 1, 1).unwrap());
    }

    #[test]
    fn test_out_of_range_timestamp_rejected() {
        assert!(matches!(
            decode("t:99999999999999t"),
            Err(Error::InvalidNumber { .. })
        ));
    }

    #[test]
    fn test_unknown_suffix_rejected() {
        let err = decode("n:12q").unwrap_err();
        assert_eq!(err, Error::invalid_number(2, "12q"));
    }

    #[test]
    fn test_narrow_overflow_rejected() {
        assert!(matches!(
            decode("n:99999999999s"),
            Err(Error::InvalidNumber { .. })
        ));
    }

    #[test]
    fn test_nested_collections() {
        let f = fields("m:[[1,2],[3]]");
        assert_eq!(
            f.get("m"),
            Some(&Value::Collection(vec![
                Value::Collection(vec![Value::from(1), Value::from(2)]),
                Value::Collection(vec![Value::from(3)]),
            ]))
        );
    }

    #[test]
    fn test_map_inside_collection_and_back() {
        let f = fields(r#"x:[{"a":1},{"b":[true]}],y:2"#);
        let items = f.get("x").and_then(Value::as_collection).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(
            items[1].as_map().and_then(|m| m.get("b")),
            Some(&Value::Collection(vec![Value::Bool(true)]))
        );
        assert_eq!(f.get("y"), Some(&Value::from(2)));
    }

    #[test]
    fn test_empty_composites() {
        let f = fields("c:[],m:{},e:()");
        assert_eq!(f.get("c"), Some(&Value::Collection(vec![])));
        assert_eq!(f.get("m"), Some(&Value::Map(ValueMap::new())));
        assert_eq!(f.get("e"), Some(&Value::Embedded(Record::new())));
    }

    #[test]
    fn test_null_values() {
        let f = fields(r#"a:,m:{"k":},c:[,1],z:"#);
        assert_eq!(f.get("a"), Some(&Value::Null));
        assert_eq!(
            f.get("m").and_then(Value::as_map).and_then(|m| m.get("k")),
            Some(&Value::Null)
        );
        assert_eq!(
            f.get("c"),
            Some(&Value::Collection(vec![Value::Null, Value::from(1)]))
        );
        assert_eq!(f.get("z"), Some(&Value::Null));
    }

    #[test]
    fn test_trailing_null_elements() {
        let f = fields("a:[1,],b:[,],c:[[1,],2]");
        assert_eq!(
            f.get("a"),
            Some(&Value::Collection(vec![Value::from(1), Value::Null]))
        );
        assert_eq!(
            f.get("b"),
            Some(&Value::Collection(vec![Value::Null, Value::Null]))
        );
        assert_eq!(
            f.get("c"),
            Some(&Value::Collection(vec![
                Value::Collection(vec![Value::from(1), Value::Null]),
                Value::from(2),
            ]))
        );
    }

    #[test]
    fn test_embedded_with_class_and_links() {
        let f = fields("e:(Address@city:\"Rome\",owner:#5:1),after:1");
        let rec = f.get("e").and_then(Value::as_record).unwrap();
        assert_eq!(rec.class_name(), Some("Address"));
        assert_eq!(rec.get("owner"), Some(&Value::Link(RecordLink::new(5, 1))));
        assert_eq!(f.get("after"), Some(&Value::from(1)));
    }

    #[test]
    fn test_class_only_embedded() {
        let f = fields("e:(Tag@)");
        assert_eq!(f.get("e"), Some(&Value::Embedded(Record::with_class("Tag"))));
    }

    #[test]
    fn test_buffer() {
        let f = fields("b:_AAECAw==_,n:1");
        assert_eq!(f.get("b"), Some(&Value::Buffer(BinaryBuffer::new("AAECAw=="))));
        assert_eq!(f.get("n"), Some(&Value::from(1)));
    }

    #[test]
    fn test_malformed_boolean() {
        assert_eq!(
            decode("flag:yes").unwrap_err(),
            Error::malformed_boolean(5, "yes")
        );
        assert_eq!(
            decode("flag:trueish").unwrap_err(),
            Error::malformed_boolean(5, "trueish")
        );
        assert_eq!(
            decode("flag:t").unwrap_err(),
            Error::malformed_boolean(5, "t")
        );
    }

    #[test]
    fn test_unterminated() {
        assert_eq!(
            decode("name:\"abc").unwrap_err(),
            Error::unterminated(5, "string")
        );
        assert_eq!(
            decode("c:[1,2").unwrap_err(),
            Error::unterminated(2, "collection")
        );
        assert_eq!(
            decode("m:{\"a\":1").unwrap_err(),
            Error::unterminated(2, "map")
        );
        assert_eq!(
            decode("e:(a:1").unwrap_err(),
            Error::unterminated(2, "embedded record")
        );
        assert_eq!(
            decode("b:_abc").unwrap_err(),
            Error::unterminated(2, "binary buffer")
        );
    }

    #[test]
    fn test_commingling() {
        assert!(matches!(
            decode("c:[1,\"a\"]"),
            Err(Error::TypeCommingling {
                expected: crate::ValueKind::Integer,
                found: crate::ValueKind::String,
            })
        ));
    }

    #[test]
    fn test_collection_numbers_follow_first_element() {
        let f = fields("c:[1l,2,3]");
        assert_eq!(
            f.get("c"),
            Some(&Value::Collection(vec![
                Value::Number(Number::Long(1)),
                Value::Number(Number::Long(2)),
                Value::Number(Number::Long(3)),
            ]))
        );
    }

    #[test]
    fn test_stray_terminators() {
        assert!(matches!(decode("a:]"), Err(Error::Syntax { .. })));
        assert!(matches!(decode("a:}"), Err(Error::Syntax { .. })));
        assert!(matches!(decode("a:1)"), Err(Error::Syntax { .. })));
        assert!(matches!(decode("a:[1}"), Err(Error::Syntax { .. })));
    }

    #[test]
    fn test_class_after_field_rejected() {
        assert!(matches!(decode("a:1,B@c:2"), Err(Error::Syntax { .. })));
    }

    #[test]
    fn test_depth_limit() {
        let options = CodecOptions::default().with_max_depth(3);
        assert!(Decoder::new("a:[[[1]]]", options).run().is_ok());
        assert_eq!(
            Decoder::new("a:[[[[1]]]]", options).run().unwrap_err(),
            Error::DepthLimitExceeded { limit: 3 }
        );
        assert!(Decoder::new("a:(b:(c:(d:1)))", options).run().is_ok());
        assert_eq!(
            Decoder::new("a:(b:(c:(d:(e:1))))", options).run().unwrap_err(),
            Error::DepthLimitExceeded { limit: 3 }
        );
        assert_eq!(
            Decoder::new("a:(b:[(c:[1])])", options).run().unwrap_err(),
            Error::DepthLimitExceeded { limit: 3 }
        );
    }

    #[test]
    fn test_starting_offset() {
        let input = "ignored|name:\"x\"";
        let decoded = Decoder::new(input, CodecOptions::default())
            .starting_at(8)
            .run()
            .unwrap();
        assert_eq!(decoded.fields().get("name"), Some(&Value::from("x")));
        assert_eq!(decoded.consumed, input.len() - 8);

        let at_end = Decoder::new("a:1", CodecOptions::default())
            .starting_at(3)
            .run()
            .unwrap();
        assert!(at_end.fields().is_empty());
    }

    #[test]
    fn test_starting_offset_outside_input() {
        let past_end = Decoder::new("a:1", CodecOptions::default())
            .starting_at(4)
            .run();
        assert!(matches!(past_end, Err(Error::Syntax { offset: 4, .. })));

        let mid_char = Decoder::new("é:1", CodecOptions::default())
            .starting_at(1)
            .run();
        assert!(matches!(mid_char, Err(Error::Syntax { offset: 1, .. })));
    }

    #[test]
    fn test_embedded_entry_point() {
        let decoded = Decoder::embedded("(a:1)tail", CodecOptions::default()).unwrap();
        assert_eq!(decoded.consumed, 5);
        assert!(Decoder::embedded("a:1", CodecOptions::default()).is_err());
        assert_eq!(
            Decoder::embedded("(a:1", CodecOptions::default()).unwrap_err(),
            Error::unterminated(0, "embedded record")
        );
    }

    #[test]
    fn test_unicode_content() {
        let f = fields("s:\"héllo, wörld\",n:1");
        assert_eq!(f.get("s"), Some(&Value::from("héllo, wörld")));
        assert_eq!(f.get("n"), Some(&Value::from(1)));
    }
}
