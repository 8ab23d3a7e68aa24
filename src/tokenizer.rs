// SPDX-License-Identifier: GPL-3.0-or-later

/*
 *  src/tokenizer.rs - Key-value record tokenizer for Altium streams.
 *  Copyright (C) 2026  Forest Crossman <cyrozap@gmail.com>
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  You should have received a copy of the GNU General Public License
 *  along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

/*!
 * # `tokenizer` Module
 *
 * Altium stores most of its library metadata as `|`-delimited `KEY=VALUE`
 * text:
 *
 * ```text
 * |RECORD=4|Location.X=10|Location.Y=20|Text=A|&|B|OwnerPartId=1
 * ```
 *
 * The three-byte sequence `|&|` stands for a literal pipe inside a value and
 * never ends a field. Raw values keep it as stored, since binary pin chunks
 * embedded in a value can contain the same bytes; it is only turned into a
 * `|` when a value is decoded to text.
 *
 * ## Usage Example
 *
 * ```
 * use altiumlib::tokenizer::tokenize;
 *
 * let record = tokenize(b"|RECORD=4|Text=A|&|B");
 * assert_eq!(record.get("Text"), Some(&b"A|&|B"[..]));
 * assert_eq!(record.get_str("Text").as_deref(), Some("A|B"));
 *
 * let normalized = record.normalize();
 * assert_eq!(normalized.get_int("RECORD"), Some(4));
 * ```
 */

use std::fmt;
use std::str::FromStr;

use memchr::{memchr, memmem};
use rust_decimal::Decimal;

use crate::units::{eval_bool, eval_color};

/// Marker that starts every record in a schematic item's `Data` stream.
pub const RECORD_MARKER: &[u8] = b"|RECORD";

const ESCAPED_PIPE: &[u8] = b"|&|";

/// One delimited chunk split into ordered `(key, raw value)` fields.
///
/// Keys are never empty. Values are kept as raw bytes, escapes included,
/// because some of them carry binary data after a NUL byte.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    fields: Vec<(String, Vec<u8>)>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key` to `value`, replacing an existing value in place.
    ///
    /// Empty keys are ignored.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Vec<u8>>) {
        let key = key.into();
        if key.is_empty() {
            return;
        }

        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some((_, v)) => *v = value,
            None => self.fields.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&[u8]> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_slice())
    }

    /// Returns the value for `key` decoded as text, with `|&|` unescaped and
    /// invalid UTF-8 replaced.
    pub fn get_str(&self, key: &str) -> Option<String> {
        self.get(key)
            .map(|v| String::from_utf8_lossy(&unescape(v)).into_owned())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub(crate) fn values_mut(&mut self) -> impl Iterator<Item = &mut Vec<u8>> {
        self.fields.iter_mut().map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Decodes the values to text, cleans up the keys, and coerces numeric
    /// values.
    ///
    /// Fields with an empty value are dropped, as are fields whose key is
    /// empty once every character other than letters, digits, `_`, and `.`
    /// has been removed.
    pub fn normalize(&self) -> NormalizedRecord {
        let mut normalized = NormalizedRecord::default();

        for (key, value) in &self.fields {
            if value.is_empty() {
                continue;
            }

            let key: String = key
                .chars()
                .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '.')
                .collect();
            if key.is_empty() {
                continue;
            }

            let text = String::from_utf8_lossy(&unescape(value)).into_owned();
            normalized.insert(key, Value::coerce(&text));
        }

        normalized
    }
}

/// A normalized field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Int(i64),
    Decimal(Decimal),
    Text(String),
}

impl Value {
    /// Coerces `text` to an integer or a decimal when the number prints back
    /// to exactly the same text, so no formatting is lost.
    pub fn coerce(text: &str) -> Self {
        if let Ok(i) = text.parse::<i64>()
            && i.to_string() == text
        {
            return Value::Int(i);
        }

        if let Ok(d) = Decimal::from_str(text)
            && d.to_string() == text
        {
            return Value::Decimal(d);
        }

        Value::Text(text.to_string())
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Value::Int(i) => Some(Decimal::from(*i)),
            Value::Decimal(d) => Some(*d),
            Value::Text(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{}", i),
            Value::Decimal(d) => write!(f, "{}", d),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<Decimal> for Value {
    fn from(value: Decimal) -> Self {
        Value::Decimal(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Text(if value { "T" } else { "F" }.to_string())
    }
}

/// A [RawRecord] with text values and typed accessors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedRecord {
    fields: Vec<(String, Value)>,
}

impl NormalizedRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        if key.is_empty() {
            return;
        }

        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some((_, v)) => *v = value,
            None => self.fields.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_int)
    }

    pub fn get_decimal(&self, key: &str) -> Option<Decimal> {
        self.get(key).and_then(Value::as_decimal)
    }

    pub fn get_text(&self, key: &str) -> Option<String> {
        self.get(key).map(|v| v.to_string())
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).map(|v| eval_bool(&v.to_string()))
    }

    pub fn get_color(&self, key: &str) -> String {
        eval_color(self.get_int(key))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Splits `blob` into fields and returns the `KEY=VALUE` ones.
///
/// The first field (whatever precedes the first delimiter) is discarded.
/// Fields without `=` or with an empty key are skipped. Never fails;
/// undecodable key bytes are replaced.
pub fn tokenize(blob: &[u8]) -> RawRecord {
    let mut record = RawRecord::new();

    for field in split_fields(blob).into_iter().skip(1) {
        let Some(eq) = memchr(b'=', field) else {
            continue;
        };

        let key = String::from_utf8_lossy(&field[..eq]);
        record.insert(key.into_owned(), &field[eq + 1..]);
    }

    record
}

/// Splits a `Data` stream into one chunk per `|RECORD` marker.
///
/// Anything before the first marker is dropped. Each chunk starts with the
/// marker itself.
pub fn split_records(data: &[u8]) -> Vec<&[u8]> {
    let starts: Vec<usize> = memmem::find_iter(data, RECORD_MARKER).collect();

    starts
        .iter()
        .enumerate()
        .map(|(i, &start)| {
            let end = starts.get(i + 1).copied().unwrap_or(data.len());
            &data[start..end]
        })
        .collect()
}

fn split_fields(blob: &[u8]) -> Vec<&[u8]> {
    let mut fields = Vec::new();
    let mut start = 0;
    let mut pos = 0;

    while let Some(rel) = memchr(b'|', &blob[pos..]) {
        let i = pos + rel;
        if blob[i..].starts_with(ESCAPED_PIPE) {
            pos = i + ESCAPED_PIPE.len();
            continue;
        }

        fields.push(&blob[start..i]);
        start = i + 1;
        pos = i + 1;
    }
    fields.push(&blob[start..]);

    fields
}

fn unescape(value: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(value.len());
    let mut last = 0;

    for pos in memmem::find_iter(value, ESCAPED_PIPE) {
        // find_iter does not report overlapping matches
        out.extend_from_slice(&value[last..pos]);
        out.push(b'|');
        last = pos + ESCAPED_PIPE.len();
    }
    out.extend_from_slice(&value[last..]);

    out
}
