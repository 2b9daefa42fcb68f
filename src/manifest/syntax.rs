//! Narrow grammar for the route manifest.
//!
//! The manifest is a source file holding one `routes` declaration whose
//! initializer is a list of object records:
//!
//! ```text
//! export const routes: GeneratedRoute[] = [
//!   {
//!     name: 'Home',
//!     path: '/home',
//!     handle: {
//!       title: 'Home'
//!     },
//!     loader: async () => fetchHome()
//!   }
//! ];
//! ```
//!
//! Values are strings, booleans, nested objects, or raw expressions. Raw
//! expressions (functions, arrays, numbers, template strings) are kept as
//! verbatim text. Text before and after the list is kept untouched, and
//! comments in front of records and properties survive a round trip.
//! Printing is deterministic: two-space indentation, single-quoted strings,
//! no trailing commas.

use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

use crate::error::{RouterError, RouterResult};

static ROUTES_DECLARATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:const|let|var)\s+routes\b").expect("valid declaration regex")
});

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Bool(bool),
    Object(Object),
    /// Any other expression, as written
    Raw(String),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Convert JSON metadata into a manifest value.
    pub fn from_json(value: &serde_json::Value) -> Value {
        match value {
            serde_json::Value::String(s) => Value::Str(s.clone()),
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Object(map) => Value::Object(Object {
                properties: map
                    .iter()
                    .map(|(key, value)| Property::new(key, Value::from_json(value)))
                    .collect(),
                ..Object::default()
            }),
            other => Value::Raw(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    /// Comments written directly above the property
    pub comments: Vec<String>,
    pub key: String,
    pub value: Value,
}

impl Property {
    pub fn new(key: impl Into<String>, value: Value) -> Self {
        Self {
            comments: Vec::new(),
            key: key.into(),
            value,
        }
    }
}

/// An object literal. As a list element this is one route record.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Object {
    /// Comments written directly above the object (list elements only)
    pub comments: Vec<String>,
    pub properties: Vec<Property>,
    /// Comments after the last property
    pub trailing_comments: Vec<String>,
}

impl Object {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.properties
            .iter()
            .find(|p| p.key == key)
            .map(|p| &p.value)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.properties
            .iter_mut()
            .find(|p| p.key == key)
            .map(|p| &mut p.value)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.properties.iter().any(|p| p.key == key)
    }

    /// Replace the value under `key`, or append a new property.
    pub fn set(&mut self, key: &str, value: Value) {
        match self.get_mut(key) {
            Some(existing) => *existing = value,
            None => self.properties.push(Property::new(key, value)),
        }
    }

    pub fn push(&mut self, key: &str, value: Value) {
        self.properties.push(Property::new(key, value));
    }
}

/// A parsed manifest file.
#[derive(Debug, Clone, PartialEq)]
pub struct Manifest {
    /// Source text up to the opening `[` of the routes list
    pub header: String,
    pub records: Vec<Object>,
    /// Comments after the last record
    pub trailing_comments: Vec<String>,
    /// Source text after the closing `]`
    pub trailer: String,
}

/// Parse manifest source text.
///
/// A missing `routes` declaration or a non-list initializer is a shape
/// error; anything inside the list outside the grammar is a syntax error.
pub fn parse_manifest(source: &str, path: &Path) -> RouterResult<Manifest> {
    let declaration = ROUTES_DECLARATION
        .find(source)
        .ok_or_else(|| RouterError::shape(path, "no `routes` declaration found"))?;

    let equals = source[declaration.end()..]
        .find('=')
        .map(|offset| declaration.end() + offset)
        .ok_or_else(|| RouterError::shape(path, "`routes` has no initializer"))?;

    let mut parser = Parser::new(source, equals + 1);
    parser.skip_trivia();
    if parser.peek() != Some(b'[') {
        return Err(RouterError::shape(
            path,
            "`routes` initializer is not a list literal",
        ));
    }

    let list_start = parser.pos;
    let (records, trailing_comments) = parser.parse_list()?;

    Ok(Manifest {
        header: source[..list_start].to_string(),
        records,
        trailing_comments,
        trailer: source[parser.pos..].to_string(),
    })
}

pub fn print_manifest(manifest: &Manifest) -> String {
    let mut out = manifest.header.clone();

    if manifest.records.is_empty() && manifest.trailing_comments.is_empty() {
        out.push_str("[]");
    } else {
        out.push_str("[\n");
        let last = manifest.records.len().saturating_sub(1);
        for (i, record) in manifest.records.iter().enumerate() {
            write_comments(&mut out, &record.comments, 2);
            out.push_str("  ");
            write_object(&mut out, record, 2);
            if i < last {
                out.push(',');
            }
            out.push('\n');
        }
        write_comments(&mut out, &manifest.trailing_comments, 2);
        out.push(']');
    }

    out.push_str(&manifest.trailer);
    out
}

/// Print a single record at top-level indentation, comments above it
/// included (used for backups).
pub fn print_record(record: &Object) -> String {
    let mut out = String::new();
    write_comments(&mut out, &record.comments, 0);
    write_object(&mut out, record, 0);
    out
}

fn write_comments(out: &mut String, comments: &[String], indent: usize) {
    for comment in comments {
        out.push_str(&" ".repeat(indent));
        out.push_str(comment);
        out.push('\n');
    }
}

fn write_object(out: &mut String, object: &Object, indent: usize) {
    if object.properties.is_empty() && object.trailing_comments.is_empty() {
        out.push_str("{}");
        return;
    }

    let pad = " ".repeat(indent + 2);
    out.push_str("{\n");

    let last = object.properties.len().saturating_sub(1);
    for (i, property) in object.properties.iter().enumerate() {
        write_comments(out, &property.comments, indent + 2);
        out.push_str(&pad);
        write_key(out, &property.key);
        out.push_str(": ");
        write_value(out, &property.value, indent + 2);
        if i < last {
            out.push(',');
        }
        out.push('\n');
    }

    write_comments(out, &object.trailing_comments, indent + 2);
    out.push_str(&" ".repeat(indent));
    out.push('}');
}

fn write_value(out: &mut String, value: &Value, indent: usize) {
    match value {
        Value::Str(s) => write_string(out, s),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Object(object) => write_object(out, object, indent),
        Value::Raw(raw) => out.push_str(raw),
    }
}

fn write_key(out: &mut String, key: &str) {
    if is_identifier(key) {
        out.push_str(key);
    } else {
        write_string(out, key);
    }
}

fn write_string(out: &mut String, s: &str) {
    out.push('\'');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('\'');
}

fn is_identifier(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

struct Parser<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str, pos: usize) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            pos,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_at(&self, pos: usize) -> Option<u8> {
        self.bytes.get(pos).copied()
    }

    fn error(&self, message: impl Into<String>) -> RouterError {
        self.error_at(self.pos, message)
    }

    fn error_at(&self, pos: usize, message: impl Into<String>) -> RouterError {
        let before = &self.src[..pos.min(self.src.len())];
        let line = before.matches('\n').count() + 1;
        let column = before.len() - before.rfind('\n').map(|i| i + 1).unwrap_or(0) + 1;
        RouterError::ManifestSyntax {
            line,
            column,
            message: message.into(),
        }
    }

    /// Skip whitespace and comments, returning the comments.
    fn skip_trivia(&mut self) -> Vec<String> {
        let mut comments = Vec::new();
        loop {
            match self.peek() {
                Some(c) if c.is_ascii_whitespace() => self.pos += 1,
                Some(b'/') if self.peek_at(self.pos + 1) == Some(b'/') => {
                    let start = self.pos;
                    let end = self.src[start..]
                        .find('\n')
                        .map(|i| start + i)
                        .unwrap_or(self.src.len());
                    comments.push(self.src[start..end].trim_end().to_string());
                    self.pos = end;
                }
                Some(b'/') if self.peek_at(self.pos + 1) == Some(b'*') => {
                    let start = self.pos;
                    let end = self.src[start + 2..]
                        .find("*/")
                        .map(|i| start + 2 + i + 2)
                        .unwrap_or(self.src.len());
                    comments.push(self.src[start..end].to_string());
                    self.pos = end;
                }
                _ => return comments,
            }
        }
    }

    fn expect(&mut self, byte: u8) -> RouterResult<()> {
        if self.peek() == Some(byte) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(format!("expected '{}'", byte as char)))
        }
    }

    /// `[ {..}, {..} ]`, positioned at `[`.
    fn parse_list(&mut self) -> RouterResult<(Vec<Object>, Vec<String>)> {
        self.expect(b'[')?;
        let mut records = Vec::new();
        let mut pending = Vec::new();

        loop {
            pending.extend(self.skip_trivia());
            match self.peek() {
                Some(b']') => {
                    self.pos += 1;
                    return Ok((records, pending));
                }
                Some(b'{') => {
                    let mut record = self.parse_object()?;
                    record.comments = std::mem::take(&mut pending);
                    records.push(record);

                    pending.extend(self.skip_trivia());
                    match self.peek() {
                        Some(b',') => self.pos += 1,
                        Some(b']') => {}
                        _ => return Err(self.error("expected ',' or ']' after route record")),
                    }
                }
                None => return Err(self.error("unterminated routes list")),
                _ => return Err(self.error("expected a route object")),
            }
        }
    }

    /// `{ key: value, ... }`, positioned at `{`.
    fn parse_object(&mut self) -> RouterResult<Object> {
        self.expect(b'{')?;
        let mut object = Object::default();
        let mut pending = Vec::new();

        loop {
            pending.extend(self.skip_trivia());
            match self.peek() {
                Some(b'}') => {
                    self.pos += 1;
                    object.trailing_comments = pending;
                    return Ok(object);
                }
                None => return Err(self.error("unterminated object")),
                _ => {}
            }

            let key = self.parse_key()?;
            self.skip_trivia();
            self.expect(b':')?;
            self.skip_trivia();
            let value = self.parse_value()?;

            object.properties.push(Property {
                comments: std::mem::take(&mut pending),
                key,
                value,
            });

            pending.extend(self.skip_trivia());
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b'}') => {}
                _ => return Err(self.error("expected ',' or '}' after property")),
            }
        }
    }

    fn parse_key(&mut self) -> RouterResult<String> {
        match self.peek() {
            Some(b'\'') | Some(b'"') => {
                let start = self.pos;
                self.pos = self.skip_string(start)?;
                Ok(decode_string(&self.src[start + 1..self.pos - 1]))
            }
            _ => {
                let start = self.pos;
                while let Some(c) = self.peek() {
                    if c.is_ascii_alphanumeric() || c == b'_' || c == b'$' {
                        self.pos += 1;
                    } else {
                        break;
                    }
                }
                if start == self.pos {
                    return Err(self.error("expected a property key"));
                }
                Ok(self.src[start..self.pos].to_string())
            }
        }
    }

    /// Classify one value expression, falling back to raw text.
    fn parse_value(&mut self) -> RouterResult<Value> {
        let start = self.pos;
        let end = self.scan_expression(start)?;
        let text = &self.src[start..end];
        self.pos = end;

        match text {
            "true" => return Ok(Value::Bool(true)),
            "false" => return Ok(Value::Bool(false)),
            _ => {}
        }

        match text.as_bytes().first() {
            Some(b'\'') | Some(b'"') => {
                if self.skip_string(start).ok() == Some(end) {
                    return Ok(Value::Str(decode_string(&text[1..text.len() - 1])));
                }
            }
            Some(b'{') => {
                let mut nested = Parser::new(self.src, start);
                if let Ok(object) = nested.parse_object() {
                    if nested.pos == end {
                        return Ok(Value::Object(object));
                    }
                }
            }
            _ => {}
        }

        Ok(Value::Raw(text.to_string()))
    }

    /// End of the expression starting at `start`: the last significant byte
    /// before a top-level `,` or closing bracket.
    fn scan_expression(&self, start: usize) -> RouterResult<usize> {
        let mut depth = 0usize;
        let mut i = start;
        let mut last = start;

        while i < self.bytes.len() {
            let c = self.bytes[i];
            match c {
                b'/' if self.peek_at(i + 1) == Some(b'/') => {
                    i = self.src[i..]
                        .find('\n')
                        .map(|n| i + n)
                        .unwrap_or(self.bytes.len());
                    continue;
                }
                b'/' if self.peek_at(i + 1) == Some(b'*') => {
                    i = self.src[i + 2..]
                        .find("*/")
                        .map(|n| i + 2 + n + 2)
                        .unwrap_or(self.bytes.len());
                    continue;
                }
                b'\'' | b'"' | b'`' => {
                    i = self.skip_string(i)?;
                    last = i;
                    continue;
                }
                b'(' | b'[' | b'{' => depth += 1,
                b')' | b']' | b'}' => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                }
                b',' if depth == 0 => break,
                _ => {}
            }

            if !c.is_ascii_whitespace() {
                last = i + 1;
            }
            i += 1;
        }

        if i >= self.bytes.len() {
            return Err(self.error_at(i, "unexpected end of input in value"));
        }
        if last == start {
            return Err(self.error_at(start, "expected a value"));
        }

        Ok(last)
    }

    /// Position just past the string literal starting at `start`.
    fn skip_string(&self, start: usize) -> RouterResult<usize> {
        let quote = self.bytes[start];
        let mut i = start + 1;

        while i < self.bytes.len() {
            match self.bytes[i] {
                b'\\' => i += 2,
                c if c == quote => return Ok(i + 1),
                b'\n' if quote != b'`' => break,
                _ => i += 1,
            }
        }

        Err(self.error_at(start, "unterminated string literal"))
    }
}

/// Unescape the body of a quoted string.
fn decode_string(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }

        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('0') => out.push('\0'),
            Some('u') => {
                let hex: String = if chars.peek() == Some(&'{') {
                    chars.next();
                    chars.by_ref().take_while(|c| *c != '}').collect()
                } else {
                    chars.by_ref().take(4).collect()
                };
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => {
                        out.push_str("\\u");
                        out.push_str(&hex);
                    }
                }
            }
            // Line continuation
            Some('\n') => {}
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }

    out
}
