//! Encoding of values and host literals into MOO literal syntax.
//!
//! Everything written here parses back with [`crate::parse`], except
//! [`Alias`], which the server resolves itself and never sends back.

use std::fmt;

use crate::value::{Key, Map, Value};

/// Types that can be written as a MOO literal.
pub trait ToLiteral {
    /// Append the literal form of `self` to `out`.
    fn write_literal(&self, out: &mut String);

    /// Returns the literal form of `self`.
    fn to_literal(&self) -> String {
        let mut out = String::new();
        self.write_literal(&mut out);
        out
    }
}

/// A `$name` reference to a well-known object, such as `$nothing`.
///
/// The server expands the alias when it compiles the code it is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Alias<'a>(pub &'a str);

impl ToLiteral for Alias<'_> {
    fn write_literal(&self, out: &mut String) {
        out.push('$');
        out.push_str(self.0);
    }
}

pub(crate) fn write_integer(out: &mut String, v: i64) {
    out.push_str(&v.to_string());
}

/// Shortest digits that round-trip, always with a `.` so the text cannot
/// be read back as an integer, and with a signed exponent.
pub(crate) fn write_float(out: &mut String, v: f64) {
    let text = format!("{v:?}");
    if !v.is_finite() {
        // outside the literal grammar; the server has no such floats
        out.push_str(&text);
        return;
    }
    match text.split_once('e') {
        Some((mantissa, exp)) => {
            out.push_str(mantissa);
            if !mantissa.contains('.') {
                out.push_str(".0");
            }
            out.push('e');
            if !exp.starts_with('-') {
                out.push('+');
            }
            out.push_str(exp);
        }
        None => out.push_str(&text),
    }
}

pub(crate) fn write_string(out: &mut String, s: &str) {
    out.reserve(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
}

fn write_object(out: &mut String, id: i64) {
    out.push('#');
    write_integer(out, id);
}

fn write_seq<'a, T: ToLiteral + 'a>(out: &mut String, items: impl IntoIterator<Item = &'a T>) {
    out.push('{');
    for (i, item) in items.into_iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        item.write_literal(out);
    }
    out.push('}');
}

impl ToLiteral for Value {
    fn write_literal(&self, out: &mut String) {
        match self {
            Value::Integer(v) => write_integer(out, *v),
            Value::Float(v) => write_float(out, *v),
            Value::Str(s) => write_string(out, s),
            Value::ObjectRef(id) => write_object(out, *id),
            Value::ErrorAtom(name) => out.push_str(name),
            Value::List(items) => write_seq(out, items),
            Value::Map(map) => map.write_literal(out),
        }
    }
}

impl ToLiteral for Key {
    fn write_literal(&self, out: &mut String) {
        match self {
            Key::Integer(v) => write_integer(out, *v),
            Key::Float(v) => write_float(out, *v),
            Key::Str(s) => write_string(out, s),
            Key::ObjectRef(id) => write_object(out, *id),
            Key::ErrorAtom(name) => out.push_str(name),
        }
    }
}

impl ToLiteral for Map {
    fn write_literal(&self, out: &mut String) {
        out.push('[');
        for (i, (key, value)) in self.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            key.write_literal(out);
            out.push_str(" -> ");
            value.write_literal(out);
        }
        out.push(']');
    }
}

impl ToLiteral for i64 {
    fn write_literal(&self, out: &mut String) {
        write_integer(out, *self);
    }
}

impl ToLiteral for i32 {
    fn write_literal(&self, out: &mut String) {
        write_integer(out, i64::from(*self));
    }
}

impl ToLiteral for u32 {
    fn write_literal(&self, out: &mut String) {
        write_integer(out, i64::from(*self));
    }
}

impl ToLiteral for f64 {
    fn write_literal(&self, out: &mut String) {
        write_float(out, *self);
    }
}

impl ToLiteral for str {
    fn write_literal(&self, out: &mut String) {
        write_string(out, self);
    }
}

impl ToLiteral for String {
    fn write_literal(&self, out: &mut String) {
        write_string(out, self);
    }
}

impl<T: ToLiteral> ToLiteral for [T] {
    fn write_literal(&self, out: &mut String) {
        write_seq(out, self);
    }
}

impl<T: ToLiteral> ToLiteral for Vec<T> {
    fn write_literal(&self, out: &mut String) {
        write_seq(out, self);
    }
}

impl<T: ToLiteral + ?Sized> ToLiteral for &T {
    fn write_literal(&self, out: &mut String) {
        (**self).write_literal(out);
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_literal())
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_literal())
    }
}
