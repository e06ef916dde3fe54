//! The MOO value model.
//!
//! A [`Value`] is the datum exchanged with the server. Maps are keyed by
//! [`Key`], which admits only the scalar variants, so a list or map can
//! never end up as a map key.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::collections::btree_map;

/// Well-known error atom names.
pub mod errors {
    pub const E_NONE: &str = "E_NONE";
    pub const E_TYPE: &str = "E_TYPE";
    pub const E_DIV: &str = "E_DIV";
    pub const E_PERM: &str = "E_PERM";
    pub const E_PROPNF: &str = "E_PROPNF";
    pub const E_VERBNF: &str = "E_VERBNF";
    pub const E_VARNF: &str = "E_VARNF";
    pub const E_INVIND: &str = "E_INVIND";
    pub const E_RECMOVE: &str = "E_RECMOVE";
    pub const E_MAXREC: &str = "E_MAXREC";
    pub const E_RANGE: &str = "E_RANGE";
    pub const E_ARGS: &str = "E_ARGS";
    pub const E_NACC: &str = "E_NACC";
    pub const E_INVARG: &str = "E_INVARG";
    pub const E_QUOTA: &str = "E_QUOTA";
    pub const E_FLOAT: &str = "E_FLOAT";
    pub const E_FILE: &str = "E_FILE";
    pub const E_EXEC: &str = "E_EXEC";
    pub const E_INTRPT: &str = "E_INTRPT";
}

/// A MOO value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// 64-bit signed integer.
    Integer(i64),
    /// Double precision float.
    Float(f64),
    /// Text string, unescaped.
    Str(String),
    /// Reference to an object by id. Not resolved or validated.
    ObjectRef(i64),
    /// Symbolic error code such as `E_PERM`, compared by name.
    ErrorAtom(String),
    /// Ordered sequence of values.
    List(Vec<Value>),
    /// Association from scalar keys to values.
    Map(Map),
}

impl Value {
    /// Creates an error atom value.
    pub fn error(name: impl Into<String>) -> Self {
        Value::ErrorAtom(name.into())
    }

    /// Creates an object reference value.
    pub fn object(id: i64) -> Self {
        Value::ObjectRef(id)
    }

    /// Name of this value's type as the server spells it.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "INT",
            Value::Float(_) => "FLOAT",
            Value::Str(_) => "STR",
            Value::ObjectRef(_) => "OBJ",
            Value::ErrorAtom(_) => "ERR",
            Value::List(_) => "LIST",
            Value::Map(_) => "MAP",
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<i64> {
        match self {
            Value::ObjectRef(id) => Some(*id),
            _ => None,
        }
    }

    /// Returns the error atom name, if this is an error atom.
    pub fn as_error(&self) -> Option<&str> {
        match self {
            Value::ErrorAtom(name) => Some(name),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Returns true if this is the error atom with the given name.
    pub fn is_error(&self, name: &str) -> bool {
        self.as_error() == Some(name)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v.into())
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl From<Map> for Value {
    fn from(map: Map) -> Self {
        Value::Map(map)
    }
}

impl From<Key> for Value {
    fn from(key: Key) -> Self {
        match key {
            Key::Integer(v) => Value::Integer(v),
            Key::Float(v) => Value::Float(v),
            Key::Str(s) => Value::Str(s),
            Key::ObjectRef(id) => Value::ObjectRef(id),
            Key::ErrorAtom(name) => Value::ErrorAtom(name),
        }
    }
}

/// A map key: any scalar value.
///
/// Keys are totally ordered the way the server enumerates map keys:
/// numbers first (integers and floats together, ascending, with the
/// integer first on a numeric tie), then object references, then strings,
/// then error atoms.
#[derive(Debug, Clone)]
pub enum Key {
    Integer(i64),
    Float(f64),
    Str(String),
    ObjectRef(i64),
    ErrorAtom(String),
}

impl Key {
    fn rank(&self) -> u8 {
        match self {
            Key::Integer(_) | Key::Float(_) => 0,
            Key::ObjectRef(_) => 1,
            Key::Str(_) => 2,
            Key::ErrorAtom(_) => 3,
        }
    }
}

/// Orders floats by numeric value, so `-0.0` and `0.0` are the same key.
/// NaN sorts after every number.
fn cmp_float(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b)
        .unwrap_or_else(|| a.is_nan().cmp(&b.is_nan()))
}

/// Orders an integer against a float by numeric value. NaN sorts last.
fn cmp_int_float(i: i64, f: f64) -> Ordering {
    match (i as f64).partial_cmp(&f) {
        Some(Ordering::Greater) => Ordering::Greater,
        Some(_) | None => Ordering::Less,
    }
}

impl Ord for Key {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Key::Integer(a), Key::Integer(b)) => a.cmp(b),
            (Key::Float(a), Key::Float(b)) => cmp_float(*a, *b),
            (Key::Integer(a), Key::Float(b)) => cmp_int_float(*a, *b),
            (Key::Float(a), Key::Integer(b)) => cmp_int_float(*b, *a).reverse(),
            (Key::ObjectRef(a), Key::ObjectRef(b)) => a.cmp(b),
            (Key::Str(a), Key::Str(b)) => a.cmp(b),
            (Key::ErrorAtom(a), Key::ErrorAtom(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for Key {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Key {}

impl TryFrom<Value> for Key {
    /// The rejected list or map is handed back.
    type Error = Value;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Integer(v) => Ok(Key::Integer(v)),
            Value::Float(v) => Ok(Key::Float(v)),
            Value::Str(s) => Ok(Key::Str(s)),
            Value::ObjectRef(id) => Ok(Key::ObjectRef(id)),
            Value::ErrorAtom(name) => Ok(Key::ErrorAtom(name)),
            other @ (Value::List(_) | Value::Map(_)) => Err(other),
        }
    }
}

impl From<i64> for Key {
    fn from(v: i64) -> Self {
        Key::Integer(v)
    }
}

impl From<i32> for Key {
    fn from(v: i32) -> Self {
        Key::Integer(v.into())
    }
}

impl From<f64> for Key {
    fn from(v: f64) -> Self {
        Key::Float(v)
    }
}

impl From<&str> for Key {
    fn from(v: &str) -> Self {
        Key::Str(v.to_string())
    }
}

impl From<String> for Key {
    fn from(v: String) -> Self {
        Key::Str(v)
    }
}

/// A MOO map.
///
/// Equality ignores insertion order. Iteration yields entries in the
/// canonical key order described on [`Key`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Map {
    entries: BTreeMap<Key, Value>,
}

impl Map {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an entry, returning the previous value for the key.
    pub fn insert(&mut self, key: impl Into<Key>, value: impl Into<Value>) -> Option<Value> {
        self.entries.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &Key) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn remove(&mut self, key: &Key) -> Option<Value> {
        self.entries.remove(key)
    }

    pub fn contains_key(&self, key: &Key) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.entries.keys()
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.values()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, Key, Value> {
        self.entries.iter()
    }
}

impl<K: Into<Key>, V: Into<Value>> FromIterator<(K, V)> for Map {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Map::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl<'a> IntoIterator for &'a Map {
    type Item = (&'a Key, &'a Value);
    type IntoIter = btree_map::Iter<'a, Key, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl IntoIterator for Map {
    type Item = (Key, Value);
    type IntoIter = btree_map::IntoIter<Key, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
