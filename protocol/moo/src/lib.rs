//! MOO value literal protocol.
//!
//! This crate decodes and encodes the textual value syntax a MOO server
//! uses when it prints values:
//! - integers `42`, floats `1.5` / `1.0e+30`
//! - strings `"a \"quoted\" word"`
//! - object references `#12`, error atoms `E_PERM`
//! - lists `{1, 2}` and maps `["key" -> "value"]`, nested arbitrarily
//!
//! # Example
//!
//! ```
//! use protocol_moo::{parse, Key, ToLiteral, Value};
//!
//! let value = parse(r#"[#1 -> {"a", E_PERM}]"#).unwrap();
//! let map = value.as_map().unwrap();
//! assert_eq!(
//!     map.get(&Key::ObjectRef(1)),
//!     Some(&Value::List(vec![Value::from("a"), Value::error("E_PERM")]))
//! );
//!
//! assert_eq!(value.to_literal(), r#"[#1 -> {"a", E_PERM}]"#);
//! ```

mod encode;
mod error;
mod parse;
mod value;

pub use encode::{Alias, ToLiteral};
pub use error::ParseError;
pub use parse::{DEFAULT_MAX_DEPTH, ParseOptions, parse, parse_reply, parse_with_options};
pub use value::{Key, Map, Value, errors};
