//! Recursive-descent parser for MOO value literals.
//!
//! Grammar, tried in this order at each value position:
//!
//! ```text
//! expr     = map | list | string | objref | number | error
//! map      = "[" "]" | "[" expr "->" expr ("," expr "->" expr)* "]"
//! list     = "{" "}" | "{" expr ("," expr)* "}"
//! string   = '"' ( "\" any | not-quote )* '"'
//! objref   = "#" sign? digit+
//! number   = float | integer
//! float    = sign? digit* "." digit+ exp? | sign? digit+ "." digit* exp?
//! integer  = sign? digit+
//! exp      = ("e" | "E") sign? digit+
//! error    = "E_" upper+
//! ```
//!
//! Whitespace may appear between tokens. The alternatives start with
//! disjoint characters, so the ordered choice is decided by one byte of
//! lookahead.

use crate::error::ParseError;
use crate::value::{Key, Value};

/// Default bound on list/map nesting.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Limits applied while parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Maximum number of nested lists and maps.
    pub max_depth: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ParseOptions {
    /// Set the maximum nesting depth. Deeper input fails with
    /// [`ParseError::TooDeep`].
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

/// Parse `input` as exactly one value literal using default limits.
///
/// Leading and trailing whitespace is ignored; anything else after the
/// value is an error.
pub fn parse(input: &str) -> Result<Value, ParseError> {
    parse_with_options(input, &ParseOptions::default())
}

/// Parse `input` as exactly one value literal.
pub fn parse_with_options(input: &str, options: &ParseOptions) -> Result<Value, ParseError> {
    let mut cursor = Cursor::new(input, options.max_depth);
    cursor.skip_ws();
    let value = cursor.expr(0)?;
    cursor.skip_ws();
    if !cursor.at_end() {
        return Err(ParseError::TrailingInput { pos: cursor.pos });
    }
    Ok(value)
}

/// Parse a command reply that is either a plain literal or a runtime
/// error report.
///
/// Error reports have the shape `{2, {E_XXX, "description", ...}}` and may
/// carry text after the error name that is not a valid literal. Those are
/// recognized from their prefix and decoded to the bare error atom without
/// running the full grammar. Anything else is handed to [`parse`].
pub fn parse_reply(input: &str) -> Result<Value, ParseError> {
    if let Some(name) = error_report(input) {
        return Ok(Value::ErrorAtom(name.to_string()));
    }
    parse(input)
}

/// Returns the error name if `input` starts like `{2, {E_XXX,`.
fn error_report(input: &str) -> Option<&str> {
    let rest = input.trim_start().strip_prefix('{')?;
    let rest = rest.trim_start().strip_prefix('2')?;
    let rest = rest.trim_start().strip_prefix(',')?;
    let rest = rest.trim_start().strip_prefix('{')?;
    let rest = rest.trim_start();

    let len = error_name_len(rest.as_bytes())?;
    match rest[len..].trim_start().as_bytes().first() {
        Some(b',') | Some(b'}') => Some(&rest[..len]),
        _ => None,
    }
}

/// Length of an `E_UPPER+` error name at the start of `bytes`.
fn error_name_len(bytes: &[u8]) -> Option<usize> {
    if !bytes.starts_with(b"E_") {
        return None;
    }
    let letters = bytes[2..]
        .iter()
        .take_while(|b| b.is_ascii_uppercase())
        .count();
    (letters > 0).then_some(2 + letters)
}

struct Cursor<'a> {
    input: &'a str,
    pos: usize,
    max_depth: usize,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str, max_depth: usize) -> Self {
        Self {
            input,
            pos: 0,
            max_depth,
        }
    }

    #[inline]
    fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    #[inline]
    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    #[inline]
    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(b) if b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    /// Error for whatever sits at the current position.
    fn unexpected(&self) -> ParseError {
        match self.rest().chars().next() {
            Some(found) => ParseError::Unexpected {
                pos: self.pos,
                found,
            },
            None => ParseError::UnexpectedEnd,
        }
    }

    fn digits(&mut self) -> usize {
        let start = self.pos;
        while matches!(self.peek(), Some(b'0'..=b'9')) {
            self.pos += 1;
        }
        self.pos - start
    }

    fn sign(&mut self) {
        if matches!(self.peek(), Some(b'+' | b'-')) {
            self.pos += 1;
        }
    }

    fn expr(&mut self, depth: usize) -> Result<Value, ParseError> {
        match self.peek() {
            Some(b'[') => self.map(depth),
            Some(b'{') => self.list(depth),
            Some(b'"') => self.string(),
            Some(b'#') => self.object_ref(),
            Some(b'+' | b'-' | b'.' | b'0'..=b'9') => self.number(),
            Some(b'E') => self.error_atom(),
            _ => Err(self.unexpected()),
        }
    }

    fn enter(&self, depth: usize) -> Result<(), ParseError> {
        if depth >= self.max_depth {
            return Err(ParseError::TooDeep {
                depth: self.max_depth,
            });
        }
        Ok(())
    }

    /// Parse comma separated elements up to `close`, after the opening
    /// bracket has been consumed. Zero, one, or many elements all come back
    /// as the same `Vec`.
    fn sequence<T>(
        &mut self,
        close: u8,
        mut element: impl FnMut(&mut Self) -> Result<T, ParseError>,
    ) -> Result<Vec<T>, ParseError> {
        let mut items = Vec::new();
        self.skip_ws();
        if self.peek() == Some(close) {
            self.pos += 1;
            return Ok(items);
        }
        loop {
            self.skip_ws();
            items.push(element(self)?);
            self.skip_ws();
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(c) if c == close => {
                    self.pos += 1;
                    return Ok(items);
                }
                _ => return Err(self.unexpected()),
            }
        }
    }

    fn list(&mut self, depth: usize) -> Result<Value, ParseError> {
        self.enter(depth)?;
        self.pos += 1;
        let items = self.sequence(b'}', |c| c.expr(depth + 1))?;
        Ok(Value::List(items))
    }

    fn map(&mut self, depth: usize) -> Result<Value, ParseError> {
        self.enter(depth)?;
        self.pos += 1;
        let entries = self.sequence(b']', |c| c.entry(depth + 1))?;
        Ok(Value::Map(entries.into_iter().collect()))
    }

    fn entry(&mut self, depth: usize) -> Result<(Key, Value), ParseError> {
        let key_pos = self.pos;
        let key = Key::try_from(self.expr(depth)?)
            .map_err(|_| ParseError::InvalidMapKey { pos: key_pos })?;
        self.skip_ws();
        if !self.rest().starts_with("->") {
            return Err(self.unexpected());
        }
        self.pos += 2;
        self.skip_ws();
        let value = self.expr(depth)?;
        Ok((key, value))
    }

    fn string(&mut self) -> Result<Value, ParseError> {
        self.pos += 1;
        let start = self.pos;
        let mut out = String::new();
        let mut chars = self.rest().char_indices();
        loop {
            match chars.next() {
                Some((i, '"')) => {
                    self.pos = start + i + 1;
                    return Ok(Value::Str(out));
                }
                Some((_, '\\')) => match chars.next() {
                    Some((_, c)) => out.push(c),
                    None => break,
                },
                Some((_, c)) => out.push(c),
                None => break,
            }
        }
        self.pos = self.input.len();
        Err(ParseError::UnexpectedEnd)
    }

    fn object_ref(&mut self) -> Result<Value, ParseError> {
        self.pos += 1;
        let start = self.pos;
        self.sign();
        if self.digits() == 0 {
            return Err(self.unexpected());
        }
        let text = &self.input[start..self.pos];
        text.parse::<i64>()
            .map(Value::ObjectRef)
            .map_err(|_| ParseError::InvalidNumber {
                pos: start,
                text: text.to_string(),
            })
    }

    fn number(&mut self) -> Result<Value, ParseError> {
        let start = self.pos;
        self.sign();
        let int_digits = self.digits();

        let mut is_float = false;
        if self.peek() == Some(b'.') {
            let dot = self.pos;
            self.pos += 1;
            let frac_digits = self.digits();
            if int_digits == 0 && frac_digits == 0 {
                self.pos = dot;
            } else {
                is_float = true;
            }
        }

        if !is_float {
            if int_digits == 0 {
                return Err(self.unexpected());
            }
            let text = &self.input[start..self.pos];
            return text
                .parse::<i64>()
                .map(Value::Integer)
                .map_err(|_| ParseError::InvalidNumber {
                    pos: start,
                    text: text.to_string(),
                });
        }

        self.exponent();
        let text = &self.input[start..self.pos];
        match text.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(Value::Float(v)),
            _ => Err(ParseError::InvalidNumber {
                pos: start,
                text: text.to_string(),
            }),
        }
    }

    /// Consume an exponent if a complete one is present.
    fn exponent(&mut self) {
        if !matches!(self.peek(), Some(b'e' | b'E')) {
            return;
        }
        let mark = self.pos;
        self.pos += 1;
        self.sign();
        if self.digits() == 0 {
            self.pos = mark;
        }
    }

    fn error_atom(&mut self) -> Result<Value, ParseError> {
        match error_name_len(self.rest().as_bytes()) {
            Some(len) => {
                let name = &self.input[self.pos..self.pos + len];
                self.pos += len;
                Ok(Value::ErrorAtom(name.to_string()))
            }
            None => Err(self.unexpected()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Map;

    #[test]
    fn test_parse_integers() {
        assert_eq!(parse("42"), Ok(Value::Integer(42)));
        assert_eq!(parse("-7"), Ok(Value::Integer(-7)));
        assert_eq!(parse("+3"), Ok(Value::Integer(3)));
        assert_eq!(parse("  0  "), Ok(Value::Integer(0)));
        assert_eq!(
            parse("-9223372036854775808"),
            Ok(Value::Integer(i64::MIN))
        );
    }

    #[test]
    fn test_parse_integer_overflow() {
        assert!(matches!(
            parse("9223372036854775808"),
            Err(ParseError::InvalidNumber { pos: 0, .. })
        ));
    }

    #[test]
    fn test_parse_floats() {
        assert_eq!(parse("1.5"), Ok(Value::Float(1.5)));
        assert_eq!(parse(".5"), Ok(Value::Float(0.5)));
        assert_eq!(parse("-.25"), Ok(Value::Float(-0.25)));
        assert_eq!(parse("3."), Ok(Value::Float(3.0)));
        assert_eq!(parse("1.0e+30"), Ok(Value::Float(1e30)));
        assert_eq!(parse("2.5E-3"), Ok(Value::Float(0.0025)));
        assert_eq!(parse("1.0e3"), Ok(Value::Float(1000.0)));
    }

    #[test]
    fn test_parse_float_overflow() {
        assert!(matches!(
            parse("1.0e999"),
            Err(ParseError::InvalidNumber { .. })
        ));
    }

    #[test]
    fn test_parse_incomplete_exponent_is_trailing() {
        assert_eq!(parse("1.5e"), Err(ParseError::TrailingInput { pos: 3 }));
        assert_eq!(parse("1e5"), Err(ParseError::TrailingInput { pos: 1 }));
    }

    #[test]
    fn test_parse_lone_dot() {
        assert_eq!(
            parse("."),
            Err(ParseError::Unexpected { pos: 0, found: '.' })
        );
        assert_eq!(parse("-"), Err(ParseError::UnexpectedEnd));
    }

    #[test]
    fn test_parse_object_refs() {
        assert_eq!(parse("#0"), Ok(Value::ObjectRef(0)));
        assert_eq!(parse("#-1"), Ok(Value::ObjectRef(-1)));
        assert_eq!(parse("#123"), Ok(Value::ObjectRef(123)));
        assert_eq!(
            parse("#x"),
            Err(ParseError::Unexpected { pos: 1, found: 'x' })
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse("E_PERM"), Ok(Value::error("E_PERM")));
        assert_eq!(parse("E_INVARG"), Ok(Value::error("E_INVARG")));
        assert!(parse("E_").is_err());
        assert!(parse("E_perm").is_err());
        assert!(parse("EPERM").is_err());
    }

    #[test]
    fn test_parse_strings() {
        assert_eq!(parse(r#""""#), Ok(Value::from("")));
        assert_eq!(parse(r#""hello world""#), Ok(Value::from("hello world")));
        assert_eq!(parse(r#""a\"b\\c""#), Ok(Value::from("a\"b\\c")));
        assert_eq!(parse(r#""\x""#), Ok(Value::from("x")));
        assert_eq!(parse(r#""bytes ~0A~FF""#), Ok(Value::from("bytes ~0A~FF")));
        assert_eq!(parse("\"naïve\""), Ok(Value::from("naïve")));
    }

    #[test]
    fn test_parse_unterminated_string() {
        assert_eq!(parse(r#""abc"#), Err(ParseError::UnexpectedEnd));
        assert_eq!(parse(r#""abc\"#), Err(ParseError::UnexpectedEnd));
    }

    #[test]
    fn test_parse_lists() {
        assert_eq!(parse("{}"), Ok(Value::List(vec![])));
        assert_eq!(parse("{ }"), Ok(Value::List(vec![])));
        assert_eq!(parse("{1}"), Ok(Value::from(vec![1])));
        assert_eq!(
            parse(r#"{1, "two", #3, E_TYPE, 4.0}"#),
            Ok(Value::List(vec![
                Value::Integer(1),
                Value::from("two"),
                Value::ObjectRef(3),
                Value::error("E_TYPE"),
                Value::Float(4.0),
            ]))
        );
        assert_eq!(
            parse("{{}, {{}}}"),
            Ok(Value::List(vec![
                Value::List(vec![]),
                Value::List(vec![Value::List(vec![])]),
            ]))
        );
    }

    #[test]
    fn test_parse_list_malformed() {
        assert_eq!(parse("{1,}"), Err(ParseError::Unexpected { pos: 3, found: '}' }));
        assert_eq!(parse("{1 2}"), Err(ParseError::Unexpected { pos: 3, found: '2' }));
        assert_eq!(parse("{1"), Err(ParseError::UnexpectedEnd));
        assert_eq!(parse("{1}}"), Err(ParseError::TrailingInput { pos: 3 }));
    }

    #[test]
    fn test_parse_maps() {
        assert_eq!(parse("[]"), Ok(Value::Map(Map::new())));

        let mut one = Map::new();
        one.insert("a", 1);
        assert_eq!(parse(r#"["a" -> 1]"#), Ok(Value::Map(one)));

        let mut two = Map::new();
        two.insert(Key::ObjectRef(1), "x");
        two.insert(Key::ErrorAtom("E_ARGS".into()), Value::List(vec![]));
        assert_eq!(parse(r#"[#1->"x",E_ARGS->{}]"#), Ok(Value::Map(two)));
    }

    #[test]
    fn test_parse_map_duplicate_key_last_wins() {
        let value = parse("[1 -> 1, 1 -> 2]").unwrap();
        let map = value.as_map().unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(&Key::Integer(1)), Some(&Value::Integer(2)));
    }

    #[test]
    fn test_parse_map_signed_zero_keys_collapse() {
        let value = parse("[0.0 -> 1, -0.0 -> 2]").unwrap();
        let map = value.as_map().unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(&Key::Float(-0.0)), Some(&Value::Integer(2)));
        assert_eq!(parse("[0.0 -> 1]").unwrap(), parse("[-0.0 -> 1]").unwrap());
    }

    #[test]
    fn test_parse_map_rejects_collection_keys() {
        assert_eq!(
            parse("[{} -> 1]"),
            Err(ParseError::InvalidMapKey { pos: 1 })
        );
        assert_eq!(
            parse("[1 -> 1, [] -> 2]"),
            Err(ParseError::InvalidMapKey { pos: 9 })
        );
    }

    #[test]
    fn test_parse_map_missing_arrow() {
        assert_eq!(
            parse("[1 : 2]"),
            Err(ParseError::Unexpected { pos: 3, found: ':' })
        );
        assert_eq!(
            parse("[1 - 2]"),
            Err(ParseError::Unexpected { pos: 3, found: '-' })
        );
    }

    #[test]
    fn test_map_equality_and_canonical_order() {
        let a = parse("[3 -> 3, 1 -> 1, 2 -> 2]").unwrap();
        let b = parse("[1 -> 1, 2 -> 2, 3 -> 3]").unwrap();
        assert_eq!(a, b);

        let Value::Map(mut map) = parse("[3->3,1->1,4->4,5->5,9->9,2->2]").unwrap() else {
            panic!("expected map");
        };
        map.insert("a", "a");
        map.insert(6, 6);
        let keys: Vec<Key> = map.keys().cloned().collect();
        assert_eq!(
            keys,
            vec![
                Key::Integer(1),
                Key::Integer(2),
                Key::Integer(3),
                Key::Integer(4),
                Key::Integer(5),
                Key::Integer(6),
                Key::Integer(9),
                Key::Str("a".into()),
            ]
        );
    }

    #[test]
    fn test_deep_nesting_integrity() {
        let value = parse(
            r#"[#1 -> ["a" -> {}, "b" -> {}], #2 -> ["b" -> [E_ARGS -> [1.0 -> []]]], #3 -> []]"#,
        )
        .unwrap();
        let map = value.as_map().unwrap();
        assert_eq!(map.len(), 3);

        let first = map.get(&Key::ObjectRef(1)).and_then(Value::as_map).unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first.get(&Key::from("a")), Some(&Value::List(vec![])));
        assert_eq!(first.get(&Key::from("b")), Some(&Value::List(vec![])));

        let second = map.get(&Key::ObjectRef(2)).and_then(Value::as_map).unwrap();
        assert_eq!(second.len(), 1);
        let inner = second.get(&Key::from("b")).and_then(Value::as_map).unwrap();
        let errors = inner
            .get(&Key::ErrorAtom("E_ARGS".into()))
            .and_then(Value::as_map)
            .unwrap();
        assert_eq!(
            errors.get(&Key::Float(1.0)),
            Some(&Value::Map(Map::new()))
        );

        assert_eq!(map.get(&Key::ObjectRef(3)), Some(&Value::Map(Map::new())));
    }

    #[test]
    fn test_max_depth() {
        let options = ParseOptions::default().max_depth(2);
        assert!(parse_with_options("{{1}}", &options).is_ok());
        assert_eq!(
            parse_with_options("{{{1}}}", &options),
            Err(ParseError::TooDeep { depth: 2 })
        );
        assert_eq!(
            parse_with_options("[1 -> [2 -> [3 -> 4]]]", &options),
            Err(ParseError::TooDeep { depth: 2 })
        );

        let hostile = "{".repeat(10_000);
        assert_eq!(
            parse(&hostile),
            Err(ParseError::TooDeep {
                depth: DEFAULT_MAX_DEPTH
            })
        );
    }

    #[test]
    fn test_parse_empty_input() {
        assert_eq!(parse(""), Err(ParseError::UnexpectedEnd));
        assert_eq!(parse("   "), Err(ParseError::UnexpectedEnd));
    }

    #[test]
    fn test_parse_reply_error_report() {
        assert_eq!(
            parse_reply(r#"{2, {E_PERM, "Permission denied", ...}}"#),
            Ok(Value::error("E_PERM"))
        );
        assert_eq!(
            parse_reply(r#"{2,{E_INVARG}}"#),
            Ok(Value::error("E_INVARG"))
        );
    }

    #[test]
    fn test_parse_reply_falls_through() {
        assert_eq!(parse_reply("42"), Ok(Value::Integer(42)));
        assert_eq!(
            parse_reply("{2, 3}"),
            Ok(Value::from(vec![2, 3]))
        );
        assert_eq!(
            parse_reply(r#"{1, {E_PERM, "x"}}"#),
            Ok(Value::List(vec![
                Value::Integer(1),
                Value::List(vec![Value::error("E_PERM"), Value::from("x")]),
            ]))
        );
        // not an error name, so the full grammar runs and rejects it
        assert!(parse_reply(r#"{2, {E_perm, ...}}"#).is_err());
    }

    #[test]
    fn test_parse_reply_error_prefix_needs_separator() {
        assert!(error_report(r#"{2, {E_PERMX"#).is_none());
        assert_eq!(error_report(r#"{2, {E_PERM , "x"}}"#), Some("E_PERM"));
    }
}
