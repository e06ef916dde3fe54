#![no_main]

use libfuzzer_sys::fuzz_target;
use protocol_moo::{ToLiteral, Value};

/// Check if a value contains any NaN floats (which don't compare equal to themselves).
fn contains_nan(value: &Value) -> bool {
    match value {
        Value::Float(f) => f.is_nan(),
        Value::List(items) => items.iter().any(contains_nan),
        Value::Map(map) => map.iter().any(|(k, v)| {
            contains_nan(&Value::from(k.clone())) || contains_nan(v)
        }),
        _ => false,
    }
}

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    // Try to parse the input as a MOO literal
    if let Ok(value) = protocol_moo::parse(text) {
        // Verify roundtrip: parse(encode(value)) == value
        let encoded = value.to_literal();
        let reparsed = protocol_moo::parse(&encoded).expect("encoded literal must parse");
        if !contains_nan(&value) {
            assert_eq!(value, reparsed);
        }

        // Encoding is canonical: a second pass produces the same text
        assert_eq!(encoded, reparsed.to_literal());
    }

    // The reply parser must never panic either
    let _ = protocol_moo::parse_reply(text);
});
