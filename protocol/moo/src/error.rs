//! Parse error types.

/// Errors produced while parsing a MOO value literal.
///
/// Positions are byte offsets into the input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// Input ended in the middle of a value.
    #[error("unexpected end of input")]
    UnexpectedEnd,
    /// A character that does not start or continue any literal.
    #[error("unexpected {found:?} at offset {pos}")]
    Unexpected { pos: usize, found: char },
    /// A numeric literal that is out of range for its type.
    #[error("invalid number {text:?} at offset {pos}")]
    InvalidNumber { pos: usize, text: String },
    /// A list or map used as a map key.
    #[error("map key at offset {pos} must not be a list or map")]
    InvalidMapKey { pos: usize },
    /// A complete value followed by more non-whitespace input.
    #[error("trailing input at offset {pos}")]
    TrailingInput { pos: usize },
    /// Lists and maps nested deeper than the configured limit.
    #[error("nesting exceeds maximum depth of {depth}")]
    TooDeep { depth: usize },
}
