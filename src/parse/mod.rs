mod error;
mod grammar;

use std::time::Duration;

pub use error::ParseError;

/// Parse a duration such as `1ms`, `1.5s` or `10 m`.
///
/// Supported units are `ns`, `us`, `ms`, `s`, `m`, `h` and `d`.
///
/// # Errors
///
/// Returns [`ParseError`] if the input is not a number followed by a unit.
pub fn parse_duration(input: &str) -> Result<Duration, ParseError> {
    use winnow::Parser;
    grammar::duration
        .parse(input)
        .map_err(|e| ParseError::from_winnow(&e))
}
