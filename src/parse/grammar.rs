use std::time::Duration;

use winnow::ascii::{digit1, space0};
use winnow::combinator::{alt, cut_err, delimited, opt};
use winnow::error::{ModalResult, StrContext, StrContextValue};
use winnow::prelude::*;

// -- Numbers ----------------------------------------------------------------

fn magnitude(input: &mut &str) -> ModalResult<f64> {
    (digit1, opt(('.', digit1)))
        .take()
        .try_map(|s: &str| s.parse::<f64>())
        .context(StrContext::Expected(StrContextValue::Description("number")))
        .parse_next(input)
}

// -- Units ------------------------------------------------------------------

/// Nanoseconds per unit. Two-letter units come first so `ms` is not read as
/// minutes followed by a stray `s`.
fn unit(input: &mut &str) -> ModalResult<f64> {
    alt((
        "ns".value(1.0),
        "us".value(1e3),
        "ms".value(1e6),
        "s".value(1e9),
        "m".value(60.0 * 1e9),
        "h".value(3_600.0 * 1e9),
        "d".value(86_400.0 * 1e9),
    ))
    .context(StrContext::Expected(StrContextValue::Description(
        "unit (ns, us, ms, s, m, h, d)",
    )))
    .parse_next(input)
}

// -- Duration ---------------------------------------------------------------

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(super) fn duration(input: &mut &str) -> ModalResult<Duration> {
    let (value, scale) = delimited(space0, (magnitude, space0, cut_err(unit)), space0)
        .map(|(value, _, scale)| (value, scale))
        .parse_next(input)?;
    Ok(Duration::from_nanos((value * scale).round() as u64))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::parse::parse_duration;

    #[test]
    fn whole_units() {
        assert_eq!(parse_duration("1ms").unwrap(), Duration::from_millis(1));
        assert_eq!(parse_duration("10s").unwrap(), Duration::from_secs(10));
        assert_eq!(parse_duration("5m").unwrap(), Duration::from_secs(300));
        assert_eq!(parse_duration("2h").unwrap(), Duration::from_secs(7_200));
        assert_eq!(parse_duration("1d").unwrap(), Duration::from_secs(86_400));
        assert_eq!(parse_duration("250us").unwrap(), Duration::from_micros(250));
        assert_eq!(parse_duration("7ns").unwrap(), Duration::from_nanos(7));
    }

    #[test]
    fn fractional_values() {
        assert_eq!(parse_duration("1.5s").unwrap(), Duration::from_millis(1_500));
        assert_eq!(parse_duration("0.5ms").unwrap(), Duration::from_micros(500));
    }

    #[test]
    fn surrounding_and_inner_whitespace() {
        assert_eq!(parse_duration(" 3 s ").unwrap(), Duration::from_secs(3));
    }

    #[test]
    fn missing_unit_fails() {
        assert!(parse_duration("10").is_err());
    }

    #[test]
    fn unknown_unit_fails() {
        assert!(parse_duration("10 weeks").is_err());
        assert!(parse_duration("10sx").is_err());
    }

    #[test]
    fn negative_or_empty_fails() {
        assert!(parse_duration("-1s").is_err());
        assert!(parse_duration("").is_err());
        assert!(parse_duration("ms").is_err());
    }
}
