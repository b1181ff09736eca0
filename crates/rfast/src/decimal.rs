//! Decimal text conversion.
//!
//! A decimal value is `mantissa * 10^exponent` with an `i64` mantissa and an
//! `i16` exponent. Formatting and parsing are exact inverses for every pair:
//!
//! - exponents in `[-max_plain_scale, 0]` are written in plain notation and
//!   the fraction keeps exactly `-exponent` digits (`(1200, -2)` is `"12.00"`);
//! - all other exponents use `<mantissa>e<exponent>` (`(12, 2)` is `"12e2"`).
//!
//! The parser also accepts a fraction combined with an exponent
//! (`"1.5e3"` is `(15, 2)`), a leading `+`, and `E`.

use crate::error::DecimalParseError;
use crate::limits::DEFAULT_MAX_PLAIN_SCALE;

/// Largest exponent magnitude read before giving up on the exponent part.
const EXPONENT_DIGITS_CAP: i32 = 1_000_000;

/// Options for decimal formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecimalFormat {
    /// Largest number of fraction digits written in plain notation.
    pub max_plain_scale: u16,
}

impl Default for DecimalFormat {
    fn default() -> Self {
        Self {
            max_plain_scale: DEFAULT_MAX_PLAIN_SCALE,
        }
    }
}

impl DecimalFormat {
    /// Creates the default format.
    pub fn new() -> Self {
        Self::default()
    }

    /// Format that writes every non-zero exponent in `e` notation.
    pub fn scientific() -> Self {
        Self { max_plain_scale: 0 }
    }

    /// Formats `mantissa * 10^exponent`.
    pub fn format(&self, mantissa: i64, exponent: i16) -> String {
        let scale = -(exponent as i32);
        if exponent > 0 || scale > self.max_plain_scale as i32 {
            return format!("{}e{}", mantissa, exponent);
        }

        let scale = scale as usize;
        let digits = mantissa.unsigned_abs().to_string();
        let mut out = String::with_capacity(digits.len() + scale + 3);
        if mantissa < 0 {
            out.push('-');
        }
        if scale == 0 {
            out.push_str(&digits);
            return out;
        }

        if digits.len() <= scale {
            out.push('0');
            out.push('.');
            out.extend(std::iter::repeat_n('0', scale - digits.len()));
            out.push_str(&digits);
        } else {
            let (int_part, frac_part) = digits.split_at(digits.len() - scale);
            out.push_str(int_part);
            out.push('.');
            out.push_str(frac_part);
        }
        out
    }
}

/// Formats a decimal with the default [`DecimalFormat`].
pub fn format_decimal(mantissa: i64, exponent: i16) -> String {
    DecimalFormat::default().format(mantissa, exponent)
}

/// Parses decimal text into `(mantissa, exponent)`.
pub fn parse_decimal(s: &str) -> Result<(i64, i16), DecimalParseError> {
    if s.is_empty() {
        return Err(DecimalParseError::Empty);
    }

    let mut chars = s.char_indices().peekable();
    let negative = match chars.peek() {
        Some((_, '-')) => {
            chars.next();
            true
        }
        Some((_, '+')) => {
            chars.next();
            false
        }
        _ => false,
    };

    let mut magnitude: u64 = 0;
    let mut digits = 0usize;
    let mut scale: i32 = 0;
    let mut seen_point = false;
    let mut exponent_part: Option<i32> = None;

    while let Some((position, ch)) = chars.next() {
        match ch {
            '0'..='9' => {
                magnitude = magnitude
                    .checked_mul(10)
                    .and_then(|m| m.checked_add(u64::from(ch as u8 - b'0')))
                    .ok_or(DecimalParseError::MantissaOverflow)?;
                digits += 1;
                if seen_point {
                    scale += 1;
                }
            }
            '.' if !seen_point => seen_point = true,
            'e' | 'E' => {
                exponent_part = Some(parse_exponent(&mut chars)?);
                break;
            }
            _ => return Err(DecimalParseError::InvalidCharacter { ch, position }),
        }
    }

    if digits == 0 {
        return Err(DecimalParseError::MissingDigits);
    }

    let mantissa = if negative {
        if magnitude > i64::MIN.unsigned_abs() {
            return Err(DecimalParseError::MantissaOverflow);
        }
        (magnitude as i64).wrapping_neg()
    } else {
        i64::try_from(magnitude).map_err(|_| DecimalParseError::MantissaOverflow)?
    };

    let exponent = exponent_part.unwrap_or(0) - scale;
    let exponent = i16::try_from(exponent).map_err(|_| DecimalParseError::ExponentOverflow)?;
    Ok((mantissa, exponent))
}

fn parse_exponent(
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
) -> Result<i32, DecimalParseError> {
    let negative = match chars.peek() {
        Some((_, '-')) => {
            chars.next();
            true
        }
        Some((_, '+')) => {
            chars.next();
            false
        }
        _ => false,
    };

    let mut value: i32 = 0;
    let mut digits = 0usize;
    for (position, ch) in chars {
        match ch.to_digit(10) {
            Some(d) => {
                value = value * 10 + d as i32;
                if value > EXPONENT_DIGITS_CAP {
                    return Err(DecimalParseError::ExponentOverflow);
                }
                digits += 1;
            }
            None => return Err(DecimalParseError::InvalidCharacter { ch, position }),
        }
    }

    if digits == 0 {
        return Err(DecimalParseError::MissingDigits);
    }
    Ok(if negative { -value } else { value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_format_plain() {
        assert_eq!(format_decimal(-12345, -3), "-12.345");
        assert_eq!(format_decimal(12345, 0), "12345");
        assert_eq!(format_decimal(1200, -2), "12.00");
        assert_eq!(format_decimal(5, -3), "0.005");
        assert_eq!(format_decimal(-5, -1), "-0.5");
        assert_eq!(format_decimal(0, -2), "0.00");
        assert_eq!(format_decimal(0, 0), "0");
        assert_eq!(
            format_decimal(i64::MIN, -3),
            "-9223372036854775.808"
        );
    }

    #[test]
    fn test_format_scientific() {
        assert_eq!(format_decimal(12, 2), "12e2");
        assert_eq!(format_decimal(-7, i16::MAX), "-7e32767");
        assert_eq!(format_decimal(5, -21), "5e-21");
        assert_eq!(DecimalFormat::scientific().format(5, -1), "5e-1");
        assert_eq!(DecimalFormat::scientific().format(5, 0), "5");
    }

    #[test]
    fn test_parse() {
        assert_eq!(parse_decimal("-12.345"), Ok((-12345, -3)));
        assert_eq!(parse_decimal("12.00"), Ok((1200, -2)));
        assert_eq!(parse_decimal("+0.5"), Ok((5, -1)));
        assert_eq!(parse_decimal(".5"), Ok((5, -1)));
        assert_eq!(parse_decimal("5."), Ok((5, 0)));
        assert_eq!(parse_decimal("12e2"), Ok((12, 2)));
        assert_eq!(parse_decimal("1.5E3"), Ok((15, 2)));
        assert_eq!(parse_decimal("1.25e-2"), Ok((125, -4)));
        assert_eq!(
            parse_decimal("-9223372036854775808"),
            Ok((i64::MIN, 0))
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse_decimal(""), Err(DecimalParseError::Empty));
        assert_eq!(parse_decimal("-"), Err(DecimalParseError::MissingDigits));
        assert_eq!(parse_decimal("."), Err(DecimalParseError::MissingDigits));
        assert_eq!(parse_decimal("1e"), Err(DecimalParseError::MissingDigits));
        assert_eq!(
            parse_decimal("1.2.3"),
            Err(DecimalParseError::InvalidCharacter { ch: '.', position: 3 })
        );
        assert_eq!(
            parse_decimal("12x"),
            Err(DecimalParseError::InvalidCharacter { ch: 'x', position: 2 })
        );
        assert_eq!(
            parse_decimal("9223372036854775808"),
            Err(DecimalParseError::MantissaOverflow)
        );
        assert_eq!(
            parse_decimal("99999999999999999999"),
            Err(DecimalParseError::MantissaOverflow)
        );
        assert_eq!(parse_decimal("1e32768"), Err(DecimalParseError::ExponentOverflow));
        assert_eq!(parse_decimal("1e99999999"), Err(DecimalParseError::ExponentOverflow));
    }

    #[test]
    fn test_extreme_exponents_roundtrip() {
        for (m, e) in [(1, i16::MIN), (-1, i16::MAX), (i64::MAX, -20), (i64::MIN, -19)] {
            assert_eq!(parse_decimal(&format_decimal(m, e)), Ok((m, e)));
        }
    }

    proptest! {
        #[test]
        fn prop_text_roundtrip(m in any::<i64>(), e in any::<i16>()) {
            prop_assert_eq!(parse_decimal(&format_decimal(m, e)), Ok((m, e)));
        }

        #[test]
        fn prop_text_roundtrip_any_scale(m in any::<i64>(), e in any::<i16>(), scale in 0u16..=400) {
            let format = DecimalFormat { max_plain_scale: scale };
            prop_assert_eq!(parse_decimal(&format.format(m, e)), Ok((m, e)));
        }
    }
}
