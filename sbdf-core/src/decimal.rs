//! IEEE-754 decimal128 codec.
//!
//! Decimals are 16 bytes on the wire, little-endian, in the decimal128
//! combination form: a 113-bit unscaled significand, a 14-bit biased exponent
//! (bias 6176, so scale = 6176 − biased_exponent) and a sign bit in the high
//! bit of byte 15.
//!
//! Short form (significand top bits != 11): byte 14 carries significand bit
//! 112 in its low bit and the exponent's low 7 bits shifted left one; byte 15
//! carries the exponent's high 7 bits and the sign. Extended form (byte 15
//! bits 5..6 = 11) packs the exponent across bytes 13..15 and leaves the top
//! significand bits implicitly 100 (binary). A valid write never produces the
//! extended form: any significand large enough to need it exceeds the 34-digit
//! cap. NaN combinations are refused on read.

use std::sync::LazyLock;

use bigdecimal::BigDecimal;
use num_bigint::{BigInt, BigUint, Sign};

use crate::error::{FormatError, Result, UsageError};

/// Width of a wire decimal in bytes.
pub const DECIMAL_WIDTH: usize = 16;

/// Exponent bias of the decimal128 form.
const EXPONENT_BIAS: i64 = 6176;

/// Largest supported unscaled magnitude: 34 decimal nines.
static MAX_SIGNIFICAND: LazyLock<BigUint> = LazyLock::new(|| {
    let ten = BigUint::from(10u32);
    let mut value = BigUint::from(1u32);
    for _ in 0..34 {
        value *= &ten;
    }
    value - 1u32
});

/// Encodes a decimal into its 16-byte wire form.
///
/// Negative scales are normalized to scale zero first (exact). Unscaled
/// magnitudes above 34 decimal digits are a usage error.
pub fn encode_decimal(value: &BigDecimal) -> Result<[u8; DECIMAL_WIDTH]> {
    let (mut unscaled, mut scale) = value.as_bigint_and_exponent();

    if scale < 0 {
        let mut factor = BigInt::from(1);
        let ten = BigInt::from(10);
        for _ in 0..(-scale) {
            factor *= &ten;
        }
        unscaled *= factor;
        scale = 0;
    }

    let exponent = EXPONENT_BIAS - scale;
    if !(0..=0x3fff).contains(&exponent) {
        return Err(UsageError::DecimalOutOfRange.into());
    }

    if unscaled.magnitude() > &*MAX_SIGNIFICAND {
        return Err(UsageError::DecimalOutOfRange.into());
    }

    let negative = unscaled.sign() == Sign::Minus;
    let (_, magnitude) = unscaled.to_bytes_le();

    let mut out = [0u8; DECIMAL_WIDTH];
    // The capped significand spans at most 15 little-endian bytes, with only
    // bit 112 reaching into byte 14.
    out[..magnitude.len()].copy_from_slice(&magnitude);

    out[14] |= ((exponent & 0x7f) as u8) << 1;
    out[15] = ((exponent >> 7) as u8 & 0x7f) | if negative { 0x80 } else { 0x00 };

    Ok(out)
}

/// Decodes a 16-byte wire decimal.
pub fn decode_decimal(bytes: &[u8; DECIMAL_WIDTH]) -> Result<BigDecimal> {
    let negative = bytes[15] & 0x80 != 0;

    let mut magnitude = [0u8; 15];
    magnitude.copy_from_slice(&bytes[..15]);

    let exponent = if bytes[15] & 0x60 == 0x60 {
        // extended combination form
        if bytes[15] & 0x78 == 0x78 {
            return Err(FormatError::DecimalNan.into());
        }
        magnitude[13] &= 0x7f;
        magnitude[14] = 0x02;
        (((bytes[15] & 0x1f) as i64) << 9) | ((bytes[14] as i64) << 1) | ((bytes[13] >> 7) as i64)
    } else {
        magnitude[14] &= 0x01;
        (((bytes[15] & 0x7f) as i64) << 7) | ((bytes[14] >> 1) as i64)
    };

    let scale = EXPONENT_BIAS - exponent;

    let mut unscaled = BigInt::from_bytes_le(Sign::Plus, &magnitude);
    if negative {
        unscaled = -unscaled;
    }

    Ok(BigDecimal::new(unscaled, scale))
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    // Reference byte patterns produced by peer implementations.
    #[test]
    fn golden_vectors() {
        let cases: &[(&str, [u8; 16])] = &[
            ("0", [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 64, 48]),
            ("0.1", [1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 62, 48]),
            (
                "0.0000000000000000000000000001",
                [1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 8, 48],
            ),
            (
                "0.00000000000000000000000000001",
                [1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 6, 48],
            ),
            ("1", [1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 64, 48]),
            (
                "79228162514264337593543950335",
                [
                    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0, 0,
                    64, 48,
                ],
            ),
            (
                "284987427729500.958188778798907905",
                [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 28, 48],
            ),
        ];

        for (text, expected) in cases {
            let value = dec(text);
            let encoded = encode_decimal(&value).unwrap();
            assert_eq!(&encoded, expected, "encoding {text}");
            let decoded = decode_decimal(expected).unwrap();
            assert_eq!(decoded, value, "decoding {text}");
        }
    }

    #[test]
    fn negative_values() {
        let value = dec("-123.123456789");
        let encoded = encode_decimal(&value).unwrap();
        assert_eq!(encoded[15] & 0x80, 0x80);
        assert_eq!(decode_decimal(&encoded).unwrap(), value);
    }

    #[test]
    fn negative_zero_on_wire_reads_as_zero() {
        let mut bytes = encode_decimal(&dec("0")).unwrap();
        bytes[15] |= 0x80;
        assert_eq!(decode_decimal(&bytes).unwrap(), dec("0"));
    }

    #[test]
    fn full_scale_range_round_trips() {
        for scale in 0..=34u32 {
            let value = BigDecimal::new(BigInt::from(1), scale as i64);
            let back = decode_decimal(&encode_decimal(&value).unwrap()).unwrap();
            assert_eq!(back, value, "scale {scale}");
        }
    }

    #[test]
    fn max_significand_round_trips() {
        let value = dec("9999999999999999999999999999999999");
        let back = decode_decimal(&encode_decimal(&value).unwrap()).unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn oversized_significand_rejected() {
        assert!(encode_decimal(&dec("10000000000000000000000000000000000")).is_err());
        assert!(encode_decimal(&dec("-10000000000000000000000000000000000")).is_err());
    }

    #[test]
    fn nan_combination_rejected() {
        let bytes: [u8; 16] = [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0x78];
        assert!(matches!(
            decode_decimal(&bytes).unwrap_err(),
            crate::error::SbdfError::Format(FormatError::DecimalNan)
        ));
    }

    #[test]
    fn extended_form_decodes() {
        // 2^113 * 10^-6, which can only be expressed in the extended form.
        let bytes: [u8; 16] = [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0x0d, 0x6c];
        let value = decode_decimal(&bytes).unwrap();
        assert_eq!(value, dec("10384593717069655257060992658.440192"));
        // Writing it back exceeds the 34-digit cap.
        assert!(encode_decimal(&value).is_err());
    }

    #[test]
    fn negative_scale_normalizes() {
        // 12e3 carries a negative scale; it round-trips by value.
        let value = dec("12e3");
        let back = decode_decimal(&encode_decimal(&value).unwrap()).unwrap();
        assert_eq!(back, value);
    }
}
