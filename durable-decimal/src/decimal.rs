//! Precision-preserving decimal codec.
//!
//! A [`Decimal`] written as a native JSON number goes through `f64` on the way
//! out of most serializers and parsers, which keeps roughly 15-17 significant
//! digits. This module routes decimals through a JSON *string* instead, using a
//! fixed, locale-independent format:
//!
//! - `.` is the only decimal separator, there is never any digit grouping;
//! - an optional leading `-` is the only sign;
//! - every digit and the full stored scale of the value are kept, so `2.20`
//!   encodes as `"2.20"` and `999999999999999999.0` keeps its `.0`.
//!
//! Decoding preserves the scale that was written: `decode("2.20")` has scale 2.
//! `Decimal` equality is numeric, so compare [`Decimal::scale`] as well when the
//! representation matters.
//!
//! Attach the codec to a single field with `#[serde(with = "...")]`:
//!
//! ```rust
//! use durable_decimal::decimal;
//! use rust_decimal::Decimal;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize)]
//! struct Price {
//!     #[serde(with = "decimal::as_string")]
//!     exact: Decimal,
//!     #[serde(with = "decimal::as_number")]
//!     approximate: Decimal,
//! }
//!
//! let value = Decimal::from_i128_with_scale(1_000_000_000_000_000_000_000_033_288, 27);
//! let json = serde_json::to_string(&Price { exact: value, approximate: value }).unwrap();
//! assert_eq!(json, r#"{"exact":"1.000000000000000000000033288","approximate":1.0}"#);
//!
//! let back: Price = serde_json::from_str(&json).unwrap();
//! assert_eq!(back.exact, value);
//! assert_ne!(back.approximate, value);
//! ```

use rust_decimal::Decimal;
use thiserror::Error;

use crate::serdes::{custom_serdes, CustomSerDes, SerDesContext, SerDesError};

/// Failure to read a decimal literal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The input was the empty string.
    #[error("empty decimal literal")]
    Empty,

    /// A character outside `-`, `0-9` and `.` (or a `-` that is not leading).
    #[error("unexpected character {found:?} at offset {offset} in decimal literal")]
    UnexpectedCharacter {
        /// The offending character
        found: char,
        /// Byte offset of the character in the input
        offset: usize,
    },

    /// More than one `.` in the literal.
    #[error("decimal literal has more than one decimal point")]
    MultipleDecimalPoints,

    /// A sign or decimal point without digits on both required sides.
    #[error("decimal literal is missing digits")]
    MissingDigits,

    /// Well-formed, but not representable without rounding.
    #[error("decimal literal {literal:?} exceeds the representable range or precision")]
    OutOfRange {
        /// The rejected input
        literal: String,
    },
}

/// Renders `value` in the invariant format, keeping every digit and the scale.
pub fn encode(value: &Decimal) -> String {
    value.to_string()
}

/// Reads an invariant-format literal, `-?[0-9]+(\.[0-9]+)?`.
///
/// The result carries exactly the digits and scale that were written. Inputs
/// that `Decimal` cannot hold exactly fail with [`ParseError::OutOfRange`]
/// instead of being rounded.
pub fn decode(text: &str) -> Result<Decimal, ParseError> {
    let fractional_digits = validate_literal(text)?;

    let value = Decimal::from_str_exact(text).map_err(|_| ParseError::OutOfRange {
        literal: text.to_string(),
    })?;

    if value.scale() as usize != fractional_digits {
        return Err(ParseError::OutOfRange {
            literal: text.to_string(),
        });
    }

    Ok(value)
}

/// Checks the literal grammar and returns the number of fractional digits.
fn validate_literal(text: &str) -> Result<usize, ParseError> {
    if text.is_empty() {
        return Err(ParseError::Empty);
    }

    let unsigned = text.strip_prefix('-').unwrap_or(text);
    let sign_len = text.len() - unsigned.len();

    let mut integral_digits = 0usize;
    let mut fractional_digits = 0usize;
    let mut seen_point = false;

    for (index, ch) in unsigned.char_indices() {
        match ch {
            '0'..='9' if seen_point => fractional_digits += 1,
            '0'..='9' => integral_digits += 1,
            '.' if seen_point => return Err(ParseError::MultipleDecimalPoints),
            '.' => seen_point = true,
            found => {
                return Err(ParseError::UnexpectedCharacter {
                    found,
                    offset: sign_len + index,
                })
            }
        }
    }

    if integral_digits == 0 || (seen_point && fractional_digits == 0) {
        return Err(ParseError::MissingDigits);
    }

    Ok(fractional_digits)
}

/// Field hook writing a [`Decimal`] as a JSON string in the invariant format.
///
/// Reading requires a JSON string; a malformed literal surfaces as a
/// deserialization error of the enclosing record.
pub mod as_string {
    use rust_decimal::Decimal;
    use serde::{de, Deserialize, Deserializer, Serializer};

    /// Writes the encoded value as a string token.
    pub fn serialize<S>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::encode(value))
    }

    /// Reads a string token and decodes it.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        super::decode(&text).map_err(de::Error::custom)
    }
}

/// Field hook writing a [`Decimal`] as a native JSON number.
///
/// The value passes through `f64`, so anything beyond double precision is
/// rounded. This is the contrast strategy for [`as_string`].
pub mod as_number {
    pub use rust_decimal::serde::float::{deserialize, serialize};
}

type WritePayload = fn(&Decimal, &SerDesContext) -> Result<String, SerDesError>;
type ReadPayload = fn(&str, &SerDesContext) -> Result<Decimal, SerDesError>;

/// [`SerDes`](crate::serdes::SerDes) for a standalone decimal payload. See [`decimal_string_serdes`].
pub type DecimalStringSerDes = CustomSerDes<Decimal, WritePayload, ReadPayload>;

/// Payloads holding a single decimal as the JSON string literal of its
/// encoding, e.g. `"2.20"` including the quotes.
pub fn decimal_string_serdes() -> DecimalStringSerDes {
    custom_serdes(write_payload as WritePayload, read_payload as ReadPayload)
}

fn write_payload(value: &Decimal, _context: &SerDesContext) -> Result<String, SerDesError> {
    serde_json::to_string(&encode(value)).map_err(|e| SerDesError::serialization(e.to_string()))
}

fn read_payload(data: &str, context: &SerDesContext) -> Result<Decimal, SerDesError> {
    let text: String = serde_json::from_str(data)
        .map_err(|e| SerDesError::deserialization(format!("payload is not a JSON string: {e}")))?;
    decode(&text).map_err(|e| {
        tracing::debug!(operation_id = %context.operation_id, error = %e, "Rejected decimal payload");
        SerDesError::deserialization(e.to_string())
    })
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn arbitrary_decimal() -> impl Strategy<Value = Decimal> {
        (any::<u32>(), any::<u32>(), any::<u32>(), any::<bool>(), 0u32..=28)
            .prop_map(|(lo, mid, hi, negative, scale)| Decimal::from_parts(lo, mid, hi, negative, scale))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(256))]

        /// Decoding an encoded value yields the same number with the same scale.
        #[test]
        fn prop_round_trip_preserves_value_and_scale(value in arbitrary_decimal()) {
            let decoded = decode(&encode(&value)).unwrap();
            prop_assert_eq!(decoded, value);
            prop_assert_eq!(decoded.scale(), value.scale());
        }

        /// The encoded form only ever contains the invariant alphabet.
        #[test]
        fn prop_encoded_form_is_invariant(value in arbitrary_decimal()) {
            let encoded = encode(&value);
            prop_assert!(encoded.chars().all(|c| c.is_ascii_digit() || c == '.' || c == '-'));
            prop_assert!(encoded.matches('.').count() <= 1);
        }

        /// Any literal matching the grammar within range decodes to its own digits.
        #[test]
        fn prop_grammar_literals_decode_verbatim(literal in "-?[1-9][0-9]{0,14}(\\.[0-9]{1,12})?") {
            let decoded = decode(&literal).unwrap();
            prop_assert_eq!(encode(&decoded), literal);
        }
    }
}
