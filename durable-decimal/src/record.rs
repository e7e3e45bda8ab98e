//! The record passed from the orchestrator to the greeting activity.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal;

/// Input of one `SayHello` call.
///
/// `my_number` and `my_number2` always carry the same value when built by
/// the orchestrator. Only `my_number` uses the string codec; `my_number2`
/// travels as a native JSON number, so comparing the two after a round trip
/// shows what the codec preserves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GreetingData {
    /// Display name, rendered as empty when absent
    #[serde(default)]
    pub name: Option<String>,

    /// Sent as a string, keeps every digit and the scale
    #[serde(with = "decimal::as_string")]
    pub my_number: Decimal,

    /// Sent as a JSON number through `f64`
    #[serde(with = "decimal::as_number")]
    pub my_number2: Decimal,
}

impl GreetingData {
    /// Builds a record carrying `value` in both decimal fields.
    pub fn new(name: impl Into<String>, value: Decimal) -> Self {
        Self {
            name: Some(name.into()),
            my_number: value,
            my_number2: value,
        }
    }

    /// The greeting the activity answers with.
    pub fn greeting(&self) -> String {
        format!(
            "Hello {}! Your values are Number1: {} Number2: {}.",
            self.name.as_deref().unwrap_or_default(),
            decimal::encode(&self.my_number),
            decimal::encode(&self.my_number2),
        )
    }
}

/// The fixed inputs of the `First` orchestration, in call order.
///
/// Both 18-digit integers exceed `f64`'s exact integer range, and the 27-digit
/// fraction exceeds its precision; only `2.2` survives the native path.
pub fn demonstration_set() -> Vec<GreetingData> {
    vec![
        GreetingData::new("Carl", Decimal::from_i128_with_scale(999_999_999_999_999_999, 0)),
        GreetingData::new("John", Decimal::from_i128_with_scale(9_999_999_999_999_999_990, 1)),
        GreetingData::new(
            "Mary",
            Decimal::from_i128_with_scale(1_000_000_000_000_000_000_000_033_288, 27),
        ),
        GreetingData::new("Bob", Decimal::from_i128_with_scale(22, 1)),
    ]
}
