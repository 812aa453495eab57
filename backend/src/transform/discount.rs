//! `PromotionDiscount` extraction.
//!
//! The column arrives in several shapes: blank, a plain number, a JSON payload
//! such as `{"Amount": 7.25, "Type": "Fixed"}`, or free text like `$7.25 off`.
//! Each shape is one [`DiscountValue`] variant. Recognizers are tried in a fixed
//! order and the first one that claims the cell wins.

use serde_json::Value;

use super::coerce::parse_finite;

/// Cells read as missing, same markers pandas-style exports use.
const MISSING_MARKERS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Field holding the amount inside a structured payload.
const AMOUNT_KEY: &str = "Amount";

/// A recognized discount cell.
#[derive(Debug, Clone, PartialEq)]
pub enum DiscountValue {
    /// Blank or a missing-value marker.
    Empty,
    /// Plain numeric literal.
    Numeric(f64),
    /// Text starting with `{`. `None` when the payload is not a JSON object or
    /// its `Amount` is absent or not numeric.
    Structured(Option<f64>),
    /// Anything else. Holds the number formed by its digits and dots, if any.
    FreeText(Option<f64>),
}

type Recognizer = fn(&str) -> Option<DiscountValue>;

/// Order matters: structured payloads must be claimed before the digit
/// scraping of [`recognize_free_text`] can see them.
const RECOGNIZERS: [Recognizer; 4] = [
    recognize_empty,
    recognize_numeric,
    recognize_structured,
    recognize_free_text,
];

impl DiscountValue {
    /// Classify a raw cell.
    pub fn parse(raw: &str) -> Self {
        let text = raw.trim();
        RECOGNIZERS
            .iter()
            .find_map(|recognize| recognize(text))
            .unwrap_or(DiscountValue::FreeText(None))
    }

    /// Discount amount, `0.0` whenever nothing usable was found.
    pub fn amount(&self) -> f64 {
        match self {
            DiscountValue::Empty => 0.0,
            DiscountValue::Numeric(value) => *value,
            DiscountValue::Structured(amount) | DiscountValue::FreeText(amount) => {
                amount.unwrap_or(0.0)
            }
        }
    }
}

/// Extract the discount amount from a raw `PromotionDiscount` cell.
pub fn parse_discount(raw: &str) -> f64 {
    DiscountValue::parse(raw).amount()
}

fn recognize_empty(text: &str) -> Option<DiscountValue> {
    MISSING_MARKERS
        .contains(&text)
        .then_some(DiscountValue::Empty)
}

fn recognize_numeric(text: &str) -> Option<DiscountValue> {
    parse_finite(text).map(DiscountValue::Numeric)
}

fn recognize_structured(text: &str) -> Option<DiscountValue> {
    if !text.starts_with('{') {
        return None;
    }

    let amount = match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(payload)) => payload.get(AMOUNT_KEY).and_then(amount_from_json),
        _ => None,
    };

    Some(DiscountValue::Structured(amount))
}

fn amount_from_json(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => parse_finite(s),
        _ => None,
    }
}

fn recognize_free_text(text: &str) -> Option<DiscountValue> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    if cleaned.is_empty() {
        return Some(DiscountValue::FreeText(None));
    }

    Some(DiscountValue::FreeText(parse_finite(&cleaned)))
}
