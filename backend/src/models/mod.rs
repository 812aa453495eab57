//! Domain models for the order consolidation pipeline and the joke importer.
//!
//! - [`RawOrderRow`] - One CSV row, verbatim text, tagged with its region
//! - [`TransformedOrderRow`] - The persisted, typed order row
//! - [`TableName`] - A validated SQL identifier
//! - [`Joke`] - A normalized JokeAPI joke
//! - [`ImportCounts`] - Outcome of a joke import

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ConfigError;

// =============================================================================
// Order Rows
// =============================================================================

/// One order row as read from a regional export.
///
/// Every field is the untouched cell text. Columns missing from the file read
/// as empty strings; coercion happens in the transformer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawOrderRow {
    #[serde(rename = "OrderId", default)]
    pub order_id: String,

    #[serde(rename = "OrderItemId", default)]
    pub order_item_id: String,

    #[serde(rename = "QuantityOrdered", default)]
    pub quantity_ordered: String,

    #[serde(rename = "ItemPrice", default)]
    pub item_price: String,

    #[serde(rename = "PromotionDiscount", default)]
    pub promotion_discount: String,

    #[serde(default)]
    pub batch_id: String,

    /// Region label given to the reader, not a file column.
    #[serde(skip_deserializing, default)]
    pub region: String,
}

/// A cleaned order row, one per `OrderId` after deduplication.
///
/// Field order matches the destination table's column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformedOrderRow {
    #[serde(rename = "OrderId")]
    pub order_id: String,

    #[serde(rename = "OrderItemId")]
    pub order_item_id: f64,

    #[serde(rename = "QuantityOrdered")]
    pub quantity_ordered: i64,

    #[serde(rename = "ItemPrice")]
    pub item_price: f64,

    #[serde(rename = "PromotionDiscount")]
    pub promotion_discount: f64,

    pub total_sales: f64,

    pub net_sale: f64,

    pub region: String,

    pub batch_id: i64,
}

/// Output column set, in table order.
pub const ORDER_COLUMNS: [&str; 9] = [
    "OrderId",
    "OrderItemId",
    "QuantityOrdered",
    "ItemPrice",
    "PromotionDiscount",
    "total_sales",
    "net_sale",
    "region",
    "batch_id",
];

// =============================================================================
// Table Name
// =============================================================================

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid")
});

/// Default destination table.
pub const DEFAULT_TABLE: &str = "orders";

/// A table name that is safe to interpolate into SQL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TableName(String);

impl TableName {
    /// Validate a table name.
    pub fn parse(name: impl Into<String>) -> Result<Self, ConfigError> {
        let name = name.into();
        if IDENTIFIER.is_match(&name) {
            Ok(Self(name))
        } else {
            Err(ConfigError::InvalidTableName(name))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TableName {
    fn default() -> Self {
        Self(DEFAULT_TABLE.to_string())
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for TableName {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// =============================================================================
// Jokes
// =============================================================================

/// A joke as stored in the `jokes` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Joke {
    pub joke_id: i64,
    pub category: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub flag_nsfw: bool,
    pub flag_political: bool,
    pub flag_sexist: bool,
    pub safe: bool,
    pub lang: String,
    pub joke: Option<String>,
    pub setup: Option<String>,
    pub delivery: Option<String>,
}

/// Result of one joke import run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportCounts {
    /// Target passed by the caller.
    pub requested: u32,
    /// Distinct jokes after deduplication.
    pub fetched: usize,
    pub inserted: usize,
    pub updated: usize,
}
