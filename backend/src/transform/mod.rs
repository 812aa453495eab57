//! Transformation module.
//!
//! - Coerce: tolerant numeric parsing
//! - Discount: the promotion discount recognizers
//! - Orders: row coercion, filtering and deduplication
//! - Pipeline: read, transform and load in one run

pub mod coerce;
pub mod discount;
pub mod orders;
pub mod pipeline;

pub use discount::{parse_discount, DiscountValue};
pub use orders::{coerce_row, transform_orders, TransformOutput, TransformStats};
pub use pipeline::*;
