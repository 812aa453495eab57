//! Order cleaning rules: coercion, discount extraction, derived metrics,
//! filtering and per-`OrderId` deduplication.
//!
//! Every step is total. A bad cell becomes a zero default, a bad row is
//! dropped; nothing here returns an error.

use serde::Serialize;
use std::cmp::Ordering;

use super::coerce::{parse_f64_or, parse_i64_or};
use super::discount::parse_discount;
use crate::models::{RawOrderRow, TransformedOrderRow};

/// Counters describing what the transformer did with its input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TransformStats {
    pub input_rows: usize,
    /// Rows dropped because `OrderId` was blank
    pub blank_order_ids: usize,
    /// Rows dropped because `net_sale <= 0`
    pub filtered_non_positive: usize,
    /// Lower-value rows dropped for a repeated `OrderId`
    pub duplicates_removed: usize,
    pub output_rows: usize,
}

/// Transformer output.
#[derive(Debug, Clone, Default)]
pub struct TransformOutput {
    /// One row per `OrderId`, sorted by `OrderId`
    pub rows: Vec<TransformedOrderRow>,
    pub stats: TransformStats,
}

/// Coerce one raw row and compute its metrics. No filtering.
pub fn coerce_row(raw: RawOrderRow) -> TransformedOrderRow {
    let quantity_ordered = parse_i64_or(&raw.quantity_ordered, 0);
    let item_price = parse_f64_or(&raw.item_price, 0.0);
    let promotion_discount = parse_discount(&raw.promotion_discount);

    let total_sales = quantity_ordered as f64 * item_price;
    let net_sale = total_sales - promotion_discount;

    TransformedOrderRow {
        order_id: raw.order_id,
        order_item_id: parse_f64_or(&raw.order_item_id, 0.0),
        quantity_ordered,
        item_price,
        promotion_discount,
        total_sales,
        net_sale,
        region: raw.region,
        batch_id: parse_i64_or(&raw.batch_id, 0),
    }
}

/// Run the cleaning rules over the concatenated raw rows.
///
/// Rows with `net_sale <= 0` are dropped, then for each `OrderId` only the row
/// with the highest `net_sale` survives. Ties keep the row seen first.
pub fn transform_orders(raw_rows: Vec<RawOrderRow>) -> TransformOutput {
    let mut stats = TransformStats {
        input_rows: raw_rows.len(),
        ..TransformStats::default()
    };

    let mut candidates = Vec::with_capacity(raw_rows.len());
    for raw in raw_rows {
        if raw.order_id.trim().is_empty() {
            stats.blank_order_ids += 1;
            continue;
        }

        let row = coerce_row(raw);
        // NaN fails this comparison too
        if row.net_sale > 0.0 {
            candidates.push(row);
        } else {
            stats.filtered_non_positive += 1;
        }
    }

    // Stable: equal (OrderId, net_sale) pairs keep their input order.
    candidates.sort_by(|a, b| {
        a.order_id
            .cmp(&b.order_id)
            .then_with(|| descending(a.net_sale, b.net_sale))
    });

    let before_dedup = candidates.len();
    candidates.dedup_by(|later, kept| later.order_id == kept.order_id);
    stats.duplicates_removed = before_dedup - candidates.len();
    stats.output_rows = candidates.len();

    TransformOutput {
        rows: candidates,
        stats,
    }
}

fn descending(a: f64, b: f64) -> Ordering {
    b.total_cmp(&a)
}
