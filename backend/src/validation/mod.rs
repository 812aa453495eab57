//! Post-load sanity checks for the orders table.
//!
//! [`validation_queries`] is a fixed lookup table of read-only SQL. The
//! duplicate and non-positive queries must always come back empty after a
//! load; a row there means the transformer let something through.
//!
//! [`run_checks`] executes the same queries and collects a
//! [`ValidationReport`].

use rusqlite::Connection;
use serde::Serialize;

use crate::error::LoadResult;
use crate::models::TableName;

pub const ROW_COUNT: &str = "row_count";
pub const DUPLICATE_ORDERS: &str = "duplicate_orders";
pub const NON_POSITIVE_NET_SALES: &str = "non_positive_net_sales";
pub const SALES_BY_REGION: &str = "sales_by_region";

/// A named read-only query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationQuery {
    pub label: &'static str,
    pub sql: String,
}

/// The validation queries for `table`, in display order.
pub fn validation_queries(table: &TableName) -> Vec<ValidationQuery> {
    vec![
        ValidationQuery {
            label: ROW_COUNT,
            sql: row_count_sql(table),
        },
        ValidationQuery {
            label: DUPLICATE_ORDERS,
            sql: duplicate_orders_sql(table),
        },
        ValidationQuery {
            label: NON_POSITIVE_NET_SALES,
            sql: non_positive_net_sales_sql(table),
        },
        ValidationQuery {
            label: SALES_BY_REGION,
            sql: sales_by_region_sql(table),
        },
    ]
}

fn row_count_sql(table: &TableName) -> String {
    format!("SELECT COUNT(*) AS row_count FROM {table};")
}

fn duplicate_orders_sql(table: &TableName) -> String {
    format!(
        "SELECT OrderId, COUNT(*) AS occurrences FROM {table} \
         GROUP BY OrderId HAVING COUNT(*) > 1;"
    )
}

fn non_positive_net_sales_sql(table: &TableName) -> String {
    format!("SELECT OrderId, net_sale FROM {table} WHERE net_sale <= 0;")
}

fn sales_by_region_sql(table: &TableName) -> String {
    format!("SELECT region, SUM(net_sale) AS total_net_sale FROM {table} GROUP BY region;")
}

/// Look up one query by label.
pub fn validation_query(table: &TableName, label: &str) -> Option<ValidationQuery> {
    validation_queries(table).into_iter().find(|q| q.label == label)
}

/// An `OrderId` stored more than once.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateOrder {
    pub order_id: String,
    pub occurrences: i64,
}

/// A stored row with `net_sale <= 0`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NonPositiveSale {
    pub order_id: String,
    pub net_sale: f64,
}

/// Net sales per region.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionTotal {
    pub region: String,
    pub total_net_sale: f64,
}

/// Results of running every validation query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub row_count: i64,
    pub duplicate_orders: Vec<DuplicateOrder>,
    pub non_positive_net_sales: Vec<NonPositiveSale>,
    pub sales_by_region: Vec<RegionTotal>,
}

impl ValidationReport {
    /// No duplicates and no non-positive rows.
    pub fn is_clean(&self) -> bool {
        self.duplicate_orders.is_empty() && self.non_positive_net_sales.is_empty()
    }
}

/// Execute the validation queries against an open connection.
pub fn run_checks(conn: &Connection, table: &TableName) -> LoadResult<ValidationReport> {
    let row_count: i64 = conn.query_row(&row_count_sql(table), [], |row| row.get(0))?;

    let mut stmt = conn.prepare(&duplicate_orders_sql(table))?;
    let duplicate_orders = stmt
        .query_map([], |row| {
            Ok(DuplicateOrder {
                order_id: row.get(0)?,
                occurrences: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut stmt = conn.prepare(&non_positive_net_sales_sql(table))?;
    let non_positive_net_sales = stmt
        .query_map([], |row| {
            Ok(NonPositiveSale {
                order_id: row.get(0)?,
                net_sale: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut stmt = conn.prepare(&sales_by_region_sql(table))?;
    let sales_by_region = stmt
        .query_map([], |row| {
            Ok(RegionTotal {
                region: row.get::<_, Option<String>>(0)?.unwrap_or_default(),
                total_net_sale: row.get::<_, Option<f64>>(1)?.unwrap_or(0.0),
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ValidationReport {
        row_count,
        duplicate_orders,
        non_positive_net_sales,
        sales_by_region,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TransformedOrderRow;
    use crate::storage::{create_table_sql, replace_orders};

    fn order(id: &str, net: f64, region: &str) -> TransformedOrderRow {
        TransformedOrderRow {
            order_id: id.to_string(),
            order_item_id: 0.0,
            quantity_ordered: 1,
            item_price: net,
            promotion_discount: 0.0,
            total_sales: net,
            net_sale: net,
            region: region.to_string(),
            batch_id: 0,
        }
    }

    #[test]
    fn test_query_labels_and_order() {
        let queries = validation_queries(&TableName::default());
        let labels: Vec<&str> = queries.iter().map(|q| q.label).collect();
        assert_eq!(
            labels,
            vec![ROW_COUNT, DUPLICATE_ORDERS, NON_POSITIVE_NET_SALES, SALES_BY_REGION]
        );
    }

    #[test]
    fn test_queries_target_table() {
        let table = TableName::parse("orders_2024").unwrap();
        let row_count = validation_query(&table, ROW_COUNT).unwrap();
        assert_eq!(row_count.sql, "SELECT COUNT(*) AS row_count FROM orders_2024;");

        for query in validation_queries(&table) {
            assert!(query.sql.contains("FROM orders_2024"), "{}", query.sql);
            assert!(query.sql.trim_start().starts_with("SELECT"));
        }
        assert!(validation_query(&table, "drop_everything").is_none());
    }

    #[test]
    fn test_every_listed_query_runs_on_loaded_table() {
        let mut conn = Connection::open_in_memory().unwrap();
        let table = TableName::parse("orders_eu").unwrap();
        replace_orders(&mut conn, &[order("1", 4.0, "A")], &table).unwrap();

        for query in validation_queries(&table) {
            assert!(!query.sql.is_empty(), "{}", query.label);
            conn.prepare(&query.sql).unwrap();
        }

        let report = run_checks(&conn, &table).unwrap();
        assert_eq!(report.row_count, 1);
        assert_eq!(report.sales_by_region.len(), 1);
        assert_eq!(report.sales_by_region[0].total_net_sale, 4.0);
    }

    #[test]
    fn test_clean_table_report() {
        let mut conn = Connection::open_in_memory().unwrap();
        let table = TableName::default();
        replace_orders(
            &mut conn,
            &[order("1", 10.0, "A"), order("2", 5.0, "A"), order("3", 2.5, "B")],
            &table,
        )
        .unwrap();

        let report = run_checks(&conn, &table).unwrap();
        assert_eq!(report.row_count, 3);
        assert!(report.is_clean());

        let mut regions = report.sales_by_region.clone();
        regions.sort_by(|a, b| a.region.cmp(&b.region));
        assert_eq!(regions[0].region, "A");
        assert_eq!(regions[0].total_net_sale, 15.0);
        assert_eq!(regions[1].total_net_sale, 2.5);
    }

    #[test]
    fn test_checks_flag_bad_rows() {
        // A table written without the primary key, bypassing the transformer.
        let conn = Connection::open_in_memory().unwrap();
        let table = TableName::parse("legacy").unwrap();
        let schema = create_table_sql(&table).replace("OrderId TEXT PRIMARY KEY", "OrderId TEXT");
        conn.execute_batch(&schema).unwrap();
        conn.execute_batch(
            "INSERT INTO legacy (OrderId, net_sale, region) VALUES ('1', 5.0, 'A');
             INSERT INTO legacy (OrderId, net_sale, region) VALUES ('1', 6.0, 'A');
             INSERT INTO legacy (OrderId, net_sale, region) VALUES ('2', 0.0, 'B');",
        )
        .unwrap();

        let report = run_checks(&conn, &table).unwrap();
        assert!(!report.is_clean());
        assert_eq!(
            report.duplicate_orders,
            vec![DuplicateOrder { order_id: "1".into(), occurrences: 2 }]
        );
        assert_eq!(report.non_positive_net_sales.len(), 1);
        assert_eq!(report.non_positive_net_sales[0].order_id, "2");
    }
}
