//! SQLite loader for cleaned orders.
//!
//! A load replaces the destination table wholesale: inside one transaction the
//! table is dropped, recreated with `OrderId` as primary key, and filled. Other
//! connections see either the previous table or the new one.

use rusqlite::{params, Connection};
use std::fs;
use std::path::Path;

use crate::error::{LoadError, LoadResult};
use crate::models::{TableName, TransformedOrderRow};

/// Default database file, relative to the working directory.
pub const DEFAULT_DATABASE: &str = "sales.db";

/// Open (or create) a SQLite file, creating its parent directory first.
pub fn open_database(database_path: &Path) -> LoadResult<Connection> {
    if let Some(parent) = database_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| LoadError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    Ok(Connection::open(database_path)?)
}

/// Schema of the orders table.
pub fn create_table_sql(table: &TableName) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {table} (
            OrderId TEXT PRIMARY KEY,
            OrderItemId DOUBLE,
            QuantityOrdered INTEGER,
            ItemPrice REAL,
            PromotionDiscount REAL,
            total_sales REAL,
            net_sale REAL,
            region TEXT,
            batch_id INTEGER
        )"
    )
}

/// Persist `rows` into `table` of the database at `database_path`.
///
/// Returns the number of rows written. Prior contents of the table are gone
/// afterwards.
pub fn load_orders(
    rows: &[TransformedOrderRow],
    database_path: &Path,
    table: &TableName,
) -> LoadResult<usize> {
    let mut conn = open_database(database_path)?;
    replace_orders(&mut conn, rows, table)
}

/// Replace the contents of `table` on an open connection.
///
/// Drop, create and insert run in one transaction; any error rolls the whole
/// load back and leaves the previous table in place.
pub fn replace_orders(
    conn: &mut Connection,
    rows: &[TransformedOrderRow],
    table: &TableName,
) -> LoadResult<usize> {
    let tx = conn.transaction()?;

    tx.execute_batch(&format!("DROP TABLE IF EXISTS {table};"))?;
    tx.execute_batch(&create_table_sql(table))?;

    {
        let mut stmt = tx.prepare(&format!(
            "INSERT INTO {table} (OrderId, OrderItemId, QuantityOrdered, ItemPrice, \
             PromotionDiscount, total_sales, net_sale, region, batch_id) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"
        ))?;

        for row in rows {
            stmt.execute(params![
                row.order_id,
                row.order_item_id,
                row.quantity_ordered,
                row.item_price,
                row.promotion_discount,
                row.total_sales,
                row.net_sale,
                row.region,
                row.batch_id,
            ])?;
        }
    }

    tx.commit()?;
    Ok(rows.len())
}

/// Read every row of an orders table, ordered by `OrderId`.
pub fn fetch_orders(conn: &Connection, table: &TableName) -> LoadResult<Vec<TransformedOrderRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT OrderId, OrderItemId, QuantityOrdered, ItemPrice, PromotionDiscount, \
         total_sales, net_sale, region, batch_id FROM {table} ORDER BY OrderId"
    ))?;

    let rows = stmt
        .query_map([], |row| {
            Ok(TransformedOrderRow {
                order_id: row.get(0)?,
                order_item_id: row.get(1)?,
                quantity_ordered: row.get(2)?,
                item_price: row.get(3)?,
                promotion_discount: row.get(4)?,
                total_sales: row.get(5)?,
                net_sale: row.get(6)?,
                region: row.get(7)?,
                batch_id: row.get(8)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn order(id: &str, net: f64, region: &str) -> TransformedOrderRow {
        TransformedOrderRow {
            order_id: id.to_string(),
            order_item_id: 1.0,
            quantity_ordered: 1,
            item_price: net,
            promotion_discount: 0.0,
            total_sales: net,
            net_sale: net,
            region: region.to_string(),
            batch_id: 1,
        }
    }

    #[test]
    fn test_load_creates_directory_and_table() {
        let dir = tempdir().unwrap();
        let db = dir.path().join("nested").join("out").join("sales.db");
        let table = TableName::default();

        let written = load_orders(&[order("1", 10.0, "A"), order("2", 5.0, "B")], &db, &table).unwrap();
        assert_eq!(written, 2);

        let conn = Connection::open(&db).unwrap();
        let rows = fetch_orders(&conn, &table).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], order("1", 10.0, "A"));
    }

    #[test]
    fn test_load_replaces_previous_contents() {
        let dir = tempdir().unwrap();
        let db = dir.path().join("sales.db");
        let table = TableName::parse("orders_test").unwrap();

        load_orders(&[order("1", 10.0, "A"), order("2", 5.0, "B")], &db, &table).unwrap();
        load_orders(&[order("3", 7.0, "B")], &db, &table).unwrap();

        let conn = Connection::open(&db).unwrap();
        let rows = fetch_orders(&conn, &table).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].order_id, "3");
    }

    #[test]
    fn test_order_id_is_primary_key() {
        let mut conn = Connection::open_in_memory().unwrap();
        let table = TableName::default();

        let result = replace_orders(&mut conn, &[order("1", 1.0, "A"), order("1", 2.0, "B")], &table);
        assert!(matches!(result, Err(LoadError::Sqlite(_))));
    }

    #[test]
    fn test_failed_load_keeps_previous_table() {
        let mut conn = Connection::open_in_memory().unwrap();
        let table = TableName::default();

        replace_orders(&mut conn, &[order("keep", 1.0, "A")], &table).unwrap();
        let result = replace_orders(&mut conn, &[order("x", 1.0, "A"), order("x", 2.0, "A")], &table);
        assert!(result.is_err());

        let rows = fetch_orders(&conn, &table).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].order_id, "keep");
    }

    #[test]
    fn test_leading_zero_ids_survive_storage() {
        let mut conn = Connection::open_in_memory().unwrap();
        let table = TableName::default();

        replace_orders(&mut conn, &[order("00042", 3.0, "A")], &table).unwrap();
        let rows = fetch_orders(&conn, &table).unwrap();
        assert_eq!(rows[0].order_id, "00042");
    }

    #[test]
    fn test_directory_creation_failure_is_reported() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, b"not a dir").unwrap();

        let result = load_orders(&[], &blocker.join("sales.db"), &TableName::default());
        assert!(matches!(result, Err(LoadError::CreateDir { .. })));
    }
}
