///
/// Single-statement execution.
///
/// `execute_one` runs one mutation, `query_one` runs one query and
/// materializes every row into a `RowSet`. Binds are positional and SQLite
/// checks the placeholder count, so absent binds require a statement
/// without placeholders.
///
/// Cells are stringified:
/// - INTEGER -> decimal text
/// - REAL -> shortest round-trip text, always with a fraction or exponent
/// - TEXT -> as stored
/// - BLOB -> lossy UTF-8
/// - NULL -> the column is left out of that row
///

use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{Connection, params_from_iter};
use sqlbridge_core::{BindValue, BridgeError, Row, RowSet};
use tracing::debug;

use crate::connection::engine_error;

fn to_sql_value(bind: &BindValue) -> SqlValue {
    match bind {
        BindValue::Null => SqlValue::Null,
        BindValue::Integer(i) => SqlValue::Integer(*i),
        BindValue::Real(f) => SqlValue::Real(*f),
        BindValue::Text(s) => SqlValue::Text(s.clone()),
        BindValue::Boolean(b) => SqlValue::Integer(i64::from(*b)),
    }
}

fn sql_params(binds: &[BindValue]) -> impl Iterator<Item = SqlValue> + '_ {
    binds.iter().map(to_sql_value)
}

/// Trims `sql` and rejects blank statements.
pub fn normalize_sql<'a>(sql: &'a str, context: &'static str) -> Result<&'a str, BridgeError> {
    let sql = sql.trim();
    if sql.is_empty() {
        return Err(BridgeError::EmptySql { context });
    }
    Ok(sql)
}

pub fn execute_one(conn: &Connection, sql: &str, binds: &[BindValue]) -> Result<(), BridgeError> {
    debug!("SQLite execute: {}", sql);
    conn.execute(sql, params_from_iter(sql_params(binds)))
        .map_err(engine_error)?;
    Ok(())
}

pub fn query_one(conn: &Connection, sql: &str, binds: &[BindValue]) -> Result<RowSet, BridgeError> {
    debug!("SQLite query: {}", sql);
    let mut stmt = conn.prepare(sql).map_err(engine_error)?;
    let columns: Vec<String> = stmt
        .column_names()
        .into_iter()
        .map(String::from)
        .collect();

    let mut rows = stmt
        .query(params_from_iter(sql_params(binds)))
        .map_err(engine_error)?;

    let mut result = RowSet::new();
    while let Some(row) = rows.next().map_err(engine_error)? {
        let mut mapped = Row::with_capacity(columns.len());
        for (index, name) in columns.iter().enumerate() {
            let cell = row.get_ref(index).map_err(engine_error)?;
            if let Some(text) = stringify_cell(cell) {
                mapped.insert(name.clone(), text);
            }
        }
        result.push(mapped);
    }
    Ok(result)
}

fn stringify_cell(cell: ValueRef<'_>) -> Option<String> {
    match cell {
        ValueRef::Null => None,
        ValueRef::Integer(i) => Some(i.to_string()),
        ValueRef::Real(f) => Some(format!("{:?}", f)),
        ValueRef::Text(t) => Some(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Some(String::from_utf8_lossy(b).into_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "create table person (id integer primary key, name text, score real, note text)",
        )
        .unwrap();
        conn
    }

    #[test]
    fn test_normalize_sql() {
        assert_eq!(normalize_sql("  select 1 \n", "query").unwrap(), "select 1");
        assert!(matches!(
            normalize_sql("   ", "execute"),
            Err(BridgeError::EmptySql { context: "execute" })
        ));
    }

    #[test]
    fn test_execute_then_query_stringifies() {
        let conn = memory_db();
        execute_one(
            &conn,
            "insert into person (id, name, score) values (1, 'ann', 2.0)",
            &[],
        )
        .unwrap();

        let rows = query_one(&conn, "select id, name, score from person", &[]).unwrap();
        assert_eq!(rows.len(), 1);
        let row = rows.get(0).unwrap();
        assert_eq!(row["id"], "1");
        assert_eq!(row["name"], "ann");
        assert_eq!(row["score"], "2.0");
    }

    #[test]
    fn test_positional_binds() {
        let conn = memory_db();
        execute_one(
            &conn,
            "insert into person (id, name, score, note) values (?, ?, ?, ?)",
            &[
                BindValue::Integer(7),
                BindValue::Text("bo".to_string()),
                BindValue::Real(0.5),
                BindValue::Boolean(true),
            ],
        )
        .unwrap();

        let rows = query_one(
            &conn,
            "select name, score, note from person where id = ?",
            &[BindValue::Integer(7)],
        )
        .unwrap();
        let row = rows.get(0).unwrap();
        assert_eq!(row["name"], "bo");
        assert_eq!(row["score"], "0.5");
        assert_eq!(row["note"], "1");
    }

    #[test]
    fn test_placeholder_count_is_checked() {
        let conn = memory_db();
        let result = execute_one(&conn, "insert into person (id) values (?)", &[]);
        assert!(matches!(result, Err(BridgeError::Engine(_))));
    }

    #[test]
    fn test_empty_table_yields_empty_rowset() {
        let conn = memory_db();
        let rows = query_one(&conn, "select * from person", &[]).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_null_cells_are_omitted_and_order_kept() {
        let conn = memory_db();
        execute_one(&conn, "insert into person (id, name) values (3, 'cy')", &[]).unwrap();
        let rows = query_one(&conn, "select note, name, id from person", &[]).unwrap();
        let row = rows.get(0).unwrap();
        assert!(!row.contains_key("note"));
        let keys: Vec<&str> = row.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["name", "id"]);
    }

    #[test]
    fn test_query_materializes_all_rows_in_order() {
        let conn = memory_db();
        for id in 1..=5 {
            execute_one(
                &conn,
                "insert into person (id, name) values (?, ?)",
                &[BindValue::Integer(id), BindValue::Text(format!("p{}", id))],
            )
            .unwrap();
        }
        let rows = query_one(&conn, "select name from person order by id", &[]).unwrap();
        let names: Vec<&str> = rows.iter().map(|r| r["name"].as_str()).collect();
        assert_eq!(names, vec!["p1", "p2", "p3", "p4", "p5"]);
    }

    #[test]
    fn test_query_error_on_missing_table() {
        let conn = memory_db();
        let result = query_one(&conn, "select * from nope", &[]);
        match result {
            Err(BridgeError::Engine(message)) => assert!(message.contains("no such table")),
            other => panic!("expected engine error, got {:?}", other),
        }
    }
}
