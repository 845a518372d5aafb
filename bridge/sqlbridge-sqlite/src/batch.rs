///
/// Batch execution with optional transaction.
///
/// Each statement is classified once by its leading keyword (first six
/// characters of the trimmed text, case-insensitive) and counted by kind:
///
/// | Kind             | Counts                                     |
/// |------------------|--------------------------------------------|
/// | `Insert`         | 1 if a new row id > 0 was produced, else 0 |
/// | `UpdateOrDelete` | rows reported as changed by the engine     |
/// | `Other`          | 0, executed directly                       |
///
/// Failure policy:
/// - transactional: any failure aborts the batch, the transaction rolls
///   back when it is dropped uncommitted, and the partial count is dropped
/// - non-transactional: a failing insert is logged and skipped; any other
///   failing statement aborts the batch and the count so far is reported
///   along with the error
///

use rusqlite::Connection;
use sqlbridge_core::BridgeError;
use tracing::{debug, error};

use crate::connection::engine_error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Insert,
    UpdateOrDelete,
    Other,
}

impl StatementKind {
    pub fn classify(sql: &str) -> Self {
        let Some(prefix) = sql.trim().get(..6) else {
            return StatementKind::Other;
        };
        if prefix.eq_ignore_ascii_case("insert") {
            StatementKind::Insert
        } else if prefix.eq_ignore_ascii_case("update") || prefix.eq_ignore_ascii_case("delete") {
            StatementKind::UpdateOrDelete
        } else {
            StatementKind::Other
        }
    }
}

/// A batch that stopped early. `count` is what the caller gets to see.
#[derive(Debug)]
pub struct BatchFailure {
    pub count: i64,
    pub error: BridgeError,
}

impl BatchFailure {
    pub fn new(count: i64, error: BridgeError) -> Self {
        Self { count, error }
    }
}

pub fn execute_batch(
    conn: &mut Connection,
    sqls: &[String],
    transactional: bool,
) -> Result<i64, BatchFailure> {
    if sqls.is_empty() {
        return Ok(0);
    }
    if !transactional {
        return run_statements(conn, sqls, false);
    }

    let tx = conn
        .transaction()
        .map_err(|e| BatchFailure::new(0, engine_error(e)))?;
    match run_statements(&tx, sqls, true) {
        Ok(count) => {
            tx.commit()
                .map_err(|e| BatchFailure::new(0, engine_error(e)))?;
            Ok(count)
        }
        Err(failure) => {
            debug!("SQLite batch transaction rolled back");
            Err(BatchFailure::new(0, failure.error))
        }
    }
}

fn run_statements(conn: &Connection, sqls: &[String], transactional: bool) -> Result<i64, BatchFailure> {
    let mut total = 0;
    for raw in sqls {
        let sql = raw.trim();
        let kind = StatementKind::classify(sql);
        match run_statement(conn, sql, kind) {
            Ok(count) => total += count,
            Err(e) if kind == StatementKind::Insert => {
                let err = BridgeError::Statement {
                    sql: sql.to_string(),
                    reason: e.to_string(),
                };
                if transactional {
                    return Err(BatchFailure::new(total, err));
                }
                error!("SQLite batch insert skipped: {}", err);
            }
            Err(e) => return Err(BatchFailure::new(total, e)),
        }
    }
    Ok(total)
}

fn run_statement(conn: &Connection, sql: &str, kind: StatementKind) -> Result<i64, BridgeError> {
    debug!("SQLite batch {:?}: {}", kind, sql);
    match kind {
        StatementKind::Insert => {
            let mut stmt = conn.prepare(sql).map_err(engine_error)?;
            let changed = stmt.execute([]).map_err(engine_error)?;
            let row_id = if changed > 0 { conn.last_insert_rowid() } else { -1 };
            Ok(if row_id > 0 { 1 } else { 0 })
        }
        StatementKind::UpdateOrDelete => {
            let mut stmt = conn.prepare(sql).map_err(engine_error)?;
            let changed = stmt.execute([]).map_err(engine_error)?;
            Ok(changed as i64)
        }
        StatementKind::Other => {
            conn.execute_batch(sql).map_err(engine_error)?;
            Ok(0)
        }
    }
}
