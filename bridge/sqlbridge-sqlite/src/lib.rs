///
/// sqlbridge SQLite Engine
///
/// Exposes one embedded SQLite database to a scripting host through a
/// uniform sync/async method protocol. Uses rusqlite with bundled SQLite
/// for zero system dependency.
///
/// Architecture:
/// - `Database` owns the single connection behind a mutex; all operations
///   other than open fail with `NoConnection` while it is absent.
/// - Query results are eagerly materialized into a `RowSet` so no cursor
///   outlives the call that produced it.
/// - Batches run statement by statement, optionally inside one transaction
///   that rolls back on drop unless committed.
/// - `SqliteModel` dispatches host method names and delivers async results
///   through the host's `ScriptEngine`.
///
/// Modules:
/// - connection: open, close, dispose
/// - executor: execute_one, query_one
/// - batch: StatementKind, execute_batch
/// - model: SqliteModel, invoke_sync, invoke_async
///

pub mod batch;
pub mod connection;
pub mod executor;
pub mod model;

pub use batch::{BatchFailure, StatementKind, execute_batch};
pub use connection::{Database, MEMORY_PATH, OpenTarget};
pub use executor::{execute_one, normalize_sql, query_one};
pub use model::{AsyncInvocation, SqliteModel};
