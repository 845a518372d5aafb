///
/// The SQLite bridge component.
///
/// `SqliteModel` is what the host instantiates. It receives a method name
/// plus an opaque parameter dictionary and answers with an
/// `InvocationResult`:
///
/// | Method         | Params                | Delivery                   |
/// |----------------|-----------------------|----------------------------|
/// | open           | path                  | sync, boolean              |
/// | close          | -                     | sync, boolean              |
/// | executeSync    | sql, bind?            | sync, boolean              |
/// | execute        | sql, bind?            | callback, boolean          |
/// | querySync      | sql, bind?            | sync, rows                 |
/// | query          | sql, bind?            | callback, rows             |
/// | executeSync1   | sqls, isTransaction?  | sync, count (+ error)      |
/// | execute1       | sqls, isTransaction?  | callback, count (+ error)  |
///
/// Engine failures are logged and folded into the envelope. Empty SQL and
/// malformed parameters are returned as errors from the sync methods. The
/// async methods run on tokio's blocking pool and must be called from
/// within a tokio runtime; their callback fires exactly once, after the
/// operation finished, even if it raised or panicked.
///

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use sqlbridge_core::params::{get_array, get_bool, get_string, get_string_list};
use sqlbridge_core::{BindValue, BridgeError, DataFs, InvocationResult, ScriptEngine};
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::batch::{BatchFailure, execute_batch};
use crate::connection::{Database, OpenTarget};
use crate::executor::{execute_one, normalize_sql, query_one};

pub const METHOD_OPEN: &str = "open";
pub const METHOD_CLOSE: &str = "close";
pub const METHOD_EXECUTE_SYNC: &str = "executeSync";
pub const METHOD_EXECUTE: &str = "execute";
pub const METHOD_QUERY_SYNC: &str = "querySync";
pub const METHOD_QUERY: &str = "query";
pub const METHOD_EXECUTE_SYNC1: &str = "executeSync1";
pub const METHOD_EXECUTE1: &str = "execute1";

/// Completion of an async invocation. Resolves after the callback fired.
pub type AsyncInvocation = JoinHandle<Result<(), BridgeError>>;

/// One statement read from `sql` / `bind`.
struct SingleStatement {
    sql: String,
    binds: Vec<BindValue>,
}

impl SingleStatement {
    fn from_params(params: &Value, context: &'static str) -> Result<Self, BridgeError> {
        let raw = get_string(params, "sql", "");
        let sql = normalize_sql(&raw, context)?.to_string();
        let binds = get_array(params, "bind")?
            .map(BindValue::list_from_json)
            .unwrap_or_default();
        Ok(Self { sql, binds })
    }
}

/// Fires the host callback exactly once, falling back to an empty
/// envelope if the work is unwound before delivering.
struct CallbackDelivery {
    engine: Arc<dyn ScriptEngine>,
    name: String,
    delivered: bool,
}

impl CallbackDelivery {
    fn new(engine: Arc<dyn ScriptEngine>, name: String) -> Self {
        Self {
            engine,
            name,
            delivered: false,
        }
    }

    fn deliver(mut self, result: InvocationResult) {
        self.delivered = true;
        self.engine.callback(&self.name, result);
    }
}

impl Drop for CallbackDelivery {
    fn drop(&mut self) {
        if !self.delivered {
            self.delivered = true;
            self.engine.callback(&self.name, InvocationResult::new());
        }
    }
}

#[derive(Clone)]
pub struct SqliteModel {
    database: Arc<Database>,
    fs: Arc<dyn DataFs>,
}

impl SqliteModel {
    pub fn new(fs: Arc<dyn DataFs>) -> Self {
        Self {
            database: Arc::new(Database::new()),
            fs,
        }
    }

    pub fn is_open(&self) -> bool {
        self.database.is_open()
    }

    /// Rejects property changes that blank out `path` or `sql`.
    pub fn on_properties_changing(changes: &HashMap<String, String>) -> bool {
        ["path", "sql"]
            .iter()
            .all(|key| changes.get(*key).is_none_or(|value| !value.is_empty()))
    }

    pub fn invoke_sync(&self, method: &str, params: &Value) -> Result<InvocationResult, BridgeError> {
        match method {
            METHOD_OPEN => Ok(self.open(params)),
            METHOD_CLOSE => Ok(self.close()),
            METHOD_EXECUTE_SYNC => self.execute_sync(params),
            METHOD_QUERY_SYNC => self.query_sync(params),
            METHOD_EXECUTE_SYNC1 => self.execute_sync1(params),
            _ => Err(BridgeError::UnknownMethod(method.to_string())),
        }
    }

    pub fn invoke_async(
        &self,
        method: &str,
        params: Value,
        engine: Arc<dyn ScriptEngine>,
        callback: impl Into<String>,
    ) -> Result<AsyncInvocation, BridgeError> {
        match method {
            METHOD_EXECUTE => Ok(self.execute(params, engine, callback)),
            METHOD_QUERY => Ok(self.query(params, engine, callback)),
            METHOD_EXECUTE1 => Ok(self.execute1(params, engine, callback)),
            _ => Err(BridgeError::UnknownMethod(method.to_string())),
        }
    }

    pub fn open(&self, params: &Value) -> InvocationResult {
        let path = get_string(params, "path", "");
        let opened = OpenTarget::resolve(&path, self.fs.as_ref())
            .and_then(|target| self.database.open(&target));
        match opened {
            Ok(()) => {
                info!("SQLite database opened: {}", path);
                InvocationResult::boolean(true)
            }
            Err(BridgeError::EmptyPath) => {
                info!("SQLite open failed: path is empty");
                InvocationResult::boolean(false)
            }
            Err(e) => {
                error!("SQLite open failed for '{}': {}", path, e);
                InvocationResult::boolean(false)
            }
        }
    }

    pub fn close(&self) -> InvocationResult {
        match self.database.close() {
            Ok(()) => InvocationResult::boolean(true),
            Err(e) => {
                error!("SQLite close failed: {}", e);
                InvocationResult::boolean(false)
            }
        }
    }

    pub fn dispose(&self) {
        self.database.dispose();
    }

    pub fn execute_sync(&self, params: &Value) -> Result<InvocationResult, BridgeError> {
        let statement = SingleStatement::from_params(params, "execute")?;
        let executed = self
            .database
            .with_connection(|conn| execute_one(conn, &statement.sql, &statement.binds));
        if let Err(e) = &executed {
            error!("SQLite execute failed: {}", e);
        }
        Ok(InvocationResult::boolean(executed.is_ok()))
    }

    pub fn query_sync(&self, params: &Value) -> Result<InvocationResult, BridgeError> {
        let statement = SingleStatement::from_params(params, "query")?;
        let mut result = InvocationResult::new();
        match self
            .database
            .with_connection(|conn| query_one(conn, &statement.sql, &statement.binds))
        {
            Ok(rows) => result.set_rows(rows),
            Err(e) => error!("SQLite query failed: {}", e),
        }
        Ok(result)
    }

    pub fn execute_sync1(&self, params: &Value) -> Result<InvocationResult, BridgeError> {
        let sqls = get_string_list(params, "sqls")?;
        let transactional = get_bool(params, "isTransaction", false);
        let mut result = InvocationResult::new();
        match self.run_batch(&sqls, transactional) {
            Ok(count) => result.set_integer(count),
            Err(BatchFailure { count, error: e }) => {
                error!("SQLite batch failed: {}", e);
                result.set_error(e.to_string());
                result.set_integer(count);
            }
        }
        Ok(result)
    }

    fn run_batch(&self, sqls: &[String], transactional: bool) -> Result<i64, BatchFailure> {
        if sqls.is_empty() {
            return Ok(0);
        }
        self.database
            .with_connection(|conn| Ok(execute_batch(conn, sqls, transactional)))
            .unwrap_or_else(|e| Err(BatchFailure::new(0, e)))
    }

    pub fn execute(
        &self,
        params: Value,
        engine: Arc<dyn ScriptEngine>,
        callback: impl Into<String>,
    ) -> AsyncInvocation {
        self.spawn_delivery(engine, callback.into(), move |model| model.execute_sync(&params))
    }

    pub fn query(
        &self,
        params: Value,
        engine: Arc<dyn ScriptEngine>,
        callback: impl Into<String>,
    ) -> AsyncInvocation {
        self.spawn_delivery(engine, callback.into(), move |model| model.query_sync(&params))
    }

    pub fn execute1(
        &self,
        params: Value,
        engine: Arc<dyn ScriptEngine>,
        callback: impl Into<String>,
    ) -> AsyncInvocation {
        self.spawn_delivery(engine, callback.into(), move |model| model.execute_sync1(&params))
    }

    fn spawn_delivery<F>(&self, engine: Arc<dyn ScriptEngine>, callback: String, work: F) -> AsyncInvocation
    where
        F: FnOnce(&SqliteModel) -> Result<InvocationResult, BridgeError> + Send + 'static,
    {
        let model = self.clone();
        tokio::task::spawn_blocking(move || {
            let delivery = CallbackDelivery::new(engine, callback);
            match work(&model) {
                Ok(result) => {
                    delivery.deliver(result);
                    Ok(())
                }
                Err(e) => {
                    error!("SQLite async invocation failed: {}", e);
                    delivery.deliver(InvocationResult::failed(&e));
                    Err(e)
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sqlbridge_core::DataRoot;

    fn model() -> SqliteModel {
        SqliteModel::new(Arc::new(DataRoot::new(std::env::temp_dir())))
    }

    fn open_memory(model: &SqliteModel) {
        let result = model.invoke_sync("open", &json!({"path": ":memory:"})).unwrap();
        assert_eq!(result.as_bool(), Some(true));
    }

    #[test]
    fn test_open_empty_path_fails_quietly() {
        let model = model();
        let result = model.invoke_sync("open", &json!({"path": ""})).unwrap();
        assert_eq!(result.as_bool(), Some(false));
        let result = model.invoke_sync("open", &json!({})).unwrap();
        assert_eq!(result.as_bool(), Some(false));
        assert!(!model.is_open());
    }

    #[test]
    fn test_close_without_open_succeeds() {
        let model = model();
        assert_eq!(model.close().as_bool(), Some(true));
        assert_eq!(model.close().as_bool(), Some(true));
    }

    #[test]
    fn test_execute_without_connection_is_false() {
        let model = model();
        let result = model
            .invoke_sync("executeSync", &json!({"sql": "create table t (a)"}))
            .unwrap();
        assert_eq!(result.as_bool(), Some(false));
    }

    #[test]
    fn test_empty_sql_is_raised() {
        let model = model();
        open_memory(&model);
        let err = model
            .invoke_sync("executeSync", &json!({"sql": "   "}))
            .unwrap_err();
        assert!(matches!(err, BridgeError::EmptySql { context: "execute" }));
        let err = model.invoke_sync("querySync", &json!({})).unwrap_err();
        assert!(matches!(err, BridgeError::EmptySql { context: "query" }));
    }

    #[test]
    fn test_query_failure_has_no_rows() {
        let model = model();
        open_memory(&model);
        let result = model
            .invoke_sync("querySync", &json!({"sql": "select * from missing"}))
            .unwrap();
        assert!(result.as_rows().is_none());
        assert!(result.error().is_none());
    }

    #[test]
    fn test_batch_without_connection_reports_error() {
        let model = model();
        let result = model
            .invoke_sync("executeSync1", &json!({"sqls": ["insert into t values (1)"]}))
            .unwrap();
        assert_eq!(result.as_integer(), Some(0));
        assert!(result.error().unwrap().contains("no open database connection"));
    }

    #[test]
    fn test_empty_batch_without_connection_is_zero() {
        let model = model();
        for params in [json!({"sqls": []}), json!({}), json!({"sqls": [], "isTransaction": true})] {
            let result = model.invoke_sync("executeSync1", &params).unwrap();
            assert_eq!(result.as_integer(), Some(0));
            assert!(result.error().is_none());
        }
    }

    #[test]
    fn test_unknown_methods() {
        let model = model();
        assert!(matches!(
            model.invoke_sync("execute", &json!({})),
            Err(BridgeError::UnknownMethod(_))
        ));
        assert!(matches!(
            model.invoke_sync("vacuum", &json!({})),
            Err(BridgeError::UnknownMethod(_))
        ));
    }

    #[test]
    fn test_bind_must_be_array() {
        let model = model();
        open_memory(&model);
        let err = model
            .invoke_sync("executeSync", &json!({"sql": "select 1", "bind": "x"}))
            .unwrap_err();
        assert!(matches!(err, BridgeError::InvalidParams(_)));
    }

    #[test]
    fn test_property_validation() {
        let mut changes = HashMap::new();
        assert!(SqliteModel::on_properties_changing(&changes));
        changes.insert("path".to_string(), "app.db".to_string());
        assert!(SqliteModel::on_properties_changing(&changes));
        changes.insert("sql".to_string(), String::new());
        assert!(!SqliteModel::on_properties_changing(&changes));
        changes.insert("sql".to_string(), "select 1".to_string());
        changes.insert("path".to_string(), String::new());
        assert!(!SqliteModel::on_properties_changing(&changes));
    }
}
