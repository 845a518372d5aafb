///
/// # Invocation Script Replay
///
/// A script is one JSON object per line:
///
/// ```text
/// {"method": "open", "params": {"path": "app.db"}}
/// {"method": "executeSync", "params": {"sql": "create table t (a)"}}
/// {"method": "query", "params": {"sql": "select * from t"}, "callback": "cb1"}
/// ```
///
/// Lines without `callback` are dispatched synchronously and print
/// `{"method": ..., "result": ...}`. Lines with `callback` are dispatched
/// asynchronously; the replay waits for the task and prints
/// `{"callback": ..., "result": ...}`. A method that raises prints
/// `{"method": ..., "raised": "<message>"}`. Blank lines and lines
/// starting with `#` are skipped.
///
/// Each async invocation is awaited before the next line is read, so the
/// model only ever sees one operation at a time.
///

use std::io::{BufRead, Write};
use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Value, json};
use sqlbridge_core::{InvocationResult, ScriptEngine};
use sqlbridge_sqlite::SqliteModel;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, warn};

use crate::errors::ToolError;
use crate::host::{CallbackRecord, ChannelEngine};

#[derive(Debug, Deserialize)]
pub struct Invocation {
    pub method: String,
    #[serde(default)]
    pub params: Value,
    #[serde(default)]
    pub callback: Option<String>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReplayStats {
    pub invocations: usize,
    pub callbacks: usize,
    pub raised: usize,
}

pub fn parse_line(line: &str, number: usize) -> Result<Option<Invocation>, ToolError> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }
    serde_json::from_str(trimmed)
        .map(Some)
        .map_err(|e| ToolError::Script {
            line: number,
            reason: e.to_string(),
        })
}

fn envelope_line(key: &str, name: &str, result: &InvocationResult) -> Result<Value, ToolError> {
    let mut line = serde_json::to_value(result)?;
    if let Value::Object(map) = &mut line {
        map.insert(key.to_string(), Value::String(name.to_string()));
    }
    Ok(line)
}

fn write_line<W: Write>(out: &mut W, line: &Value) -> Result<(), ToolError> {
    serde_json::to_writer(&mut *out, line)?;
    out.write_all(b"\n")?;
    Ok(())
}

fn drain_callbacks<W: Write>(
    callbacks: &mut UnboundedReceiver<CallbackRecord>,
    out: &mut W,
    stats: &mut ReplayStats,
) -> Result<(), ToolError> {
    while let Ok(record) = callbacks.try_recv() {
        stats.callbacks += 1;
        write_line(out, &envelope_line("callback", &record.name, &record.result)?)?;
    }
    Ok(())
}

pub async fn replay<R: BufRead, W: Write>(
    model: &SqliteModel,
    input: R,
    out: &mut W,
) -> Result<ReplayStats, ToolError> {
    let (engine, mut callbacks) = ChannelEngine::new();
    let engine: Arc<dyn ScriptEngine> = Arc::new(engine);
    let mut stats = ReplayStats::default();

    for (index, line) in input.lines().enumerate() {
        let line = line?;
        let Some(invocation) = parse_line(&line, index + 1)? else {
            continue;
        };
        stats.invocations += 1;
        debug!("Replaying {} (line {})", invocation.method, index + 1);

        let Some(callback) = invocation.callback else {
            match model.invoke_sync(&invocation.method, &invocation.params) {
                Ok(result) => write_line(out, &envelope_line("method", &invocation.method, &result)?)?,
                Err(e) => {
                    stats.raised += 1;
                    write_line(out, &json!({"method": invocation.method, "raised": e.to_string()}))?;
                }
            }
            continue;
        };

        match model.invoke_async(&invocation.method, invocation.params, engine.clone(), callback) {
            Ok(task) => {
                match task.await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => {
                        stats.raised += 1;
                        warn!("{} raised after calling back: {}", invocation.method, e);
                    }
                    Err(e) => return Err(ToolError::Task(e.to_string())),
                }
                drain_callbacks(&mut callbacks, out, &mut stats)?;
            }
            Err(e) => {
                stats.raised += 1;
                write_line(out, &json!({"method": invocation.method, "raised": e.to_string()}))?;
            }
        }
    }

    out.flush()?;
    Ok(stats)
}
