///
/// Callback sink for async invocations.
///
/// Worker threads hand callback payloads to the replay loop through an
/// unbounded channel, so only the replay loop ever writes to the output.
///

use sqlbridge_core::{InvocationResult, ScriptEngine};
use tokio::sync::mpsc;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct CallbackRecord {
    pub name: String,
    pub result: InvocationResult,
}

pub struct ChannelEngine {
    tx: mpsc::UnboundedSender<CallbackRecord>,
}

impl ChannelEngine {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<CallbackRecord>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ScriptEngine for ChannelEngine {
    fn callback(&self, callback_name: &str, result: InvocationResult) {
        let record = CallbackRecord {
            name: callback_name.to_string(),
            result,
        };
        if self.tx.send(record).is_err() {
            warn!("Callback '{}' dropped: receiver closed", callback_name);
        }
    }
}
