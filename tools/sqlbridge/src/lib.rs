///
/// # sqlbridge — command-line host for the SQL bridge
///
/// Plays the host role for `sqlbridge-sqlite`: resolves database names
/// under a configured data directory, dispatches invocation lines, and
/// collects async callbacks.
///
/// ```sh
/// sqlbridge --data-dir ./data script.jsonl
/// sqlbridge --config sqlbridge.toml < script.jsonl
/// ```
///

pub mod config;
pub mod errors;
pub mod host;
pub mod script;

pub use config::BridgeConfig;
pub use errors::ToolError;
pub use host::{CallbackRecord, ChannelEngine};
pub use script::{Invocation, ReplayStats, replay};
