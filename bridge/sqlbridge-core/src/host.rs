///
/// Host collaborators.
///
/// The bridge never talks to the scripting host directly. Async results go
/// out through a `ScriptEngine`, and database names coming from scripts are
/// turned into filesystem paths by a `DataFs`.
///
/// `DataRoot` is the stock `DataFs`: names are resolved under one data
/// directory, with an optional `data://` scheme prefix stripped first.
/// Absolute paths are taken as-is.
///

use std::path::{Path, PathBuf};

use crate::value::InvocationResult;

pub const DATA_SCHEME: &str = "data://";

/// Receives the result of an async invocation.
///
/// Called exactly once per async invocation, from a worker thread.
pub trait ScriptEngine: Send + Sync {
    fn callback(&self, callback_name: &str, result: InvocationResult);
}

/// Maps an application-relative file name to an absolute path.
pub trait DataFs: Send + Sync {
    fn full_path(&self, name: &str) -> PathBuf;
}

#[derive(Debug, Clone)]
pub struct DataRoot {
    root: PathBuf,
}

impl DataRoot {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl DataFs for DataRoot {
    fn full_path(&self, name: &str) -> PathBuf {
        if let Some(relative) = name.strip_prefix(DATA_SCHEME) {
            return self.root.join(relative.trim_start_matches('/'));
        }
        let path = Path::new(name);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}
