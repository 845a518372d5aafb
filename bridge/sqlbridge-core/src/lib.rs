//!
//! sqlbridge-core - Host Boundary Types
//!
//! This crate provides the types shared by the bridge components and the
//! host that drives them:
//!
//! - `BindValue` for positional statement parameters
//! - `RowSet` for materialized query results (column name -> string value)
//! - `InvocationResult`, the envelope returned to the caller or callback
//! - `params` helpers for reading opaque parameter dictionaries
//! - `BridgeError`, the error type for every bridge operation
//! - `ScriptEngine` and `DataFs`, the host collaborators
//!
//! Nothing in this crate talks to a database engine.
//!

pub mod error;
pub mod host;
pub mod params;
pub mod value;

pub use error::BridgeError;
pub use host::{DataFs, DataRoot, ScriptEngine};
pub use value::{BindValue, InvocationResult, ResultValue, Row, RowSet};
