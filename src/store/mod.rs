//! Durable key-value store interface and bundled implementations
//!
//! The core reads and writes slot records exclusively through [`Store`];
//! callers may bring any backend. No transactional guarantees are required
//! beyond per-key atomicity of a single write.
//!
//! # Overview
//!
//! - [`Store`] - the async read/write-by-string-key trait
//! - [`MemoryStore`] - in-process map, for tests and simple embedding
//! - [`JsonFileStore`] - single JSON file with atomic writes

mod file;
mod memory;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

/// A key-value store holding structured slot records keyed by cursor keys.
///
/// The core never deletes records; garbage collection of old slots is a
/// storage-layer concern.
#[async_trait]
pub trait Store: Send + Sync {
    /// Read the value stored under `key`, if any.
    async fn read(&self, key: &str) -> Result<Option<Value>>;

    /// Write `value` under `key`, replacing any previous value.
    async fn write(&self, key: &str, value: Value) -> Result<()>;
}
