//! # Magination
//!
//! Merges multiple independently-paginated result sources into one
//! deduplicated, resumable, cursor-driven stream.
//!
//! ## Features
//!
//! - **Single-source pagination**: wrap any upstream query function in a
//!   [`Source`] with a local cache that amortizes upstream calls across
//!   page boundaries (at most one call per load)
//! - **Multi-source merge**: [`Magination`] runs all sources in parallel
//!   per round but yields their pages in a fixed priority order
//! - **Dedup**: a hit is never returned twice, across sources and across
//!   the entire merge history
//! - **Resumable**: every page carries an opaque cursor; merge state is
//!   persisted incrementally, so a chain survives interruption and even
//!   process restarts
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use futures::StreamExt;
//! use magination::{JsonHasher, Magination, MemoryStore, Source};
//!
//! #[tokio::main]
//! async fn main() -> magination::Result<()> {
//!     let magination = Magination::new(vec![
//!         Source::new("recent", 10, Arc::new(recent_fetcher)),
//!         Source::new("archive", 10, Arc::new(archive_fetcher)),
//!     ])?;
//!
//!     let store = Arc::new(MemoryStore::new());
//!     let mut pages = magination.load(store, Arc::new(JsonHasher), None);
//!     while let Some(page) = pages.next().await {
//!         let page = page?;
//!         // Render page.hits; remember page.cursor to resume later.
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! caller ──► Magination::load(cursor)
//!               │  one round: all active sources started in parallel,
//!               │  drained in configured priority order
//!               ├──► Source::load ──► upstream fetcher (≤ 1 call)
//!               │        ▲ scoped cache view over the merge slot
//!               └──► Store: one consolidated write per drained source
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]

/// Error types
pub mod error;

/// Common types: pages, preload sizing
pub mod types;

/// Cursor codec
pub mod cursor;

/// Item hashing for dedup
pub mod hasher;

/// Key-value store interface and implementations
pub mod store;

/// Single-source paginator
pub mod source;

/// Multi-source merge orchestrator
pub mod merge;

pub use error::{Error, Result};
pub use hasher::{Hasher, JsonHasher};
pub use merge::{Magination, MergedPage, PageStream};
pub use source::{Fetcher, Source, SourceSlot};
pub use store::{JsonFileStore, MemoryStore, Store};
pub use types::{Page, PreloadSize};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
