//! Romgrab Core Library
//!
//! This library provides the core functionality for the romgrab tool, which
//! navigates remote "index of" directory listings, filters their file entries
//! by name, and downloads the selection with retry and progress reporting.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`listing`] - Anchor extraction and resolution of listing pages
//! - [`filter`] - Include/exclude filename filtering
//! - [`fetch`] - HTTP transport seam and the shared page cache
//! - [`nav`] - Navigation state machine over the remote tree
//! - [`download`] - Sequential download orchestration with retry
//! - [`events`] - Events the core emits toward the presentation layer
//! - [`config`] - Immutable per-run configuration snapshot
//! - [`session`] - Owned wiring of cache, transport, navigator, orchestrator

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod download;
pub mod events;
pub mod fetch;
pub mod filter;
pub mod listing;
pub mod nav;
pub mod session;

// Re-export commonly used types
pub use config::{Config, ConfigError};
pub use download::{
    BatchReport, BatchSummary, DownloadTask, FailureKind, Orchestrator, RetryDecision,
    RetryPolicy, SkipReason, TaskState, classify_fetch_error,
};
pub use events::{Event, EventReceiver, EventSender, event_channel};
pub use fetch::{CacheStats, FetchCache, FetchError, FetchResponse, HttpTransport, Transport};
pub use filter::FilterConfig;
pub use listing::{
    Entry, EntryKind, ListingSnapshot, RawLink, extract_links, resolve, resolve_menu,
};
pub use nav::{NavError, NavState, Navigator};
pub use session::Session;
