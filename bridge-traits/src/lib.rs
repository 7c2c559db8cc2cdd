//! # Host Bridge Traits
//!
//! Platform abstraction traits implemented by each host.
//!
//! ## Overview
//!
//! This crate defines the contract between the content core and
//! platform-specific implementations. Each trait is a capability the core
//! requires but that differs per host (desktop process, browser, tests).
//!
//! ## Traits
//!
//! ### Networking & I/O
//! - [`HttpClient`](http::HttpClient) - Async HTTP with token auth, retry and timeouts
//! - [`DocumentSource`](storage::DocumentSource) - Remote repository of markdown documents
//! - [`FileSystemAccess`](storage::FileSystemAccess) - Local content mirror I/O
//!
//! ### Playback
//! - [`MediaElement`](playback::MediaElement) - The single audio resource owned by a player session
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Implementations
//! should convert platform errors into it and keep the retryable/fatal
//! distinction intact (see [`BridgeError::is_retryable`]).
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so implementations can be shared
//! across async tasks behind `Arc`.

pub mod error;
pub mod http;
pub mod playback;
pub mod storage;
pub mod time;

pub use error::BridgeError;

pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
pub use playback::MediaElement;
pub use storage::{DocumentSource, FileSystemAccess, RemoteDocument};
pub use time::{Clock, LogLevel, ManualClock, SystemClock};
