//! # Feedsync Testkit
//!
//! Test utilities for feedsync.
//!
//! This crate provides:
//! - Model fixtures with deterministic timestamps
//! - Property-based test generators using proptest
//! - An in-memory [`FeedsBackend`](feedsync_client::FeedsBackend) that
//!   records the real-time events a server would broadcast
//! - Replay files for CLI tests
//!
//! ## Usage
//!
//! ```rust,ignore
//! use feedsync_testkit::prelude::*;
//!
//! #[tokio::test]
//! async fn loads_a_feed() {
//!     let backend = Arc::new(InMemoryBackend::new("alice"));
//!     backend.insert_activity(activity("a1", &user_feed("alice"), 1));
//!     let client = FeedsClient::new(ClientConfig::new("alice"), backend.clone());
//!     // ...
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod backend;
pub mod fixtures;
pub mod generators;
pub mod replay;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::backend::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::replay::*;
}

pub use backend::InMemoryBackend;
pub use fixtures::*;
pub use replay::ReplayFiles;
