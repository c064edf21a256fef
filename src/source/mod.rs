//! Feed source abstraction layer.
//!
//! This module defines the [`FeedSource`] trait, the common [`FeedItem`]
//! type and the error types produced while fetching.  The only production
//! source is [`KrisinformationSource`]; tests plug scripted sources into the
//! poller through the same trait.
//!
//! ## For contributors: adding a new source
//!
//! 1. Create a new file in this directory (e.g. `mirror.rs`).
//! 2. Define a struct and implement [`FeedSource`] for it.
//! 3. Add `mod mirror;` below and re-export your struct in the `pub use` block.
//! 4. Construct it in `main.rs` instead of `KrisinformationSource`.

mod error;
mod feed_item;
mod krisinformation;

pub use error::{FailureDetail, FetchError};
#[cfg(test)]
pub use feed_item::Area;
pub use feed_item::{AreaKind, FeedItem};
pub use krisinformation::{KrisinformationSource, DEFAULT_ENDPOINT, DEFAULT_TIMEOUT};

use std::future::Future;

/// Trait that every feed source must implement.
///
/// The poller calls [`fetch()`](FeedSource::fetch) from a tokio task, so
/// implementations must be [`Send`] + [`Sync`] and return a `Send` future.
pub trait FeedSource: Send + Sync + 'static {
    /// Human-readable label used in logs.
    fn name(&self) -> &str;

    /// Fetch the complete current feed.
    ///
    /// Exactly one request per call; retrying is the poller's business.
    fn fetch(&self) -> impl Future<Output = Result<Vec<FeedItem>, FetchError>> + Send;
}
