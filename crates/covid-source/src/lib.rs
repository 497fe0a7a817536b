//! Fetching and refreshing for the dashboard.
//!
//! A [`FeedSource`] yields the raw feed documents; [`Dashboard`] runs one
//! refresh to completion (fetch, normalise, derive) and publishes the result
//! as an immutable [`Snapshot`]. A failed refresh publishes nothing and leaves
//! the previous snapshot in place.

mod geometry;
mod http;
mod session;

pub mod error;
pub mod source;

pub use error::{Error, Result};
pub use geometry::{GeometryConfig, GeometrySet};
pub use http::{FeedUrls, HttpSource};
pub use session::{Dashboard, Snapshot};
pub use source::{Feed, FeedSource, MemorySource};
