//! Offline resource cache.
//!
//! Every outbound resource request is classified by host and path, then
//! served from one of a fixed set of versioned buckets:
//! - cache-first for the app shell, static assets, fonts, CDN code and PDFs
//! - network-first for the Quran API and same-origin data services
//! - never cached for audio and unknown foreign origins
//!
//! Buckets are invalidated only as a whole, by bumping the version tag.

mod buckets;
mod classify;
mod http;
mod layer;
mod router;
mod storage;
mod traits;

pub use buckets::{Bucket, BucketSet};
pub use classify::{PassReason, Route, Strategy};
pub use http::HttpFetcher;
pub use router::{BucketStats, CacheRouter, InstallReport, RouterResponse};
pub use storage::SqliteStorage;
pub use traits::CacheSource;
