//! Client code for spielplan.
//!
//! This crate provides the cache-enabled HTTP fetch pipeline, the score-font
//! deobfuscation engine, and the site-specific scrape adapters shared by the
//! server.

pub mod fetch;
pub mod fonts;
pub mod scrape;

pub use fetch::{CachedClient, FetchConfig, FetchResponse};
pub use fonts::{FontMapper, FontMapping, decode_fragment, decode_span};
pub use scrape::Crawler;
