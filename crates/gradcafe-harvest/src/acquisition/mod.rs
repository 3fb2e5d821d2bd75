//! Acquisition: fetching raw survey markup over HTTP.

pub mod http_client;

pub use http_client::{HttpFetcher, PageFetcher};
