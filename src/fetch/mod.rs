//! Fetching: the HTTP transport seam and the shared page cache.
//!
//! The rest of the core depends only on the [`Transport`] trait, which
//! models "fetch this URL, give me bytes or a failure". The concrete
//! [`HttpTransport`] wraps a reqwest client built once per session with the
//! configured timeout and user agent; tests substitute their own transport.

mod cache;
mod transport;

pub use cache::{CacheEntryInfo, CacheStats, FetchCache};
pub use transport::{ByteStream, FetchError, FetchResponse, HttpTransport, Transport};
