//! # Network
//!
//! The two async seams the SDK talks to the outside world through:
//! [`HttpClient`] for raw requests and [`NameResolver`] for name lookups.
//! Both are object safe so callers can swap in their own transport.

pub mod http;
pub mod resolver;

pub use http::{HttpClient, HttpError, HttpResponse, ReqwestHttpClient};
pub use resolver::{CoreNodeClient, NameInfo, NameLookupError, NameResolver, ZoneFileResponse};
