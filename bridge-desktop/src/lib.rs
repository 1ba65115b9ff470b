//! Desktop bridge implementations.
//!
//! Concrete adapters for the `bridge-traits` capabilities on desktop
//! platforms. Currently this is the reqwest-backed [`ReqwestHttpClient`].

pub mod http;

pub use http::ReqwestHttpClient;
