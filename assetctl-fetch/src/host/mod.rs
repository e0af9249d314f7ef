//! Host APIs used by `assetctl` commands.
//!
//! - [`http`] - reqwest-backed [`AssetSource`](crate::AssetSource) for the platform API

pub mod http;

pub use http::PlatformClient;
