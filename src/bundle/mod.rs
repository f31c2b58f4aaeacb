//! Bundle collaborators used by the reload path.
//!
//! A reload either hands a local bundle file to the host
//! ([`DevCommandsHandler`]) or fetches a fresh bundle from the development
//! server ([`BundleFetcher`]). Neither the bundle format nor the server
//! protocol is owned here; these traits are the seam.

pub mod server;

pub use server::DevServerHelper;

use crate::domain::error::{DevSupportError, Result};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Host-side commands issued by the controller.
#[async_trait]
pub trait DevCommandsHandler: Send + Sync {
    /// Reloads the application from `bundle_file`.
    ///
    /// Completes once the host has accepted the file. Usually immediate.
    async fn reload_from_file(&self, bundle_file: &str) -> Result<()>;
}

/// Downloads a bundle from the development server.
#[async_trait]
pub trait BundleFetcher: Send + Sync {
    /// Fetches `bundle_name` (or the server default when `None`).
    ///
    /// Implementations should stop early once `token` is cancelled; the
    /// controller abandons the fetch at that point regardless.
    async fn fetch_from_server(&self, bundle_name: Option<&str>, token: CancellationToken) -> Result<()>;
}

/// Fetcher for hosts that have no development server support.
///
/// Every fetch fails with [`DevSupportError::Unavailable`], which the reload
/// path reports like any other reload failure.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableBundleFetcher;

#[async_trait]
impl BundleFetcher for UnavailableBundleFetcher {
    async fn fetch_from_server(&self, _bundle_name: Option<&str>, _token: CancellationToken) -> Result<()> {
        Err(DevSupportError::Unavailable("loading from the bundle server"))
    }
}
