//! # jcapi
//!
//! Blocking client for the JumpCloud v2 API.
//!
//! This crate provides the HTTP side of the reconciler:
//! - [`HttpClient`], an implementation of [`declarative::RemoteClient`]
//! - Authentication with the `x-api-key` and `x-org-id` headers
//! - Per-request timeouts derived from the operation deadline
//! - Status classification (404 is not found, other failures keep the body)
//!
//! ## Example
//!
//! ```no_run
//! use declarative::{CredentialResolver, Provider, ProviderConfig};
//!
//! let mut provider = Provider::jumpcloud();
//! let diagnostics = provider.configure(
//!     &ProviderConfig::default(),
//!     &CredentialResolver::new(),
//!     jcapi::connector,
//! );
//! assert!(!diagnostics.has_error());
//! ```

#![warn(missing_docs)]

pub mod client;
pub mod config;
pub mod error;

pub use client::HttpClient;
pub use config::{ClientConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
pub use error::{Error, Result};

use declarative::{AdapterResult, Credentials, ProviderConfig, RemoteClient};
use std::sync::Arc;

/// Build a shared client; matches the connect hook of
/// [`declarative::Provider::configure`].
///
/// # Errors
///
/// Returns an adapter error if the provider configuration is unusable.
pub fn connector(
    credentials: &Credentials,
    provider: &ProviderConfig,
) -> AdapterResult<Arc<dyn RemoteClient>> {
    let client = HttpClient::connect(credentials, provider)?;
    Ok(Arc::new(client))
}
