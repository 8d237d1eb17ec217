//! Process-wide default client
//!
//! Entity operations without an explicit client use the handle installed
//! here. It is set once and never replaced.

use crate::client::Client;
use crate::error::{ClientError, Result};
use elo_core::ClientConfig;
use std::sync::OnceLock;

static DEFAULT_CLIENT: OnceLock<Client> = OnceLock::new();

/// Connect with `config` and install the result as the default client
pub fn setup(config: &ClientConfig) -> Result<&'static Client> {
    install(Client::connect(config)?)
}

/// Install an already-built client as the default
pub fn install(handle: Client) -> Result<&'static Client> {
    let base_url = handle.base_url().clone();
    DEFAULT_CLIENT.set(handle).map_err(|_| {
        ClientError::usage("session is already set up; the default client cannot be replaced")
    })?;
    tracing::info!(base_url = %base_url, "Default Elo client installed");
    client()
}

/// The default client. Fails until `setup` or `install` has run.
pub fn client() -> Result<&'static Client> {
    DEFAULT_CLIENT
        .get()
        .ok_or_else(|| ClientError::usage("elo_rs::session::setup(...) must be called before using entities"))
}

/// Whether a default client is installed
pub fn is_set_up() -> bool {
    DEFAULT_CLIENT.get().is_some()
}
