//! Shared harness: a wiremock server driven from a private tokio runtime so
//! the blocking client can be called from plain `#[test]` functions.

#![allow(dead_code)]

use elo_rs::{Client, ClientConfig};
use serde_json::Value;
use tokio::runtime::Runtime;
use tracing_subscriber::EnvFilter;
use wiremock::{Mock, MockServer, Request};

pub const API_KEY: &str = "test_token";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub struct TestServer {
    // Declared before the runtime so expectations are verified while it is alive
    pub server: MockServer,
    runtime: Runtime,
}

impl TestServer {
    pub fn start() -> Self {
        init_tracing();
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .expect("tokio runtime");
        let server = runtime.block_on(MockServer::start());
        Self { server, runtime }
    }

    pub fn mount(&self, mock: Mock) {
        self.runtime.block_on(mock.mount(&self.server));
    }

    pub fn client(&self) -> Client {
        Client::connect(&ClientConfig::new(self.server.uri()).with_api_key(API_KEY))
            .expect("client")
    }

    pub fn received(&self) -> Vec<Request> {
        self.runtime
            .block_on(self.server.received_requests())
            .unwrap_or_default()
    }

    /// JSON bodies of received requests matching method and path
    pub fn bodies(&self, method: &str, path: &str) -> Vec<Value> {
        self.received()
            .into_iter()
            .filter(|r| r.method.as_str() == method && r.url.path() == path)
            .map(|r| serde_json::from_slice(&r.body).expect("json body"))
            .collect()
    }
}
