//! Request transport.
//!
//! Discovery, reads, and commands all go through a [`Transport`], so they
//! can be driven by something other than a live network in tests.

use futures::future::BoxFuture;
use log::debug;
use reqwest::Method;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};

use crate::config::AdapterConfig;
use crate::errors::Error;

type Result<T> = std::result::Result<T, Error>;

/// Issues a single request to a device and returns the response body.
///
/// Implementations apply a short fixed timeout and never retry; a failure
/// is reported to the caller as-is.
pub trait Transport: Send + Sync {
    fn get<'a>(&'a self, address: &'a str, path: &'a str) -> BoxFuture<'a, Result<String>>;

    fn post<'a>(&'a self, address: &'a str, path: &'a str) -> BoxFuture<'a, Result<String>>;
}

/// HTTP transport backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(config: &AdapterConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .default_headers(headers)
            .build()
            .map_err(Error::Client)?;
        Ok(Self::from_reqwest(client))
    }

    /// Wrap an already configured client.
    pub fn from_reqwest(client: reqwest::Client) -> Self {
        HttpTransport { client }
    }

    async fn send(&self, method: Method, address: &str, path: &str) -> Result<String> {
        let url = format!("http://{address}{path}");
        debug!("{method} {url}");

        let response = self
            .client
            .request(method, &url)
            .send()
            .await
            .map_err(|e| Self::map_err(address, path, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::status(address, path, status.as_u16()));
        }

        response
            .text()
            .await
            .map_err(|e| Self::map_err(address, path, e))
    }

    fn map_err(address: &str, path: &str, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::timeout(address, path)
        } else {
            Error::http(address, path, err)
        }
    }
}

impl Transport for HttpTransport {
    fn get<'a>(&'a self, address: &'a str, path: &'a str) -> BoxFuture<'a, Result<String>> {
        Box::pin(self.send(Method::GET, address, path))
    }

    fn post<'a>(&'a self, address: &'a str, path: &'a str) -> BoxFuture<'a, Result<String>> {
        Box::pin(self.send(Method::POST, address, path))
    }
}
