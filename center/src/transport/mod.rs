// III-IV
// Copyright 2023 Julio Merino
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! Abstraction over the HTTP client that talks to remote services.

use crate::options::ServiceCenterOptions;
use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderMap, Method};
use log::debug;
use std::time::Duration;
use url::Url;

#[cfg(any(test, feature = "testutils"))]
pub mod testutils;

/// Transport errors.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum TransportError {
    /// Indicates that the request did not complete within its timeout.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Indicates a failure to reach the remote server.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Catch-all for any other failure in the HTTP client.
    #[error("{0}")]
    Other(String),
}

/// Result type for this module.
pub type TransportResult<T> = Result<T, TransportError>;

/// A fully-resolved request ready to be sent over the wire.
#[derive(Clone, Debug)]
pub struct OutgoingRequest {
    /// The HTTP method.
    pub method: Method,

    /// The absolute URL to contact, including the query string.
    pub url: Url,

    /// The request headers.
    pub headers: HeaderMap,

    /// The request body, if any.
    pub body: Option<Bytes>,

    /// Maximum time to wait for the response.
    pub timeout: Duration,
}

/// The raw result of a request: status code, headers and body.
#[derive(Clone, Debug)]
pub struct Output {
    /// The status code of the response.
    status: u16,

    /// The headers of the response.
    headers: HeaderMap,

    /// The body of the response.
    data: Bytes,
}

impl Output {
    /// Creates an output with `status` and `data` and no headers.
    pub fn new<D: Into<Bytes>>(status: u16, data: D) -> Self {
        Self { status, headers: HeaderMap::new(), data: data.into() }
    }

    /// Replaces the headers of the output.
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Returns the status code of the response.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Returns the headers of the response.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the body of the response.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Consumes the output and returns its body.
    pub fn into_data(self) -> Bytes {
        self.data
    }
}

/// Trait to abstract the integration with the HTTP client.
#[async_trait]
pub trait Transport {
    /// Sends `request` and waits for its response.
    ///
    /// Any response that makes it back from the server, regardless of its status code, is a
    /// successful execution at this level.
    async fn execute(&self, request: OutgoingRequest) -> TransportResult<Output>;
}

/// Transport backed by a real HTTP client using `reqwest`.
#[derive(Clone)]
pub struct ReqwestTransport(reqwest::Client);

impl ReqwestTransport {
    /// Creates a new transport configured by `opts`.
    pub fn new(opts: &ServiceCenterOptions) -> Result<Self, String> {
        let mut builder = reqwest::Client::builder();
        if let Some(user_agent) = opts.user_agent.as_ref() {
            builder = builder.user_agent(user_agent);
        }
        let client = builder.build().map_err(|e| format!("Cannot create HTTP client: {}", e))?;
        Ok(Self(client))
    }

    /// Wraps an already-configured `client`.
    pub fn from_client(client: reqwest::Client) -> Self {
        Self(client)
    }
}

/// Maps a `reqwest` error to our error type.
fn reqwest_error_to_transport_error(e: reqwest::Error, timeout: Duration) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout(timeout)
    } else if e.is_connect() {
        TransportError::Connection(e.to_string())
    } else {
        TransportError::Other(e.to_string())
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: OutgoingRequest) -> TransportResult<Output> {
        let timeout = request.timeout;
        debug!("Sending {} {}", request.method, request.url);

        let mut builder = self
            .0
            .request(request.method, request.url)
            .headers(request.headers)
            .timeout(timeout);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response =
            builder.send().await.map_err(|e| reqwest_error_to_transport_error(e, timeout))?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let data =
            response.bytes().await.map_err(|e| reqwest_error_to_transport_error(e, timeout))?;
        debug!("Received {} with {} bytes", status, data.len());

        Ok(Output::new(status, data).with_headers(headers))
    }
}
