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

//! Errors raised while executing service requests.

use crate::status::HttpStatus;
use crate::transport::TransportError;
use bytes::Bytes;

/// Errors that can be returned by the orchestrator.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Indicates that the endpoint of a request could not be resolved into a URL.
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Indicates that a service is not in a state that allows executing it.
    #[error("Invalid service: {0}")]
    InvalidService(String),

    /// Indicates a response status that the curator decided not to accept.
    #[error("{0}")]
    Status(#[from] HttpStatus),

    /// Indicates that a successful payload could not be turned into the requested model.
    #[error("Cannot decode response: {message}")]
    Decode {
        /// Description of the decoding failure.
        message: String,

        /// The raw payload that failed to decode.
        payload: Bytes,
    },

    /// Indicates a failure to exchange data with the remote server.
    #[error("{0}")]
    Transport(#[from] TransportError),

    /// Indicates a feature that is known but not yet implemented.
    #[error("Not implemented yet: {0}")]
    NotImplementedYet(String),

    /// Indicates a feature that exists but is not available in this context yet.
    #[error("Not available yet: {0}")]
    NotAvailableYet(String),

    /// Indicates a service that has been retired.
    #[error("Discontinued: {0}")]
    Discontinued(String),

    /// Indicates a service that still works but should not be used any longer.
    #[error("Deprecated: {0}")]
    Deprecated(String),

    /// Indicates a request that the application does not handle.
    #[error("Out of scope: {0}")]
    OutOfScope(String),

    /// Indicates that the remote side speaks an unexpected version of its API.
    #[error("Version mismatch for {what}: expected {expected} but got {actual}")]
    VersionMismatch {
        /// What carries the version.
        what: String,

        /// The version that the client understands.
        expected: String,

        /// The version that the server reported.
        actual: String,
    },
}

impl ServiceError {
    /// Returns the HTTP status code behind this error, if the error came from a response.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ServiceError::Status(status) => Some(status.status_code()),
            _ => None,
        }
    }

    /// Returns a human-readable message suitable for display to the user.
    ///
    /// For status errors this is the response body, which is usually where servers put their
    /// explanations.
    pub fn message(&self) -> String {
        match self {
            ServiceError::Status(status) => status.body_text(),
            e => e.to_string(),
        }
    }

    /// Returns true if this error was caused by the transport timing out.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ServiceError::Transport(TransportError::Timeout(_)))
    }
}

/// Result type for this crate.
pub type ServiceResult<T> = Result<T, ServiceError>;
