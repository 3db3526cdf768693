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

//! Orchestrator to execute requests against remote HTTP services.
//!
//! The pieces in this crate form a pipeline that every request goes through:
//!
//! 1.  A `ServiceRequest` describes one invocation of a `Service` with its body, path
//!     substitutions, query items and optional authorization override.
//!
//! 1.  The `ServiceCenter` resolves the request into a concrete HTTP request, hands it to a
//!     `Transport`, classifies the response into an `HttpStatus` and lets the active
//!     `ServiceCurator` decide whether that status is a success, an error, or something to
//!     recover from by reissuing requests through the same center.
//!
//! 1.  Successful payloads are turned into typed values via the `ServiceModel` trait, and
//!     batches of requests are driven sequentially by a `Gopher`.
//!
//! Every execution leaves a `ServicedAt` record in the center's history, if one is configured.

// Keep these in sync with other top-level files.
#![warn(anonymous_parameters, bad_style, clippy::missing_docs_in_private_items, missing_docs)]
#![warn(unused, unused_extern_crates, unused_import_braces, unused_qualifications)]
#![warn(unsafe_code)]

pub use bytes::Bytes;
pub use iii_iv_core::codec::{CodecError, CodecResult};

mod center;
pub use center::{ServiceCenter, ServiceCenterBuilder};
mod curator;
pub use curator::{BasicCurator, EmptyStatusHandler, ServiceCurator, StatusHandler};
mod decode;
pub use decode::{
    Json, ServiceModel, alternative_json, decode, decode_json, join_alternatives,
};
mod error;
pub use error::{ServiceError, ServiceResult};
mod gopher;
pub use gopher::Gopher;
mod options;
pub use options::ServiceCenterOptions;
mod request;
pub use request::{
    DEFAULT_TIMEOUT, LogServiceLogger, QueryItems, ServiceLogger, ServiceRequest, Substitutions,
    query_items_from,
};
mod status;
pub use status::HttpStatus;
pub mod transport;
