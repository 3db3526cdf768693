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

//! Generic data types to describe remote services.
//!
//! The types in this module are plain values: they can be built, cloned and compared, but they
//! perform no I/O.  Validation happens at construction time so that any value that exists is
//! known to be usable by an orchestrator.

mod auth;
pub use auth::ServiceAuth;
mod nothing;
pub use nothing::Nothing;
mod service;
pub use service::{Service, ServiceName};

/// Errors caused by invalid data in the model.
#[derive(Debug, PartialEq, thiserror::Error)]
#[error("{0}")]
pub struct ModelError(pub String);

/// Result type for this module.
pub type ModelResult<T> = Result<T, ModelError>;
