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

//! Core abstractions and types to describe and access remote HTTP services.
//!
//! Clients built on top of this crate adhere to the following layered structure:
//!
//! 1.  `model`: This is the base layer, providing the declarative description of remote endpoints
//!     (`Service`) and of the credentials used to access them (`ServiceAuth`).  There is no I/O in
//!     here.  Values are immutable once built and extensive use of the builder pattern is
//!     encouraged.
//!
//! 1.  `codec`: This is the serialization layer, which fixes the wire representation of dates and
//!     binary payloads so that every service talks the same dialect.
//!
//! 1.  `history` and `state`: These are the observability and application-state hooks that an
//!     orchestrator carries around but that are never required for correctness.
//!
//! The orchestrator itself, which performs network I/O, lives in the `iii-iv-center` crate.
//!
//! This crate does not have any heavy dependencies.  Heavy dependencies, such as the HTTP client,
//! are introduced by depending on sibling crates.

// Keep these in sync with other top-level files.
#![warn(anonymous_parameters, bad_style, clippy::missing_docs_in_private_items, missing_docs)]
#![warn(unused, unused_extern_crates, unused_import_braces, unused_qualifications)]
#![warn(unsafe_code)]

pub mod clocks;
pub mod codec;
pub mod env;
pub mod history;
pub mod model;
pub mod state;
