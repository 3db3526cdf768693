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

//! Policies that decide what to do with classified responses.

use crate::center::ServiceCenter;
use crate::error::ServiceResult;
use crate::request::ServiceRequest;
use crate::status::HttpStatus;
use crate::transport::Output;
use async_trait::async_trait;
use futures::lock::Mutex;
use iii_iv_core::model::ServiceAuth;

/// Hook invoked with the classified outcome of every response.
///
/// Implementations decide whether the outcome is acceptable, in which case they return the output
/// to hand back to the caller, or not, in which case they return an error.  They may also recover
/// from a failed outcome by issuing new requests through `center`, which is the only retry
/// mechanism in the pipeline.  Bounding the number of retries is the implementation's duty.
#[async_trait]
pub trait StatusHandler: Send + Sync {
    /// Handles the outcome `status` of executing `request` through `center`.
    async fn handle(
        &self,
        status: HttpStatus,
        request: &ServiceRequest,
        center: &ServiceCenter,
    ) -> ServiceResult<Output>;
}

/// A status handler that also owns the credentials used for requests that do not override them.
#[async_trait]
pub trait ServiceCurator: StatusHandler {
    /// Returns the current credentials.
    async fn service_auth(&self) -> ServiceAuth;

    /// Replaces the current credentials.
    async fn update_service_auth(&self, auth: ServiceAuth);
}

/// Curator that accepts successful responses verbatim and raises everything else.
#[derive(Default)]
pub struct BasicCurator {
    /// Current credentials.
    auth: Mutex<ServiceAuth>,
}

impl BasicCurator {
    /// Creates a curator that starts with `auth` as its credentials.
    pub fn new(auth: ServiceAuth) -> Self {
        Self { auth: Mutex::new(auth) }
    }
}

#[async_trait]
impl StatusHandler for BasicCurator {
    async fn handle(
        &self,
        status: HttpStatus,
        _request: &ServiceRequest,
        _center: &ServiceCenter,
    ) -> ServiceResult<Output> {
        match status {
            HttpStatus::Success(_, output) => Ok(output),
            status => Err(status.into()),
        }
    }
}

#[async_trait]
impl ServiceCurator for BasicCurator {
    async fn service_auth(&self) -> ServiceAuth {
        self.auth.lock().await.clone()
    }

    async fn update_service_auth(&self, auth: ServiceAuth) {
        *self.auth.lock().await = auth;
    }
}

/// Status handler that raises every outcome, successful or not.
///
/// Useful for requests whose response must be inspected through the error path only.
#[derive(Clone, Copy, Debug, Default)]
pub struct EmptyStatusHandler;

#[async_trait]
impl StatusHandler for EmptyStatusHandler {
    async fn handle(
        &self,
        status: HttpStatus,
        _request: &ServiceRequest,
        _center: &ServiceCenter,
    ) -> ServiceResult<Output> {
        Err(status.into())
    }
}
