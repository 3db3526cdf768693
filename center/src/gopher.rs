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

//! Sequential execution of a batch of requests.

use crate::center::ServiceCenter;
use crate::error::ServiceResult;
use crate::request::ServiceRequest;
use bytes::Bytes;
use futures::Stream;
use std::collections::VecDeque;

/// Executes a list of requests one at a time, in order, yielding one payload per request.
///
/// Each request is executed only when its payload is asked for and after the previous one has
/// completed.  The first failure is yielded and ends the sequence: no later request is executed.
pub struct Gopher {
    /// The center through which to execute the requests.
    center: ServiceCenter,

    /// Requests that have not been executed yet.
    pending: VecDeque<ServiceRequest>,
}

impl Gopher {
    /// Creates a gopher to execute `requests` through `center`.
    pub(crate) fn new(center: ServiceCenter, requests: Vec<ServiceRequest>) -> Self {
        Self { center, pending: requests.into() }
    }

    /// Returns the number of requests that have not been executed yet.
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }

    /// Executes the next request and returns its payload, or `None` if the sequence is over.
    pub async fn next(&mut self) -> Option<ServiceResult<Bytes>> {
        let request = self.pending.pop_front()?;
        let result = self.center.fetch_bytes(request).await;
        if result.is_err() {
            self.pending.clear();
        }
        Some(result)
    }

    /// Turns the gopher into a stream of payloads.
    pub fn into_stream(self) -> impl Stream<Item = ServiceResult<Bytes>> + Send {
        futures::stream::unfold(self, |mut gopher| async move {
            gopher.next().await.map(|result| (result, gopher))
        })
    }
}
