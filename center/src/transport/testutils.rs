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

//! Test utilities for the transport layer.

use super::{OutgoingRequest, Output, Transport, TransportError, TransportResult};
use async_trait::async_trait;
use bytes::Bytes;
use futures::lock::Mutex;
use http::Method;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

/// Scripted reaction of the transport to a request.
#[derive(Debug)]
enum Reply {
    /// Respond with this output.
    Output(Output),

    /// Fail with this error.
    Error(TransportError),
}

/// Transport that captures outgoing requests and answers them with scripted responses.
///
/// Responses are keyed by method and full URL (including the query string) and are consumed in
/// the order in which they were added.  Requests without a pending response fail.
#[derive(Clone, Default)]
pub struct MockTransport {
    /// Storage for captured requests, in the order in which they were executed.
    requests: Arc<Mutex<Vec<OutgoingRequest>>>,

    /// Pending replies per method and URL.
    replies: Arc<Mutex<HashMap<(Method, String), VecDeque<Reply>>>>,
}

impl MockTransport {
    /// Queues a reply for the next `method` request to `url`.
    async fn push(&self, method: Method, url: &str, reply: Reply) {
        let mut replies = self.replies.lock().await;
        replies.entry((method, url.to_owned())).or_default().push_back(reply);
    }

    /// Makes the next `method` request to `url` respond with `status` and `data`.
    pub async fn add_response<D>(&self, method: Method, url: &str, status: u16, data: D)
    where
        D: Into<Bytes>,
    {
        self.push(method, url, Reply::Output(Output::new(status, data))).await;
    }

    /// Makes the next `method` request to `url` fail with `error`.
    pub async fn inject_error_for(&self, method: Method, url: &str, error: TransportError) {
        self.push(method, url, Reply::Error(error)).await;
    }

    /// Returns all requests executed so far.
    pub async fn requests(&self) -> Vec<OutgoingRequest> {
        self.requests.lock().await.clone()
    }

    /// Returns the URLs of all requests executed so far.
    pub async fn urls(&self) -> Vec<String> {
        self.requests.lock().await.iter().map(|r| r.url.to_string()).collect()
    }

    /// Expects that exactly one request was executed and returns it.
    pub async fn expect_one_request(&self) -> OutgoingRequest {
        let mut requests = self.requests.lock().await;
        assert_eq!(1, requests.len(), "Expected to find just one request");
        requests.pop().unwrap()
    }

    /// Expects that all scripted replies have been consumed.
    pub async fn expect_no_pending_replies(&self) {
        let replies = self.replies.lock().await;
        let pending = replies.values().map(VecDeque::len).sum::<usize>();
        assert_eq!(0, pending, "Expected all replies to be consumed");
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn execute(&self, request: OutgoingRequest) -> TransportResult<Output> {
        let key = (request.method.clone(), request.url.to_string());
        self.requests.lock().await.push(request);

        let mut replies = self.replies.lock().await;
        match replies.get_mut(&key).and_then(VecDeque::pop_front) {
            Some(Reply::Output(output)) => Ok(output),
            Some(Reply::Error(e)) => Err(e),
            None => Err(TransportError::Other(format!("No reply for {} {}", key.0, key.1))),
        }
    }
}
