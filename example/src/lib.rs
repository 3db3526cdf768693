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

//! Sample client for a REST service that implements a key/value store.

// Keep these in sync with other top-level files.
#![warn(anonymous_parameters, bad_style, clippy::missing_docs_in_private_items, missing_docs)]
#![warn(unused, unused_extern_crates, unused_import_braces, unused_qualifications)]
#![warn(unsafe_code)]

use iii_iv_center::{Bytes, ServiceCenter, ServiceCenterOptions, ServiceRequest, ServiceResult};
use iii_iv_core::history::{InMemoryHistory, ServiceHistory, ServicedAt};
use iii_iv_core::model::{Nothing, Service};
use std::sync::Arc;

pub mod model;
use model::{Entry, Key, Keys};

/// Token in service paths that is replaced by the key being accessed.
const KEY_TOKEN: &str = "{key}";

/// Typed access to the key/value store.
#[derive(Clone)]
pub struct KvClient {
    /// Orchestrator through which all requests go.
    center: ServiceCenter,

    /// Timing records of all executed requests.
    history: Arc<InMemoryHistory>,
}

impl KvClient {
    /// Creates a client that executes requests through `center`.
    ///
    /// The center's history is replaced by one owned by this client.
    pub async fn new(center: ServiceCenter) -> Self {
        let history = Arc::new(InMemoryHistory::default());
        center.update_history(Some(history.clone())).await;
        Self { center, history }
    }

    /// Creates a client for the service configured via environment variables whose name is
    /// prefixed with `prefix`.
    pub async fn from_env(prefix: &str) -> Result<Self, String> {
        let opts = ServiceCenterOptions::from_env(prefix)?;
        let center = ServiceCenter::from_options(opts)?;
        Ok(Self::new(center).await)
    }

    /// Builds a request to access `key` via `service`.
    fn key_request(service: Service, key: &Key) -> ServiceRequest {
        ServiceRequest::new(service).with_substitution(KEY_TOKEN, key.as_str())
    }

    /// Builds a request to set `key` to `value`.
    fn set_key_request(key: &Key, value: String) -> ServiceRequest {
        let service =
            Service::put("set_key", "api/v1/keys/{key}").with_mime(mime::TEXT_PLAIN.as_ref());
        Self::key_request(service, key).with_body(Bytes::from(value))
    }

    /// Returns all keys in the store.
    pub async fn keys(&self) -> ServiceResult<Vec<Key>> {
        let request = ServiceRequest::new(Service::get("get_keys", "api/v1/keys"));
        let Keys(keys) = self.center.fetch_model(request).await?;
        Ok(keys)
    }

    /// Returns the entry for `key`, or `None` if it does not exist.
    pub async fn get_key(&self, key: &Key) -> ServiceResult<Option<Entry>> {
        let request = Self::key_request(Service::get("get_key", "api/v1/keys/{key}"), key);
        match self.center.fetch_model(request).await {
            Ok(entry) => Ok(Some(entry)),
            Err(e) if e.status_code() == Some(404) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Sets `key` to `value` and returns the new entry.
    pub async fn set_key(&self, key: &Key, value: String) -> ServiceResult<Entry> {
        self.center.fetch_model(Self::set_key_request(key, value)).await
    }

    /// Sets all `entries` one after the other, stopping at the first failure.
    pub async fn set_keys(&self, entries: Vec<(Key, String)>) -> ServiceResult<Vec<Entry>> {
        let requests = entries
            .into_iter()
            .map(|(key, value)| Self::set_key_request(&key, value))
            .collect::<Vec<_>>();
        self.center.fetch_all_models(requests).await
    }

    /// Deletes `key`.
    pub async fn delete_key(&self, key: &Key) -> ServiceResult<()> {
        let request = Self::key_request(Service::delete("delete_key", "api/v1/keys/{key}"), key);
        let Nothing = self.center.fetch_model(request).await?;
        Ok(())
    }

    /// Returns the timing records of all requests executed so far.
    pub fn history(&self) -> Vec<ServicedAt> {
        self.history.events()
    }
}
