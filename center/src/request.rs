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

//! Description of a single invocation of a service.

use crate::error::{ServiceError, ServiceResult};
use crate::transport::OutgoingRequest;
use bytes::Bytes;
use derivative::Derivative;
use iii_iv_core::model::{Service, ServiceAuth};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Timeout applied to requests when neither the request nor the center specify one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Ordered list of query items to append to a request URL.
pub type QueryItems = Vec<(String, String)>;

/// Converts any serializable map or struct into query items.
///
/// Fields are emitted in serialization order, which for structs is declaration order.
pub fn query_items_from<Q: Serialize + ?Sized>(query: &Q) -> ServiceResult<QueryItems> {
    let encoded = serde_urlencoded::to_string(query)
        .map_err(|e| ServiceError::InvalidEndpoint(format!("Cannot encode query items: {}", e)))?;
    serde_urlencoded::from_str(&encoded)
        .map_err(|e| ServiceError::InvalidEndpoint(format!("Cannot encode query items: {}", e)))
}

/// Mapping of path-template tokens to their replacements.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Substitutions(HashMap<String, String>);

impl Substitutions {
    /// Registers `token` to be replaced by `value`.
    pub fn insert<K: Into<String>, V: Into<String>>(&mut self, token: K, value: V) {
        self.0.insert(token.into(), value.into());
    }

    /// Returns true if there are no substitutions.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Replaces every occurrence of every token in `template`.
    ///
    /// The template is scanned once from left to right.  At each position, the longest token that
    /// matches wins, so a token that is a prefix of another one cannot clobber it.  Replacement
    /// values are copied verbatim and are never scanned for further tokens.
    pub fn sub_in(&self, template: &str) -> String {
        let mut tokens = self.0.iter().filter(|(token, _)| !token.is_empty()).collect::<Vec<_>>();
        tokens.sort_by(|(a, _), (b, _)| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

        let mut result = String::with_capacity(template.len());
        let mut rest = template;
        while let Some(ch) = rest.chars().next() {
            match tokens.iter().find(|(token, _)| rest.starts_with(token.as_str())) {
                Some((token, value)) => {
                    result.push_str(value);
                    rest = &rest[token.len()..];
                }
                None => {
                    result.push(ch);
                    rest = &rest[ch.len_utf8()..];
                }
            }
        }
        result
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Substitutions {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Optional sink for per-request diagnostics.
pub trait ServiceLogger {
    /// Records a debug message.
    fn debug(&self, message: &str);
}

/// Logger that forwards messages to the `log` facade under a fixed target.
#[derive(Clone, Debug)]
pub struct LogServiceLogger {
    /// Target to attach to every message.
    target: String,
}

impl LogServiceLogger {
    /// Creates a logger that emits messages under `target`.
    pub fn new<S: Into<String>>(target: S) -> Self {
        Self { target: target.into() }
    }
}

impl Default for LogServiceLogger {
    fn default() -> Self {
        Self::new(module_path!())
    }
}

impl ServiceLogger for LogServiceLogger {
    fn debug(&self, message: &str) {
        log::debug!(target: &self.target, "{}", message);
    }
}

/// A single invocation of a service.
///
/// Requests are built fresh for every execution and are not modified once built.
#[derive(Clone, Derivative)]
#[derivative(Debug)]
pub struct ServiceRequest {
    /// The service to invoke.
    service: Service,

    /// Payload to send, if any.
    body: Option<Bytes>,

    /// Content type of the payload, overriding the one in the service.
    mime: Option<String>,

    /// Replacements for tokens in the service path.
    substitutions: Substitutions,

    /// Query items to append to the URL.
    query_items: QueryItems,

    /// Credentials to use instead of the curator's.
    authorization: Option<ServiceAuth>,

    /// Maximum time to wait for the response, overriding the center's default.
    timeout: Option<Duration>,

    /// Sink for diagnostics about this request.
    #[derivative(Debug = "ignore")]
    logger: Option<Arc<dyn ServiceLogger + Send + Sync>>,
}

impl ServiceRequest {
    /// Creates a request for `service` with no body nor parameters.
    pub fn new(service: Service) -> Self {
        Self {
            service,
            body: None,
            mime: None,
            substitutions: Substitutions::default(),
            query_items: QueryItems::default(),
            authorization: None,
            timeout: None,
            logger: None,
        }
    }

    /// Attaches a payload to the request.
    pub fn with_body<B: Into<Bytes>>(mut self, body: B) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Overrides the content type of the payload.
    pub fn with_mime<S: Into<String>>(mut self, mime: S) -> Self {
        self.mime = Some(mime.into());
        self
    }

    /// Adds a replacement of `token` with `value` in the service path.
    pub fn with_substitution<K, V>(mut self, token: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.substitutions.insert(token, value);
        self
    }

    /// Replaces all path substitutions.
    pub fn with_substitutions(mut self, substitutions: Substitutions) -> Self {
        self.substitutions = substitutions;
        self
    }

    /// Appends a query item.
    pub fn with_query_item<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.query_items.push((key.into(), value.into()));
        self
    }

    /// Appends all of `items` to the query items.
    pub fn with_query_items(mut self, items: QueryItems) -> Self {
        self.query_items.extend(items);
        self
    }

    /// Overrides the credentials that the curator would otherwise supply.
    pub fn with_authorization(mut self, authorization: ServiceAuth) -> Self {
        self.authorization = Some(authorization);
        self
    }

    /// Overrides the timeout of the request.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the sink for diagnostics about this request.
    pub fn with_logger(mut self, logger: Arc<dyn ServiceLogger + Send + Sync>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Returns a copy of this request with its payload replaced by `body`.
    pub(crate) fn with_replaced_body(&self, body: Bytes) -> Self {
        let mut request = self.clone();
        request.body = Some(body);
        request
    }

    /// Returns the service to invoke.
    pub fn service(&self) -> &Service {
        &self.service
    }

    /// Returns the payload, if any.
    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Returns the content type override, if any.
    pub fn mime(&self) -> Option<&str> {
        self.mime.as_deref()
    }

    /// Returns the path substitutions.
    pub fn substitutions(&self) -> &Substitutions {
        &self.substitutions
    }

    /// Returns the query items.
    pub fn query_items(&self) -> &QueryItems {
        &self.query_items
    }

    /// Returns the credentials override, if any.
    pub fn authorization(&self) -> Option<&ServiceAuth> {
        self.authorization.as_ref()
    }

    /// Returns the timeout override, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Records the fully-built `request` in the logger, if any.
    pub(crate) fn log_request(&self, request: &OutgoingRequest) {
        if let Some(logger) = self.logger.as_ref() {
            let mut message = format!("{} {} {}", self.service.name(), request.method, request.url);
            for (name, value) in request.headers.iter() {
                let value = if value.is_sensitive() {
                    "<redacted>"
                } else {
                    value.to_str().unwrap_or("<binary>")
                };
                message.push_str(&format!("\n{}: {}", name, value));
            }
            logger.debug(&message);
        }
    }

    /// Records the accepted payload `data` in the logger, if any.
    pub(crate) fn log_data(&self, data: &[u8]) {
        if let Some(logger) = self.logger.as_ref() {
            logger.debug(&format!("{} <- {}", self.service.name(), String::from_utf8_lossy(data)));
        }
    }
}
