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

//! The `Service` data type.

use crate::model::{ModelError, ModelResult};
use http::Method;
use url::Url;

/// Name of a service, which is its identity.
pub type ServiceName = String;

/// Immutable description of one named remote endpoint.
///
/// The `path` is a template: it may contain arbitrary tokens (such as `{id}`) that are replaced
/// literally at invocation time.  A service with an absolute URL ignores its path, the base URL of
/// the orchestrator and any query items.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Service {
    /// Unique name of the service.
    name: ServiceName,

    /// HTTP method to use when invoking the service.
    method: Method,

    /// Path template relative to the base URL of the orchestrator.
    path: String,

    /// Fixed URL that overrides the path and the base URL, if any.
    absolute_url: Option<Url>,

    /// MIME type of the payload sent to the service.
    mime: Option<String>,

    /// MIME type accepted in the responses from the service.
    accept: Option<String>,

    /// Whether the service can be invoked.
    active: bool,
}

impl Service {
    /// Creates a new active service named `name` invoked with `method` on `path`, with no MIME
    /// types attached.
    ///
    /// Returns an error if `name` is empty or if `method` is not a valid HTTP method.
    pub fn new<N, P>(name: N, method: &str, path: P) -> ModelResult<Self>
    where
        N: Into<ServiceName>,
        P: Into<String>,
    {
        let name = name.into();
        if name.is_empty() {
            return Err(ModelError("Service name cannot be empty".to_owned()));
        }
        let method = Method::from_bytes(method.as_bytes()).map_err(|e| {
            ModelError(format!("Invalid method '{}' for service {}: {}", method, name, e))
        })?;
        Ok(Self::with_method(name, method, path.into()))
    }

    /// Creates a new active service from already-validated parts.
    fn with_method(name: ServiceName, method: Method, path: String) -> Self {
        Self { name, method, path, absolute_url: None, mime: None, accept: None, active: true }
    }

    /// Creates a service for `method` that sends and accepts JSON.
    fn json(name: ServiceName, method: Method, path: String) -> Self {
        Self::with_method(name, method, path)
            .with_mime(mime::APPLICATION_JSON.as_ref())
            .with_accept(mime::APPLICATION_JSON.as_ref())
    }

    /// Placeholder service that points nowhere.
    pub fn zero() -> Self {
        Self::get("«»", "")
    }

    /// Creates a `GET` service for a fixed `absolute_url`.
    pub fn absolute<N: Into<ServiceName>>(name: N, absolute_url: Url) -> Self {
        let mut service = Self::json(name.into(), Method::GET, String::new());
        service.absolute_url = Some(absolute_url);
        service
    }

    /// Creates a JSON `GET` service.
    pub fn get<N: Into<ServiceName>, P: Into<String>>(name: N, path: P) -> Self {
        Self::json(name.into(), Method::GET, path.into())
    }

    /// Creates an inactive `HEAD` service with no MIME types.
    pub fn head<N: Into<ServiceName>, P: Into<String>>(name: N, path: P) -> Self {
        Self::with_method(name.into(), Method::HEAD, path.into()).with_active(false)
    }

    /// Creates a JSON `POST` service.
    pub fn post<N: Into<ServiceName>, P: Into<String>>(name: N, path: P) -> Self {
        Self::json(name.into(), Method::POST, path.into())
    }

    /// Creates a JSON `PUT` service.
    pub fn put<N: Into<ServiceName>, P: Into<String>>(name: N, path: P) -> Self {
        Self::json(name.into(), Method::PUT, path.into())
    }

    /// Creates a JSON `DELETE` service.
    pub fn delete<N: Into<ServiceName>, P: Into<String>>(name: N, path: P) -> Self {
        Self::json(name.into(), Method::DELETE, path.into())
    }

    /// Creates an inactive JSON `OPTIONS` service.
    pub fn options<N: Into<ServiceName>, P: Into<String>>(name: N, path: P) -> Self {
        Self::json(name.into(), Method::OPTIONS, path.into()).with_active(false)
    }

    /// Creates an inactive `TRACE` service with no MIME types.
    pub fn trace<N: Into<ServiceName>, P: Into<String>>(name: N, path: P) -> Self {
        Self::with_method(name.into(), Method::TRACE, path.into()).with_active(false)
    }

    /// Creates an inactive `CONNECT` service with no MIME types.
    pub fn connect<N: Into<ServiceName>, P: Into<String>>(name: N, path: P) -> Self {
        Self::with_method(name.into(), Method::CONNECT, path.into()).with_active(false)
    }

    /// Sets the MIME type of the payloads sent to the service.
    pub fn with_mime<S: Into<String>>(mut self, mime: S) -> Self {
        self.mime = Some(mime.into());
        self
    }

    /// Sets the MIME type accepted in responses from the service.
    pub fn with_accept<S: Into<String>>(mut self, accept: S) -> Self {
        self.accept = Some(accept.into());
        self
    }

    /// Marks the service as active or inactive.
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Returns the name of the service.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the identifier of the service, which is its name.
    pub fn id(&self) -> &str {
        &self.name
    }

    /// Returns the HTTP method of the service.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the path template of the service.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the fixed URL of the service, if any.
    pub fn absolute_url(&self) -> Option<&Url> {
        self.absolute_url.as_ref()
    }

    /// Returns the MIME type of the payloads sent to the service, if any.
    pub fn mime(&self) -> Option<&str> {
        self.mime.as_deref()
    }

    /// Returns the MIME type accepted in responses from the service, if any.
    pub fn accept(&self) -> Option<&str> {
        self.accept.as_deref()
    }

    /// Returns whether the service can be invoked.
    pub fn is_active(&self) -> bool {
        self.active
    }
}
