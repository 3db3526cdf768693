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

//! The orchestrator that executes service requests.

use crate::curator::{BasicCurator, ServiceCurator};
use crate::decode::{ServiceModel, decode};
use crate::error::{ServiceError, ServiceResult};
use crate::gopher::Gopher;
use crate::options::ServiceCenterOptions;
use crate::request::{DEFAULT_TIMEOUT, ServiceRequest};
use crate::status::HttpStatus;
use crate::transport::{OutgoingRequest, Output, ReqwestTransport, Transport};
use bytes::Bytes;
use futures::lock::Mutex;
use futures::{TryStreamExt, future};
use http::header::{ACCEPT, AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE, HeaderMap, HeaderValue};
use iii_iv_core::clocks::{Clock, SystemClock};
use iii_iv_core::history::{ServiceHistory, ServicedAt};
use iii_iv_core::model::{Service, ServiceAuth};
use iii_iv_core::state::{EmptyServiceState, ServiceState};
use log::debug;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Mutable configuration of a center.
#[derive(Clone)]
struct CenterConfig {
    /// Base URL against which relative service paths are resolved.
    main_url: Url,

    /// Policy that handles classified responses and supplies default credentials.
    curator: Arc<dyn ServiceCurator>,

    /// Application state carried around for the benefit of curators.
    state: Arc<dyn ServiceState + Send + Sync>,

    /// Sink for execution records, if any.
    history: Option<Arc<dyn ServiceHistory + Send + Sync>>,

    /// Timeout for requests that do not specify their own.
    timeout: Duration,
}

/// Builder for a `ServiceCenter`.
pub struct ServiceCenterBuilder {
    /// The transport through which to send requests.
    transport: Arc<dyn Transport + Send + Sync>,

    /// The clock with which to time executions.
    clock: Arc<dyn Clock + Send + Sync>,

    /// Initial configuration of the center.
    config: CenterConfig,
}

impl ServiceCenterBuilder {
    /// Sets the curator, which defaults to a `BasicCurator` without credentials.
    pub fn with_curator(mut self, curator: Arc<dyn ServiceCurator>) -> Self {
        self.config.curator = curator;
        self
    }

    /// Sets the application state, which defaults to an `EmptyServiceState`.
    pub fn with_state(mut self, state: Arc<dyn ServiceState + Send + Sync>) -> Self {
        self.config.state = state;
        self
    }

    /// Sets the sink for execution records, which is unset by default.
    pub fn with_history(mut self, history: Arc<dyn ServiceHistory + Send + Sync>) -> Self {
        self.config.history = Some(history);
        self
    }

    /// Sets the clock used to time executions, which defaults to the system clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        self.clock = clock;
        self
    }

    /// Sets the timeout for requests that do not specify their own.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Builds the center.
    pub fn build(self) -> ServiceCenter {
        ServiceCenter {
            transport: self.transport,
            clock: self.clock,
            config: Arc::new(Mutex::new(self.config)),
        }
    }
}

/// Records the execution of a service in a history when dropped.
struct HistoryRecorder {
    /// The record being timed.
    serviced: ServicedAt,

    /// The clock with which to compute the duration of the execution.
    clock: Arc<dyn Clock + Send + Sync>,

    /// Where to store the record.  Nothing is recorded if unset.
    history: Option<Arc<dyn ServiceHistory + Send + Sync>>,
}

impl HistoryRecorder {
    /// Starts timing an execution of `service`.
    fn start(
        service: &Service,
        clock: Arc<dyn Clock + Send + Sync>,
        history: Option<Arc<dyn ServiceHistory + Send + Sync>>,
    ) -> Self {
        let serviced = ServicedAt::new(service.clone(), clock.now_utc());
        Self { serviced, clock, history }
    }
}

impl Drop for HistoryRecorder {
    fn drop(&mut self) {
        if let Some(history) = self.history.take() {
            let mut serviced = self.serviced.clone();
            serviced.split(self.clock.as_ref());
            history.add(serviced);
        }
    }
}

/// Resolves the URL to contact for `request`.
///
/// Absolute service URLs are used verbatim.  Otherwise, the path of the service goes through the
/// request's substitutions, is resolved against `main_url`, and gets the query items appended if
/// there are any.
fn resolve_endpoint(main_url: &Url, request: &ServiceRequest) -> ServiceResult<Url> {
    if let Some(url) = request.service().absolute_url() {
        return Ok(url.clone());
    }

    let path = request.substitutions().sub_in(request.service().path());
    let mut url = main_url.join(&path).map_err(|e| {
        let message = format!("Cannot resolve '{}' against {}: {}", path, main_url, e);
        ServiceError::InvalidEndpoint(message)
    })?;
    if !request.query_items().is_empty() {
        url.query_pairs_mut().extend_pairs(request.query_items());
    }
    Ok(url)
}

/// Converts `value` into the value of header `name` for `service`.
fn header_value(service: &Service, name: &str, value: &str) -> ServiceResult<HeaderValue> {
    HeaderValue::from_str(value).map_err(|_| {
        let message = format!("Service {} has an invalid {} header", service.name(), name);
        ServiceError::InvalidService(message)
    })
}

/// Builds the wire request for `request` sent to `url`.
fn build_request(
    request: &ServiceRequest,
    url: Url,
    authorization: Option<String>,
    timeout: Duration,
) -> ServiceResult<OutgoingRequest> {
    let service = request.service();

    let mut headers = HeaderMap::new();
    if let Some(accept) = service.accept() {
        headers.insert(ACCEPT, header_value(service, "Accept", accept)?);
    }
    if let Some(mime) = request.mime().or(service.mime()) {
        headers.insert(CONTENT_TYPE, header_value(service, "Content-Type", mime)?);
    }
    if let Some(authorization) = authorization.filter(|a| !a.is_empty()) {
        let mut value = header_value(service, "Authorization", &authorization)?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }
    let length = request.body().map(Bytes::len).unwrap_or(0);
    headers.insert(CONTENT_LENGTH, HeaderValue::from(length));

    Ok(OutgoingRequest {
        method: service.method().clone(),
        url,
        headers,
        body: request.body().cloned(),
        timeout,
    })
}

/// Orchestrator that executes service requests.
///
/// A center is cheap to clone and all clones share the same configuration.  The configuration is
/// only locked for as long as it takes to read or replace it, never while a request is in flight,
/// so curators are free to use the center they are handed to issue new requests.
#[derive(Clone)]
pub struct ServiceCenter {
    /// The transport through which to send requests.
    transport: Arc<dyn Transport + Send + Sync>,

    /// The clock with which to time executions.
    clock: Arc<dyn Clock + Send + Sync>,

    /// Mutable configuration of the center.
    config: Arc<Mutex<CenterConfig>>,
}

impl ServiceCenter {
    /// Starts building a center that sends requests via `transport` and resolves relative paths
    /// against `main_url`.
    pub fn builder(
        transport: Arc<dyn Transport + Send + Sync>,
        main_url: Url,
    ) -> ServiceCenterBuilder {
        ServiceCenterBuilder {
            transport,
            clock: Arc::new(SystemClock::default()),
            config: CenterConfig {
                main_url,
                curator: Arc::new(BasicCurator::default()),
                state: Arc::new(EmptyServiceState::default()),
                history: None,
                timeout: DEFAULT_TIMEOUT,
            },
        }
    }

    /// Creates a center backed by a real HTTP client configured by `opts`.
    pub fn from_options(opts: ServiceCenterOptions) -> Result<Self, String> {
        let transport = ReqwestTransport::new(&opts)?;
        Ok(Self::builder(Arc::new(transport), opts.base_url).with_timeout(opts.timeout).build())
    }

    /// Creates an independent center that starts with a copy of this center's configuration.
    pub async fn duplicate(&self) -> ServiceCenter {
        let config = self.config.lock().await.clone();
        ServiceCenter {
            transport: self.transport.clone(),
            clock: self.clock.clone(),
            config: Arc::new(Mutex::new(config)),
        }
    }

    /// Returns the base URL.
    pub async fn main_url(&self) -> Url {
        self.config.lock().await.main_url.clone()
    }

    /// Replaces the base URL.
    pub async fn update_url(&self, main_url: Url) {
        self.config.lock().await.main_url = main_url;
    }

    /// Returns the curator.
    pub async fn curator(&self) -> Arc<dyn ServiceCurator> {
        self.config.lock().await.curator.clone()
    }

    /// Replaces the curator.
    pub async fn update_curator(&self, curator: Arc<dyn ServiceCurator>) {
        self.config.lock().await.curator = curator;
    }

    /// Returns the credentials held by the curator.
    pub async fn auth(&self) -> ServiceAuth {
        let curator = self.curator().await;
        curator.service_auth().await
    }

    /// Replaces the credentials held by the curator.
    pub async fn update_auth(&self, auth: ServiceAuth) {
        let curator = self.curator().await;
        curator.update_service_auth(auth).await;
    }

    /// Returns the application state.
    pub async fn state(&self) -> Arc<dyn ServiceState + Send + Sync> {
        self.config.lock().await.state.clone()
    }

    /// Replaces the application state.
    pub async fn update_state(&self, state: Arc<dyn ServiceState + Send + Sync>) {
        self.config.lock().await.state = state;
    }

    /// Returns the sink for execution records, if any.
    pub async fn history(&self) -> Option<Arc<dyn ServiceHistory + Send + Sync>> {
        self.config.lock().await.history.clone()
    }

    /// Replaces the sink for execution records.
    pub async fn update_history(&self, history: Option<Arc<dyn ServiceHistory + Send + Sync>>) {
        self.config.lock().await.history = history;
    }

    /// Executes `request` once and returns the output accepted by the curator.
    ///
    /// This does not leave a record in the history.
    pub async fn output(&self, request: &ServiceRequest) -> ServiceResult<Output> {
        let service = request.service();
        let config = self.config.lock().await.clone();
        let url = resolve_endpoint(&config.main_url, request)?;
        let auth = match request.authorization() {
            Some(auth) => auth.clone(),
            None => config.curator.service_auth().await,
        };
        let timeout = request.timeout().unwrap_or(config.timeout);
        let outgoing = build_request(request, url, auth.authorization(), timeout)?;

        debug!("Executing service {}: {} {}", service.name(), outgoing.method, outgoing.url);
        request.log_request(&outgoing);
        let output = self.transport.execute(outgoing).await?;

        let status = HttpStatus::classify(output);
        debug!("Service {} returned status {}", service.name(), status.status_code());
        let output = config.curator.handle(status, request, self).await?;
        request.log_data(output.data());
        Ok(output)
    }

    /// Executes `request` and returns its raw payload.
    pub async fn fetch_bytes(&self, request: ServiceRequest) -> ServiceResult<Bytes> {
        let history = self.config.lock().await.history.clone();
        let _recorder = HistoryRecorder::start(request.service(), self.clock.clone(), history);
        let output = self.output(&request).await?;
        Ok(output.into_data())
    }

    /// Executes `request` and decodes its payload into a `T`.
    pub async fn fetch_model<T: ServiceModel>(&self, request: ServiceRequest) -> ServiceResult<T> {
        let data = self.fetch_bytes(request).await?;
        decode(data)
    }

    /// Executes `request` once per element in `bodies`, in order, and returns the raw payloads.
    pub async fn fetch_bytes_with_bodies(
        &self,
        request: ServiceRequest,
        bodies: Vec<Bytes>,
    ) -> ServiceResult<Vec<Bytes>> {
        let requests = bodies.into_iter().map(|body| request.with_replaced_body(body)).collect();
        self.fetch_all_bytes(requests).await
    }

    /// Executes `request` once per element in `bodies`, in order, and decodes the payloads.
    pub async fn fetch_models_with_bodies<T: ServiceModel>(
        &self,
        request: ServiceRequest,
        bodies: Vec<Bytes>,
    ) -> ServiceResult<Vec<T>> {
        let requests = bodies.into_iter().map(|body| request.with_replaced_body(body)).collect();
        self.fetch_all_models(requests).await
    }

    /// Executes all `requests`, in order, and returns the raw payloads.
    ///
    /// Execution stops at the first failure, which is returned.
    pub async fn fetch_all_bytes(
        &self,
        requests: Vec<ServiceRequest>,
    ) -> ServiceResult<Vec<Bytes>> {
        self.gopher(requests).into_stream().try_collect().await
    }

    /// Executes all `requests`, in order, and decodes the payloads.
    ///
    /// Execution stops at the first failure, including decoding failures, which is returned.
    pub async fn fetch_all_models<T: ServiceModel>(
        &self,
        requests: Vec<ServiceRequest>,
    ) -> ServiceResult<Vec<T>> {
        self.gopher(requests)
            .into_stream()
            .and_then(|data| future::ready(decode::<T>(data)))
            .try_collect()
            .await
    }

    /// Creates a gopher to execute `requests` one at a time through this center.
    pub fn gopher(&self, requests: Vec<ServiceRequest>) -> Gopher {
        Gopher::new(self.clone(), requests)
    }
}


#[cfg(test)]
mod tests {
    use super::testutils::*;
    use super::*;
    use crate::curator::StatusHandler;
    use crate::decode::Json;
    use crate::request::testutils::RecorderServiceLogger;
    use crate::transport::TransportError;
    use async_trait::async_trait;
    use http::Method;
    use iii_iv_core::history::InMemoryHistory;
    use iii_iv_core::model::Nothing;
    use serde::{Deserialize, Serialize};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Deserialize, PartialEq, Serialize)]
    struct Widget {
        id: u32,
        name: String,
    }

    /// Builds a request to fetch the widget with `id`.
    fn widget_request(id: &str) -> ServiceRequest {
        ServiceRequest::new(Service::get("widget", "widgets/{id}")).with_substitution("{id}", id)
    }

    #[tokio::test]
    async fn test_widgets_end_to_end() {
        let context = TestContext::setup();
        context.center.update_auth(ServiceAuth::bearer("abc")).await;
        context
            .transport
            .add_response(
                Method::GET,
                "https://api.example.com/widgets/42",
                200,
                r#"{"id": 42, "name": "gear"}"#,
            )
            .await;
        context
            .transport
            .add_response(Method::GET, "https://api.example.com/widgets/43", 404, "no such widget")
            .await;

        let Json(widget) =
            context.center.fetch_model::<Json<Widget>>(widget_request("42")).await.unwrap();
        assert_eq!(Widget { id: 42, name: "gear".to_owned() }, widget);

        match context.center.fetch_model::<Json<Widget>>(widget_request("43")).await {
            Err(ServiceError::Status(HttpStatus::ClientError(404, output))) => {
                assert_eq!(b"no such widget", output.data());
            }
            e => panic!("{:?}", e),
        }

        let requests = context.transport.requests().await;
        assert_eq!(2, requests.len());
        let headers = &requests[0].headers;
        assert_eq!("application/json", headers[ACCEPT]);
        assert_eq!("application/json", headers[CONTENT_TYPE]);
        assert_eq!("Bearer abc", headers[AUTHORIZATION]);
        assert_eq!("0", headers[CONTENT_LENGTH]);
        assert_eq!(Method::GET, requests[0].method);
        assert!(requests[0].body.is_none());
        assert_eq!(DEFAULT_TIMEOUT, requests[0].timeout);

        assert_eq!(vec!["widget", "widget"], context.history_names());
    }

    #[derive(Debug, Deserialize, PartialEq, serde::Serialize)]
    struct WidgetId {
        id: u32,
    }

    #[tokio::test]
    async fn test_absolute_path_resolves_against_base() {
        let context = TestContext::setup();
        let url = "https://api.example.com/widgets/42";
        context.transport.add_response(Method::GET, url, 200, r#"{"id":42}"#).await;
        context.transport.add_response(Method::GET, url, 404, "gone").await;
        let request = || {
            ServiceRequest::new(Service::get("widget", "/widgets/{id}"))
                .with_substitution("{id}", "42")
        };

        let Json(widget) =
            context.center.fetch_model::<Json<WidgetId>>(request()).await.unwrap();
        assert_eq!(WidgetId { id: 42 }, widget);

        match context.center.fetch_model::<Json<WidgetId>>(request()).await {
            Err(ServiceError::Status(HttpStatus::ClientError(404, output))) => {
                assert_eq!(b"gone", output.data());
            }
            e => panic!("{:?}", e),
        }

        assert_eq!(vec![url, url], context.transport.urls().await);
    }

    #[tokio::test]
    async fn test_auth_precedence() {
        let context = TestContext::setup();
        for _ in 0..4 {
            let url = "https://api.example.com/me";
            context.transport.add_response(Method::GET, url, 200, "").await;
        }
        let request = || ServiceRequest::new(Service::get("me", "me"));

        context.center.fetch_bytes(request()).await.unwrap();

        context.center.update_auth(ServiceAuth::bearer("curator")).await;
        assert_eq!(ServiceAuth::bearer("curator"), context.center.auth().await);
        context.center.fetch_bytes(request()).await.unwrap();

        let basic = ServiceAuth::basic("some-user", "some password");
        context.center.fetch_bytes(request().with_authorization(basic)).await.unwrap();

        let nothing = ServiceAuth::Nothing;
        context.center.fetch_bytes(request().with_authorization(nothing)).await.unwrap();

        let requests = context.transport.requests().await;
        let auths = requests
            .iter()
            .map(|r| r.headers.get(AUTHORIZATION).map(|v| v.to_str().unwrap().to_owned()))
            .collect::<Vec<_>>();
        assert_eq!(
            vec![
                None,
                Some("Bearer curator".to_owned()),
                Some("Basic c29tZS11c2VyOnNvbWUgcGFzc3dvcmQ=".to_owned()),
                None,
            ],
            auths
        );
        assert!(requests[1].headers[AUTHORIZATION].is_sensitive());
    }

    #[tokio::test]
    async fn test_query_items() {
        let context = TestContext::setup();
        context.transport.add_response(Method::GET, "https://api.example.com/list", 200, "").await;
        context
            .transport
            .add_response(Method::GET, "https://api.example.com/list?k=v", 200, "")
            .await;
        context
            .transport
            .add_response(Method::GET, "https://api.example.com/list?a=1&b=x+y", 200, "")
            .await;

        let request = || ServiceRequest::new(Service::get("list", "list"));
        context.center.fetch_bytes(request()).await.unwrap();
        context.center.fetch_bytes(request().with_query_item("k", "v")).await.unwrap();
        context
            .center
            .fetch_bytes(request().with_query_item("a", "1").with_query_item("b", "x y"))
            .await
            .unwrap();

        assert_eq!(
            vec![
                "https://api.example.com/list",
                "https://api.example.com/list?k=v",
                "https://api.example.com/list?a=1&b=x+y",
            ],
            context.transport.urls().await
        );
    }

    #[tokio::test]
    async fn test_absolute_url_is_verbatim() {
        let context = TestContext::setup();
        let url = "https://other.example.com/fixed/path?fixed=1";
        context.transport.add_response(Method::GET, url, 200, "").await;

        let service = Service::absolute("abs", Url::parse(url).unwrap());
        let request = ServiceRequest::new(service)
            .with_substitution("fixed", "changed")
            .with_query_item("k", "v");
        context.center.fetch_bytes(request).await.unwrap();

        assert_eq!(vec![url], context.transport.urls().await);
    }

    #[tokio::test]
    async fn test_body_and_mime() {
        let context = TestContext::setup();
        let url = "https://api.example.com/upload";
        context.transport.add_response(Method::PUT, url, 201, "").await;
        context.transport.add_response(Method::PUT, url, 201, "").await;

        let service = Service::put("upload", "upload");
        context
            .center
            .fetch_bytes(ServiceRequest::new(service.clone()).with_body("{\"a\":1}"))
            .await
            .unwrap();
        context
            .center
            .fetch_bytes(
                ServiceRequest::new(service.with_accept("text/plain"))
                    .with_body("hello")
                    .with_mime("text/plain"),
            )
            .await
            .unwrap();

        let requests = context.transport.requests().await;
        assert_eq!("application/json", requests[0].headers[CONTENT_TYPE]);
        assert_eq!("7", requests[0].headers[CONTENT_LENGTH]);
        assert_eq!(Some(Bytes::from_static(b"{\"a\":1}")), requests[0].body);
        assert_eq!("text/plain", requests[1].headers[CONTENT_TYPE]);
        assert_eq!("text/plain", requests[1].headers[ACCEPT]);
        assert_eq!("5", requests[1].headers[CONTENT_LENGTH]);
    }

    #[tokio::test]
    async fn test_missing_mime_and_accept_are_omitted() {
        let context = TestContext::setup();
        let url = "https://api.example.com/raw";
        context.transport.add_response(Method::GET, url, 200, "").await;

        let service = Service::new("raw", "GET", "raw").unwrap();
        context.center.fetch_bytes(ServiceRequest::new(service)).await.unwrap();

        let request = context.transport.expect_one_request().await;
        assert!(!request.headers.contains_key(ACCEPT));
        assert!(!request.headers.contains_key(CONTENT_TYPE));
        assert_eq!("0", request.headers[CONTENT_LENGTH]);
    }

    #[tokio::test]
    async fn test_timeouts() {
        let context = TestContext::setup();
        let url = "https://api.example.com/slow";
        context.transport.add_response(Method::GET, url, 200, "").await;
        context.transport.add_response(Method::GET, url, 200, "").await;

        let request = ServiceRequest::new(Service::get("slow", "slow"));
        context.center.fetch_bytes(request.clone()).await.unwrap();
        context.center.fetch_bytes(request.with_timeout(Duration::from_secs(3))).await.unwrap();

        let timeouts =
            context.transport.requests().await.iter().map(|r| r.timeout).collect::<Vec<_>>();
        assert_eq!(vec![Duration::from_secs(60), Duration::from_secs(3)], timeouts);
    }

    #[tokio::test]
    async fn test_center_timeout() {
        let transport = crate::transport::testutils::MockTransport::default();
        transport.add_response(Method::GET, "https://api.example.com/x", 200, "").await;
        let center =
            ServiceCenter::builder(Arc::new(transport.clone()), Url::parse(BASE_URL).unwrap())
                .with_timeout(Duration::from_secs(7))
                .build();

        center.fetch_bytes(ServiceRequest::new(Service::get("x", "x"))).await.unwrap();
        assert_eq!(Duration::from_secs(7), transport.expect_one_request().await.timeout);
    }

    #[tokio::test]
    async fn test_inactive_service_is_executed() {
        let context = TestContext::setup();
        context.transport.add_response(Method::HEAD, "https://api.example.com/ping", 200, "").await;

        let service = Service::head("ping", "ping");
        assert!(!service.is_active());
        context.center.fetch_bytes(ServiceRequest::new(service)).await.unwrap();

        let request = context.transport.expect_one_request().await;
        assert_eq!(Method::HEAD, request.method);
        assert_eq!("https://api.example.com/ping", request.url.as_str());
        assert_eq!(vec!["ping"], context.history_names());
    }

    #[tokio::test]
    async fn test_invalid_endpoint() {
        let context = TestContext::setup();
        context.center.update_url(Url::parse("mailto:someone@example.com").unwrap()).await;

        match context.center.fetch_bytes(ServiceRequest::new(Service::get("x", "x"))).await {
            Err(ServiceError::InvalidEndpoint(e)) => assert!(e.contains("Cannot resolve 'x'")),
            e => panic!("{:?}", e),
        }
        assert!(context.transport.requests().await.is_empty());
        assert_eq!(vec!["x"], context.history_names());
    }

    #[tokio::test]
    async fn test_invalid_header_value() {
        let context = TestContext::setup();

        let service = Service::get("bad", "bad").with_accept("text/plain\n");
        match context.center.fetch_bytes(ServiceRequest::new(service)).await {
            Err(ServiceError::InvalidService(e)) => assert!(e.contains("invalid Accept header")),
            e => panic!("{:?}", e),
        }
    }

    /// Curator that counts how many outcomes it sees.
    #[derive(Default)]
    struct CountingCurator {
        /// Wrapped curator to delegate to.
        inner: BasicCurator,

        /// Number of calls to `handle`.
        calls: AtomicUsize,
    }

    #[async_trait]
    impl StatusHandler for CountingCurator {
        async fn handle(
            &self,
            status: HttpStatus,
            request: &ServiceRequest,
            center: &ServiceCenter,
        ) -> ServiceResult<Output> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.handle(status, request, center).await
        }
    }

    #[async_trait]
    impl ServiceCurator for CountingCurator {
        async fn service_auth(&self) -> ServiceAuth {
            self.inner.service_auth().await
        }

        async fn update_service_auth(&self, auth: ServiceAuth) {
            self.inner.update_service_auth(auth).await
        }
    }

    #[tokio::test]
    async fn test_transport_error_skips_curator() {
        let curator = Arc::new(CountingCurator::default());
        let context = TestContext::setup_with_curator(curator.clone());
        let timeout = TransportError::Timeout(Duration::from_secs(60));
        context.transport.inject_error_for(Method::GET, "https://api.example.com/x", timeout).await;

        match context.center.fetch_bytes(ServiceRequest::new(Service::get("x", "x"))).await {
            Err(e) => assert!(e.is_timeout()),
            e => panic!("{:?}", e),
        }
        assert_eq!(0, curator.calls.load(Ordering::SeqCst));
        assert_eq!(1, context.history.events().len());
    }

    /// Curator that refreshes its credentials and retries once after a 401.
    #[derive(Default)]
    struct RefreshingCurator {
        /// Wrapped curator to delegate to.
        inner: BasicCurator,

        /// Number of retries issued so far.
        retries: AtomicUsize,
    }

    #[async_trait]
    impl StatusHandler for RefreshingCurator {
        async fn handle(
            &self,
            status: HttpStatus,
            request: &ServiceRequest,
            center: &ServiceCenter,
        ) -> ServiceResult<Output> {
            match status {
                HttpStatus::ClientError(401, _)
                    if self.retries.fetch_add(1, Ordering::SeqCst) < 1 =>
                {
                    center.update_auth(ServiceAuth::bearer("fresh")).await;
                    center.output(request).await
                }
                status => self.inner.handle(status, request, center).await,
            }
        }
    }

    #[async_trait]
    impl ServiceCurator for RefreshingCurator {
        async fn service_auth(&self) -> ServiceAuth {
            self.inner.service_auth().await
        }

        async fn update_service_auth(&self, auth: ServiceAuth) {
            self.inner.update_service_auth(auth).await
        }
    }

    #[tokio::test]
    async fn test_curator_refreshes_and_retries() {
        let curator = Arc::new(RefreshingCurator::default());
        curator.update_service_auth(ServiceAuth::bearer("stale")).await;
        let context = TestContext::setup_with_curator(curator.clone());
        let url = "https://api.example.com/private";
        context.transport.add_response(Method::GET, url, 401, "expired").await;
        context.transport.add_response(Method::GET, url, 200, "secret").await;

        let request = ServiceRequest::new(Service::get("private", "private"));
        let data = context.center.fetch_bytes(request).await.unwrap();
        assert_eq!(Bytes::from_static(b"secret"), data);

        let auths = context
            .transport
            .requests()
            .await
            .iter()
            .map(|r| r.headers[AUTHORIZATION].to_str().unwrap().to_owned())
            .collect::<Vec<_>>();
        assert_eq!(vec!["Bearer stale", "Bearer fresh"], auths);
        assert_eq!(vec!["private"], context.history_names());
    }

    #[tokio::test]
    async fn test_curator_retries_are_bounded() {
        let curator = Arc::new(RefreshingCurator::default());
        let context = TestContext::setup_with_curator(curator);
        let url = "https://api.example.com/private";
        context.transport.add_response(Method::GET, url, 401, "expired").await;
        context.transport.add_response(Method::GET, url, 401, "still expired").await;

        let request = ServiceRequest::new(Service::get("private", "private"));
        match context.center.fetch_bytes(request).await {
            Err(e) => {
                assert_eq!(Some(401), e.status_code());
                assert_eq!("still expired", e.message());
            }
            e => panic!("{:?}", e),
        }
        context.transport.expect_no_pending_replies().await;
    }

    /// Curator that queries its own center whenever its credentials change.
    #[derive(Default)]
    struct ReentrantCurator {
        /// Wrapped curator to delegate to.
        inner: BasicCurator,

        /// Center this curator is installed in, once known.
        center: futures::lock::Mutex<Option<ServiceCenter>>,

        /// Main URL seen by the last credentials update.
        seen_url: futures::lock::Mutex<Option<Url>>,
    }

    #[async_trait]
    impl StatusHandler for ReentrantCurator {
        async fn handle(
            &self,
            status: HttpStatus,
            request: &ServiceRequest,
            center: &ServiceCenter,
        ) -> ServiceResult<Output> {
            self.inner.handle(status, request, center).await
        }
    }

    #[async_trait]
    impl ServiceCurator for ReentrantCurator {
        async fn service_auth(&self) -> ServiceAuth {
            self.inner.service_auth().await
        }

        async fn update_service_auth(&self, auth: ServiceAuth) {
            let center = self.center.lock().await.clone();
            if let Some(center) = center {
                *self.seen_url.lock().await = Some(center.main_url().await);
            }
            self.inner.update_service_auth(auth).await
        }
    }

    #[tokio::test]
    async fn test_update_auth_lets_curator_use_center() {
        let curator = Arc::new(ReentrantCurator::default());
        let context = TestContext::setup_with_curator(curator.clone());
        *curator.center.lock().await = Some(context.center.clone());

        context.center.update_auth(ServiceAuth::bearer("new")).await;

        assert_eq!(Some(Url::parse(BASE_URL).unwrap()), *curator.seen_url.lock().await);
        assert_eq!(ServiceAuth::bearer("new"), context.center.auth().await);
    }

    #[tokio::test]
    async fn test_history_durations() {
        let context = TestContext::setup();
        context.transport.add_response(Method::GET, "https://api.example.com/a", 200, "").await;
        context.transport.add_response(Method::GET, "https://api.example.com/b", 500, "").await;

        context.center.fetch_bytes(ServiceRequest::new(Service::get("a", "a"))).await.unwrap();
        context.center.fetch_bytes(ServiceRequest::new(Service::get("b", "b"))).await.unwrap_err();

        let events = context.history.events();
        assert_eq!(2, events.len());
        for event in &events {
            assert_eq!(Duration::from_millis(10), event.duration());
        }
        assert!(events[0].timestamp() < events[1].timestamp());
    }

    #[tokio::test]
    async fn test_output_does_not_record_history() {
        let context = TestContext::setup();
        context.transport.add_response(Method::GET, "https://api.example.com/a", 200, "a").await;

        let output =
            context.center.output(&ServiceRequest::new(Service::get("a", "a"))).await.unwrap();
        assert_eq!(200, output.status());
        assert_eq!(b"a", output.data());
        assert!(context.history.events().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_with_bodies_in_order() {
        let context = TestContext::setup();
        let url = "https://api.example.com/echo";
        for reply in ["one", "two", "three"] {
            context.transport.add_response(Method::POST, url, 200, reply).await;
        }

        let request = ServiceRequest::new(Service::post("echo", "echo"));
        let raw_bodies: [&'static [u8]; 3] = [b"1", b"2", b"3"];
        let bodies = raw_bodies.into_iter().map(Bytes::from_static).collect::<Vec<_>>();
        let results =
            context.center.fetch_bytes_with_bodies(request, bodies.clone()).await.unwrap();
        let exp_results: [&[u8]; 3] = [b"one", b"two", b"three"];
        assert_eq!(exp_results.to_vec(), results.iter().map(|r| &r[..]).collect::<Vec<_>>());

        let sent = context.transport.requests().await.into_iter().map(|r| r.body.unwrap());
        assert_eq!(bodies, sent.collect::<Vec<_>>());
        assert_eq!(3, context.history.events().len());
    }

    #[tokio::test]
    async fn test_fetch_models_with_bodies() {
        let context = TestContext::setup();
        let url = "https://api.example.com/widgets";
        context.transport.add_response(Method::POST, url, 201, r#"{"id": 1, "name": "a"}"#).await;
        context.transport.add_response(Method::POST, url, 201, r#"{"id": 2, "name": "b"}"#).await;

        let request = ServiceRequest::new(Service::post("create", "widgets"));
        let bodies = vec![
            Bytes::from_static(br#"{"name":"a"}"#),
            Bytes::from_static(br#"{"name":"b"}"#),
        ];
        let widgets = context
            .center
            .fetch_models_with_bodies::<Json<Widget>>(request, bodies)
            .await
            .unwrap()
            .into_iter()
            .map(Json::into_inner)
            .collect::<Vec<_>>();
        assert_eq!(
            vec![Widget { id: 1, name: "a".to_owned() }, Widget { id: 2, name: "b".to_owned() }],
            widgets
        );
    }

    #[tokio::test]
    async fn test_fetch_all_fails_fast() {
        let context = TestContext::setup();
        context.transport.add_response(Method::GET, "https://api.example.com/1", 200, "1").await;
        context.transport.add_response(Method::GET, "https://api.example.com/2", 503, "busy").await;
        context.transport.add_response(Method::GET, "https://api.example.com/3", 200, "3").await;

        let requests = ["1", "2", "3"]
            .into_iter()
            .map(|path| ServiceRequest::new(Service::get(path, path)))
            .collect();
        match context.center.fetch_all_bytes(requests).await {
            Err(ServiceError::Status(HttpStatus::ServerError(503, _))) => (),
            e => panic!("{:?}", e),
        }

        assert_eq!(
            vec!["https://api.example.com/1", "https://api.example.com/2"],
            context.transport.urls().await
        );
        assert_eq!(vec!["1", "2"], context.history_names());
    }

    #[tokio::test]
    async fn test_fetch_all_models_stops_on_decode_error() {
        let context = TestContext::setup();
        context.transport.add_response(Method::GET, "https://api.example.com/1", 200, "{").await;
        context.transport.add_response(Method::GET, "https://api.example.com/2", 200, "{}").await;

        let requests = vec![
            ServiceRequest::new(Service::get("1", "1")),
            ServiceRequest::new(Service::get("2", "2")),
        ];
        match context.center.fetch_all_models::<Json<serde_json::Value>>(requests).await {
            Err(ServiceError::Decode { payload, .. }) => assert_eq!(b"{", &payload[..]),
            e => panic!("{:?}", e),
        }
        assert_eq!(vec!["https://api.example.com/1"], context.transport.urls().await);
    }

    #[tokio::test]
    async fn test_fetch_all_models_nothing() {
        let context = TestContext::setup();
        context.transport.add_response(Method::DELETE, "https://api.example.com/1", 204, "").await;
        context.transport.add_response(Method::DELETE, "https://api.example.com/2", 204, "").await;

        let requests = vec![
            ServiceRequest::new(Service::delete("1", "1")),
            ServiceRequest::new(Service::delete("2", "2")),
        ];
        let results = context.center.fetch_all_models::<Nothing>(requests).await.unwrap();
        assert_eq!(vec![Nothing, Nothing], results);
    }

    #[tokio::test]
    async fn test_fetch_all_empty() {
        let context = TestContext::setup();
        assert!(context.center.fetch_all_bytes(vec![]).await.unwrap().is_empty());
        assert!(context.history.events().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_fetches() {
        let context = TestContext::setup();
        context.transport.add_response(Method::GET, "https://api.example.com/a", 200, "a").await;
        context.transport.add_response(Method::GET, "https://api.example.com/b", 200, "b").await;

        let (a, b) = futures::join!(
            context.center.fetch_bytes(ServiceRequest::new(Service::get("a", "a"))),
            context.center.fetch_bytes(ServiceRequest::new(Service::get("b", "b"))),
        );
        assert_eq!(Bytes::from_static(b"a"), a.unwrap());
        assert_eq!(Bytes::from_static(b"b"), b.unwrap());
        assert_eq!(2, context.history.events().len());
    }

    #[tokio::test]
    async fn test_logger_sees_request_and_payload() {
        let context = TestContext::setup();
        context.transport.add_response(Method::GET, "https://api.example.com/a", 200, "hi").await;

        let logger = RecorderServiceLogger::default();
        let request =
            ServiceRequest::new(Service::get("a", "a")).with_logger(Arc::new(logger.clone()));
        context.center.fetch_bytes(request).await.unwrap();

        let messages = logger.messages.lock().unwrap().clone();
        assert_eq!(2, messages.len());
        assert!(messages[0].starts_with("a GET https://api.example.com/a"));
        assert_eq!("a <- hi", messages[1]);
    }

    #[tokio::test]
    async fn test_updates_and_duplicate() {
        let context = TestContext::setup();
        assert_eq!(Url::parse(BASE_URL).unwrap(), context.center.main_url().await);
        assert_eq!("0.0.0", context.center.state().await.version());
        assert!(context.center.history().await.is_some());

        let copy = context.center.duplicate().await;
        copy.update_url(Url::parse("https://copy.example.com/").unwrap()).await;
        copy.update_state(Arc::new(EmptyServiceState::with_version("2.0.0"))).await;
        copy.update_history(None).await;
        copy.update_curator(Arc::new(BasicCurator::new(ServiceAuth::bearer("copy")))).await;

        assert_eq!(Url::parse(BASE_URL).unwrap(), context.center.main_url().await);
        assert_eq!("0.0.0", context.center.state().await.version());
        assert!(context.center.history().await.is_some());
        assert_eq!(ServiceAuth::Nothing, context.center.auth().await);

        assert_eq!("https://copy.example.com/", copy.main_url().await.as_str());
        assert_eq!("2.0.0", copy.state().await.version());
        assert!(copy.history().await.is_none());
        assert_eq!(ServiceAuth::bearer("copy"), copy.curator().await.service_auth().await);

        context.transport.add_response(Method::GET, "https://copy.example.com/x", 200, "").await;
        copy.fetch_bytes(ServiceRequest::new(Service::get("x", "x"))).await.unwrap();
        assert!(context.history.events().is_empty());
    }

    #[tokio::test]
    async fn test_update_history() {
        let context = TestContext::setup();
        context.transport.add_response(Method::GET, "https://api.example.com/a", 200, "").await;

        let other = Arc::new(InMemoryHistory::default());
        context.center.update_history(Some(other.clone())).await;
        context.center.fetch_bytes(ServiceRequest::new(Service::get("a", "a"))).await.unwrap();

        assert!(context.history.events().is_empty());
        assert_eq!(1, other.events().len());
    }

    #[test]
    fn test_from_options() {
        let opts = ServiceCenterOptions::new(Url::parse(BASE_URL).unwrap()).unwrap();
        ServiceCenter::from_options(opts).unwrap();
    }
}
