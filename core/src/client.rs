//! Request pipeline for the Feedly API.
//!
//! # Design
//! `FeedlrClient` holds an immutable `ClientConfig` and a `Transport` and
//! carries no mutable state between calls. Every endpoint funnels through
//! [`FeedlrClient::build_object`]:
//!
//! 1. `build_request` turns method, path, params and headers into an
//!    `HttpRequest` (params go to the query for GET/DELETE and to the JSON
//!    body for POST/PUT).
//! 2. `run_request` performs exactly one transport call and translates
//!    transport failures.
//! 3. `verify_success` rejects any non-2xx status.
//! 4. The body is parsed and classified into an `ApiObject`.

use serde_json::Value;

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::http::{set_header, HttpMethod, HttpRequest, HttpResponse};
use crate::input::Payload;
use crate::object::{classify, parse_body, ApiObject};
use crate::transport::{Transport, TransportError};

/// Synchronous, stateless client for the Feedly API.
#[derive(Debug, Clone)]
pub struct FeedlrClient<T> {
    config: ClientConfig,
    transport: T,
}

#[cfg(feature = "ureq")]
impl FeedlrClient<crate::transport::UreqTransport> {
    /// A client over the default blocking transport, honouring the
    /// configured timeout.
    pub fn with_ureq(config: ClientConfig) -> Self {
        let transport = crate::transport::UreqTransport::from_config(&config);
        Self::new(config, transport)
    }
}

impl<T: Transport> FeedlrClient<T> {
    pub fn new(config: ClientConfig, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Issue one request and wrap the validated body.
    pub fn build_object(
        &self,
        method: HttpMethod,
        path: &str,
        params: Option<Payload>,
        headers: &[(String, String)],
    ) -> Result<ApiObject> {
        let response = self.request(method, path, params, headers)?;
        let body = parse_body(&response.body)?;
        let object = classify(body, response.headers)?;
        tracing::debug!(%method, path, shape = shape_name(&object), "built response object");
        Ok(object)
    }

    /// Build, run and validate one request.
    pub fn request(
        &self,
        method: HttpMethod,
        path: &str,
        params: Option<Payload>,
        headers: &[(String, String)],
    ) -> Result<HttpResponse> {
        let request = self.build_request(method, path, params, headers)?;
        let response = self.run_request(&request)?;
        verify_success(response)
    }

    /// Assemble the `HttpRequest` for a call.
    ///
    /// Header precedence: config defaults, then `Authorization`, then the
    /// per-call `headers`.
    pub fn build_request(
        &self,
        method: HttpMethod,
        path: &str,
        params: Option<Payload>,
        headers: &[(String, String)],
    ) -> Result<HttpRequest> {
        let mut all_headers = vec![
            ("Accept".to_string(), "application/json".to_string()),
            ("User-Agent".to_string(), self.config.user_agent.clone()),
        ];
        for (name, value) in &self.config.default_headers {
            set_header(&mut all_headers, name, value);
        }
        if let Some(token) = &self.config.oauth_access_token {
            set_header(&mut all_headers, "Authorization", &format!("OAuth {token}"));
        }

        let mut query = Vec::new();
        let mut body = None;
        match params {
            None => {}
            Some(payload) if method.carries_body() => {
                body = Some(serde_json::to_string(&payload)?);
                set_header(&mut all_headers, "Content-Type", "application/json");
            }
            Some(Payload::Mapping(map)) => {
                for (key, value) in map {
                    push_query(&mut query, key, value)?;
                }
            }
            Some(Payload::Sequence(_)) => {
                return Err(Error::TypeMismatch {
                    expected: "mapping",
                    found: "sequence",
                })
            }
        }

        for (name, value) in headers {
            set_header(&mut all_headers, name, value);
        }

        Ok(HttpRequest {
            method,
            path: self.config.url(path),
            query,
            headers: all_headers,
            body,
        })
    }

    /// Execute `request` on the transport, translating transport failures.
    pub fn run_request(&self, request: &HttpRequest) -> Result<HttpResponse> {
        tracing::debug!(method = %request.method, url = %request.url(), "dispatching request");
        self.transport.send(request).map_err(|err| match err {
            TransportError::Timeout(message) => {
                tracing::warn!(method = %request.method, path = %request.path, %message, "request timed out");
                Error::RequestTimeout { message }
            }
            TransportError::Client { message, source } => {
                tracing::warn!(method = %request.method, path = %request.path, %message, "transport failure");
                Error::Transport { message, source }
            }
        })
    }
}

/// Pass 2xx responses through; map anything else to its error variant.
pub fn verify_success(response: HttpResponse) -> Result<HttpResponse> {
    if response.is_success() {
        return Ok(response);
    }
    tracing::warn!(status = response.status, "request failed");
    Err(Error::from_response(response))
}

/// Flatten one param into query pairs. Nulls are dropped, arrays repeat the
/// key once per element, and nested structures are rejected.
fn push_query(query: &mut Vec<(String, String)>, key: String, value: Value) -> Result<()> {
    match value {
        Value::Null => {}
        Value::Array(items) => {
            for item in items {
                if let Some(text) = scalar_query_value(item)? {
                    query.push((key.clone(), text));
                }
            }
        }
        other => {
            if let Some(text) = scalar_query_value(other)? {
                query.push((key, text));
            }
        }
    }
    Ok(())
}

fn scalar_query_value(value: Value) -> Result<Option<String>> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Bool(_) | Value::Number(_) => Ok(Some(value.to_string())),
        Value::Array(_) => Err(Error::TypeMismatch {
            expected: "scalar query value",
            found: "array",
        }),
        Value::Object(_) => Err(Error::TypeMismatch {
            expected: "scalar query value",
            found: "object",
        }),
    }
}

fn shape_name(object: &ApiObject) -> &'static str {
    match object {
        ApiObject::Resource(_) => "resource",
        ApiObject::Collection(_) => "collection",
        ApiObject::Success => "success",
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::io;

    use serde_json::json;

    use super::*;
    use crate::error::ErrorKind;
    use crate::input::input_to_payload;

    /// Records every request and replays queued outcomes in order.
    #[derive(Default)]
    pub(crate) struct ScriptedTransport {
        pub requests: RefCell<Vec<HttpRequest>>,
        outcomes: RefCell<VecDeque<Result<HttpResponse, TransportError>>>,
    }

    impl ScriptedTransport {
        pub fn respond(status: u16, body: &str) -> Self {
            let transport = Self::default();
            transport.push(Ok(HttpResponse {
                status,
                headers: Vec::new(),
                body: body.to_string(),
            }));
            transport
        }

        pub fn fail(err: TransportError) -> Self {
            let transport = Self::default();
            transport.push(Err(err));
            transport
        }

        pub fn push(&self, outcome: Result<HttpResponse, TransportError>) {
            self.outcomes.borrow_mut().push_back(outcome);
        }
    }

    impl Transport for ScriptedTransport {
        fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
            self.requests.borrow_mut().push(request.clone());
            self.outcomes
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Err(TransportError::client("no scripted response")))
        }
    }

    fn client(transport: ScriptedTransport) -> FeedlrClient<ScriptedTransport> {
        FeedlrClient::new(
            ClientConfig::new("http://localhost:3000/v3").with_oauth_access_token("token"),
            transport,
        )
    }

    fn headers(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn sends_one_request_per_verb_with_params_and_headers() {
        for method in [HttpMethod::Get, HttpMethod::Delete, HttpMethod::Post, HttpMethod::Put] {
            let c = client(ScriptedTransport::respond(200, r#"{"a":"b"}"#));
            let params = input_to_payload(&json!({"q": "one", "count": "30"})).unwrap();
            let extra = headers(&[("h1", "h1one"), ("h2", "h2one")]);

            let object = c.build_object(method, "/categories", Some(params), &extra).unwrap();
            assert!(object.as_resource().is_some(), "{method}");

            let requests = c.transport().requests.borrow();
            assert_eq!(requests.len(), 1, "{method}");
            let req = &requests[0];
            assert_eq!(req.method, method);
            assert_eq!(req.path, "http://localhost:3000/v3/categories");
            assert_eq!(req.header("h1"), Some("h1one"));
            assert_eq!(req.header("h2"), Some("h2one"));
            assert_eq!(req.header("authorization"), Some("OAuth token"));
            if method.carries_body() {
                let body: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
                assert_eq!(body, json!({"q": "one", "count": "30"}));
                assert!(req.query.is_empty());
                assert_eq!(req.header("content-type"), Some("application/json"));
            } else {
                assert!(req.body.is_none());
                assert_eq!(req.query, headers(&[("count", "30"), ("q", "one")]));
            }
        }
    }

    #[test]
    fn builds_an_object_without_params() {
        let c = client(ScriptedTransport::respond(200, r#"{"a":"b"}"#));
        let object = c.build_object(HttpMethod::Get, "/categories", None, &[]).unwrap();
        assert_eq!(object.as_resource().unwrap().str("a"), Some("b"));
        assert!(c.transport().requests.borrow()[0].query.is_empty());
    }

    #[test]
    fn scalar_query_values_are_rendered_as_text() {
        let c = client(ScriptedTransport::respond(204, ""));
        let params = input_to_payload(&json!({"count": 20, "unreadOnly": true, "skip": null})).unwrap();
        c.build_object(HttpMethod::Get, "/streams/contents", Some(params), &[]).unwrap();
        let req = &c.transport().requests.borrow()[0];
        assert_eq!(req.query, headers(&[("count", "20"), ("unreadOnly", "true")]));
    }

    #[test]
    fn array_query_values_repeat_the_key() {
        let c = client(ScriptedTransport::respond(200, "[]"));
        let params = input_to_payload(&json!({"ids": ["feed/a", "feed/b", null], "count": 2})).unwrap();
        c.build_object(HttpMethod::Get, "/feeds", Some(params), &[]).unwrap();
        let req = &c.transport().requests.borrow()[0];
        assert_eq!(req.query, headers(&[("count", "2"), ("ids", "feed/a"), ("ids", "feed/b")]));
        assert_eq!(req.url(), "http://localhost:3000/v3/feeds?count=2&ids=feed%2Fa&ids=feed%2Fb");
    }

    #[test]
    fn nested_query_values_are_rejected_before_dispatch() {
        for params in [json!({"filter": {"x": 1}}), json!({"ids": [["a"], "b"]})] {
            let c = client(ScriptedTransport::respond(200, "{}"));
            let payload = input_to_payload(&params).unwrap();
            let err = c.build_object(HttpMethod::Delete, "/feeds", Some(payload), &[]).unwrap_err();
            assert!(matches!(err, Error::TypeMismatch { expected: "scalar query value", .. }), "{params}");
            assert!(c.transport().requests.borrow().is_empty());
        }
    }

    #[test]
    fn sequence_params_on_get_are_rejected_before_dispatch() {
        let c = client(ScriptedTransport::respond(200, "{}"));
        let params = input_to_payload(&vec!["a", "b"]).unwrap();
        let err = c.build_object(HttpMethod::Get, "/markers", Some(params), &[]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
        assert!(c.transport().requests.borrow().is_empty());
    }

    #[test]
    fn sequence_payload_on_post_becomes_json_array() {
        let c = client(ScriptedTransport::respond(200, ""));
        let params = input_to_payload(&(5, 10)).unwrap();
        let object = c.build_object(HttpMethod::Post, "/tags", Some(params), &[]).unwrap();
        assert!(object.is_success());
        assert_eq!(c.transport().requests.borrow()[0].body.as_deref(), Some("[5,10]"));
    }

    #[test]
    fn call_headers_override_config_headers() {
        let config = ClientConfig::new("http://localhost:3000/v3")
            .with_oauth_access_token("token")
            .with_header("X-Client", "default");
        let c = FeedlrClient::new(config, ScriptedTransport::respond(200, ""));
        let extra = headers(&[("authorization", "OAuth other"), ("x-client", "override")]);
        c.request(HttpMethod::Get, "/profile", None, &extra).unwrap();
        let req = &c.transport().requests.borrow()[0];
        assert_eq!(req.header("Authorization"), Some("OAuth other"));
        assert_eq!(req.header("X-Client"), Some("override"));
        assert_eq!(req.headers.iter().filter(|(k, _)| k.eq_ignore_ascii_case("authorization")).count(), 1);
    }

    #[test]
    fn no_token_means_no_authorization_header() {
        let c = FeedlrClient::new(ClientConfig::sandbox(), ScriptedTransport::respond(200, ""));
        c.request(HttpMethod::Get, "/profile", None, &[]).unwrap();
        let req = &c.transport().requests.borrow()[0];
        assert!(req.header("authorization").is_none());
        assert_eq!(req.path, "https://sandbox.feedly.com/v3/profile");
    }

    #[test]
    fn transport_timeout_becomes_request_timeout() {
        let c = client(ScriptedTransport::fail(TransportError::Timeout("execution expired".to_string())));
        let err = c.request(HttpMethod::Get, "/path", None, &[]).unwrap_err();
        assert!(matches!(err, Error::RequestTimeout { ref message } if message == "execution expired"));
    }

    #[test]
    fn generic_io_timeout_becomes_request_timeout() {
        for kind in [io::ErrorKind::TimedOut, io::ErrorKind::WouldBlock] {
            let io_err = io::Error::new(kind, "execution expired");
            let c = client(ScriptedTransport::fail(io_err.into()));
            let err = c.request(HttpMethod::Get, "/path", None, &[]).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::RequestTimeout, "{kind:?}");
        }
    }

    #[cfg(feature = "ureq")]
    #[test]
    fn ureq_client_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<FeedlrClient<crate::transport::UreqTransport>>();
    }

    #[test]
    fn transport_client_error_keeps_cause() {
        let io_err = io::Error::new(io::ErrorKind::ConnectionRefused, "connection failed");
        let c = client(ScriptedTransport::fail(io_err.into()));
        let err = c.request(HttpMethod::Get, "/path", None, &[]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ClientError);
        assert!(std::error::Error::source(&err).is_some());
        assert_eq!(err.to_string(), "transport failure: connection failed");
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let c = client(ScriptedTransport::respond(200, "{unexpected token"));
        let err = c.build_object(HttpMethod::Get, "/path", None, &[]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ParseError);
        assert!(err.kind().is_client_error());
    }

    #[test]
    fn request_verifies_status() {
        let c = client(ScriptedTransport::respond(400, r#"{"a":"b"}"#));
        let err = c.request(HttpMethod::Get, "/path", None, &[]).unwrap_err();
        assert!(matches!(err, Error::BadRequest(_)));
        assert_eq!(err.response().unwrap().body, r#"{"a":"b"}"#);
    }

    #[test]
    fn error_body_is_not_parsed_as_an_object() {
        let c = client(ScriptedTransport::respond(500, "<html>oops</html>"));
        let err = c.build_object(HttpMethod::Get, "/path", None, &[]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ServerError);
    }

    #[test]
    fn verify_success_covers_whole_2xx_range() {
        for status in 200..=299 {
            let response = HttpResponse {
                status,
                headers: Vec::new(),
                body: String::new(),
            };
            assert!(verify_success(response).is_ok(), "status {status}");
        }
        for status in [100, 199, 300, 304, 400, 401, 403, 404, 418, 500, 502, 600] {
            let response = HttpResponse {
                status,
                headers: Vec::new(),
                body: String::new(),
            };
            let err = verify_success(response).unwrap_err();
            assert_eq!(Some(err.kind()), ErrorKind::from_status(status), "status {status}");
        }
    }

    #[test]
    fn collection_order_and_headers_survive_pipeline() {
        let transport = ScriptedTransport::default();
        transport.push(Ok(HttpResponse {
            status: 200,
            headers: headers(&[("X-Ratelimit-Count", "3")]),
            body: r#"[{"id":"b"},{"id":"a"}]"#.to_string(),
        }));
        let c = client(transport);
        let collection = c
            .build_object(HttpMethod::Get, "/subscriptions", None, &[])
            .unwrap()
            .into_collection()
            .unwrap();
        let ids: Vec<_> = collection.iter().map(|r| r.str("id").unwrap()).collect();
        assert_eq!(ids, ["b", "a"]);
        assert_eq!(collection.rate_limit().count, Some(3));
    }
}
