use bytes::Bytes;
use futures_util::future::join_all;
use http::header::{HeaderName, HeaderValue};
use http::{Method, Request, Uri};
use http_body_util::Full;
use log::{debug, info, warn};
use std::time::Duration;
use url::Url;

use crate::error::{Error, Result};
use crate::request_file::RequestSpec;
use crate::transport::{RawResponse, Transport};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Result of executing one spec: a response or the transport error.
#[derive(Debug)]
pub struct RequestOutcome {
    /// Position of the originating spec in the dispatched slice.
    pub index: usize,
    pub title: String,
    pub result: Result<RawResponse>,
}

#[derive(Debug, Clone)]
pub struct Dispatcher {
    pub timeout: Duration,
    /// Run independent specs concurrently. Outcomes stay in spec order.
    pub parallel: bool,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            parallel: false,
        }
    }
}

impl Dispatcher {
    /// Executes every spec. A spec whose request cannot be built is skipped
    /// and produces no outcome; use [`RequestOutcome::index`] to match
    /// outcomes back to specs.
    pub async fn dispatch_all<T: Transport>(
        &self,
        specs: &[RequestSpec],
        transport: &T,
    ) -> Result<Vec<RequestOutcome>> {
        if specs.is_empty() {
            return Err(Error::EmptyBatch);
        }

        let calls = specs
            .iter()
            .enumerate()
            .map(|(index, spec)| self.dispatch_indexed(index, spec, transport));

        let results = if self.parallel {
            join_all(calls).await
        } else {
            let mut results = Vec::with_capacity(specs.len());
            for call in calls {
                results.push(call.await);
            }
            results
        };

        let mut outcomes = Vec::with_capacity(results.len());
        for result in results {
            match result {
                Ok(outcome) => outcomes.push(outcome),
                Err(err) => warn!("skipping request: {err}"),
            }
        }

        info!("dispatched {} of {} requests", outcomes.len(), specs.len());
        Ok(outcomes)
    }

    /// Executes a single spec. Construction failures are returned as `Err`;
    /// transport failures are carried inside the outcome.
    pub async fn dispatch_one<T: Transport>(
        &self,
        spec: &RequestSpec,
        transport: &T,
    ) -> Result<RequestOutcome> {
        self.dispatch_indexed(0, spec, transport).await
    }

    async fn dispatch_indexed<T: Transport>(
        &self,
        index: usize,
        spec: &RequestSpec,
        transport: &T,
    ) -> Result<RequestOutcome> {
        let request = build_request(spec)?;

        debug!("sending `{}`: {} {}", spec.title, request.method(), request.uri());
        let result = transport.execute(request, self.timeout).await;

        Ok(RequestOutcome {
            index,
            title: spec.title.clone(),
            result,
        })
    }
}

/// Turns a spec into a request. An empty method means `GET`.
pub fn build_request(spec: &RequestSpec) -> Result<Request<Full<Bytes>>> {
    let fail = |reason: String| Error::RequestConstructionFailed {
        title: spec.title.clone(),
        reason,
    };

    let method = if spec.method.is_empty() {
        Method::GET
    } else {
        Method::from_bytes(spec.method.as_bytes()).map_err(|err| fail(err.to_string()))?
    };

    let url = Url::parse(&spec.url).map_err(|err| fail(format!("invalid url `{}`: {err}", spec.url)))?;
    let uri: Uri = url
        .as_str()
        .parse()
        .map_err(|err| fail(format!("invalid url `{}`: {err}", spec.url)))?;

    let mut request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Full::new(spec.body.clone()))
        .map_err(|err| fail(err.to_string()))?;

    for (key, value) in &spec.headers {
        let name = HeaderName::from_bytes(key.as_bytes())
            .map_err(|err| fail(format!("invalid header name `{key}`: {err}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|err| fail(format!("invalid value for header `{key}`: {err}")))?;
        request.headers_mut().insert(name, value);
    }

    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BoxError;
    use http::Response;
    use http_body_util::BodyExt;
    use std::sync::Mutex;

    /// Records requests and answers 200, or fails for hosts named `down`.
    #[derive(Default)]
    struct FakeTransport {
        seen: Mutex<Vec<(Method, String, http::HeaderMap, Duration)>>,
    }

    impl Transport for FakeTransport {
        async fn execute(&self, request: Request<Full<Bytes>>, timeout: Duration) -> Result<RawResponse> {
            let uri = request.uri().to_string();
            self.seen.lock().unwrap().push((
                request.method().clone(),
                uri.clone(),
                request.headers().clone(),
                timeout,
            ));

            if request.uri().host() == Some("down") {
                return Err(Error::TransportFailed("connection refused".into()));
            }

            let body = request.into_body().map_err(|never| -> BoxError { match never {} });
            Ok(Response::new(body.boxed_unsync()))
        }
    }

    fn spec(title: &str, method: &str, url: &str) -> RequestSpec {
        RequestSpec {
            title: title.to_string(),
            method: method.to_string(),
            url: url.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn empty_batch_is_rejected() {
        let err = Dispatcher::default()
            .dispatch_all(&[], &FakeTransport::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::EmptyBatch));
    }

    #[tokio::test]
    async fn bad_url_does_not_abort_siblings() {
        let specs = [
            spec("one", "GET", "http://localhost/1"),
            spec("two", "GET", "not a url"),
            spec("three", "DELETE", "http://localhost/3"),
        ];
        let transport = FakeTransport::default();
        let outcomes = Dispatcher::default().dispatch_all(&specs, &transport).await.unwrap();

        let indexes: Vec<_> = outcomes.iter().map(|o| o.index).collect();
        assert_eq!(indexes, [0, 2]);
        assert_eq!(outcomes[1].title, "three");
        assert!(outcomes.iter().all(|o| o.result.is_ok()));
        assert_eq!(transport.seen.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn transport_error_is_carried_in_outcome() {
        let specs = [
            spec("down", "GET", "http://down/"),
            spec("up", "GET", "http://localhost/"),
        ];
        let outcomes = Dispatcher::default()
            .dispatch_all(&specs, &FakeTransport::default())
            .await
            .unwrap();

        assert_eq!(outcomes.len(), 2);
        assert!(matches!(outcomes[0].result, Err(Error::TransportFailed(_))));
        assert!(outcomes[1].result.is_ok());
    }

    #[tokio::test]
    async fn parallel_dispatch_keeps_spec_order() {
        let specs: Vec<_> = (0..5)
            .map(|i| spec(&format!("r{i}"), "GET", &format!("http://localhost/{i}")))
            .collect();
        let dispatcher = Dispatcher {
            parallel: true,
            ..Default::default()
        };
        let outcomes = dispatcher
            .dispatch_all(&specs, &FakeTransport::default())
            .await
            .unwrap();

        let titles: Vec<_> = outcomes.iter().map(|o| o.title.as_str()).collect();
        assert_eq!(titles, ["r0", "r1", "r2", "r3", "r4"]);
    }

    #[tokio::test]
    async fn dispatch_one_applies_headers_body_and_timeout() {
        let mut request = spec("post", "POST", "http://localhost:8080/items?x=1");
        request.headers.insert("Content-Type".into(), "application/json".into());
        request.headers.insert("X-Trace".into(), "abc".into());
        request.body = Bytes::from(r#"{"name":"widget"}"#);

        let transport = FakeTransport::default();
        let dispatcher = Dispatcher {
            timeout: Duration::from_secs(3),
            ..Default::default()
        };
        let outcome = dispatcher.dispatch_one(&request, &transport).await.unwrap();

        let body = outcome.result.unwrap().into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body, Bytes::from(r#"{"name":"widget"}"#));

        let seen = transport.seen.lock().unwrap();
        let (method, uri, headers, timeout) = &seen[0];
        assert_eq!(*method, Method::POST);
        assert_eq!(uri, "http://localhost:8080/items?x=1");
        assert_eq!(headers["content-type"], "application/json");
        assert_eq!(headers["x-trace"], "abc");
        assert_eq!(*timeout, Duration::from_secs(3));
    }

    #[tokio::test]
    async fn dispatch_one_reports_construction_failure() {
        let err = Dispatcher::default()
            .dispatch_one(&spec("bad", "GET", ""), &FakeTransport::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::RequestConstructionFailed { ref title, .. } if title == "bad"));
    }

    #[test]
    fn empty_method_defaults_to_get() {
        let request = build_request(&spec("t", "", "http://localhost/")).unwrap();
        assert_eq!(*request.method(), Method::GET);
    }

    #[tokio::test]
    async fn invalid_header_value_skips_only_that_request() {
        let mut bad = spec("bad", "GET", "http://localhost/bad");
        bad.headers.insert("X-Note".into(), "line\nbreak".into());
        let specs = [bad, spec("good", "GET", "http://localhost/good")];

        let outcomes = Dispatcher::default()
            .dispatch_all(&specs, &FakeTransport::default())
            .await
            .unwrap();
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].index, 1);
    }

    #[test]
    fn invalid_header_name_fails_construction() {
        let mut bad = spec("t", "GET", "http://localhost/");
        bad.headers.insert("Bad Header".into(), "x".into());
        assert!(matches!(
            build_request(&bad),
            Err(Error::RequestConstructionFailed { .. })
        ));
    }
}
