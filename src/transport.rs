use bytes::Bytes;
use http::header::HOST;
use http::{HeaderValue, Request, Response, Uri};
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Full};
use hyper_util::rt::TokioIo;
use log::{debug, warn};
use std::future::Future;
use std::time::Duration;
use tokio::net::TcpStream;

use crate::error::{BoxError, Error, Result};

/// Response as handed back by a transport: status, headers and an unread body.
pub type RawResponse = Response<UnsyncBoxBody<Bytes, BoxError>>;

/// Executes a single built request.
///
/// Implementations own connection setup, TLS and redirect policy; the
/// dispatcher only hands over the request and the per-call timeout.
pub trait Transport {
    fn execute(
        &self,
        request: Request<Full<Bytes>>,
        timeout: Duration,
    ) -> impl Future<Output = Result<RawResponse>> + Send;
}

/// Plain HTTP/1.1 over a fresh TCP connection per request.
#[derive(Debug, Clone, Copy, Default)]
pub struct HyperTransport;

impl Transport for HyperTransport {
    async fn execute(&self, request: Request<Full<Bytes>>, timeout: Duration) -> Result<RawResponse> {
        match tokio::time::timeout(timeout, send(request)).await {
            Ok(res) => res.map_err(Error::TransportFailed),
            Err(elapsed) => Err(Error::TransportFailed(Box::new(elapsed))),
        }
    }
}

async fn send(mut request: Request<Full<Bytes>>) -> std::result::Result<RawResponse, BoxError> {
    let uri = request.uri().clone();
    if uri.scheme_str() != Some("http") {
        return Err(format!("unsupported protocol scheme in {uri}").into());
    }

    let host = uri.host().ok_or("uri has no host")?;
    let host = host.trim_start_matches('[').trim_end_matches(']');
    let port = uri.port_u16().unwrap_or(80);

    debug!("connecting to {host}:{port}");
    let stream = TcpStream::connect((host, port)).await?;

    let (mut sender, conn) = hyper::client::conn::http1::handshake(TokioIo::new(stream)).await?;
    tokio::task::spawn(async move {
        if let Err(err) = conn.await {
            warn!("connection failed: {err:?}");
        }
    });

    if !request.headers().contains_key(HOST) {
        if let Some(authority) = uri.authority() {
            request
                .headers_mut()
                .insert(HOST, HeaderValue::from_str(authority.as_str())?);
        }
    }

    let target = uri.path_and_query().map_or("/", |pq| pq.as_str());
    *request.uri_mut() = target.parse::<Uri>()?;

    let res = sender.send_request(request).await?;

    Ok(res.map(|body| body.map_err(BoxError::from).boxed_unsync()))
}
