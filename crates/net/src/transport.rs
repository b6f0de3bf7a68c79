//! One HTTP/1.1 exchange per connection
//!
//! Opens a TCP (optionally TLS) stream, performs a single request with hyper
//! and buffers the response body. Bodies are capped at 1MB.

use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full, Limited};
use hyper::{Method, Request, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_rustls::rustls::pki_types::ServerName;
use tokio_rustls::rustls::{ClientConfig, RootCertStore};
use tokio_rustls::TlsConnector;
use tracing::{debug, warn};

use crate::endpoint::BaseUrl;
use crate::error::{Error, Result};

/// Maximum accepted response body (1MB)
const MAX_BODY_SIZE: usize = 1024 * 1024;

/// Buffered response
#[derive(Debug)]
pub(crate) struct HttpResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

/// Connector trusting the bundled web PKI roots
pub(crate) fn tls_connector() -> TlsConnector {
    let mut root_cert_store = RootCertStore::empty();
    root_cert_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    let config = ClientConfig::builder()
        .with_root_certificates(root_cert_store)
        .with_no_client_auth();
    TlsConnector::from(Arc::new(config))
}

/// Outgoing request, before it is bound to a connection
pub(crate) struct Outgoing<'a> {
    pub method: Method,
    pub path: &'a str,
    pub authorization: Option<&'a str>,
    pub body: Option<Vec<u8>>,
}

/// Send one request to the backend and buffer the answer
pub(crate) async fn send(
    base: &BaseUrl,
    tls: Option<&TlsConnector>,
    outgoing: Outgoing<'_>,
) -> Result<HttpResponse> {
    let stream = TcpStream::connect((base.connect_host(), base.port)).await?;
    stream.set_nodelay(true)?;

    let request = build_request(base, outgoing)?;

    match (base.secure, tls) {
        (true, Some(connector)) => {
            let server_name = ServerName::try_from(base.connect_host().to_string())
                .map_err(|e| Error::Tls(e.to_string()))?;
            let stream = connector
                .connect(server_name, stream)
                .await
                .map_err(|e| Error::Tls(e.to_string()))?;
            exchange(stream, request).await
        }
        (true, None) => Err(Error::Tls("no TLS connector configured".to_string())),
        (false, _) => exchange(stream, request).await,
    }
}

fn build_request(base: &BaseUrl, outgoing: Outgoing<'_>) -> Result<Request<Full<Bytes>>> {
    let mut builder = Request::builder()
        .method(outgoing.method)
        .uri(outgoing.path)
        .header(hyper::header::HOST, base.authority())
        .header(hyper::header::ACCEPT, "application/json");

    if let Some(value) = outgoing.authorization {
        builder = builder.header(hyper::header::AUTHORIZATION, value);
    }

    let body = match outgoing.body {
        Some(bytes) => {
            builder = builder.header(hyper::header::CONTENT_TYPE, "application/json");
            Full::new(Bytes::from(bytes))
        }
        None => Full::new(Bytes::new()),
    };

    Ok(builder.body(body)?)
}

async fn exchange<S>(stream: S, request: Request<Full<Bytes>>) -> Result<HttpResponse>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let io = TokioIo::new(stream);
    let (mut sender, conn) = hyper::client::conn::http1::handshake(io).await?;
    tokio::spawn(async move {
        if let Err(e) = conn.await {
            warn!(error = %e, "Connection failed");
        }
    });

    let method = request.method().clone();
    let uri = request.uri().clone();
    let response = sender.send_request(request).await?;
    let status = response.status();

    let body = Limited::new(response.into_body(), MAX_BODY_SIZE)
        .collect()
        .await
        .map_err(|e| Error::Protocol(format!("Failed to read body: {}", e)))?
        .to_bytes();

    debug!(method = %method, uri = %uri, status = status.as_u16(), bytes = body.len(), "HTTP exchange");

    Ok(HttpResponse { status, body })
}
