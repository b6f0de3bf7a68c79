//! REST client for the slot backend

use std::time::Duration;

use hyper::Method;
use slotbook_core::{
    BackendError, Catalog, CollectionId, CommitRequest, Config, HeldSlot, SlotBackend,
};
use tokio_rustls::TlsConnector;
use tracing::{debug, info, instrument, warn};

use crate::endpoint::BaseUrl;
use crate::error::{Error, Result};
use crate::protocol::{action_body, decode_catalog, decode_error, decode_my_slot};
use crate::transport::{self, HttpResponse, Outgoing};

/// Default limit for one HTTP exchange
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Client for one backend root, acting as one authenticated participant
#[derive(Clone)]
pub struct RestClient {
    base: BaseUrl,
    authorization: Option<String>,
    request_timeout: Duration,
    tls: Option<TlsConnector>,
}

impl RestClient {
    /// Create a client for a base URL such as `https://host/api`
    pub fn new(base_url: &str) -> Result<Self> {
        let base = BaseUrl::parse(base_url)?;
        let tls = base.secure.then(transport::tls_connector);
        Ok(Self {
            base,
            authorization: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            tls,
        })
    }

    /// Build from the loaded configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut client = Self::new(&config.base_url)?.with_request_timeout(config.request_timeout());
        if let Some(token) = &config.auth_token {
            client = client.with_auth(token);
        }
        Ok(client)
    }

    /// Send `value` verbatim as the `Authorization` header of every request
    pub fn with_auth(mut self, value: &str) -> Self {
        self.authorization = Some(value.to_string());
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn base(&self) -> &BaseUrl {
        &self.base
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// `GET /collection/{collectionId}`
    #[instrument(skip(self), fields(base = %self.base))]
    pub async fn get_collection(&self, collection: &CollectionId) -> Result<Catalog> {
        let path = self.base.collection_path(collection)?;
        let response = self.execute(Method::GET, &path, None).await?;
        let catalog = decode_catalog(&response.body)?;
        info!(teams = catalog.teams.len(), slots = catalog.slot_count(), "Fetched collection");
        Ok(catalog)
    }

    /// `GET /collection/{collectionId}/mySlot`
    #[instrument(skip(self), fields(base = %self.base))]
    pub async fn get_my_slot(&self, collection: &CollectionId) -> Result<Option<HeldSlot>> {
        let path = self.base.my_slot_path(collection)?;
        let response = self.execute(Method::GET, &path, None).await?;
        decode_my_slot(&response.body)
    }

    /// `POST .../teams/{teamId}/slots/{slotId}/{book|cancel|assign}`
    #[instrument(skip(self, request), fields(key = %request.key, action = request.kind.verb()))]
    pub async fn post_action(&self, collection: &CollectionId, request: &CommitRequest) -> Result<()> {
        let path = self.base.action_path(collection, &request.key, &request.kind)?;
        let body = action_body(&request.kind)?;
        self.execute(Method::POST, &path, body).await?;
        info!("Backend accepted action");
        Ok(())
    }

    async fn execute(&self, method: Method, path: &str, body: Option<Vec<u8>>) -> Result<HttpResponse> {
        let outgoing = Outgoing {
            method,
            path,
            authorization: self.authorization.as_deref(),
            body,
        };
        let exchange = transport::send(&self.base, self.tls.as_ref(), outgoing);
        let response = tokio::time::timeout(self.request_timeout, exchange)
            .await
            .map_err(|_| Error::Timeout(self.request_timeout))??;

        if response.status.is_success() {
            debug!(status = response.status.as_u16(), "Request succeeded");
            return Ok(response);
        }

        let message = decode_error(&response.body);
        warn!(
            status = response.status.as_u16(),
            message = message.as_deref().unwrap_or(""),
            "Backend rejected request"
        );
        Err(Error::Status {
            status: response.status.as_u16(),
            message,
        })
    }
}

impl SlotBackend for RestClient {
    async fn fetch_collection(&self, collection: &CollectionId) -> std::result::Result<Catalog, BackendError> {
        Ok(self.get_collection(collection).await?)
    }

    async fn my_slot(
        &self,
        collection: &CollectionId,
    ) -> std::result::Result<Option<HeldSlot>, BackendError> {
        Ok(self.get_my_slot(collection).await?)
    }

    async fn commit(
        &self,
        collection: &CollectionId,
        request: &CommitRequest,
    ) -> std::result::Result<(), BackendError> {
        Ok(self.post_action(collection, request).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::convert::Infallible;
    use std::sync::{Arc, Mutex};

    use bytes::Bytes;
    use http_body_util::{BodyExt, Full};
    use hyper::body::Incoming;
    use hyper::service::service_fn;
    use hyper::{Request, Response, StatusCode};
    use hyper_util::rt::TokioIo;
    use slotbook_core::{ActorId, ReservationKind, SlotKey};
    use tokio::net::TcpListener;

    #[derive(Debug, Clone)]
    struct Recorded {
        method: String,
        path: String,
        authorization: Option<String>,
        body: String,
    }

    type Route = fn(&str, &str) -> (StatusCode, &'static str);

    /// Serve `route` on an ephemeral port, recording every request
    async fn spawn_server(route: Route) -> (String, Arc<Mutex<Vec<Recorded>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let recorded = Arc::new(Mutex::new(Vec::new()));
        let log = recorded.clone();

        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                let log = log.clone();
                tokio::spawn(async move {
                    let service = service_fn(move |req: Request<Incoming>| {
                        let log = log.clone();
                        async move {
                            let method = req.method().to_string();
                            let path = req.uri().path().to_string();
                            let authorization = req
                                .headers()
                                .get(hyper::header::AUTHORIZATION)
                                .and_then(|v| v.to_str().ok())
                                .map(str::to_string);
                            let body = req.into_body().collect().await.unwrap().to_bytes();
                            let body = String::from_utf8_lossy(&body).to_string();

                            let (status, reply) = route(&method, &path);
                            log.lock().unwrap().push(Recorded {
                                method,
                                path,
                                authorization,
                                body,
                            });

                            let mut response = Response::new(Full::new(Bytes::from_static(reply.as_bytes())));
                            *response.status_mut() = status;
                            Ok::<_, Infallible>(response)
                        }
                    });
                    let _ = hyper::server::conn::http1::Builder::new()
                        .serve_connection(TokioIo::new(stream), service)
                        .await;
                });
            }
        });

        (format!("http://{}/api", addr), recorded)
    }

    const CATALOG: &str = r#"{"teams":[{"teamId":"t1","name":"Team One","slots":[
        {"slotId":"s1","startTime":"2026-05-01T09:00:00Z","endTime":"2026-05-01T09:15:00Z","isAvailable":true},
        {"slotId":"s2","startTime":"2026-05-01T09:15:00Z","endTime":"2026-05-01T09:30:00Z","isAvailable":false,"reservedBy":"me"}
    ]}]}"#;

    const HELD: &str = r#"{"teamId":"t1","slot":{"slotId":"s2","startTime":"2026-05-01T09:15:00Z",
        "endTime":"2026-05-01T09:30:00Z","isAvailable":false,"reservedBy":"me"}}"#;

    fn happy_route(method: &str, path: &str) -> (StatusCode, &'static str) {
        match (method, path) {
            ("GET", "/api/collection/c1") => (StatusCode::OK, CATALOG),
            ("GET", "/api/collection/c1/mySlot") => (StatusCode::OK, HELD),
            ("POST", _) => (StatusCode::OK, "{}"),
            _ => (StatusCode::NOT_FOUND, r#"{"error":"no such route"}"#),
        }
    }

    fn conflict_route(_method: &str, _path: &str) -> (StatusCode, &'static str) {
        (StatusCode::CONFLICT, r#"{"error":"slot already booked"}"#)
    }

    fn empty_route(_method: &str, path: &str) -> (StatusCode, &'static str) {
        if path.ends_with("/mySlot") {
            (StatusCode::OK, "null")
        } else {
            (StatusCode::OK, r#"{"teams":[]}"#)
        }
    }

    #[tokio::test]
    async fn test_fetch_collection_and_my_slot() {
        let (base, recorded) = spawn_server(happy_route).await;
        let client = RestClient::new(&base).unwrap().with_auth("Bearer secret");
        let collection = CollectionId::new("c1");

        let catalog = client.fetch_collection(&collection).await.unwrap();
        assert_eq!(catalog.slot_count(), 2);

        let held = client.my_slot(&collection).await.unwrap().unwrap();
        assert_eq!(held.key(), SlotKey::new("t1", "s2"));

        let log = recorded.lock().unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].method, "GET");
        assert_eq!(log[0].authorization.as_deref(), Some("Bearer secret"));
        assert_eq!(log[1].path, "/api/collection/c1/mySlot");
    }

    #[tokio::test]
    async fn test_my_slot_null() {
        let (base, _) = spawn_server(empty_route).await;
        let client = RestClient::new(&base).unwrap();
        let collection = CollectionId::new("c1");

        assert!(client.my_slot(&collection).await.unwrap().is_none());
        assert!(client.fetch_collection(&collection).await.unwrap().teams.is_empty());
    }

    #[tokio::test]
    async fn test_commit_posts_action() {
        let (base, recorded) = spawn_server(happy_route).await;
        let client = RestClient::new(&base).unwrap();
        let collection = CollectionId::new("c1");

        let book = CommitRequest {
            key: SlotKey::new("t1", "s1"),
            kind: ReservationKind::Book,
        };
        client.commit(&collection, &book).await.unwrap();

        let assign = CommitRequest {
            key: SlotKey::new("t1", "s1"),
            kind: ReservationKind::Assign {
                holder: ActorId::new("u9"),
            },
        };
        client.commit(&collection, &assign).await.unwrap();

        let log = recorded.lock().unwrap();
        assert_eq!(log[0].method, "POST");
        assert_eq!(log[0].path, "/api/collection/c1/teams/t1/slots/s1/book");
        assert!(log[0].body.is_empty());
        assert!(log[0].authorization.is_none());
        assert_eq!(log[1].path, "/api/collection/c1/teams/t1/slots/s1/assign");
        assert_eq!(log[1].body, r#"{"holder":"u9"}"#);
    }

    #[tokio::test]
    async fn test_conflict_maps_to_rejection() {
        let (base, _) = spawn_server(conflict_route).await;
        let client = RestClient::new(&base).unwrap();

        let request = CommitRequest {
            key: SlotKey::new("t1", "s1"),
            kind: ReservationKind::Book,
        };
        let err = client
            .commit(&CollectionId::new("c1"), &request)
            .await
            .unwrap_err();

        assert_eq!(
            err,
            BackendError::Rejected {
                status: 409,
                message: Some("slot already booked".to_string())
            }
        );
    }

    #[tokio::test]
    async fn test_unreachable_server_is_network_error() {
        // Bind and drop to obtain a port with nothing listening
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = RestClient::new(&format!("http://{}", addr)).unwrap();
        let err = client
            .fetch_collection(&CollectionId::new("c1"))
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Network(_)));
    }

    #[tokio::test]
    async fn test_silent_server_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((stream, _)) = listener.accept().await {
                held.push(stream);
            }
        });

        let client = RestClient::new(&format!("http://{}", addr))
            .unwrap()
            .with_request_timeout(Duration::from_millis(200));
        let err = client
            .fetch_collection(&CollectionId::new("c1"))
            .await
            .unwrap_err();
        assert_eq!(err, BackendError::Timeout(Duration::from_millis(200)));
    }

    #[tokio::test]
    async fn test_unsafe_identifier_is_invalid_request() {
        let client = RestClient::new("http://localhost:1").unwrap();
        let err = client
            .fetch_collection(&CollectionId::new("a/b"))
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::InvalidRequest(_)));
    }

    #[test]
    fn test_from_config() {
        let config = Config::from_toml(
            r#"
            base_url = "https://slots.example.edu/api"
            collection = "interviews"
            actor = "me"
            auth_token = "Bearer tok"
            request_timeout_secs = 3
            "#,
        )
        .unwrap();
        let client = RestClient::from_config(&config).unwrap();
        assert!(client.base().secure);
        assert_eq!(client.request_timeout(), Duration::from_secs(3));
        assert_eq!(client.authorization.as_deref(), Some("Bearer tok"));
        assert!(client.tls.is_some());
    }
}
