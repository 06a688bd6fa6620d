//! HTTP implementation of [`RoutingClient`].
//!
//! Each call opens a fresh HTTP/1.1 connection to the routing manager,
//! sends a JSON body and treats any 2xx response as success.

use std::time::Duration;

use bytes::Bytes;
use http::{Method, Uri};
use http_body_util::Full;
use serde::Serialize;
use tracing::{debug, error, info};

use crate::client::{RoutingClient, RoutingFuture};
use crate::error::RoutingError;
use crate::models::{DeleteInstanceRequest, E2tData};

const ADD_E2T_INSTANCE_PATH: &str = "e2t";
const ASSOCIATE_RAN_TO_E2T_PATH: &str = "associate-ran-to-e2t";
const DISSOCIATE_RAN_PATH: &str = "dissociate-ran";
const DELETE_E2T_INSTANCE_PATH: &str = "e2t";

pub struct HttpRoutingClient {
    /// Base URL, always ending in `/`.
    base_url: String,
    /// `host:port` to connect to.
    host_port: String,
    timeout: Duration,
}

impl HttpRoutingClient {
    /// Build a client for `base_url` (plain `http` only).
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, RoutingError> {
        let uri: Uri = base_url
            .parse()
            .map_err(|e: http::uri::InvalidUri| RoutingError::InvalidUrl(e.to_string()))?;
        if uri.scheme_str() != Some("http") {
            return Err(RoutingError::InvalidUrl(format!(
                "{base_url}: only http is supported"
            )));
        }
        let authority = uri
            .authority()
            .ok_or_else(|| RoutingError::InvalidUrl(format!("{base_url}: missing host")))?;
        let host_port = format!("{}:{}", authority.host(), authority.port_u16().unwrap_or(80));

        let mut base_url = base_url.to_string();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }

        Ok(Self {
            base_url,
            host_port,
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<(), RoutingError> {
        self.send(Method::POST, path, body).await
    }

    async fn delete<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<(), RoutingError> {
        self.send(Method::DELETE, path, body).await
    }

    async fn send<T: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &T,
    ) -> Result<(), RoutingError> {
        let body = serde_json::to_vec(body).map_err(|e| RoutingError::Serialize(e.to_string()))?;
        let url = format!("{}{}", self.base_url, path);
        info!(%method, %url, body = %String::from_utf8_lossy(&body), "sending request to routing manager");

        let result = tokio::time::timeout(self.timeout, self.exchange(&method, &url, body)).await;

        let status = match result {
            Ok(Ok(status)) => status,
            Ok(Err(e)) => {
                error!(%method, %url, error = %e, "routing manager request failed");
                return Err(e);
            }
            Err(_) => {
                error!(%method, %url, "routing manager request timed out");
                return Err(RoutingError::Timeout);
            }
        };

        if status.is_success() {
            info!(%method, %url, status = status.as_u16(), "routing manager request succeeded");
            Ok(())
        } else {
            error!(%method, %url, status = status.as_u16(), "routing manager returned failure");
            Err(RoutingError::Status(status.as_u16()))
        }
    }

    async fn exchange(
        &self,
        method: &Method,
        url: &str,
        body: Vec<u8>,
    ) -> Result<http::StatusCode, RoutingError> {
        let uri: Uri = url
            .parse()
            .map_err(|e: http::uri::InvalidUri| RoutingError::InvalidUrl(e.to_string()))?;
        let path = uri
            .path_and_query()
            .map(|p| p.as_str().to_string())
            .unwrap_or_else(|| "/".to_string());

        let stream = tokio::net::TcpStream::connect(&self.host_port)
            .await
            .map_err(|e| RoutingError::Connect(e.to_string()))?;

        let io = hyper_util::rt::TokioIo::new(stream);
        let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
            .await
            .map_err(|e| RoutingError::Connect(e.to_string()))?;

        // Drive the connection in the background.
        tokio::spawn(async move {
            if let Err(e) = conn.await {
                debug!(error = %e, "routing manager connection closed with error");
            }
        });

        let req = http::Request::builder()
            .method(method.clone())
            .uri(path)
            .header("host", self.host_port.as_str())
            .header("content-type", "application/json")
            .header("user-agent", "e2mgr/0.1")
            .body(Full::new(Bytes::from(body)))
            .map_err(|e| RoutingError::Request(e.to_string()))?;

        let resp = sender
            .send_request(req)
            .await
            .map_err(|e| RoutingError::Request(e.to_string()))?;
        Ok(resp.status())
    }
}

impl RoutingClient for HttpRoutingClient {
    fn add_instance<'a>(&'a self, address: &'a str) -> RoutingFuture<'a> {
        Box::pin(async move {
            self.post(ADD_E2T_INSTANCE_PATH, &E2tData::new(address, &[]))
                .await
        })
    }

    fn associate<'a>(&'a self, address: &'a str, ran_name: &'a str) -> RoutingFuture<'a> {
        Box::pin(async move {
            let body = [E2tData::new(address, &[ran_name])];
            self.post(ASSOCIATE_RAN_TO_E2T_PATH, &body).await
        })
    }

    fn dissociate<'a>(&'a self, address: &'a str, ran_name: &'a str) -> RoutingFuture<'a> {
        Box::pin(async move {
            let body = [E2tData::new(address, &[ran_name])];
            self.post(DISSOCIATE_RAN_PATH, &body).await
        })
    }

    fn delete_instance<'a>(
        &'a self,
        address: &'a str,
        ran_names: &'a [String],
    ) -> RoutingFuture<'a> {
        Box::pin(async move {
            let body = DeleteInstanceRequest {
                e2t_address: address.to_string(),
                rans_to_be_dissociated: ran_names.to_vec(),
                ran_assoc_list: Vec::new(),
            };
            self.delete(DELETE_E2T_INSTANCE_PATH, &body).await
        })
    }
}
