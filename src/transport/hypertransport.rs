use crate::base::neterror::NetError;
use crate::http::requestbody::HyperBody;
use crate::http::{RequestBody, ResponseBody};
use crate::socket::connectjob::{ConnectJob, Endpoint};
use crate::socket::tls::TlsConfig;
use crate::transport::Transport;
use futures::future::BoxFuture;
use http::header::{HeaderValue, HOST};
use http::uri::{PathAndQuery, Uri};
use hyper::client::conn::http1;
use hyper_util::rt::TokioIo;
use tokio::spawn;

/// HTTP/1.1 transport over hyper.
///
/// Every request opens its own connection and drops it once the response
/// body is done. There is no pooling.
#[derive(Debug, Clone, Default)]
pub struct HyperTransport {
    tls: TlsConfig,
}

impl HyperTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tls(tls: TlsConfig) -> Self {
        Self { tls }
    }

    async fn send(
        &self,
        request: http::Request<RequestBody>,
    ) -> Result<http::Response<ResponseBody>, NetError> {
        let endpoint = Endpoint::from_uri(request.uri())?;
        let socket = ConnectJob::connect(&endpoint, &self.tls).await?;
        tracing::debug!(host = %endpoint.host, port = endpoint.port, tls = socket.is_tls(), "connected");

        let io = TokioIo::new(socket);
        let (mut sender, conn) = http1::handshake::<_, HyperBody>(io)
            .await
            .map_err(|e| NetError::Transport(Box::new(e)))?;

        // Spawn the connection driver
        spawn(async move {
            if let Err(e) = conn.await {
                tracing::debug!(error = %e, "connection driver failed");
            }
        });

        let request = into_origin_form(request, &endpoint)?;
        let response = sender
            .send_request(request)
            .await
            .map_err(|e| NetError::Transport(Box::new(e)))?;

        Ok(response.map(ResponseBody::new))
    }
}

impl Transport for HyperTransport {
    fn execute(
        &self,
        request: http::Request<RequestBody>,
    ) -> BoxFuture<'_, Result<http::Response<ResponseBody>, NetError>> {
        Box::pin(self.send(request))
    }
}

/// Rewrite an absolute-form request into the origin form sent on the wire,
/// adding a `Host` header when the caller set none.
fn into_origin_form(
    request: http::Request<RequestBody>,
    endpoint: &Endpoint,
) -> Result<http::Request<HyperBody>, NetError> {
    let (mut parts, body) = request.into_parts();

    if !parts.headers.contains_key(HOST) {
        let default_port = if endpoint.tls { 443 } else { 80 };
        let authority = parts
            .uri
            .authority()
            .map(|a| a.as_str())
            .unwrap_or(endpoint.host.as_str());
        // Userinfo never goes into Host.
        let authority = authority.rsplit('@').next().unwrap_or(authority);
        let host = if parts.uri.port_u16() == Some(default_port) {
            authority
                .strip_suffix(&format!(":{}", default_port))
                .unwrap_or(authority)
                .to_string()
        } else {
            authority.to_string()
        };
        let value = HeaderValue::from_str(&host)
            .map_err(|_| NetError::InvalidHeader(format!("host: {}", host)))?;
        parts.headers.insert(HOST, value);
    }

    let path = parts
        .uri
        .path_and_query()
        .cloned()
        .unwrap_or_else(|| PathAndQuery::from_static("/"));
    parts.uri = Uri::from(path);

    Ok(http::Request::from_parts(parts, body.into_hyper()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rewrite(uri: &str) -> http::Request<HyperBody> {
        let request = http::Request::builder()
            .uri(uri)
            .body(RequestBody::Empty)
            .unwrap();
        let endpoint = Endpoint::from_uri(request.uri()).unwrap();
        into_origin_form(request, &endpoint).unwrap()
    }

    #[test]
    fn test_origin_form() {
        let req = rewrite("http://example.com/a/b?x=1&y=2");
        assert_eq!(req.uri(), "/a/b?x=1&y=2");
        assert_eq!(req.headers()[HOST], "example.com");
    }

    #[test]
    fn test_root_path() {
        let req = rewrite("https://example.com");
        assert_eq!(req.uri(), "/");
        assert_eq!(req.headers()[HOST], "example.com");
    }

    #[test]
    fn test_host_keeps_custom_port() {
        let req = rewrite("http://127.0.0.1:8080/");
        assert_eq!(req.headers()[HOST], "127.0.0.1:8080");

        let req = rewrite("http://example.com:80/");
        assert_eq!(req.headers()[HOST], "example.com");
    }

    #[test]
    fn test_explicit_host_kept() {
        let request = http::Request::builder()
            .uri("http://127.0.0.1:8080/")
            .header(HOST, "virtual.test")
            .body(RequestBody::Empty)
            .unwrap();
        let endpoint = Endpoint::from_uri(request.uri()).unwrap();
        let req = into_origin_form(request, &endpoint).unwrap();
        assert_eq!(req.headers()[HOST], "virtual.test");
    }
}
