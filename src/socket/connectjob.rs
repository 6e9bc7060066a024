use crate::base::neterror::NetError;
use crate::socket::stream::SocketStream;
use crate::socket::tls::TlsConfig;
use tokio::net::TcpStream;

/// Where to connect: host, port, and whether to wrap the socket in TLS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
    pub tls: bool,
}

impl Endpoint {
    /// Derive the endpoint from an absolute `http`/`https` URI.
    pub fn from_uri(uri: &http::Uri) -> Result<Self, NetError> {
        let tls = match uri.scheme_str() {
            Some("https") => true,
            Some("http") => false,
            other => {
                return Err(NetError::InvalidUrl(format!(
                    "unsupported scheme {:?} in {}",
                    other.unwrap_or(""),
                    uri
                )))
            }
        };
        let host = uri
            .host()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| NetError::InvalidUrl(format!("missing host in {}", uri)))?;
        // IPv6 literals come bracketed out of the URI.
        let host = host.trim_start_matches('[').trim_end_matches(']').to_string();
        let port = uri.port_u16().unwrap_or(if tls { 443 } else { 80 });
        Ok(Self { host, port, tls })
    }
}

/// Runs the connection sequence: DNS, then TCP, then TLS for HTTPS.
pub struct ConnectJob;

impl ConnectJob {
    pub async fn connect(endpoint: &Endpoint, tls: &TlsConfig) -> Result<SocketStream, NetError> {
        let Endpoint { host, port, .. } = endpoint;

        // 1. DNS Resolution
        let addrs: Vec<_> = tokio::net::lookup_host((host.as_str(), *port))
            .await
            .map_err(|e| {
                tracing::debug!(host = %host, error = %e, "DNS resolution failed");
                NetError::NameNotResolved(host.clone())
            })?
            .collect();
        tracing::debug!(host = %host, count = addrs.len(), "DNS resolution complete");

        // 2. TCP Connect, first address that answers wins
        let mut stream = None;
        for addr in addrs {
            match TcpStream::connect(addr).await {
                Ok(s) => {
                    tracing::debug!(%addr, "TCP connected");
                    stream = Some(s);
                    break;
                }
                Err(e) => tracing::debug!(%addr, error = %e, "TCP connect failed"),
            }
        }
        let stream = stream.ok_or_else(|| NetError::ConnectionFailed(format!("{}:{}", host, port)))?;

        if !endpoint.tls {
            return Ok(SocketStream::Tcp(stream));
        }

        // 3. SSL Handshake
        let config = tls.configure(host)?;
        let tls_stream = tokio_boring::connect(config, host, stream)
            .await
            .map_err(|e| {
                tracing::debug!(host = %host, error = ?e, "SSL handshake failed");
                NetError::SslProtocolError
            })?;
        Ok(SocketStream::Ssl(tls_stream))
    }
}
