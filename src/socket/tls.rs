use crate::base::neterror::NetError;
use boring::ssl::{ConnectConfiguration, SslConnector, SslMethod, SslVerifyMode, SslVersion};

/// TLS settings applied to every HTTPS connection.
#[derive(Debug, Clone)]
pub struct TlsConfig {
    pub min_version: Option<SslVersion>,
    pub max_version: Option<SslVersion>,
    pub alpn_protos: Vec<String>,
    pub verify_peer: bool,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            min_version: Some(SslVersion::TLS1_2),
            max_version: Some(SslVersion::TLS1_3),
            // The transport only speaks HTTP/1.1.
            alpn_protos: vec!["http/1.1".to_string()],
            verify_peer: true,
        }
    }
}

impl TlsConfig {
    /// Build a per-connection configuration for `host`.
    pub fn configure(&self, host: &str) -> Result<ConnectConfiguration, NetError> {
        let mut builder =
            SslConnector::builder(SslMethod::tls()).map_err(|_| NetError::SslProtocolError)?;

        builder
            .set_min_proto_version(self.min_version)
            .map_err(|_| NetError::SslProtocolError)?;
        builder
            .set_max_proto_version(self.max_version)
            .map_err(|_| NetError::SslProtocolError)?;

        builder
            .set_alpn_protos(&self.alpn_wire()?)
            .map_err(|_| NetError::SslProtocolError)?;

        builder.set_verify(if self.verify_peer {
            SslVerifyMode::PEER
        } else {
            SslVerifyMode::NONE
        });

        let mut config = builder
            .build()
            .configure()
            .map_err(|_| NetError::SslProtocolError)?;
        config.set_use_server_name_indication(Self::should_set_sni(host));
        Ok(config)
    }

    fn alpn_wire(&self) -> Result<Vec<u8>, NetError> {
        let mut wire = Vec::new();
        for proto in &self.alpn_protos {
            let len = u8::try_from(proto.len()).map_err(|_| NetError::SslProtocolError)?;
            wire.push(len);
            wire.extend_from_slice(proto.as_bytes());
        }
        Ok(wire)
    }

    /// Per RFC 6066, SNI MUST NOT be set for raw IP addresses.
    pub fn should_set_sni(host: &str) -> bool {
        host.parse::<std::net::IpAddr>().is_err()
    }
}
