//! # TLS Transport Layer
//!
//! Client-side TLS for sessions against servers on their encrypted port.
//!
//! ## Responsibilities
//! - Build a rustls client configuration (system roots, extra CA file,
//!   certificate pinning, or unverified development mode)
//! - Present a client certificate when configured (certificate fingerprint
//!   authentication on IRC networks)
//! - Connect TCP and complete the TLS handshake within the connect timeout

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use rustls::client::{ServerCertVerified, ServerCertVerifier};
use rustls::{Certificate, ClientConfig, PrivateKey, RootCertStore, ServerName};
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;
use tracing::{debug, instrument, warn};

use crate::config::ClientConfig as SessionConfig;
use crate::error::{constants, ProtocolError, Result};
use crate::transport::Connector;
use crate::utils::timeout::with_timeout_error;

/// TLS client configuration
#[derive(Debug, Clone, Default)]
pub struct TlsClientConfig {
    /// Name to verify instead of the connect host
    server_name: Option<String>,
    /// Skip CA verification
    insecure: bool,
    /// SHA-256 fingerprint the server certificate must match
    pinned_cert_hash: Option<Vec<u8>>,
    /// PEM file with extra trusted roots
    ca_path: Option<String>,
    /// PEM client certificate chain and key
    client_cert_path: Option<String>,
    client_key_path: Option<String>,
}

impl TlsClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Verify the server against `name` rather than the host connected to
    pub fn with_server_name<S: Into<String>>(mut self, name: S) -> Self {
        self.server_name = Some(name.into());
        self
    }

    /// Trust the certificates in a PEM file in addition to the system roots
    pub fn with_ca_file<S: Into<String>>(mut self, path: S) -> Self {
        self.ca_path = Some(path.into());
        self
    }

    /// TLS settings named in a session configuration: server name (defaulting
    /// to the host), `insecure`, `ca_file` and the client certificate pair
    pub fn from_client_config(config: &SessionConfig) -> Self {
        let mut tls = Self::new().with_server_name(config.tls_server_name());
        if config.insecure {
            tls = tls.insecure();
        }
        if let Some(ca) = &config.ca_file {
            tls = tls.with_ca_file(ca.as_str());
        }
        if let (Some(cert), Some(key)) = (&config.client_cert, &config.client_key) {
            tls = tls.with_client_certificate(cert.as_str(), key.as_str());
        }
        tls
    }

    /// Present a client certificate during the handshake
    pub fn with_client_certificate<S: Into<String>>(mut self, cert_path: S, key_path: S) -> Self {
        self.client_cert_path = Some(cert_path.into());
        self.client_key_path = Some(key_path.into());
        self
    }

    /// Accept any server certificate.
    ///
    /// # WARNING: Security Risk
    /// Only for development servers with self-signed certificates. Combine
    /// with [`with_pinned_cert_hash`](Self::with_pinned_cert_hash) to still
    /// check a known certificate.
    pub fn insecure(mut self) -> Self {
        warn!("INSECURE MODE ENABLED: Certificate verification is disabled. This should only be used for development/testing.");
        self.insecure = true;
        self
    }

    /// Only accept a server certificate whose SHA-256 hash equals `hash`.
    ///
    /// Pinning replaces CA verification entirely.
    pub fn with_pinned_cert_hash(mut self, hash: Vec<u8>) -> Self {
        if hash.len() != 32 {
            warn!(
                "Certificate hash has unexpected length: {} (expected 32 bytes for SHA-256)",
                hash.len()
            );
        }
        self.pinned_cert_hash = Some(hash);
        self
    }

    /// Calculate SHA-256 hash for a certificate to use with pinning
    pub fn calculate_cert_hash(cert: &Certificate) -> Vec<u8> {
        use sha2::{Digest, Sha256};
        Sha256::digest(&cert.0).to_vec()
    }

    /// Name to verify instead of the connect host, if set
    pub fn server_name_override(&self) -> Option<&str> {
        self.server_name.as_deref()
    }

    fn root_store(&self) -> Result<RootCertStore> {
        let mut roots = RootCertStore::empty();

        let native: Vec<Vec<u8>> = rustls_native_certs::load_native_certs()
            .map_err(|e| ProtocolError::TlsError(format!("Failed to load native certs: {e}")))?
            .into_iter()
            .map(|cert| cert.0)
            .collect();
        let (added, ignored) = roots.add_parsable_certificates(&native);
        debug!(added, ignored, "Loaded system root certificates");

        if let Some(path) = &self.ca_path {
            for der in read_pem_certs(path)? {
                roots.add(&Certificate(der)).map_err(|e| {
                    ProtocolError::TlsError(format!("Failed to add CA cert from {path}: {e}"))
                })?;
            }
        }

        Ok(roots)
    }

    fn client_auth(&self) -> Result<Option<(Vec<Certificate>, PrivateKey)>> {
        let (Some(cert_path), Some(key_path)) = (&self.client_cert_path, &self.client_key_path)
        else {
            return Ok(None);
        };

        let chain: Vec<Certificate> = read_pem_certs(cert_path)?
            .into_iter()
            .map(Certificate)
            .collect();
        if chain.is_empty() {
            return Err(ProtocolError::TlsError(
                "No client certificates found".into(),
            ));
        }

        Ok(Some((chain, read_private_key(key_path)?)))
    }

    /// Build the rustls client configuration
    pub fn load_client_config(&self) -> Result<ClientConfig> {
        let client_auth = self.client_auth()?;
        let auth_error =
            |e: rustls::Error| ProtocolError::TlsError(format!("Failed to set client certificate: {e}"));

        let verifier: Option<Arc<dyn ServerCertVerifier>> = match &self.pinned_cert_hash {
            Some(hash) => Some(Arc::new(PinnedCertVerifier {
                fingerprint: hash.clone(),
            })),
            None if self.insecure => Some(Arc::new(AcceptAnyServerCert)),
            None => None,
        };

        match verifier {
            Some(verifier) => {
                let builder = ClientConfig::builder()
                    .with_safe_defaults()
                    .with_custom_certificate_verifier(verifier);
                match client_auth {
                    Some((chain, key)) => builder.with_client_auth_cert(chain, key).map_err(auth_error),
                    None => Ok(builder.with_no_client_auth()),
                }
            }
            None => {
                let builder = ClientConfig::builder()
                    .with_safe_defaults()
                    .with_root_certificates(self.root_store()?);
                match client_auth {
                    Some((chain, key)) => builder.with_client_auth_cert(chain, key).map_err(auth_error),
                    None => Ok(builder.with_no_client_auth()),
                }
            }
        }
    }
}

fn read_pem_certs(path: &str) -> Result<Vec<Vec<u8>>> {
    let pem = fs::read(path)
        .map_err(|e| ProtocolError::TlsError(format!("Failed to open cert file {path}: {e}")))?;
    rustls_pemfile::certs(&mut pem.as_slice())
        .map_err(|_| ProtocolError::TlsError(format!("Failed to parse certificate file {path}")))
}

/// Load the first PKCS8 or RSA private key from a PEM file
fn read_private_key(path: &str) -> Result<PrivateKey> {
    let pem = fs::read(path)
        .map_err(|e| ProtocolError::TlsError(format!("Failed to open key file {path}: {e}")))?;

    let pkcs8 = rustls_pemfile::pkcs8_private_keys(&mut pem.as_slice())
        .map_err(|_| ProtocolError::TlsError("Failed to parse PKCS8 private key".into()))?;
    if let Some(key) = pkcs8.into_iter().next() {
        return Ok(PrivateKey(key));
    }

    let rsa = rustls_pemfile::rsa_private_keys(&mut pem.as_slice())
        .map_err(|_| ProtocolError::TlsError("Failed to parse RSA private key".into()))?;
    rsa.into_iter().next().map(PrivateKey).ok_or_else(|| {
        ProtocolError::TlsError("No supported private key format found".into())
    })
}

struct PinnedCertVerifier {
    fingerprint: Vec<u8>,
}

impl ServerCertVerifier for PinnedCertVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &Certificate,
        _intermediates: &[Certificate],
        _server_name: &ServerName,
        _scts: &mut dyn Iterator<Item = &[u8]>,
        _ocsp_response: &[u8],
        _now: std::time::SystemTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        if TlsClientConfig::calculate_cert_hash(end_entity) == self.fingerprint {
            Ok(ServerCertVerified::assertion())
        } else {
            Err(rustls::Error::General(
                "Pinned certificate hash mismatch".into(),
            ))
        }
    }
}

struct AcceptAnyServerCert;

impl ServerCertVerifier for AcceptAnyServerCert {
    fn verify_server_cert(
        &self,
        _end_entity: &Certificate,
        _intermediates: &[Certificate],
        _server_name: &ServerName,
        _scts: &mut dyn Iterator<Item = &[u8]>,
        _ocsp_response: &[u8],
        _now: std::time::SystemTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }
}

/// TLS-over-TCP connector.
///
/// The rustls configuration is built once and shared by every connection.
#[derive(Clone)]
pub struct TlsConnector {
    config: Arc<ClientConfig>,
    server_name: Option<String>,
    connect_timeout: Duration,
}

impl TlsConnector {
    pub fn new(tls: &TlsClientConfig, connect_timeout: Duration) -> Result<Self> {
        Ok(Self {
            config: Arc::new(tls.load_client_config()?),
            server_name: tls.server_name_override().map(str::to_owned),
            connect_timeout,
        })
    }

    fn server_name_for(&self, host: &str) -> Result<ServerName> {
        let name = self.server_name.as_deref().unwrap_or(host);
        ServerName::try_from(name).map_err(|_| {
            ProtocolError::TlsError(format!("{}: {name}", constants::ERR_INVALID_SERVER_NAME))
        })
    }
}

impl Connector for TlsConnector {
    type Stream = TlsStream<TcpStream>;

    #[instrument(skip(self))]
    async fn connect(&self, host: &str, port: u16) -> Result<TlsStream<TcpStream>> {
        let domain = self.server_name_for(host)?;
        let connector = tokio_rustls::TlsConnector::from(Arc::clone(&self.config));

        let stream = with_timeout_error(
            async {
                let tcp = TcpStream::connect((host, port)).await?;
                tcp.set_nodelay(true)?;
                connector
                    .connect(domain, tcp)
                    .await
                    .map_err(|e| ProtocolError::TlsError(format!("TLS handshake failed: {e}")))
            },
            self.connect_timeout,
        )
        .await?;

        debug!("TLS connection established");
        Ok(stream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::timeout::DEFAULT_TIMEOUT;
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;

    #[test]
    fn test_insecure_config_builds_without_roots() {
        let config = TlsClientConfig::new().insecure();
        assert!(config.load_client_config().is_ok());
    }

    #[test]
    fn test_missing_ca_file_is_tls_error() {
        let config = TlsClientConfig::new().with_ca_file("/nonexistent/ca.pem");
        assert!(matches!(
            config.load_client_config(),
            Err(ProtocolError::TlsError(_))
        ));
    }

    #[test]
    fn test_missing_client_cert_is_tls_error() {
        let config = TlsClientConfig::new()
            .insecure()
            .with_client_certificate("/nonexistent/cert.pem", "/nonexistent/key.pem");
        assert!(matches!(
            config.load_client_config(),
            Err(ProtocolError::TlsError(_))
        ));
    }

    #[test]
    fn test_from_client_config_carries_tls_fields() {
        let session = SessionConfig {
            host: "irc.example.net".into(),
            tls: true,
            insecure: true,
            ca_file: Some("/etc/linewire/ca.pem".into()),
            client_cert: Some("nick.pem".into()),
            client_key: Some("nick.key".into()),
            ..SessionConfig::default()
        };
        let tls = TlsClientConfig::from_client_config(&session);

        assert_eq!(tls.server_name_override(), Some("irc.example.net"));
        assert!(tls.insecure);
        assert_eq!(tls.ca_path.as_deref(), Some("/etc/linewire/ca.pem"));
        assert_eq!(tls.client_cert_path.as_deref(), Some("nick.pem"));
        assert_eq!(tls.client_key_path.as_deref(), Some("nick.key"));
    }

    #[test]
    fn test_cert_hash_is_sha256() {
        let hash = TlsClientConfig::calculate_cert_hash(&Certificate(b"not a real cert".to_vec()));
        assert_eq!(hash.len(), 32);
    }

    #[test]
    fn test_server_name_override_wins() {
        let tls = TlsClientConfig::new()
            .insecure()
            .with_server_name("irc.example.net");
        let connector = TlsConnector::new(&tls, DEFAULT_TIMEOUT).unwrap();
        assert_eq!(
            connector.server_name_for("10.0.0.1").unwrap(),
            ServerName::try_from("irc.example.net").unwrap()
        );
    }

    #[tokio::test]
    async fn test_handshake_against_plaintext_peer_fails() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                let _ = socket.write_all(b":server NOTICE * :not tls\r\n").await;
            }
        });

        let tls = TlsClientConfig::new()
            .insecure()
            .with_server_name("localhost");
        let connector = TlsConnector::new(&tls, Duration::from_secs(2)).unwrap();
        let result = connector.connect("127.0.0.1", port).await;
        assert!(result.is_err());
    }
}
