//! TLS client setup shared by all TLS transports
//!
//! The crypto provider and the two client configurations (verifying and
//! accept-anything) are built once per process on first use.

use crate::error::UsenetError;
use std::io;
use std::sync::{Arc, Once, OnceLock};
use tokio_rustls::TlsConnector;
use tokio_rustls::rustls::client::danger::{
    HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier,
};
use tokio_rustls::rustls::crypto::{CryptoProvider, ring};
use tokio_rustls::rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use tokio_rustls::rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};
use tracing::{debug, warn};

static PROVIDER: Once = Once::new();
static VERIFYING: OnceLock<Arc<ClientConfig>> = OnceLock::new();
static INSECURE: OnceLock<Arc<ClientConfig>> = OnceLock::new();

/// Dangerous certificate verifier that accepts all certificates
///
/// **Security Warning:** This verifier disables all certificate validation,
/// making connections vulnerable to man-in-the-middle attacks. Only use this
/// for testing or with servers you trust on a secure network.
#[derive(Debug)]
pub(super) struct DangerousAcceptAnyCertificate;

impl ServerCertVerifier for DangerousAcceptAnyCertificate {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, tokio_rustls::rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, tokio_rustls::rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, tokio_rustls::rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        vec![
            SignatureScheme::RSA_PKCS1_SHA256,
            SignatureScheme::RSA_PKCS1_SHA384,
            SignatureScheme::RSA_PKCS1_SHA512,
            SignatureScheme::ECDSA_NISTP256_SHA256,
            SignatureScheme::ECDSA_NISTP384_SHA384,
            SignatureScheme::ECDSA_NISTP521_SHA512,
            SignatureScheme::RSA_PSS_SHA256,
            SignatureScheme::RSA_PSS_SHA384,
            SignatureScheme::RSA_PSS_SHA512,
            SignatureScheme::ED25519,
            SignatureScheme::ED448,
        ]
    }
}

/// Install the process-wide crypto provider (ring)
///
/// Another library may have installed one already; that one is kept.
pub(crate) fn init() {
    PROVIDER.call_once(|| {
        if CryptoProvider::install_default(ring::default_provider()).is_err() {
            debug!("TLS crypto provider already installed");
        }
    });
}

/// Connector for a server, validating certificates unless `insecure`
pub(crate) fn connector(insecure: bool) -> TlsConnector {
    init();

    let config = if insecure {
        warn!("TLS certificate validation disabled - connection vulnerable to MITM attacks");
        INSECURE.get_or_init(|| {
            Arc::new(
                ClientConfig::builder()
                    .dangerous()
                    .with_custom_certificate_verifier(Arc::new(DangerousAcceptAnyCertificate))
                    .with_no_client_auth(),
            )
        })
    } else {
        VERIFYING.get_or_init(|| {
            let mut root_store = RootCertStore::empty();
            root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
            Arc::new(
                ClientConfig::builder()
                    .with_root_certificates(root_store)
                    .with_no_client_auth(),
            )
        })
    };

    TlsConnector::from(Arc::clone(config))
}

/// Server name to verify the certificate against
pub(crate) fn server_name(host: &str) -> Result<ServerName<'static>, UsenetError> {
    ServerName::try_from(host.to_string())
        .map_err(|e| UsenetError::Tls(format!("Invalid domain: {}", e)))
}

/// Map an I/O error from a TLS stream
///
/// Errors raised by rustls carry its reason; anything else gets a fixed
/// description of the failure kind.
pub(crate) fn map_error(e: io::Error) -> UsenetError {
    if let Some(reason) = e
        .get_ref()
        .and_then(|inner| inner.downcast_ref::<tokio_rustls::rustls::Error>())
    {
        return UsenetError::Tls(reason.to_string());
    }

    let message = match e.kind() {
        io::ErrorKind::UnexpectedEof
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionAborted
        | io::ErrorKind::BrokenPipe => "the TLS/SSL connection has been closed",
        io::ErrorKind::InvalidData => "a failure in the TLS/SSL library occurred",
        io::ErrorKind::TimedOut => return UsenetError::Timeout,
        _ => "some I/O error occurred",
    };
    UsenetError::Tls(format!("{} ({})", message, e))
}
