use std::path::Path;
use std::sync::Arc;

use reqwest::blocking::ClientBuilder;
use reqwest::Certificate;
use rustls::client::danger::{
    HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier,
};
use rustls::client::WebPkiServerVerifier;
use rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};
use rustls_pki_types::{CertificateDer, ServerName, UnixTime};
use sha2::{Digest, Sha256};
use submerge_base::{kind_err, Error, ErrorKind, Result};

/// How the client verifies the server's TLS certificate. Verification is on
/// by default; every relaxation must be requested explicitly.
#[derive(Clone, Debug, Default)]
pub enum TlsMode {
    /// Verify against the platform's trust store (the default).
    #[default]
    SystemDefault,
    /// Verify against the platform trust store, *and* additionally require the
    /// leaf certificate's SPKI SHA-256 hash to be one of `pins`.
    Pinned { pins: Vec<[u8; 32]> },
    /// Verify against a caller-supplied root CA bundle instead of the
    /// platform trust store.
    CustomRootCa { pem_path: std::path::PathBuf },
    /// Disable verification entirely. Must be requested explicitly
    /// (`INSECURE_TLS=1`); never the default.
    Insecure,
}

impl TlsMode {
    pub(crate) fn apply(&self, builder: ClientBuilder) -> Result<ClientBuilder> {
        match self {
            TlsMode::SystemDefault => Ok(builder),
            TlsMode::Pinned { pins } => {
                let config = pinned_client_config(pins.clone())?;
                Ok(builder.use_preconfigured_tls(config))
            }
            TlsMode::CustomRootCa { pem_path } => {
                let pem = read_pem(pem_path)?;
                let cert = Certificate::from_pem(&pem)
                    .map_err(|e| Error::new(ErrorKind::Transport, e))?;
                Ok(builder.add_root_certificate(cert))
            }
            TlsMode::Insecure => Ok(builder.danger_accept_invalid_certs(true)),
        }
    }
}

fn read_pem(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| {
        kind_err(
            ErrorKind::Transport,
            format!("reading root CA bundle {}: {e}", path.display()),
        )
    })
}

fn default_roots() -> RootCertStore {
    let mut roots = RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    roots
}

fn pinned_client_config(pins: Vec<[u8; 32]>) -> Result<ClientConfig> {
    let roots = default_roots();
    let inner = WebPkiServerVerifier::builder(Arc::new(roots))
        .build()
        .map_err(|e| kind_err(ErrorKind::Transport, format!("building TLS verifier: {e}")))?;
    let verifier = PinnedCertVerifier { inner, pins };
    let mut config = ClientConfig::builder()
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(verifier))
        .with_no_client_auth();
    config.alpn_protocols = vec![b"http/1.1".to_vec()];
    Ok(config)
}

/// Wraps the normal webpki chain-of-trust verifier and additionally requires
/// the leaf certificate's SubjectPublicKeyInfo to hash to one of `pins`.
/// Mirrors the "chain is valid, AND the pin matches" check agents like this
/// one run against a caller-supplied pin set.
#[derive(Debug)]
struct PinnedCertVerifier {
    inner: Arc<WebPkiServerVerifier>,
    pins: Vec<[u8; 32]>,
}

impl ServerCertVerifier for PinnedCertVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        ocsp_response: &[u8],
        now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        self.inner
            .verify_server_cert(end_entity, intermediates, server_name, ocsp_response, now)?;

        let spki = spki_bytes(end_entity.as_ref())
            .map_err(|_| rustls::Error::General("pinned: could not parse certificate".into()))?;
        let digest: [u8; 32] = Sha256::digest(&spki).into();
        if self.pins.iter().any(|pin| *pin == digest) {
            Ok(ServerCertVerified::assertion())
        } else {
            Err(rustls::Error::General(
                "pinned: no configured public-key hash matched the server certificate".into(),
            ))
        }
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        self.inner.verify_tls12_signature(message, cert, dss)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        self.inner.verify_tls13_signature(message, cert, dss)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.inner.supported_verify_schemes()
    }
}

fn spki_bytes(der: &[u8]) -> std::result::Result<Vec<u8>, x509_parser::error::X509Error> {
    let (_, cert) = x509_parser::parse_x509_certificate(der)
        .map_err(|_| x509_parser::error::X509Error::InvalidCertificate)?;
    Ok(cert.tbs_certificate.subject_pki.raw.to_vec())
}

#[cfg(test)]
mod test {
    use super::*;
    use test_log::test;

    #[test]
    fn default_is_system_default() {
        assert!(matches!(TlsMode::default(), TlsMode::SystemDefault));
    }
}
