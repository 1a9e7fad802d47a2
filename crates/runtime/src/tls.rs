//! Narrow TLS trust override for the loopback RPC service.
//!
//! The LCU serves HTTPS with a self-signed certificate that rotates with the
//! client install, so standard chain validation can never succeed. The
//! override here is deliberately narrow: callers must prove the target host
//! is loopback before this config is handed out, and nothing else about the
//! handshake is weakened (signatures are still verified against the
//! presented certificate).

use std::net::IpAddr;
use std::sync::Arc;

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::CryptoProvider;
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, SignatureScheme};

use crate::error::{Error, Result};

/// Returns `true` for hosts this crate will relax certificate trust for.
pub fn is_loopback_host(host: &str) -> bool {
    if host.eq_ignore_ascii_case("localhost") {
        return true;
    }
    host.parse::<IpAddr>()
        .map(|ip| ip.is_loopback())
        .unwrap_or(false)
}

/// Builds a client config that tolerates the LCU's self-signed chain.
///
/// Refuses outright when `host` is not loopback; the caller never gets a
/// relaxed config pointed at the open network.
pub fn loopback_client_config(host: &str) -> Result<ClientConfig> {
    if !is_loopback_host(host) {
        return Err(Error::NonLoopbackEndpoint(host.to_string()));
    }

    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let config = ClientConfig::builder_with_provider(Arc::clone(&provider))
        .with_safe_default_protocol_versions()
        .map_err(|err| Error::StreamUnavailable(format!("TLS config rejected: {err}")))?
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(SelfSignedChainVerifier { provider }))
        .with_no_client_auth();
    Ok(config)
}

/// Accepts the server certificate without chain validation while keeping
/// handshake signature verification intact.
#[derive(Debug)]
struct SelfSignedChainVerifier {
    provider: Arc<CryptoProvider>,
}

impl ServerCertVerifier for SelfSignedChainVerifier {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls12_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls13_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loopback_hosts_are_recognized() {
        assert!(is_loopback_host("127.0.0.1"));
        assert!(is_loopback_host("::1"));
        assert!(is_loopback_host("localhost"));
        assert!(is_loopback_host("LOCALHOST"));
    }

    #[test]
    fn non_loopback_hosts_are_refused() {
        assert!(!is_loopback_host("192.168.1.10"));
        assert!(!is_loopback_host("example.com"));
        assert!(!is_loopback_host(""));
    }

    #[test]
    fn config_is_refused_for_non_loopback_target() {
        let err = loopback_client_config("203.0.113.7").unwrap_err();
        assert!(matches!(err, Error::NonLoopbackEndpoint(_)));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn config_builds_for_loopback_target() {
        assert!(loopback_client_config("127.0.0.1").is_ok());
    }
}
