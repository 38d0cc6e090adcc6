//! TLS setup
//!
//! Loads a PEM certificate chain and private key and builds the acceptor the
//! listener wraps every connection in. TLS 1.2 and 1.3 are offered; client
//! certificates are not requested.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rustls::ServerConfig;
use rustls::pki_types::pem::{self, PemObject};
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use tokio_rustls::TlsAcceptor;

/// TLS setup errors
#[derive(Debug, thiserror::Error)]
pub enum TlsError {
    /// Certificate file missing or unreadable
    #[error("failed to load certificate {path}: {source}")]
    Certificate {
        path: PathBuf,
        #[source]
        source: pem::Error,
    },

    /// Certificate file holds no certificate
    #[error("no certificates found in {path}")]
    NoCertificates { path: PathBuf },

    /// Key file missing, unreadable, or without a key
    #[error("failed to load private key {path}: {source}")]
    PrivateKey {
        path: PathBuf,
        #[source]
        source: pem::Error,
    },

    /// Certificate and key rejected by rustls
    #[error("invalid TLS configuration: {0}")]
    Config(#[from] rustls::Error),
}

/// Read every certificate in a PEM file, leaf first
pub fn load_certificates(path: &Path) -> Result<Vec<CertificateDer<'static>>, TlsError> {
    let to_error = |source| TlsError::Certificate {
        path: path.to_path_buf(),
        source,
    };

    let certs = CertificateDer::pem_file_iter(path)
        .map_err(to_error)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(to_error)?;

    if certs.is_empty() {
        return Err(TlsError::NoCertificates {
            path: path.to_path_buf(),
        });
    }
    Ok(certs)
}

/// Read the first private key (PKCS#8, PKCS#1 or SEC1) in a PEM file
pub fn load_private_key(path: &Path) -> Result<PrivateKeyDer<'static>, TlsError> {
    PrivateKeyDer::from_pem_file(path).map_err(|source| TlsError::PrivateKey {
        path: path.to_path_buf(),
        source,
    })
}

/// Build the rustls server config for a certificate chain and key
pub fn server_config(
    certs: Vec<CertificateDer<'static>>,
    key: PrivateKeyDer<'static>,
) -> Result<ServerConfig, TlsError> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let config = ServerConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()?
        .with_no_client_auth()
        .with_single_cert(certs, key)?;
    Ok(config)
}

/// Load certificate and key files into a ready acceptor
pub fn load_acceptor(cert: &Path, key: &Path) -> Result<TlsAcceptor, TlsError> {
    let certs = load_certificates(cert)?;
    let chain_length = certs.len();
    let key = load_private_key(key)?;
    let config = server_config(certs, key)?;

    tracing::debug!(
        certificate = %cert.display(),
        chain_length,
        "TLS configuration loaded"
    );

    Ok(TlsAcceptor::from(Arc::new(config)))
}
