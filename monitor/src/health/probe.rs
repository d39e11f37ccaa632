//! Electrum server probing over WebSocket JSON-RPC
//!
//! A probe connects to one resolved address of an endpoint, asks for the
//! server version, then subscribes to block headers to read the chain tip.
//! All steps share one deadline: the probe timeout bounds the whole
//! exchange, not each step. No failure escapes [`Prober::probe`]; errors are
//! folded into an unreachable [`ProbeResult`].

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{verify_tls12_signature, verify_tls13_signature, CryptoProvider};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};
use serde_json::Value;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::time::Instant as Deadline;
use tokio::time::{timeout, timeout_at};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{client_async_tls_with_config, Connector, WebSocketStream};
use tracing::{debug, instrument, warn};

use super::types::{Endpoint, ProbeResult, RpcRequest, RpcResponse};
use crate::config::ProbeConfig;
use crate::constants::{limits, protocol};
use crate::errors::ProbeError;

/// Probes one address of an endpoint.
///
/// Implementations must return within a bounded time and must not panic on
/// remote misbehaviour.
#[async_trait]
pub trait Prober: Send + Sync {
    /// `probe_timeout` bounds the whole exchange with one address.
    async fn probe(&self, endpoint: &Endpoint, address: IpAddr, probe_timeout: Duration)
        -> ProbeResult;
}

pub struct ElectrumProber {
    tls: Arc<ClientConfig>,
}

impl ElectrumProber {
    pub fn new(config: &ProbeConfig) -> Result<Self, rustls::Error> {
        if config.accept_invalid_certs {
            warn!("TLS certificate validation is DISABLED for probes (probe.accept_invalid_certs = true)");
        }
        Ok(Self {
            tls: build_tls_config(config.accept_invalid_certs)?,
        })
    }

    async fn exchange(
        &self,
        endpoint: &Endpoint,
        address: IpAddr,
        probe_timeout: Duration,
    ) -> Result<(String, u64), ProbeError> {
        let deadline = Deadline::now() + probe_timeout;
        let target = SocketAddr::new(address, endpoint.port);
        let label = target.to_string();

        let tcp = timeout_at(deadline, TcpStream::connect(target))
            .await
            .map_err(|_| ProbeError::Timeout {
                address: label.clone(),
                step: "connecting".to_string(),
            })?
            .map_err(|e| ProbeError::ConnectionFailed {
                address: label.clone(),
                reason: e.to_string(),
            })?;

        // The URI keeps the hostname so TLS SNI and the Host header match the
        // certificate, while the socket is already pinned to this address.
        let (mut ws, _response) = timeout_at(
            deadline,
            client_async_tls_with_config(
                endpoint.uri.as_str(),
                tcp,
                None,
                Some(Connector::Rustls(self.tls.clone())),
            ),
        )
        .await
        .map_err(|_| ProbeError::Timeout {
            address: label.clone(),
            step: "performing handshake".to_string(),
        })?
        .map_err(|e| ProbeError::ConnectionFailed {
            address: label.clone(),
            reason: e.to_string(),
        })?;

        let version_result = call(
            &mut ws,
            protocol::METHOD_SERVER_VERSION,
            protocol::VERSION_REQUEST_ID,
            deadline,
            &label,
        )
        .await?;
        let version = parse_version(&version_result).ok_or_else(|| ProbeError::Protocol {
            address: label.clone(),
            reason: format!("server.version result has no version string: {}", version_result),
        })?;

        let headers_result = call(
            &mut ws,
            protocol::METHOD_HEADERS_SUBSCRIBE,
            protocol::HEADERS_REQUEST_ID,
            deadline,
            &label,
        )
        .await?;
        let height = parse_height(&headers_result).ok_or_else(|| ProbeError::Protocol {
            address: label.clone(),
            reason: format!("headers result has no height: {}", headers_result),
        })?;

        // Both answers are in; the close handshake does not count against the
        // deadline and cannot change the verdict.
        let _ = timeout(limits::SOCKET_CLOSE_TIMEOUT, ws.close(None)).await;

        Ok((version, height))
    }
}

#[async_trait]
impl Prober for ElectrumProber {
    #[instrument(skip_all, fields(endpoint = %endpoint.uri, address = %address))]
    async fn probe(
        &self,
        endpoint: &Endpoint,
        address: IpAddr,
        probe_timeout: Duration,
    ) -> ProbeResult {
        let started = Instant::now();
        match self.exchange(endpoint, address, probe_timeout).await {
            Ok((version, height)) => {
                let latency_ms = started.elapsed().as_millis() as u64;
                debug!("Probe ok: version {} height {} ({}ms)", version, height, latency_ms);
                ProbeResult::reachable(address, version, height, latency_ms)
            }
            Err(e) => {
                debug!("Probe failed: {}", e);
                ProbeResult::unreachable(address, e.to_string())
            }
        }
    }
}

/// Send one request and wait for the response carrying the same id, both
/// before `deadline`.
async fn call<S>(
    ws: &mut WebSocketStream<S>,
    method: &str,
    id: u64,
    deadline: Deadline,
    label: &str,
) -> Result<Value, ProbeError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let payload = serde_json::to_string(&RpcRequest::new(method, id)).map_err(|e| {
        ProbeError::Transport {
            address: label.to_string(),
            reason: format!("failed to encode {} request: {}", method, e),
        }
    })?;

    timeout_at(deadline, ws.send(Message::Text(payload)))
        .await
        .map_err(|_| ProbeError::Timeout {
            address: label.to_string(),
            step: format!("sending {}", method),
        })?
        .map_err(|e| ProbeError::Transport {
            address: label.to_string(),
            reason: e.to_string(),
        })?;

    timeout_at(deadline, await_response(ws, id, label))
        .await
        .map_err(|_| ProbeError::Timeout {
            address: label.to_string(),
            step: format!("awaiting {}", method),
        })?
}

async fn await_response<S>(
    ws: &mut WebSocketStream<S>,
    id: u64,
    label: &str,
) -> Result<Value, ProbeError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut skipped = 0usize;

    while let Some(frame) = ws.next().await {
        let frame = frame.map_err(|e| ProbeError::Transport {
            address: label.to_string(),
            reason: e.to_string(),
        })?;

        let text = match frame {
            Message::Text(text) => text,
            Message::Binary(bytes) => {
                String::from_utf8(bytes).map_err(|e| ProbeError::Protocol {
                    address: label.to_string(),
                    reason: format!("binary frame is not UTF-8: {}", e),
                })?
            }
            Message::Close(_) => {
                return Err(ProbeError::Transport {
                    address: label.to_string(),
                    reason: "connection closed by server".to_string(),
                })
            }
            _ => continue,
        };

        let response: RpcResponse =
            serde_json::from_str(&text).map_err(|e| ProbeError::Protocol {
                address: label.to_string(),
                reason: format!("response is not valid JSON-RPC: {}", e),
            })?;

        if !id_matches(&response.id, id) {
            skipped += 1;
            if skipped > limits::MAX_SKIPPED_FRAMES {
                return Err(ProbeError::Protocol {
                    address: label.to_string(),
                    reason: format!("no response with id {} after {} frames", id, skipped),
                });
            }
            continue;
        }

        if let Some(error) = response.error {
            return Err(ProbeError::Protocol {
                address: label.to_string(),
                reason: format!("RPC error {}: {}", error.code, error.message),
            });
        }

        return response.result.ok_or_else(|| ProbeError::Protocol {
            address: label.to_string(),
            reason: "response has no result".to_string(),
        });
    }

    Err(ProbeError::Transport {
        address: label.to_string(),
        reason: "connection closed before response".to_string(),
    })
}

fn id_matches(value: &Value, id: u64) -> bool {
    match value {
        Value::Number(n) => n.as_u64() == Some(id),
        Value::String(s) => s.parse::<u64>().ok() == Some(id),
        _ => false,
    }
}

/// `server.version` answers `[software_version, protocol_version]`.
pub fn parse_version(result: &Value) -> Option<String> {
    result
        .as_array()
        .and_then(|items| items.first())
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// `blockchain.headers.subscribe` answers `{"height": N, "hex": ...}`.
pub fn parse_height(result: &Value) -> Option<u64> {
    result.get("height").and_then(Value::as_u64)
}

fn build_tls_config(accept_invalid_certs: bool) -> Result<Arc<ClientConfig>, rustls::Error> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let builder =
        ClientConfig::builder_with_provider(provider.clone()).with_safe_default_protocol_versions()?;

    let config = if accept_invalid_certs {
        builder
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(AcceptAnyServerCert { provider }))
            .with_no_client_auth()
    } else {
        let mut roots = RootCertStore::empty();
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        builder.with_root_certificates(roots).with_no_client_auth()
    };

    Ok(Arc::new(config))
}

/// Accepts any server certificate; handshake signatures are still checked.
#[derive(Debug)]
struct AcceptAnyServerCert {
    provider: Arc<CryptoProvider>,
}

impl ServerCertVerifier for AcceptAnyServerCert {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(
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
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(
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
