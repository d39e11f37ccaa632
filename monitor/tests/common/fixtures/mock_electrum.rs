//! Mock Electrum server speaking JSON-RPC over WebSocket, plain or TLS
//!
//! The TLS variant serves a self-signed certificate for `localhost` from
//! `fixtures/tls/`.

use futures::{SinkExt, StreamExt};
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::ServerConfig;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_rustls::TlsAcceptor;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

use monitor::health::{Endpoint, Scheme};

/// How the mock answers requests
#[derive(Debug, Clone)]
pub enum ElectrumBehavior {
    /// Answers both calls normally
    Healthy { version: String, height: u64 },
    /// Completes the WebSocket handshake, then never replies
    Silent,
    /// Headers result lacks a height
    MissingHeight { version: String },
    /// Pushes an unsolicited notification before every response
    NotificationFirst { version: String, height: u64 },
    /// Answers every request with a JSON-RPC error
    RpcError { code: i64, message: String },
    /// Answers normally, but waits before every reply
    SlowReplies {
        version: String,
        height: u64,
        delay: Duration,
    },
}

const CERT_PEM: &[u8] = include_bytes!("tls/cert.pem");
const KEY_PEM: &[u8] = include_bytes!("tls/key.pem");

pub struct MockElectrumServer {
    pub address: SocketAddr,
    scheme: Scheme,
    handle: JoinHandle<()>,
}

impl MockElectrumServer {
    /// Plain `ws://` server
    pub async fn start(behavior: ElectrumBehavior) -> Self {
        Self::spawn(behavior, None).await
    }

    /// `wss://` server with a self-signed certificate
    pub async fn start_tls(behavior: ElectrumBehavior) -> Self {
        Self::spawn(behavior, Some(tls_acceptor())).await
    }

    async fn spawn(behavior: ElectrumBehavior, tls: Option<TlsAcceptor>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock electrum listener");
        let address = listener.local_addr().expect("listener address");
        let scheme = if tls.is_some() { Scheme::Wss } else { Scheme::Ws };

        let handle = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let behavior = behavior.clone();
                let tls = tls.clone();
                tokio::spawn(async move {
                    match tls {
                        Some(acceptor) => {
                            // Clients rejecting the certificate fail here
                            if let Ok(stream) = acceptor.accept(stream).await {
                                serve(stream, behavior).await;
                            }
                        }
                        None => serve(stream, behavior).await,
                    }
                });
            }
        });

        Self {
            address,
            scheme,
            handle,
        }
    }

    /// Endpoint pointing at this server. TLS servers are addressed as
    /// `localhost` so the name matches the certificate.
    pub fn endpoint(&self) -> Endpoint {
        let host = match self.scheme {
            Scheme::Wss => "localhost",
            Scheme::Ws => "127.0.0.1",
        };
        Endpoint::new(self.scheme, host, self.address.port())
    }
}

async fn serve<S>(stream: S, behavior: ElectrumBehavior)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let Ok(mut ws) = accept_async(stream).await else {
        return;
    };
    while let Some(Ok(frame)) = ws.next().await {
        let Message::Text(text) = frame else {
            continue;
        };
        let request: Value = match serde_json::from_str(&text) {
            Ok(v) => v,
            Err(_) => continue,
        };
        if let ElectrumBehavior::SlowReplies { delay, .. } = &behavior {
            tokio::time::sleep(*delay).await;
        }
        for reply in replies(&behavior, &request) {
            if ws.send(Message::Text(reply.to_string())).await.is_err() {
                return;
            }
        }
    }
}

fn tls_acceptor() -> TlsAcceptor {
    let certs: Vec<CertificateDer<'static>> = rustls_pemfile::certs(&mut &CERT_PEM[..])
        .collect::<Result<_, _>>()
        .expect("parse test certificate");
    let key: PrivateKeyDer<'static> = rustls_pemfile::private_key(&mut &KEY_PEM[..])
        .expect("read test key")
        .expect("test key present");

    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let config = ServerConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .expect("protocol versions")
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .expect("server certificate");

    TlsAcceptor::from(Arc::new(config))
}

impl Drop for MockElectrumServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn replies(behavior: &ElectrumBehavior, request: &Value) -> Vec<Value> {
    let id = request["id"].clone();
    let method = request["method"].as_str().unwrap_or_default();

    let result = |version: &str, height: Option<u64>| match method {
        "server.version" => json!([version, "1.4"]),
        _ => match height {
            Some(h) => json!({ "height": h, "hex": "00" }),
            None => json!({ "hex": "00" }),
        },
    };

    match behavior {
        ElectrumBehavior::Healthy { version, height }
        | ElectrumBehavior::SlowReplies {
            version, height, ..
        } => {
            vec![json!({ "jsonrpc": "2.0", "id": id, "result": result(version.as_str(), Some(*height)) })]
        }
        ElectrumBehavior::Silent => vec![],
        ElectrumBehavior::MissingHeight { version } => {
            vec![json!({ "jsonrpc": "2.0", "id": id, "result": result(version.as_str(), None) })]
        }
        ElectrumBehavior::NotificationFirst { version, height } => vec![
            json!({
                "jsonrpc": "2.0",
                "method": "blockchain.headers.subscribe",
                "params": [{ "height": height + 1, "hex": "00" }]
            }),
            json!({ "jsonrpc": "2.0", "id": id, "result": result(version.as_str(), Some(*height)) }),
        ],
        ElectrumBehavior::RpcError { code, message } => vec![json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": { "code": code, "message": message }
        })],
    }
}
