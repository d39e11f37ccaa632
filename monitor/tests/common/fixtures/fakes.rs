//! In-process fakes for the monitor's collaborator traits

use async_trait::async_trait;
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use monitor::errors::{SinkError, SourceError};
use monitor::health::{AddressResolver, Endpoint, ProbeResult, Prober, Resolution};
use monitor::services::{MessageContent, MessageRef, NotificationSink};
use monitor::source::EndpointSource;

/// Resolver answering from a fixed hostname table
#[derive(Default)]
pub struct FakeResolver {
    table: HashMap<String, Resolution>,
}

impl FakeResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, hostname: &str, addresses: &[IpAddr]) -> Self {
        self.table.insert(
            hostname.to_string(),
            Resolution::resolved(addresses.iter().copied()),
        );
        self
    }

    pub fn failing(mut self, hostname: &str, reason: &str) -> Self {
        self.table
            .insert(hostname.to_string(), Resolution::failed(hostname, reason));
        self
    }
}

#[async_trait]
impl AddressResolver for FakeResolver {
    async fn resolve(&self, hostname: &str) -> Resolution {
        self.table
            .get(hostname)
            .cloned()
            .unwrap_or_else(|| Resolution::failed(hostname, "NXDOMAIN"))
    }
}

/// Resolver that panics for one hostname and delegates otherwise
pub struct PanickingResolver {
    pub hostname: String,
    pub inner: FakeResolver,
}

#[async_trait]
impl AddressResolver for PanickingResolver {
    async fn resolve(&self, hostname: &str) -> Resolution {
        if hostname == self.hostname {
            panic!("resolver blew up on {}", hostname);
        }
        self.inner.resolve(hostname).await
    }
}

#[derive(Clone)]
enum Script {
    Reachable { version: String, height: u64 },
    Unreachable(String),
}

/// Prober with per-address scripted outcomes and delays.
///
/// Tracks the number of probes in flight so tests can check fan-out bounds.
/// Unscripted addresses answer unreachable.
#[derive(Default)]
pub struct ScriptedProber {
    scripts: HashMap<IpAddr, (Duration, Script)>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    calls: AtomicUsize,
}

impl ScriptedProber {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reachable(mut self, address: IpAddr, version: &str, height: u64) -> Self {
        self.scripts.insert(
            address,
            (
                Duration::ZERO,
                Script::Reachable {
                    version: version.to_string(),
                    height,
                },
            ),
        );
        self
    }

    pub fn unreachable(mut self, address: IpAddr, reason: &str) -> Self {
        self.scripts.insert(
            address,
            (Duration::ZERO, Script::Unreachable(reason.to_string())),
        );
        self
    }

    /// Delay the answer for an already scripted address
    pub fn delayed(mut self, address: IpAddr, delay: Duration) -> Self {
        if let Some(entry) = self.scripts.get_mut(&address) {
            entry.0 = delay;
        }
        self
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Prober for ScriptedProber {
    async fn probe(
        &self,
        _endpoint: &Endpoint,
        address: IpAddr,
        _probe_timeout: Duration,
    ) -> ProbeResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let (delay, script) = self
            .scripts
            .get(&address)
            .cloned()
            .unwrap_or((Duration::ZERO, Script::Unreachable("unscripted".to_string())));
        // Always yield so concurrent probes overlap even with zero delay
        tokio::time::sleep(delay.max(Duration::from_millis(5))).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        match script {
            Script::Reachable { version, height } => {
                ProbeResult::reachable(address, version, height, delay.as_millis() as u64)
            }
            Script::Unreachable(reason) => ProbeResult::unreachable(address, reason),
        }
    }
}

/// Endpoint source returning a swappable list or error
pub struct StaticSource {
    response: Mutex<Result<Vec<Endpoint>, SourceError>>,
    delay: Duration,
}

impl StaticSource {
    pub fn new(endpoints: Vec<Endpoint>) -> Self {
        Self {
            response: Mutex::new(Ok(endpoints)),
            delay: Duration::ZERO,
        }
    }

    pub fn failing(status: u16) -> Self {
        Self {
            response: Mutex::new(Err(SourceError::HttpStatus {
                url: "https://source.test/endpoints.json".to_string(),
                status,
            })),
            delay: Duration::ZERO,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn set(&self, response: Result<Vec<Endpoint>, SourceError>) {
        *self.response.lock().unwrap() = response;
    }
}

#[async_trait]
impl EndpointSource for StaticSource {
    async fn fetch_endpoints(&self) -> Result<Vec<Endpoint>, SourceError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.response.lock().unwrap().clone()
    }
}

/// One side effect observed by [`RecordingSink`]
#[derive(Debug, Clone, PartialEq)]
pub enum SinkCall {
    Create {
        channel: String,
        message_id: String,
        title: String,
    },
    Edit {
        message_id: String,
        title: String,
    },
    Delete {
        message_id: String,
    },
    Rename {
        target: String,
        text: String,
    },
}

/// Sink that records every call, hands out sequential message ids and can
/// be told to fail specific operations.
#[derive(Default)]
pub struct RecordingSink {
    calls: Mutex<Vec<SinkCall>>,
    next_id: AtomicUsize,
    fail_create: Mutex<bool>,
    fail_edit: Mutex<bool>,
    fail_delete: Mutex<bool>,
    fail_rename: Mutex<bool>,
    create_delay: Duration,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Creates are recorded at once but answered only after `delay`, like a
    /// remote that accepted the message and is slow to respond.
    pub fn with_create_delay(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            create_delay: delay,
            ..Self::default()
        })
    }

    pub fn calls(&self) -> Vec<SinkCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn fail_create(&self, fail: bool) {
        *self.fail_create.lock().unwrap() = fail;
    }

    pub fn fail_edit(&self, fail: bool) {
        *self.fail_edit.lock().unwrap() = fail;
    }

    pub fn fail_delete(&self, fail: bool) {
        *self.fail_delete.lock().unwrap() = fail;
    }

    pub fn fail_rename(&self, fail: bool) {
        *self.fail_rename.lock().unwrap() = fail;
    }

    fn rejected(operation: &str) -> SinkError {
        SinkError::Rejected {
            operation: operation.to_string(),
            status: 404,
            body: "{\"message\": \"Unknown Message\"}".to_string(),
        }
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn create_message(
        &self,
        channel: &str,
        content: &MessageContent,
    ) -> Result<MessageRef, SinkError> {
        if *self.fail_create.lock().unwrap() {
            return Err(Self::rejected("create_message"));
        }
        let message_id = format!("m{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        self.calls.lock().unwrap().push(SinkCall::Create {
            channel: channel.to_string(),
            message_id: message_id.clone(),
            title: content.title.clone(),
        });
        if !self.create_delay.is_zero() {
            tokio::time::sleep(self.create_delay).await;
        }
        Ok(MessageRef {
            channel_id: channel.to_string(),
            message_id,
        })
    }

    async fn edit_message(
        &self,
        message: &MessageRef,
        content: &MessageContent,
    ) -> Result<(), SinkError> {
        if *self.fail_edit.lock().unwrap() {
            return Err(Self::rejected("edit_message"));
        }
        self.calls.lock().unwrap().push(SinkCall::Edit {
            message_id: message.message_id.clone(),
            title: content.title.clone(),
        });
        Ok(())
    }

    async fn delete_message(&self, message: &MessageRef) -> Result<(), SinkError> {
        if *self.fail_delete.lock().unwrap() {
            return Err(Self::rejected("delete_message"));
        }
        self.calls.lock().unwrap().push(SinkCall::Delete {
            message_id: message.message_id.clone(),
        });
        Ok(())
    }

    async fn rename_label(&self, target: &str, text: &str) -> Result<(), SinkError> {
        if *self.fail_rename.lock().unwrap() {
            return Err(Self::rejected("rename_label"));
        }
        self.calls.lock().unwrap().push(SinkCall::Rename {
            target: target.to_string(),
            text: text.to_string(),
        });
        Ok(())
    }
}
