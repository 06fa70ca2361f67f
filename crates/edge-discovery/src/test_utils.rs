//! Test utilities for edge discovery.
//!
//! In-process fakes for the multicast transport, the network layer and the
//! peer info client.
//! Enable with the `test-utils` feature flag.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use edge_discovery::test_utils::{MockNetwork, MockTransport};
//!
//! let transport = Arc::new(MockTransport::new());
//! let network = Arc::new(MockNetwork::new(vec!["10.0.0.2".parse().unwrap()]));
//! ```

use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::domain::{
    AdvertisedMetadata, ClientError, DiscoveryEvent, NetworkError, OrchestrationInfo, PeerEntity,
    TransportError,
};
use crate::ports::{
    DiscoveryTransport, NetInterface, NetworkLayer, OrchestrationInfoClient, Registration,
};

/// TTL of the entity returned by [`MockTransport::register`].
pub const MOCK_TTL: u32 = 120;

const FEED_CAPACITY: usize = 64;

#[derive(Default)]
struct TransportState {
    registrations: Vec<Registration>,
    text: Vec<String>,
    set_text_calls: usize,
    resets: Vec<Vec<IpAddr>>,
    advertise_count: usize,
    shutdown_count: usize,
    failing_registrations: u32,
    failing_subscribe: bool,
    register_delay: Option<Duration>,
    events: Option<mpsc::Sender<DiscoveryEvent>>,
}

/// Recording fake of the multicast transport.
#[derive(Default)]
pub struct MockTransport {
    state: Mutex<TransportState>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the first `n` registrations.
    pub fn with_failing_registrations(n: u32) -> Self {
        let transport = Self::new();
        transport.state.lock().failing_registrations = n;
        transport
    }

    /// Fail every subscription to the peer event feed.
    pub fn with_failing_subscribe() -> Self {
        let transport = Self::new();
        transport.state.lock().failing_subscribe = true;
        transport
    }

    /// Take `delay` to answer every registration.
    pub fn with_register_delay(delay: Duration) -> Self {
        let transport = Self::new();
        transport.state.lock().register_delay = Some(delay);
        transport
    }

    /// Successful registrations, oldest first.
    pub fn registrations(&self) -> Vec<Registration> {
        self.state.lock().registrations.clone()
    }

    pub fn set_text_calls(&self) -> usize {
        self.state.lock().set_text_calls
    }

    /// Address lists passed to `reset_server`, oldest first.
    pub fn resets(&self) -> Vec<Vec<IpAddr>> {
        self.state.lock().resets.clone()
    }

    pub fn advertise_count(&self) -> usize {
        self.state.lock().advertise_count
    }

    pub fn shutdown_count(&self) -> usize {
        self.state.lock().shutdown_count
    }

    /// Deliver an event on the current peer feed.
    ///
    /// Returns `false` if nobody subscribed or the subscriber is gone.
    pub async fn send_event(&self, event: DiscoveryEvent) -> bool {
        let sender = self.state.lock().events.clone();
        match sender {
            Some(tx) => tx.send(event).await.is_ok(),
            None => false,
        }
    }
}

#[async_trait]
impl DiscoveryTransport for MockTransport {
    async fn register(&self, registration: Registration) -> Result<PeerEntity, TransportError> {
        let delay = self.state.lock().register_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock();
        if state.failing_registrations > 0 {
            state.failing_registrations -= 1;
            return Err(TransportError::RegistrationFailed(
                "simulated registration failure".to_string(),
            ));
        }

        let meta = AdvertisedMetadata::from_wire(&registration.text);
        let entity = PeerEntity {
            device_id: registration.instance.clone(),
            ttl: MOCK_TTL,
            info: OrchestrationInfo {
                platform: meta.platform,
                execution_type: meta.exec_type,
                service_list: meta.services,
                ipv4: registration
                    .addrs
                    .iter()
                    .filter(|ip| ip.is_ipv4())
                    .map(ToString::to_string)
                    .collect(),
            },
        };
        state.text = registration.text.clone();
        state.registrations.push(registration);
        Ok(entity)
    }

    fn subscribe(&self) -> Result<mpsc::Receiver<DiscoveryEvent>, TransportError> {
        let mut state = self.state.lock();
        if state.failing_subscribe {
            return Err(TransportError::SubscriptionFailed(
                "simulated subscription failure".to_string(),
            ));
        }
        let (tx, rx) = mpsc::channel(FEED_CAPACITY);
        state.events = Some(tx);
        Ok(rx)
    }

    fn text(&self) -> Vec<String> {
        self.state.lock().text.clone()
    }

    fn set_text(&self, text: Vec<String>) -> Result<(), TransportError> {
        let mut state = self.state.lock();
        state.text = text;
        state.set_text_calls += 1;
        Ok(())
    }

    async fn reset_server(&self, addrs: Vec<IpAddr>) -> Result<(), TransportError> {
        self.state.lock().resets.push(addrs);
        Ok(())
    }

    async fn advertise(&self) -> Result<(), TransportError> {
        self.state.lock().advertise_count += 1;
        Ok(())
    }

    async fn shutdown(&self) {
        let mut state = self.state.lock();
        state.shutdown_count += 1;
        state.events = None;
    }
}

#[derive(Default)]
struct NetworkState {
    ips: Vec<IpAddr>,
    started: bool,
    subscribers: Vec<mpsc::Sender<Vec<IpAddr>>>,
}

/// Fake network layer with a settable address list.
#[derive(Default)]
pub struct MockNetwork {
    state: Mutex<NetworkState>,
}

impl MockNetwork {
    pub fn new(ips: Vec<IpAddr>) -> Self {
        Self {
            state: Mutex::new(NetworkState {
                ips,
                ..NetworkState::default()
            }),
        }
    }

    /// Replace the address list without notifying subscribers.
    pub fn set_ips(&self, ips: Vec<IpAddr>) {
        self.state.lock().ips = ips;
    }

    pub fn is_started(&self) -> bool {
        self.state.lock().started
    }

    /// Replace the address list and notify every live subscriber.
    pub async fn push_change(&self, ips: Vec<IpAddr>) {
        let subscribers = {
            let mut state = self.state.lock();
            state.ips = ips.clone();
            state.subscribers.retain(|tx| !tx.is_closed());
            state.subscribers.clone()
        };
        for tx in subscribers {
            let _ = tx.send(ips.clone()).await;
        }
    }
}

#[async_trait]
impl NetworkLayer for MockNetwork {
    async fn start(&self) -> Result<(), NetworkError> {
        self.state.lock().started = true;
        Ok(())
    }

    fn ips(&self) -> Result<Vec<IpAddr>, NetworkError> {
        Ok(self.state.lock().ips.clone())
    }

    fn interfaces(&self) -> Result<Vec<NetInterface>, NetworkError> {
        Ok(vec![NetInterface {
            name: "mock0".to_string(),
            index: 1,
        }])
    }

    fn subscribe(&self) -> mpsc::Receiver<Vec<IpAddr>> {
        let (tx, rx) = mpsc::channel(FEED_CAPACITY);
        self.state.lock().subscribers.push(tx);
        rx
    }
}

struct ClientState {
    info: AdvertisedMetadata,
    failures: u32,
    requests: Vec<String>,
}

/// Peer info client answering every request with the same metadata.
pub struct MockInfoClient {
    state: Mutex<ClientState>,
}

impl MockInfoClient {
    pub fn new(info: AdvertisedMetadata) -> Self {
        Self::with_failures(info, 0)
    }

    /// Fail the first `n` requests.
    pub fn with_failures(info: AdvertisedMetadata, n: u32) -> Self {
        Self {
            state: Mutex::new(ClientState {
                info,
                failures: n,
                requests: Vec::new(),
            }),
        }
    }

    /// Addresses queried, oldest first.
    pub fn requests(&self) -> Vec<String> {
        self.state.lock().requests.clone()
    }
}

#[async_trait]
impl OrchestrationInfoClient for MockInfoClient {
    async fn orchestration_info(&self, address: &str) -> Result<AdvertisedMetadata, ClientError> {
        let mut state = self.state.lock();
        state.requests.push(address.to_string());
        if state.failures > 0 {
            state.failures -= 1;
            return Err(ClientError::Unreachable(address.to_string()));
        }
        Ok(state.info.clone())
    }
}
