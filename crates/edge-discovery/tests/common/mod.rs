//! Shared harness for the integration tests.

#![allow(dead_code)]

use std::future::Future;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use edge_discovery::test_utils::{MockNetwork, MockTransport};
use edge_discovery::{
    DeviceIdentity, DiscoveryApi, DiscoveryConfig, DiscoveryService, OrchestrationInfo,
    PeerEntity, RegistryStores,
};
use tempfile::TempDir;

pub const PLATFORM: &str = "ubuntu";
pub const EXEC_TYPE: &str = "native";
pub const LOCAL_IP: &str = "10.0.0.2";

pub fn ip(s: &str) -> IpAddr {
    s.parse().unwrap()
}

/// A started service and its fakes.
pub struct Node {
    pub service: DiscoveryService,
    pub transport: Arc<MockTransport>,
    pub network: Arc<MockNetwork>,
    pub identity: DeviceIdentity,
    _dir: TempDir,
}

impl Node {
    pub async fn start() -> Self {
        Self::start_with(RegistryStores::in_memory()).await
    }

    pub async fn start_with(stores: RegistryStores) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let transport = Arc::new(MockTransport::new());
        let network = Arc::new(MockNetwork::new(vec![ip(LOCAL_IP)]));
        let service = DiscoveryService::new(
            stores,
            transport.clone(),
            network.clone(),
            DiscoveryConfig::for_testing(),
        );

        let identity = service
            .start_discovery(&dir.path().join("uuid"), PLATFORM, EXEC_TYPE)
            .await
            .expect("discovery should start");

        Self {
            service,
            transport,
            network,
            identity,
            _dir: dir,
        }
    }

    pub fn local_id(&self) -> &str {
        &self.identity.device_id
    }

    pub fn stored_ids(&self) -> (Vec<String>, Vec<String>, Vec<String>) {
        let stores = self.service.stores();
        let mut conf: Vec<_> = stores.configuration.list().unwrap().into_iter().map(|r| r.id).collect();
        let mut net: Vec<_> = stores.network.list().unwrap().into_iter().map(|r| r.id).collect();
        let mut svc: Vec<_> = stores.service.list().unwrap().into_iter().map(|r| r.id).collect();
        conf.sort();
        net.sort();
        svc.sort();
        (conf, net, svc)
    }
}

pub fn peer(id: &str, ttl: u32, ipv4: &[&str], services: &[&str]) -> PeerEntity {
    PeerEntity {
        device_id: id.to_string(),
        ttl,
        info: OrchestrationInfo {
            platform: "docker".into(),
            execution_type: "container".into(),
            service_list: services.iter().map(|s| s.to_string()).collect(),
            ipv4: ipv4.iter().map(|s| s.to_string()).collect(),
        },
    }
}

/// Poll `condition` until it holds or `timeout` elapses.
pub async fn eventually<F>(timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// Await `fut` with a generous bound.
pub async fn bounded<T>(fut: impl Future<Output = T>) -> T {
    tokio::time::timeout(Duration::from_secs(5), fut)
        .await
        .expect("operation timed out")
}
