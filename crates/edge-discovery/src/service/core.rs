use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinHandle;

use super::shutdown::ShutdownSignal;
use crate::domain::DiscoveryConfig;
use crate::ports::{
    ConfigProvider, DiscoveryTransport, NetworkLayer, OrchestrationInfoClient, RegistryStores,
};

/// State shared by the service handle and its background tasks.
pub(crate) struct DiscoveryContext {
    pub(crate) stores: RegistryStores,
    pub(crate) transport: Arc<dyn DiscoveryTransport>,
    pub(crate) network: Arc<dyn NetworkLayer>,
    pub(crate) config: DiscoveryConfig,
    pub(crate) shutdown: ShutdownSignal,
    /// Held across read, validate, persist and push of advertised metadata
    pub(crate) metadata_lock: Mutex<()>,
}

/// Discovery service implementing the driving port.
///
/// Owns the collaborators through a shared context and the handles of the
/// background tasks spawned by `start_discovery`. Must be used inside a
/// tokio runtime.
///
/// # Example
///
/// ```rust,ignore
/// use edge_discovery::{DiscoveryApi, DiscoveryConfig, DiscoveryService, RegistryStores};
///
/// let service = DiscoveryService::new(
///     RegistryStores::in_memory(),
///     transport,
///     network,
///     DiscoveryConfig::default(),
/// );
/// let identity = service
///     .start_discovery(Path::new("/var/edge/uuid"), "ubuntu", "native")
///     .await?;
/// service.add_new_service_name("ls")?;
/// ```
pub struct DiscoveryService {
    pub(crate) ctx: Arc<DiscoveryContext>,
    pub(crate) tasks: Mutex<Vec<JoinHandle<()>>>,
    pub(crate) info_client: Option<Arc<dyn OrchestrationInfoClient>>,
}

impl DiscoveryService {
    /// Create a new discovery service.
    ///
    /// # Arguments
    ///
    /// * `stores` - Registry stores
    /// * `transport` - Multicast discovery transport
    /// * `network` - Local network layer
    /// * `config` - Discovery configuration
    pub fn new(
        stores: RegistryStores,
        transport: Arc<dyn DiscoveryTransport>,
        network: Arc<dyn NetworkLayer>,
        config: DiscoveryConfig,
    ) -> Self {
        Self {
            ctx: Arc::new(DiscoveryContext {
                stores,
                transport,
                network,
                config,
                shutdown: ShutdownSignal::new(),
                metadata_lock: Mutex::new(()),
            }),
            tasks: Mutex::new(Vec::new()),
            info_client: None,
        }
    }

    /// Client used by `add_device_info` to query relayed peers.
    pub fn with_info_client(mut self, client: Arc<dyn OrchestrationInfoClient>) -> Self {
        self.info_client = Some(client);
        self
    }

    /// Create a service from a configuration provider.
    ///
    /// Uses file-backed stores when the provider names a store directory,
    /// in-memory stores otherwise.
    pub fn from_provider(
        provider: &dyn ConfigProvider,
        transport: Arc<dyn DiscoveryTransport>,
        network: Arc<dyn NetworkLayer>,
    ) -> Self {
        let stores = match provider.store_dir() {
            Some(dir) => RegistryStores::open_dir(&dir),
            None => RegistryStores::in_memory(),
        };
        Self::new(stores, transport, network, provider.discovery_config())
    }

    /// Registry stores backing this service.
    pub fn stores(&self) -> &RegistryStores {
        &self.ctx.stores
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.ctx.config
    }

    /// Termination signal observed by the background tasks.
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.ctx.shutdown.clone()
    }

    /// Number of background tasks still tracked.
    pub fn running_tasks(&self) -> usize {
        self.tasks.lock().iter().filter(|h| !h.is_finished()).count()
    }
}
