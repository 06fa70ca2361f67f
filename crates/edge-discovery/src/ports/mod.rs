//! # Ports Layer - Hexagonal Architecture Boundaries
//!
//! - **Driving Port (Inbound):** `DiscoveryApi`, what this subsystem exposes
//! - **Driven Ports (Outbound):** stores, multicast transport, network layer,
//!   peer info client and configuration, what this subsystem requires

pub mod inbound;
pub mod outbound;

pub use inbound::DiscoveryApi;
pub use outbound::{
    ConfigProvider, DiscoveryTransport, NetInterface, NetworkLayer, OrchestrationInfoClient,
    RecordStore, Registration, RegistryStores,
};
