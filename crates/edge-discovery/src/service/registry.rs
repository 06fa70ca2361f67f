//! Registry reads and deletes.

use std::collections::{BTreeSet, HashMap};

use edge_telemetry::{log_peer_event, metrics::KNOWN_DEVICES};

use super::core::DiscoveryContext;
use super::SUBSYSTEM;
use crate::domain::{
    AdvertisedMetadata, DiscoveryError, DiscoveryResult, IdentityRecord, OrchestrationInfo,
    StoreError, EXEC_TYPE_KEY, ID_KEY, PLATFORM_KEY,
};

/// Map a store miss to `DiscoveryError::NotFound` naming `what`.
fn not_found_as(what: &str) -> impl FnOnce(StoreError) -> DiscoveryError + '_ {
    move |e| match e {
        StoreError::NotFound(_) => DiscoveryError::NotFound(what.to_string()),
        other => other.into(),
    }
}

impl DiscoveryContext {
    /// Local device ID. `SystemError` if no server was started.
    pub(crate) fn local_id(&self) -> DiscoveryResult<String> {
        self.identity_value(ID_KEY)
    }

    /// Identity of the local node. `SystemError` if no server was started.
    pub(crate) fn identity(&self) -> DiscoveryResult<IdentityRecord> {
        Ok(IdentityRecord {
            id: self.identity_value(ID_KEY)?,
            platform: self.identity_value(PLATFORM_KEY)?,
            exec_type: self.identity_value(EXEC_TYPE_KEY)?,
        })
    }

    fn identity_value(&self, key: &str) -> DiscoveryResult<String> {
        match self.stores.identity.get(key) {
            Ok(entry) => Ok(entry.value),
            Err(StoreError::NotFound(_)) => Err(DiscoveryError::no_server()),
            Err(e) => Err(e.into()),
        }
    }

    pub(crate) fn orchestration_info(&self) -> DiscoveryResult<AdvertisedMetadata> {
        let identity = self.identity()?;
        let services = self
            .stores
            .service
            .get(&identity.id)
            .map_err(not_found_as(&identity.id))?
            .services;
        Ok(AdvertisedMetadata {
            platform: identity.platform,
            exec_type: identity.exec_type,
            services,
        })
    }

    /// Join the three per-device records for `id`.
    pub(crate) fn device_with_id(&self, id: &str) -> DiscoveryResult<OrchestrationInfo> {
        let conf = self.stores.configuration.get(id).map_err(not_found_as(id))?;
        let net = self.stores.network.get(id).map_err(not_found_as(id))?;
        let svc = self.stores.service.get(id).map_err(not_found_as(id))?;
        Ok(OrchestrationInfo {
            platform: conf.platform,
            execution_type: conf.exec_type,
            service_list: svc.services,
            ipv4: net.ipv4,
        })
    }

    /// Every device with a complete set of records.
    pub(crate) fn device_list(&self) -> DiscoveryResult<HashMap<String, OrchestrationInfo>> {
        let mut devices = HashMap::new();
        for conf in self.stores.configuration.list()? {
            match self.device_with_id(&conf.id) {
                Ok(info) => {
                    devices.insert(conf.id, info);
                }
                Err(DiscoveryError::NotFound(_)) => {
                    log_peer_event!(debug, SUBSYSTEM, "Skipping device with partial records", conf.id);
                }
                Err(e) => return Err(e),
            }
        }
        if devices.is_empty() {
            return Err(DiscoveryError::NotFound("no device found".to_string()));
        }
        Ok(devices)
    }

    pub(crate) fn device_ips_with_service(&self, service: &str) -> DiscoveryResult<Vec<String>> {
        let mut ips = Vec::new();
        for svc in self.stores.service.list()? {
            if !svc.services.iter().any(|s| s == service) {
                continue;
            }
            match self.stores.network.get(&svc.id) {
                Ok(net) => ips.extend(net.ipv4),
                Err(StoreError::NotFound(_)) => {}
                Err(e) => return Err(e.into()),
            }
        }
        if ips.is_empty() {
            return Err(DiscoveryError::NotFound(format!(
                "no device provides {service}"
            )));
        }
        Ok(ips)
    }

    pub(crate) fn delete_device_with_ip(&self, ip: &str) -> DiscoveryResult<()> {
        let owner = self
            .stores
            .network
            .list()?
            .into_iter()
            .find(|net| net.ipv4.iter().any(|addr| addr == ip))
            .ok_or_else(|| DiscoveryError::NotFound(format!("no device with address {ip}")))?;
        self.delete_device_with_id(&owner.id)
    }

    pub(crate) fn delete_device_with_id(&self, id: &str) -> DiscoveryResult<()> {
        if self.local_id().ok().as_deref() == Some(id) {
            return Err(DiscoveryError::InvalidParam(
                "cannot delete the local device".to_string(),
            ));
        }
        let result = self.delete_device_records(id);
        self.update_known_devices();
        result
    }

    /// Delete the three per-device records of `id`.
    ///
    /// Every delete is attempted; the first failure is returned.
    pub(crate) fn delete_device_records(&self, id: &str) -> DiscoveryResult<()> {
        log_peer_event!(debug, SUBSYSTEM, "Deleting device records", id);
        let results = [
            self.stores.configuration.delete(id),
            self.stores.network.delete(id),
            self.stores.service.delete(id),
        ];
        results
            .into_iter()
            .collect::<Result<Vec<()>, StoreError>>()
            .map(|_| ())
            .map_err(Into::into)
    }

    /// IDs present in any per-device store.
    pub(crate) fn known_ids(&self) -> DiscoveryResult<BTreeSet<String>> {
        let mut ids = BTreeSet::new();
        ids.extend(self.stores.configuration.list()?.into_iter().map(|r| r.id));
        ids.extend(self.stores.network.list()?.into_iter().map(|r| r.id));
        ids.extend(self.stores.service.list()?.into_iter().map(|r| r.id));
        Ok(ids)
    }

    pub(crate) fn update_known_devices(&self) {
        if let Ok(records) = self.stores.configuration.list() {
            KNOWN_DEVICES.set(records.len() as f64);
        }
    }
}
