//! Advertised service name management.
//!
//! Every mutation runs under `metadata_lock` from reading the current TXT
//! strings to pushing the new ones, so concurrent add/remove/reset calls
//! never lose an update.

use edge_telemetry::metrics::SERVICE_NAME_CHANGES;
use edge_telemetry::{log_event, metric_inc};

use super::core::DiscoveryContext;
use super::SUBSYSTEM;
use crate::domain::{
    AdvertisedMetadata, ConfigurationRecord, DiscoveryError, DiscoveryResult, IdentityRecord,
    ServiceRecord, StoreError,
};

fn record_outcome(op: &str, result: &DiscoveryResult<()>) {
    let outcome = if result.is_ok() { "ok" } else { "rejected" };
    metric_inc!(SERVICE_NAME_CHANGES, &[op, outcome]);
}

impl DiscoveryContext {
    pub(crate) fn add_service_name(&self, name: &str) -> DiscoveryResult<()> {
        let result = self.mutate_services(name, |meta| meta.add_service(name));
        record_outcome("add", &result);
        if result.is_ok() {
            log_event!(info, SUBSYSTEM, "Service name added", service = name);
        }
        result
    }

    pub(crate) fn remove_service_name(&self, name: &str) -> DiscoveryResult<()> {
        let result = self.mutate_services(name, |meta| meta.remove_service(name));
        record_outcome("remove", &result);
        if result.is_ok() {
            log_event!(info, SUBSYSTEM, "Service name removed", service = name);
        }
        result
    }

    /// Advertise only platform and execution type. Failures are logged.
    pub(crate) fn reset_service_names(&self) {
        let _guard = self.metadata_lock.lock();

        let result = self.identity().and_then(|identity| {
            let meta = AdvertisedMetadata::new(identity.platform.clone(), identity.exec_type.clone());
            self.commit_metadata(&identity, &meta)
        });
        record_outcome("reset", &result);

        match result {
            Ok(()) => log_event!(info, SUBSYSTEM, "Service names reset"),
            Err(e) => log_event!(warn, SUBSYSTEM, "Failed to reset service names", error = %e),
        }
    }

    /// Current advertised metadata with the fixed slots taken from identity.
    fn current_metadata(&self, identity: &IdentityRecord) -> AdvertisedMetadata {
        let advertised = AdvertisedMetadata::from_wire(&self.transport.text());
        AdvertisedMetadata {
            platform: identity.platform.clone(),
            exec_type: identity.exec_type.clone(),
            services: advertised.services,
        }
    }

    fn mutate_services<F>(&self, name: &str, mutate: F) -> DiscoveryResult<()>
    where
        F: FnOnce(&mut AdvertisedMetadata) -> DiscoveryResult<()>,
    {
        if name.is_empty() {
            return Err(DiscoveryError::InvalidParam("no argument".to_string()));
        }

        let _guard = self.metadata_lock.lock();

        let identity = self.identity()?;
        let mut meta = self.current_metadata(&identity);
        meta.validate_name(name)?;
        mutate(&mut meta)?;
        meta.check_size(self.config.max_txt_size)?;

        self.commit_metadata(&identity, &meta)
    }

    /// Persist the service list for the local device, then push the TXT.
    fn commit_metadata(
        &self,
        identity: &IdentityRecord,
        meta: &AdvertisedMetadata,
    ) -> DiscoveryResult<()> {
        let mut conf = match self.stores.configuration.get(&identity.id) {
            Ok(conf) => conf,
            Err(StoreError::NotFound(_)) => ConfigurationRecord {
                id: identity.id.clone(),
                platform: identity.platform.clone(),
                exec_type: identity.exec_type.clone(),
                services: Vec::new(),
            },
            Err(e) => return Err(e.into()),
        };
        conf.services = meta.services.clone();
        self.stores.configuration.set(conf)?;

        self.stores.service.set(ServiceRecord {
            id: identity.id.clone(),
            services: meta.services.clone(),
        })?;

        self.transport.set_text(meta.to_wire())?;
        Ok(())
    }
}
