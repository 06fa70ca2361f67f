//! Server start and stop.

use std::net::IpAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use edge_telemetry::metrics::{REGISTRATION_ATTEMPTS, SUBSYSTEM_ERRORS};
use edge_telemetry::{log_event, metric_inc, subsystem_span};
use tracing::Instrument;

use super::core::{DiscoveryContext, DiscoveryService};
use super::network_monitor::{ipv4_strings, run_network_monitor};
use super::reconcile::run_reconciliation;
use super::retry::retry_with_backoff;
use super::scheduler::run_active_discovery;
use super::SUBSYSTEM;
use crate::domain::{
    AdvertisedMetadata, ConfigurationRecord, DeviceIdentity, DiscoveryError, DiscoveryResult,
    IdentityRecord,
    NetworkError, NetworkRecord, ServiceRecord, ID_KEY,
};
use crate::ports::Registration;

/// How long `stop_discovery` waits for each background task.
const TASK_STOP_TIMEOUT: Duration = Duration::from_secs(5);

impl DiscoveryContext {
    fn usable_ips(&self) -> Result<Vec<IpAddr>, NetworkError> {
        let ips = self.network.ips()?;
        if ips.is_empty() {
            return Err(NetworkError::NoAddress);
        }
        Ok(ips)
    }

    /// Drop every record left over from a previous run.
    fn clear_registry(&self) -> DiscoveryResult<()> {
        log_event!(info, SUBSYSTEM, "Clearing registry");
        for id in self.known_ids()? {
            self.delete_device_records(&id)?;
        }
        for entry in self.stores.identity.list()? {
            self.stores.identity.delete(&entry.name)?;
        }
        Ok(())
    }

    fn persist_local_device(
        &self,
        identity: &IdentityRecord,
        ips: &[IpAddr],
    ) -> DiscoveryResult<()> {
        for entry in identity.entries() {
            self.stores.identity.set(entry)?;
        }
        self.stores.configuration.set(ConfigurationRecord {
            id: identity.id.clone(),
            platform: identity.platform.clone(),
            exec_type: identity.exec_type.clone(),
            services: Vec::new(),
        })?;
        self.stores.network.set(NetworkRecord {
            id: identity.id.clone(),
            ipv4: ipv4_strings(ips),
            rtt: 0.0,
        })?;
        self.stores.service.set(ServiceRecord {
            id: identity.id.clone(),
            services: Vec::new(),
        })?;
        self.update_known_devices();
        Ok(())
    }
}

impl DiscoveryService {
    pub(crate) async fn start(
        &self,
        uuid_path: &Path,
        platform: &str,
        exec_type: &str,
    ) -> DiscoveryResult<DeviceIdentity> {
        if !self.tasks.lock().is_empty() {
            log_event!(warn, SUBSYSTEM, "Discovery already running, restarting");
            self.stop().await;
        }

        let ctx = &self.ctx;
        log_event!(info, SUBSYSTEM, "Starting discovery", platform, exec_type);

        ctx.network.start().await?;
        ctx.shutdown.reset();
        let mut shutdown = ctx.shutdown.listener();

        ctx.clear_registry()?;
        let identity = DeviceIdentity::bootstrap(uuid_path);

        let ips = retry_with_backoff(ctx.config.ip_retry(), &mut shutdown, "local IP lookup", |_| {
            std::future::ready(ctx.usable_ips())
        })
        .await?;

        let interfaces = ctx.network.interfaces().unwrap_or_else(|e| {
            log_event!(warn, SUBSYSTEM, "Failed to list interfaces, binding to all", error = %e);
            Vec::new()
        });

        let registration = Registration {
            instance: identity.device_id.clone(),
            service_type: ctx.config.service_type.clone(),
            domain: ctx.config.domain.clone(),
            port: ctx.config.port,
            hostname: identity.hostname.clone(),
            addrs: ips.clone(),
            text: AdvertisedMetadata::new(platform, exec_type).to_wire(),
            interfaces,
        };

        let transport = Arc::clone(&ctx.transport);
        let announced = retry_with_backoff(
            ctx.config.registration_retry(),
            &mut shutdown,
            "multicast registration",
            |_| {
                metric_inc!(REGISTRATION_ATTEMPTS);
                let transport = Arc::clone(&transport);
                let registration = registration.clone();
                async move { transport.register(registration).await }
            },
        )
        .await
        .inspect_err(|e| metric_inc!(SUBSYSTEM_ERRORS, &["lifecycle", e.error_type()]))?;

        // A stop that landed while `register` was in flight
        if shutdown.is_triggered() {
            log_event!(warn, SUBSYSTEM, "Stop requested during registration, withdrawing");
            ctx.transport.shutdown().await;
            return Err(DiscoveryError::Cancelled);
        }
        log_event!(info, SUBSYSTEM, "Registered with multicast responder", device_id = %announced.device_id, ips = ?announced.info.ipv4);

        ctx.persist_local_device(
            &IdentityRecord {
                id: identity.device_id.clone(),
                platform: platform.to_string(),
                exec_type: exec_type.to_string(),
            },
            &ips,
        )?;

        self.spawn_background_tasks();
        if shutdown.is_triggered() {
            self.stop().await;
            return Err(DiscoveryError::Cancelled);
        }
        Ok(identity)
    }

    fn spawn_background_tasks(&self) {
        let ctx = &self.ctx;
        let mut tasks = self.tasks.lock();

        match ctx.transport.subscribe() {
            Ok(events) => tasks.push(tokio::spawn(
                run_reconciliation(Arc::clone(ctx), events, ctx.shutdown.listener())
                    .instrument(subsystem_span!("peer_reconciliation", subsystem = SUBSYSTEM)),
            )),
            Err(e) => {
                log_event!(error, SUBSYSTEM, "Peer event subscription failed, registry will not track peers", error = %e);
                metric_inc!(SUBSYSTEM_ERRORS, &["lifecycle", "transport"]);
            }
        }

        tasks.push(tokio::spawn(
            run_network_monitor(Arc::clone(ctx), ctx.network.subscribe(), ctx.shutdown.listener())
                .instrument(subsystem_span!("network_monitor", subsystem = SUBSYSTEM)),
        ));

        tasks.push(tokio::spawn(
            run_active_discovery(Arc::clone(ctx), ctx.shutdown.listener())
                .instrument(subsystem_span!("active_discovery", subsystem = SUBSYSTEM)),
        ));
    }

    pub(crate) async fn stop(&self) {
        if self.ctx.stores.identity.get(ID_KEY).is_err() {
            log_event!(warn, SUBSYSTEM, "Stop requested but no server initiated yet");
            // Aborts a start still waiting for addresses or registration
            self.ctx.shutdown.trigger();
            return;
        }

        let handles = std::mem::take(&mut *self.tasks.lock());
        if handles.is_empty() && self.ctx.shutdown.is_triggered() {
            log_event!(warn, SUBSYSTEM, "Stop requested but discovery is already stopped");
            return;
        }

        log_event!(info, SUBSYSTEM, "Stopping discovery");
        self.ctx.shutdown.trigger();
        self.ctx.transport.shutdown().await;

        for mut handle in handles {
            if tokio::time::timeout(TASK_STOP_TIMEOUT, &mut handle)
                .await
                .is_err()
            {
                log_event!(warn, SUBSYSTEM, "Background task did not stop in time, aborting");
                handle.abort();
            }
        }
        log_event!(info, SUBSYSTEM, "Discovery stopped");
    }
}
