use crate::client::KeylightClient;
use crate::error::{KeylightError, Result};
use crate::registry::LightRegistry;
use crate::types::DeviceAddress;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;

/// Default poll cadence for keep-awake tasks
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Scheduler for keep-awake polling tasks
///
/// The scheduler keeps the set of live pollers in agreement with the
/// registry: one background task per device whose keep-awake flag is set,
/// and none for anything else. Tasks are started and stopped only through
/// [`reconcile`](Self::reconcile); callers mutate the registry and then
/// reconcile, they never touch tasks directly.
///
/// Each poller fetches the device's state once per interval and discards the
/// result. The request alone resets the device's standby timeout. A failed
/// poll is logged and the poller carries on; only `disable`, `remove`, or
/// `stop_all` end it.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use keylight_control::{KeepAwakeScheduler, KeylightClient, LightRegistry};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let registry = Arc::new(LightRegistry::load("lights.json")?);
///     let scheduler = KeepAwakeScheduler::new(registry.clone(), KeylightClient::new());
///
///     registry.add("192.168.1.40", "Desk Light", true)?;
///     scheduler.reconcile().await;
///
///     // ... serve requests ...
///
///     scheduler.stop_all().await;
///     Ok(())
/// }
/// ```
pub struct KeepAwakeScheduler {
    registry: Arc<LightRegistry>,
    client: KeylightClient,
    interval: Duration,
    tasks: Mutex<HashMap<DeviceAddress, PollTask>>,
}

/// Handle to one live poller: a stop signal plus the task itself
struct PollTask {
    stop_tx: broadcast::Sender<()>,
    handle: JoinHandle<()>,
}

impl PollTask {
    /// Signal the poller and wait until it has actually exited
    async fn stop(self) {
        let _ = self.stop_tx.send(());
        if let Err(e) = self.handle.await {
            tracing::error!("Keep-awake poller ended abnormally: {}", e);
        }
    }
}

impl KeepAwakeScheduler {
    /// Create a scheduler polling at [`DEFAULT_POLL_INTERVAL`]
    pub fn new(registry: Arc<LightRegistry>, client: KeylightClient) -> Self {
        Self::with_interval(registry, client, DEFAULT_POLL_INTERVAL)
    }

    /// Create a scheduler with an explicit poll interval
    pub fn with_interval(
        registry: Arc<LightRegistry>,
        client: KeylightClient,
        interval: Duration,
    ) -> Self {
        Self {
            registry,
            client,
            interval,
            tasks: Mutex::new(HashMap::new()),
        }
    }

    /// Bring the live pollers into agreement with the registry
    ///
    /// Stops every poller whose record is gone or no longer flagged
    /// keep-awake, then starts one for every flagged record without a
    /// poller. Safe to call repeatedly; a second call with no registry
    /// change does nothing. Does not return until every stopped poller has
    /// actually exited.
    pub async fn reconcile(&self) {
        let records = self.registry.list();
        let mut tasks = self.tasks.lock().await;

        let stale: Vec<DeviceAddress> = tasks
            .keys()
            .filter(|address| {
                !records
                    .iter()
                    .any(|r| r.keep_awake && r.address == **address)
            })
            .cloned()
            .collect();

        for address in stale {
            if let Some(task) = tasks.remove(&address) {
                tracing::info!("Stopping keep-awake poller for {}", address);
                task.stop().await;
            }
        }

        for record in records.iter().filter(|r| r.keep_awake) {
            if !tasks.contains_key(&record.address) {
                tracing::info!("Starting keep-awake poller for {}", record.address);
                tasks.insert(record.address.clone(), self.spawn_poller(record.address.clone()));
            }
        }
    }

    /// Set the keep-awake flag for a known device and reconcile
    ///
    /// The device's display name is preserved. Unknown addresses are
    /// rejected; register the device first.
    pub async fn enable(&self, address: &str) -> Result<()> {
        self.set_keep_awake(address, true).await
    }

    /// Clear the keep-awake flag for a known device and reconcile
    ///
    /// When this returns, the device's poller has exited and no further
    /// poll will fire.
    pub async fn disable(&self, address: &str) -> Result<()> {
        self.set_keep_awake(address, false).await
    }

    /// Remove a device from the registry and reconcile
    ///
    /// When this returns, the record is gone and any poller for the address
    /// has exited.
    pub async fn remove(&self, address: &str) -> Result<()> {
        self.registry.remove(address)?;
        self.reconcile().await;
        Ok(())
    }

    /// Stop every live poller
    ///
    /// Called on process shutdown so no background work outlives the
    /// scheduler's owner. Does not return until all pollers have exited.
    pub async fn stop_all(&self) {
        let mut tasks = self.tasks.lock().await;
        if !tasks.is_empty() {
            tracing::info!("Stopping {} keep-awake poller(s)", tasks.len());
        }
        for (_, task) in tasks.drain() {
            task.stop().await;
        }
    }

    /// Get the number of live pollers
    pub async fn active_count(&self) -> usize {
        self.tasks.lock().await.len()
    }

    /// Check whether a poller is live for `address`
    pub async fn is_active(&self, address: &str) -> bool {
        self.tasks.lock().await.contains_key(address)
    }

    /// Get the registry this scheduler reconciles against
    pub fn registry(&self) -> &Arc<LightRegistry> {
        &self.registry
    }

    async fn set_keep_awake(&self, address: &str, keep_awake: bool) -> Result<()> {
        let record = self.registry.get(address).ok_or_else(|| {
            KeylightError::Validation(format!("unknown device address: {}", address))
        })?;
        self.registry.add(address, &record.display_name, keep_awake)?;
        self.reconcile().await;
        Ok(())
    }

    fn spawn_poller(&self, address: DeviceAddress) -> PollTask {
        let (stop_tx, mut stop_rx) = broadcast::channel(1);
        let client = self.client.clone();
        let interval = self.interval;

        let handle = tokio::spawn(async move {
            let first_tick = tokio::time::Instant::now() + interval;
            let mut ticker = tokio::time::interval_at(first_tick, interval);

            loop {
                tokio::select! {
                    _ = stop_rx.recv() => {
                        tracing::debug!("Keep-awake poller for {} stopped", address);
                        break;
                    }
                    _ = async {
                        ticker.tick().await;
                        // The fetched state is discarded; the request alone
                        // resets the device's standby timeout.
                        if let Err(e) = client.fetch_state(&address).await {
                            tracing::warn!("Keep-awake poll failed for {}: {}", address, e);
                        }
                    } => {}
                }
            }
        });

        PollTask { stop_tx, handle }
    }
}
