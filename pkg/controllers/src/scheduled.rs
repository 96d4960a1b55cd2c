use pkg_constants::refresh::{
    DEFAULT_INITIAL_DELAY_SECS, DEFAULT_REFRESH_INTERVAL_SECS, DEFAULT_REQUEST_TIMEOUT_SECS,
};
use pkg_state::registry::Cluster;
use pkg_types::event::EventType;
use pkg_types::vault::Vault;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::{RefreshError, Result};
use crate::handler::EventHandler;
use crate::notification::EventNotification;
use crate::refresh::TypeRefreshFactory;

/// Timing of the scheduled refresh.
#[derive(Debug, Clone)]
pub struct RefreshSettings {
    pub interval: Duration,
    pub initial_delay: Duration,
    /// Upper bound for evaluating and refreshing a single binding.
    pub binding_timeout: Duration,
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_REFRESH_INTERVAL_SECS),
            initial_delay: Duration::from_secs(DEFAULT_INITIAL_DELAY_SECS),
            binding_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS * 3),
        }
    }
}

/// What happened to one binding during one tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    NoActionNeeded,
    Refreshed,
    Failed(String),
}

/// Outcomes of one tick, in the order bindings were listed.
#[derive(Debug, Default)]
pub struct TickReport {
    pub outcomes: Vec<(String, RefreshOutcome)>,
}

impl TickReport {
    pub fn refreshed(&self) -> usize {
        self.count(|o| *o == RefreshOutcome::Refreshed)
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, RefreshOutcome::Failed(_)))
    }

    pub fn outcome(&self, identity: &str) -> Option<&RefreshOutcome> {
        self.outcomes
            .iter()
            .find(|(id, _)| id == identity)
            .map(|(_, o)| o)
    }

    fn count(&self, pred: impl Fn(&RefreshOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, o)| pred(o)).count()
    }
}

/// Controller that periodically re-evaluates every binding and refreshes the
/// due ones. It never writes secrets itself; the [`EventHandler`] does.
pub struct ScheduledRefresh {
    cluster: Arc<dyn Cluster>,
    factory: Arc<TypeRefreshFactory>,
    handler: Arc<EventHandler>,
    notifier: Arc<dyn EventNotification>,
    settings: RefreshSettings,
}

/// Handle to a running [`ScheduledRefresh`]. Dropping it also stops the loop.
pub struct RefreshHandle {
    shutdown: watch::Sender<bool>,
    task: tokio::task::JoinHandle<()>,
}

impl RefreshHandle {
    /// Stop after the in-flight tick, if any, has finished.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            warn!("ScheduledRefresh task ended abnormally: {}", e);
        }
    }
}

impl ScheduledRefresh {
    pub fn new(
        cluster: Arc<dyn Cluster>,
        factory: Arc<TypeRefreshFactory>,
        handler: Arc<EventHandler>,
        notifier: Arc<dyn EventNotification>,
        settings: RefreshSettings,
    ) -> Self {
        Self {
            cluster,
            factory,
            handler,
            notifier,
            settings,
        }
    }

    /// Start the controller loop as a background task.
    pub fn start(self) -> RefreshHandle {
        let (shutdown, mut shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(async move {
            info!(
                "ScheduledRefresh started (interval={}s, initial_delay={}s)",
                self.settings.interval.as_secs(),
                self.settings.initial_delay.as_secs()
            );
            let start = tokio::time::Instant::now() + self.settings.initial_delay;
            let mut interval = tokio::time::interval_at(start, self.settings.interval);
            loop {
                tokio::select! {
                    _ = interval.tick() => {}
                    _ = shutdown_rx.changed() => break,
                }
                if let Err(e) = self.refresh_once().await {
                    warn!("ScheduledRefresh tick aborted: {}", e);
                }
            }
            info!("ScheduledRefresh stopped");
        });
        RefreshHandle { shutdown, task }
    }

    /// One pass over all bindings. Only a listing failure is returned as an
    /// error; per-binding failures end up in the report and the event log.
    pub async fn refresh_once(&self) -> Result<TickReport> {
        info!("Start refresh of secrets...");
        let listing = self
            .cluster
            .list_vaults()
            .await
            .map_err(|source| RefreshError::ListingFailed { source })?;

        let mut report = TickReport::default();
        for vault in &listing.vaults {
            let timeout = self.settings.binding_timeout;
            let result = match tokio::time::timeout(timeout, self.refresh_binding(vault)).await {
                Ok(result) => result,
                Err(_) => Err(RefreshError::Timeout {
                    binding: vault.identity(),
                    after: timeout,
                }),
            };

            let outcome = match result {
                Ok(RefreshOutcome::Refreshed) => {
                    self.notify(EventType::Modification, "Secret refreshed", vault)
                        .await;
                    RefreshOutcome::Refreshed
                }
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!(
                        "Refresh of secret {} in namespace {} failed: {}",
                        vault.name, vault.namespace, e
                    );
                    let message = format!("Modification of secret failed with exception {}", e);
                    self.notify(EventType::ModificationFailed, &message, vault)
                        .await;
                    RefreshOutcome::Failed(e.to_string())
                }
            };
            report.outcomes.push((vault.identity(), outcome));
        }

        for broken in &listing.undecodable {
            let e = RefreshError::InvalidConfiguration {
                binding: broken.identity(),
                reason: format!("stored binding cannot be decoded: {}", broken.reason),
            };
            warn!("Refresh of secret {} skipped: {}", broken.identity(), e);
            let message = format!("Modification of secret failed with exception {}", e);
            if let Err(err) = self
                .notifier
                .store_binding_event(
                    EventType::ModificationFailed,
                    &message,
                    &broken.namespace,
                    &broken.name,
                    "",
                )
                .await
            {
                warn!("Failed to record event for {}: {}", broken.identity(), err);
            }
            report
                .outcomes
                .push((broken.identity(), RefreshOutcome::Failed(e.to_string())));
        }

        info!(
            "Finished refresh of secrets ({} bindings, {} refreshed, {} failed)",
            report.outcomes.len(),
            report.refreshed(),
            report.failed()
        );
        Ok(report)
    }

    async fn refresh_binding(&self, vault: &Vault) -> Result<RefreshOutcome> {
        let strategy = self.factory.get(vault.spec.vault_type).ok_or_else(|| {
            RefreshError::InvalidConfiguration {
                binding: vault.identity(),
                reason: format!("no refresh strategy for type {}", vault.spec.vault_type),
            }
        })?;

        if !strategy.refresh_is_needed(vault).await? {
            debug!("Secret {} is up to date", vault.identity());
            return Ok(RefreshOutcome::NoActionNeeded);
        }
        if !self.handler.modify_handler(vault).await? {
            return Ok(RefreshOutcome::NoActionNeeded);
        }
        Ok(RefreshOutcome::Refreshed)
    }

    async fn notify(&self, kind: EventType, message: &str, vault: &Vault) {
        if let Err(e) = self.notifier.store_new_event(kind, message, vault).await {
            warn!("Failed to record {} event for {}: {}", kind, vault.identity(), e);
        }
    }
}
