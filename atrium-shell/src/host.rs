//! Shell Host
//!
//! The single authority for tenant shell lifecycle. The host owns the
//! process-wide tenant-name → shell-context registry, builds it lazily at
//! startup, creates contexts on demand, and recycles them when a tenant's
//! settings change.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use atrium_shell::*;
//! use std::sync::Arc;
//!
//! let host = ShellHost::new(
//!     Arc::new(FileShellSettingsStore::new("sites")),
//!     Arc::new(MyContextFactory::new(db_pool)),
//!     Arc::new(InMemoryRunningShellTable::new()),
//!     Arc::new(broker),
//!     Arc::new(tasks),
//! );
//!
//! host.initialize().await?;
//! let context = host.get_or_create_shell_context(&settings).await?;
//! ```

use crate::context::{ShellContext, ShellContextFactory};
use crate::error::{Result, ShellError};
use crate::settings::{ShellSettings, TenantState};
use crate::store::ShellSettingsStore;
use crate::table::RunningShellTable;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info};

/// Message-broker teardown contract.
///
/// Detaches the subscriptions registered during one tenant's lifetime.
/// Scoped per tenant so recycling one tenant never severs another's
/// subscriptions.
#[async_trait]
pub trait BrokerSubscriptions: Send + Sync {
    /// Detach all of the tenant's subscriptions. Safe to call when none exist.
    async fn dispose(&self, tenant: &str) -> Result<()>;
}

/// Background-work teardown contract.
#[async_trait]
pub trait BackgroundTasks: Send + Sync {
    /// Stop the tenant's scheduled background work. Safe to call when none is running.
    async fn stop_tasks(&self, tenant: &str) -> Result<()>;
}

/// No-op broker teardown, for hosts without messaging.
#[derive(Debug, Clone, Default)]
pub struct NoOpBrokerSubscriptions;

#[async_trait]
impl BrokerSubscriptions for NoOpBrokerSubscriptions {
    async fn dispose(&self, _tenant: &str) -> Result<()> {
        Ok(())
    }
}

/// No-op task teardown, for hosts without background work.
#[derive(Debug, Clone, Default)]
pub struct NoOpBackgroundTasks;

#[async_trait]
impl BackgroundTasks for NoOpBackgroundTasks {
    async fn stop_tasks(&self, _tenant: &str) -> Result<()> {
        Ok(())
    }
}

type ContextCell = Arc<OnceCell<Arc<ShellContext>>>;

/// The tenant shell manager.
///
/// One instance per process, constructed at startup and shared (via `Arc`)
/// with request-handling code. All registry mutation goes through its
/// operations; a tenant is either absent from the registry or has a fully
/// constructed, activated context — there is no observable in-between.
pub struct ShellHost {
    settings_store: Arc<dyn ShellSettingsStore>,
    context_factory: Arc<dyn ShellContextFactory>,
    running_table: Arc<dyn RunningShellTable>,
    broker: Arc<dyn BrokerSubscriptions>,
    tasks: Arc<dyn BackgroundTasks>,

    /// Per-tenant create-once cells; unrelated tenants never contend.
    contexts: DashMap<String, ContextCell>,
    initialized: AtomicBool,
    init_lock: Mutex<()>,
    /// Serializes dispose+recreate per tenant.
    tenant_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl ShellHost {
    /// Create a shell host from its collaborators.
    pub fn new(
        settings_store: Arc<dyn ShellSettingsStore>,
        context_factory: Arc<dyn ShellContextFactory>,
        running_table: Arc<dyn RunningShellTable>,
        broker: Arc<dyn BrokerSubscriptions>,
        tasks: Arc<dyn BackgroundTasks>,
    ) -> Self {
        Self {
            settings_store,
            context_factory,
            running_table,
            broker,
            tasks,
            contexts: DashMap::new(),
            initialized: AtomicBool::new(false),
            init_lock: Mutex::new(()),
            tenant_locks: DashMap::new(),
        }
    }

    /// Create a shell host with no-op broker/task teardown.
    pub fn with_stores(
        settings_store: Arc<dyn ShellSettingsStore>,
        context_factory: Arc<dyn ShellContextFactory>,
        running_table: Arc<dyn RunningShellTable>,
    ) -> Self {
        Self::new(
            settings_store,
            context_factory,
            running_table,
            Arc::new(NoOpBrokerSubscriptions),
            Arc::new(NoOpBackgroundTasks),
        )
    }

    /// Idempotent bootstrap.
    ///
    /// The first caller loads every tenant's settings, creates and activates
    /// a shell for each eligible one (sequentially), and — if none is
    /// eligible — activates a single setup shell for an as-yet-unconfigured
    /// installation. Concurrent callers block behind the first and then
    /// observe the same registry; once initialized, this is a lock-free
    /// flag check.
    pub async fn initialize(&self) -> Result<()> {
        if self.initialized.load(Ordering::Acquire) {
            return Ok(());
        }

        let _guard = self.init_lock.lock().await;
        if self.initialized.load(Ordering::Acquire) {
            return Ok(());
        }

        self.create_and_activate_shells().await?;
        self.initialized.store(true, Ordering::Release);
        Ok(())
    }

    /// Return the cached context for `settings.name`, creating it if absent.
    ///
    /// Creation is de-duplicated per tenant: concurrent calls for the same
    /// name converge on a single factory invocation, while calls for
    /// different names proceed independently. The winning creation registers
    /// the tenant in the running table. A failed creation is not cached; the
    /// next call retries from scratch.
    pub async fn get_or_create_shell_context(
        &self,
        settings: &ShellSettings,
    ) -> Result<Arc<ShellContext>> {
        let cell = self
            .contexts
            .entry(settings.name.clone())
            .or_default()
            .clone();

        let context = cell
            .get_or_try_init(|| async {
                let context = Arc::new(self.create_shell_context(settings).await?);
                self.running_table.add(settings);
                Ok::<_, ShellError>(context)
            })
            .await?;

        Ok(context.clone())
    }

    /// Build a context for the given settings without touching the registry.
    ///
    /// Uninitialized tenants get a setup context; everything else gets a
    /// normal one.
    pub async fn create_shell_context(&self, settings: &ShellSettings) -> Result<ShellContext> {
        if settings.state == TenantState::Uninitialized {
            debug!("Creating shell context for tenant {} setup", settings.name);
            return self.context_factory.create_setup_context(settings).await;
        }

        debug!("Creating shell context for tenant {}", settings.name);
        self.context_factory.create_shell_context(settings).await
    }

    /// Persist new settings for a tenant, then recycle its shell.
    ///
    /// This is the only entry point that changes persisted tenant
    /// configuration; settings are saved durably before the old context is
    /// torn down.
    pub async fn update_shell_settings(&self, settings: &ShellSettings) -> Result<Arc<ShellContext>> {
        self.settings_store.save_settings(settings).await?;
        self.recycle_shell_context(settings).await
    }

    /// Dispose the tenant's current shell, then create and activate a fresh
    /// one.
    ///
    /// Dispose and recreate run under a per-tenant lock, so two recycles of
    /// the same tenant serialize. Between the two steps the tenant briefly
    /// has no context; requests arriving in that window see the tenant as
    /// absent rather than a stale shell.
    pub async fn recycle_shell_context(
        &self,
        settings: &ShellSettings,
    ) -> Result<Arc<ShellContext>> {
        debug!("Recycling shell context for tenant {}", settings.name);

        let lock = self.tenant_lock(&settings.name);
        let _guard = lock.lock().await;

        self.dispose_inner(settings).await?;
        self.get_or_create_shell_context(settings).await
    }

    /// Tear down a tenant's shell.
    ///
    /// Order: the tenant leaves the running table (new requests stop routing
    /// to it), its registry entry is removed and the context disposed, its
    /// broker subscriptions are detached, and its background tasks stopped.
    /// Teardown is best-effort: every step runs even if an earlier one
    /// failed, and failures surface together as [`ShellError::Teardown`].
    /// The registry entry is removed regardless, so a failed teardown never
    /// leaves a zombie tenant. Disposing an absent tenant is a no-op.
    pub async fn dispose_shell_context(&self, settings: &ShellSettings) -> Result<()> {
        let lock = self.tenant_lock(&settings.name);
        let _guard = lock.lock().await;

        let result = self.dispose_inner(settings).await;

        // The tenant is gone; drop its lock entry unless another caller
        // already holds a handle to it (strong count: map entry plus ours).
        self.tenant_locks
            .remove_if(&settings.name, |_, entry| Arc::strong_count(entry) <= 2);

        result
    }

    /// The context currently registered for a tenant, if any.
    pub fn get(&self, name: &str) -> Option<Arc<ShellContext>> {
        self.contexts
            .get(name)
            .and_then(|cell| cell.get().cloned())
    }

    /// Number of live shell contexts.
    pub fn context_count(&self) -> usize {
        self.contexts
            .iter()
            .filter(|entry| entry.value().initialized())
            .count()
    }

    /// Whether the bootstrap has run (and the registry has not collapsed
    /// back to empty since).
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    async fn create_and_activate_shells(&self) -> Result<()> {
        info!("Start creation of shells");

        let eligible: Vec<ShellSettings> = self
            .settings_store
            .load_settings()
            .await?
            .into_iter()
            .filter(ShellSettings::can_create_shell)
            .collect();

        if !eligible.is_empty() {
            // Sequential activation; tenants are not built in parallel at startup.
            for settings in &eligible {
                self.get_or_create_shell_context(settings).await?;
            }
        } else {
            // No tenants at all: activate a single setup shell.
            debug!("Creating shell context for root setup");
            let settings = ShellSettings::default_uninitialized();
            let context = self.context_factory.create_setup_context(&settings).await?;
            self.activate_shell(Arc::new(context));
        }

        info!("Done creating shells");
        Ok(())
    }

    /// Register a context in the registry and the running table.
    ///
    /// First writer wins: if the tenant already has a registered context,
    /// the new one is dropped and the running table is left untouched.
    fn activate_shell(&self, context: Arc<ShellContext>) {
        debug!("Activating context for tenant {}", context.tenant_name());

        let cell = self
            .contexts
            .entry(context.tenant_name().to_owned())
            .or_default()
            .clone();

        if cell.set(context.clone()).is_ok() {
            self.running_table.add(context.settings());
        }
    }

    async fn dispose_inner(&self, settings: &ShellSettings) -> Result<()> {
        self.running_table.remove(settings);

        if let Some((_, cell)) = self.contexts.remove(&settings.name) {
            if let Some(context) = cell.get() {
                context.dispose();
            }
            // A cell left empty by a failed creation is not a live tenant;
            // collapse when no constructed context remains.
            let any_live = self
                .contexts
                .iter()
                .any(|entry| entry.value().initialized());
            if !any_live {
                // Registry collapse: the next initialize() runs the full bootstrap.
                self.initialized.store(false, Ordering::Release);
            }
        }

        let mut failures = Vec::new();
        if let Err(e) = self.broker.dispose(&settings.name).await {
            failures.push(e.to_string());
        }
        if let Err(e) = self.tasks.stop_tasks(&settings.name).await {
            failures.push(e.to_string());
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(ShellError::Teardown {
                tenant: settings.name.clone(),
                failures,
            })
        }
    }

    fn tenant_lock(&self, name: &str) -> Arc<Mutex<()>> {
        self.tenant_locks.entry(name.to_owned()).or_default().clone()
    }
}
