//! Tenant-scoped task manager.

use crate::task::{BackgroundTask, TaskResult};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Runs registered background tasks per tenant and stops them on demand.
///
/// Tasks and their running handles are keyed by tenant, so stopping one
/// tenant's work never touches another's. Stopping a tenant with nothing
/// running is a no-op.
#[derive(Default)]
pub struct TaskManager {
    registered: DashMap<String, Vec<Arc<dyn BackgroundTask>>>,
    running: DashMap<String, Vec<JoinHandle<()>>>,
}

impl TaskManager {
    /// Create a new task manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a task under a tenant's scope.
    ///
    /// Registration alone does not run anything; call [`start_tasks`](Self::start_tasks)
    /// once the tenant's shell is active.
    pub fn register(&self, tenant: &str, task: Arc<dyn BackgroundTask>) {
        debug!("Registering task '{}' for tenant {}", task.name(), tenant);
        self.registered
            .entry(tenant.to_owned())
            .or_default()
            .push(task);
    }

    /// Start every task registered for a tenant.
    ///
    /// Already-running tasks for the tenant are stopped first, so a restart
    /// after a shell recycle never doubles them up.
    pub fn start_tasks(&self, tenant: &str) {
        self.stop_tenant(tenant);

        let tasks = match self.registered.get(tenant) {
            Some(tasks) => tasks.clone(),
            None => return,
        };

        info!("Starting {} task(s) for tenant {}", tasks.len(), tenant);

        let mut handles = Vec::with_capacity(tasks.len());
        for task in tasks {
            let tenant = tenant.to_owned();
            handles.push(tokio::spawn(async move {
                let mut ticker = tokio::time::interval(task.interval());
                // The first interval tick fires immediately; skip it
                ticker.tick().await;
                loop {
                    ticker.tick().await;
                    debug!("Executing task '{}' for tenant {}", task.name(), tenant);
                    if let Err(e) = task.execute(&tenant).await {
                        error!("Task '{}' failed for tenant {}: {}", task.name(), tenant, e);
                    }
                }
            }));
        }

        self.running.insert(tenant.to_owned(), handles);
    }

    /// Stop a tenant's running tasks. Registrations are kept, so the tasks
    /// can be started again when the tenant's shell is recreated.
    pub fn stop_tenant(&self, tenant: &str) {
        if let Some((_, handles)) = self.running.remove(tenant) {
            debug!("Stopping {} task(s) for tenant {}", handles.len(), tenant);
            for handle in handles {
                handle.abort();
            }
        }
    }

    /// Stop every tenant's running tasks
    pub fn stop_all(&self) {
        let tenants: Vec<String> = self.running.iter().map(|e| e.key().clone()).collect();
        for tenant in tenants {
            self.stop_tenant(&tenant);
        }
        info!("Stopped all background tasks");
    }

    /// Remove a tenant's registrations entirely
    pub fn unregister_tenant(&self, tenant: &str) {
        self.stop_tenant(tenant);
        self.registered.remove(tenant);
    }

    /// Number of tasks registered for a tenant
    pub fn task_count(&self, tenant: &str) -> usize {
        self.registered.get(tenant).map(|t| t.len()).unwrap_or(0)
    }

    /// Whether a tenant currently has running tasks
    pub fn is_running(&self, tenant: &str) -> bool {
        self.running.contains_key(tenant)
    }

    /// Run one tick of every task registered for a tenant, immediately.
    pub async fn run_once(&self, tenant: &str) -> TaskResult<()> {
        let tasks = match self.registered.get(tenant) {
            Some(tasks) => tasks.clone(),
            None => return Ok(()),
        };
        for task in tasks {
            task.execute(tenant).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl atrium_shell::BackgroundTasks for TaskManager {
    async fn stop_tasks(&self, tenant: &str) -> Result<(), atrium_shell::ShellError> {
        self.stop_tenant(tenant);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskError;
    use atrium_shell::BackgroundTasks;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    struct CountingTask {
        name: String,
        interval: Duration,
        ticks: Arc<AtomicU32>,
    }

    impl CountingTask {
        fn new(name: &str, interval: Duration) -> (Arc<Self>, Arc<AtomicU32>) {
            let ticks = Arc::new(AtomicU32::new(0));
            let task = Arc::new(Self {
                name: name.to_owned(),
                interval,
                ticks: ticks.clone(),
            });
            (task, ticks)
        }
    }

    #[async_trait]
    impl BackgroundTask for CountingTask {
        fn name(&self) -> &str {
            &self.name
        }

        fn interval(&self) -> Duration {
            self.interval
        }

        async fn execute(&self, _tenant: &str) -> Result<(), TaskError> {
            self.ticks.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_start_and_stop() {
        let manager = TaskManager::new();
        let (task, ticks) = CountingTask::new("sync", Duration::from_millis(10));

        manager.register("acme", task);
        manager.start_tasks("acme");
        assert!(manager.is_running("acme"));

        tokio::time::sleep(Duration::from_millis(60)).await;
        manager.stop_tenant("acme");
        assert!(!manager.is_running("acme"));

        let after_stop = ticks.load(Ordering::SeqCst);
        assert!(after_stop > 0);

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), after_stop);
    }

    #[tokio::test]
    async fn test_stop_is_tenant_scoped() {
        let manager = TaskManager::new();
        let (acme_task, _) = CountingTask::new("sync", Duration::from_millis(10));
        let (beta_task, beta_ticks) = CountingTask::new("sync", Duration::from_millis(10));

        manager.register("acme", acme_task);
        manager.register("beta", beta_task);
        manager.start_tasks("acme");
        manager.start_tasks("beta");

        manager.stop_tenant("acme");
        assert!(!manager.is_running("acme"));
        assert!(manager.is_running("beta"));

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(beta_ticks.load(Ordering::SeqCst) > 0);

        manager.stop_all();
    }

    #[tokio::test]
    async fn test_stop_without_tasks_is_noop() {
        let manager = TaskManager::new();
        manager.stop_tenant("ghost");
        assert!(!manager.is_running("ghost"));
    }

    #[tokio::test]
    async fn test_run_once() {
        let manager = TaskManager::new();
        let (task, ticks) = CountingTask::new("sync", Duration::from_secs(3600));

        manager.register("acme", task);
        manager.run_once("acme").await.unwrap();

        assert_eq!(ticks.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_shell_teardown_contract() {
        let manager = TaskManager::new();
        let (task, _) = CountingTask::new("sync", Duration::from_millis(10));

        manager.register("acme", task);
        manager.start_tasks("acme");

        BackgroundTasks::stop_tasks(&manager, "acme").await.unwrap();
        assert!(!manager.is_running("acme"));
    }
}
