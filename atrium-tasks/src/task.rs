//! Background task definition.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Task execution errors.
#[derive(Error, Debug)]
pub enum TaskError {
    #[error("Task failed: {0}")]
    ExecutionFailed(String),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Tenant has no registered tasks: {0}")]
    TenantNotFound(String),
}

pub type TaskResult<T> = std::result::Result<T, TaskError>;

/// A recurring unit of per-tenant background work.
///
/// The task manager runs `execute` once per `interval` for every tenant the
/// task is registered under, until the tenant's tasks are stopped.
#[async_trait]
pub trait BackgroundTask: Send + Sync {
    /// Task name, unique within a tenant
    fn name(&self) -> &str;

    /// How often the task runs
    fn interval(&self) -> Duration;

    /// Execute one tick of the task
    async fn execute(&self, tenant: &str) -> TaskResult<()>;
}
