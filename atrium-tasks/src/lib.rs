//! Tenant-Scoped Background Tasks for Atrium
//!
//! Recurring per-tenant work (indexing, cleanup, digests) that starts when a
//! tenant's shell comes up and stops when the shell host tears the tenant
//! down via the [`atrium_shell::BackgroundTasks`] contract. Stopping one
//! tenant's tasks never touches another's.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use atrium_tasks::*;
//! use std::sync::Arc;
//!
//! let manager = TaskManager::new();
//! manager.register("acme", Arc::new(SearchIndexTask::new(index)));
//! manager.start_tasks("acme");
//!
//! // Later, on recycle or removal:
//! manager.stop_tenant("acme");
//! ```

pub mod manager;
pub mod task;

pub use manager::TaskManager;
pub use task::{BackgroundTask, TaskError, TaskResult};
