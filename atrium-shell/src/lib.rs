//! Tenant Shell Lifecycle for Atrium
//!
//! One process, many tenants: each tenant is described by persisted
//! [`ShellSettings`] and served by a lazily created, disposable
//! [`ShellContext`]. The [`ShellHost`] is the single authority for that
//! lifecycle — it guarantees exactly one live context per tenant, bootstraps
//! all tenants at startup, and coordinates safe recycling when a tenant's
//! settings change.
//!
//! # Features
//!
//! - 🏢 **One live context per tenant** - per-key create-once registry
//! - 🚀 **Lazy bootstrap** - double-checked, runs exactly once
//! - 🔄 **Recycling** - dispose-then-recreate on settings changes
//! - 🗺️ **Running shell table** - host/prefix → tenant routing registry
//! - 🧹 **Tenant-scoped teardown** - broker and background-task contracts
//! - 💾 **Settings stores** - in-memory and JSON-file-per-tenant
//!
//! # Quick Start
//!
//! ```rust
//! use atrium_shell::*;
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let store = Arc::new(InMemoryShellSettingsStore::with_tenants([
//!     ShellSettings::new("acme").with_state(TenantState::Running),
//! ]));
//!
//! let host = ShellHost::with_stores(
//!     store,
//!     Arc::new(DefaultShellContextFactory),
//!     Arc::new(InMemoryRunningShellTable::new()),
//! );
//!
//! host.initialize().await.unwrap();
//! assert!(host.get("acme").is_some());
//! # }
//! ```

pub mod context;
pub mod error;
pub mod host;
pub mod settings;
pub mod store;
pub mod table;

pub use context::{DefaultShellContextFactory, ShellContext, ShellContextFactory};
pub use error::{Result, ShellError};
pub use host::{
    BackgroundTasks, BrokerSubscriptions, NoOpBackgroundTasks, NoOpBrokerSubscriptions, ShellHost,
};
pub use settings::{DEFAULT_TENANT_NAME, ShellSettings, TenantState};
pub use store::{FileShellSettingsStore, InMemoryShellSettingsStore, ShellSettingsStore};
pub use table::{InMemoryRunningShellTable, RunningShellTable};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::context::{DefaultShellContextFactory, ShellContext, ShellContextFactory};
    pub use crate::error::ShellError;
    pub use crate::host::{BackgroundTasks, BrokerSubscriptions, ShellHost};
    pub use crate::settings::{ShellSettings, TenantState};
    pub use crate::store::{FileShellSettingsStore, InMemoryShellSettingsStore, ShellSettingsStore};
    pub use crate::table::{InMemoryRunningShellTable, RunningShellTable};
}
