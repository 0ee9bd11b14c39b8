// Atrium - a multi-tenant hosting shell for Rust services
//
// One process hosts many independently configured tenants. Each tenant is
// served by a lazily created, disposable shell context; the shell host is
// the single authority for that lifecycle.

// Re-export the shell core
pub use atrium_shell::*;

// Re-export optional crates
#[cfg(feature = "broker")]
pub use atrium_broker;

#[cfg(feature = "tasks")]
pub use atrium_tasks;

// Prelude for common imports
pub mod prelude {
    pub use atrium_shell::prelude::*;

    #[cfg(feature = "broker")]
    pub use atrium_broker::{Broker, Message, MessageHandler, MessageMetadata};

    #[cfg(feature = "tasks")]
    pub use atrium_tasks::{BackgroundTask, TaskManager};
}
