//! Tenant-Scoped Messaging for Atrium
//!
//! In-process pub/sub where every subscription belongs to one tenant's
//! shell. When the shell host recycles or removes a tenant, it detaches
//! that tenant's subscriptions through the [`atrium_shell::BrokerSubscriptions`]
//! contract — other tenants keep theirs.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use atrium_broker::*;
//!
//! let broker = Broker::new();
//! broker.subscribe::<EntityUpdated, _>("acme", UpdateHandler::new());
//! broker.publish("acme", EntityUpdated::new(entity)).await?;
//!
//! // Tearing down "acme" leaves every other tenant's handlers attached
//! broker.dispose_tenant("acme");
//! ```

pub mod broker;
pub mod message;

pub use broker::{Broker, BrokerError};
pub use message::{
    DynMessageHandler, Message, MessageHandler, MessageHandlerError, MessageMetadata,
    TypedMessageHandler,
};
