//! Tenant-scoped broker implementation

use crate::message::{DynMessageHandler, Message, MessageHandler, MessageHandlerError, TypedMessageHandler};
use async_trait::async_trait;
use dashmap::DashMap;
use std::any::TypeId;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

type HandlerSet = DashMap<TypeId, Vec<Arc<dyn DynMessageHandler>>>;

/// In-process message broker with tenant-scoped subscriptions.
///
/// Every subscription belongs to one tenant; disposing a tenant detaches
/// that tenant's handlers and nothing else, so recycling one shell never
/// severs another shell's subscriptions.
#[derive(Clone, Default)]
pub struct Broker {
    /// Handlers per tenant, keyed by message type within each tenant
    tenants: Arc<DashMap<String, Arc<HandlerSet>>>,
}

impl Broker {
    /// Create a new broker
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe a handler to a message type within a tenant's scope
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let broker = Broker::new();
    /// broker.subscribe::<EntityUpdated, _>("acme", UpdateHandler::new());
    /// ```
    pub fn subscribe<M, H>(&self, tenant: &str, handler: H)
    where
        M: Message,
        H: MessageHandler<M> + 'static,
    {
        let handlers = self
            .tenants
            .entry(tenant.to_owned())
            .or_default()
            .clone();
        handlers
            .entry(TypeId::of::<M>())
            .or_default()
            .push(Arc::new(TypedMessageHandler::new(handler)));

        debug!(
            "Subscribed handler for {} in tenant {}",
            std::any::type_name::<M>(),
            tenant
        );
    }

    /// Publish a message within a tenant's scope
    ///
    /// All handlers the tenant registered for this message type are invoked
    /// concurrently; handler failures are logged and collected, and the
    /// remaining handlers still run.
    pub async fn publish<M: Message>(&self, tenant: &str, message: M) -> Result<(), BrokerError> {
        let handlers = match self.tenants.get(tenant) {
            Some(set) => match set.get(&TypeId::of::<M>()) {
                Some(handlers) => handlers.clone(),
                None => {
                    warn!(
                        "No handlers for message {} in tenant {}",
                        message.message_name(),
                        tenant
                    );
                    return Ok(());
                }
            },
            None => {
                warn!("No subscriptions for tenant {}", tenant);
                return Ok(());
            }
        };

        debug!(
            "Publishing {} (id: {}) to {} handler(s) in tenant {}",
            message.message_name(),
            message.message_id(),
            handlers.len(),
            tenant
        );

        let message: Arc<dyn Message> = Arc::new(message);
        let mut tasks = Vec::new();
        for handler in handlers {
            let message = message.clone();
            tasks.push(tokio::spawn(async move {
                handler.handle_dyn(message.as_ref()).await
            }));
        }

        let mut errors = Vec::new();
        for task in tasks {
            match task.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    error!("Handler failed: {}", e);
                    errors.push(e);
                }
                Err(e) => {
                    error!("Handler task panicked: {}", e);
                    errors.push(MessageHandlerError::HandlerFailed(e.to_string()));
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(BrokerError::HandlersFailed(errors))
        }
    }

    /// Detach every subscription registered for a tenant. Idempotent.
    pub fn dispose_tenant(&self, tenant: &str) {
        if self.tenants.remove(tenant).is_some() {
            debug!("Disposed subscriptions for tenant {}", tenant);
        }
    }

    /// Detach all subscriptions for all tenants
    pub fn clear(&self) {
        self.tenants.clear();
        info!("Cleared all broker subscriptions");
    }

    /// Number of handlers a tenant has for a message type
    pub fn handler_count<M: Message>(&self, tenant: &str) -> usize {
        self.tenants
            .get(tenant)
            .and_then(|set| set.get(&TypeId::of::<M>()).map(|h| h.len()))
            .unwrap_or(0)
    }

    /// Whether a tenant has any subscriptions
    pub fn has_subscriptions(&self, tenant: &str) -> bool {
        self.tenants.contains_key(tenant)
    }
}

#[async_trait]
impl atrium_shell::BrokerSubscriptions for Broker {
    async fn dispose(&self, tenant: &str) -> Result<(), atrium_shell::ShellError> {
        self.dispose_tenant(tenant);
        Ok(())
    }
}

/// Broker errors
#[derive(Debug, thiserror::Error)]
pub enum BrokerError {
    #[error("One or more handlers failed")]
    HandlersFailed(Vec<MessageHandlerError>),

    #[error("Publish failed: {0}")]
    PublishFailed(String),
}
