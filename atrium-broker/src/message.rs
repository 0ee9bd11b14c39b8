//! Message definitions and traits

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt::Debug;
use uuid::Uuid;

/// Message trait
///
/// All messages must implement this trait to be published through the broker.
pub trait Message: Send + Sync + Debug + 'static {
    /// Get message name
    fn message_name(&self) -> &str;

    /// Get message ID
    fn message_id(&self) -> Uuid;

    /// Get message timestamp
    fn timestamp(&self) -> DateTime<Utc>;

    /// Cast to Any for downcasting
    fn as_any(&self) -> &dyn Any;
}

/// Base message metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageMetadata {
    /// Unique message ID
    pub id: Uuid,

    /// Message name/type
    pub name: String,

    /// Timestamp when the message was created
    pub timestamp: DateTime<Utc>,
}

impl MessageMetadata {
    /// Create new message metadata
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Message handler trait
#[async_trait]
pub trait MessageHandler<M: Message>: Send + Sync {
    /// Handle the message
    async fn handle(&self, message: &M) -> Result<(), MessageHandlerError>;
}

/// Message handler error
#[derive(Debug, thiserror::Error)]
pub enum MessageHandlerError {
    #[error("Handler failed: {0}")]
    HandlerFailed(String),

    #[error("Message processing error: {0}")]
    ProcessingError(String),
}

/// Object-safe handler form used internally by the broker.
#[async_trait]
pub trait DynMessageHandler: Send + Sync {
    /// Handle a type-erased message
    async fn handle_dyn(&self, message: &dyn Message) -> Result<(), MessageHandlerError>;
}

/// Adapter from a typed handler to the object-safe form.
pub struct TypedMessageHandler<M: Message, H: MessageHandler<M>> {
    handler: H,
    _marker: std::marker::PhantomData<fn(M)>,
}

impl<M: Message, H: MessageHandler<M>> TypedMessageHandler<M, H> {
    /// Wrap a typed handler
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            _marker: std::marker::PhantomData,
        }
    }
}

#[async_trait]
impl<M: Message, H: MessageHandler<M>> DynMessageHandler for TypedMessageHandler<M, H> {
    async fn handle_dyn(&self, message: &dyn Message) -> Result<(), MessageHandlerError> {
        let message = message.as_any().downcast_ref::<M>().ok_or_else(|| {
            MessageHandlerError::ProcessingError(format!(
                "Unexpected message type for '{}'",
                message.message_name()
            ))
        })?;
        self.handler.handle(message).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone)]
    struct Ping {
        metadata: MessageMetadata,
    }

    impl Message for Ping {
        fn message_name(&self) -> &str {
            &self.metadata.name
        }

        fn message_id(&self) -> Uuid {
            self.metadata.id
        }

        fn timestamp(&self) -> DateTime<Utc> {
            self.metadata.timestamp
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    struct PingHandler;

    #[async_trait]
    impl MessageHandler<Ping> for PingHandler {
        async fn handle(&self, _message: &Ping) -> Result<(), MessageHandlerError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_typed_handler_dispatch() {
        let handler = TypedMessageHandler::new(PingHandler);
        let ping = Ping {
            metadata: MessageMetadata::new("ping"),
        };
        handler.handle_dyn(&ping).await.unwrap();
    }

    #[test]
    fn test_metadata() {
        let a = MessageMetadata::new("ping");
        let b = MessageMetadata::new("ping");
        assert_eq!(a.name, "ping");
        assert_ne!(a.id, b.id);
    }
}
