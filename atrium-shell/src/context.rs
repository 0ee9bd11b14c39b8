//! Shell Context
//!
//! The live runtime unit for one tenant. A context owns the tenant-scoped
//! services its requests need; disposing it releases them.

use crate::error::ShellError;
use crate::settings::ShellSettings;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::any::{Any, TypeId};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;

/// The live runtime unit serving one tenant's requests.
///
/// There is at most one live context per tenant name at any time; the shell
/// host enforces that. Each context carries a unique instance id so callers
/// can tell one generation apart from the next after a recycle.
#[derive(Debug)]
pub struct ShellContext {
    settings: ShellSettings,
    id: Uuid,
    created_at: DateTime<Utc>,
    services: DashMap<TypeId, Arc<dyn Any + Send + Sync>>,
    disposed: AtomicBool,
}

impl ShellContext {
    /// Create a context for the given tenant settings.
    pub fn new(settings: ShellSettings) -> Self {
        Self {
            settings,
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            services: DashMap::new(),
            disposed: AtomicBool::new(false),
        }
    }

    /// The tenant settings this context was built from.
    pub fn settings(&self) -> &ShellSettings {
        &self.settings
    }

    /// Tenant name shortcut.
    pub fn tenant_name(&self) -> &str {
        &self.settings.name
    }

    /// Unique id of this context instance (changes on every recycle).
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// When this context was created.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Register a tenant-scoped service.
    pub fn insert_service<T: Any + Send + Sync>(&self, service: Arc<T>) {
        self.services.insert(TypeId::of::<T>(), service);
    }

    /// Look up a tenant-scoped service by type.
    pub fn service<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.services
            .get(&TypeId::of::<T>())
            .and_then(|s| s.clone().downcast::<T>().ok())
    }

    /// Whether this context has been disposed.
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Release everything the tenant's scope owns. Idempotent.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.services.clear();
    }
}

/// Builds fully usable shell contexts.
///
/// Implementations must return an already-initialized context or fail;
/// never a partially built one.
#[async_trait]
pub trait ShellContextFactory: Send + Sync {
    /// Create a context for an initialized tenant.
    async fn create_shell_context(
        &self,
        settings: &ShellSettings,
    ) -> Result<ShellContext, ShellError>;

    /// Create a setup context for a tenant that has not completed setup.
    async fn create_setup_context(
        &self,
        settings: &ShellSettings,
    ) -> Result<ShellContext, ShellError>;
}

/// Factory that builds plain contexts straight from settings.
///
/// Useful for embedding and tests; real hosts typically supply a factory
/// that wires tenant-scoped services into the context.
#[derive(Debug, Clone, Default)]
pub struct DefaultShellContextFactory;

#[async_trait]
impl ShellContextFactory for DefaultShellContextFactory {
    async fn create_shell_context(
        &self,
        settings: &ShellSettings,
    ) -> Result<ShellContext, ShellError> {
        Ok(ShellContext::new(settings.clone()))
    }

    async fn create_setup_context(
        &self,
        settings: &ShellSettings,
    ) -> Result<ShellContext, ShellError> {
        Ok(ShellContext::new(settings.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::TenantState;

    #[test]
    fn test_context_services() {
        let context = ShellContext::new(ShellSettings::new("acme"));
        context.insert_service(Arc::new(42u32));

        let value: Arc<u32> = context.service().unwrap();
        assert_eq!(*value, 42);
        assert!(context.service::<String>().is_none());
    }

    #[test]
    fn test_dispose_is_idempotent() {
        let context = ShellContext::new(ShellSettings::new("acme"));
        context.insert_service(Arc::new("state".to_string()));
        assert!(!context.is_disposed());

        context.dispose();
        context.dispose();

        assert!(context.is_disposed());
        assert!(context.service::<String>().is_none());
    }

    #[tokio::test]
    async fn test_default_factory() {
        let factory = DefaultShellContextFactory;
        let settings = ShellSettings::new("acme").with_state(TenantState::Running);

        let context = factory.create_shell_context(&settings).await.unwrap();
        assert_eq!(context.tenant_name(), "acme");
        assert!(!context.is_disposed());
    }

    #[test]
    fn test_instance_identity() {
        let a = ShellContext::new(ShellSettings::new("acme"));
        let b = ShellContext::new(ShellSettings::new("acme"));
        assert_ne!(a.id(), b.id());
    }
}
