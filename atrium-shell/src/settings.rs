//! Tenant Settings
//!
//! The persisted descriptor for a tenant: its name, connection details,
//! request-routing hints, and lifecycle state.

use serde::{Deserialize, Serialize};

/// Name of the bootstrap tenant created when no settings exist yet.
pub const DEFAULT_TENANT_NAME: &str = "Default";

/// Lifecycle state of a tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TenantState {
    /// Tenant exists but setup has not been completed
    #[default]
    Uninitialized,
    /// Tenant setup is in progress
    Initializing,
    /// Tenant is active and serving requests
    Running,
    /// Tenant is temporarily disabled
    Disabled,
    /// Tenant configuration is broken; never activated
    Invalid,
}

impl std::fmt::Display for TenantState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "uninitialized"),
            Self::Initializing => write!(f, "initializing"),
            Self::Running => write!(f, "running"),
            Self::Disabled => write!(f, "disabled"),
            Self::Invalid => write!(f, "invalid"),
        }
    }
}

/// Settings for a single tenant.
///
/// `name` is the unique key across the process; everything else describes
/// how the tenant's shell is built and routed to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShellSettings {
    /// Unique tenant name
    pub name: String,

    /// Storage location (directory or logical path) for tenant data
    pub location: Option<String>,

    /// Backing store connection string
    pub connection_string: Option<String>,

    /// Table prefix for shared-database isolation
    pub table_prefix: Option<String>,

    /// Host name requests for this tenant arrive on
    pub url_host: Option<String>,

    /// Leading URL path segment for this tenant
    pub url_prefix: Option<String>,

    /// Active theme
    pub theme: Option<String>,

    /// Lifecycle state
    pub state: TenantState,
}

impl ShellSettings {
    /// Create settings for a named tenant
    ///
    /// # Examples
    ///
    /// ```
    /// use atrium_shell::{ShellSettings, TenantState};
    ///
    /// let settings = ShellSettings::new("acme").with_state(TenantState::Running);
    /// assert_eq!(settings.name, "acme");
    /// ```
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            location: None,
            connection_string: None,
            table_prefix: None,
            url_host: None,
            url_prefix: None,
            theme: None,
            state: TenantState::Uninitialized,
        }
    }

    /// The descriptor used to bootstrap an installation with no tenants yet.
    pub fn default_uninitialized() -> Self {
        Self::new(DEFAULT_TENANT_NAME)
            .with_location(DEFAULT_TENANT_NAME)
            .with_state(TenantState::Uninitialized)
    }

    /// Set storage location
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Set connection string
    pub fn with_connection_string(mut self, connection_string: impl Into<String>) -> Self {
        self.connection_string = Some(connection_string.into());
        self
    }

    /// Set table prefix
    pub fn with_table_prefix(mut self, table_prefix: impl Into<String>) -> Self {
        self.table_prefix = Some(table_prefix.into());
        self
    }

    /// Set request host
    pub fn with_url_host(mut self, url_host: impl Into<String>) -> Self {
        self.url_host = Some(url_host.into());
        self
    }

    /// Set request path prefix
    pub fn with_url_prefix(mut self, url_prefix: impl Into<String>) -> Self {
        self.url_prefix = Some(url_prefix.into());
        self
    }

    /// Set theme
    pub fn with_theme(mut self, theme: impl Into<String>) -> Self {
        self.theme = Some(theme.into());
        self
    }

    /// Set lifecycle state
    pub fn with_state(mut self, state: TenantState) -> Self {
        self.state = state;
        self
    }

    /// Whether a shell may be created for this tenant during bootstrap.
    ///
    /// Every state is eligible except `Invalid`.
    pub fn can_create_shell(&self) -> bool {
        matches!(
            self.state,
            TenantState::Running
                | TenantState::Uninitialized
                | TenantState::Initializing
                | TenantState::Disabled
        )
    }
}
