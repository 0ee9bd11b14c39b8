//! Running Shell Table
//!
//! Maps incoming request host/path pairs to the tenant that should serve
//! them. The shell host keeps this table in sync as shells are activated
//! and disposed; request dispatch itself happens elsewhere.

use crate::settings::ShellSettings;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Registry of request routing info for active tenant shells.
pub trait RunningShellTable: Send + Sync {
    /// Register a tenant's routing info.
    fn add(&self, settings: &ShellSettings);

    /// Remove a tenant's routing info. Removing an absent tenant is a no-op.
    fn remove(&self, settings: &ShellSettings);

    /// Resolve the tenant for a request host and path.
    fn match_request(&self, host: &str, path: &str) -> Option<ShellSettings>;
}

/// In-memory running shell table.
///
/// Tenants are keyed by `(url_host, url_prefix)`. Matching tries the host
/// plus the first path segment, then the host alone, then a prefix-only
/// entry, and finally falls back to the default tenant (one registered with
/// neither host nor prefix).
#[derive(Debug, Default)]
pub struct InMemoryRunningShellTable {
    shells: RwLock<HashMap<(String, String), ShellSettings>>,
}

impl InMemoryRunningShellTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered tenants
    pub fn len(&self) -> usize {
        self.shells.read().len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.shells.read().is_empty()
    }

    fn key(settings: &ShellSettings) -> (String, String) {
        (
            settings
                .url_host
                .as_deref()
                .unwrap_or("")
                .to_ascii_lowercase(),
            settings
                .url_prefix
                .as_deref()
                .unwrap_or("")
                .trim_matches('/')
                .to_ascii_lowercase(),
        )
    }

    fn first_segment(path: &str) -> String {
        path.trim_start_matches('/')
            .split('/')
            .next()
            .unwrap_or("")
            .to_ascii_lowercase()
    }
}

impl RunningShellTable for InMemoryRunningShellTable {
    fn add(&self, settings: &ShellSettings) {
        self.shells
            .write()
            .insert(Self::key(settings), settings.clone());
    }

    fn remove(&self, settings: &ShellSettings) {
        self.shells.write().remove(&Self::key(settings));
    }

    fn match_request(&self, host: &str, path: &str) -> Option<ShellSettings> {
        // Strip port, if any
        let host = host.split(':').next().unwrap_or(host).to_ascii_lowercase();
        let prefix = Self::first_segment(path);

        let shells = self.shells.read();
        shells
            .get(&(host.clone(), prefix.clone()))
            .or_else(|| shells.get(&(host, String::new())))
            .or_else(|| shells.get(&(String::new(), prefix)))
            .or_else(|| shells.get(&(String::new(), String::new())))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_by_host() {
        let table = InMemoryRunningShellTable::new();
        table.add(&ShellSettings::new("acme").with_url_host("acme.example.com"));

        let matched = table.match_request("acme.example.com", "/discuss").unwrap();
        assert_eq!(matched.name, "acme");
        assert!(table.match_request("other.example.com", "/").is_none());
    }

    #[test]
    fn test_match_strips_port_and_case() {
        let table = InMemoryRunningShellTable::new();
        table.add(&ShellSettings::new("acme").with_url_host("Acme.Example.com"));

        assert!(table.match_request("acme.example.com:8080", "/").is_some());
    }

    #[test]
    fn test_match_by_prefix() {
        let table = InMemoryRunningShellTable::new();
        table.add(&ShellSettings::new("beta").with_url_prefix("beta"));

        let matched = table.match_request("example.com", "/beta/articles").unwrap();
        assert_eq!(matched.name, "beta");
    }

    #[test]
    fn test_host_and_prefix_beats_host_alone() {
        let table = InMemoryRunningShellTable::new();
        table.add(&ShellSettings::new("root").with_url_host("example.com"));
        table.add(
            &ShellSettings::new("beta")
                .with_url_host("example.com")
                .with_url_prefix("beta"),
        );

        assert_eq!(
            table.match_request("example.com", "/beta/x").unwrap().name,
            "beta"
        );
        assert_eq!(table.match_request("example.com", "/").unwrap().name, "root");
    }

    #[test]
    fn test_default_tenant_fallback() {
        let table = InMemoryRunningShellTable::new();
        table.add(&ShellSettings::new("Default"));
        table.add(&ShellSettings::new("acme").with_url_host("acme.example.com"));

        let matched = table.match_request("unknown.example.com", "/x").unwrap();
        assert_eq!(matched.name, "Default");
    }

    #[test]
    fn test_remove_is_idempotent() {
        let table = InMemoryRunningShellTable::new();
        let settings = ShellSettings::new("acme").with_url_host("acme.example.com");

        table.add(&settings);
        table.remove(&settings);
        table.remove(&settings);

        assert!(table.is_empty());
        assert!(table.match_request("acme.example.com", "/").is_none());
    }
}
