//! Configuration types for zonesync
//!
//! This module defines all configuration structures used throughout the crate.

use crate::record::CanonicalRecord;
use serde::{Deserialize, Serialize};

/// Main zonesync configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneSyncConfig {
    /// DNS provider configuration
    pub provider: ProviderConfig,

    /// Zones to reconcile
    pub zones: Vec<ZoneConfig>,

    /// Optional engine settings
    #[serde(default)]
    pub engine: EngineConfig,
}

impl ZoneSyncConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self {
            provider: ProviderConfig::default(),
            zones: Vec::new(),
            engine: EngineConfig::default(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.zones.is_empty() {
            return Err(crate::Error::config("No zones configured"));
        }

        self.provider.validate()?;
        for zone in &self.zones {
            zone.validate()?;
        }
        self.engine.validate()?;

        Ok(())
    }
}

impl Default for ZoneSyncConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// DNS provider configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// BinaryLane provider
    #[serde(rename = "binarylane")]
    BinaryLane {
        /// BinaryLane API token
        api_token: String,
        /// API base URL override (defaults to the public v2 endpoint)
        #[serde(default)]
        base_url: Option<String>,
        /// Minimum TTL override
        #[serde(default)]
        min_ttl: Option<u32>,
        /// Default nameserver suffix override
        #[serde(default)]
        nameserver_suffix: Option<String>,
    },

    /// Custom provider
    Custom {
        /// Provider name
        name: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl ProviderConfig {
    /// Validate the provider configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            ProviderConfig::BinaryLane {
                api_token,
                base_url,
                ..
            } => {
                if api_token.is_empty() {
                    return Err(crate::Error::config("BinaryLane API token cannot be empty"));
                }
                if let Some(url) = base_url
                    && !url.starts_with("https://")
                    && !url.starts_with("http://")
                {
                    return Err(crate::Error::config(format!(
                        "BinaryLane base URL must use HTTP or HTTPS scheme. Got: {}",
                        url
                    )));
                }
                Ok(())
            }
            ProviderConfig::Custom { name, config } => {
                if name.is_empty() {
                    return Err(crate::Error::config("Custom provider name cannot be empty"));
                }
                if config.is_null() {
                    return Err(crate::Error::config("Custom provider config cannot be null"));
                }
                Ok(())
            }
        }
    }

    /// Get the provider type name
    pub fn type_name(&self) -> &str {
        match self {
            ProviderConfig::BinaryLane { .. } => "binarylane",
            ProviderConfig::Custom { name, .. } => name,
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig::BinaryLane {
            api_token: String::new(),
            base_url: None,
            min_ttl: None,
            nameserver_suffix: None,
        }
    }
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderConfig::BinaryLane {
                base_url,
                min_ttl,
                nameserver_suffix,
                ..
            } => f
                .debug_struct("BinaryLane")
                .field("api_token", &"<REDACTED>")
                .field("base_url", base_url)
                .field("min_ttl", min_ttl)
                .field("nameserver_suffix", nameserver_suffix)
                .finish(),
            ProviderConfig::Custom { name, .. } => f
                .debug_struct("Custom")
                .field("name", name)
                .finish_non_exhaustive(),
        }
    }
}

/// Desired state of one zone
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneConfig {
    /// Zone name (e.g., "example.com")
    pub name: String,

    /// Desired records
    #[serde(default)]
    pub records: Vec<CanonicalRecord>,
}

impl ZoneConfig {
    /// Create a zone configuration
    pub fn new(name: impl Into<String>, records: Vec<CanonicalRecord>) -> Self {
        Self {
            name: name.into(),
            records,
        }
    }

    /// Validate the zone configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.name.trim().is_empty() {
            return Err(crate::Error::config("Zone name cannot be empty"));
        }
        if self.name.len() > 253 {
            return Err(crate::Error::config(format!(
                "Zone name too long: {} chars (max 253)",
                self.name.len()
            )));
        }
        Ok(())
    }

    /// Desired records with labels and owner names normalized to this zone
    pub fn desired_records(&self) -> Vec<CanonicalRecord> {
        self.records
            .iter()
            .cloned()
            .map(|record| record.qualify(&self.name))
            .collect()
    }
}

/// What to do when a correction fails during apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionPolicy {
    /// Keep executing the remaining corrections
    #[default]
    ContinueOnError,
    /// Stop at the first failed correction
    AbortOnFirstError,
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Plan only, never execute corrections
    #[serde(default)]
    pub dry_run: bool,

    /// Behaviour when a correction fails
    #[serde(default)]
    pub execution_policy: ExecutionPolicy,

    /// Emit a report line for every unchanged record group
    #[serde(default)]
    pub report_unchanged: bool,

    /// Capacity of the internal event channel
    ///
    /// When full, new events will be dropped (with a warning log).
    ///
    /// Default: 1000 events
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl EngineConfig {
    /// Validate the engine configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            dry_run: false,
            execution_policy: ExecutionPolicy::default(),
            report_unchanged: false,
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn default_event_channel_capacity() -> usize {
    1000
}
