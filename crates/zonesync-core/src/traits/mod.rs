//! Core traits for zonesync
//!
//! This module defines the abstract interfaces that all providers must follow.
//!
//! - [`DnsProvider`]: Load a zone, plan corrections, list zones and nameservers

pub mod dns_provider;

pub use dns_provider::DnsProvider;
