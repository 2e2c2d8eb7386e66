//! # mqfleet topology
//!
//! Keeps the broker topology of a message broker fleet in the versioned profile store.
//!
//! ## Core Responsibilities
//!
//! - **Translation**: maps a flat [`BrokerConfig`](mqfleet_core::BrokerConfig) to the
//!   broker section of its profile and back
//! - **Reconciliation**: ratchets per-profile minimum instance counts and discovers the
//!   profiles that define managed brokers
//! - **Provisioning**: builds node plans through scheme-specific providers and assigns
//!   profiles to existing nodes
//!
//! ## Architecture
//!
//! [`TopologyService`] is the entry point. Loading discovers the managed broker profiles
//! and reads each back through the [`ConfigTranslator`]. Applying works entry by entry:
//! 1. Translates the description into a broker section
//! 2. Merges the section into the broker profile, creating it if needed
//! 3. Raises the profile's minimum instance requirement when the description asks for more
//!
//! Batch operations report per-entry failures in a [`BatchOutcome`] instead of aborting.

pub mod ensemble;
pub mod errors;
pub mod planner;
pub mod provider;
pub mod reconciler;
pub mod resolver;
pub mod resources;
pub mod service;
pub mod store;
pub mod translator;

// Re-export main types
pub use ensemble::{EnsembleLocator, StaticEnsemble};
pub use errors::{BatchOutcome, ItemError, Result, TopologyError};
pub use planner::ProvisioningPlanner;
pub use provider::{ChildNodeSupport, ConfiguredProvider, NodeProvider, ProviderRegistry};
pub use reconciler::{discover_managed_profiles, ratchet_minimum};
pub use resolver::{ConfigResolver, VersionedConfigResolver};
pub use resources::MetadataProfileStore;
pub use service::TopologyService;
pub use store::ProfileStore;
pub use translator::{ConfigTranslator, BROKER_SECTION_PREFIX};
