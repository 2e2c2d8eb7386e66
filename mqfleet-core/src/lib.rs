//! # mqfleet core
//!
//! Shared types of the broker fleet topology: the flat [`BrokerConfig`] an operator
//! edits, the versioned [`Profile`] it is stored as, the fleet-wide
//! [`FleetRequirements`], the [`ProvisioningPlan`] handed to node providers, and the
//! [`metadata`] store they all live in.

pub mod broker;
pub mod metadata;
pub mod plan;
pub mod profile;
pub mod requirements;

pub use broker::BrokerConfig;
pub use plan::{ChildCredentials, EnsembleConnection, ProvisioningPlan};
pub use profile::{Node, Profile, Section};
pub use requirements::{FleetRequirements, ProfileRequirement};
