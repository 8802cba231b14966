//! Cluster membership model for the management service.
//!
//! This crate provides:
//! - Node identity and member types (`NodeId`, `ClusterMember`, `MemberStatus`)
//! - Immutable membership snapshots and the raw engine view they are built from
//! - The `MembershipEngine` contract the external cluster engine implements
//! - Quorum-based curation of the unreachable set
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod curation;
pub mod engine;
pub mod error;
pub mod member;
pub mod node_id;
pub mod snapshot;

pub use curation::{AnyIndependentWitness, CappedMajority, QuorumRule, UnreachabilityCurator};
pub use engine::{MembershipEngine, ShardRegionStats, ShardStats};
pub use error::{MembershipEngineError, MembershipEngineErrorKind, NodeIdError};
pub use member::{ClusterMember, MemberStatus};
pub use node_id::NodeId;
pub use snapshot::{MembershipSnapshot, MembershipView, UnreachableObservation};
