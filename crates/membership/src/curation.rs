//! Quorum-based curation of the unreachable set.
//!
//! The engine's reachability table can over-report: nodes cut off in a
//! minority partition accuse each other while the reachable majority sees
//! none of them as down. Curation keeps only accusations corroborated by
//! enough observers that are not themselves flagged unreachable.
//!
//! The threshold rule is pluggable through [`QuorumRule`]. Whatever the rule,
//! clusters of two members or fewer skip curation entirely: no independent
//! quorum is possible there, so the raw set is trusted as-is.

use std::collections::HashSet;
use std::fmt::Debug;
use std::sync::Arc;

use crate::{MembershipSnapshot, NodeId, UnreachableObservation};

/// Member count at or below which every raw accusation is trusted.
pub const TRUST_RAW_MAX_MEMBERS: usize = 2;

/// Default cap on the number of independent witnesses required.
pub const DEFAULT_WITNESS_CAP: usize = 5;

/// Rule deciding how many independent witnesses an accusation needs.
pub trait QuorumRule: Debug + Send + Sync + 'static {
    /// Short name, used in logs.
    fn name(&self) -> &'static str;

    /// Required independent witnesses for a cluster of `member_count` members.
    ///
    /// Only called for clusters larger than [`TRUST_RAW_MAX_MEMBERS`].
    fn threshold(&self, member_count: usize) -> usize;
}

/// Majority of the membership, capped: `min(cap, N/2 + 1)`.
///
/// With the default cap of 5, a five-node cluster needs three independent
/// witnesses and anything from eight nodes up needs five.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CappedMajority {
    cap: usize,
}

impl CappedMajority {
    /// Create the rule with a witness cap. A cap of zero is raised to one.
    #[must_use]
    pub const fn new(cap: usize) -> Self {
        Self {
            cap: if cap == 0 { 1 } else { cap },
        }
    }

    /// The witness cap.
    #[must_use]
    pub const fn cap(&self) -> usize {
        self.cap
    }
}

impl Default for CappedMajority {
    fn default() -> Self {
        Self::new(DEFAULT_WITNESS_CAP)
    }
}

impl QuorumRule for CappedMajority {
    fn name(&self) -> &'static str {
        "capped-majority"
    }

    fn threshold(&self, member_count: usize) -> usize {
        self.cap.min(member_count / 2 + 1)
    }
}

/// A single independent witness is enough.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct AnyIndependentWitness;

impl QuorumRule for AnyIndependentWitness {
    fn name(&self) -> &'static str {
        "any-independent-witness"
    }

    fn threshold(&self, _member_count: usize) -> usize {
        1
    }
}

/// Reduces a raw unreachable set to corroborated accusations.
#[derive(Clone, Debug)]
pub struct UnreachabilityCurator {
    rule: Arc<dyn QuorumRule>,
}

impl Default for UnreachabilityCurator {
    fn default() -> Self {
        Self::new(CappedMajority::default())
    }
}

impl UnreachabilityCurator {
    /// Create a curator using `rule`.
    pub fn new(rule: impl QuorumRule) -> Self {
        Self {
            rule: Arc::new(rule),
        }
    }

    /// The active rule.
    #[must_use]
    pub fn rule(&self) -> &dyn QuorumRule {
        self.rule.as_ref()
    }

    /// Witnesses required for a cluster of `member_count` members.
    #[must_use]
    pub fn threshold(&self, member_count: usize) -> usize {
        if member_count <= TRUST_RAW_MAX_MEMBERS {
            0
        } else {
            self.rule.threshold(member_count)
        }
    }

    /// Corroborated unreachable nodes, in the order of `snapshot.unreachable`.
    ///
    /// The result is always a subset of the raw unreachable set.
    #[must_use]
    pub fn curate(&self, snapshot: &MembershipSnapshot) -> Vec<NodeId> {
        self.curate_observations(snapshot)
            .into_iter()
            .map(|observation| observation.node)
            .collect()
    }

    /// Like [`curate`](Self::curate) but keeps the full observations.
    #[must_use]
    pub fn curate_observations(
        &self,
        snapshot: &MembershipSnapshot,
    ) -> Vec<UnreachableObservation> {
        let raw: HashSet<&NodeId> = snapshot
            .unreachable
            .iter()
            .map(|observation| &observation.node)
            .collect();
        let threshold = self.threshold(snapshot.members.len());

        let mut seen = HashSet::new();
        snapshot
            .unreachable
            .iter()
            .filter(|observation| independent_count(observation, &raw) >= threshold)
            .filter(|observation| seen.insert(&observation.node))
            .cloned()
            .collect()
    }
}

/// Observers of `observation` that are not themselves in `raw`.
///
/// Duplicate observers count once.
#[must_use]
pub fn independent_count(observation: &UnreachableObservation, raw: &HashSet<&NodeId>) -> usize {
    observation
        .observed_by
        .iter()
        .filter(|observer| !raw.contains(observer))
        .collect::<HashSet<_>>()
        .len()
}
