//! Immutable reads of the engine's membership state.
//!
//! A [`MembershipView`] is what the engine hands back raw. A
//! [`MembershipSnapshot`] is the normalised value the rest of the system works
//! with: members unique by address, one observation per accused node, no
//! self-accusations, `leader` and `oldest` only ever pointing at a current member.

use std::cmp::Ordering;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{ClusterMember, NodeId};

/// A node reported unreachable and the members that reported it.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnreachableObservation {
    /// The accused node.
    pub node: NodeId,

    /// Members that independently flagged `node` as unreachable.
    #[serde(default)]
    pub observed_by: Vec<NodeId>,
}

impl UnreachableObservation {
    /// Create an observation.
    pub fn new(node: NodeId, observed_by: impl IntoIterator<Item = NodeId>) -> Self {
        Self {
            node,
            observed_by: observed_by.into_iter().collect(),
        }
    }
}

/// Raw state as read from the engine, before normalisation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MembershipView {
    /// The node this engine runs on.
    pub self_node: NodeId,

    /// Members in engine iteration order.
    pub members: Vec<ClusterMember>,

    /// Reachability table, grouped by accused node.
    pub unreachable: Vec<UnreachableObservation>,

    /// Current leader, if one has been elected.
    pub leader: Option<NodeId>,
}

/// Normalised, immutable membership snapshot.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipSnapshot {
    /// The node that produced the snapshot.
    pub self_node: NodeId,

    /// Members, unique by address, in insertion order.
    #[serde(default)]
    pub members: Vec<ClusterMember>,

    /// Raw unreachable observations.
    #[serde(default)]
    pub unreachable: Vec<UnreachableObservation>,

    /// Current leader.
    #[serde(default)]
    pub leader: Option<NodeId>,

    /// Oldest member with status `Up`.
    #[serde(default)]
    pub oldest: Option<NodeId>,
}

impl MembershipSnapshot {
    /// Build a snapshot from a raw engine view.
    ///
    /// `age_ordering` returns `Ordering::Less` when its first argument is older.
    /// Among `Up` members the first one encountered wins unless a later one is
    /// strictly older.
    pub fn from_view<F>(view: MembershipView, age_ordering: F) -> Self
    where
        F: Fn(&ClusterMember, &ClusterMember) -> Ordering,
    {
        let MembershipView {
            self_node,
            members: raw_members,
            unreachable: raw_unreachable,
            leader,
        } = view;

        let mut seen = HashSet::new();
        let members: Vec<ClusterMember> = raw_members
            .into_iter()
            .filter(|member| seen.insert(member.node.clone()))
            .collect();

        let mut unreachable: Vec<UnreachableObservation> = Vec::new();
        for UnreachableObservation { node, observed_by } in raw_unreachable {
            let observed_by = observed_by.into_iter().filter(|observer| *observer != node);

            match unreachable.iter_mut().find(|existing| existing.node == node) {
                Some(existing) => {
                    for observer in observed_by {
                        if !existing.observed_by.contains(&observer) {
                            existing.observed_by.push(observer);
                        }
                    }
                }
                None => {
                    let mut deduped = Vec::new();
                    for observer in observed_by {
                        if !deduped.contains(&observer) {
                            deduped.push(observer);
                        }
                    }
                    unreachable.push(UnreachableObservation {
                        node,
                        observed_by: deduped,
                    });
                }
            }
        }

        let leader = leader.filter(|leader| {
            let known = members.iter().any(|member| member.node == *leader);
            if !known {
                debug!("dropping leader {} which is not a current member", leader);
            }
            known
        });

        let oldest = oldest_up_member(&members, age_ordering).map(|member| member.node.clone());

        Self {
            self_node,
            members,
            unreachable,
            leader,
            oldest,
        }
    }

    /// Look up a member by exact address.
    #[must_use]
    pub fn member(&self, node: &NodeId) -> Option<&ClusterMember> {
        self.members.iter().find(|member| member.node == *node)
    }

    /// Whether `node` is a current member.
    #[must_use]
    pub fn contains(&self, node: &NodeId) -> bool {
        self.member(node).is_some()
    }

    /// Nodes appearing in the raw unreachable table, in table order.
    #[must_use]
    pub fn raw_unreachable(&self) -> Vec<NodeId> {
        let mut seen = HashSet::new();
        self.unreachable
            .iter()
            .filter(|observation| seen.insert(&observation.node))
            .map(|observation| observation.node.clone())
            .collect()
    }
}

fn oldest_up_member<F>(members: &[ClusterMember], age_ordering: F) -> Option<&ClusterMember>
where
    F: Fn(&ClusterMember, &ClusterMember) -> Ordering,
{
    members
        .iter()
        .filter(|member| member.is_up())
        .fold(None, |oldest, candidate| match oldest {
            Some(current) if age_ordering(candidate, current) != Ordering::Less => Some(current),
            _ => Some(candidate),
        })
}
