//! Plain-text tables for terminal output.

use std::collections::HashSet;

use cluster_mgmt_membership::{ClusterMember, MembershipSnapshot, NodeId, ShardRegionStats};

const COLUMN_PADDING: usize = 2;

/// Printed by `unreachable` when nothing is reported.
pub const ALL_UP_MESSAGE: &str = "All nodes seem to be Up";

/// Left-aligned columns separated by padding. No borders.
#[derive(Debug)]
pub struct Table {
    headings: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Create a table with `headings`.
    pub fn new<I, S>(headings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headings: headings.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row. Missing cells render empty, extra cells are dropped.
    pub fn add_row<I, S>(&mut self, row: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut row: Vec<String> = row.into_iter().map(Into::into).collect();
        row.resize(self.headings.len(), String::new());
        self.rows.push(row);
    }

    /// Render with a trailing newline on every line.
    #[must_use]
    pub fn render(&self) -> String {
        let widths: Vec<usize> = (0..self.headings.len())
            .map(|column| {
                self.rows
                    .iter()
                    .map(|row| row[column].chars().count())
                    .chain(std::iter::once(self.headings[column].chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        std::iter::once(&self.headings)
            .chain(&self.rows)
            .map(|row| {
                let line: String = row
                    .iter()
                    .zip(&widths)
                    .map(|(cell, width)| format!("{cell:<pad$}", pad = width + COLUMN_PADDING))
                    .collect();
                format!("{}\n", line.trim_end())
            })
            .collect()
    }
}

fn roles(member: &ClusterMember) -> String {
    member
        .roles
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// `members`: one NODE column.
#[must_use]
pub fn members_table(snapshot: &MembershipSnapshot) -> String {
    let mut table = Table::new(["NODE"]);
    for member in &snapshot.members {
        table.add_row([member.node.as_str()]);
    }
    table.render()
}

/// `member-status`: NODE, STATUS and ROLES of one member.
#[must_use]
pub fn member_table(member: &ClusterMember) -> String {
    let mut table = Table::new(["NODE", "STATUS", "ROLES"]);
    table.add_row([
        member.node.to_string(),
        member.status.to_string(),
        roles(member),
    ]);
    table.render()
}

/// `cluster-status`: every member, with `Unreachable` standing in for the
/// status of nodes in `unreachable` and a marker on the leader.
#[must_use]
pub fn cluster_status_table(snapshot: &MembershipSnapshot, unreachable: &[NodeId]) -> String {
    let unreachable: HashSet<&NodeId> = unreachable.iter().collect();

    let mut table = Table::new(["NODE", "STATUS", "ROLES", ""]);
    for member in &snapshot.members {
        let status = if unreachable.contains(&member.node) {
            "Unreachable".to_string()
        } else {
            member.status.to_string()
        };
        let leader = if snapshot.leader.as_ref() == Some(&member.node) {
            "(leader)"
        } else {
            ""
        };

        table.add_row([member.node.to_string(), status, roles(member), leader.to_string()]);
    }
    table.render()
}

/// `shards`: SHARD and ENTITIES per shard.
#[must_use]
pub fn shards_table(stats: &ShardRegionStats) -> String {
    let mut table = Table::new(["SHARD", "ENTITIES"]);
    for shard in &stats.shards {
        table.add_row([shard.shard_id.clone(), shard.entity_count.to_string()]);
    }
    table.render()
}

/// `unreachable`: the listed nodes, or [`ALL_UP_MESSAGE`].
#[must_use]
pub fn unreachable_table(unreachable: &[NodeId]) -> String {
    if unreachable.is_empty() {
        return format!("{ALL_UP_MESSAGE}\n");
    }

    let mut table = Table::new(["NODE"]);
    for node in unreachable {
        table.add_row([node.as_str()]);
    }
    table.render()
}
