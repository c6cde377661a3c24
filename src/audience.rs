//! Audience scoping for tree reads
//!
//! Nodes may declare a minimum audience. A tree read for a given audience only
//! includes nodes that audience is allowed to see.

use crate::tree::node::Node;
use crate::types::NodeId;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

/// Who is reading the tree. Ordered from least to most privileged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Audience {
    Guest,
    Member,
    Admin,
}

impl Audience {
    pub fn as_str(&self) -> &'static str {
        match self {
            Audience::Guest => "guest",
            Audience::Member => "member",
            Audience::Admin => "admin",
        }
    }

    /// Check whether this audience may see the given node
    pub fn can_see(&self, node: &Node) -> bool {
        match node.required_role {
            Some(required) => *self >= required,
            None => true,
        }
    }

    /// Keep only the nodes visible to this audience, preserving input order
    ///
    /// A node is dropped when it or any ancestor present in `nodes` is hidden.
    /// Parents missing from `nodes` are left for the tree builder's orphan policy.
    pub fn filter(&self, nodes: Vec<Node>) -> Vec<Node> {
        let hidden: HashSet<NodeId> = nodes
            .iter()
            .filter(|n| !self.can_see(n))
            .map(|n| n.id)
            .collect();
        if hidden.is_empty() {
            return nodes;
        }

        let parents: HashMap<NodeId, Option<NodeId>> =
            nodes.iter().map(|n| (n.id, n.parent_id)).collect();
        let mut visible: HashMap<NodeId, bool> = HashMap::with_capacity(nodes.len());

        for node in &nodes {
            let mut chain = Vec::new();
            let mut on_chain = HashSet::new();
            let mut current = Some(node.id);
            let verdict = loop {
                let Some(id) = current else { break true };
                if let Some(known) = visible.get(&id) {
                    break *known;
                }
                if hidden.contains(&id) {
                    break false;
                }
                // Missing parent or a looping chain: the builder decides
                let Some(parent) = parents.get(&id) else { break true };
                if !on_chain.insert(id) {
                    break true;
                }
                chain.push(id);
                current = *parent;
            };
            for id in chain {
                visible.insert(id, verdict);
            }
        }

        nodes
            .into_iter()
            .filter(|n| visible.get(&n.id).copied().unwrap_or(false))
            .collect()
    }
}

impl fmt::Display for Audience {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Audience {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "guest" => Ok(Audience::Guest),
            "member" | "user" => Ok(Audience::Member),
            "admin" => Ok(Audience::Admin),
            other => Err(format!(
                "Invalid audience: {} (must be 'guest', 'member', or 'admin')",
                other
            )),
        }
    }
}
