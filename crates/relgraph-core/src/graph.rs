use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::Result;

// --- Graph output (ReactFlow node/edge shape) ---

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum NodeKind {
    Organisation,
    Account,
    Contact,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NodeData {
    pub label: String,
    /// Account nodes only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_number: Option<String>,
    /// Contact nodes only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Navigation target for account and contact nodes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    /// Set on account nodes only while a focus account is active
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_focus: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_subtle: Option<bool>,
}

/// A node in the graph. Matches ReactFlow's Node structure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(default)]
    pub position: Position,
    pub data: NodeData,
    /// Owning organisation node for accounts, owning account node for contacts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum EdgeShape {
    /// Organisation to account, account to contact
    Hierarchy,
    /// Account to account link
    Lateral,
}

/// An edge in the graph. Matches ReactFlow's Edge structure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GraphEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub shape: EdgeShape,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Graph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

#[derive(Debug, Clone, Copy, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GraphStats {
    pub organisations: usize,
    pub accounts: usize,
    pub contacts: usize,
    pub hierarchy_edges: usize,
    pub lateral_edges: usize,
}

impl Graph {
    /// Nothing to draw. Callers show an empty state instead of a blank canvas.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn nodes_of(&self, kind: NodeKind) -> impl Iterator<Item = &GraphNode> {
        self.nodes.iter().filter(move |n| n.kind == kind)
    }

    pub fn stats(&self) -> GraphStats {
        let mut stats = GraphStats::default();
        for node in &self.nodes {
            match node.kind {
                NodeKind::Organisation => stats.organisations += 1,
                NodeKind::Account => stats.accounts += 1,
                NodeKind::Contact => stats.contacts += 1,
            }
        }
        for edge in &self.edges {
            match edge.shape {
                EdgeShape::Hierarchy => stats.hierarchy_edges += 1,
                EdgeShape::Lateral => stats.lateral_edges += 1,
            }
        }
        stats
    }

    pub fn to_json(&self, pretty: bool) -> Result<String> {
        let json = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(json)
    }
}

// --- Identifiers ---

/// Escape one id component so it never contains the `-` joiner.
/// `%` and `-` become `%25` and `%2D`; every other character is kept.
fn escape_part(part: &str) -> String {
    let mut out = String::with_capacity(part.len());
    for ch in part.chars() {
        match ch {
            '%' => out.push_str("%25"),
            '-' => out.push_str("%2D"),
            other => out.push(other),
        }
    }
    out
}

fn join_id(prefix: &str, parts: &[&str]) -> String {
    let mut id = prefix.to_string();
    for part in parts {
        id.push('-');
        id.push_str(&escape_part(part));
    }
    id
}

pub fn organisation_node_id(organisation_id: &str) -> String {
    join_id("org", &[organisation_id])
}

pub fn account_node_id(account_id: &str) -> String {
    join_id("account", &[account_id])
}

/// Contact nodes are scoped to their account: the same contact under two
/// accounts is two nodes.
pub fn contact_node_id(account_id: &str, contact_id: &str) -> String {
    join_id("contact", &[account_id, contact_id])
}

/// Generate a hierarchy edge ID from source and target node IDs.
pub fn hierarchy_edge_id(source: &str, target: &str) -> String {
    join_id("edge", &[source, target])
}

/// Generate a lateral edge ID. Endpoint order does not matter.
pub fn lateral_edge_id(a: &str, b: &str) -> String {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    join_id("link", &[lo, hi])
}

/// Drop every edge whose unordered endpoint pair was already seen, whatever its
/// shape. First occurrence wins.
pub(crate) fn dedup_endpoint_pairs(edges: Vec<GraphEdge>) -> Vec<GraphEdge> {
    let mut seen: HashSet<(String, String)> = HashSet::new();
    edges
        .into_iter()
        .filter(|e| {
            let key = if e.source <= e.target {
                (e.source.clone(), e.target.clone())
            } else {
                (e.target.clone(), e.source.clone())
            };
            let fresh = seen.insert(key);
            if !fresh {
                tracing::trace!("dropping duplicate edge {} ({} - {})", e.id, e.source, e.target);
            }
            fresh
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(id: &str, source: &str, target: &str, shape: EdgeShape) -> GraphEdge {
        GraphEdge {
            id: id.to_string(),
            source: source.to_string(),
            target: target.to_string(),
            shape,
        }
    }

    #[test]
    fn lateral_edge_id_ignores_endpoint_order() {
        assert_eq!(
            lateral_edge_id("account-b", "account-a"),
            lateral_edge_id("account-a", "account-b")
        );
        assert_eq!(lateral_edge_id("account-b", "account-a"), "link-account%2Da-account%2Db");
    }

    #[test]
    fn hyphenated_ids_do_not_collide() {
        assert_ne!(contact_node_id("a-b", "c"), contact_node_id("a", "b-c"));
        assert_ne!(account_node_id("a-b"), account_node_id("a%2Db"));
        assert_ne!(hierarchy_edge_id("x-y", "z"), hierarchy_edge_id("x", "y-z"));
        assert_ne!(lateral_edge_id("p-q", "r"), lateral_edge_id("p", "q-r"));
    }

    #[test]
    fn plain_ids_stay_readable() {
        assert_eq!(account_node_id("a1"), "account-a1");
        assert_eq!(contact_node_id("a1", "c7"), "contact-a1-c7");
        assert_eq!(hierarchy_edge_id("org-o", "account-a1"), "edge-org%2Do-account%2Da1");
    }

    #[test]
    fn contact_ids_are_account_scoped() {
        assert_ne!(contact_node_id("a1", "c1"), contact_node_id("a2", "c1"));
    }

    #[test]
    fn endpoint_dedup_treats_pairs_as_unordered() {
        let edges = vec![
            edge("x", "a", "b", EdgeShape::Lateral),
            edge("y", "b", "a", EdgeShape::Hierarchy),
            edge("z", "a", "c", EdgeShape::Lateral),
        ];
        let kept: Vec<_> = dedup_endpoint_pairs(edges).into_iter().map(|e| e.id).collect();
        assert_eq!(kept, vec!["x", "z"]);
    }

    #[test]
    fn serializes_in_reactflow_shape() {
        let graph = Graph {
            nodes: vec![GraphNode {
                id: "account-a1".to_string(),
                kind: NodeKind::Account,
                position: Position { x: 10.0, y: 20.0 },
                data: NodeData {
                    label: "Main".to_string(),
                    account_number: Some("100".to_string()),
                    is_focus: Some(true),
                    ..Default::default()
                },
                parent_id: Some("org-o1".to_string()),
            }],
            edges: vec![edge("link-a-b", "a", "b", EdgeShape::Lateral)],
        };

        let value: serde_json::Value = serde_json::from_str(&graph.to_json(false).unwrap()).unwrap();
        assert_eq!(value["nodes"][0]["type"], "account");
        assert_eq!(value["nodes"][0]["parentId"], "org-o1");
        assert_eq!(value["nodes"][0]["data"]["accountNumber"], "100");
        assert_eq!(value["nodes"][0]["data"]["isFocus"], true);
        assert!(value["nodes"][0]["data"].get("isSubtle").is_none());
        assert!(value["nodes"][0]["data"].get("role").is_none());
        assert_eq!(value["edges"][0]["type"], "lateral");
    }

    #[test]
    fn stats_count_kinds_and_shapes() {
        let graph = Graph {
            nodes: vec![
                GraphNode {
                    id: "org-o1".to_string(),
                    kind: NodeKind::Organisation,
                    position: Position::default(),
                    data: NodeData::default(),
                    parent_id: None,
                },
            ],
            edges: vec![
                edge("e1", "a", "b", EdgeShape::Hierarchy),
                edge("e2", "a", "c", EdgeShape::Lateral),
            ],
        };
        let stats = graph.stats();
        assert_eq!(stats.organisations, 1);
        assert_eq!(stats.accounts, 0);
        assert_eq!(stats.hierarchy_edges, 1);
        assert_eq!(stats.lateral_edges, 1);
        assert!(!graph.is_empty());
        assert!(Graph::default().is_empty());
    }
}
