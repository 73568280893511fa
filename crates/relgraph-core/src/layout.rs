use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::graph::{Graph, NodeKind, Position};

/// Spacing constants, in renderer pixels.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct LayoutConfig {
    /// Width of every node column
    pub node_width: f64,
    /// Horizontal gap between account columns
    pub column_gap: f64,
    /// Vertical offset of the account row below the organisation
    pub level_gap: f64,
    pub account_node_height: f64,
    pub contact_node_height: f64,
    /// Vertical gap between stacked nodes
    pub row_gap: f64,
    /// Horizontal gap between organisation blocks
    pub organisation_gap: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_width: 220.0,
            column_gap: 40.0,
            level_gap: 160.0,
            account_node_height: 80.0,
            contact_node_height: 60.0,
            row_gap: 24.0,
            organisation_gap: 120.0,
        }
    }
}

impl LayoutConfig {
    /// Distance between the left edges of two adjacent account columns.
    pub fn column_pitch(&self) -> f64 {
        self.node_width + self.column_gap
    }

    /// Every constant multiplied by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            node_width: self.node_width * factor,
            column_gap: self.column_gap * factor,
            level_gap: self.level_gap * factor,
            account_node_height: self.account_node_height * factor,
            contact_node_height: self.contact_node_height * factor,
            row_gap: self.row_gap * factor,
            organisation_gap: self.organisation_gap * factor,
        }
    }

    /// Width taken by an organisation with `accounts` accounts. An organisation
    /// without accounts still occupies one column.
    fn block_width(&self, accounts: usize) -> f64 {
        let columns = accounts.max(1) as f64;
        columns * self.node_width + (columns - 1.0) * self.column_gap
    }

    fn first_contact_y(&self) -> f64 {
        self.level_gap + self.account_node_height + self.row_gap
    }
}

/// Assigns positions from node kinds and `parent_id` links, so it can run on
/// any graph the builder produced.
///
/// ```text
/// y = 0          organisation (centered over its accounts)
/// y = levelGap   account  account  account ...
///                contact  contact
///                contact
/// ```
///
/// Each organisation gets its own column block, left to right. Lateral edges
/// never influence positions.
pub struct LayoutEngine {
    config: LayoutConfig,
}

impl LayoutEngine {
    pub fn new(config: LayoutConfig) -> Self {
        Self { config }
    }

    pub fn layout(&self, graph: &mut Graph) {
        let (roots, children) = hierarchy(graph);
        let cfg = &self.config;
        let pitch = cfg.column_pitch();
        let mut offset = 0.0;

        for org in roots {
            let accounts: Vec<usize> = children[org]
                .iter()
                .copied()
                .filter(|&i| graph.nodes[i].kind == NodeKind::Account)
                .collect();

            for (col, &account) in accounts.iter().enumerate() {
                let x = offset + col as f64 * pitch;
                graph.nodes[account].position = Position {
                    x,
                    y: cfg.level_gap,
                };

                let contacts: Vec<usize> = children[account]
                    .iter()
                    .copied()
                    .filter(|&i| graph.nodes[i].kind == NodeKind::Contact)
                    .collect();
                for (row, contact) in contacts.into_iter().enumerate() {
                    graph.nodes[contact].position = Position {
                        x,
                        y: cfg.first_contact_y()
                            + row as f64 * (cfg.contact_node_height + cfg.row_gap),
                    };
                }
            }

            let span = accounts.len().saturating_sub(1) as f64 * pitch;
            graph.nodes[org].position = Position {
                x: offset + span / 2.0,
                y: 0.0,
            };

            offset += cfg.block_width(accounts.len()) + cfg.organisation_gap;
        }
    }
}

/// Organisation node indices in graph order, and each node's children
/// (by index, in graph order).
fn hierarchy(graph: &Graph) -> (Vec<usize>, Vec<Vec<usize>>) {
    let index_of: HashMap<&str, usize> = graph
        .nodes
        .iter()
        .enumerate()
        .map(|(i, n)| (n.id.as_str(), i))
        .collect();

    let mut roots = Vec::new();
    let mut children = vec![Vec::new(); graph.nodes.len()];
    for (i, node) in graph.nodes.iter().enumerate() {
        if node.kind == NodeKind::Organisation {
            roots.push(i);
            continue;
        }
        match node.parent_id.as_deref().and_then(|p| index_of.get(p)) {
            Some(&parent) => children[parent].push(i),
            None => tracing::trace!("node {} has no placed parent, leaving position", node.id),
        }
    }
    (roots, children)
}
