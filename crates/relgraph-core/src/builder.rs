use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::focus::{select_accounts, AccountIndex};
use crate::graph::{
    account_node_id, contact_node_id, dedup_endpoint_pairs, hierarchy_edge_id, lateral_edge_id,
    organisation_node_id, EdgeShape, Graph, GraphEdge, GraphNode, NodeData, NodeKind, Position,
};
use crate::layout::LayoutEngine;
use crate::{Account, GraphSettings, Organisation};

/// Navigation targets carried on account and contact nodes. `{id}` is the
/// entity id; contact templates may also use `{accountId}`. An empty template
/// leaves `href` unset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct LinkTemplates {
    pub account: String,
    pub contact: String,
}

impl Default for LinkTemplates {
    fn default() -> Self {
        Self {
            account: "/accounts/{id}".to_string(),
            contact: "/contacts/{id}".to_string(),
        }
    }
}

impl LinkTemplates {
    pub fn account_href(&self, account_id: &str) -> Option<String> {
        render(&self.account, &[("{id}", account_id)])
    }

    pub fn contact_href(&self, account_id: &str, contact_id: &str) -> Option<String> {
        render(
            &self.contact,
            &[("{id}", contact_id), ("{accountId}", account_id)],
        )
    }
}

fn render(template: &str, vars: &[(&str, &str)]) -> Option<String> {
    if template.is_empty() {
        return None;
    }
    let mut out = template.to_string();
    for (key, value) in vars {
        out = out.replace(key, value);
    }
    Some(out)
}

/// Build a positioned graph with default settings.
pub fn build(organisations: &[Organisation], focus_account_id: Option<&str>) -> Graph {
    GraphBuilder::default().build(organisations, focus_account_id)
}

#[derive(Debug, Clone, Default)]
pub struct GraphBuilder {
    settings: GraphSettings,
}

impl GraphBuilder {
    pub fn new(settings: GraphSettings) -> Self {
        Self { settings }
    }

    pub fn build(&self, organisations: &[Organisation], focus_account_id: Option<&str>) -> Graph {
        let index = AccountIndex::new(organisations);
        let mut out = Collector::default();

        for organisation in organisations {
            let accounts = select_accounts(organisation, focus_account_id, &index);
            self.add_organisation(&mut out, organisation, &accounts, focus_account_id);
        }

        let mut graph = Graph {
            nodes: out.nodes,
            edges: dedup_endpoint_pairs(out.edges),
        };
        LayoutEngine::new(self.settings.layout.clone()).layout(&mut graph);

        tracing::debug!(
            organisations = organisations.len(),
            nodes = graph.nodes.len(),
            edges = graph.edges.len(),
            focus = focus_account_id.unwrap_or("-"),
            "built relationship graph"
        );
        graph
    }

    fn add_organisation(
        &self,
        out: &mut Collector,
        organisation: &Organisation,
        accounts: &[&Account],
        focus_account_id: Option<&str>,
    ) {
        let org_node = organisation_node_id(&organisation.id);
        out.node(GraphNode {
            id: org_node.clone(),
            kind: NodeKind::Organisation,
            position: Position::default(),
            data: NodeData {
                label: organisation.name.clone(),
                ..Default::default()
            },
            parent_id: None,
        });

        let rendered: HashSet<&str> = accounts.iter().map(|a| a.id.as_str()).collect();
        let mut incoming: HashMap<&str, Vec<&str>> = HashMap::new();
        for account in accounts {
            for linked in &account.linked_account_ids {
                incoming
                    .entry(linked.as_str())
                    .or_default()
                    .push(account.id.as_str());
            }
        }

        for account in accounts {
            let account_node = account_node_id(&account.id);
            let (is_focus, is_subtle) = match focus_account_id {
                Some(focus) => (Some(account.id == focus), Some(account.id != focus)),
                None => (None, None),
            };
            out.node(GraphNode {
                id: account_node.clone(),
                kind: NodeKind::Account,
                position: Position::default(),
                data: NodeData {
                    label: account.name.clone(),
                    account_number: Some(account.account_number.clone()),
                    href: self.settings.links.account_href(&account.id),
                    is_focus,
                    is_subtle,
                    ..Default::default()
                },
                parent_id: Some(org_node.clone()),
            });
            out.hierarchy_edge(&org_node, &account_node);

            let neighbours = account
                .linked_account_ids
                .iter()
                .map(String::as_str)
                .chain(incoming.get(account.id.as_str()).into_iter().flatten().copied());
            for neighbour in neighbours {
                if neighbour == account.id {
                    continue;
                }
                if !rendered.contains(neighbour) {
                    tracing::trace!(
                        "skipping link {} -> {}: not rendered",
                        account.id,
                        neighbour
                    );
                    continue;
                }
                let other_node = account_node_id(neighbour);
                if account_node < other_node {
                    out.edge(GraphEdge {
                        id: lateral_edge_id(&account_node, &other_node),
                        source: account_node.clone(),
                        target: other_node,
                        shape: EdgeShape::Lateral,
                    });
                }
            }

            let mut seen: HashSet<&str> = HashSet::new();
            for contact in &account.contacts {
                if !seen.insert(contact.id.as_str()) {
                    tracing::trace!(
                        "collapsing repeated contact {} on account {}",
                        contact.id,
                        account.id
                    );
                    continue;
                }
                let contact_node = contact_node_id(&account.id, &contact.id);
                out.node(GraphNode {
                    id: contact_node.clone(),
                    kind: NodeKind::Contact,
                    position: Position::default(),
                    data: NodeData {
                        label: contact.name.clone(),
                        role: Some(contact.role.clone()),
                        href: self.settings.links.contact_href(&account.id, &contact.id),
                        ..Default::default()
                    },
                    parent_id: Some(account_node.clone()),
                });
                out.hierarchy_edge(&account_node, &contact_node);
            }
        }
    }
}

/// Global node and edge collections, deduplicated by id on insert.
#[derive(Default)]
struct Collector {
    nodes: Vec<GraphNode>,
    node_ids: HashSet<String>,
    edges: Vec<GraphEdge>,
    edge_ids: HashSet<String>,
}

impl Collector {
    fn node(&mut self, node: GraphNode) {
        if self.node_ids.insert(node.id.clone()) {
            self.nodes.push(node);
        } else {
            tracing::trace!("node {} already present", node.id);
        }
    }

    fn edge(&mut self, edge: GraphEdge) {
        if self.edge_ids.insert(edge.id.clone()) {
            self.edges.push(edge);
        }
    }

    fn hierarchy_edge(&mut self, source: &str, target: &str) {
        self.edge(GraphEdge {
            id: hierarchy_edge_id(source, target),
            source: source.to_string(),
            target: target.to_string(),
            shape: EdgeShape::Hierarchy,
        });
    }
}
