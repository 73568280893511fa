pub mod builder;
pub mod error;
pub mod focus;
pub mod graph;
pub mod layout;

pub use builder::{build, GraphBuilder, LinkTemplates};
pub use error::{Error, Result};
pub use focus::{select_accounts, AccountIndex};
pub use graph::{EdgeShape, Graph, GraphEdge, GraphNode, GraphStats, NodeData, NodeKind, Position};
pub use layout::{LayoutConfig, LayoutEngine};

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

// --- Entities (read-only snapshot handed over by the entity store) ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: String,
    pub name: String,
    /// Role label shown under the contact's name, e.g. "Billing contact"
    #[serde(default)]
    pub role: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub account_number: String,
    pub organisation_id: String,
    /// Ordered; the same contact id may appear more than once.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contacts: Vec<Contact>,
    /// Lateral links to sibling accounts. Recorded on whichever account lists
    /// the link, but treated as symmetric.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub linked_account_ids: Vec<String>,
}

impl Account {
    /// Whether this account itself lists `account_id` as a lateral link.
    pub fn links_to(&self, account_id: &str) -> bool {
        self.linked_account_ids.iter().any(|id| id == account_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Organisation {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub accounts: Vec<Account>,
}

/// The document handed to a build: every organisation with its accounts.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub organisations: Vec<Organisation>,
}

// Snapshots arrive either wrapped or as a bare organisation array.
#[derive(Deserialize)]
#[serde(untagged)]
enum SnapshotDocument {
    Wrapped(Snapshot),
    Bare(Vec<Organisation>),
}

/// Parse a snapshot from JSON text.
pub fn parse_snapshot(raw: &str) -> Result<Snapshot> {
    let doc: SnapshotDocument = serde_json::from_str(raw).map_err(|source| Error::Parse {
        what: "snapshot",
        source,
    })?;
    Ok(match doc {
        SnapshotDocument::Wrapped(snapshot) => snapshot,
        SnapshotDocument::Bare(organisations) => Snapshot { organisations },
    })
}

/// Read and parse a snapshot file.
pub fn read_snapshot(path: &Path) -> Result<Snapshot> {
    let raw = fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_snapshot(&raw)
}

// --- Settings ---

/// Everything a build can be tuned with: grid spacing and navigation links.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct GraphSettings {
    pub layout: LayoutConfig,
    pub links: LinkTemplates,
}

/// Resolve the settings directory (~/.relgraph/).
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".relgraph")
}

pub fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

/// Read settings from the default location, falling back to defaults when the
/// file is missing or unreadable.
pub fn read_settings() -> GraphSettings {
    let path = settings_path();
    if !path.exists() {
        return GraphSettings::default();
    }
    read_settings_from(&path).unwrap_or_else(|e| {
        tracing::warn!("ignoring settings at {}: {}", path.display(), e);
        GraphSettings::default()
    })
}

/// Read settings from an explicit path. Missing fields take their defaults.
pub fn read_settings_from(path: &Path) -> Result<GraphSettings> {
    let raw = fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| Error::Parse {
        what: "settings",
        source,
    })
}

/// Write settings to the default location and return the path written.
pub fn write_settings(settings: &GraphSettings) -> Result<PathBuf> {
    let path = settings_path();
    write_settings_to(&path, settings)?;
    Ok(path)
}

pub fn write_settings_to(path: &Path, settings: &GraphSettings) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(|source| Error::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }
    let json = serde_json::to_string_pretty(settings)?;
    fs::write(path, json).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_wrapped_and_bare_snapshots() {
        let wrapped = r#"{"organisations":[{"id":"o1","name":"Acme","accounts":[]}]}"#;
        let bare = r#"[{"id":"o1","name":"Acme"}]"#;

        let a = parse_snapshot(wrapped).unwrap();
        let b = parse_snapshot(bare).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.organisations[0].name, "Acme");
    }

    #[test]
    fn account_fields_are_camel_case_with_optional_links() {
        let raw = r#"[{"id":"o1","name":"Acme","accounts":[
            {"id":"a1","name":"Main","accountNumber":"100-1","organisationId":"o1",
             "contacts":[{"id":"c1","name":"Ada","role":"Owner"}]}
        ]}]"#;
        let snapshot = parse_snapshot(raw).unwrap();
        let account = &snapshot.organisations[0].accounts[0];
        assert_eq!(account.account_number, "100-1");
        assert!(account.linked_account_ids.is_empty());
        assert_eq!(account.contacts[0].role, "Owner");
    }

    #[test]
    fn malformed_snapshot_is_a_parse_error() {
        let err = parse_snapshot("{not json").unwrap_err();
        assert!(matches!(err, Error::Parse { what: "snapshot", .. }));
    }

    #[test]
    fn missing_snapshot_file_is_an_io_error() {
        let path = std::env::temp_dir().join("relgraph-missing-snapshot.json");
        let err = read_snapshot(&path).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn settings_round_trip_through_disk() {
        let dir = std::env::temp_dir().join(format!("relgraph-settings-{}", std::process::id()));
        let path = dir.join("settings.json");
        let mut settings = GraphSettings::default();
        settings.layout.node_width = 300.0;
        settings.links.account = "/crm/accounts/{id}".to_string();

        write_settings_to(&path, &settings).unwrap();
        let loaded = read_settings_from(&path).unwrap();
        assert_eq!(loaded, settings);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn partial_settings_fill_in_defaults() {
        let settings: GraphSettings =
            serde_json::from_str(r#"{"layout":{"columnGap":10}}"#).unwrap();
        assert_eq!(settings.layout.column_gap, 10.0);
        assert_eq!(settings.layout.node_width, LayoutConfig::default().node_width);
        assert_eq!(settings.links, LinkTemplates::default());
    }
}
