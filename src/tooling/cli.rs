//! CLI Tooling
//!
//! Command-line interface for administering one tree family of a workspace.
//! Output is plain text (tables for listings) or JSON.

use crate::audience::Audience;
use crate::config::{CanopyConfig, ConfigLoader};
use crate::error::TreeError;
use crate::service::{TreeService, TreeStats};
use crate::store::SledNodeStore;
use crate::tree::node::{Node, NodeAttributes, NodeKind, NodeUpdate};
use crate::tree::{Forest, ReorderEntry};
use crate::types::{NodeId, TreeFamily};
use clap::{Parser, Subcommand};
use comfy_table::Table;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Canopy CLI - hierarchical navigation and asset trees
#[derive(Parser)]
#[command(name = "canopy")]
#[command(about = "Manage hierarchical navigation menus and asset folders")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Tree family to operate on (navigation, assets)
    #[arg(long, default_value = "navigation")]
    pub family: TreeFamily,

    /// Enable debug logging
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the tree visible to an audience
    Tree {
        /// Audience (guest, member, admin)
        #[arg(long, default_value = "guest")]
        audience: Audience,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Print the breadcrumb path to a node
    Path {
        /// Node id
        id: Option<NodeId>,
        /// Look the node up by its external reference instead
        #[arg(long = "ref", conflicts_with = "id")]
        external_ref: Option<String>,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// List every node, inactive ones included
    List {
        /// Restrict to one kind (entry, folder, file)
        #[arg(long)]
        kind: Option<NodeKind>,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Create a node
    Create {
        label: String,
        /// Parent node id (omit for a root)
        #[arg(long)]
        parent: Option<NodeId>,
        /// Node kind (defaults to entry for navigation, folder for assets)
        #[arg(long)]
        kind: Option<NodeKind>,
        /// External reference (URL or storage location)
        #[arg(long = "ref")]
        external_ref: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Minimum audience allowed to see the node
        #[arg(long)]
        role: Option<Audience>,
        /// Create the node inactive
        #[arg(long)]
        inactive: bool,
    },
    /// Edit a node's label, reference, description, or role
    Update {
        id: NodeId,
        #[arg(long)]
        label: Option<String>,
        #[arg(long = "ref", conflicts_with = "clear_ref")]
        external_ref: Option<String>,
        /// Remove the external reference
        #[arg(long)]
        clear_ref: bool,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, conflicts_with = "clear_role")]
        role: Option<Audience>,
        /// Make the node visible to every audience
        #[arg(long)]
        clear_role: bool,
    },
    /// Move a node under a new parent
    Move {
        id: NodeId,
        /// New parent id (omit to move to the root level)
        #[arg(long)]
        parent: Option<NodeId>,
    },
    /// Apply a batch of position changes: ID:SORT[:PARENT|root]
    Reorder {
        #[arg(required = true)]
        entries: Vec<String>,
    },
    /// Delete a node
    Delete {
        id: NodeId,
        /// Remove the whole subtree
        #[arg(long)]
        recursive: bool,
    },
    /// Flip a node's activation state, or set it explicitly
    Toggle {
        id: NodeId,
        #[arg(long)]
        active: Option<bool>,
    },
    /// Recompute stored depths from a full scan
    Repair,
    /// Show node counts and tree shape
    Stats {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Print the effective configuration
    Config,
}

/// CLI context: loaded configuration and the service for the selected family
pub struct CliContext {
    service: TreeService,
    config: CanopyConfig,
    store_path: PathBuf,
}

impl CliContext {
    pub fn new(
        workspace_root: PathBuf,
        config_path: Option<PathBuf>,
        family: TreeFamily,
    ) -> Result<Self, TreeError> {
        let config = ConfigLoader::resolve(&workspace_root, config_path.as_deref())?;

        let store_path = config.storage.resolve_store_path(&workspace_root)?;
        let store = SledNodeStore::open(&store_path, family)?;
        let service = TreeService::new(Arc::new(store), &config.tree);

        Ok(Self {
            service,
            config,
            store_path,
        })
    }

    pub fn config(&self) -> &CanopyConfig {
        &self.config
    }

    pub fn service(&self) -> &TreeService {
        &self.service
    }

    /// Run a command and return its rendered output
    pub fn execute(&self, command: &Commands) -> Result<String, TreeError> {
        match command {
            Commands::Tree { audience, format } => {
                let forest = self.service.get_tree(*audience)?;
                if format == "json" {
                    to_json(&tree_rows(&forest))
                } else {
                    Ok(format_forest_text(&forest))
                }
            }
            Commands::Path {
                id,
                external_ref,
                format,
            } => {
                let path = match (id, external_ref) {
                    (Some(id), _) => self.service.get_path(*id)?,
                    (None, Some(r)) => self.service.get_path_by_ref(r)?,
                    (None, None) => {
                        return Err(TreeError::InvalidAttributes(
                            "Either a node id or --ref is required".to_string(),
                        ))
                    }
                };
                if format == "json" {
                    to_json(&path)
                } else {
                    Ok(path
                        .iter()
                        .map(|n| n.label.as_str())
                        .collect::<Vec<_>>()
                        .join(" > "))
                }
            }
            Commands::List { kind, format } => {
                let nodes = self.service.list_all(*kind)?;
                if format == "json" {
                    to_json(&nodes)
                } else {
                    Ok(format_node_table(&nodes))
                }
            }
            Commands::Create {
                label,
                parent,
                kind,
                external_ref,
                description,
                role,
                inactive,
            } => {
                let kind = kind.unwrap_or(match self.service.family() {
                    TreeFamily::Navigation => NodeKind::Entry,
                    TreeFamily::Assets => NodeKind::Folder,
                });
                let mut attributes = NodeAttributes::new(label.clone(), kind);
                attributes.external_ref = external_ref.clone();
                attributes.description = description.clone();
                attributes.required_role = *role;
                attributes.is_active = !inactive;

                let node = self.service.create(*parent, attributes)?;
                Ok(format!("Created {} {} ({})", node.kind, node.id, node.label))
            }
            Commands::Update {
                id,
                label,
                external_ref,
                clear_ref,
                description,
                role,
                clear_role,
            } => {
                let update = NodeUpdate {
                    label: label.clone(),
                    external_ref: if *clear_ref {
                        Some(None)
                    } else {
                        external_ref.clone().map(Some)
                    },
                    description: description.clone().map(Some),
                    required_role: if *clear_role { Some(None) } else { role.map(Some) },
                };
                let node = self.service.update(*id, update)?;
                Ok(format!("Updated {} ({})", node.id, node.label))
            }
            Commands::Move { id, parent } => {
                let node = self.service.move_node(*id, *parent)?;
                let target = node
                    .parent_id
                    .map(|p| p.to_string())
                    .unwrap_or_else(|| "root".to_string());
                Ok(format!(
                    "Moved {} under {} at position {}",
                    node.id, target, node.sort_order
                ))
            }
            Commands::Reorder { entries } => {
                let batch = entries
                    .iter()
                    .map(|spec| self.parse_reorder_entry(spec))
                    .collect::<Result<Vec<_>, _>>()?;
                self.service.reorder(&batch)?;
                Ok(format!("Reordered {} node(s)", batch.len()))
            }
            Commands::Delete { id, recursive } => {
                if *recursive {
                    let removed = self.service.delete_subtree(*id)?;
                    for node in removed.iter().filter(|n| n.kind == NodeKind::File) {
                        if let Some(location) = &node.external_ref {
                            info!(id = %node.id, location, "Asset file released");
                        }
                    }
                    Ok(format!("Deleted {} node(s)", removed.len()))
                } else {
                    let node = self.service.delete(*id)?;
                    Ok(format!("Deleted {} ({})", node.id, node.label))
                }
            }
            Commands::Toggle { id, active } => {
                let node = match active {
                    Some(active) => self.service.set_active(*id, *active)?,
                    None => self.service.toggle_active(*id)?,
                };
                let state = if node.is_active { "active" } else { "inactive" };
                Ok(format!("{} is now {}", node.id, state))
            }
            Commands::Repair => {
                let repaired = self.service.repair_depths()?;
                Ok(format!("Repaired depth of {} node(s)", repaired))
            }
            Commands::Stats { format } => {
                let stats = self.service.stats()?;
                if format == "json" {
                    to_json(&json!({
                        "family": self.service.family(),
                        "store": self.store_path,
                        "stats": stats,
                    }))
                } else {
                    Ok(format_stats_text(&stats))
                }
            }
            Commands::Config => self.config.to_toml(),
        }
    }

    /// Parse `ID:SORT[:PARENT|root]`; a missing parent keeps the current one
    fn parse_reorder_entry(&self, spec: &str) -> Result<ReorderEntry, TreeError> {
        let invalid = || TreeError::InvalidAttributes(format!("Invalid reorder entry: {}", spec));
        let mut parts = spec.split(':');

        let id: NodeId = parts
            .next()
            .and_then(|p| p.parse().ok())
            .ok_or_else(invalid)?;
        let sort_order: i32 = parts
            .next()
            .and_then(|p| p.trim().parse().ok())
            .ok_or_else(invalid)?;
        let parent_id = match parts.next() {
            None => self.service.get_node(id)?.parent_id,
            Some("root") => None,
            Some(p) => Some(p.parse::<NodeId>().map_err(|_| invalid())?),
        };
        if parts.next().is_some() {
            return Err(invalid());
        }

        Ok(ReorderEntry::new(id, sort_order, parent_id))
    }
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String, TreeError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| TreeError::Output(format!("JSON: {}", e)))
}

/// One pre-order row of the JSON tree output; children are listed by id
#[derive(serde::Serialize)]
struct TreeRow<'a> {
    #[serde(flatten)]
    node: &'a Node,
    children: &'a [NodeId],
}

fn tree_rows(forest: &Forest) -> Vec<TreeRow<'_>> {
    forest
        .flatten()
        .into_iter()
        .map(|node| TreeRow {
            node,
            children: forest.children_of(node.id),
        })
        .collect()
}

fn format_forest_text(forest: &Forest) -> String {
    if forest.is_empty() {
        return "(empty)".to_string();
    }
    let mut out = String::new();
    for node in forest.flatten() {
        out.push_str(&"  ".repeat(node.depth as usize));
        out.push_str(&format!("{} [{}]", node.label, node.id));
        if let Some(r) = &node.external_ref {
            out.push_str(&format!(" -> {}", r));
        }
        out.push('\n');
    }
    if !forest.orphans().is_empty() {
        out.push_str(&format!("({} orphan(s))\n", forest.orphans().len()));
    }
    out.trim_end().to_string()
}

fn format_node_table(nodes: &[Node]) -> String {
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(vec![
        "ID", "Label", "Kind", "Parent", "Sort", "Depth", "Active", "Ref",
    ]);
    for node in nodes {
        table.add_row(vec![
            node.id.to_string(),
            node.label.clone(),
            node.kind.to_string(),
            node.parent_id
                .map(|p| p.to_string())
                .unwrap_or_else(|| "-".to_string()),
            node.sort_order.to_string(),
            node.depth.to_string(),
            if node.is_active { "yes" } else { "no" }.to_string(),
            node.external_ref.clone().unwrap_or_default(),
        ]);
    }
    table.to_string()
}

fn format_stats_text(stats: &TreeStats) -> String {
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(vec!["Metric", "Value"]);
    table.add_row(vec!["Total".to_string(), stats.total.to_string()]);
    table.add_row(vec!["Active".to_string(), stats.active.to_string()]);
    table.add_row(vec!["Max depth".to_string(), stats.max_depth.to_string()]);
    for (kind, count) in &stats.by_kind {
        table.add_row(vec![format!("Kind: {}", kind), count.to_string()]);
    }
    let busiest = stats.child_counts.iter().max_by_key(|(_, count)| **count);
    if let Some((id, count)) = busiest {
        table.add_row(vec![format!("Largest container: {}", id), count.to_string()]);
    }
    table.to_string()
}
