//! Very deep chains through the read paths that hand trees to callers

use canopy::audience::Audience;
use canopy::config::TreeConfig;
use canopy::store::{InMemoryNodeStore, NodeStore, SledNodeStore};
use canopy::tooling::cli::{CliContext, Commands};
use canopy::tree::node::{Node, NodeKind};
use canopy::types::{NodeId, TreeFamily};
use canopy::TreeService;
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

fn chain(len: u64) -> Vec<Node> {
    (0..len)
        .map(|i| {
            let parent = i.checked_sub(1).map(NodeId);
            Node::new(NodeId(i), format!("level {}", i), NodeKind::Entry, parent, 1, i as u32)
        })
        .collect()
}

/// Run on a thread with a small, fixed stack so recursion shows up as an abort
fn on_small_stack<F: FnOnce() + Send + 'static>(f: F) {
    thread::Builder::new()
        .stack_size(2 * 1024 * 1024)
        .spawn(f)
        .unwrap()
        .join()
        .unwrap();
}

#[test]
fn nested_view_of_deep_chain_builds_and_drops() {
    on_small_stack(|| {
        let store = InMemoryNodeStore::with_nodes(TreeFamily::Navigation, chain(200_000));
        let service = TreeService::new(Arc::new(store), &TreeConfig::default());

        assert_eq!(service.get_tree(Audience::Admin).unwrap().len(), 200_000);
        let nested = service.get_nested_tree(Audience::Admin).unwrap();
        assert_eq!(nested.len(), 1);
        assert_eq!(nested[0].count(), 200_000);
        drop(nested);
    });
}

#[test]
fn cli_tree_json_of_deep_chain() {
    on_small_stack(|| {
        let temp = TempDir::new().unwrap();
        {
            let store = SledNodeStore::open(&temp.path().join("db"), TreeFamily::Navigation).unwrap();
            store.save_batch(&chain(50_000)).unwrap();
        }
        let config = temp.path().join("test.toml");
        std::fs::write(&config, "[storage]\nstore_path = \"db\"\n").unwrap();
        let ctx = CliContext::new(temp.path().to_path_buf(), Some(config), TreeFamily::Navigation)
            .unwrap();

        let output = ctx
            .execute(&Commands::Tree {
                audience: Audience::Admin,
                format: "json".to_string(),
            })
            .unwrap();
        let rows: Vec<serde_json::Value> = serde_json::from_str(&output).unwrap();
        assert_eq!(rows.len(), 50_000);
        assert_eq!(rows[49_999]["depth"], 49_999);
        assert_eq!(rows[49_999]["parent_id"], 49_998);
    });
}
