use canopy::audience::Audience;
use canopy::config::TreeConfig;
use canopy::store::{NodeStore, SledNodeStore};
use canopy::tree::{DepthPolicy, NodeAttributes};
use canopy::types::TreeFamily;
use canopy::TreeService;
use std::sync::Arc;
use tempfile::TempDir;

fn open(path: &std::path::Path, family: TreeFamily) -> TreeService {
    let store = SledNodeStore::open(path, family).unwrap();
    TreeService::new(Arc::new(store), &TreeConfig::default())
}

#[test]
fn tree_survives_reopen() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("store");

    let (home, docs) = {
        let svc = open(&path, TreeFamily::Navigation);
        let home = svc
            .create(None, NodeAttributes::entry("Home").with_ref("/"))
            .unwrap();
        let docs = svc
            .create(Some(home.id), NodeAttributes::entry("Docs").with_ref("/docs"))
            .unwrap();
        (home, docs)
    };

    let svc = open(&path, TreeFamily::Navigation);
    let forest = svc.get_tree(Audience::Guest).unwrap();
    assert_eq!(forest.roots(), &[home.id]);
    assert_eq!(forest.children_of(home.id), &[docs.id]);

    let crumbs = svc.get_path_by_ref("/docs").unwrap();
    assert_eq!(crumbs.len(), 2);

    // Fresh ids never collide with persisted ones
    let next = svc.create(None, NodeAttributes::entry("Blog")).unwrap();
    assert!(next.id > docs.id);
}

#[test]
fn cascade_move_persists_descendant_depths() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("store");
    let svc = open(&path, TreeFamily::Assets);
    assert_eq!(svc.depth_policy(), DepthPolicy::Cascade);

    let a = svc.create(None, NodeAttributes::folder("a")).unwrap();
    let b = svc.create(None, NodeAttributes::folder("b")).unwrap();
    let c = svc.create(Some(b.id), NodeAttributes::folder("c")).unwrap();
    let f = svc
        .create(Some(c.id), NodeAttributes::file("f.txt", "/f.txt"))
        .unwrap();

    svc.move_node(b.id, Some(a.id)).unwrap();
    drop(svc);

    let store = SledNodeStore::open(&path, TreeFamily::Assets).unwrap();
    assert_eq!(store.find_by_id(c.id).unwrap().unwrap().depth, 2);
    assert_eq!(store.find_by_id(f.id).unwrap().unwrap().depth, 3);
}

#[test]
fn subtree_delete_is_all_or_nothing_on_disk() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("store");
    let svc = open(&path, TreeFamily::Assets);

    let root = svc.create(None, NodeAttributes::folder("root")).unwrap();
    let sub = svc.create(Some(root.id), NodeAttributes::folder("sub")).unwrap();
    svc.create(Some(sub.id), NodeAttributes::file("x", "/x")).unwrap();
    let other = svc.create(None, NodeAttributes::folder("other")).unwrap();

    let removed = svc.delete_subtree(root.id).unwrap();
    assert_eq!(removed.len(), 3);

    let remaining = svc.list_all(None).unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, other.id);
}

#[test]
fn families_share_a_database_without_mixing() {
    let temp = TempDir::new().unwrap();
    let db = sled::open(temp.path().join("store")).unwrap();
    let nav = TreeService::new(
        Arc::new(SledNodeStore::from_db(db.clone(), TreeFamily::Navigation).unwrap()),
        &TreeConfig::default(),
    );
    let assets = TreeService::new(
        Arc::new(SledNodeStore::from_db(db, TreeFamily::Assets).unwrap()),
        &TreeConfig::default(),
    );

    nav.create(None, NodeAttributes::entry("Home")).unwrap();
    assets.create(None, NodeAttributes::folder("media")).unwrap();

    assert_eq!(nav.list_all(None).unwrap().len(), 1);
    assert_eq!(assets.list_all(None).unwrap().len(), 1);
}
