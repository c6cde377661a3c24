use super::{assets_service, navigation_service};
use canopy::audience::Audience;
use canopy::error::TreeError;
use canopy::tree::{NodeAttributes, ReorderEntry};
use canopy::types::NodeId;
use std::sync::Arc;

#[test]
fn scenario_a_build_depth_and_path() {
    let svc = navigation_service();
    let a = svc.create(None, NodeAttributes::entry("A")).unwrap();
    let b = svc.create(Some(a.id), NodeAttributes::entry("B")).unwrap();
    let c = svc.create(Some(b.id), NodeAttributes::entry("C")).unwrap();

    let forest = svc.get_tree(Audience::Guest).unwrap();
    assert_eq!(forest.roots(), &[a.id]);
    assert_eq!(forest.children_of(a.id), &[b.id]);
    assert_eq!(forest.children_of(b.id), &[c.id]);
    assert_eq!(forest.depth_of(c.id), Some(2));
    assert_eq!(c.depth, 2);

    let path: Vec<NodeId> = svc.get_path(c.id).unwrap().iter().map(|n| n.id).collect();
    assert_eq!(path, vec![a.id, b.id, c.id]);
}

#[test]
fn scenario_b_move_root_under_grandchild_is_cycle() {
    let svc = navigation_service();
    let a = svc.create(None, NodeAttributes::entry("A")).unwrap();
    let b = svc.create(Some(a.id), NodeAttributes::entry("B")).unwrap();
    let c = svc.create(Some(b.id), NodeAttributes::entry("C")).unwrap();

    let err = svc.move_node(a.id, Some(c.id)).unwrap_err();
    assert!(matches!(err, TreeError::Cycle { node, parent } if node == a.id && parent == c.id));
    assert!(svc.get_node(a.id).unwrap().parent_id.is_none());
}

#[test]
fn scenario_c_self_parent() {
    let svc = navigation_service();
    let a = svc.create(None, NodeAttributes::entry("A")).unwrap();
    assert!(matches!(
        svc.move_node(a.id, Some(a.id)),
        Err(TreeError::SelfParent(id)) if id == a.id
    ));
}

#[test]
fn scenario_d_delete_requires_childless() {
    let svc = navigation_service();
    let a = svc.create(None, NodeAttributes::entry("A")).unwrap();
    let b = svc.create(Some(a.id), NodeAttributes::entry("B")).unwrap();
    let c = svc.create(Some(b.id), NodeAttributes::entry("C")).unwrap();

    assert!(matches!(
        svc.delete(b.id),
        Err(TreeError::HasChildren { id, count: 1 }) if id == b.id
    ));
    svc.delete(c.id).unwrap();
    svc.delete(b.id).unwrap();
    assert_eq!(svc.list_all(None).unwrap().len(), 1);
}

#[test]
fn scenario_d_inactive_child_still_blocks_delete() {
    let svc = assets_service();
    let media = svc.create(None, NodeAttributes::folder("media")).unwrap();
    svc.create(Some(media.id), NodeAttributes::file("a.png", "/a.png").inactive())
        .unwrap();
    assert!(matches!(svc.delete(media.id), Err(TreeError::HasChildren { .. })));
}

#[test]
fn scenario_e_root_siblings_numbered_from_one() {
    let svc = navigation_service();
    let first = svc.create(None, NodeAttributes::entry("first")).unwrap();
    let second = svc.create(None, NodeAttributes::entry("second")).unwrap();
    assert_eq!(first.sort_order, 1);
    assert_eq!(second.sort_order, 2);
}

#[test]
fn repeated_reads_share_cached_forest() {
    let svc = navigation_service();
    svc.create(None, NodeAttributes::entry("A")).unwrap();
    let first = svc.get_tree(Audience::Member).unwrap();
    let second = svc.get_tree(Audience::Member).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(svc.cache_stats().hits, 1);
}

#[test]
fn reorder_batch_moves_and_renumbers() {
    let svc = navigation_service();
    let a = svc.create(None, NodeAttributes::entry("A")).unwrap();
    let b = svc.create(None, NodeAttributes::entry("B")).unwrap();
    let c = svc.create(Some(b.id), NodeAttributes::entry("C")).unwrap();

    svc.reorder(&[
        ReorderEntry::new(b.id, 1, Some(a.id)),
        ReorderEntry::new(a.id, 2, None),
    ])
    .unwrap();

    let moved = svc.get_node(b.id).unwrap();
    assert_eq!(moved.parent_id, Some(a.id));
    assert_eq!(moved.depth, 1);
    assert_eq!(svc.get_node(c.id).unwrap().depth, 2);
    assert_eq!(svc.get_node(a.id).unwrap().sort_order, 2);
}

#[test]
fn reorder_entries_see_earlier_entries() {
    let svc = navigation_service();
    let a = svc.create(None, NodeAttributes::entry("A")).unwrap();
    let b = svc.create(None, NodeAttributes::entry("B")).unwrap();

    // Second entry closes a loop opened by the first
    let err = svc
        .reorder(&[
            ReorderEntry::new(b.id, 1, Some(a.id)),
            ReorderEntry::new(a.id, 1, Some(b.id)),
        ])
        .unwrap_err();
    assert!(matches!(err, TreeError::Cycle { .. }));

    // Nothing from the rejected batch was written
    assert!(svc.get_node(b.id).unwrap().parent_id.is_none());
}

#[test]
fn breadcrumb_lengths_follow_depth() {
    let svc = assets_service();
    let mut parent = None;
    let mut last = None;
    for i in 0..6 {
        let node = svc
            .create(parent, NodeAttributes::folder(format!("level{}", i)))
            .unwrap();
        parent = Some(node.id);
        last = Some(node);
    }
    let last = last.unwrap();
    let path = svc.get_path(last.id).unwrap();
    assert_eq!(path.len(), last.depth as usize + 1);
    assert!(path[0].parent_id.is_none());
    assert_eq!(path.last().unwrap().id, last.id);
}
