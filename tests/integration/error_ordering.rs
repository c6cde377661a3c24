use super::FlakyStore;
use canopy::audience::Audience;
use canopy::config::TreeConfig;
use canopy::error::{StorageError, TreeError};
use canopy::tree::NodeAttributes;
use canopy::types::{NodeId, TreeFamily};
use canopy::TreeService;
use std::sync::Arc;

fn flaky_service() -> (Arc<FlakyStore>, TreeService) {
    let store = Arc::new(FlakyStore::new(TreeFamily::Navigation));
    let svc = TreeService::new(store.clone(), &TreeConfig::default());
    (store, svc)
}

#[test]
fn self_parent_reported_before_missing_node() {
    let (_, svc) = flaky_service();
    assert!(matches!(
        svc.move_node(NodeId(42), Some(NodeId(42))),
        Err(TreeError::SelfParent(_))
    ));
    assert!(matches!(
        svc.move_node(NodeId(42), None),
        Err(TreeError::NodeNotFound(_))
    ));
}

#[test]
fn structural_errors_precede_any_write() {
    let (store, svc) = flaky_service();
    let a = svc.create(None, NodeAttributes::entry("A")).unwrap();
    let b = svc.create(Some(a.id), NodeAttributes::entry("B")).unwrap();

    // Writes would fail, but validation rejects first
    store.set_failing(true);
    let err = svc.move_node(a.id, Some(b.id)).unwrap_err();
    assert!(err.is_structural());
    assert!(matches!(err, TreeError::Cycle { .. }));
}

#[test]
fn failed_write_keeps_cache_and_state() {
    let (store, svc) = flaky_service();
    let a = svc.create(None, NodeAttributes::entry("A")).unwrap();
    let b = svc.create(None, NodeAttributes::entry("B")).unwrap();
    let before = svc.get_tree(Audience::Guest).unwrap();

    store.set_failing(true);
    let err = svc.move_node(b.id, Some(a.id)).unwrap_err();
    assert!(matches!(
        err,
        TreeError::StorageError(StorageError::Database(_))
    ));

    // Cache was not evicted, and the store still holds the old parent
    assert!(Arc::ptr_eq(&before, &svc.get_tree(Audience::Guest).unwrap()));
    assert!(svc.get_node(b.id).unwrap().parent_id.is_none());

    store.set_failing(false);
    svc.move_node(b.id, Some(a.id)).unwrap();
    assert_eq!(svc.get_tree(Audience::Guest).unwrap().roots(), &[a.id]);
}

#[test]
fn invalid_label_rejected_before_id_allocation() {
    let (store, svc) = flaky_service();
    assert!(matches!(
        svc.create(None, NodeAttributes::entry("   ")),
        Err(TreeError::InvalidAttributes(_))
    ));
    assert!(store.inner.is_empty());
}
