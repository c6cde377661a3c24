use canopy::audience::Audience;
use canopy::concurrency::TreeLockManager;
use canopy::config::TreeConfig;
use canopy::error::TreeError;
use canopy::store::{InMemoryNodeStore, NodeStore};
use canopy::tree::{path, NodeAttributes};
use canopy::types::{NodeId, TreeFamily};
use canopy::TreeService;
use std::sync::{Arc, Barrier};
use std::thread;

#[test]
fn opposing_moves_never_form_a_cycle() {
    for _ in 0..50 {
        let store: Arc<dyn NodeStore> = Arc::new(InMemoryNodeStore::new(TreeFamily::Navigation));
        let locks = Arc::new(TreeLockManager::new());
        let config = TreeConfig::default();
        let first = Arc::new(TreeService::with_lock_manager(
            Arc::clone(&store),
            &config,
            Arc::clone(&locks),
        ));
        let second = Arc::new(TreeService::with_lock_manager(
            Arc::clone(&store),
            &config,
            Arc::clone(&locks),
        ));

        let a = first.create(None, NodeAttributes::entry("A")).unwrap();
        let b = first.create(None, NodeAttributes::entry("B")).unwrap();

        let barrier = Arc::new(Barrier::new(2));
        let handles: Vec<_> = [(first, a.id, b.id), (second, b.id, a.id)]
            .into_iter()
            .map(|(svc, node, parent)| {
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    svc.move_node(node, Some(parent))
                })
            })
            .collect();

        let results: Vec<Result<_, TreeError>> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();
        let succeeded = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(succeeded, 1);
        assert!(results
            .iter()
            .any(|r| matches!(r, Err(TreeError::Cycle { .. }))));

        for id in [a.id, b.id] {
            assert!(path::path_to(store.as_ref(), id).is_ok());
        }
    }
}

#[test]
fn many_writers_keep_forest_intact() {
    let svc = Arc::new(TreeService::new(
        Arc::new(InMemoryNodeStore::new(TreeFamily::Navigation)),
        &TreeConfig::default(),
    ));
    let ids: Vec<NodeId> = (0..12)
        .map(|i| svc.create(None, NodeAttributes::entry(format!("n{}", i))).unwrap().id)
        .collect();
    let ids = Arc::new(ids);

    let handles: Vec<_> = (0..6)
        .map(|t| {
            let svc = Arc::clone(&svc);
            let ids = Arc::clone(&ids);
            thread::spawn(move || {
                for step in 0..40 {
                    let node = ids[(t * 7 + step * 3) % ids.len()];
                    let parent = ids[(t * 5 + step * 11 + 1) % ids.len()];
                    let target = if step % 5 == 0 { None } else { Some(parent) };
                    match svc.move_node(node, target) {
                        Ok(_) => {}
                        Err(e) => assert!(e.is_structural(), "unexpected error: {}", e),
                    }
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let forest = svc.get_tree(Audience::Admin).unwrap();
    assert_eq!(forest.len(), ids.len());
    assert!(forest.detached().is_empty());
    for node in forest.flatten() {
        let stored = svc.get_node(node.id).unwrap();
        assert_eq!(stored.depth, node.depth, "stale depth for {}", node.id);
    }
}
