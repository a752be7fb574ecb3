//! Concurrency tests for the skill repository.
//!
//! Many threads hammer one shared repository; the outcomes must be the same
//! as if the operations had run one after another.

use std::sync::{Arc, Barrier};
use std::thread;

use skilld_repository::{ErrorKind, Repository, Skill, Slot, TestType};

const THREADS: usize = 16;

fn shared_repository() -> Arc<Repository> {
    let repo = Repository::new();
    repo.add_type(Arc::new(TestType::new("net"))).unwrap();
    Arc::new(repo)
}

/// Run `f` on `THREADS` threads released at the same instant.
fn race<T, F>(repo: &Arc<Repository>, f: F) -> Vec<T>
where
    T: Send + 'static,
    F: Fn(&Repository, usize) -> T + Send + Sync + 'static,
{
    let barrier = Arc::new(Barrier::new(THREADS));
    let f = Arc::new(f);
    let handles: Vec<_> = (0..THREADS)
        .map(|i| {
            let repo = Arc::clone(repo);
            let barrier = Arc::clone(&barrier);
            let f = Arc::clone(&f);
            thread::spawn(move || {
                barrier.wait();
                f(repo.as_ref(), i)
            })
        })
        .collect();
    handles.into_iter().map(|h| h.join().unwrap()).collect()
}

#[test]
fn test_concurrent_grant_same_pair() {
    let repo = shared_repository();
    repo.add_skill(Skill::new("app1", "iface", "net")).unwrap();
    repo.add_slot(Slot::new("app2", "uplink", "net")).unwrap();

    let results = race(&repo, |repo, _| repo.grant("app1", "iface", "app2", "uplink"));

    let granted = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(granted, 1);
    for result in results.iter().filter(|r| r.is_err()) {
        let err = result.as_ref().unwrap_err();
        assert!(matches!(err.kind, ErrorKind::AlreadyGranted { .. }));
    }
    assert_eq!(repo.grant_count(), 1);
    assert!(repo.check_integrity());
}

#[test]
fn test_concurrent_add_same_skill() {
    let repo = shared_repository();

    let results = race(&repo, |repo, i| {
        repo.add_skill(Skill::new("app1", "iface", "net").with_attr("writer", i as i64))
    });

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| matches!(e.kind, ErrorKind::NameConflict { .. })));
    assert_eq!(repo.all_skills("").len(), 1);
}

#[test]
fn test_concurrent_revoke_and_remove() {
    let repo = shared_repository();
    repo.add_skill(Skill::new("app1", "iface", "net")).unwrap();
    repo.add_slot(Slot::new("app2", "uplink", "net")).unwrap();
    repo.grant("app1", "iface", "app2", "uplink").unwrap();

    // Half the threads revoke, half try to remove the skill. Removal may
    // only succeed once the single revoke has happened.
    let results = race(&repo, |repo, i| {
        if i % 2 == 0 {
            repo.revoke("app1", "iface", "app2", "uplink").map(|_| "revoke")
        } else {
            repo.remove_skill("app1", "iface").map(|_| "remove")
        }
    });

    let ok: Vec<&str> = results.iter().filter_map(|r| r.as_ref().ok().copied()).collect();
    assert_eq!(ok.iter().filter(|op| **op == "revoke").count(), 1);
    assert!(ok.iter().filter(|op| **op == "remove").count() <= 1);
    assert!(!repo.is_granted("app1", "iface", "app2", "uplink"));
    assert!(repo.check_integrity());
}

#[test]
fn test_concurrent_mixed_workload_keeps_index_consistent() {
    let repo = shared_repository();
    for i in 0..THREADS {
        repo.add_skill(Skill::new(format!("provider{i}"), "iface", "net"))
            .unwrap();
        repo.add_slot(Slot::new(format!("consumer{i}"), "uplink", "net"))
            .unwrap();
    }

    race(&repo, |repo, i| {
        for j in 0..THREADS {
            let provider = format!("provider{j}");
            let consumer = format!("consumer{i}");
            let _ = repo.grant(&provider, "iface", &consumer, "uplink");
            if j % 3 == 0 {
                let _ = repo.revoke(&provider, "iface", &consumer, "uplink");
            }
        }
    });

    assert!(repo.check_integrity());
    let expected = THREADS * (0..THREADS).filter(|j| j % 3 != 0).count();
    assert_eq!(repo.grant_count(), expected);
    for i in 0..THREADS {
        let granted = repo.granted_to(&format!("consumer{i}"));
        assert_eq!(granted.len(), 1);
        let providers: Vec<String> = granted[0].1.iter().map(|s| s.snap.clone()).collect();
        let mut sorted = providers.clone();
        sorted.sort();
        assert_eq!(providers, sorted);
    }
}
