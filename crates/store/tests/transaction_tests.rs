//! Integration tests for the transactional key/value store
//!
//! These exercise the optimistic-concurrency protocol end to end:
//! snapshot isolation, replay-based conflict detection, and the
//! interleavings a reactive host actually produces.

use cascade_core::{Error, OperationError};
use cascade_store::{InMemoryKeyValueStore, TransactionStatus};
use std::sync::Arc;
use std::thread;

// ============================================================================
// Basic lifecycle
// ============================================================================

#[test]
fn test_add_commit_then_read_in_fresh_transaction() {
    let store = InMemoryKeyValueStore::new();

    let mut tx = store.create_transaction();
    tx.table("t").unwrap().add("k1", vec![1, 2, 3]).unwrap();
    tx.commit().unwrap();

    let mut tx = store.create_transaction();
    assert!(tx.table("t").unwrap().contains("k1").unwrap());
    assert_eq!(tx.table("t").unwrap().get("k1").unwrap(), vec![1, 2, 3]);

    let mut tx = store.create_transaction();
    tx.table("t").unwrap().remove("k1").unwrap();
    tx.commit().unwrap();

    let mut tx = store.create_transaction();
    assert!(!tx.table("t").unwrap().contains("k1").unwrap());
}

#[test]
fn test_empty_transaction_commits() {
    let store = InMemoryKeyValueStore::new();
    let mut tx = store.create_transaction();
    tx.commit().unwrap();
    assert_eq!(tx.status(), TransactionStatus::Committed);
}

// ============================================================================
// Snapshot isolation
// ============================================================================

#[test]
fn test_buffered_reads_see_pre_commit_state() {
    let store = InMemoryKeyValueStore::new();
    let mut setup = store.create_transaction();
    setup.table("t").unwrap().add("k", vec![1]).unwrap();
    setup.commit().unwrap();

    // B opens before A commits its update.
    let mut b = store.create_transaction();

    let mut a = store.create_transaction();
    a.table("t").unwrap().update("k", vec![2]).unwrap();
    a.commit().unwrap();

    // B's buffered read observes pre-A state.
    assert_eq!(b.table("t").unwrap().get("k").unwrap(), vec![1]);
}

#[test]
fn test_stale_write_conflicts_at_commit() {
    let store = InMemoryKeyValueStore::new();
    let mut setup = store.create_transaction();
    setup.table("t").unwrap().add("k", vec![1]).unwrap();
    setup.commit().unwrap();

    let mut b = store.create_transaction();

    let mut a = store.create_transaction();
    a.table("t").unwrap().update("k", vec![2]).unwrap();
    a.commit().unwrap();

    // B read and then wrote the key A changed; its replay observes a
    // different sequence and the whole commit aborts.
    assert_eq!(b.table("t").unwrap().get("k").unwrap(), vec![1]);
    b.table("t").unwrap().update("k", vec![3]).unwrap();
    let err = b.commit();
    assert!(matches!(err, Err(Error::WriteConflict { .. })));
    assert_eq!(b.status(), TransactionStatus::RolledBack);

    // The conflicting commit installed nothing.
    let mut check = store.create_transaction();
    assert_eq!(check.table("t").unwrap().get("k").unwrap(), vec![2]);
}

#[test]
fn test_blind_write_still_conflicts() {
    let store = InMemoryKeyValueStore::new();
    let mut setup = store.create_transaction();
    setup.table("t").unwrap().add("k", vec![1]).unwrap();
    setup.commit().unwrap();

    let mut b = store.create_transaction();

    let mut a = store.create_transaction();
    a.table("t").unwrap().update("k", vec![2]).unwrap();
    a.commit().unwrap();

    // No read in B; the update itself observed the replaced sequence.
    b.table("t").unwrap().update("k", vec![3]).unwrap();
    assert!(matches!(b.commit(), Err(Error::WriteConflict { .. })));
}

#[test]
fn test_concurrent_adds_of_same_key_conflict() {
    let store = InMemoryKeyValueStore::new();

    let mut a = store.create_transaction();
    let mut b = store.create_transaction();
    a.table("t").unwrap().add("k", vec![1]).unwrap();
    b.table("t").unwrap().add("k", vec![2]).unwrap();

    a.commit().unwrap();
    assert!(matches!(b.commit(), Err(Error::WriteConflict { .. })));
}

#[test]
fn test_disjoint_keys_do_not_conflict() {
    let store = InMemoryKeyValueStore::new();

    let mut a = store.create_transaction();
    let mut b = store.create_transaction();
    a.table("t").unwrap().add("ka", vec![1]).unwrap();
    b.table("t").unwrap().add("kb", vec![2]).unwrap();

    a.commit().unwrap();
    b.commit().unwrap();

    let mut check = store.create_transaction();
    assert!(check.table("t").unwrap().contains("ka").unwrap());
    assert!(check.table("t").unwrap().contains("kb").unwrap());
}

#[test]
fn test_unrelated_commits_do_not_disturb_own_write_reads() {
    let store = InMemoryKeyValueStore::new();

    // B writes and re-reads its own key while A commits elsewhere.
    let mut b = store.create_transaction();
    b.table("t").unwrap().add("mine", vec![1]).unwrap();
    assert_eq!(b.table("t").unwrap().get("mine").unwrap(), vec![1]);

    let mut a = store.create_transaction();
    a.table("other").unwrap().add("x", vec![9]).unwrap();
    a.commit().unwrap();

    // The replay of B's own-write read is independent of how far the
    // global sequence advanced.
    b.commit().unwrap();
}

#[test]
fn test_enumerate_membership_is_part_of_the_read_set() {
    let store = InMemoryKeyValueStore::new();
    let mut setup = store.create_transaction();
    setup.table("t").unwrap().add("a", vec![1]).unwrap();
    setup.commit().unwrap();

    let mut b = store.create_transaction();
    assert_eq!(b.table("t").unwrap().keys().unwrap(), vec!["a"]);
    b.table("t").unwrap().add("b", vec![2]).unwrap();

    // A concurrently changes the table's membership.
    let mut a = store.create_transaction();
    a.table("t").unwrap().add("c", vec![3]).unwrap();
    a.commit().unwrap();

    assert!(matches!(b.commit(), Err(Error::WriteConflict { .. })));
}

#[test]
fn test_contains_only_observes_presence() {
    let store = InMemoryKeyValueStore::new();
    let mut setup = store.create_transaction();
    setup.table("t").unwrap().add("k", vec![1]).unwrap();
    setup.commit().unwrap();

    // B only asks for presence; A changes the value but not membership.
    let mut b = store.create_transaction();
    assert!(b.table("t").unwrap().contains("k").unwrap());

    let mut a = store.create_transaction();
    a.table("t").unwrap().update("k", vec![2]).unwrap();
    a.commit().unwrap();

    // Presence is unchanged, so B commits.
    b.commit().unwrap();
}

// ============================================================================
// Retry-on-conflict is the caller's job
// ============================================================================

#[test]
fn test_caller_retry_succeeds_after_conflict() {
    let store = InMemoryKeyValueStore::new();
    let mut setup = store.create_transaction();
    setup.table("t").unwrap().add("k", vec![0]).unwrap();
    setup.commit().unwrap();

    let mut stale = store.create_transaction();
    stale.table("t").unwrap().get("k").unwrap();

    let mut winner = store.create_transaction();
    winner.table("t").unwrap().update("k", vec![1]).unwrap();
    winner.commit().unwrap();

    stale.table("t").unwrap().update("k", vec![2]).unwrap();
    assert!(matches!(stale.commit(), Err(Error::WriteConflict { .. })));

    // Fresh transaction sees the winner's value and succeeds.
    let mut retry = store.create_transaction();
    assert_eq!(retry.table("t").unwrap().get("k").unwrap(), vec![1]);
    retry.table("t").unwrap().update("k", vec![2]).unwrap();
    retry.commit().unwrap();
}

#[test]
fn test_contending_threads_one_winner_per_round() {
    let store = Arc::new(InMemoryKeyValueStore::new());
    let mut setup = store.create_transaction();
    setup.table("t").unwrap().add("counter", vec![0]).unwrap();
    setup.commit().unwrap();

    let threads: Vec<_> = (0..4)
        .map(|_| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                let mut applied = 0u8;
                while applied < 8 {
                    let mut tx = store.create_transaction();
                    let current = tx.table("t").unwrap().get("counter").unwrap();
                    tx.table("t")
                        .unwrap()
                        .update("counter", vec![current[0] + 1])
                        .unwrap();
                    match tx.commit() {
                        Ok(()) => applied += 1,
                        Err(Error::WriteConflict { .. }) => {}
                        Err(e) => panic!("unexpected error: {e}"),
                    }
                }
            })
        })
        .collect();
    for t in threads {
        t.join().unwrap();
    }

    // Every successful increment is accounted for exactly once.
    let mut check = store.create_transaction();
    assert_eq!(check.table("t").unwrap().get("counter").unwrap(), vec![32]);
}

// ============================================================================
// Error surfacing
// ============================================================================

#[test]
fn test_logical_errors_surface_immediately() {
    let store = InMemoryKeyValueStore::new();
    let mut tx = store.create_transaction();

    assert!(matches!(
        tx.table("t").unwrap().get("missing"),
        Err(Error::Operation(OperationError::KeyNotFound(_)))
    ));
    assert!(matches!(
        tx.table("t").unwrap().update("missing", vec![1]),
        Err(Error::Operation(OperationError::KeyNotFound(_)))
    ));
    assert!(matches!(
        tx.table("t").unwrap().remove("missing"),
        Err(Error::Operation(OperationError::KeyNotFound(_)))
    ));
}
