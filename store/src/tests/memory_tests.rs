use std::sync::Arc;

use pretty_assertions::assert_eq;
use rstest::rstest;

use super::{block_id, create_test_block};
use crate::{BlockMemoryStore, InMemoryBlockRepository, StoreError};

fn empty_store(limit: usize) -> BlockMemoryStore {
    BlockMemoryStore::new(limit, Arc::new(InMemoryBlockRepository::new()))
}

#[test]
fn test_push_and_has() {
    let store = empty_store(10);
    let block = create_test_block(1, 2);
    let id = block.id;

    assert!(store.push(block).is_none());
    assert!(store.has(&id));
    assert_eq!(store.len(), 1);
    assert_eq!(store.transaction_count(), 2);
}

#[rstest]
#[case(1, 5)]
#[case(3, 10)]
#[case(10, 25)]
fn test_window_never_exceeds_limit(#[case] limit: usize, #[case] pushes: u64) {
    let store = empty_store(limit);
    for height in 1..=pushes {
        store.push(create_test_block(height, 1));
        assert!(store.len() <= limit);
    }
    assert_eq!(store.len(), limit);
    assert_eq!(store.get_last().unwrap().height, pushes);
    assert_eq!(store.get_genesis().unwrap().height, pushes - limit as u64 + 1);
}

#[test]
fn test_eviction_drops_transactions_of_evicted_block() {
    let store = empty_store(2);
    let first = create_test_block(1, 3);
    let first_transactions: Vec<_> = first.transaction_ids().collect();

    store.push(first);
    store.push(create_test_block(2, 3));
    let evicted = store.push(create_test_block(3, 3)).unwrap();

    assert_eq!(evicted.height, 1);
    for id in &first_transactions {
        assert!(!store.has_transaction(id));
    }
    assert_eq!(store.transaction_count(), 6);
}

#[test]
fn test_header_index_survives_eviction() {
    let store = empty_store(1);
    store.push(create_test_block(1, 0));
    store.push(create_test_block(2, 0));

    let evicted_id = block_id(1, 0);
    assert!(store.has(&evicted_id));
    assert_eq!(store.get_headers_by_id(&evicted_id).unwrap().height, 1);
}

#[test]
fn test_duplicate_push_is_ignored() {
    let store = empty_store(10);
    store.push(create_test_block(1, 1));
    store.push(create_test_block(1, 1));
    assert_eq!(store.len(), 1);
}

#[test]
fn test_pop_clears_header_entry() {
    let store = empty_store(10);
    store.push(create_test_block(1, 0));
    store.push(create_test_block(2, 2));

    let popped = store.pop().unwrap();
    assert_eq!(popped.height, 2);
    assert!(!store.has(&popped.id));
    assert_eq!(store.get_last().unwrap().height, 1);
    assert_eq!(store.transaction_count(), 0);
}

#[test]
fn test_pop_last_keeps_header_entry() {
    let store = empty_store(10);
    store.push(create_test_block(1, 0));
    store.push(create_test_block(2, 0));

    let popped = store.pop_last().unwrap();
    assert_eq!(popped.height, 2);
    assert!(store.has(&popped.id));
    assert_eq!(store.len(), 1);
}

#[test]
fn test_pop_on_empty_window() {
    let store = empty_store(10);
    assert!(store.pop().is_none());
    assert!(store.pop_last().is_none());
}

#[test]
fn test_positional_reads_on_empty_window() {
    let store = empty_store(10);
    assert_eq!(store.get_genesis(), Err(StoreError::NotFound));
    assert_eq!(store.get_last(), Err(StoreError::NotFound));
}

#[tokio::test]
async fn test_get_by_id_falls_back_to_repository() {
    let repository = Arc::new(InMemoryBlockRepository::with_blocks(
        (1..=5).map(|height| create_test_block(height, 0)),
    ));
    let store = BlockMemoryStore::new(2, repository);
    store.push(create_test_block(4, 0));
    store.push(create_test_block(5, 0));

    assert_eq!(store.get_by_id(&block_id(5, 0)).await.unwrap().height, 5);
    assert_eq!(store.get_by_id(&block_id(1, 0)).await.unwrap().height, 1);
    assert_eq!(
        store.get_by_id(&block_id(9, 0)).await,
        Err(StoreError::NotFound)
    );
}

#[tokio::test]
async fn test_get_many_from_memory() {
    let store = empty_store(10);
    for height in 1..=6 {
        store.push(create_test_block(height, 0));
    }

    let heights: Vec<_> = store
        .get_many(3, 2)
        .await
        .unwrap()
        .iter()
        .map(|block| block.height)
        .collect();
    assert_eq!(heights, vec![2, 3, 4]);
}

#[tokio::test]
async fn test_get_many_older_than_window_uses_repository() {
    let repository = Arc::new(InMemoryBlockRepository::with_blocks(
        (1..=10).map(|height| create_test_block(height, 0)),
    ));
    let store = BlockMemoryStore::new(2, repository);
    store.push(create_test_block(9, 0));
    store.push(create_test_block(10, 0));

    let heights: Vec<_> = store
        .get_many(3, 2)
        .await
        .unwrap()
        .iter()
        .map(|block| block.height)
        .collect();
    assert_eq!(heights, vec![2, 3, 4]);

    let heights: Vec<_> = store
        .get_many(3, 8)
        .await
        .unwrap()
        .iter()
        .map(|block| block.height)
        .collect();
    assert_eq!(heights, vec![8, 9, 10]);

    let heights: Vec<_> = store
        .get_many(3, 20)
        .await
        .unwrap()
        .iter()
        .map(|block| block.height)
        .collect();
    assert!(heights.is_empty());

    let heights: Vec<_> = store
        .get_many(3, 9)
        .await
        .unwrap()
        .iter()
        .map(|block| block.height)
        .collect();
    assert_eq!(heights, vec![9, 10]);
}
