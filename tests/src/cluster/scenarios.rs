//! Full nodes on one in-process bus.
//!
//! A message typed into any node is signed, gossiped to every mempool, packed
//! into a block by the producer and committed by every node.

#![cfg(test)]

use std::sync::Arc;

use chain::{
    genesis::GENESIS_HASH,
    services::CommitOutcome,
    storage::Database,
    validation::ValidationError,
};
use p2p::LocalBus;
use tokio_util::sync::CancellationToken;

use crate::helpers::{
    SETTLE_TIMEOUT, TestNode, create_test_logger, follower_config, producer_config, wait_until,
};

fn spawn_cluster(bus: &LocalBus, followers: usize, cancel: &CancellationToken) -> Vec<TestNode> {
    let logger = create_test_logger();
    let mut nodes = Vec::with_capacity(followers + 1);
    for i in 0..=followers {
        let endpoint = Arc::new(bus.endpoint());
        let config = if i == 0 {
            producer_config()
        } else {
            follower_config()
        };
        nodes.push(TestNode::spawn(
            &format!("node-{i}"),
            endpoint.clone(),
            endpoint,
            config,
            cancel.clone(),
            &logger,
        ));
    }
    nodes
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn message_from_follower_is_committed_everywhere() {
    let bus = LocalBus::new(256);
    let cancel = CancellationToken::new();
    let nodes = spawn_cluster(&bus, 2, &cancel);

    for node in &nodes {
        assert_eq!(node.head().hash().unwrap(), GENESIS_HASH);
    }

    nodes[2].submit("hello from the edge").await;

    let settled = wait_until(SETTLE_TIMEOUT, || {
        nodes.iter().all(|n| n.head().height() == 1 && n.pending() == 0)
    })
    .await;
    assert!(settled, "cluster did not commit the block");

    let head = nodes[0].head();
    assert_eq!(head.parent_hash(), GENESIS_HASH);
    assert_eq!(head.transactions.len(), 1);
    assert_eq!(head.transactions[0].data, "hello from the edge");
    assert_eq!(
        head.transactions[0].from,
        nodes[2].components.wallet.address()
    );
    for node in &nodes[1..] {
        assert_eq!(node.head(), head);
    }

    cancel.cancel();
    for node in nodes {
        node.stop().await;
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn redelivered_block_is_known_everywhere() {
    let bus = LocalBus::new(256);
    let cancel = CancellationToken::new();
    let nodes = spawn_cluster(&bus, 1, &cancel);

    nodes[0].submit("once").await;
    assert!(wait_until(SETTLE_TIMEOUT, || nodes.iter().all(|n| n.head().height() == 1)).await);

    let block = nodes[0].head();
    let hash = block.hash().unwrap();
    for node in &nodes {
        let outcome = node
            .components
            .block_processing_service()
            .process_block(&block)
            .unwrap();
        assert!(
            matches!(outcome, CommitOutcome::Rejected(ValidationError::KnownBlock(h)) if h == hash)
        );
        assert_eq!(node.head(), block);
    }

    cancel.cancel();
    for node in nodes {
        node.stop().await;
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn successive_blocks_extend_the_chain() {
    let bus = LocalBus::new(256);
    let cancel = CancellationToken::new();
    let nodes = spawn_cluster(&bus, 1, &cancel);

    nodes[1].submit("first").await;
    assert!(wait_until(SETTLE_TIMEOUT, || nodes.iter().all(|n| n.head().height() == 1)).await);
    let first = nodes[1].head();

    nodes[1].submit("second").await;
    assert!(wait_until(SETTLE_TIMEOUT, || nodes.iter().all(|n| n.head().height() == 2)).await);
    let second = nodes[1].head();

    assert_eq!(second.parent_hash(), first.hash().unwrap());
    assert_eq!(second.transactions[0].data, "second");
    assert_eq!(nodes[0].head(), second);

    cancel.cancel();
    for node in nodes {
        node.stop().await;
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn duplicate_messages_land_once_per_block() {
    let bus = LocalBus::new(256);
    let cancel = CancellationToken::new();
    let nodes = spawn_cluster(&bus, 1, &cancel);

    // the same node signing the same payload twice yields the same
    // transaction, which the pool deduplicates
    nodes[1].submit("again").await;
    nodes[1].submit("again").await;

    assert!(wait_until(SETTLE_TIMEOUT, || nodes.iter().all(|n| n.head().height() >= 1)).await);
    let committed: usize = {
        let mut count = 0;
        let mut block = nodes[0].head();
        while block.height() > 0 {
            count += block.transactions.len();
            block = nodes[0]
                .components
                .db
                .get_block_by_hash(&block.parent_hash())
                .unwrap();
        }
        count
    };
    // a second block may carry the duplicate if it arrived after the first
    // block pruned the pool
    assert!((1..=2).contains(&committed), "committed {committed}");

    cancel.cancel();
    for node in nodes {
        node.stop().await;
    }
}
