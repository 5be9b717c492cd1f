//! Full nodes connected over the TCP gossip transport.

#![cfg(test)]

use std::sync::Arc;

use chain::genesis::GENESIS_HASH;
use p2p::{NetworkService, P2PConfig};
use tokio_util::sync::CancellationToken;

use crate::helpers::{
    SETTLE_TIMEOUT, TestNode, create_test_logger, follower_config, producer_config, wait_until,
};

fn loopback_config(peers: Vec<std::net::SocketAddr>) -> P2PConfig {
    P2PConfig {
        listen_addr: "127.0.0.1:0".parse().unwrap(),
        peers,
        dial_retry_ms: 50,
        ..P2PConfig::default()
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn two_nodes_commit_over_tcp() {
    let logger = create_test_logger();
    let cancel = CancellationToken::new();

    let producer_net = NetworkService::start(loopback_config(vec![]), cancel.clone(), logger.clone())
        .await
        .unwrap();
    let follower_net = NetworkService::start(
        loopback_config(vec![producer_net.local_addr()]),
        cancel.clone(),
        logger.clone(),
    )
    .await
    .unwrap();

    assert!(
        wait_until(SETTLE_TIMEOUT, || {
            producer_net.peer_count() == 1 && follower_net.peer_count() == 1
        })
        .await,
        "peers did not connect"
    );

    let producer = TestNode::spawn(
        "producer",
        producer_net.clone(),
        producer_net.clone(),
        producer_config(),
        cancel.clone(),
        &logger,
    );
    let follower = TestNode::spawn(
        "follower",
        follower_net.clone(),
        follower_net.clone(),
        follower_config(),
        cancel.clone(),
        &logger,
    );

    follower.submit("over the wire").await;

    let settled = wait_until(SETTLE_TIMEOUT, || {
        [&producer, &follower]
            .iter()
            .all(|n| n.head().height() == 1 && n.pending() == 0)
    })
    .await;
    assert!(settled, "block was not committed on both nodes");

    let head = follower.head();
    assert_eq!(head, producer.head());
    assert_eq!(head.parent_hash(), GENESIS_HASH);
    assert_eq!(head.transactions[0].data, "over the wire");
    assert_eq!(head.transactions[0].from, follower.components.wallet.address());

    cancel.cancel();
    producer.stop().await;
    follower.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn late_dialer_catches_new_blocks() {
    let logger = create_test_logger();
    let cancel = CancellationToken::new();

    let producer_net = NetworkService::start(loopback_config(vec![]), cancel.clone(), logger.clone())
        .await
        .unwrap();
    let producer = TestNode::spawn(
        "producer",
        producer_net.clone(),
        producer_net.clone(),
        producer_config(),
        cancel.clone(),
        &logger,
    );

    let follower_net: Arc<NetworkService> = NetworkService::start(
        loopback_config(vec![producer_net.local_addr()]),
        cancel.clone(),
        logger.clone(),
    )
    .await
    .unwrap();
    let follower = TestNode::spawn(
        "follower",
        follower_net.clone(),
        follower_net.clone(),
        follower_config(),
        cancel.clone(),
        &logger,
    );
    assert!(wait_until(SETTLE_TIMEOUT, || producer_net.peer_count() == 1).await);

    producer.submit("after connect").await;

    assert!(
        wait_until(SETTLE_TIMEOUT, || follower.head().height() == 1).await,
        "follower did not commit"
    );
    assert_eq!(follower.head(), producer.head());

    cancel.cancel();
    producer.stop().await;
    follower.stop().await;
}
