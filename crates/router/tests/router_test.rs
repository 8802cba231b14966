//! Router behaviour against the in-memory engine.

use std::time::Duration;

use cluster_mgmt_bootable::Bootable;
use cluster_mgmt_membership::{AnyIndependentWitness, MemberStatus, NodeId, UnreachabilityCurator};
use cluster_mgmt_membership_mock::MockMembershipEngine;
use cluster_mgmt_router::{CommandFailure, CommandRouter, RouterConfig};
use pretty_assertions::assert_eq;
use tracing_test::traced_test;

fn node(name: &str) -> NodeId {
    NodeId::new(format!("akka.tcp://sys@{name}:2552"))
}

fn five_node_engine() -> MockMembershipEngine {
    let engine = MockMembershipEngine::new(node("a"));
    for name in ["a", "b", "c", "d", "e"] {
        engine.add_member(node(name), MemberStatus::Up, Vec::new());
    }
    engine.set_leader(Some(node("a")));
    engine
}

async fn started(
    engine: MockMembershipEngine,
    config: RouterConfig,
) -> CommandRouter<MockMembershipEngine> {
    let router = CommandRouter::new(engine, config);
    router.start().await.unwrap();
    router
}

#[tokio::test]
#[traced_test]
async fn test_leave_and_down_unknown_member_fail() {
    let router = started(five_node_engine(), RouterConfig::default()).await;
    let handle = router.handle();

    assert_eq!(
        handle.leave(node("zz")).await,
        Err(CommandFailure::MemberNotFound)
    );
    assert_eq!(
        handle.down(node("zz")).await,
        Err(CommandFailure::MemberNotFound)
    );
    assert_eq!(
        handle.down(node("zz")).await.unwrap_err().reason(),
        "member not found"
    );

    router.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_join_unknown_address_succeeds() {
    let engine = five_node_engine();
    let router = started(engine.clone(), RouterConfig::default()).await;

    let message = router.handle().join(node("zz")).await.unwrap();

    assert_eq!(message, format!("joining {}", node("zz")));
    assert_eq!(engine.join_requests(), vec![node("zz")]);

    router.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_leave_and_down_update_engine() {
    let engine = five_node_engine();
    let router = started(engine.clone(), RouterConfig::default()).await;
    let handle = router.handle();

    assert_eq!(
        handle.leave(node("b")).await.unwrap(),
        format!("leaving {}", node("b"))
    );
    assert_eq!(
        handle.down(node("c")).await.unwrap(),
        format!("downing {}", node("c"))
    );

    assert_eq!(handle.get_member(node("b")).await.unwrap().status, MemberStatus::Leaving);
    assert_eq!(handle.get_member(node("c")).await.unwrap().status, MemberStatus::Down);

    router.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_get_members_snapshot() {
    let engine = five_node_engine();
    engine.set_status(&node("a"), MemberStatus::Joining).unwrap();
    let router = started(engine, RouterConfig::default()).await;

    let snapshot = router.handle().get_members().await.unwrap();

    assert_eq!(snapshot.self_node, node("a"));
    assert_eq!(snapshot.members.len(), 5);
    assert_eq!(snapshot.leader, Some(node("a")));
    // a is the oldest by join order but is not Up.
    assert_eq!(snapshot.oldest, Some(node("b")));

    router.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_get_member_not_found() {
    let router = started(five_node_engine(), RouterConfig::default()).await;

    assert_eq!(
        router.handle().get_member(node("zz")).await,
        Err(CommandFailure::MemberNotFound)
    );

    router.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_shard_info() {
    let engine = five_node_engine();
    engine.start_shard_region("users", [("1".to_string(), 10), ("2".to_string(), 4)]);
    let router = started(engine, RouterConfig::default()).await;
    let handle = router.handle();

    let stats = handle.get_shard_info("users").await.unwrap();
    assert_eq!(stats.shards.len(), 2);
    assert_eq!(stats.shards[0].entity_count, 10);

    let failure = handle.get_shard_info("orders").await.unwrap_err();
    assert_eq!(failure, CommandFailure::ShardRegionNotStarted("orders".to_string()));
    assert!(failure.reason().contains("must be started first"));

    router.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_unresponsive_shard_region_fails_within_timeout() {
    let engine = five_node_engine();
    engine.start_unresponsive_shard_region("users");
    let router = started(engine, RouterConfig::default()).await;

    let started_at = tokio::time::Instant::now();
    let failure = router.handle().get_shard_info("users").await.unwrap_err();

    assert_eq!(failure, CommandFailure::ShardRegionNotResponding("users".to_string()));
    assert!(failure.reason().contains("not responding, may have been terminated"));
    assert!(started_at.elapsed() <= Duration::from_secs(5));

    // The mailbox keeps going after the timed out call.
    assert!(router.handle().get_members().await.is_ok());

    router.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_unresponsive_shard_region_with_short_ask_timeout() {
    let engine = five_node_engine();
    engine.start_unresponsive_shard_region("users");
    let config = RouterConfig {
        ask_timeout: Duration::from_secs(2),
        ..RouterConfig::default()
    };
    let router = started(engine, config).await;

    let started_at = tokio::time::Instant::now();
    let failure = router.handle().get_shard_info("users").await.unwrap_err();

    assert_eq!(failure, CommandFailure::ShardRegionNotResponding("users".to_string()));
    assert!(started_at.elapsed() <= Duration::from_secs(2));

    router.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_scaled_engine_timeout_reports_before_ask_timeout() {
    let engine = five_node_engine();
    engine.start_unresponsive_shard_region("users");
    let config = RouterConfig::default()
        .with_ask_timeout(Duration::from_secs(2));
    let router = started(engine, config).await;

    let started_at = tokio::time::Instant::now();
    let failure = router.handle().get_shard_info("users").await.unwrap_err();

    assert_eq!(failure, CommandFailure::ShardRegionNotResponding("users".to_string()));
    assert!(started_at.elapsed() < Duration::from_secs(2));

    // The mailbox is free again before the next caller's budget runs out.
    assert!(router.handle().get_members().await.is_ok());

    router.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_ask_times_out_behind_slow_command() {
    let engine = five_node_engine();
    engine.set_mutation_delay(Some(Duration::from_secs(2)));
    let config = RouterConfig {
        ask_timeout: Duration::from_secs(1),
        ..RouterConfig::default()
    };
    let router = started(engine.clone(), config).await;

    assert_eq!(
        router.handle().join(node("zz")).await,
        Err(CommandFailure::Timeout)
    );

    // The engine call was not cancelled by the caller giving up.
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(engine.join_requests(), vec![node("zz")]);

    router.shutdown().await.unwrap();
}

#[tokio::test]
#[traced_test]
async fn test_engine_panic_is_contained() {
    let engine = five_node_engine();
    engine.set_panic_on_mutation(true);
    let router = started(engine.clone(), RouterConfig::default()).await;
    let handle = router.handle();

    let failure = handle.down(node("b")).await.unwrap_err();
    assert!(matches!(failure, CommandFailure::Unexpected(_)));
    assert!(failure.reason().contains("panicked"));

    engine.set_panic_on_mutation(false);
    assert!(handle.down(node("b")).await.is_ok());
    assert!(logs_contain("down failed"));

    router.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_engine_unavailable_is_unexpected_failure() {
    let engine = five_node_engine();
    engine.set_available(false);
    let router = started(engine, RouterConfig::default()).await;

    let failure = router.handle().get_members().await.unwrap_err();

    assert_eq!(
        failure,
        CommandFailure::Unexpected("membership engine is unavailable".to_string())
    );

    router.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_commands_run_in_arrival_order() {
    let engine = five_node_engine();
    engine.set_mutation_delay(Some(Duration::from_millis(100)));
    let router = started(engine, RouterConfig::default()).await;
    let handle = router.handle();

    let (down, member) = tokio::join!(handle.down(node("b")), handle.get_member(node("b")));

    assert!(down.is_ok());
    assert_eq!(member.unwrap().status, MemberStatus::Down);

    router.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_unreachable_raw_and_curated() {
    let engine = five_node_engine();
    engine.mark_unreachable(node("c"), [node("d"), node("e")]);
    let router = started(engine.clone(), RouterConfig::default()).await;
    let handle = router.handle();

    let raw = handle.get_unreachable(false).await.unwrap();
    assert_eq!(raw.len(), 1);
    assert_eq!(raw[0].node, node("c"));

    // Two independent witnesses are short of min(5, 5/2 + 1) = 3.
    assert!(handle.get_unreachable(true).await.unwrap().is_empty());

    router.shutdown().await.unwrap();

    let config = RouterConfig {
        curator: UnreachabilityCurator::new(AnyIndependentWitness),
        ..RouterConfig::default()
    };
    let router = started(engine, config).await;

    let curated = router.handle().get_unreachable(true).await.unwrap();
    assert_eq!(curated.len(), 1);
    assert_eq!(curated[0].node, node("c"));

    router.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_start_twice_fails() {
    let router = started(five_node_engine(), RouterConfig::default()).await;

    assert!(router.start().await.is_err());

    router.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_commands_after_shutdown_are_unavailable() {
    let router = started(five_node_engine(), RouterConfig::default()).await;
    let handle = router.handle();

    router.shutdown().await.unwrap();

    assert_eq!(handle.get_members().await, Err(CommandFailure::Unavailable));
}
