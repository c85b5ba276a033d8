// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::mock_factory::MockSessionFactory;
use super::helpers::wait_until;
use seedcrawl::events::EventBus;
use seedcrawl::pool::session_pool::{SessionPool, SessionPoolConfig};
use seedcrawl::utils::errors::PoolError;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn pool_with(config: SessionPoolConfig, factory: Arc<MockSessionFactory>) -> SessionPool {
    SessionPool::new(config, factory, Arc::new(EventBus::new()))
}

fn config(max_size: usize, core_size: usize, initial_size: usize) -> SessionPoolConfig {
    SessionPoolConfig {
        max_size,
        core_size,
        initial_size,
        reuse_duration: Duration::ZERO,
        max_online_duration: None,
    }
}

#[tokio::test]
async fn test_init_then_replenish_to_core_size() {
    let factory = Arc::new(MockSessionFactory::new());
    let pool = pool_with(config(5, 2, 2), factory.clone());

    pool.init().await.unwrap();
    assert_eq!(pool.idle_count(), 2);
    assert_eq!(factory.created(), 2);

    let first = pool.borrow(Duration::ZERO).await.unwrap().unwrap();
    let second = pool.borrow(Duration::ZERO).await.unwrap().unwrap();
    assert_ne!(first.id(), second.id());

    let replenished = wait_until(Duration::from_secs(2), || pool.idle_count() == 2).await;
    assert!(replenished, "replenisher should restore idle sessions to core size");
    assert_eq!(pool.live_count(), 4);
    assert!(pool.live_count() <= pool.config().max_size);
}

#[tokio::test]
async fn test_init_is_idempotent() {
    let factory = Arc::new(MockSessionFactory::new());
    let pool = pool_with(config(5, 0, 3), factory.clone());

    let (a, b) = tokio::join!(pool.init(), pool.init());
    a.unwrap();
    b.unwrap();
    pool.init().await.unwrap();

    assert_eq!(factory.attempts(), 3);
    assert_eq!(pool.idle_count(), 3);
}

#[tokio::test]
async fn test_borrow_zero_wait_at_capacity_returns_none() {
    let factory = Arc::new(MockSessionFactory::new());
    let pool = pool_with(config(2, 0, 0), factory.clone());

    let _a = pool.borrow(Duration::ZERO).await.unwrap().unwrap();
    let _b = pool.borrow(Duration::ZERO).await.unwrap().unwrap();
    assert_eq!(pool.idle_count(), 0);

    let started = std::time::Instant::now();
    let none = pool.borrow(Duration::ZERO).await.unwrap();
    assert!(none.is_none());
    assert!(started.elapsed() < Duration::from_millis(100));
    assert_eq!(factory.created(), 2);
}

#[tokio::test]
async fn test_capacity_and_distinct_sessions() {
    let factory = Arc::new(MockSessionFactory::new());
    let pool = pool_with(config(3, 0, 0), factory.clone());

    let mut held = Vec::new();
    for _ in 0..3 {
        held.push(pool.borrow(Duration::ZERO).await.unwrap().unwrap());
    }
    let ids: HashSet<_> = held.iter().map(|s| s.id()).collect();
    assert_eq!(ids.len(), 3);
    assert_eq!(pool.live_count(), 3);
    assert!(pool.borrow(Duration::ZERO).await.unwrap().is_none());

    let returned = held.pop().unwrap();
    let returned_id = returned.id();
    pool.recycle(returned);

    let again = pool.borrow(Duration::ZERO).await.unwrap().unwrap();
    assert_eq!(again.id(), returned_id);
    assert_eq!(factory.created(), 3);
}

#[tokio::test]
async fn test_concurrent_borrowers_never_share_a_session() {
    let factory = Arc::new(MockSessionFactory::new());
    let pool = pool_with(config(3, 0, 0), factory.clone());
    let in_use = Arc::new(parking_lot::Mutex::new(HashSet::new()));
    let peak_live = Arc::new(AtomicUsize::new(0));

    let mut tasks = Vec::new();
    for _ in 0..12 {
        let pool = pool.clone();
        let in_use = in_use.clone();
        let peak_live = peak_live.clone();
        tasks.push(tokio::spawn(async move {
            let session = pool
                .borrow(Duration::from_secs(5))
                .await
                .unwrap()
                .expect("session within wait budget");
            assert!(in_use.lock().insert(session.id()), "session lent twice");
            peak_live.fetch_max(pool.live_count(), Ordering::SeqCst);

            tokio::time::sleep(Duration::from_millis(10)).await;

            in_use.lock().remove(&session.id());
            pool.recycle(session);
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    assert!(peak_live.load(Ordering::SeqCst) <= 3);
    assert!(factory.created() <= 3);
}

#[tokio::test]
async fn test_waiting_borrower_receives_recycled_session() {
    let factory = Arc::new(MockSessionFactory::new());
    let pool = pool_with(config(1, 0, 0), factory.clone());
    let held = pool.borrow(Duration::ZERO).await.unwrap().unwrap();
    let held_id = held.id();

    let waiter = {
        let pool = pool.clone();
        tokio::spawn(async move { pool.borrow(Duration::from_secs(2)).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    pool.recycle(held);

    let received = waiter.await.unwrap().unwrap().unwrap();
    assert_eq!(received.id(), held_id);
}

#[tokio::test(start_paused = true)]
async fn test_recently_used_session_is_kept_aside_not_destroyed() {
    let factory = Arc::new(MockSessionFactory::new());
    let mut cfg = config(1, 0, 0);
    cfg.reuse_duration = Duration::from_secs(10);
    let pool = pool_with(cfg, factory.clone());

    let session = pool.borrow(Duration::ZERO).await.unwrap().unwrap();
    let id = session.id();
    pool.feedback(session, true);

    // 刚用过的会话不会借出，但仍留在池中
    assert!(pool.borrow(Duration::ZERO).await.unwrap().is_none());
    assert_eq!(pool.idle_count(), 1);
    assert_eq!(pool.live_count(), 1);

    tokio::time::advance(Duration::from_secs(10)).await;

    let again = pool.borrow(Duration::ZERO).await.unwrap().unwrap();
    assert_eq!(again.id(), id);
    assert_eq!(factory.created(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_session_past_max_online_is_destroyed() {
    let factory = Arc::new(MockSessionFactory::new());
    let mut cfg = config(2, 0, 0);
    cfg.max_online_duration = Some(Duration::from_secs(5));
    let pool = pool_with(cfg, factory.clone());

    let old = pool.borrow(Duration::ZERO).await.unwrap().unwrap();
    let old_id = old.id();
    pool.recycle(old);

    tokio::time::advance(Duration::from_secs(6)).await;

    let fresh = pool.borrow(Duration::ZERO).await.unwrap().unwrap();
    assert_ne!(fresh.id(), old_id);
    assert_eq!(factory.created(), 2);
    assert_eq!(pool.idle_count(), 0);
    assert_eq!(pool.live_count(), 1);
}

#[tokio::test]
async fn test_invalid_session_is_not_recycled() {
    let factory = Arc::new(MockSessionFactory::new());
    let pool = pool_with(config(2, 0, 0), factory.clone());

    let mut session = pool.borrow(Duration::ZERO).await.unwrap().unwrap();
    session.invalidate();
    pool.recycle(session);

    assert_eq!(pool.idle_count(), 0);
    assert_eq!(pool.live_count(), 0);
}

#[tokio::test]
async fn test_repeated_failures_evict_session() {
    let factory = Arc::new(MockSessionFactory::new());
    let pool = pool_with(config(1, 0, 0), factory.clone());

    for _ in 0..3 {
        let session = pool.borrow(Duration::ZERO).await.unwrap().unwrap();
        pool.feedback(session, false);
    }

    assert_eq!(pool.idle_count(), 0);
    assert_eq!(pool.live_count(), 0);
    assert_eq!(factory.created(), 1);
}

#[tokio::test]
async fn test_session_rejected_by_created_handler() {
    let factory = Arc::new(MockSessionFactory::new());
    let events = Arc::new(EventBus::new());
    events.on_session_created(|session| session.invalidate());
    let pool = SessionPool::new(config(2, 0, 0), factory.clone(), events);

    assert!(pool.borrow(Duration::ZERO).await.unwrap().is_none());
    assert_eq!(pool.live_count(), 0);
    assert!(factory.created() >= 1);
}

#[tokio::test]
async fn test_borrowed_event_is_published() {
    let events = Arc::new(EventBus::new());
    let borrowed = Arc::new(AtomicUsize::new(0));
    let counter = borrowed.clone();
    events.on_session_borrowed(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    let pool = SessionPool::new(config(2, 0, 0), Arc::new(MockSessionFactory::new()), events);

    let session = pool.borrow(Duration::ZERO).await.unwrap().unwrap();
    pool.recycle(session);
    let _session = pool.borrow(Duration::ZERO).await.unwrap().unwrap();

    assert_eq!(borrowed.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_init_fails_after_bounded_attempts() {
    let factory = Arc::new(MockSessionFactory::failing());
    let pool = pool_with(config(5, 0, 2), factory.clone());

    let err = pool.init().await.unwrap_err();
    assert!(matches!(err, PoolError::InitFailed(_)));
    assert_eq!(factory.attempts(), 6);
    assert_eq!(pool.live_count(), 0);
}

#[tokio::test]
async fn test_invalid_size_relationship_rejected() {
    let factory = Arc::new(MockSessionFactory::new());
    let pool = pool_with(config(2, 3, 0), factory.clone());

    let err = pool.borrow(Duration::ZERO).await.unwrap_err();
    assert!(matches!(err, PoolError::InvalidConfig(_)));
    assert_eq!(factory.attempts(), 0);
}

#[tokio::test]
async fn test_shutdown_stops_replenishment() {
    let factory = Arc::new(MockSessionFactory::new());
    let pool = pool_with(config(4, 1, 1), factory.clone());
    pool.init().await.unwrap();
    pool.shutdown();
    tokio::time::sleep(Duration::from_millis(20)).await;

    let _held = pool.borrow(Duration::ZERO).await.unwrap().unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(pool.idle_count(), 0);
    assert_eq!(factory.created(), 1);
}
