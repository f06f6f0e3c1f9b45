//! # Lifecycle Tests
//!
//! start/stop semantics, collaborator subscriptions and hashrate reporting.

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use block_miner::{MinerConfig, MinerEvent, MinerService, MinerState, MinerTopic};
    use shared_bus::EventFilter;
    use std::sync::atomic::Ordering;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio_stream::StreamExt;

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_double_start_creates_one_session() {
        let h = Harness::new(Arc::new(NeverEngine::default()));
        let mut lifecycle = h.events(vec![MinerTopic::Lifecycle]);

        h.miner.start(None).await;
        h.miner.start(None).await;
        assert_eq!(h.mempool.event_bus().subscriber_count(), 1);

        h.mempool.notify_ready();
        let metrics = h.miner.metrics();
        wait_until("session", || metrics.get_sessions_started() == 1).await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(metrics.get_sessions_started(), 1);

        // Exactly one Started was published.
        assert!(matches!(
            next_event(&mut lifecycle).await,
            MinerEvent::Started { .. }
        ));
        assert_eq!(lifecycle.try_recv(), Ok(None));

        h.miner.stop().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_stop_releases_every_subscription() {
        let h = Harness::new(Arc::new(NeverEngine::default()));

        for _ in 0..5 {
            h.miner.start(None).await;
            assert_eq!(h.mempool.event_bus().subscriber_count(), 1);
            assert_eq!(h.chain.event_bus().subscriber_count(), 1);

            h.mempool.notify_ready();
            h.miner.stop().await;
            assert_eq!(h.mempool.event_bus().subscriber_count(), 0);
            assert_eq!(h.chain.event_bus().subscriber_count(), 0);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_stop_halts_search() {
        let engine = Arc::new(NeverEngine::default());
        let h = Harness::new(engine.clone());

        h.miner.start(None).await;
        h.mempool.notify_ready();
        let evaluations = engine.clone();
        wait_until("hashing", || evaluations.evaluations.load(Ordering::Relaxed) > 0).await;

        h.miner.stop().await;
        assert_eq!(h.miner.active_session().await, None);

        let after_stop = engine.evaluations.load(Ordering::Relaxed);
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(engine.evaluations.load(Ordering::Relaxed), after_stop);

        // Triggers while idle are not heard.
        h.mempool.notify_ready();
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(h.miner.metrics().get_sessions_started(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_hashrate_reported_then_zeroed_on_stop() {
        let config = MinerConfig {
            hashrate_period_secs: 1,
            ..Default::default()
        };
        let h = Harness::with_config(Arc::new(NeverEngine::default()), config);
        let mut samples = h.events(vec![MinerTopic::Hashrate]);

        h.miner.start(None).await;
        h.mempool.notify_ready();

        match next_event(&mut samples).await {
            MinerEvent::HashrateChanged(rate) => assert!(rate > 0.0),
            other => panic!("Expected HashrateChanged, got {:?}", other),
        }
        assert!(h.miner.hashrate() > 0.0);

        h.miner.stop().await;
        assert_eq!(h.miner.hashrate(), 0.0);
        assert_eq!(h.miner.status().hashrate, 0.0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_restart_after_stop_resumes_mining() {
        let h = Harness::new(Arc::new(AlwaysEngine));
        let mut mined = h.events(vec![MinerTopic::BlockMined]);

        h.miner.start(None).await;
        h.miner.stop().await;
        h.miner.start(None).await;
        assert_eq!(h.miner.status().state, MinerState::Working);

        h.mempool.notify_ready();
        assert!(matches!(
            next_event(&mut mined).await,
            MinerEvent::BlockMined(_)
        ));

        h.miner.stop().await;
        assert_eq!(h.miner.status().state, MinerState::Idle);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_event_stream_delivers_lifecycle() {
        let h = Harness::new(Arc::new(NeverEngine::default()));
        let mut stream = h
            .miner
            .event_stream(EventFilter::topics(vec![MinerTopic::Lifecycle]));

        h.miner.start(None).await;
        h.miner.stop().await;

        let started = tokio::time::timeout(WAIT, stream.next()).await.unwrap();
        let stopped = tokio::time::timeout(WAIT, stream.next()).await.unwrap();
        assert_eq!(started, Some(MinerEvent::Started { address: PAYOUT }));
        assert_eq!(stopped, Some(MinerEvent::Stopped));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_dropping_working_miner_stops_search() {
        let engine = Arc::new(NeverEngine::default());
        let Harness {
            chain,
            mempool,
            miner,
        } = Harness::new(engine.clone());

        miner.start(None).await;
        mempool.notify_ready();
        let evaluations = engine.clone();
        wait_until("hashing", || evaluations.evaluations.load(Ordering::Relaxed) > 0).await;

        drop(miner);
        wait_until("unsubscribed", || {
            chain.event_bus().subscriber_count() == 0
                && mempool.event_bus().subscriber_count() == 0
        })
        .await;
        tokio::time::sleep(Duration::from_millis(20)).await;

        let after_drop = engine.evaluations.load(Ordering::Relaxed);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(engine.evaluations.load(Ordering::Relaxed), after_drop);
    }
}
