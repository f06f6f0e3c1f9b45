//! # Mining Scenarios
//!
//! The miner driven end to end against the in-memory chain:
//!
//! 1. **Happy path**: a mempool trigger yields one block on the tip
//! 2. **Tip binding**: a moved tip abandons the candidate without submitting
//! 3. **Faults**: rejected submissions, chain faults, nonce exhaustion

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use block_miner::{
        Blake3dEngine, HashAlgorithm, HashEngine, InMemoryChain, MinerConfig, MinerErrorKind,
        MinerEvent, MinerService, MinerTopic, Sha256dEngine, Transaction,
    };
    use primitive_types::{H256, U256};
    use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn expect_mined(event: MinerEvent) -> block_miner::Block {
        match event {
            MinerEvent::BlockMined(block) => block,
            other => panic!("Expected BlockMined, got {:?}", other),
        }
    }

    /// Restart on mempool notifications alone
    fn mempool_triggers_only() -> MinerConfig {
        MinerConfig {
            restart_on_head_change: false,
            ..Default::default()
        }
    }

    // =========================================================================
    // HAPPY PATH
    // =========================================================================

    /// Tip H0, trivially satisfied target, empty mempool
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_empty_mempool_mines_child_of_tip() {
        let h = Harness::with_config(Arc::new(Sha256dEngine), mempool_triggers_only());
        let mut mined = h.events(vec![MinerTopic::BlockMined]);

        h.miner.start(None).await;
        h.mempool.notify_ready();

        let block = expect_mined(next_event(&mut mined).await);
        assert_eq!(block.transaction_count(), 0);
        assert_eq!(block.body.miner, PAYOUT);
        assert_eq!(block.prev_hash(), H0);
        assert!(Sha256dEngine.verify_proof_of_work(&block.header));

        let chain = h.chain.clone();
        wait_until("submission", || chain.submission_count() == 1).await;
        assert_eq!(h.chain.accepted_blocks(), vec![block.clone()]);
        assert_eq!(h.chain.head(), block.hash());

        // The session ends after submitting; without a head-change
        // trigger nothing else is mined.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(h.miner.metrics().get_blocks_mined(), 1);
        assert_eq!(h.chain.submission_count(), 1);
        assert_eq!(h.miner.status().last_mined, Some(block.hash()));

        h.miner.stop().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_block_carries_mempool_transactions_in_order() {
        let h = Harness::new(Arc::new(Sha256dEngine));
        let mut mined = h.events(vec![MinerTopic::BlockMined]);
        let txs: Vec<Transaction> = (0..3u8).map(|i| Transaction::new(vec![i; 8])).collect();

        for tx in &txs {
            h.mempool.add_transaction(tx.clone());
        }
        h.miner.start(None).await;
        h.mempool.notify_ready();

        let block = expect_mined(next_event(&mut mined).await);
        assert_eq!(block.body.transactions, txs);
        assert_eq!(block.header.body_hash, block.body.hash());

        h.miner.stop().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_always_succeeding_engine_keeps_seed() {
        let h = Harness::with_seeds(Arc::new(AlwaysEngine), MinerConfig::default(), || 4242);
        let mut mined = h.events(vec![MinerTopic::BlockMined]);

        h.miner.start(None).await;
        h.mempool.notify_ready();

        let block = expect_mined(next_event(&mut mined).await);
        assert_eq!(block.nonce(), 4242);
        assert_eq!(block.prev_hash(), H0);

        h.miner.stop().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_blake3_algorithm_from_config() {
        init_tracing();
        let chain = Arc::new(InMemoryChain::new(H0, U256::MAX));
        let mempool = Arc::new(block_miner::InMemoryMempool::new());
        let config = MinerConfig {
            algorithm: HashAlgorithm::Blake3d,
            mine_on_start: true,
            ..Default::default()
        };
        let miner = block_miner::ConcreteMiner::new(config, chain.clone(), mempool).unwrap();
        let mut mined = miner.subscribe(shared_bus::EventFilter::topics(vec![
            MinerTopic::BlockMined,
        ]));

        miner.start(Some(PAYOUT)).await;

        let block = expect_mined(next_event(&mut mined).await);
        assert!(Blake3dEngine.verify_proof_of_work(&block.header));
        assert_eq!(block.prev_hash(), H0);

        miner.stop().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_consecutive_blocks_extend_each_other() {
        let h = Harness::new(Arc::new(Sha256dEngine));
        let mut mined = h.events(vec![MinerTopic::BlockMined]);

        h.miner.start(None).await;
        h.mempool.notify_ready();

        // Each accepted block moves the head, which triggers the next candidate.
        let first = expect_mined(next_event(&mut mined).await);
        let second = expect_mined(next_event(&mut mined).await);
        assert_eq!(first.prev_hash(), H0);
        assert_eq!(second.prev_hash(), first.hash());

        h.miner.stop().await;
    }

    // =========================================================================
    // TIP BINDING
    // =========================================================================

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_tip_change_aborts_then_next_trigger_mines_on_new_tip() {
        let h1 = H256::repeat_byte(0xB1);
        let h = Harness::with_config(
            Arc::new(ParentGatedEngine { parent: h1 }),
            mempool_triggers_only(),
        );
        let mut mined = h.events(vec![MinerTopic::BlockMined]);

        h.miner.start(None).await;
        h.mempool.notify_ready();

        let metrics = h.miner.metrics();
        wait_until("first session", || metrics.get_sessions_started() == 1).await;

        h.chain.set_head(h1);
        wait_until("abort", || metrics.get_sessions_aborted() == 1).await;
        assert_eq!(h.chain.submission_count(), 0);
        assert_eq!(h.miner.active_session().await, None);

        h.mempool.notify_ready();
        let block = expect_mined(next_event(&mut mined).await);
        assert_eq!(block.prev_hash(), h1);
        assert_eq!(metrics.get_sessions_started(), 2);

        let chain = h.chain.clone();
        wait_until("submission", || chain.submission_count() == 1).await;

        h.miner.stop().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_burst_of_one_aborts_after_first_attempt() {
        let chain = Arc::new(InMemoryChain::new(H0, U256::MAX));
        let engine = Arc::new(TipMovingEngine {
            chain: chain.clone(),
            evaluations: AtomicU64::new(0),
        });
        let config = MinerConfig {
            burst_iterations: 1,
            ..mempool_triggers_only()
        };
        let h = Harness::on_chain(chain, engine.clone(), config);

        h.miner.start(None).await;
        h.mempool.notify_ready();

        let metrics = h.miner.metrics();
        wait_until("abort", || metrics.get_sessions_aborted() == 1).await;
        assert_eq!(engine.evaluations.load(Ordering::SeqCst), 1);
        assert_eq!(metrics.get_total_hashes(), 1);
        assert_eq!(h.chain.submission_count(), 0);

        h.miner.stop().await;
    }

    // =========================================================================
    // FAULTS
    // =========================================================================

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_rejected_submission_reports_error_and_keeps_working() {
        let h = Harness::new(Arc::new(AlwaysEngine));
        h.chain.set_reject_blocks(true);
        let mut events = h.events(vec![MinerTopic::BlockMined, MinerTopic::Error]);

        h.miner.start(None).await;
        h.mempool.notify_ready();

        let block = expect_mined(next_event(&mut events).await);
        match next_event(&mut events).await {
            MinerEvent::Error(err) => {
                assert_eq!(err.kind, MinerErrorKind::Submission);
                assert!(err.session_id.is_some());
            }
            other => panic!("Expected Error event, got {:?}", other),
        }

        assert!(h.miner.is_working());
        assert_eq!(h.miner.metrics().get_submission_failures(), 1);
        assert_eq!(h.chain.submitted_blocks(), vec![block]);
        assert!(h.chain.accepted_blocks().is_empty());

        // No retry: the same candidate is not submitted again.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(h.chain.submission_count(), 1);

        h.miner.stop().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_chain_fault_mid_session_reports_error() {
        let h = Harness::new(Arc::new(NeverEngine::default()));
        let mut errors = h.events(vec![MinerTopic::Error]);

        h.miner.start(None).await;
        h.mempool.notify_ready();

        let metrics = h.miner.metrics();
        wait_until("session", || metrics.get_sessions_started() == 1).await;
        h.chain.set_available(false);

        match next_event(&mut errors).await {
            MinerEvent::Error(err) => assert_eq!(err.kind, MinerErrorKind::ChainFault),
            other => panic!("Expected Error event, got {:?}", other),
        }
        assert!(h.miner.is_working());

        h.miner.stop().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_nonce_exhaustion_reseeds() {
        let calls = Arc::new(AtomicU32::new(0));
        let seeds = {
            let calls = calls.clone();
            move || match calls.fetch_add(1, Ordering::SeqCst) {
                0 => u32::MAX - 2,
                _ => 10,
            }
        };
        let h = Harness::with_seeds(
            Arc::new(NonceGatedEngine { nonce: 12 }),
            mempool_triggers_only(),
            seeds,
        );
        let mut events = h.events(vec![MinerTopic::BlockMined, MinerTopic::Error]);

        h.miner.start(None).await;
        h.mempool.notify_ready();

        match next_event(&mut events).await {
            MinerEvent::Error(err) => {
                assert_eq!(err.kind, MinerErrorKind::NonceExhausted);
                assert!(err.message.contains("seed 4294967293"));
            }
            other => panic!("Expected Error event, got {:?}", other),
        }

        let block = expect_mined(next_event(&mut events).await);
        assert_eq!(block.nonce(), 12);
        assert_eq!(h.miner.metrics().get_sessions_started(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        h.miner.stop().await;
    }
}
