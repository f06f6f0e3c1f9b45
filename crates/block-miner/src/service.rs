//! Concrete Miner Service Implementation
//!
//! Owns the lifecycle of the miner: the trigger task that listens to the
//! chain and mempool, at most one search session task, and the hashrate
//! sampler. Every trigger while working cancels the running session, waits
//! for it to finish and starts a fresh one on a newly assembled candidate.

use crate::{
    assembler::BlockAssembler,
    config::MinerConfig,
    domain::{Address, Block, BurstOutcome, MinerState, SearchSession},
    error::{MinerError, Result},
    events::{
        ChainEvent, MempoolEvent, MinerErrorEvent, MinerErrorKind, MinerEvent, MinerTopic,
    },
    metrics::{HashrateTracker, Metrics},
    ports::{ChainOracle, HashEngine, MinerService, MinerStatus, TransactionSource},
    utils::hashing::describe_target,
};
use async_trait::async_trait;
use parking_lot::RwLock;
use primitive_types::H256;
use shared_bus::{EventFilter, EventStream, InMemoryEventBus, Subscription};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Why a fresh candidate is being assembled
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RestartReason {
    /// `mine_on_start` kick-off
    Startup,
    /// Mempool announced a ready selection
    TransactionsReady,
    /// Mempool admitted a transaction
    TransactionAdded,
    /// Chain tip moved
    HeadChanged,
    /// Previous session ran out of nonces
    NonceExhausted,
}

impl From<&MempoolEvent> for RestartReason {
    fn from(event: &MempoolEvent) -> Self {
        match event {
            MempoolEvent::TransactionsReady => Self::TransactionsReady,
            MempoolEvent::TransactionAdded { .. } => Self::TransactionAdded,
        }
    }
}

impl From<&ChainEvent> for RestartReason {
    fn from(event: &ChainEvent) -> Self {
        match event {
            ChainEvent::HeadChanged { .. } => Self::HeadChanged,
        }
    }
}

/// Running search session as seen by the controller
struct ActiveSession {
    id: Uuid,
    cancel: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl ActiveSession {
    /// Raise the cancel flag and wait for the task to end
    async fn cancel_and_join(self) {
        self.cancel.store(true, Ordering::SeqCst);
        if let Err(e) = self.handle.await {
            if e.is_panic() {
                error!(session = %self.id, "[miner] Search session panicked");
            }
        }
    }
}

/// Background tasks alive while working
#[derive(Default)]
struct Tasks {
    trigger: Option<(oneshot::Sender<()>, JoinHandle<()>)>,
    sampler: Option<JoinHandle<()>>,
}

/// State shared between the controller and its tasks
struct MinerInner {
    config: MinerConfig,
    chain: Arc<dyn ChainOracle>,
    assembler: BlockAssembler,
    engine: Arc<dyn HashEngine>,
    events: Arc<InMemoryEventBus<MinerEvent>>,
    address: RwLock<Address>,
    working: AtomicBool,
    hashrate: HashrateTracker,
    metrics: Metrics,
    last_mined: RwLock<Option<H256>>,
    session: Mutex<Option<ActiveSession>>,
}

/// Concrete implementation of [`MinerService`]
///
/// Cheap to share behind an `Arc`; `start` and `stop` are serialized
/// internally.
pub struct ConcreteMiner {
    inner: Arc<MinerInner>,
    mempool: Arc<dyn TransactionSource>,
    lifecycle: Mutex<Tasks>,
}

/// Builder for [`ConcreteMiner`]
pub struct MinerBuilder {
    chain: Arc<dyn ChainOracle>,
    mempool: Arc<dyn TransactionSource>,
    config: MinerConfig,
    address: Option<Address>,
    engine: Option<Arc<dyn HashEngine>>,
    seed_source: Option<Arc<dyn Fn() -> u32 + Send + Sync>>,
}

impl MinerBuilder {
    /// Start from default configuration
    pub fn new(chain: Arc<dyn ChainOracle>, mempool: Arc<dyn TransactionSource>) -> Self {
        Self {
            chain,
            mempool,
            config: MinerConfig::default(),
            address: None,
            engine: None,
            seed_source: None,
        }
    }

    /// Runtime configuration
    pub fn config(mut self, config: MinerConfig) -> Self {
        self.config = config;
        self
    }

    /// Payout address
    pub fn address(mut self, address: Address) -> Self {
        self.address = Some(address);
        self
    }

    /// Hash engine, overriding `config.algorithm`
    pub fn engine(mut self, engine: Arc<dyn HashEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Seed nonce source, replacing the uniform random draw
    pub fn seed_source<F>(mut self, source: F) -> Self
    where
        F: Fn() -> u32 + Send + Sync + 'static,
    {
        self.seed_source = Some(Arc::new(source));
        self
    }

    /// Validate the configuration and build an idle miner
    pub fn build(self) -> Result<ConcreteMiner> {
        self.config.validate()?;

        info!("[miner] Initializing block miner");
        info!("  Algorithm: {:?}", self.config.algorithm);
        info!("  Burst iterations: {}", self.config.burst_iterations);
        info!("  Hashrate period: {}s", self.config.hashrate_period_secs);

        let address = self.address.unwrap_or_else(|| {
            warn!("[miner] No miner address set, paying out to the zero address");
            Address::zero()
        });

        let engine = self
            .engine
            .unwrap_or_else(|| self.config.algorithm.engine());

        let mut assembler = BlockAssembler::new(
            self.chain.clone(),
            self.mempool.clone(),
            self.config.max_transactions,
        );
        if let Some(source) = self.seed_source {
            assembler = assembler.with_seed_source(move || source());
        }

        let events = Arc::new(InMemoryEventBus::with_capacity(self.config.event_capacity));

        Ok(ConcreteMiner {
            inner: Arc::new(MinerInner {
                config: self.config,
                chain: self.chain,
                assembler,
                engine,
                events,
                address: RwLock::new(address),
                working: AtomicBool::new(false),
                hashrate: HashrateTracker::new(),
                metrics: Metrics::new(),
                last_mined: RwLock::new(None),
                session: Mutex::new(None),
            }),
            mempool: self.mempool,
            lifecycle: Mutex::new(Tasks::default()),
        })
    }
}

impl ConcreteMiner {
    /// Create an idle miner with the stock engine for `config.algorithm`
    ///
    /// Fails with [`MinerError::InvalidConfig`] on an unusable configuration.
    pub fn new(
        config: MinerConfig,
        chain: Arc<dyn ChainOracle>,
        mempool: Arc<dyn TransactionSource>,
    ) -> Result<Self> {
        MinerBuilder::new(chain, mempool).config(config).build()
    }

    /// Builder with default configuration
    pub fn builder(chain: Arc<dyn ChainOracle>, mempool: Arc<dyn TransactionSource>) -> MinerBuilder {
        MinerBuilder::new(chain, mempool)
    }

    /// Subscribe to miner events
    pub fn subscribe(&self, filter: EventFilter<MinerTopic>) -> Subscription<MinerEvent> {
        self.inner.events.subscribe(filter)
    }

    /// Miner events as a `Stream`
    pub fn event_stream(&self, filter: EventFilter<MinerTopic>) -> EventStream<MinerEvent> {
        self.inner.events.event_stream(filter)
    }

    /// Outbound event bus
    pub fn event_bus(&self) -> Arc<InMemoryEventBus<MinerEvent>> {
        Arc::clone(&self.inner.events)
    }

    /// Counters
    pub fn metrics(&self) -> &Metrics {
        &self.inner.metrics
    }

    /// Configuration in use
    pub fn config(&self) -> &MinerConfig {
        &self.inner.config
    }

    /// Id of the running search session, if any
    pub async fn active_session(&self) -> Option<Uuid> {
        self.inner
            .session
            .lock()
            .await
            .as_ref()
            .filter(|s| !s.handle.is_finished())
            .map(|s| s.id)
    }
}

#[async_trait]
impl MinerService for ConcreteMiner {
    async fn start(&self, address: Option<Address>) {
        let mut tasks = self.lifecycle.lock().await;

        if self
            .inner
            .working
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!("[miner] Miner already working, ignoring start");
            return;
        }

        if let Some(address) = address {
            *self.inner.address.write() = address;
        }
        let address = self.inner.miner_address();
        self.inner.hashrate.reset();

        // Subscriptions are taken here, before start returns, and move into
        // the trigger task. Dropping that task unsubscribes.
        let mempool_sub = self.mempool.subscribe();
        let chain_sub = self
            .inner
            .config
            .restart_on_head_change
            .then(|| self.inner.chain.subscribe());

        let (restart_tx, restart_rx) = mpsc::unbounded_channel();
        if self.inner.config.mine_on_start {
            let _ = restart_tx.send(RestartReason::Startup);
        }

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let trigger = tokio::spawn(trigger_loop(
            Arc::clone(&self.inner),
            mempool_sub,
            chain_sub,
            restart_tx,
            restart_rx,
            shutdown_rx,
        ));
        tasks.trigger = Some((shutdown_tx, trigger));
        tasks.sampler = Some(tokio::spawn(sample_hashrate(Arc::clone(&self.inner))));

        info!("[miner] Miner started work, paying out to {}", address);
        self.inner.events.send(MinerEvent::Started { address });
    }

    async fn stop(&self) {
        let mut tasks = self.lifecycle.lock().await;

        if self
            .inner
            .working
            .compare_exchange(true, false, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!("[miner] Miner is idle, ignoring stop");
            return;
        }

        // Let a restart in flight finish, then drop the subscriptions.
        if let Some((shutdown, handle)) = tasks.trigger.take() {
            let _ = shutdown.send(());
            if let Err(e) = handle.await {
                error!("[miner] Trigger task failed: {}", e);
            }
        }

        if let Some(sampler) = tasks.sampler.take() {
            sampler.abort();
            let _ = sampler.await;
        }

        if let Some(session) = self.inner.session.lock().await.take() {
            debug!(session = %session.id, "[miner] Cancelling search session");
            session.cancel_and_join().await;
        }

        self.inner.hashrate.reset();
        self.inner.events.send(MinerEvent::Stopped);
        info!("[miner] Miner stopped work");
    }

    fn is_working(&self) -> bool {
        self.inner.working.load(Ordering::SeqCst)
    }

    fn hashrate(&self) -> f64 {
        self.inner.hashrate.current()
    }

    fn miner_address(&self) -> Address {
        self.inner.miner_address()
    }

    fn status(&self) -> MinerStatus {
        MinerStatus {
            state: if self.is_working() {
                MinerState::Working
            } else {
                MinerState::Idle
            },
            address: self.inner.miner_address(),
            hashrate: self.inner.hashrate.current(),
            blocks_mined: self.inner.metrics.get_blocks_mined(),
            sessions_started: self.inner.metrics.get_sessions_started(),
            last_mined: *self.inner.last_mined.read(),
        }
    }
}

impl Drop for ConcreteMiner {
    fn drop(&mut self) {
        if !self.inner.working.swap(false, Ordering::SeqCst) {
            return;
        }

        let tasks = self.lifecycle.get_mut();
        if let Some((_, trigger)) = tasks.trigger.take() {
            trigger.abort();
        }
        if let Some(sampler) = tasks.sampler.take() {
            sampler.abort();
        }

        // A session also ends on its own once it sees `working` cleared.
        if let Ok(mut slot) = self.inner.session.try_lock() {
            if let Some(session) = slot.take() {
                session.cancel.store(true, Ordering::SeqCst);
            }
        }

        self.inner.hashrate.reset();
        debug!("[miner] Miner dropped while working, background tasks stopped");
    }
}

impl MinerInner {
    fn miner_address(&self) -> Address {
        *self.address.read()
    }

    fn is_working(&self) -> bool {
        self.working.load(Ordering::SeqCst)
    }

    /// Cancel the running session and launch a new one on a fresh candidate
    async fn restart(
        self: &Arc<Self>,
        reason: RestartReason,
        restart_tx: &mpsc::UnboundedSender<RestartReason>,
    ) {
        if !self.is_working() {
            return;
        }

        let mut slot = self.session.lock().await;
        if let Some(previous) = slot.take() {
            debug!(session = %previous.id, ?reason, "[miner] Cancelling search session");
            previous.cancel_and_join().await;
        }

        let block = match self.assembler.assemble(self.miner_address()).await {
            Ok(block) => block,
            Err(e) => {
                self.metrics.record_assembly_failure();
                warn!("[miner] Could not assemble candidate ({:?}): {}", reason, e);
                return;
            }
        };

        let session = SearchSession::new(block);
        let id = session.id();
        info!(
            "[miner] Starting work on prev={} target={} txs={} seed={}",
            hex::encode(&session.captured_tip().as_bytes()[..8]),
            describe_target(session.block().header.difficulty),
            session.block().transaction_count(),
            session.seed(),
        );

        let cancel = Arc::new(AtomicBool::new(false));
        self.metrics.record_session_started();
        let handle = tokio::spawn(run_session(
            Arc::clone(self),
            session,
            Arc::clone(&cancel),
            restart_tx.clone(),
        ));

        *slot = Some(ActiveSession { id, cancel, handle });
    }

    fn emit_error(&self, kind: MinerErrorKind, message: String, session_id: Uuid) {
        self.events.send(MinerEvent::Error(MinerErrorEvent {
            kind,
            message,
            session_id: Some(session_id),
        }));
    }

    /// Publish a found block and hand it to the chain
    async fn finish_session(&self, session: SearchSession) {
        let id = session.id();
        let attempts = session.attempts();
        let block: Block = session.into_block();
        let hash = block.hash();

        info!(
            "[miner] MINED BLOCK | nonce: {} | hash: {} | txs: {}",
            block.nonce(),
            hex::encode(&hash.as_bytes()[..8]),
            block.transaction_count()
        );

        let event = serde_json::json!({
            "timestamp": chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true),
            "subsystem_id": "block-miner",
            "event_type": "BlockMined",
            "correlation_id": id.to_string(),
            "block_hash": hex::encode(hash),
            "prev_hash": hex::encode(block.prev_hash()),
            "metadata": {
                "nonce": block.nonce(),
                "attempts": attempts,
                "difficulty_target": describe_target(block.header.difficulty),
                "transactions": block.transaction_count(),
                "miner": self.miner_address().to_string(),
            }
        });
        info!("EVENT_FLOW_JSON {}", event);

        *self.last_mined.write() = Some(hash);
        self.metrics.record_block_mined(block.transaction_count());
        self.events.send(MinerEvent::BlockMined(block.clone()));

        if let Err(e) = self.chain.submit_block(block).await {
            self.metrics.record_submission_failure();
            error!(session = %id, "[miner] Block submission failed: {}", e);
            self.emit_error(MinerErrorKind::Submission, e.to_string(), id);
        }
    }
}

/// Serially turn notifications into restarts until shut down
async fn trigger_loop(
    inner: Arc<MinerInner>,
    mut mempool: Subscription<MempoolEvent>,
    mut chain: Option<Subscription<ChainEvent>>,
    restart_tx: mpsc::UnboundedSender<RestartReason>,
    mut restart_rx: mpsc::UnboundedReceiver<RestartReason>,
    mut shutdown: oneshot::Receiver<()>,
) {
    let mut mempool_open = true;
    let mut chain_open = chain.is_some();

    loop {
        let reason = tokio::select! {
            biased;

            _ = &mut shutdown => break,

            Some(reason) = restart_rx.recv() => reason,

            event = mempool.recv(), if mempool_open => match event {
                Some(event) => RestartReason::from(&event),
                None => {
                    warn!("[miner] Mempool notifications closed");
                    mempool_open = false;
                    continue;
                }
            },

            event = next_chain_event(&mut chain), if chain_open => match event {
                Some(event) => RestartReason::from(&event),
                None => {
                    warn!("[miner] Chain notifications closed");
                    chain_open = false;
                    continue;
                }
            },
        };

        // Everything already queued is covered by the same fresh candidate.
        let coalesced = drain_pending(&mut mempool, &mut chain, &mut restart_rx);
        debug!(?reason, coalesced, "[miner] Restart triggered");
        inner.restart(reason, &restart_tx).await;
    }

    debug!("[miner] Trigger task finished");
}

/// Discard notifications that are already waiting, returning how many
fn drain_pending(
    mempool: &mut Subscription<MempoolEvent>,
    chain: &mut Option<Subscription<ChainEvent>>,
    restart_rx: &mut mpsc::UnboundedReceiver<RestartReason>,
) -> usize {
    let mut drained = 0;
    while let Ok(Some(_)) = mempool.try_recv() {
        drained += 1;
    }
    if let Some(chain) = chain.as_mut() {
        while let Ok(Some(_)) = chain.try_recv() {
            drained += 1;
        }
    }
    while restart_rx.try_recv().is_ok() {
        drained += 1;
    }
    drained
}

async fn next_chain_event(chain: &mut Option<Subscription<ChainEvent>>) -> Option<ChainEvent> {
    match chain {
        Some(sub) => sub.recv().await,
        None => None,
    }
}

/// Burst-then-yield nonce search bound to the tip captured at assembly
async fn run_session(
    inner: Arc<MinerInner>,
    mut session: SearchSession,
    cancel: Arc<AtomicBool>,
    restart_tx: mpsc::UnboundedSender<RestartReason>,
) {
    let id = session.id();
    let iterations = inner.config.burst_iterations;

    loop {
        if cancel.load(Ordering::SeqCst) || !inner.is_working() {
            debug!(session = %id, "[miner] Search session cancelled");
            inner.metrics.record_session_aborted();
            return;
        }

        match inner.chain.tip_hash().await {
            Ok(tip) if tip == session.captured_tip() => {}
            Ok(tip) => {
                debug!(
                    session = %id,
                    "[miner] Tip moved to {}, abandoning candidate",
                    hex::encode(&tip.as_bytes()[..8])
                );
                inner.metrics.record_session_aborted();
                return;
            }
            Err(e) => {
                warn!(session = %id, "[miner] Tip check failed: {}", e);
                inner.metrics.record_session_aborted();
                inner.emit_error(MinerErrorKind::ChainFault, e.to_string(), id);
                return;
            }
        }

        let engine = inner.engine.as_ref();
        let burst =
            panic::catch_unwind(AssertUnwindSafe(|| session.run_burst(engine, iterations)));
        let report = match burst {
            Ok(report) => report,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!(session = %id, "[miner] Hash engine panicked: {}", message);
                inner.metrics.record_session_aborted();
                inner.emit_error(
                    MinerErrorKind::EngineFault,
                    format!("hash engine panicked: {}", message),
                    id,
                );
                return;
            }
        };
        inner.hashrate.record_hashes(u64::from(report.attempts));
        inner.metrics.record_hashes(u64::from(report.attempts));

        match report.outcome {
            BurstOutcome::Found => {
                inner.finish_session(session).await;
                return;
            }
            BurstOutcome::Exhausted => {
                let err = MinerError::NonceSpaceExhausted {
                    seed: session.seed(),
                    attempts: session.attempts(),
                };
                warn!(session = %id, "[miner] {}, reseeding", err);
                inner.metrics.record_session_aborted();
                inner.emit_error(MinerErrorKind::NonceExhausted, err.to_string(), id);
                let _ = restart_tx.send(RestartReason::NonceExhausted);
                return;
            }
            BurstOutcome::Continue => tokio::task::yield_now().await,
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Publish a hashrate sample every period, first one a full period after start
async fn sample_hashrate(inner: Arc<MinerInner>) {
    let period = inner.config.hashrate_period();
    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);

    loop {
        ticker.tick().await;
        let rate = inner.hashrate.sample(period);
        debug!(hashrate = rate, "[miner] Hashrate sample");
        inner.events.send(MinerEvent::HashrateChanged(rate));
    }
}
